mod activator;
mod fakes;
mod lifetimes;
mod scopes;
