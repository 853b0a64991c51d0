//! Runtime dependency injection container with singleton, scoped and transient lifetimes.
//!
//! # Simple use case
//!
//! ```
//! # use std::sync::Arc;
//! # use wirebox::*;
//! // Define traits and implementors
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str);
//! }
//!
//! struct ConsoleLogger;
//!
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) {
//!         println!("{message}");
//!     }
//! }
//!
//! struct Worker {
//!     logger: Arc<dyn Logger>,
//!     retries: u32,
//! }
//!
//! impl Worker {
//!     fn new(logger: Arc<dyn Logger>, retries: u32) -> Self {
//!         Self { logger, retries }
//!     }
//! }
//!
//! // List the constructors of each type, and the services it can be provided as
//! activate!(ConsoleLogger, || ConsoleLogger);
//! implements!(ConsoleLogger => dyn Logger);
//! activate!(Worker, Worker::new);
//!
//! # fn main() -> Result<(), ResolveError> {
//! let mut services = ServiceCollection::new();
//! services
//!     .add_singleton::<dyn Logger, ConsoleLogger>()
//!     .add_transient::<Worker, Worker>();
//!
//! let provider = services.build_service_provider();
//! let worker: Arc<Worker> = provider.inject()?;
//! worker.logger.log("started");
//! assert_eq!(worker.retries, 0);
//! # Ok(())
//! # }
//! ```
//!
//! # Mechanism
//!
//! Rust has no runtime reflection, so the metadata a container needs is declared once per type:
//!
//! * The ```Activate``` trait lists the public constructors of a type as ```Constructor``` values,
//!   built from plain functions. Wrapping a function captures its parameter types.
//! * The ```Implements<S>``` trait converts a shared concrete instance into the service type
//!   ```S```, usually a trait object.
//!
//! The engine works on type-erased values: a ```ServiceKey``` identifies a type and an
//! ```Instance``` carries a shared value of the service type.
//!
//! * A ```ServiceCollection``` is an ordered list of ```ServiceDescriptor```s, binding a service
//!   key to an implementation (a type, a pre-built instance or a factory) and a ```Lifetime```.
//! * A ```ServiceProvider``` freezes this list. When a type is activated, the constructor with the
//!   most parameters that the registry can satisfy is selected, and its parameters are resolved
//!   recursively. Unregistered parameters of primitive types bind to their zero value.
//! * A ```ServiceScope``` keeps its own instances of the scoped services and disposes them when
//!   it ends.
//! * The ```ServiceResolver``` trait is the object-safe resolution surface shared by containers and
//!   scopes, and the ```Inject``` trait adds typed access on top of it.

pub mod activator;

mod activate;
mod collection;
mod descriptor;
mod dispose;
mod engine;
mod instance;
mod options;
mod primitive;
mod provider;
mod resolve;
mod scope;
mod selector;

pub use activate::{
    Activate, Callable, Constructor, ErasedConstructor, Implements, Injectable, Signature, TypeInfo,
};
pub use collection::{RegistrationError, ServiceCollection};
pub use descriptor::{Factory, Implementation, Lifetime, ServiceDescriptor};
pub use dispose::{Dispose, DisposeError};
pub use instance::{Instance, ServiceKey};
pub use options::{ConfigError, ServiceProviderOptions};
pub use primitive::is_primitive;
pub use provider::ServiceProvider;
pub use resolve::{Inject, ResolveError, ServiceResolver, ValidationError};
pub use scope::ServiceScope;

/// Error type for failures raised by user code: constructors, factories and disposal hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(test)]
mod tests;
