use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::*;

/// Identity comparison that ignores vtables.
pub fn same<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

pub trait Logger: Send + Sync {
    fn name(&self) -> &'static str;
    fn log(&self, message: &str);
    fn lines(&self) -> Vec<String>;
}

#[derive(Default)]
pub struct ConsoleLogger {
    lines: Mutex<Vec<String>>,
}

impl Logger for ConsoleLogger {
    fn name(&self) -> &'static str {
        "console"
    }

    fn log(&self, message: &str) {
        self.lines.lock().push(message.to_string());
    }

    fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

activate!(ConsoleLogger, ConsoleLogger::default);
implements!(ConsoleLogger => dyn Logger);

pub struct SilentLogger;

impl Logger for SilentLogger {
    fn name(&self) -> &'static str {
        "silent"
    }

    fn log(&self, _message: &str) {}

    fn lines(&self) -> Vec<String> {
        Vec::new()
    }
}

activate!(SilentLogger, || SilentLogger);
implements!(SilentLogger => dyn Logger);

pub trait Work: Send + Sync {
    fn logger(&self) -> Arc<dyn Logger>;
}

pub struct Worker {
    logger: Arc<dyn Logger>,
}

impl Worker {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl Work for Worker {
    fn logger(&self) -> Arc<dyn Logger> {
        self.logger.clone()
    }
}

activate!(Worker, Worker::new);
implements!(Worker => dyn Work);

/// Ordered record of lifecycle events, shared by the tracked services.
#[derive(Default)]
pub struct Journal(Mutex<Vec<&'static str>>);

impl Journal {
    pub fn record(&self, entry: &'static str) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<&'static str> {
        self.0.lock().clone()
    }
}

macro_rules! tracked {
    ($($name:ident),*) => {
        $(
        pub struct $name {
            journal: Arc<Journal>,
        }

        impl $name {
            pub fn new(journal: Arc<Journal>) -> Self {
                Self { journal }
            }
        }

        impl Dispose for $name {
            fn dispose(&self) -> Result<(), BoxError> {
                self.journal.record(stringify!($name));
                Ok(())
            }
        }

        activate!(disposable $name, $name::new);
        )*
    };
}

tracked!(A, B, C);

pub struct Faulty;

impl Dispose for Faulty {
    fn dispose(&self) -> Result<(), BoxError> {
        Err("socket already closed".into())
    }
}

activate!(disposable Faulty, || Faulty);

/// A collection with a shared journal, already registered as a singleton.
pub fn journaled() -> (ServiceCollection, Arc<Journal>) {
    let journal = Arc::new(Journal::default());
    let mut services = ServiceCollection::new();
    services.add_singleton_instance(journal.clone());
    (services, journal)
}

pub struct Settings {
    pub port: i32,
    pub name: Option<String>,
    pub id: Uuid,
    pub label: String,
}

impl Settings {
    fn new(port: i32, name: Option<String>, id: Uuid, label: String) -> Self {
        Self { port, name, id, label }
    }
}

activate!(Settings, Settings::new);

pub struct Ambiguous;

impl Ambiguous {
    fn with_logger(_: Arc<dyn Logger>) -> Self {
        Ambiguous
    }
    fn with_port(_: u16) -> Self {
        Ambiguous
    }
}

activate!(Ambiguous, Ambiguous::with_logger, Ambiguous::with_port);

/// Logs when a logger is available, stays quiet otherwise.
pub struct Reporter {
    pub logger: Option<Arc<dyn Logger>>,
}

impl Reporter {
    fn quiet() -> Self {
        Self { logger: None }
    }
    fn verbose(logger: Arc<dyn Logger>) -> Self {
        Self { logger: Some(logger) }
    }
}

activate!(Reporter, Reporter::quiet, Reporter::verbose);

pub struct Flaky;

impl Activate for Flaky {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::fallible(|| -> Result<Flaky, io::Error> {
            Err(io::Error::new(io::ErrorKind::ConnectionRefused, "database offline"))
        })]
    }
}

pub struct Chicken(#[allow(dead_code)] Arc<Egg>);
pub struct Egg(#[allow(dead_code)] Arc<Chicken>);

activate!(Chicken, Chicken);
activate!(Egg, Egg);

pub struct Greeting {
    pub logger: Arc<dyn Logger>,
    pub first: String,
    pub second: String,
}

impl Greeting {
    fn new(logger: Arc<dyn Logger>, first: String, second: String) -> Self {
        Self { logger, first, second }
    }
}

activate!(Greeting, Greeting::new);
