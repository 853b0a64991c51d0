use std::sync::Arc;

use chrono::Utc;
use tracing_subscriber::EnvFilter;
use wirebox::*;

// Define regular traits and implementor structs

trait Logger: Send + Sync {
    fn log(&self, content: &str);
}

trait DateLogger: Send + Sync {
    fn log_date(&self);
}

struct LoggerImpl;

impl Logger for LoggerImpl {
    fn log(&self, content: &str) {
        println!("{}", content);
    }
}

struct DateLoggerImpl {
    logger: Arc<dyn Logger>,
}

impl DateLoggerImpl {
    fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl DateLogger for DateLoggerImpl {
    fn log_date(&self) {
        self.logger.log(&format!("it is {}", Utc::now().to_rfc3339()));
    }
}

/// One per scope, closed when the scope ends
struct Session {
    logger: Arc<dyn Logger>,
    attempts: u32,
}

impl Session {
    fn open(logger: Arc<dyn Logger>, attempts: u32) -> Self {
        logger.log("session opened");
        Self { logger, attempts }
    }
}

impl Dispose for Session {
    fn dispose(&self) -> Result<(), BoxError> {
        self.logger.log(&format!("session closed after {} attempt(s)", self.attempts));
        Ok(())
    }
}

// Declare the constructors and the services each type provides

activate!(LoggerImpl, || LoggerImpl);
implements!(LoggerImpl => dyn Logger);

activate!(DateLoggerImpl, DateLoggerImpl::new);
implements!(DateLoggerImpl => dyn DateLogger);

activate!(disposable Session, Session::open);

fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut services = ServiceCollection::new();
    services
        .add_singleton::<dyn Logger, LoggerImpl>()
        .add_transient::<dyn DateLogger, DateLoggerImpl>()
        .add_scoped::<Session, Session>();

    let options = ServiceProviderOptions::new().validate_on_build(true).validate_scopes(true);
    let provider = services.build_service_provider_with(options)?;

    let b: Arc<dyn DateLogger> = provider.inject()?;
    b.log_date();

    let scope = provider.create_scope();
    let session: Arc<Session> = scope.inject()?;
    session.logger.log("working");
    scope.dispose()?;

    provider.dispose()?;
    Ok(())
}
