//! Resolution traits and errors.
//!
//! * The [ServiceResolver] trait is the object-safe surface shared by the root
//!   [crate::ServiceProvider], every [crate::ServiceScope] and the resolver handed to factories.
//!   It works on type-erased [Instance]s identified by [ServiceKey]s.
//! * The [Inject] trait adds typed access on top of any resolver, returning `Arc<T>` values.

use std::sync::Arc;
use thiserror::Error;

use crate::{BoxError, Instance, ServiceKey};

/// Resolve services from a container or one of its scopes.
pub trait ServiceResolver {
    /// Resolve the last registration of a key.
    ///
    /// A key without registration is not an error: the result is `None`.
    fn get_service(&self, key: &ServiceKey) -> Result<Option<Instance>, ResolveError>;

    /// Resolve every registration of a key, in registration order.
    fn get_services(&self, key: &ServiceKey) -> Result<Vec<Instance>, ResolveError>;

    /// Check if a key has at least one registration.
    fn is_service(&self, key: &ServiceKey) -> bool;

    /// Resolve the last registration of a key, failing if there is none.
    fn get_required_service(&self, key: &ServiceKey) -> Result<Instance, ResolveError> {
        self.get_service(key)?
            .ok_or(ResolveError::NotRegistered { service: key.name() })
    }

    /// Resolve every registration of several keys: the matches of each key in registration
    /// order, keys taken in the given order.
    fn get_services_of(&self, keys: &[ServiceKey]) -> Result<Vec<Instance>, ResolveError> {
        if keys.is_empty() {
            return Err(ResolveError::NoServiceTypes);
        }
        let mut instances = Vec::new();
        for key in keys {
            instances.extend(self.get_services(key)?);
        }
        Ok(instances)
    }
}

/// Typed access to services.
///
/// This trait is implemented for every [ServiceResolver], including trait objects.
pub trait Inject: ServiceResolver {
    /// Obtain an instance of the target type, or `None` if it is not registered.
    fn try_inject<T: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> Result<Option<Arc<T>>, ResolveError> {
        let key = ServiceKey::of::<T>();
        self.get_service(&key)?
            .map(|instance| downcast::<T>(&key, &instance))
            .transpose()
    }

    /// Obtain an instance of the target type.
    ///
    /// Return an error if the type is not registered or could not be resolved
    fn inject<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, ResolveError> {
        let key = ServiceKey::of::<T>();
        let instance = self.get_required_service(&key)?;
        downcast::<T>(&key, &instance)
    }

    /// Obtain all registered instances of the target type, in registration order.
    fn inject_all<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Vec<Arc<T>>, ResolveError> {
        let key = ServiceKey::of::<T>();
        self.get_services(&key)?
            .iter()
            .map(|instance| downcast::<T>(&key, instance))
            .collect()
    }
}

impl<R: ServiceResolver + ?Sized> Inject for R {}

fn downcast<T: ?Sized + Send + Sync + 'static>(
    key: &ServiceKey,
    instance: &Instance,
) -> Result<Arc<T>, ResolveError> {
    instance.downcast::<T>().ok_or(ResolveError::ServiceMismatch {
        service: key.name(),
        actual: instance.key().name(),
    })
}

/// Errors triggered while resolving a service
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("No service for type '{service}' has been registered")]
    NotRegistered { service: &'static str },
    #[error("At least one service type is required")]
    NoServiceTypes,
    #[error("Multiple constructors with {count} parameters found in '{target}'")]
    AmbiguousConstructor { target: &'static str, count: usize },
    #[error(
        "A suitable constructor for type '{target}' could not be located. Ensure all parameters \
         of a public constructor are either registered as services or passed as arguments, and \
         that no extraneous arguments are provided"
    )]
    NoSuitableConstructor { target: &'static str },
    #[error(
        "Unable to resolve service for type '{parameter}' while attempting to activate '{target}'"
    )]
    UnresolvableParameter { parameter: &'static str, target: &'static str },
    #[error("Cannot resolve scoped service '{service}' from the root provider")]
    ScopedFromRoot { service: &'static str },
    #[error("Cyclic dependencies: {path}")]
    CyclicResolution { path: String },
    #[error("Cannot access a disposed {what}")]
    Disposed { what: &'static str },
    #[error("Argument {index} of '{target}' is not a '{expected}'")]
    ArgumentMismatch {
        target: &'static str,
        index: usize,
        expected: &'static str,
    },
    #[error("Service '{service}' resolved to an instance of '{actual}'")]
    ServiceMismatch { service: &'static str, actual: &'static str },
    /// Error raised by a constructor or a factory, passed through unchanged.
    #[error(transparent)]
    Constructor(BoxError),
}

/// Every failure found while validating a container at build time.
#[derive(Error, Debug)]
#[error("Some services are not able to be constructed: {}", summary(.errors))]
pub struct ValidationError {
    pub errors: Vec<(String, ResolveError)>,
}

fn summary(errors: &[(String, ResolveError)]) -> String {
    errors
        .iter()
        .map(|(descriptor, e)| format!("({descriptor}: {e})"))
        .collect::<Vec<_>>()
        .join(" ")
}
