//! Construction of unregistered types, with caller-supplied arguments.

use std::sync::Arc;

use tracing::debug;

use crate::activate::{Activate, TypeInfo};
use crate::selector::ArgumentMatcher;
use crate::{Inject, Instance, ResolveError, ServiceKey, ServiceResolver};

/// Construct a type, forcing some argument values.
///
/// The constructor accepting the given values best is selected: every value must find a slot
/// declaring exactly its type, and the constructor where most of them land on their own position
/// wins. Remaining parameters are resolved from the container, without any primitive default.
pub fn create_instance<R: ServiceResolver + ?Sized>(
    resolver: &R,
    info: &TypeInfo,
    args: &[Instance],
) -> Result<Instance, ResolveError> {
    debug!(ty = info.key().name(), arguments = args.len(), "creating instance");
    ArgumentMatcher::select(info, args)?.create_instance(resolver)
}

/// Typed version of [create_instance].
pub fn create<T: Activate, R: ServiceResolver + ?Sized>(
    resolver: &R,
    args: &[Instance],
) -> Result<Arc<T>, ResolveError> {
    let instance = create_instance(resolver, &TypeInfo::of::<T>(), args)?;
    instance.downcast::<T>().ok_or(ResolveError::ServiceMismatch {
        service: ServiceKey::of::<T>().name(),
        actual: instance.key().name(),
    })
}

/// Resolve `T` if it is registered, construct it otherwise.
pub fn get_service_or_create_instance<T: Activate, R: ServiceResolver + ?Sized>(
    resolver: &R,
) -> Result<Arc<T>, ResolveError> {
    match resolver.try_inject::<T>()? {
        Some(service) => Ok(service),
        None => create::<T, R>(resolver, &[]),
    }
}
