//! Teardown of cached instances.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;

use crate::{BoxError, ResolveError};

/// Synchronous disposal hook, run when the owning scope or container is disposed.
pub trait Dispose: Send + Sync + 'static {
    fn dispose(&self) -> Result<(), BoxError>;
}

/// Failures collected during a disposal sweep.
///
/// A failing hook never prevents the remaining instances from being disposed.
#[derive(Error, Debug)]
#[error("{} instance(s) failed to dispose", .errors.len())]
pub struct DisposeError {
    pub errors: Vec<BoxError>,
}

/// Disposal state of a cache owner, the container or one scope.
///
/// The flag is raised before the slots are swept, and checked again under each slot lock, so
/// that an instance is never stored in a slot the sweep has already visited.
pub(crate) struct Lifecycle {
    what: &'static str,
    disposed: AtomicBool,
}

impl Lifecycle {
    pub(crate) fn new(what: &'static str) -> Self {
        Self {
            what,
            disposed: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub(crate) fn check(&self) -> Result<(), ResolveError> {
        if self.is_disposed() {
            Err(ResolveError::Disposed { what: self.what })
        } else {
            Ok(())
        }
    }

    /// Raise the flag. Return `false` if it was already raised.
    pub(crate) fn begin_dispose(&self) -> bool {
        !self.disposed.swap(true, Ordering::AcqRel)
    }
}

/// Run every hook, in the given order, and collect the failures.
pub(crate) fn dispose_all<'a>(
    hooks: impl Iterator<Item = (&'a str, &'a dyn Dispose)>,
) -> Result<(), DisposeError> {
    let mut errors = Vec::new();
    for (name, hook) in hooks {
        tracing::debug!(service = name, "disposing");
        if let Err(e) = hook.dispose() {
            tracing::debug!(service = name, error = %e, "disposal failed");
            errors.push(e);
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(DisposeError { errors })
    }
}
