//! The root container.

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::{debug, info, warn};

use crate::descriptor::{Lifetime, ServiceDescriptor};
use crate::dispose::DisposeError;
use crate::engine::{Engine, ResolutionContext};
use crate::{
    BoxError, Instance, ResolveError, ServiceKey, ServiceProviderOptions, ServiceResolver,
    ServiceScope, ValidationError,
};

pub(crate) struct ProviderInner {
    pub(crate) engine: Engine,
}

impl ProviderInner {
    pub(crate) fn check(&self) -> Result<(), ResolveError> {
        self.engine.lifecycle.check()
    }
}

impl Drop for ProviderInner {
    fn drop(&mut self) {
        if let Err(e) = self.engine.dispose() {
            warn!(error = %e, "service provider disposal failed on drop");
        }
    }
}

/// A built container, resolving services from a frozen list of descriptors.
///
/// Handles are cheap to clone and share the same singletons. The container is disposed
/// explicitly with [ServiceProvider::dispose], or when its last handle is dropped.
///
/// The container registers itself: resolving `ServiceProvider` returns a new handle on it.
#[derive(Clone)]
pub struct ServiceProvider {
    pub(crate) inner: Arc<ProviderInner>,
}

impl ServiceProvider {
    /// Freeze a list of descriptors into a container, then validate it if asked to.
    pub fn build(
        descriptors: Vec<ServiceDescriptor>,
        options: ServiceProviderOptions,
    ) -> Result<Self, ValidationError> {
        let provider = Self::freeze(descriptors, options);
        if options.validate_on_build {
            provider.inner.engine.validate()?;
        }
        Ok(provider)
    }

    pub(crate) fn freeze(
        descriptors: Vec<ServiceDescriptor>,
        options: ServiceProviderOptions,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<ProviderInner>| {
            let mut services = descriptors;
            services.push(self_descriptor(weak.clone()));
            ProviderInner {
                engine: Engine::new(services, options),
            }
        });
        info!(
            services = inner.engine.len(),
            validate_on_build = options.validate_on_build,
            validate_scopes = options.validate_scopes,
            "service provider built"
        );
        Self { inner }
    }

    pub fn options(&self) -> &ServiceProviderOptions {
        self.inner.engine.options()
    }

    /// Start a new scope, with its own scoped instances.
    pub fn create_scope(&self) -> ServiceScope {
        ServiceScope::new(self.inner.clone())
    }

    /// Dispose every created singleton, in reverse registration order.
    ///
    /// Calling it again does nothing. The container then refuses any resolution.
    pub fn dispose(&self) -> Result<(), DisposeError> {
        self.inner.engine.dispose()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.engine.lifecycle.is_disposed()
    }
}

/// The container itself, as a transient factory holding a weak handle.
fn self_descriptor(weak: Weak<ProviderInner>) -> ServiceDescriptor {
    ServiceDescriptor::factory::<ServiceProvider, _>(Lifetime::Transient, move |_| {
        let inner = weak.upgrade().ok_or_else(|| {
            Box::new(ResolveError::Disposed { what: "service provider" }) as BoxError
        })?;
        Ok(Arc::new(ServiceProvider { inner }))
    })
}

impl ServiceResolver for ServiceProvider {
    fn get_service(&self, key: &ServiceKey) -> Result<Option<Instance>, ResolveError> {
        self.inner.check()?;
        debug!(service = key.name(), "resolving from the root");
        self.inner.engine.get_service(key, &mut ResolutionContext::root())
    }

    fn get_services(&self, key: &ServiceKey) -> Result<Vec<Instance>, ResolveError> {
        self.inner.check()?;
        self.inner.engine.get_services(key, &mut ResolutionContext::root())
    }

    fn is_service(&self, key: &ServiceKey) -> bool {
        self.inner.engine.is_service(key)
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("services", &self.inner.engine.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
