//! Scopes: bounded resolution contexts owning their scoped instances.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::dispose::DisposeError;
use crate::engine::{ResolutionContext, ScopeServices};
use crate::provider::ProviderInner;
use crate::{Instance, ResolveError, ServiceKey, ServiceProvider, ServiceResolver};

/// A resolution context with its own cache of scoped services.
///
/// Singletons still come from the root container. The scope is disposed explicitly with
/// [ServiceScope::dispose] or when dropped, which runs the disposal hooks of the scoped
/// instances it created, most recent registration first.
pub struct ServiceScope {
    root: Arc<ProviderInner>,
    services: ScopeServices,
}

impl ServiceScope {
    pub(crate) fn new(root: Arc<ProviderInner>) -> Self {
        let services = ScopeServices::snapshot(&root.engine);
        debug!(scoped = services.len(), "scope created");
        Self { root, services }
    }

    /// Start a sibling scope on the same root container.
    ///
    /// Scopes do not nest: the new scope shares nothing with this one but the singletons.
    pub fn create_scope(&self) -> ServiceScope {
        ServiceScope::new(self.root.clone())
    }

    /// Handle on the root container.
    pub fn service_provider(&self) -> ServiceProvider {
        ServiceProvider {
            inner: self.root.clone(),
        }
    }

    /// Dispose every scoped instance created by this scope. Calling it again does nothing.
    pub fn dispose(&self) -> Result<(), DisposeError> {
        self.services.dispose()
    }

    pub fn is_disposed(&self) -> bool {
        self.services.lifecycle.is_disposed()
    }

    fn check(&self) -> Result<(), ResolveError> {
        self.services.lifecycle.check()?;
        self.root.check()
    }
}

impl ServiceResolver for ServiceScope {
    fn get_service(&self, key: &ServiceKey) -> Result<Option<Instance>, ResolveError> {
        self.check()?;
        debug!(service = key.name(), "resolving from a scope");
        self.root
            .engine
            .get_service(key, &mut ResolutionContext::scoped(&self.services))
    }

    fn get_services(&self, key: &ServiceKey) -> Result<Vec<Instance>, ResolveError> {
        self.check()?;
        self.root
            .engine
            .get_services(key, &mut ResolutionContext::scoped(&self.services))
    }

    fn is_service(&self, key: &ServiceKey) -> bool {
        self.root.engine.is_service(key)
    }
}

impl Drop for ServiceScope {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            warn!(error = %e, "scope disposal failed on drop");
        }
    }
}

impl fmt::Debug for ServiceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceScope")
            .field("scoped", &self.services.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
