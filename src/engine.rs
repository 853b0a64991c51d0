//! The resolution engine: lifetime caching and recursive activation.

use std::cell::RefCell;
use std::mem;

use tracing::{debug, warn};

use crate::activate::TypeInfo;
use crate::descriptor::{Factory, Implementation, Lifetime, ServiceDescriptor};
use crate::dispose::{dispose_all, DisposeError, Lifecycle};
use crate::primitive;
use crate::selector::RegistryMatcher;
use crate::{
    BoxError, Instance, ResolveError, ServiceKey, ServiceProviderOptions, ServiceResolver,
    ValidationError,
};

/// Root registry snapshot, frozen at build time.
pub(crate) struct Engine {
    services: Vec<ServiceDescriptor>,
    options: ServiceProviderOptions,
    pub(crate) lifecycle: Lifecycle,
}

/// Private copies of the scoped descriptors, indexed by their position in the root registry.
pub(crate) struct ScopeServices {
    services: Vec<(usize, ServiceDescriptor)>,
    pub(crate) lifecycle: Lifecycle,
}

impl ScopeServices {
    pub(crate) fn snapshot(engine: &Engine) -> Self {
        let services = engine
            .services
            .iter()
            .enumerate()
            .filter(|(_, d)| d.lifetime() == Lifetime::Scoped)
            .map(|(index, d)| (index, d.fresh_copy()))
            .collect();
        Self {
            services,
            lifecycle: Lifecycle::new("scope"),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.services.len()
    }

    fn get(&self, root_index: usize) -> Option<&ServiceDescriptor> {
        self.services
            .binary_search_by_key(&root_index, |(index, _)| *index)
            .ok()
            .map(|position| &self.services[position].1)
    }

    /// Dispose created instances in reverse registration order. Calling it again does nothing.
    pub(crate) fn dispose(&self) -> Result<(), DisposeError> {
        if !self.lifecycle.begin_dispose() {
            return Ok(());
        }
        debug!("disposing scope");
        sweep(self.services.iter().rev().map(|(_, d)| d))
    }
}

/// Empty the slots in the given order, then run the disposal hooks of what they held.
fn sweep<'a>(descriptors: impl Iterator<Item = &'a ServiceDescriptor>) -> Result<(), DisposeError> {
    let created: Vec<_> = descriptors
        .filter_map(|d| d.slot().lock().take().map(|i| (d.service_key(), i)))
        .collect();
    dispose_all(created.iter().filter_map(|(key, instance)| {
        instance.disposer().map(|hook| (key.name(), hook.as_ref()))
    }))
}

/// State threaded through one resolution call.
pub(crate) struct ResolutionContext<'s> {
    scope: Option<&'s ScopeServices>,
    path: Vec<ServiceKey>,
}

impl<'s> ResolutionContext<'s> {
    pub(crate) fn root() -> Self {
        Self {
            scope: None,
            path: Vec::new(),
        }
    }

    pub(crate) fn scoped(scope: &'s ScopeServices) -> Self {
        Self {
            scope: Some(scope),
            path: Vec::new(),
        }
    }

    fn check(&self, key: ServiceKey) -> Result<(), ResolveError> {
        if !self.path.contains(&key) {
            return Ok(());
        }
        let path = self
            .path
            .iter()
            .chain(std::iter::once(&key))
            .map(|k| k.name())
            .collect::<Vec<_>>()
            .join(" -> ");
        Err(ResolveError::CyclicResolution { path })
    }

    fn enter(&mut self, key: ServiceKey) -> Result<(), ResolveError> {
        self.check(key)?;
        self.path.push(key);
        Ok(())
    }

    fn leave(&mut self) {
        self.path.pop();
    }
}

/// Resolver handed to factories: keeps resolving within the current scope and path.
struct ContextResolver<'e, 's> {
    engine: &'e Engine,
    ctx: RefCell<ResolutionContext<'s>>,
}

impl ServiceResolver for ContextResolver<'_, '_> {
    fn get_service(&self, key: &ServiceKey) -> Result<Option<Instance>, ResolveError> {
        self.engine.get_service(key, &mut self.ctx.borrow_mut())
    }

    fn get_services(&self, key: &ServiceKey) -> Result<Vec<Instance>, ResolveError> {
        self.engine.get_services(key, &mut self.ctx.borrow_mut())
    }

    fn is_service(&self, key: &ServiceKey) -> bool {
        self.engine.is_service(key)
    }
}

/// Factory errors that are resolution errors are passed through as such.
fn from_factory(e: BoxError) -> ResolveError {
    match e.downcast::<ResolveError>() {
        Ok(e) => *e,
        Err(e) => ResolveError::Constructor(e),
    }
}

/// Key used to detect cycles, `None` for pre-built instances.
fn activation_key(descriptor: &ServiceDescriptor) -> Option<ServiceKey> {
    match descriptor.implementation() {
        Implementation::Type(info) => Some(info.key()),
        Implementation::Factory(_) => Some(descriptor.service_key()),
        Implementation::Instance(_) => None,
    }
}

impl Engine {
    pub(crate) fn new(services: Vec<ServiceDescriptor>, options: ServiceProviderOptions) -> Self {
        Self {
            services,
            options,
            lifecycle: Lifecycle::new("service provider"),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.services.len()
    }

    pub(crate) fn options(&self) -> &ServiceProviderOptions {
        &self.options
    }

    pub(crate) fn is_service(&self, key: &ServiceKey) -> bool {
        self.services.iter().any(|d| d.service_key() == *key)
    }

    /// Resolve the last registration of a key.
    pub(crate) fn get_service(
        &self,
        key: &ServiceKey,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Option<Instance>, ResolveError> {
        let last = self
            .services
            .iter()
            .enumerate()
            .rev()
            .find(|(_, d)| d.service_key() == *key);
        match last {
            None => Ok(None),
            Some((index, descriptor)) => {
                self.resolve_descriptor(index, descriptor, ctx).map(Some)
            }
        }
    }

    /// Resolve every registration of a key, in registration order.
    pub(crate) fn get_services(
        &self,
        key: &ServiceKey,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Vec<Instance>, ResolveError> {
        self.services
            .iter()
            .enumerate()
            .filter(|(_, d)| d.service_key() == *key)
            .map(|(index, descriptor)| self.resolve_descriptor(index, descriptor, ctx))
            .collect()
    }

    /// Apply the lifetime policy of a root descriptor.
    fn resolve_descriptor(
        &self,
        index: usize,
        descriptor: &ServiceDescriptor,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Instance, ResolveError> {
        match descriptor.lifetime() {
            Lifetime::Transient => self.create(descriptor, ctx),
            Lifetime::Singleton if ctx.scope.is_none() => {
                self.cached(descriptor, &self.lifecycle, ctx)
            }
            Lifetime::Singleton => {
                // Singleton dependencies are resolved at the root, never from the current scope
                let mut root = ResolutionContext {
                    scope: None,
                    path: mem::take(&mut ctx.path),
                };
                let result = self.cached(descriptor, &self.lifecycle, &mut root);
                ctx.path = root.path;
                result
            }
            Lifetime::Scoped => {
                let scoped = ctx
                    .scope
                    .and_then(|scope| scope.get(index).map(|d| (scope, d)));
                match scoped {
                    Some((scope, scoped)) => self.cached(scoped, &scope.lifecycle, ctx),
                    None if self.options.validate_scopes => Err(ResolveError::ScopedFromRoot {
                        service: descriptor.service_key().name(),
                    }),
                    None => self.create(descriptor, ctx),
                }
            }
        }
    }

    /// Check the slot, construct if empty and store, as one atomic unit.
    ///
    /// The owner is checked under the slot lock: a disposed owner never gets a new instance.
    fn cached(
        &self,
        descriptor: &ServiceDescriptor,
        owner: &Lifecycle,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Instance, ResolveError> {
        // A slot being filled on this thread must not be locked again
        if let Some(key) = activation_key(descriptor) {
            ctx.check(key)?;
        }
        let mut slot = descriptor.slot().lock();
        owner.check()?;
        if let Some(instance) = slot.as_ref() {
            return Ok(instance.clone());
        }
        let instance = self.create(descriptor, ctx)?;
        debug!(
            service = descriptor.service_key().name(),
            lifetime = %descriptor.lifetime(),
            "cached new instance"
        );
        *slot = Some(instance.clone());
        Ok(instance)
    }

    fn create(
        &self,
        descriptor: &ServiceDescriptor,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Instance, ResolveError> {
        match descriptor.implementation() {
            Implementation::Instance(instance) => Ok(instance.clone()),
            Implementation::Type(info) => {
                ctx.enter(info.key())?;
                let result = self.activate(info, ctx);
                ctx.leave();
                result
            }
            Implementation::Factory(factory) => {
                ctx.enter(descriptor.service_key())?;
                let result = self.call_factory(factory, ctx);
                ctx.leave();
                result
            }
        }
    }

    /// Build an instance of a concrete type, resolving its parameters recursively.
    ///
    /// Registered parameters are always resolved. A primitive without registration binds its
    /// zero value, or stays absent if the parameter accepts it.
    fn activate(
        &self,
        info: &TypeInfo,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Instance, ResolveError> {
        let target = info.key().name();
        let constructor = RegistryMatcher::select(info, |key| self.is_service(key))?;
        debug!(ty = target, parameters = constructor.parameters().len(), "activating");

        let mut slots = Vec::with_capacity(constructor.parameters().len());
        let parameters = constructor.parameters().iter().zip(constructor.accepts_absent());
        for (parameter, &accepts_absent) in parameters {
            let slot = match self.get_service(parameter, ctx)? {
                Some(value) => Some(value),
                None => match primitive::default_for(parameter) {
                    Some(Some(zero)) => Some(zero),
                    Some(None) if accepts_absent => None,
                    _ => {
                        return Err(ResolveError::UnresolvableParameter {
                            parameter: parameter.name(),
                            target,
                        })
                    }
                },
            };
            slots.push(slot);
        }
        constructor.invoke(&slots)
    }

    fn call_factory(
        &self,
        factory: &Factory,
        ctx: &mut ResolutionContext<'_>,
    ) -> Result<Instance, ResolveError> {
        let resolver = ContextResolver {
            engine: self,
            ctx: RefCell::new(ResolutionContext {
                scope: ctx.scope,
                path: mem::take(&mut ctx.path),
            }),
        };
        let result = factory(&resolver).map_err(from_factory);
        ctx.path = resolver.ctx.into_inner().path;
        result
    }

    /// Construct every non-instance descriptor once, collecting all failures.
    ///
    /// Scoped services are built in a throwaway scope, disposed afterwards.
    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        let scope = ScopeServices::snapshot(self);
        let mut errors = Vec::new();
        for (index, descriptor) in self.services.iter().enumerate() {
            if matches!(descriptor.implementation(), Implementation::Instance(_)) {
                continue;
            }
            let mut ctx = ResolutionContext::scoped(&scope);
            if let Err(e) = self.resolve_descriptor(index, descriptor, &mut ctx) {
                debug!(descriptor = %descriptor, error = %e, "validation failed");
                errors.push((descriptor.to_string(), e));
            }
        }
        if let Err(e) = scope.dispose() {
            warn!(error = %e, "failed to dispose the validation scope");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { errors })
        }
    }

    /// Dispose cached instances in reverse registration order. Calling it again does nothing.
    ///
    /// Only singletons are ever cached at the root.
    pub(crate) fn dispose(&self) -> Result<(), DisposeError> {
        if !self.lifecycle.begin_dispose() {
            return Ok(());
        }
        debug!("disposing service provider");
        sweep(self.services.iter().rev().filter(|d| d.lifetime().is_cached()))
    }
}
