//! Service descriptors: what a service key resolves to and how long it lives.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::activate::{Activate, Implements, TypeInfo};
use crate::{BoxError, Instance, ServiceKey, ServiceResolver};

/// Instance reuse policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance for the whole container, shared by every scope.
    Singleton,
    /// One instance per scope.
    Scoped,
    /// A new instance on every resolution.
    Transient,
}

impl Lifetime {
    pub fn is_cached(&self) -> bool {
        matches!(self, Lifetime::Singleton | Lifetime::Scoped)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => write!(f, "Singleton"),
            Lifetime::Scoped => write!(f, "Scoped"),
            Lifetime::Transient => write!(f, "Transient"),
        }
    }
}

/// Factory closure, called with the resolver of the current resolution.
pub type Factory = Arc<dyn Fn(&dyn ServiceResolver) -> Result<Instance, BoxError> + Send + Sync>;

/// How a descriptor produces its instance.
#[derive(Clone)]
pub enum Implementation {
    /// Construct a concrete type, selecting one of its constructors.
    Type(TypeInfo),
    /// A pre-built instance.
    Instance(Instance),
    /// Call a factory closure.
    Factory(Factory),
}

/// Binding of a service key to an implementation and a lifetime.
///
/// The identity of a descriptor never changes once built; only its cache slot does.
pub struct ServiceDescriptor {
    service_key: ServiceKey,
    implementation: Implementation,
    lifetime: Lifetime,
    slot: Mutex<Option<Instance>>,
}

impl ServiceDescriptor {
    pub fn new(
        service_key: ServiceKey,
        implementation: Implementation,
        lifetime: Lifetime,
    ) -> Self {
        let (lifetime, slot) = match &implementation {
            Implementation::Instance(instance) => (Lifetime::Singleton, Some(instance.clone())),
            _ => (lifetime, None),
        };
        Self {
            service_key,
            implementation,
            lifetime,
            slot: Mutex::new(slot),
        }
    }

    /// Describe the concrete type `T`, provided as the service type `S`.
    pub fn describe<S, T>(lifetime: Lifetime) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        Self::new(
            ServiceKey::of::<S>(),
            Implementation::Type(TypeInfo::implementing::<S, T>()),
            lifetime,
        )
    }

    pub fn singleton<S, T>() -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        Self::describe::<S, T>(Lifetime::Singleton)
    }

    pub fn scoped<S, T>() -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        Self::describe::<S, T>(Lifetime::Scoped)
    }

    pub fn transient<S, T>() -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        Self::describe::<S, T>(Lifetime::Transient)
    }

    /// Describe a pre-built instance. The lifetime is always [Lifetime::Singleton].
    pub fn instance<S: ?Sized + Send + Sync + 'static>(value: Arc<S>) -> Self {
        Self::from_instance(ServiceKey::of::<S>(), Instance::new(value))
    }

    pub fn from_instance(service_key: ServiceKey, instance: Instance) -> Self {
        Self::new(service_key, Implementation::Instance(instance), Lifetime::Singleton)
    }

    /// Describe a typed factory for the service type `S`.
    pub fn factory<S, F>(lifetime: Lifetime, factory: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn ServiceResolver) -> Result<Arc<S>, BoxError> + Send + Sync + 'static,
    {
        let erased: Factory = Arc::new(move |resolver: &dyn ServiceResolver| {
            factory(resolver).map(Instance::new::<S>)
        });
        Self::new(ServiceKey::of::<S>(), Implementation::Factory(erased), lifetime)
    }

    pub fn service_key(&self) -> ServiceKey {
        self.service_key
    }

    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Key of the implementation type, when it is known.
    pub fn implementation_key(&self) -> Option<ServiceKey> {
        match &self.implementation {
            Implementation::Type(info) => Some(info.key()),
            Implementation::Instance(instance) => Some(instance.key()),
            Implementation::Factory(_) => None,
        }
    }

    /// The cached instance, if already created.
    pub fn cached_instance(&self) -> Option<Instance> {
        self.slot.lock().clone()
    }

    pub(crate) fn slot(&self) -> &Mutex<Option<Instance>> {
        &self.slot
    }

    /// Same identity, fresh empty slot.
    pub(crate) fn fresh_copy(&self) -> Self {
        Self::new(self.service_key, self.implementation.clone(), self.lifetime)
    }
}

impl fmt::Display for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceType: {} Lifetime: {} ", self.service_key, self.lifetime)?;
        match &self.implementation {
            Implementation::Type(info) => write!(f, "ImplementationType: {}", info.key()),
            Implementation::Instance(instance) => {
                write!(f, "ImplementationInstance: {}", instance.key())
            }
            Implementation::Factory(_) => write!(f, "ImplementationFactory"),
        }
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("service_key", &self.service_key)
            .field("lifetime", &self.lifetime)
            .field("implementation", &self.implementation_key())
            .finish()
    }
}
