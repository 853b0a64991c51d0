//! Type identities and type-erased service values.
//!
//! The engine never sees concrete types: it compares [ServiceKey]s and moves [Instance]s around.
//! An instance registered for the service type `T` always carries an `Arc<T>`, so that typed
//! access is a single downcast.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::dispose::Dispose;

/// Identity of a service or parameter type.
///
/// Works for sized types as well as trait objects (`ServiceKey::of::<dyn Logger>()`).
#[derive(Clone, Copy)]
pub struct ServiceKey {
    id: TypeId,
    name: &'static str,
}

impl ServiceKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Human readable type name, for diagnostics only.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A type-erased, reference counted service value.
///
/// Cloning an instance is cheap and preserves identity: clones compare equal with
/// [Instance::ptr_eq].
#[derive(Clone)]
pub struct Instance {
    key: ServiceKey,
    value: Arc<dyn Any + Send + Sync>,
    disposer: Option<Arc<dyn Dispose>>,
}

impl Instance {
    /// Wrap a shared value, keyed by its (possibly unsized) type.
    pub fn new<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            key: ServiceKey::of::<T>(),
            value: Arc::new(value),
            disposer: None,
        }
    }

    /// Wrap an owned value.
    ///
    /// This is the usual way to build explicit arguments for [crate::activator::create_instance].
    pub fn of<T: Send + Sync + 'static>(value: T) -> Self {
        Self::new(Arc::new(value))
    }

    /// Wrap a shared value and remember how to dispose it.
    pub fn disposable<T: Dispose>(value: Arc<T>) -> Self {
        let disposer: Arc<dyn Dispose> = value.clone();
        Self::new(value).with_disposer(disposer)
    }

    pub fn with_disposer(mut self, disposer: Arc<dyn Dispose>) -> Self {
        self.disposer = Some(disposer);
        self
    }

    /// Runtime type of the wrapped value.
    pub fn key(&self) -> ServiceKey {
        self.key
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.key == ServiceKey::of::<T>()
    }

    /// Recover the typed value, if the instance holds a `T`.
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    pub(crate) fn disposer(&self) -> Option<&Arc<dyn Dispose>> {
        self.disposer.as_ref()
    }

    /// Identity comparison: true when both handles come from the same construction.
    pub fn ptr_eq(a: &Instance, b: &Instance) -> bool {
        Arc::ptr_eq(&a.value, &b.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type", &self.key)
            .field("disposable", &self.disposer.is_some())
            .finish()
    }
}
