//! The mutable registry, turned into a container by [ServiceCollection::build_service_provider].

use std::ops::{Index, IndexMut};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::activate::{Activate, Implements};
use crate::descriptor::{Lifetime, ServiceDescriptor};
use crate::{
    BoxError, ServiceKey, ServiceProvider, ServiceProviderOptions, ServiceResolver,
    ValidationError,
};

/// Ordered list of service descriptors.
///
/// Registration order matters: single resolution uses the last descriptor of a key, and
/// multiple resolution returns instances in this order.
///
/// Every `add_*` helper takes the service type first and the implementation type second;
/// register a type as itself with `add_singleton::<T, T>()`.
#[derive(Debug, Default)]
pub struct ServiceCollection {
    descriptors: Vec<ServiceDescriptor>,
}

/// Errors triggered by a rejected registration
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Implementation type cannot be '{service}' because it is the same as the service type")]
    SelfMapped { service: &'static str },
    #[error("The implementation type of '{service}' cannot be determined")]
    UnknownImplementation { service: &'static str },
}

impl ServiceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ServiceDescriptor> {
        self.descriptors.get(index)
    }

    /// Replace the descriptor at a position, returning the previous one.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set(&mut self, index: usize, descriptor: ServiceDescriptor) -> ServiceDescriptor {
        std::mem::replace(&mut self.descriptors[index], descriptor)
    }

    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, descriptor: ServiceDescriptor) {
        self.descriptors.insert(index, descriptor);
    }

    pub fn add(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        debug!(descriptor = %descriptor, "registered");
        self.descriptors.push(descriptor);
        self
    }

    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove_at(&mut self, index: usize) -> ServiceDescriptor {
        self.descriptors.remove(index)
    }

    pub fn clear(&mut self) {
        self.descriptors.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServiceDescriptor> {
        self.descriptors.iter()
    }

    /// Check if at least one descriptor is registered for a key.
    pub fn contains_key(&self, key: &ServiceKey) -> bool {
        self.descriptors.iter().any(|d| d.service_key() == *key)
    }

    pub fn add_singleton<S, T>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        self.add(ServiceDescriptor::singleton::<S, T>())
    }

    pub fn add_scoped<S, T>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        self.add(ServiceDescriptor::scoped::<S, T>())
    }

    pub fn add_transient<S, T>(&mut self) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        self.add(ServiceDescriptor::transient::<S, T>())
    }

    /// Register a pre-built instance, always a singleton.
    pub fn add_singleton_instance<S: ?Sized + Send + Sync + 'static>(
        &mut self,
        value: Arc<S>,
    ) -> &mut Self {
        self.add(ServiceDescriptor::instance(value))
    }

    pub fn add_singleton_factory<S, F>(&mut self, factory: F) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn ServiceResolver) -> Result<Arc<S>, BoxError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::factory::<S, F>(Lifetime::Singleton, factory))
    }

    pub fn add_scoped_factory<S, F>(&mut self, factory: F) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn ServiceResolver) -> Result<Arc<S>, BoxError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::factory::<S, F>(Lifetime::Scoped, factory))
    }

    pub fn add_transient_factory<S, F>(&mut self, factory: F) -> &mut Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn ServiceResolver) -> Result<Arc<S>, BoxError> + Send + Sync + 'static,
    {
        self.add(ServiceDescriptor::factory::<S, F>(Lifetime::Transient, factory))
    }

    /// Add a descriptor only if its key has no registration yet.
    pub fn try_add(&mut self, descriptor: ServiceDescriptor) -> bool {
        if self.contains_key(&descriptor.service_key()) {
            return false;
        }
        self.add(descriptor);
        true
    }

    pub fn try_add_singleton<S, T>(&mut self) -> bool
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        self.try_add(ServiceDescriptor::singleton::<S, T>())
    }

    pub fn try_add_scoped<S, T>(&mut self) -> bool
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        self.try_add(ServiceDescriptor::scoped::<S, T>())
    }

    pub fn try_add_transient<S, T>(&mut self) -> bool
    where
        S: ?Sized + Send + Sync + 'static,
        T: Activate + Implements<S>,
    {
        self.try_add(ServiceDescriptor::transient::<S, T>())
    }

    /// Add one more implementation of a key, unless this exact implementation is already there.
    ///
    /// Meant for keys resolved with `get_services`: the implementation type must be known and
    /// differ from the service type.
    pub fn try_add_enumerable(
        &mut self,
        descriptor: ServiceDescriptor,
    ) -> Result<bool, RegistrationError> {
        let service = descriptor.service_key();
        let implementation = descriptor
            .implementation_key()
            .ok_or(RegistrationError::UnknownImplementation { service: service.name() })?;
        if implementation == service {
            return Err(RegistrationError::SelfMapped { service: service.name() });
        }
        let present = self
            .descriptors
            .iter()
            .any(|d| d.service_key() == service && d.implementation_key() == Some(implementation));
        if present {
            return Ok(false);
        }
        self.add(descriptor);
        Ok(true)
    }

    /// Apply [ServiceCollection::try_add_enumerable] to each descriptor, stopping at the first
    /// rejected one.
    pub fn try_add_enumerable_all(
        &mut self,
        descriptors: impl IntoIterator<Item = ServiceDescriptor>,
    ) -> Result<(), RegistrationError> {
        for descriptor in descriptors {
            self.try_add_enumerable(descriptor)?;
        }
        Ok(())
    }

    /// Remove the first descriptor of the same key, if any, and append the new one.
    pub fn replace(&mut self, descriptor: ServiceDescriptor) -> &mut Self {
        let service = descriptor.service_key();
        if let Some(index) = self.descriptors.iter().position(|d| d.service_key() == service) {
            self.descriptors.remove(index);
        }
        self.add(descriptor)
    }

    /// Remove every descriptor of a key.
    pub fn remove_all(&mut self, key: &ServiceKey) -> &mut Self {
        self.descriptors.retain(|d| d.service_key() != *key);
        self
    }

    /// Build a container with the default options.
    pub fn build_service_provider(self) -> ServiceProvider {
        ServiceProvider::freeze(self.descriptors, ServiceProviderOptions::default())
    }

    pub fn build_service_provider_with(
        self,
        options: ServiceProviderOptions,
    ) -> Result<ServiceProvider, ValidationError> {
        ServiceProvider::build(self.descriptors, options)
    }
}

impl Index<usize> for ServiceCollection {
    type Output = ServiceDescriptor;

    fn index(&self, index: usize) -> &ServiceDescriptor {
        &self.descriptors[index]
    }
}

impl IndexMut<usize> for ServiceCollection {
    fn index_mut(&mut self, index: usize) -> &mut ServiceDescriptor {
        &mut self.descriptors[index]
    }
}

impl<'a> IntoIterator for &'a ServiceCollection {
    type Item = &'a ServiceDescriptor;
    type IntoIter = std::slice::Iter<'a, ServiceDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl Extend<ServiceDescriptor> for ServiceCollection {
    fn extend<I: IntoIterator<Item = ServiceDescriptor>>(&mut self, iter: I) {
        for descriptor in iter {
            self.add(descriptor);
        }
    }
}
