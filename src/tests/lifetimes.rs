use std::sync::Arc;

use super::fakes::*;
use crate::*;

fn logging_services() -> ServiceCollection {
    let mut services = ServiceCollection::new();
    services
        .add_singleton::<dyn Logger, ConsoleLogger>()
        .add_transient::<dyn Work, Worker>();
    services
}

#[test]
fn singletons_are_shared() -> Result<(), ResolveError> {
    let provider = logging_services().build_service_provider();

    let l1: Arc<dyn Logger> = provider.inject()?;
    let l2: Arc<dyn Logger> = provider.inject()?;
    assert!(same(&l1, &l2));
    Ok(())
}

#[test]
fn workers_share_the_console_logger() -> Result<(), ResolveError> {
    let provider = logging_services().build_service_provider();

    // two transient workers, built around the same singleton logger
    let w1: Arc<dyn Work> = provider.inject()?;
    let w2: Arc<dyn Work> = provider.inject()?;
    assert!(!same(&w1, &w2));
    assert!(same(&w1.logger(), &w2.logger()));

    w1.logger().log("started");
    assert_eq!(w2.logger().lines(), vec!["started".to_string()]);
    Ok(())
}

#[test]
fn last_registration_wins() -> Result<(), ResolveError> {
    let mut services = ServiceCollection::new();
    services
        .add_singleton::<dyn Logger, ConsoleLogger>()
        .add_singleton::<dyn Logger, SilentLogger>();
    let provider = services.build_service_provider();

    assert_eq!(provider.inject::<dyn Logger>()?.name(), "silent");

    let names: Vec<_> = provider
        .inject_all::<dyn Logger>()?
        .iter()
        .map(|logger| logger.name())
        .collect();
    assert_eq!(names, vec!["console", "silent"]);
    Ok(())
}

#[test]
fn missing_services_are_absent() -> Result<(), ResolveError> {
    let provider = ServiceCollection::new().build_service_provider();

    assert!(provider.try_inject::<dyn Logger>()?.is_none());
    assert!(provider.inject_all::<dyn Logger>()?.is_empty());
    assert!(!provider.is_service(&ServiceKey::of::<dyn Logger>()));
    assert!(matches!(
        provider.inject::<dyn Logger>(),
        Err(ResolveError::NotRegistered { .. })
    ));
    Ok(())
}

#[test]
fn instances_are_returned_as_registered() -> Result<(), ResolveError> {
    let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger::default());
    let mut services = ServiceCollection::new();
    services.add_singleton_instance(logger.clone());
    let provider = services.build_service_provider();

    assert!(same(&provider.inject::<dyn Logger>()?, &logger));
    Ok(())
}

#[test]
fn factories_follow_their_lifetime() -> Result<(), ResolveError> {
    let mut services = ServiceCollection::new();
    services
        .add_singleton::<dyn Logger, ConsoleLogger>()
        .add_transient_factory::<dyn Work, _>(|resolver| {
            let worker: Arc<dyn Work> = Arc::new(Worker::new(resolver.inject()?));
            Ok(worker)
        })
        .add_singleton_factory::<String, _>(|_| Ok(Arc::new("configured".to_string())));
    let provider = services.build_service_provider();

    let w1: Arc<dyn Work> = provider.inject()?;
    let w2: Arc<dyn Work> = provider.inject()?;
    assert!(!same(&w1, &w2));
    assert!(same(&w1.logger(), &w2.logger()));

    let s1: Arc<String> = provider.inject()?;
    let s2: Arc<String> = provider.inject()?;
    assert!(same(&s1, &s2));
    assert_eq!(*s1, "configured");
    Ok(())
}

#[test]
fn factory_resolution_errors_are_not_wrapped() {
    let mut services = ServiceCollection::new();
    services.add_transient_factory::<dyn Work, _>(|resolver| {
        let worker: Arc<dyn Work> = Arc::new(Worker::new(resolver.inject()?));
        Ok(worker)
    });
    let provider = services.build_service_provider();

    assert!(matches!(
        provider.inject::<dyn Work>(),
        Err(ResolveError::NotRegistered { .. })
    ));
}

#[test]
fn the_container_resolves_itself() -> Result<(), ResolveError> {
    let provider = logging_services().build_service_provider();

    let itself: Arc<ServiceProvider> = provider.inject()?;
    assert!(itself.is_service(&ServiceKey::of::<dyn Work>()));
    assert!(same(&itself.inject::<dyn Logger>()?, &provider.inject::<dyn Logger>()?));
    Ok(())
}

#[test]
fn services_are_found_through_the_untyped_surface() -> Result<(), ResolveError> {
    let provider = logging_services().build_service_provider();
    let resolver: &dyn ServiceResolver = &provider;

    let key = ServiceKey::of::<dyn Logger>();
    let instance = resolver.get_required_service(&key)?;
    assert!(instance.is::<dyn Logger>());
    assert!(Instance::ptr_eq(&instance, &resolver.get_required_service(&key)?));
    assert_eq!(resolver.get_services(&key)?.len(), 1);
    Ok(())
}

#[test]
fn several_service_types_resolve_in_order() -> Result<(), ResolveError> {
    let mut services = logging_services();
    services.add_singleton::<dyn Logger, SilentLogger>();
    let provider = services.build_service_provider();

    let keys = [ServiceKey::of::<dyn Work>(), ServiceKey::of::<dyn Logger>()];
    let instances = provider.get_services_of(&keys)?;
    assert_eq!(instances.len(), 3);
    assert!(instances[0].is::<dyn Work>());
    let names: Vec<_> = instances[1..]
        .iter()
        .map(|i| i.downcast::<dyn Logger>().map(|logger| logger.name()))
        .collect();
    assert_eq!(names, vec![Some("console"), Some("silent")]);

    assert!(matches!(
        provider.get_services_of(&[]),
        Err(ResolveError::NoServiceTypes)
    ));
    Ok(())
}
