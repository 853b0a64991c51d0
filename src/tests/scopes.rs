use std::sync::Arc;

use super::fakes::*;
use crate::*;

#[test]
fn scoped_services_are_isolated() -> Result<(), ResolveError> {
    let mut services = ServiceCollection::new();
    services.add_scoped::<dyn Logger, ConsoleLogger>();
    let provider = services.build_service_provider();

    let first = provider.create_scope();
    let second = provider.create_scope();

    let l1: Arc<dyn Logger> = first.inject()?;
    let l2: Arc<dyn Logger> = first.inject()?;
    let l3: Arc<dyn Logger> = second.inject()?;
    assert!(same(&l1, &l2));
    assert!(!same(&l1, &l3));
    Ok(())
}

#[test]
fn singletons_are_shared_by_scopes() -> Result<(), ResolveError> {
    let mut services = ServiceCollection::new();
    services.add_singleton::<dyn Logger, ConsoleLogger>();
    let provider = services.build_service_provider();

    let scope = provider.create_scope();
    let sibling = scope.create_scope();
    assert!(same(&scope.inject::<dyn Logger>()?, &provider.inject::<dyn Logger>()?));
    assert!(same(&sibling.inject::<dyn Logger>()?, &provider.inject::<dyn Logger>()?));
    Ok(())
}

#[test]
fn scoped_services_from_the_root_are_not_cached() -> Result<(), ResolveError> {
    let mut services = ServiceCollection::new();
    services.add_scoped::<dyn Logger, ConsoleLogger>();
    let provider = services.build_service_provider();

    assert!(!same(&provider.inject::<dyn Logger>()?, &provider.inject::<dyn Logger>()?));
    Ok(())
}

#[test]
fn scoped_services_from_the_root_can_be_refused() {
    let mut services = ServiceCollection::new();
    services.add_scoped::<dyn Logger, ConsoleLogger>();
    let options = ServiceProviderOptions::new().validate_scopes(true);
    let provider = services.build_service_provider_with(options).unwrap();

    assert!(matches!(
        provider.inject::<dyn Logger>(),
        Err(ResolveError::ScopedFromRoot { .. })
    ));
    assert!(provider.create_scope().inject::<dyn Logger>().is_ok());
}

#[test]
fn singleton_dependencies_come_from_the_root() -> Result<(), ResolveError> {
    let mut services = ServiceCollection::new();
    services
        .add_scoped::<dyn Logger, ConsoleLogger>()
        .add_singleton::<dyn Work, Worker>();
    let provider = services.build_service_provider();

    let scope = provider.create_scope();
    let worker: Arc<dyn Work> = scope.inject()?;
    assert!(!same(&worker.logger(), &scope.inject::<dyn Logger>()?));
    Ok(())
}

#[test]
fn scopes_dispose_in_reverse_registration_order() -> Result<(), BoxError> {
    let (mut services, journal) = journaled();
    services.add_scoped::<A, A>().add_scoped::<B, B>().add_scoped::<C, C>();
    let provider = services.build_service_provider();

    let scope = provider.create_scope();
    scope.inject::<C>()?;
    scope.inject::<A>()?;
    scope.inject::<B>()?;
    scope.dispose()?;

    assert_eq!(journal.entries(), vec!["C", "B", "A"]);
    Ok(())
}

#[test]
fn only_created_instances_are_disposed() -> Result<(), BoxError> {
    let (mut services, journal) = journaled();
    services.add_scoped::<A, A>().add_scoped::<B, B>().add_transient::<C, C>();
    let provider = services.build_service_provider();

    let scope = provider.create_scope();
    scope.inject::<B>()?;
    scope.inject::<C>()?;
    scope.dispose()?;

    assert_eq!(journal.entries(), vec!["B"]);
    Ok(())
}

#[test]
fn disposed_scopes_refuse_resolution() -> Result<(), BoxError> {
    let (mut services, journal) = journaled();
    services.add_scoped::<A, A>();
    let provider = services.build_service_provider();

    let scope = provider.create_scope();
    scope.inject::<A>()?;
    scope.dispose()?;
    scope.dispose()?;

    assert_eq!(journal.entries(), vec!["A"]);
    assert!(scope.is_disposed());
    assert!(matches!(scope.inject::<A>(), Err(ResolveError::Disposed { .. })));
    Ok(())
}

#[test]
fn dropping_a_scope_disposes_it() -> Result<(), BoxError> {
    let (mut services, journal) = journaled();
    services.add_scoped::<A, A>();
    let provider = services.build_service_provider();

    {
        let scope = provider.create_scope();
        scope.inject::<A>()?;
        assert!(journal.entries().is_empty());
    }
    assert_eq!(journal.entries(), vec!["A"]);
    Ok(())
}

#[test]
fn failing_hooks_do_not_stop_disposal() -> Result<(), BoxError> {
    let (mut services, journal) = journaled();
    services.add_scoped::<A, A>().add_scoped::<Faulty, Faulty>();
    let provider = services.build_service_provider();

    let scope = provider.create_scope();
    scope.inject::<A>()?;
    scope.inject::<Faulty>()?;

    let error = scope.dispose().unwrap_err();
    assert_eq!(error.errors.len(), 1);
    assert_eq!(error.errors[0].to_string(), "socket already closed");
    assert_eq!(journal.entries(), vec!["A"]);
    Ok(())
}

#[test]
fn the_container_disposes_its_singletons() -> Result<(), BoxError> {
    let (mut services, journal) = journaled();
    services
        .add_singleton::<A, A>()
        .add_singleton::<Faulty, Faulty>()
        .add_singleton::<B, B>()
        .add_scoped::<C, C>();
    let provider = services.build_service_provider();

    let scope = provider.create_scope();
    scope.inject::<A>()?;
    scope.inject::<Faulty>()?;
    scope.inject::<B>()?;

    // the failing singleton does not keep the others alive
    let error = provider.dispose().unwrap_err();
    assert_eq!(error.errors.len(), 1);
    assert_eq!(error.errors[0].to_string(), "socket already closed");
    assert_eq!(journal.entries(), vec!["B", "A"]);

    // the scope outlives the container, but cannot resolve anymore
    assert!(matches!(scope.inject::<C>(), Err(ResolveError::Disposed { .. })));
    assert!(matches!(provider.inject::<A>(), Err(ResolveError::Disposed { .. })));
    provider.dispose()?;
    assert_eq!(journal.entries(), vec!["B", "A"]);
    Ok(())
}

#[test]
fn dropping_the_last_handle_disposes_the_container() -> Result<(), BoxError> {
    let (mut services, journal) = journaled();
    services.add_singleton::<A, A>();
    let provider = services.build_service_provider();

    let handle = provider.clone();
    handle.inject::<A>()?;
    drop(provider);
    assert!(journal.entries().is_empty());
    drop(handle);
    assert_eq!(journal.entries(), vec!["A"]);
    Ok(())
}
