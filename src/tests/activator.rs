use std::sync::Arc;

use super::fakes::*;
use crate::activator::{create, get_service_or_create_instance};
use crate::*;

fn strings(values: &[&str]) -> Vec<Instance> {
    values.iter().map(|v| Instance::of(v.to_string())).collect()
}

fn with_logger() -> ServiceProvider {
    let mut services = ServiceCollection::new();
    services.add_singleton::<dyn Logger, ConsoleLogger>();
    services.build_service_provider()
}

#[test]
fn arguments_fill_matching_slots() -> Result<(), ResolveError> {
    let provider = with_logger();

    let greeting = create::<Greeting, _>(&provider, &strings(&["1", "2"]))?;
    assert_eq!(greeting.first, "1");
    assert_eq!(greeting.second, "2");
    assert!(same(&greeting.logger, &provider.inject::<dyn Logger>()?));
    Ok(())
}

#[test]
fn extraneous_arguments_are_refused() {
    let provider = with_logger();

    assert!(matches!(
        create::<Greeting, _>(&provider, &strings(&["1", "2", "3"])),
        Err(ResolveError::NoSuitableConstructor { .. })
    ));
}

#[test]
fn remaining_parameters_must_be_registered() {
    let provider = ServiceCollection::new().build_service_provider();

    assert!(matches!(
        create::<Greeting, _>(&provider, &strings(&["1", "2"])),
        Err(ResolveError::UnresolvableParameter { .. })
    ));
}

#[test]
fn explicit_arguments_get_no_primitive_default() -> Result<(), ResolveError> {
    struct Port(u16);
    activate!(Port, Port);

    let provider = ServiceCollection::new().build_service_provider();
    assert!(matches!(
        create::<Port, _>(&provider, &[]),
        Err(ResolveError::UnresolvableParameter { .. })
    ));
    assert_eq!(create::<Port, _>(&provider, &[Instance::of(8080u16)])?.0, 8080);
    Ok(())
}

#[test]
fn the_scope_resolves_remaining_parameters() -> Result<(), ResolveError> {
    let mut services = ServiceCollection::new();
    services.add_scoped::<dyn Logger, ConsoleLogger>();
    let provider = services.build_service_provider();
    let scope = provider.create_scope();

    let info = TypeInfo::of::<Greeting>();
    let instance = activator::create_instance(&scope, &info, &strings(&["a", "b"]))?;
    let greeting = instance.downcast::<Greeting>().unwrap();
    assert!(same(&greeting.logger, &scope.inject::<dyn Logger>()?));
    Ok(())
}

#[test]
fn registered_services_are_preferred() -> Result<(), ResolveError> {
    let provider = with_logger();
    let a1 = get_service_or_create_instance::<Worker, _>(&provider)?;
    let a2 = get_service_or_create_instance::<Worker, _>(&provider)?;
    assert!(!same(&a1, &a2));

    let mut services = ServiceCollection::new();
    services
        .add_singleton::<dyn Logger, ConsoleLogger>()
        .add_singleton::<Worker, Worker>();
    let provider = services.build_service_provider();
    let b1: Arc<Worker> = get_service_or_create_instance(&provider)?;
    let b2: Arc<Worker> = provider.inject()?;
    assert!(same(&b1, &b2));
    Ok(())
}
