use std::sync::Arc;

use anyhow::{Result, ensure};
use fixgen::{
    Blueprint, FixtureError, FixtureRegistry, FixtureSession, MaterializeConfig, Materializer,
    ModelType, Register, RegisterError, RegistryError, Value,
};
use once_cell::sync::Lazy;

static FOO: Lazy<Arc<Blueprint>> = Lazy::new(|| {
    Blueprint::builder("FooFactory")
        .model(ModelType::new("Foo"))
        .declare("value", "register(FooFactory)")
        .build()
});

fn materializer() -> Materializer {
    Materializer::new(MaterializeConfig::in_memory()).expect("in-memory materializer")
}

fn value_of(session: &mut FixtureSession, fixture: &str) -> Result<Value> {
    let instance = session.get_fixture_value(fixture)?;
    let object = instance
        .as_object()
        .ok_or_else(|| anyhow::anyhow!("{fixture} is not a model instance"))?;
    Ok(object.get("value").unwrap_or_default())
}

#[test]
fn default_name_comes_from_the_model() -> Result<()> {
    let materializer = materializer();
    let mut registry = FixtureRegistry::new();
    Register::new(&FOO).install(&mut registry, &materializer)?;

    let names: Vec<&str> = registry.names().collect();
    assert_eq!(names, ["foo__value", "foo_factory", "foo"]);

    let mut session = FixtureSession::new(Arc::new(registry));
    assert_eq!(value_of(&mut session, "foo")?, Value::from("register(FooFactory)"));
    let factory = session.get_fixture_value("foo_factory")?;
    ensure!(
        factory.as_blueprint().is_some_and(|bp| Arc::ptr_eq(bp, &*FOO)),
        "foo_factory should be the registered blueprint"
    );
    Ok(())
}

#[test]
fn overrides_replace_declarations() -> Result<()> {
    let materializer = materializer();
    let mut registry = FixtureRegistry::new();
    Register::new(&FOO).set("value", "bar").install(&mut registry, &materializer)?;

    let mut session = FixtureSession::new(Arc::new(registry));
    assert_eq!(value_of(&mut session, "foo")?, Value::from("bar"));
    assert_eq!(session.get_fixture_value("foo__value")?, Value::from("bar"));
    Ok(())
}

#[test]
fn alternative_name_leaves_the_default_unbound() -> Result<()> {
    let materializer = materializer();
    let mut registry = FixtureRegistry::new();
    Register::new(&FOO).name("second_foo").install(&mut registry, &materializer)?;

    let mut session = FixtureSession::new(Arc::new(registry));
    assert_eq!(value_of(&mut session, "second_foo")?, Value::from("register(FooFactory)"));
    let err = session.get_fixture_value("foo").unwrap_err();
    assert!(matches!(err, FixtureError::Lookup(name) if name == "foo"));
    Ok(())
}

#[test]
fn alternative_name_with_overrides() -> Result<()> {
    let materializer = materializer();
    let mut registry = FixtureRegistry::new();
    Register::new(&FOO)
        .name("second_foo")
        .set("value", "second_bar")
        .install(&mut registry, &materializer)?;

    let mut session = FixtureSession::new(Arc::new(registry));
    assert_eq!(value_of(&mut session, "second_foo")?, Value::from("second_bar"));
    Ok(())
}

#[test]
fn two_registrations_share_the_factory_fixture() -> Result<()> {
    let materializer = materializer();
    let mut registry = FixtureRegistry::new();
    Register::new(&FOO).install(&mut registry, &materializer)?;
    Register::new(&FOO)
        .name("second_foo")
        .set("value", "second_bar")
        .install(&mut registry, &materializer)?;

    assert_eq!(registry.names().filter(|name| *name == "foo_factory").count(), 1);
    let mut session = FixtureSession::new(Arc::new(registry));
    assert_eq!(value_of(&mut session, "foo")?, Value::from("register(FooFactory)"));
    assert_eq!(value_of(&mut session, "second_foo")?, Value::from("second_bar"));
    Ok(())
}

#[test]
fn registering_a_name_twice_installs_nothing() -> Result<()> {
    let materializer = materializer();
    let mut registry = FixtureRegistry::new();
    Register::new(&FOO).install(&mut registry, &materializer)?;
    let before = registry.len();

    let err = Register::new(&FOO)
        .set("value", "again")
        .install(&mut registry, &materializer)
        .unwrap_err();
    assert!(matches!(
        err,
        RegisterError::Registry(RegistryError::DuplicateFixture(ref name)) if name == "foo__value"
    ));
    assert_eq!(registry.len(), before);
    Ok(())
}

#[test]
fn bindings_are_not_installed_until_asked() -> Result<()> {
    let materializer = materializer();
    let mut registry = FixtureRegistry::new();
    let registration = Register::new(&FOO).bindings(&registry, &materializer)?;
    assert!(registry.is_empty());
    assert_eq!(registration.model_name(), "foo");
    assert_eq!(registration.definitions().len(), 3);

    registration.install(&mut registry)?;
    assert!(registry.contains("foo"));
    Ok(())
}

#[test]
fn abstract_blueprints_are_rejected() {
    let base = Blueprint::builder("BaseFactory")
        .model(ModelType::new("Base"))
        .abstract_blueprint()
        .build();
    let err = Register::new(&base)
        .install(&mut FixtureRegistry::new(), &materializer())
        .unwrap_err();
    assert!(matches!(err, RegisterError::AbstractBlueprint(name) if name == "BaseFactory"));
}

#[test]
fn blueprints_without_a_model_are_rejected() {
    let bare = Blueprint::builder("BareFactory").declare("value", 1i64).build();
    let err = Register::new(&bare)
        .install(&mut FixtureRegistry::new(), &materializer())
        .unwrap_err();
    assert!(matches!(err, RegisterError::MissingModel(name) if name == "BareFactory"));
}

#[test]
fn an_explicit_name_does_not_excuse_a_missing_model() {
    let bare = Blueprint::builder("BareFactory").declare("value", 1i64).build();
    let mut registry = FixtureRegistry::new();
    let err = Register::new(&bare)
        .name("bare")
        .install(&mut registry, &materializer())
        .unwrap_err();
    assert!(matches!(err, RegisterError::MissingModel(name) if name == "BareFactory"));
    assert!(registry.is_empty());
}
