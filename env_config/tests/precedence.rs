//! Source precedence across every layer kind.

use anyhow::{Result, ensure};
use env_config::{EnvConfig, EnvConfigBuilder, LayerKind, Provenance};
use rstest::{fixture, rstest};
use test_helpers::ConfigTree;

#[fixture]
fn tree() -> ConfigTree {
    let Ok(tree) = ConfigTree::new() else {
        panic!("temporary config tree");
    };
    let written = tree
        .environment(
            "default",
            "default.properties",
            &[("property.one", "default"), ("property.two", "default")],
        )
        .and_then(|_| {
            tree.environment(
                "test",
                "test.properties",
                &[("property.one", "file"), ("property.two", "test")],
            )
        });
    assert!(written.is_ok(), "write environment files");
    tree
}

fn builder(tree: &ConfigTree) -> EnvConfigBuilder {
    EnvConfig::builder()
        .system_property("env.config.environment", "test")
        .working_directory(tree.root())
}

#[rstest]
fn runtime_override_beats_every_source(tree: ConfigTree) -> Result<()> {
    let config = builder(&tree)
        .system_property("property.one", "system")
        .environment_variables([("PROPERTY_ONE", "env")])
        .build()?;
    config.set("PROPERTY_ONE", "override");
    ensure!(config.get("property.one").as_deref() == Some("override"));

    config.clear("property.one");
    ensure!(config.get("property.one").as_deref() == Some("system"));
    Ok(())
}

#[rstest]
#[case::system(Some("system"), Some("env"), "system", LayerKind::SystemProperty)]
#[case::variable(None, Some("env"), "env", LayerKind::EnvironmentVariable)]
#[case::file(None, None, "file", LayerKind::EnvironmentFile)]
fn higher_layers_shadow_lower_ones(
    tree: ConfigTree,
    #[case] system: Option<&str>,
    #[case] variable: Option<&str>,
    #[case] expected: &str,
    #[case] kind: LayerKind,
) -> Result<()> {
    let config = builder(&tree)
        .system_properties(system.map(|value| ("property.one", value)))
        .environment_variables(variable.map(|value| ("PROPERTY_ONE", value)))
        .build()?;
    ensure!(config.get("property.one").as_deref() == Some(expected));
    ensure!(config.get("PROPERTY_ONE").as_deref() == Some(expected));
    let provenance = config.provenance("property.one");
    ensure!(provenance.as_ref().map(Provenance::kind) == Some(kind));
    Ok(())
}

#[rstest]
fn current_environment_file_beats_default_file(tree: ConfigTree) -> Result<()> {
    let config = builder(&tree).environment_variables([("UNRELATED", "x")]).build()?;
    ensure!(config.get("property.two").as_deref() == Some("test"));
    let provenance = config.provenance("property.two");
    ensure!(provenance.as_ref().and_then(Provenance::environment) == Some("test"));
    Ok(())
}

#[rstest]
fn environment_variables_add_new_keys(tree: ConfigTree) -> Result<()> {
    let config = builder(&tree)
        .environment_variables([("BRAND_NEW_KEY", " padded ")])
        .build()?;
    ensure!(config.get("brand.new.key").as_deref() == Some("padded"));
    ensure!(config.get("BRAND_NEW_KEY").as_deref() == Some("padded"));
    Ok(())
}

#[rstest]
fn set_then_add_replaces_override(tree: ConfigTree) -> Result<()> {
    let config = builder(&tree).environment_variables([("UNRELATED", "x")]).build()?;
    config.set("property.three", "first");
    config.add("PROPERTY_THREE", "second");
    ensure!(config.get("property.three").as_deref() == Some("second"));
    config.clear("property.three");
    ensure!(config.get("property.three").is_none());
    Ok(())
}

#[rstest]
#[case::underscored("db_host", "DB_HOST", "db.host")]
#[case::camel_case("serviceUrl", "SERVICEURL", "serviceurl")]
fn unusual_file_keys_are_shadowed_under_every_spelling(
    tree: ConfigTree,
    #[case] file_key: &str,
    #[case] variable: &str,
    #[case] property: &str,
) -> Result<()> {
    tree.environment("default", "extra.properties", &[(file_key, "file")])?;
    let with_variable = builder(&tree)
        .environment_variables([(variable, "env")])
        .build()?;
    for spelling in [file_key, variable, property] {
        ensure!(
            with_variable.get(spelling).as_deref() == Some("env"),
            "{spelling} should resolve to the variable"
        );
    }
    ensure!(!with_variable.as_map().contains_key(file_key));

    let with_system = builder(&tree).system_property(file_key, "system").build()?;
    ensure!(with_system.get(variable).as_deref() == Some("system"));
    ensure!(with_system.get(file_key).as_deref() == Some("system"));
    Ok(())
}
