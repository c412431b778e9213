//! Profile overlays sit between environment variables and plain files.

use anyhow::{Result, ensure};
use env_config::{EnvConfig, EnvConfigError, EnvConfigResult, LayerKind, Provenance};
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
        .and_then(|_| tree.environment("test", "test.properties", &[("property.one", "test")]))
        .and_then(|_| {
            tree.profile(
                "default",
                "prof1",
                "prof1.properties",
                &[("property.two", "default-prof1"), ("profile.only", "default-prof1")],
            )
        })
        .and_then(|_| {
            tree.profile("test", "prof1", "prof1.properties", &[("property.one", "test-prof1")])
        });
    assert!(written.is_ok(), "write environment files");
    tree
}

fn resolve(tree: &ConfigTree, controls: &[(&str, &str)]) -> EnvConfigResult<EnvConfig> {
    EnvConfig::builder()
        .system_properties(controls.iter().copied())
        .environment_variables(std::iter::empty::<(String, String)>())
        .working_directory(tree.root())
        .build()
}

#[rstest]
fn profile_outranks_environment_files(tree: ConfigTree) -> Result<()> {
    let config = resolve(
        &tree,
        &[("env.config.environment", "test"), ("env.config.profile", "prof1")],
    )?;
    ensure!(config.get("property.one").as_deref() == Some("test-prof1"));
    ensure!(config.get("property.two").as_deref() == Some("default-prof1"));
    ensure!(config.get("PROFILE_ONLY").as_deref() == Some("default-prof1"));
    let provenance = config.provenance("property.one");
    ensure!(provenance.as_ref().map(Provenance::kind) == Some(LayerKind::ProfileFile));
    ensure!(provenance.as_ref().and_then(Provenance::environment) == Some("test"));
    Ok(())
}

#[rstest]
fn without_profile_overlays_are_ignored(tree: ConfigTree) -> Result<()> {
    let config = resolve(&tree, &[("env.config.environment", "test")])?;
    ensure!(config.get("property.one").as_deref() == Some("test"));
    ensure!(config.get("profile.only").is_none());
    Ok(())
}

#[rstest]
fn missing_profile_directories_are_skipped(tree: ConfigTree) -> Result<()> {
    let config = resolve(
        &tree,
        &[("env.config.environment", "test"), ("env.config.profile", "absent")],
    )?;
    ensure!(config.get("property.one").as_deref() == Some("test"));
    Ok(())
}

#[rstest]
fn empty_profile_directory_is_fatal(tree: ConfigTree) -> Result<()> {
    let dir = tree.mkdir("config/test/hollow")?;
    let result = resolve(
        &tree,
        &[("env.config.environment", "test"), ("env.config.profile", "hollow")],
    );
    let Err(err) = result else {
        anyhow::bail!("resolution should fail");
    };
    ensure!(err.to_string() == format!("No property files found under '{dir}'"));
    Ok(())
}

#[rstest]
fn profiles_can_live_outside_the_config_path(tree: ConfigTree) -> Result<()> {
    tree.write_properties(
        "profiles/default/prof2/a.properties",
        &[("property.one", "outside")],
    )?;
    let config = resolve(
        &tree,
        &[("env.config.profile", "prof2"), ("env.config.profiles.path", "profiles")],
    )?;
    ensure!(config.get("property.one").as_deref() == Some("outside"));
    Ok(())
}

#[rstest]
fn explicit_profiles_path_must_exist(tree: ConfigTree) -> Result<()> {
    let result = resolve(
        &tree,
        &[("env.config.profile", "prof1"), ("env.config.profiles.path", "nowhere")],
    );
    let Err(err) = result else {
        anyhow::bail!("resolution should fail");
    };
    ensure!(matches!(err.as_ref(), EnvConfigError::InvalidConfigLocation { .. }));
    Ok(())
}

#[rstest]
fn profile_name_is_read_from_the_environment(tree: ConfigTree) -> Result<()> {
    let config = EnvConfig::builder()
        .environment_variables([
            ("ENV_CONFIG_ENVIRONMENT", "test"),
            ("ENV_CONFIG_PROFILE", "prof1"),
        ])
        .working_directory(tree.root())
        .build()?;
    ensure!(config.get("property.one").as_deref() == Some("test-prof1"));
    Ok(())
}
