//! Tests for directory and environment readers.

use std::collections::BTreeMap;

use anyhow::{Result, ensure};
use rstest::{fixture, rstest};
use test_helpers::ConfigTree;

use super::{
    Presence, environment_layer, read_environment_dir, read_profile_dir, read_properties_dir,
};
use crate::EnvConfigError;
use crate::layer::{Layer, LayerKind};

#[fixture]
fn tree() -> ConfigTree {
    let Ok(tree) = ConfigTree::new() else {
        panic!("temporary config tree");
    };
    tree
}

#[rstest]
fn reads_every_properties_file_in_name_order(tree: ConfigTree) -> Result<()> {
    tree.environment("test", "b.properties", &[("shared", "b"), ("only.b", "b")])?;
    tree.environment("test", "a.properties", &[("shared", "a"), ("only.a", "a")])?;
    tree.write("config/test/notes.txt", "ignored=yes\n")?;
    tree.environment("test/nested", "c.properties", &[("nested", "c")])?;

    let layer = read_environment_dir(&tree.config_path().join("test"), "test")?;
    ensure!(layer.kind() == LayerKind::EnvironmentFile);
    ensure!(layer.environment() == Some("test"));
    ensure!(layer.get("shared") == Some("a"));
    ensure!(layer.get("SHARED") == Some("a"));
    ensure!(layer.get("ONLY_B") == Some("b"));
    ensure!(!layer.contains_key("ignored"));
    ensure!(!layer.contains_key("nested"));
    Ok(())
}

#[rstest]
fn first_definition_within_a_file_wins(tree: ConfigTree) -> Result<()> {
    tree.write("config/default/dup.properties", "key=first\nKEY=second\n")?;
    let layer = read_environment_dir(&tree.config_path().join("default"), "default")?;
    ensure!(layer.get("key") == Some("first"));
    Ok(())
}

#[rstest]
fn missing_environment_dir_is_fatal(tree: ConfigTree) -> Result<()> {
    let dir = tree.config_path().join("missing");
    let err = read_environment_dir(&dir, "missing").err();
    let expected = format!("'{dir}' does not exist or not a valid config directory!");
    ensure!(err.map(|e| e.to_string()) == Some(expected));
    Ok(())
}

#[rstest]
fn environment_path_pointing_at_a_file_is_fatal(tree: ConfigTree) -> Result<()> {
    let file = tree.write("config/test", "not a directory")?;
    let err = read_environment_dir(&file, "test").err();
    ensure!(matches!(
        err.as_deref(),
        Some(EnvConfigError::InvalidConfigLocation { .. })
    ));
    Ok(())
}

#[rstest]
#[case::environment(Presence::Required)]
#[case::profile(Presence::Optional)]
fn empty_dir_is_fatal(tree: ConfigTree, #[case] presence: Presence) -> Result<()> {
    let dir = tree.mkdir("config/empty")?;
    tree.write("config/empty/readme.md", "no properties here")?;
    let err = read_properties_dir(&dir, Layer::new(LayerKind::ProfileFile), presence).err();
    let expected = format!("No property files found under '{dir}'");
    ensure!(err.map(|e| e.to_string()) == Some(expected));
    Ok(())
}

#[rstest]
fn missing_profile_dir_yields_empty_layer(tree: ConfigTree) -> Result<()> {
    let layer = read_profile_dir(&tree.config_path().join("test/prof9"), "test")?;
    ensure!(layer.is_empty());
    ensure!(layer.kind() == LayerKind::ProfileFile);
    Ok(())
}

#[rstest]
fn malformed_file_names_the_path(tree: ConfigTree) -> Result<()> {
    let path = tree.write("config/default/bad.properties", "snow=\\u26\n")?;
    let err = read_environment_dir(&tree.config_path().join("default"), "default").err();
    let message = err.map(|e| e.to_string()).unwrap_or_default();
    ensure!(message.contains(path.as_str()), "unexpected message: {message}");
    ensure!(message.contains("line 1"), "unexpected message: {message}");
    Ok(())
}

#[test]
fn environment_layer_stores_canonical_names_only() {
    let vars: BTreeMap<String, String> = [
        ("PROPERTY_ONE", "one"),
        ("Path", "/usr/bin"),
        ("lower.case", "dots"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect();
    let layer = environment_layer(&vars);
    assert_eq!(layer.kind(), LayerKind::EnvironmentVariable);
    assert_eq!(layer.get("property.one"), Some("one"));
    assert_eq!(layer.get("Path"), Some("/usr/bin"));
    assert_eq!(layer.get("PATH"), Some("/usr/bin"));
    assert_eq!(layer.get("LOWER_CASE"), Some("dots"));
    assert_eq!(layer.len(), 6);
}

#[test]
fn process_environment_reads_variables_verbatim() -> Result<()> {
    test_helpers::figment::with_jail(|jail| {
        jail.set_env("ENV_CONFIG_SOURCE_TEST", "value");
        let vars = super::process_environment();
        assert_eq!(
            vars.get("ENV_CONFIG_SOURCE_TEST").map(String::as_str),
            Some("value")
        );
        Ok(())
    })
}
