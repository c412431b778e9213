//! Unit tests for environment helpers.

use super::{hide_control_vars, lock, remove_var, scope_with, set_var};

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

#[test]
fn set_var_restores_absent_variable() {
    let key = "ENV_CONFIG_TEST_HELPERS_ABSENT";
    let _held = lock();
    let cleared = remove_var(key);
    {
        let _guard = set_var(key, "value");
        assert_eq!(env_value(key).as_deref(), Some("value"));
    }
    assert_eq!(env_value(key), None);
    drop(cleared);
}

#[test]
fn stacked_guards_restore_in_reverse_order() {
    let key = "ENV_CONFIG_TEST_HELPERS_STACKED";
    let _held = lock();
    let base = set_var(key, "original");
    let first = set_var(key, "first");
    let second = set_var(key, "second");
    assert_eq!(env_value(key).as_deref(), Some("second"));
    drop(second);
    assert_eq!(env_value(key).as_deref(), Some("first"));
    drop(first);
    assert_eq!(env_value(key).as_deref(), Some("original"));
    drop(base);
}

#[test]
fn hide_control_vars_clears_prefixed_keys_only() {
    let held = lock();
    let planted = held.set_var("ENV_CONFIG_TEST_HELPERS_HIDDEN", "x");
    let unrelated = held.set_var("TEST_HELPERS_VISIBLE", "y");
    {
        let _scope = scope_with(hide_control_vars);
        assert_eq!(env_value("ENV_CONFIG_TEST_HELPERS_HIDDEN"), None);
        assert_eq!(env_value("TEST_HELPERS_VISIBLE").as_deref(), Some("y"));
    }
    assert_eq!(
        env_value("ENV_CONFIG_TEST_HELPERS_HIDDEN").as_deref(),
        Some("x")
    );
    drop(unrelated);
    drop(planted);
}
