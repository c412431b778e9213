//! Conversions between the two spellings of a configuration key.
//!
//! A logical key such as `property.one` can also be written in its
//! environment-variable form `PROPERTY_ONE`. Layers always carry both
//! spellings so that lookups, merging and override suppression can treat them
//! as one identity without re-deriving the alternate form.

/// Convert `key` into its dotted property spelling.
///
/// Underscores become dots and the result is lower-cased.
///
/// # Examples
///
/// ```
/// use env_config::key::to_property_key;
/// assert_eq!(to_property_key("PROPERTY_ONE"), "property.one");
/// assert_eq!(to_property_key("property.one"), "property.one");
/// ```
#[must_use]
pub fn to_property_key(key: &str) -> String {
    key.replace('_', ".").to_lowercase()
}

/// Convert `key` into its `SCREAMING_SNAKE` environment-variable spelling.
///
/// Dots become underscores and the result is upper-cased.
///
/// # Examples
///
/// ```
/// use env_config::key::to_env_key;
/// assert_eq!(to_env_key("property.one"), "PROPERTY_ONE");
/// assert_eq!(to_env_key("PROPERTY_ONE"), "PROPERTY_ONE");
/// ```
#[must_use]
pub fn to_env_key(key: &str) -> String {
    key.replace('.', "_").to_uppercase()
}

/// Both canonical spellings of `key`, property form first.
#[must_use]
pub fn spellings(key: &str) -> [String; 2] {
    [to_property_key(key), to_env_key(key)]
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{spellings, to_env_key, to_property_key};

    #[rstest]
    #[case("a.b.c", "a.b.c", "A_B_C")]
    #[case("A_B_C", "a.b.c", "A_B_C")]
    #[case("Mixed_Case.key", "mixed.case.key", "MIXED_CASE_KEY")]
    #[case("path", "path", "PATH")]
    #[case("", "", "")]
    fn converts_between_spellings(
        #[case] raw: &str,
        #[case] property: &str,
        #[case] env: &str,
    ) {
        assert_eq!(to_property_key(raw), property);
        assert_eq!(to_env_key(raw), env);
    }

    #[rstest]
    #[case("env.config.vault.token")]
    #[case("ENV_CONFIG_VAULT_TOKEN")]
    fn conversions_are_idempotent(#[case] raw: &str) {
        let property = to_property_key(raw);
        let env = to_env_key(raw);
        assert_eq!(to_property_key(&property), property);
        assert_eq!(to_env_key(&env), env);
        assert_eq!(to_env_key(&property), env);
        assert_eq!(to_property_key(&env), property);
    }

    #[test]
    fn spellings_lists_property_form_first() {
        assert_eq!(
            spellings("property.seven"),
            [String::from("property.seven"), String::from("PROPERTY_SEVEN")]
        );
    }
}
