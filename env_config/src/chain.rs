//! Expansion of the configured environment list into an inheritance chain.

use std::fmt;

/// Name of the base environment every chain terminates in.
pub const DEFAULT_ENVIRONMENT: &str = "default";

const DELIMITER: char = ',';

/// Ordered environments, most specific first, always ending in
/// [`DEFAULT_ENVIRONMENT`] exactly once.
///
/// # Examples
///
/// ```
/// use env_config::EnvironmentChain;
///
/// let chain = EnvironmentChain::parse("test, TEST-ENV");
/// assert_eq!(chain.as_slice(), ["test-env", "test", "default"]);
/// assert_eq!(chain.current(), "test-env");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvironmentChain {
    environments: Vec<String>,
}

impl EnvironmentChain {
    /// Parse a comma-delimited, case-insensitive environment list.
    ///
    /// Tokens are trimmed and lower-cased, the base environment is prepended,
    /// and the list is reversed and de-duplicated so the last listed
    /// environment becomes current. Empty tokens are ignored.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let listed = raw
            .split(DELIMITER)
            .map(|token| token.trim().to_lowercase())
            .filter(|token| !token.is_empty());
        let mut environments: Vec<String> = Vec::new();
        for name in std::iter::once(DEFAULT_ENVIRONMENT.to_owned())
            .chain(listed)
            .rev()
        {
            if !environments.contains(&name) {
                environments.push(name);
            }
        }
        Self { environments }
    }

    /// The most specific environment.
    #[must_use]
    pub fn current(&self) -> &str {
        self.environments
            .first()
            .map_or(DEFAULT_ENVIRONMENT, String::as_str)
    }

    /// Whether the current environment is the base environment.
    #[must_use]
    pub fn is_default_only(&self) -> bool {
        self.current() == DEFAULT_ENVIRONMENT
    }

    /// Number of environments in the chain.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.environments.len()
    }

    /// Always `false`; a chain holds at least the base environment.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }

    /// Iterate over the environments, most specific first.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.environments.iter().map(String::as_str)
    }

    /// Borrow the environments as a slice.
    #[must_use]
    pub const fn as_slice(&self) -> &[String] {
        self.environments.as_slice()
    }
}

impl Default for EnvironmentChain {
    fn default() -> Self {
        Self::parse(DEFAULT_ENVIRONMENT)
    }
}

impl fmt::Display for EnvironmentChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.environments.join(","))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{DEFAULT_ENVIRONMENT, EnvironmentChain};

    #[rstest]
    #[case("default", &["default"])]
    #[case("DEFAULT", &["default"])]
    #[case("", &["default"])]
    #[case("test", &["test", "default"])]
    #[case("test,test-env", &["test-env", "test", "default"])]
    #[case("test , TEST2", &["test2", "test", "default"])]
    #[case("DEFAULT,alpha,zen", &["zen", "alpha", "default"])]
    #[case("test,default", &["test", "default"])]
    #[case("a,b,a", &["a", "b", "default"])]
    #[case(" ,test,, ", &["test", "default"])]
    fn expands_environment_lists(#[case] raw: &str, #[case] expected: &[&str]) {
        let chain = EnvironmentChain::parse(raw);
        assert_eq!(chain.as_slice(), expected);
        assert_eq!(Some(chain.current()), expected.first().copied());
        assert_eq!(chain.iter().last(), Some(DEFAULT_ENVIRONMENT));
    }

    #[test]
    fn default_chain_is_default_only() {
        let chain = EnvironmentChain::default();
        assert!(chain.is_default_only());
        assert_eq!(chain.len(), 1);
        assert!(!chain.is_empty());
    }

    #[test]
    fn displays_comma_joined() {
        assert_eq!(
            EnvironmentChain::parse("test,test-env").to_string(),
            "test-env,test,default"
        );
    }
}
