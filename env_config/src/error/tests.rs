//! Unit tests for error construction and rendering.

use camino::Utf8Path;
use rstest::rstest;

use super::EnvConfigError;

#[rstest]
#[case(
    EnvConfigError::missing_variable("env.config.keepass.masterkey"),
    "Missing required variable 'env.config.keepass.masterkey'"
)]
#[case(
    EnvConfigError::missing_key("non.existing"),
    "Missing required key 'non.existing'"
)]
#[case(
    EnvConfigError::missing_directory(Utf8Path::new("/non/existing/dir")),
    "'/non/existing/dir' does not exist or not a valid config directory!"
)]
#[case(
    EnvConfigError::empty_directory(Utf8Path::new("config/empty-env")),
    "No property files found under 'config/empty-env'"
)]
#[case(
    EnvConfigError::secret_not_found("vault", "path/to/project/default"),
    "Could not find the vault secret: path/to/project/default"
)]
#[case(
    EnvConfigError::invalid_value("port", "eighty", "u16"),
    "Invalid value 'eighty' for 'port': expected u16"
)]
fn renders_operator_facing_messages(#[case] err: EnvConfigError, #[case] expected: &str) {
    assert_eq!(err.to_string(), expected);
}

#[test]
fn upstream_failure_keeps_its_cause() {
    let cause = std::io::Error::other("connection refused");
    let err = EnvConfigError::upstream_with("vault", "Could not read data from vault.", cause);
    let source = std::error::Error::source(&err).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("connection refused"));
}

#[test]
fn file_error_names_the_path() {
    let err = EnvConfigError::file(
        Utf8Path::new("config/default/app.properties"),
        std::io::Error::other("boom"),
    );
    assert_eq!(
        err.to_string(),
        "Configuration file error in 'config/default/app.properties': boom"
    );
}
