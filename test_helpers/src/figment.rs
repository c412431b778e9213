//! Process-level isolation through `figment::Jail`.
//!
//! Resolution reads the real process environment and working directory when
//! nothing is injected. These helpers run such tests inside a jail whose
//! environment starts empty and whose working directory is a fresh temporary
//! directory holding the `config` tree.

use std::error::Error;
use std::fmt::Write as _;

use anyhow::{Result, anyhow};

use crate::fixtures::CONFIG_DIR;

/// Run `f` inside a [`figment::Jail`] with every environment variable
/// cleared, returning the closure's output.
///
/// # Errors
///
/// Returns an error if the jail cannot be set up or the closure fails.
pub fn with_jail<F, T>(f: F) -> Result<T>
where
    F: FnOnce(&mut figment::Jail) -> figment::error::Result<T>,
{
    let mut output = None;
    figment::Jail::try_with(|jail| {
        jail.clear_env();
        output = Some(f(jail)?);
        Ok(())
    })
    .map_err(|err| anyhow!("jailed test failed: {err}"))?;
    output.ok_or_else(|| anyhow!("jail closure did not return a value"))
}

/// Write `config/<environment>/<environment>.properties` inside `jail`.
///
/// # Errors
///
/// Returns the jail's error when a directory or the file cannot be created.
pub fn write_environment(
    jail: &figment::Jail,
    environment: &str,
    entries: &[(&str, &str)],
) -> figment::error::Result<()> {
    let dir = format!("{CONFIG_DIR}/{environment}");
    jail.create_dir(&dir)?;
    let contents = entries.iter().fold(String::new(), |mut out, (key, value)| {
        let _ignored = writeln!(out, "{key}={value}");
        out
    });
    jail.create_file(format!("{dir}/{environment}.properties"), &contents)?;
    Ok(())
}

/// Flatten `err` and its source chain into a [`figment::Error`] so jailed
/// closures can use `?` on resolver results.
///
/// ```
/// use std::io;
/// use env_config_test_helpers::figment::figment_error;
///
/// let err = io::Error::other("config/test is missing");
/// assert_eq!(figment_error(&err).to_string(), "config/test is missing");
/// ```
#[must_use]
pub fn figment_error(err: &(dyn Error + 'static)) -> figment::Error {
    let mut message = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        let _ignored = write!(message, ": {inner}");
        cause = inner.source();
    }
    figment::Error::from(message)
}
