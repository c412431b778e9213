//! Readers that turn configuration locations into layers.
//!
//! Every reader yields a flat [`crate::Layer`] with both key spellings
//! materialised. Secret stores live in [`crate::secret`].

mod environment;
mod files;
mod properties;

pub use environment::{environment_layer, process_environment};
pub use files::{Presence, read_environment_dir, read_profile_dir, read_properties_dir};
pub use properties::{PropertiesSyntaxError, parse_properties};

#[cfg(test)]
mod tests;
