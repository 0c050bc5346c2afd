//! Switchboard configuration.
//!
//! Settings are resolved from layers, highest precedence last:
//!
//! 1. Embedded defaults
//! 2. `~/.switchboard/config.toml`
//! 3. `{workspace}/.switchboard/config.toml`
//! 4. `SWITCHBOARD_*` environment variables, for fields no file set
//!
//! ```rust,no_run
//! use switchboard_config::Config;
//!
//! let resolved = Config::load(Some(std::path::Path::new("."))).unwrap();
//! println!("history: {}", resolved.config.events.history_capacity);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod env;
mod error;
pub mod loader;
pub mod merge;
pub mod prelude;
mod show;
mod types;
pub mod validate;

use std::path::Path;

pub use error::{ConfigError, ConfigResult};
pub use merge::{ConfigLayer, FieldSources};
pub use show::ResolvedConfig;
pub use types::{Config, EventsSection, LoggingSection};

impl Config {
    /// Load the layered configuration for `workspace_root`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a file is malformed or the result is
    /// invalid.
    pub fn load(workspace_root: Option<&Path>) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, None)
    }

    /// Load with an alternate user config directory.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_with_home(
        workspace_root: Option<&Path>,
        home: &Path,
    ) -> ConfigResult<ResolvedConfig> {
        loader::load(workspace_root, Some(home))
    }

    /// Load a single file with no layering.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file is missing, malformed, or
    /// invalid.
    pub fn load_file(path: &Path) -> ConfigResult<Self> {
        loader::load_file(path)
    }
}
