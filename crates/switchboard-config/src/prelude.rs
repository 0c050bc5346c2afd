//! Common re-exports.
//!
//! ```rust
//! use switchboard_config::prelude::*;
//! ```

pub use crate::{
    Config, ConfigError, ConfigLayer, ConfigResult, EventsSection, LoggingSection, ResolvedConfig,
};
