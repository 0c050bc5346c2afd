//! Resolved configuration with per-field provenance.

use std::fmt::{self, Write as _};

use crate::merge::{ConfigLayer, FieldSources};
use crate::types::Config;

/// A loaded configuration and where each value came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The final merged configuration.
    pub config: Config,
    /// Dotted field path to the layer that set it.
    pub field_sources: FieldSources,
    /// Config files that were loaded, lowest precedence first.
    pub loaded_files: Vec<String>,
}

impl ResolvedConfig {
    /// The layer that set `field` (e.g. `"events.history_capacity"`).
    #[must_use]
    pub fn source_of(&self, field: &str) -> Option<ConfigLayer> {
        self.field_sources.get(field).copied()
    }

    /// Render the configuration as TOML, annotating each value with its
    /// source layer.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn show(&self) -> Result<String, fmt::Error> {
        let rendered = toml::to_string_pretty(&self.config).map_err(|_| fmt::Error)?;

        let mut output = String::from("# Resolved Switchboard configuration\n");
        for (i, path) in self.loaded_files.iter().enumerate() {
            writeln!(output, "#   {}. {path}", i.saturating_add(1))?;
        }
        output.push('\n');

        let mut section = String::new();
        for line in rendered.lines() {
            let trimmed = line.trim();
            if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                name.clone_into(&mut section);
                writeln!(output, "{line}")?;
                continue;
            }

            let source = trimmed
                .split_once('=')
                .map(|(key, _)| key.trim())
                .map(|key| {
                    if section.is_empty() {
                        key.to_owned()
                    } else {
                        format!("{section}.{key}")
                    }
                })
                .and_then(|field| self.source_of(&field));

            match source {
                Some(layer) => writeln!(output, "{line}  # {layer}")?,
                None => writeln!(output, "{line}")?,
            }
        }

        Ok(output)
    }
}
