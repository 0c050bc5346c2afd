//! Environment variable fallbacks.
//!
//! Environment variables only fill fields that no config file set. A value
//! present in `~/.switchboard/config.toml` or the workspace file always wins.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

/// How an environment string is turned into a TOML value.
#[derive(Clone, Copy)]
enum EnvKind {
    Str,
    Int,
}

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: EnvKind,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "SWITCHBOARD_LOG_LEVEL",
        field_path: "logging.level",
        kind: EnvKind::Str,
    },
    EnvMapping {
        var_name: "SWITCHBOARD_LOG_FORMAT",
        field_path: "logging.format",
        kind: EnvKind::Str,
    },
    EnvMapping {
        var_name: "SWITCHBOARD_HISTORY_CAPACITY",
        field_path: "events.history_capacity",
        kind: EnvKind::Int,
    },
    EnvMapping {
        var_name: "SWITCHBOARD_CHANNEL_CAPACITY",
        field_path: "events.channel_capacity",
        kind: EnvKind::Int,
    },
];

/// Names of every environment variable the loader consults.
#[must_use]
pub fn supported_env_vars() -> Vec<&'static str> {
    ENV_MAPPINGS.iter().map(|m| m.var_name).collect()
}

/// Apply environment fallbacks to fields not set by a config file.
///
/// Returns the number of variables applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a numeric variable does not parse
/// as a non-negative integer.
pub fn apply_env_fallbacks<S: BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }

        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        let value = coerce(mapping, raw)?;
        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        set_field(merged, mapping.field_path, value);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    Ok(count)
}

/// Snapshot of the process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

fn coerce(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    match mapping.kind {
        EnvKind::Str => Ok(toml::Value::String(raw.trim().to_owned())),
        EnvKind::Int => raw
            .trim()
            .parse::<u32>()
            .map(|n| toml::Value::Integer(i64::from(n)))
            .map_err(|e| ConfigError::EnvError {
                var_name: mapping.var_name.to_owned(),
                message: format!("expected a non-negative integer, got '{raw}': {e}"),
            }),
    }
}

fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let mut segments = path.split('.').peekable();
    let mut current = root;

    while let Some(segment) = segments.next() {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), value);
            return;
        }
        current = table
            .entry(segment)
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::record_leaves;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn defaults() -> (toml::Value, FieldSources) {
        let merged: toml::Value =
            toml::from_str("[events]\nhistory_capacity = 100\n[logging]\nlevel = \"info\"\n")
                .unwrap();
        let mut sources = FieldSources::new();
        record_leaves(&merged, "", ConfigLayer::Defaults, &mut sources);
        (merged, sources)
    }

    #[test]
    fn test_env_overrides_defaults() {
        let (mut merged, mut sources) = defaults();
        let env = make_env(&[
            ("SWITCHBOARD_LOG_LEVEL", "debug"),
            ("SWITCHBOARD_HISTORY_CAPACITY", " 250 "),
        ]);

        let count = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();

        assert_eq!(count, 2);
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(merged["events"]["history_capacity"].as_integer(), Some(250));
        assert_eq!(sources["logging.level"], ConfigLayer::Environment);
    }

    #[test]
    fn test_env_does_not_override_file() {
        let (mut merged, mut sources) = defaults();
        sources.insert("logging.level".to_owned(), ConfigLayer::User);
        let env = make_env(&[("SWITCHBOARD_LOG_LEVEL", "trace")]);

        let count = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();

        assert_eq!(count, 0);
        assert_eq!(merged["logging"]["level"].as_str(), Some("info"));
        assert_eq!(sources["logging.level"], ConfigLayer::User);
    }

    #[test]
    fn test_env_creates_missing_sections() {
        let mut merged = toml::Value::Table(toml::map::Map::new());
        let mut sources = FieldSources::new();
        let env = make_env(&[("SWITCHBOARD_CHANNEL_CAPACITY", "64")]);

        apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap();
        assert_eq!(merged["events"]["channel_capacity"].as_integer(), Some(64));
    }

    #[test]
    fn test_env_bad_integer() {
        let (mut merged, mut sources) = defaults();
        let env = make_env(&[("SWITCHBOARD_HISTORY_CAPACITY", "lots")]);

        let err = apply_env_fallbacks(&mut merged, &mut sources, &env).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvError { ref var_name, .. } if var_name == "SWITCHBOARD_HISTORY_CAPACITY"
        ));
    }

    #[test]
    fn test_supported_env_vars() {
        let vars = supported_env_vars();
        assert_eq!(vars.len(), 4);
        assert!(vars.iter().all(|v| v.starts_with("SWITCHBOARD_")));
    }
}
