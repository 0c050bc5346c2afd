//! Layer merging with per-field source tracking.
//!
//! Merging works on raw [`toml::Value`] trees rather than deserialized
//! structs, so a key missing from an upper layer never resets the value a
//! lower layer set.

use std::collections::BTreeMap;
use std::fmt;

/// Which configuration layer a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayer {
    /// Compiled-in defaults (`defaults.toml`).
    Defaults,
    /// User-level configuration (`~/.switchboard/config.toml`).
    User,
    /// Workspace-level configuration (`{workspace}/.switchboard/config.toml`).
    Workspace,
    /// Environment variable fallback.
    Environment,
}

impl fmt::Display for ConfigLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Defaults => write!(f, "defaults"),
            Self::User => write!(f, "user (~/.switchboard/config.toml)"),
            Self::Workspace => write!(f, "workspace (.switchboard/config.toml)"),
            Self::Environment => write!(f, "environment variable"),
        }
    }
}

/// Dotted field path to the layer that last set it.
pub type FieldSources = BTreeMap<String, ConfigLayer>;

/// Deep-merge `overlay` into `base`, recording which layer set each leaf.
///
/// - Tables merge recursively per key.
/// - Scalars and arrays from the overlay replace the base value.
pub fn merge_layer(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    layer: ConfigLayer,
    sources: &mut FieldSources,
) {
    let (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) = (&mut *base, overlay)
    else {
        *base = overlay.clone();
        record_leaves(overlay, prefix, layer, sources);
        return;
    };

    for (key, overlay_val) in overlay_table {
        let path = join_path(prefix, key);
        match base_table.get_mut(key) {
            Some(base_val) if base_val.is_table() && overlay_val.is_table() => {
                merge_layer(base_val, overlay_val, &path, layer, sources);
            },
            Some(base_val) => {
                *base_val = overlay_val.clone();
                record_leaves(overlay_val, &path, layer, sources);
            },
            None => {
                base_table.insert(key.clone(), overlay_val.clone());
                record_leaves(overlay_val, &path, layer, sources);
            },
        }
    }
}

/// Record every leaf under `val` as set by `layer`.
pub fn record_leaves(val: &toml::Value, prefix: &str, layer: ConfigLayer, sources: &mut FieldSources) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join_path(prefix, key), layer, sources);
        }
    } else {
        sources.insert(prefix.to_owned(), layer);
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}
