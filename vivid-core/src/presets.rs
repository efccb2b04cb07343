use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Reserved identifier for the no-op preset. Never contributes a
/// filter and is excluded from combinations.
pub const NONE_PRESET: &str = "none";

/// A named, reusable color-grading filter-graph fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Zero or more comma-separated filter invocations.
    pub filter: String,
}

#[derive(Debug, Error)]
pub enum PresetLoadError {
    #[error("failed to read preset file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed preset file: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("preset file defines no presets")]
    Empty,
    #[error("preset file is missing the reserved `none` entry")]
    MissingNone,
}

#[derive(Debug, Deserialize)]
struct PresetFile {
    presets: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PresetEntry {
    name: String,
    description: String,
    filter: String,
}

/// Read-only catalog of presets, in declaration order.
///
/// The order is user-visible: enumerated choices are 1-based indices
/// into it, so it must stay stable for the process lifetime.
#[derive(Debug, Clone)]
pub struct PresetStore {
    presets: Vec<Preset>,
}

impl PresetStore {
    /// Build a store from an explicit preset list.
    pub fn from_presets(presets: Vec<Preset>) -> Self {
        Self { presets }
    }

    /// The built-in preset set used when no configuration file is
    /// available.
    pub fn builtin() -> Self {
        Self::from_presets(vec![
            Preset {
                id: NONE_PRESET.to_string(),
                name: "No Color Correction".to_string(),
                description: "Apply no color effects - keep original video colors".to_string(),
                filter: String::new(),
            },
            Preset {
                id: "cinematic".to_string(),
                name: "Cinematic Look".to_string(),
                description: "Film-like color grading with enhanced contrast and cooler tones"
                    .to_string(),
                filter: "eq=contrast=1.2:brightness=0.05:saturation=1.1,colorbalance=rs=-0.1:gs=0.05:bs=0.15"
                    .to_string(),
            },
            Preset {
                id: "vibrant".to_string(),
                name: "Vibrant Colors".to_string(),
                description: "Increased saturation and sharpness for bold, eye-catching videos"
                    .to_string(),
                filter: "eq=contrast=1.3:saturation=1.4:gamma=1.1,unsharp=5:5:1.0:5:5:0.0"
                    .to_string(),
            },
        ])
    }

    /// Load presets from a JSON file.
    ///
    /// The document must have a top-level `presets` mapping keyed by
    /// preset id, each entry carrying `name`, `description` and
    /// `filter`. The mapping must be non-empty and include the
    /// reserved `none` entry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PresetLoadError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| PresetLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Load presets from `path`, substituting the built-in set on any
    /// failure. This is the policy layer around [`PresetStore::load`];
    /// load problems are reported at warn level, never propagated.
    pub fn load_or_builtin(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(store) => {
                log::info!("Loaded {} presets from {}", store.len(), path.display());
                store
            }
            Err(err) => {
                log::warn!(
                    "Could not load presets from {}: {}. Using built-in presets.",
                    path.display(),
                    err
                );
                Self::builtin()
            }
        }
    }

    fn from_json(contents: &str) -> Result<Self, PresetLoadError> {
        let file: PresetFile = serde_json::from_str(contents)?;
        if file.presets.is_empty() {
            return Err(PresetLoadError::Empty);
        }

        let mut presets = Vec::with_capacity(file.presets.len());
        for (id, value) in file.presets {
            let entry: PresetEntry = serde_json::from_value(value)?;
            presets.push(Preset {
                id,
                name: entry.name,
                description: entry.description,
                filter: entry.filter,
            });
        }

        let store = Self::from_presets(presets);
        if store.get(NONE_PRESET).is_none() {
            return Err(PresetLoadError::MissingNone);
        }
        Ok(store)
    }

    /// Look up a preset by id.
    pub fn get(&self, id: &str) -> Option<&Preset> {
        self.presets.iter().find(|preset| preset.id == id)
    }

    /// Preset ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.presets.iter().map(|preset| preset.id.as_str())
    }

    /// Presets in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Preset> {
        self.presets.iter()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_contains_the_default_set_in_order() {
        let store = PresetStore::builtin();
        let ids: Vec<&str> = store.ids().collect();
        assert_eq!(ids, vec!["none", "cinematic", "vibrant"]);
        assert_eq!(store.get(NONE_PRESET).unwrap().filter, "");
    }

    #[test]
    fn json_declaration_order_is_preserved() {
        let store = PresetStore::from_json(
            r#"{
                "presets": {
                    "none": {"name": "None", "description": "no-op", "filter": ""},
                    "zeta": {"name": "Zeta", "description": "z", "filter": "eq=gamma=1.1"},
                    "alpha": {"name": "Alpha", "description": "a", "filter": "eq=contrast=1.2"}
                }
            }"#,
        )
        .unwrap();
        let ids: Vec<&str> = store.ids().collect();
        assert_eq!(ids, vec!["none", "zeta", "alpha"]);
    }

    #[test]
    fn missing_presets_key_is_malformed() {
        assert!(matches!(
            PresetStore::from_json(r#"{"palettes": {}}"#),
            Err(PresetLoadError::Malformed(_))
        ));
    }

    #[test]
    fn entry_missing_required_fields_is_malformed() {
        assert!(matches!(
            PresetStore::from_json(r#"{"presets": {"none": {"name": "None"}}}"#),
            Err(PresetLoadError::Malformed(_))
        ));
    }

    #[test]
    fn empty_mapping_is_rejected() {
        assert!(matches!(
            PresetStore::from_json(r#"{"presets": {}}"#),
            Err(PresetLoadError::Empty)
        ));
    }

    #[test]
    fn file_without_none_entry_is_rejected() {
        assert!(matches!(
            PresetStore::from_json(
                r#"{"presets": {"warm": {"name": "W", "description": "w", "filter": ""}}}"#
            ),
            Err(PresetLoadError::MissingNone)
        ));
    }

    #[test]
    fn load_or_builtin_falls_back_on_missing_file() {
        let store = PresetStore::load_or_builtin("/nonexistent/color_presets.json");
        let ids: Vec<&str> = store.ids().collect();
        assert_eq!(ids, vec!["none", "cinematic", "vibrant"]);
    }
}
