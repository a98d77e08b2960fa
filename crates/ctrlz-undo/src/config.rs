//! History and per-class tracking configuration

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::accessor::FieldAccessor;
use crate::error::UndoResult;

/// Prefix of environment variables overriding [`HistoryConfig`]
pub const ENV_PREFIX: &str = "CTRLZ";

/// How a history refers to the objects its records were captured on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionMode {
    /// Records keep their targets alive until undone or evicted
    #[default]
    Strong,
    /// Records never extend a target's lifetime; undoing a change whose
    /// target was dropped fails
    Weak,
}

/// Configuration for a [`History`](crate::History)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Target retention of recorded changes
    pub retention: RetentionMode,
    /// Maximum number of records kept; the oldest are evicted first.
    /// `None` keeps every record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_records: Option<usize>,
}

impl HistoryConfig {
    /// Load configuration from an optional TOML file, then apply
    /// `CTRLZ_*` environment overrides
    pub fn load(path: Option<&Path>) -> UndoResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        }
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let history_config: HistoryConfig = config.try_deserialize()?;
        debug!("Loaded history config: {:?}", history_config);
        Ok(history_config)
    }

    /// Write the configuration as TOML
    pub fn save(&self, path: &Path) -> UndoResult<()> {
        let toml = toml::to_string(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }

    /// Default location of the configuration file (`./ctrlz.toml`)
    pub fn default_path() -> PathBuf {
        PathBuf::from("ctrlz.toml")
    }
}

/// Marks a type whose tracked field assignments can be undone.
///
/// The constants are resolved once into a [`ClassConfig`] when the object is
/// wrapped in a [`Tracked`](crate::Tracked) handle.
pub trait Undoable: FieldAccessor + Sized {
    /// Skip recording an assignment of the value a field already holds
    const SUPPRESS_DUPLICATES: bool = false;

    /// Fields whose assignments are never recorded
    const EXCLUDED_FIELDS: &'static [&'static str] = &[];
}

/// Tracking facts resolved for one class
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClassConfig {
    /// Skip captures whose new value equals the previous value
    pub suppress_duplicates: bool,
    /// Fields that are never captured
    pub excluded_fields: BTreeSet<String>,
}

impl ClassConfig {
    /// Resolve the configuration declared by `T`
    pub fn of<T: Undoable>() -> Self {
        ClassConfig {
            suppress_duplicates: T::SUPPRESS_DUPLICATES,
            excluded_fields: T::EXCLUDED_FIELDS
                .iter()
                .map(|field| field.to_string())
                .collect(),
        }
    }

    /// Set whether duplicate assignments are suppressed
    pub fn suppress_duplicates(mut self, suppress: bool) -> Self {
        self.suppress_duplicates = suppress;
        self
    }

    /// Exclude a field from tracking
    pub fn exclude(mut self, field: impl Into<String>) -> Self {
        self.excluded_fields.insert(field.into());
        self
    }

    /// Whether assignments to `field` are captured
    pub fn tracks_field(&self, field: &str) -> bool {
        !self.excluded_fields.contains(field)
    }
}
