use crate::core::scale::GradeScale;
use crate::utils::input::sanitize;
use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const CUSTOM_SCALE_KEY: &str = "customGradeScale";
pub const LAST_RESULT_KEY: &str = "lastGradeResult";
pub const AVERAGE_TESTS_KEY: &str = "averageCalculatorTests";
pub const AVERAGE_BACKUP_KEY: &str = "averageCalculatorBackup";

/// Key/value preference store backed by one JSON object on disk.
///
/// Reads are forgiving: a missing, unreadable or corrupt file behaves like an
/// empty store, with a warning unless the file is simply absent. Writes
/// report failures.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    enabled: bool,
}

impl PreferenceStore {
    pub fn open(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            path: path.into(),
            enabled,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let key = sanitize(key);
        if key.is_empty() || !self.enabled {
            return default;
        }

        let Some(value) = self.read_entries().remove(&key) else {
            return default;
        };

        match serde_json::from_value(value) {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "ignoring unreadable stored value");
                default
            }
        }
    }

    /// Returns `Ok(false)` when nothing was written because the store is
    /// disabled or the key is empty after sanitizing.
    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> Result<bool> {
        let key = sanitize(key);
        if key.is_empty() || !self.enabled {
            return Ok(false);
        }

        let value = serde_json::to_value(data)
            .with_context(|| format!("failed to serialize value for key {key}"))?;
        let mut entries = self.read_entries();
        entries.insert(key, value);
        self.write_entries(&entries)?;
        Ok(true)
    }

    pub fn remove(&self, key: &str) -> Result<bool> {
        let key = sanitize(key);
        if key.is_empty() || !self.enabled {
            return Ok(false);
        }

        let mut entries = self.read_entries();
        if entries.remove(&key).is_none() {
            return Ok(false);
        }
        self.write_entries(&entries)?;
        Ok(true)
    }

    /// The scale calculations should use: the saved custom scale when it
    /// passes the shape check, otherwise the default. Overlapping or
    /// unsorted saved scales are returned as they are.
    pub fn active_scale(&self) -> GradeScale {
        let Some(scale) = self.load::<Option<GradeScale>>(CUSTOM_SCALE_KEY, None) else {
            return GradeScale::default();
        };

        if scale.is_empty() || !scale.is_well_formed() {
            tracing::warn!(
                path = %self.path.display(),
                "saved grading scale is malformed, using the default scale"
            );
            return GradeScale::default();
        }

        scale
    }

    fn read_entries(&self) -> Map<String, Value> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => return Map::new(),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "could not read preference store, treating it as empty"
                );
                return Map::new();
            }
        };

        match serde_json::from_str::<Map<String, Value>>(&content) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "preference store is not a JSON object, treating it as empty"
                );
                Map::new()
            }
        }
    }

    fn write_entries(&self, entries: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating {}", parent.display()))?;
        }

        let content =
            serde_json::to_string_pretty(entries).context("failed to serialize preference store")?;
        fs::write(&self.path, content)
            .with_context(|| format!("failed writing {}", self.path.display()))?;
        Ok(())
    }
}
