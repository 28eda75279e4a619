use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annotation::domain::face_matcher::FaceContinuityPolicy;

use super::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_CENTER_CONFIDENCE, DEFAULT_JOB_QUEUE_CAPACITY,
    DEFAULT_MATCH_DISTANCE, DEFAULT_MAX_AGE_SECS, DEFAULT_MAX_FACES, DEFAULT_MAX_TEXTS,
    DEFAULT_SOURCE_LANGUAGE, DEFAULT_TARGET_LANGUAGE, DEFAULT_TRANSLATION_WORKERS,
    DEFAULT_VIEWPORT_HEIGHT, DEFAULT_VIEWPORT_WIDTH, SETTINGS_DIR_NAME, SETTINGS_FILE_NAME,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Host configuration. Every field has a default, so a partial JSON file
/// only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub source_language: String,
    pub target_language: String,
    pub max_age_secs: u64,
    pub cache_capacity: usize,
    pub max_faces: usize,
    pub max_texts: usize,
    pub continuity: FaceContinuityPolicy,
    pub match_distance: f64,
    pub center_confidence: f32,
    pub translation_workers: usize,
    pub job_queue_capacity: usize,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub api_url: Option<String>,
    pub dictionary_path: Option<PathBuf>,
    pub known_persons: BTreeMap<String, String>,
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_language: DEFAULT_SOURCE_LANGUAGE.to_string(),
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            max_age_secs: DEFAULT_MAX_AGE_SECS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            max_faces: DEFAULT_MAX_FACES,
            max_texts: DEFAULT_MAX_TEXTS,
            continuity: FaceContinuityPolicy::default(),
            match_distance: DEFAULT_MATCH_DISTANCE,
            center_confidence: DEFAULT_CENTER_CONFIDENCE,
            translation_workers: DEFAULT_TRANSLATION_WORKERS,
            job_queue_capacity: DEFAULT_JOB_QUEUE_CAPACITY,
            viewport_width: DEFAULT_VIEWPORT_WIDTH,
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            api_url: None,
            dictionary_path: None,
            known_persons: BTreeMap::new(),
            seed: None,
        }
    }
}

impl Settings {
    /// `<config dir>/CaptionLens/settings.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    /// Loads from the default location, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        Self::default_path()
            .filter(|path| path.exists())
            .and_then(|path| match Self::load_from(&path) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    log::warn!("ignoring settings: {e}");
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let write_err = |source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(write_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.max_age_secs, 30);
        assert_eq!(s.source_language, "en");
        assert_eq!(s.target_language, "zh");
        assert_eq!(s.continuity, FaceContinuityPolicy::NearestBox);
        assert!(s.known_persons.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"target_language": "es", "continuity": "per_frame", "known_persons": {{"person_a": "Alice"}}}}"#
        )
        .unwrap();

        let s = Settings::load_from(file.path()).unwrap();
        assert_eq!(s.target_language, "es");
        assert_eq!(s.continuity, FaceContinuityPolicy::PerFrame);
        assert_eq!(s.known_persons["person_a"], "Alice");
        assert_eq!(s.max_faces, DEFAULT_MAX_FACES);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            seed: Some(7),
            api_url: Some("http://localhost:5000/translate".to_string()),
            ..Settings::default()
        };

        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = Settings::load_from(Path::new("/nonexistent/settings.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = Settings::load_from(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }
}
