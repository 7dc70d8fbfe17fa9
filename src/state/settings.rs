use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the preference file in the user's home directory
const CONFIG_FILE_NAME: &str = ".molconverter_config.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine the home directory")]
    NoHomeDir,

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize settings: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk layout of the preference file
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct StoredSettings {
    last_folder: String,
}

/// Persists the last export folder across runs.
///
/// The file lives at:
/// - Linux/macOS: ~/.molconverter_config.json
/// - Windows: %USERPROFILE%\.molconverter_config.json
#[derive(Debug, Clone)]
pub struct Settings {
    path: PathBuf,
}

impl Settings {
    /// Settings stored in the user's home directory
    pub fn new() -> Result<Self, SettingsError> {
        let path = dirs::home_dir()
            .ok_or(SettingsError::NoHomeDir)?
            .join(CONFIG_FILE_NAME);
        Ok(Self::at(path))
    }

    /// Settings stored at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The last saved export folder. A missing, unreadable or corrupt file
    /// reads as "nothing saved".
    pub fn load(&self) -> Option<PathBuf> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                log::debug!("No saved settings at {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<StoredSettings>(&text) {
            Ok(stored) if !stored.last_folder.is_empty() => Some(PathBuf::from(stored.last_folder)),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Ignoring corrupt settings file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Overwrite the saved export folder
    pub fn save(&self, folder: &Path) -> Result<(), SettingsError> {
        let stored = StoredSettings {
            last_folder: folder.to_string_lossy().to_string(),
        };
        let json = serde_json::to_string(&stored)?;
        fs::write(&self.path, json).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })?;
        log::info!("📁 Export folder saved: {}", folder.display());
        Ok(())
    }

    /// The saved folder, but only if it still exists on disk
    pub fn current_valid(&self) -> Option<PathBuf> {
        self.load().filter(|folder| folder.is_dir())
    }

    /// Text for the folder label under the format panel
    pub fn folder_label(&self) -> String {
        match self.current_valid() {
            Some(folder) => format!("Current export folder:\n{}", folder.display()),
            None => "No export folder selected yet.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("config.json");
        let folder = dir.path().join("exports with spaces");

        Settings::at(&file).save(&folder).unwrap();

        // A fresh instance reads the value back from disk
        assert_eq!(Settings::at(&file).load(), Some(folder));
    }

    #[test]
    fn test_file_format() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("config.json");
        Settings::at(&file).save(Path::new("/tmp/out")).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({ "last_folder": "/tmp/out" }));
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempdir().unwrap();
        let settings = Settings::at(dir.path().join("config.json"));
        settings.save(Path::new("/first")).unwrap();
        settings.save(Path::new("/second")).unwrap();
        assert_eq!(settings.load(), Some(PathBuf::from("/second")));
    }

    #[test]
    fn test_missing_file_loads_nothing() {
        let dir = tempdir().unwrap();
        let settings = Settings::at(dir.path().join("absent.json"));
        assert_eq!(settings.load(), None);
        assert_eq!(settings.folder_label(), "No export folder selected yet.");
    }

    #[test]
    fn test_corrupt_file_loads_nothing() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("config.json");
        for garbage in ["{not json", "[]", r#"{"other": 1}"#, ""] {
            fs::write(&file, garbage).unwrap();
            assert_eq!(Settings::at(&file).load(), None, "input: {garbage:?}");
        }
    }

    #[test]
    fn test_deleted_folder_is_not_valid() {
        let dir = tempdir().unwrap();
        let folder = dir.path().join("exports");
        fs::create_dir(&folder).unwrap();

        let settings = Settings::at(dir.path().join("config.json"));
        settings.save(&folder).unwrap();
        assert_eq!(settings.current_valid(), Some(folder.clone()));
        assert!(settings.folder_label().starts_with("Current export folder:\n"));

        fs::remove_dir(&folder).unwrap();
        assert_eq!(settings.load(), Some(folder));
        assert_eq!(settings.current_valid(), None);
    }
}
