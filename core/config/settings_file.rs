use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::*;
use tokio::fs;

/// Settings for one profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages_dir: Option<String>,
}

/// The per-user settings file, keyed by profile name:
///
/// ```json
/// { "default": { "packages_dir": "~/.darty/packages" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsFile {
    profiles: BTreeMap<String, ProfileSettings>,
}

impl SettingsFile {
    /// Reads the settings file at `path`. A file that does not exist yet reads as empty settings.
    pub async fn read(path: &Path) -> Result<Self, SettingsFileError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(SettingsFileError::CouldNotReadFile {
                    file: path.to_path_buf(),
                    err,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|err| SettingsFileError::ParseError {
            file: path.to_path_buf(),
            err,
        })
    }

    pub async fn save(&self, path: &Path) -> Result<(), SettingsFileError> {
        let json = serde_json::to_string_pretty(&self).map_err(|err| {
            SettingsFileError::SerializeError {
                file: path.to_path_buf(),
                err,
            }
        })?;

        let write = async {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(path, json).await
        };
        write
            .await
            .map_err(|err| SettingsFileError::CouldNotWriteFile {
                file: path.to_path_buf(),
                err,
            })
    }

    pub fn profile(&self, name: &str) -> Option<&ProfileSettings> {
        self.profiles.get(name)
    }

    pub fn set_profile<N>(&mut self, name: N, settings: ProfileSettings)
    where
        N: Into<String>,
    {
        self.profiles.insert(name.into(), settings);
    }
}

#[derive(Error, Debug)]
pub enum SettingsFileError {
    #[error("Could not read settings file at {file:?} due to {err:?}")]
    CouldNotReadFile { file: PathBuf, err: std::io::Error },

    #[error("Could not parse settings file at {file:?} due to {err:?}")]
    ParseError {
        file: PathBuf,
        err: serde_json::Error,
    },

    #[error("Could not serialize settings for {file:?} due to {err:?}")]
    SerializeError {
        file: PathBuf,
        err: serde_json::Error,
    },

    #[error("Could not write settings file at {file:?} due to {err:?}")]
    CouldNotWriteFile { file: PathBuf, err: std::io::Error },
}
