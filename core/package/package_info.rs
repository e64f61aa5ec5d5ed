use super::Environment;
use serde_derive::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

/// The `info.json` record written next to the data of every built package.
///
/// Field order is part of the on-disk format: `group`, `artifact`, `version`, `files`, `name`,
/// `description`, `hash`. A record is never edited after it is written. Publishing again always
/// goes through a fresh build.
///
#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    #[builder(setter(into))]
    group: String,

    #[builder(setter(into))]
    artifact: String,

    #[builder(setter(into))]
    version: String,

    files: Vec<String>,

    #[serde(default)]
    #[builder(setter(into), default)]
    name: String,

    #[serde(default)]
    #[builder(setter(into), default)]
    description: String,

    #[serde(default)]
    #[builder(setter(into), default)]
    hash: String,

    /// Whether this record was read out of the `Local` environment. Not serialized: it is a
    /// property of where the record sits, not of the record.
    #[serde(skip)]
    #[builder(default)]
    local: bool,
}

impl PackageInfo {
    pub fn builder() -> PackageInfoBuilder {
        Default::default()
    }

    pub async fn from_file(path: &Path, local: bool) -> Result<Self, PackageInfoError> {
        let bytes = fs::read(path)
            .await
            .map_err(|err| PackageInfoError::CouldNotReadFile {
                err,
                file: path.to_path_buf(),
            })?;

        let mut info: PackageInfo =
            serde_json::from_slice(&bytes).map_err(|err| PackageInfoError::ParseError {
                err,
                file: path.to_path_buf(),
            })?;
        info.local = local;

        Ok(info)
    }

    pub async fn write(&self, path: &Path) -> Result<(), PackageInfoError> {
        let json = serde_json::to_string_pretty(&self).map_err(|err| {
            PackageInfoError::SerializeError {
                err,
                file: path.to_path_buf(),
            }
        })?;

        fs::write(&path, json)
            .await
            .map_err(|err| PackageInfoError::CouldNotWriteFile {
                err,
                file: path.to_path_buf(),
            })
    }

    pub fn group(&self) -> &str {
        self.group.as_ref()
    }

    pub fn artifact(&self) -> &str {
        self.artifact.as_ref()
    }

    pub fn version(&self) -> &str {
        self.version.as_ref()
    }

    /// Every file in the package's data directory, relative to it and `/`-separated.
    pub fn files(&self) -> &[String] {
        self.files.as_ref()
    }

    pub fn contains(&self, file: &str) -> bool {
        self.files.iter().any(|f| f == file)
    }

    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    pub fn description(&self) -> &str {
        self.description.as_ref()
    }

    pub fn hash(&self) -> &str {
        self.hash.as_ref()
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    /// The environment this record was loaded from.
    pub fn environment(&self) -> Environment {
        if self.local {
            Environment::Local
        } else {
            Environment::Production
        }
    }
}

#[derive(Error, Debug)]
pub enum PackageInfoError {
    #[error("Could not read package info at {file:?} due to {err:?}")]
    CouldNotReadFile { file: PathBuf, err: std::io::Error },

    #[error("Could not parse package info at {file:?} due to {err:?}")]
    ParseError {
        file: PathBuf,
        err: serde_json::Error,
    },

    #[error("Could not serialize package info for {file:?} due to {err:?}")]
    SerializeError {
        file: PathBuf,
        err: serde_json::Error,
    },

    #[error("Could not write package info at {file:?} due to {err:?}")]
    CouldNotWriteFile { file: PathBuf, err: std::io::Error },
}
