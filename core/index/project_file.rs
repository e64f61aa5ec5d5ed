use crate::package::{DependencyConfig, RepositoryConfig};
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::*;
use tokio::fs;

pub const DEFAULT_CONFIG_FILE: &str = "darty.yaml";

/// The project file, listing the repositories a project pulls from and the dependencies it
/// needs out of them.
///
/// ```yaml
/// repositories:
///   default:
///     type: s3_zip
///     root: my-bucket
/// dependencies:
///   - group: datasets
///     artifact: reviews
///     version: 1.0
///     working-dir: data/reviews
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryConfig>,

    #[serde(default)]
    pub dependencies: Vec<DependencyConfig>,
}

impl ProjectFile {
    pub async fn read(path: &Path) -> Result<Self, ProjectFileError> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProjectFileError::NotFound {
                    file: path.to_path_buf(),
                })
            }
            Err(err) => {
                return Err(ProjectFileError::CouldNotReadFile {
                    file: path.to_path_buf(),
                    err,
                })
            }
        };

        Self::parse(&bytes).map_err(|err| ProjectFileError::ParseError {
            file: path.to_path_buf(),
            err,
        })
    }

    /// An empty document is an empty project.
    pub fn parse(bytes: &[u8]) -> Result<Self, serde_yaml::Error> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Self::default());
        }
        serde_yaml::from_slice(bytes)
    }
}

#[derive(Error, Debug)]
pub enum ProjectFileError {
    #[error("Configuration file {file:?} was not found.")]
    NotFound { file: PathBuf },

    #[error("Could not read configuration file {file:?} due to {err:?}")]
    CouldNotReadFile { file: PathBuf, err: std::io::Error },

    #[error("Could not parse configuration file {file:?}: {err}")]
    ParseError {
        file: PathBuf,
        err: serde_yaml::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[tokio::test]
    async fn reads_repositories_and_dependencies() {
        let dir = assert_fs::TempDir::new().unwrap();
        let file = dir.child(DEFAULT_CONFIG_FILE);
        file.write_str(
            r#"
repositories:
  default:
    type: s3_zip
    root: my-bucket
    parameters:
      region: eu-west-1
dependencies:
  - group: datasets
    artifact: reviews
    version: 1.0
    working-dir: data/reviews
    files:
      - train.csv
"#,
        )
        .unwrap();

        let project = ProjectFile::read(file.path()).await.unwrap();
        let repository = &project.repositories["default"];
        assert_eq!(repository.repository_type, "s3_zip");
        assert_eq!(repository.root, "my-bucket");
        assert_eq!(repository.parameters["region"], "eu-west-1");

        assert_eq!(project.dependencies.len(), 1);
        assert_eq!(project.dependencies[0].version, "1.0");
        assert_eq!(
            project.dependencies[0].files,
            Some(vec!["train.csv".to_string()])
        );
    }

    #[tokio::test]
    async fn reports_missing_files() {
        let dir = assert_fs::TempDir::new().unwrap();
        assert_matches!(
            ProjectFile::read(&dir.path().join(DEFAULT_CONFIG_FILE)).await,
            Err(ProjectFileError::NotFound { .. })
        );
    }
}
