//! # Dependency Index
//!
//! Reads a project file and turns it into validated [Repository] and [Dependency] values, then
//! answers lookups over them. Dependencies keep the order they were declared in.
//!
mod project_file;

pub use project_file::*;

use crate::config::Config;
use crate::drivers::DriverRegistry;
use crate::package::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::*;
use tracing::*;

/// The repository a dependency binds to when it does not name one.
pub const DEFAULT_REPOSITORY: &str = "default";

#[derive(Debug)]
pub struct DependencyIndex {
    dependencies: Vec<Dependency>,
    keys: HashMap<String, usize>,
}

/// The key a dependency is indexed by. Artifact names never hold a dot, so this is unique.
pub fn dependency_key(group: &str, artifact: &str) -> String {
    format!("{}.{}", group, artifact)
}

impl DependencyIndex {
    /// Loads the project file at `path`. Relative working directories are resolved from the
    /// directory holding that file.
    #[instrument(name = "DependencyIndex::load", skip(config))]
    pub async fn load(config: &Config, path: &Path) -> Result<Self, DependencyIndexError> {
        let project = ProjectFile::read(path).await?;
        let project_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(PathBuf::new);

        Self::from_project_file(
            project,
            config.packages_dir(),
            &project_dir,
            config.driver_registry(),
        )
    }

    pub fn from_project_file(
        project: ProjectFile,
        packages_dir: &Path,
        project_dir: &Path,
        registry: Arc<DriverRegistry>,
    ) -> Result<Self, DependencyIndexError> {
        if project.repositories.is_empty() {
            return Err(DependencyIndexError::NoRepositories);
        }
        if project.dependencies.is_empty() {
            return Err(DependencyIndexError::NoDependencies);
        }

        let mut repositories: HashMap<String, Arc<Repository>> = HashMap::default();
        for (name, repository_config) in project.repositories {
            let repository = Repository::new(repository_config, registry.clone()).map_err(|err| {
                DependencyIndexError::InvalidRepository {
                    name: name.clone(),
                    err,
                }
            })?;
            repositories.insert(name, Arc::new(repository));
        }

        let mut index = Self {
            dependencies: vec![],
            keys: HashMap::default(),
        };

        for (i, dependency_config) in project.dependencies.into_iter().enumerate() {
            let repository_name = dependency_config
                .repository
                .clone()
                .unwrap_or_else(|| DEFAULT_REPOSITORY.to_string());

            let repository = repositories.get(&repository_name).ok_or_else(|| {
                DependencyIndexError::UnknownRepository {
                    name: repository_name.clone(),
                }
            })?;

            let dependency = Dependency::new(
                dependency_config,
                repository.clone(),
                packages_dir,
                project_dir,
            )
            .map_err(|err| DependencyIndexError::InvalidDependency { number: i + 1, err })?;

            let key = dependency_key(dependency.group(), dependency.artifact());
            if index.keys.contains_key(&key) {
                return Err(DependencyIndexError::DuplicateDependency {
                    group: dependency.group().to_string(),
                    artifact: dependency.artifact().to_string(),
                });
            }

            index.keys.insert(key, index.dependencies.len());
            index.dependencies.push(dependency);
        }

        debug!("Indexed {} dependencies", index.dependencies.len());
        Ok(index)
    }

    pub fn lookup(&self, group: &str, artifact: &str) -> Option<&Dependency> {
        self.keys
            .get(&dependency_key(group, artifact))
            .map(|i| &self.dependencies[*i])
    }

    pub fn search_by_artifact(&self, artifact: &str) -> Vec<&Dependency> {
        self.dependencies
            .iter()
            .filter(|dependency| dependency.artifact() == artifact)
            .collect()
    }

    pub fn all(&self) -> Vec<&Dependency> {
        self.dependencies.iter().collect()
    }

    /// Picks the dependencies a command should work on: one by its full name, all of those
    /// sharing an artifact name, or every one of them when nothing narrows the choice down.
    pub fn select(
        &self,
        group: Option<&str>,
        artifact: Option<&str>,
    ) -> Result<Vec<&Dependency>, DependencyIndexError> {
        match (group, artifact) {
            (Some(group), Some(artifact)) => self
                .lookup(group, artifact)
                .map(|dependency| vec![dependency])
                .ok_or_else(|| DependencyIndexError::DependencyNotFound {
                    group: group.to_string(),
                    artifact: artifact.to_string(),
                }),
            (_, Some(artifact)) => {
                let dependencies = self.search_by_artifact(artifact);
                if dependencies.is_empty() {
                    return Err(DependencyIndexError::ArtifactNotFound {
                        artifact: artifact.to_string(),
                    });
                }
                Ok(dependencies)
            }
            (_, None) => Ok(self.all()),
        }
    }

    /// Resolves a path to the content of the dependency `group:artifact`.
    pub async fn get_path(
        &self,
        group: &str,
        artifact: &str,
        file_path: Option<&str>,
    ) -> Result<PathBuf, DependencyIndexError> {
        let dependency = self.lookup(group, artifact).ok_or_else(|| {
            DependencyIndexError::DependencyNotFound {
                group: group.to_string(),
                artifact: artifact.to_string(),
            }
        })?;
        Ok(dependency.get_path(file_path).await?)
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum DependencyIndexError {
    #[error(transparent)]
    ProjectFileError(ProjectFileError),

    #[error("Repositories are not specified")]
    NoRepositories,

    #[error("Dependencies are not specified")]
    NoDependencies,

    #[error("Repository \"{name}\": {err}")]
    InvalidRepository { name: String, err: ValidationError },

    #[error("Repository \"{name}\" doesn't exist")]
    UnknownRepository { name: String },

    #[error("Dependency #{number}: {err}")]
    InvalidDependency { number: usize, err: ValidationError },

    #[error("Config contains two dependencies with the same name: \"{group}:{artifact}\"")]
    DuplicateDependency { group: String, artifact: String },

    #[error("The package \"{group}:{artifact}\" was not found in the configuration file")]
    DependencyNotFound { group: String, artifact: String },

    #[error("Package with artifact={artifact} not found")]
    ArtifactNotFound { artifact: String },

    #[error(transparent)]
    DependencyError(DependencyError),
}

impl From<ProjectFileError> for DependencyIndexError {
    fn from(err: ProjectFileError) -> Self {
        DependencyIndexError::ProjectFileError(err)
    }
}

impl From<DependencyError> for DependencyIndexError {
    fn from(err: DependencyError) -> Self {
        DependencyIndexError::DependencyError(err)
    }
}
