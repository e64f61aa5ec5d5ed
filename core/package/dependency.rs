use super::*;
use crate::drivers::DriverError;
use crate::output::Output;
use crate::util::fs::*;
use serde_derive::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tracing::*;

/// A dependency as declared in the project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DependencyConfig {
    #[serde(default)]
    pub group: String,

    #[serde(default)]
    pub artifact: String,

    #[serde(default, deserialize_with = "crate::util::serde::version::deserialize")]
    pub version: String,

    #[serde(default)]
    pub working_dir: Option<String>,

    #[serde(default, deserialize_with = "crate::util::serde::non_empty::deserialize")]
    pub files: Option<Vec<String>>,

    #[serde(default)]
    pub default_file: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub repository: Option<String>,
}

/// One versioned artifact the project depends on, bound to the [Repository] it comes from.
///
/// A `Dependency` owns the on-disk state of its package across every [Environment]:
///
/// * `build` stages the working directory into `Tmp`.
/// * `publish` builds and then promotes `Tmp` to `Local`, or uploads it and promotes it to
///   `Production`.
/// * `download` fetches a package into `Tmp`, checks it, and promotes it to `Production`.
/// * `update` downloads and then copies the package into the working directory.
///
/// `Tmp` is wiped before it is used and removed before any of these return.
///
#[derive(Debug)]
pub struct Dependency {
    id: PackageId,
    working_dir: Option<String>,
    files: Option<Vec<String>>,
    default_file: Option<String>,
    name: String,
    description: String,
    repository: Arc<Repository>,
    paths: ArtifactPaths,
    project_dir: PathBuf,
}

impl Dependency {
    pub fn new(
        config: DependencyConfig,
        repository: Arc<Repository>,
        packages_dir: &Path,
        project_dir: &Path,
    ) -> Result<Self, ValidationError> {
        let id = PackageId::new(config.group, config.artifact, config.version)?;

        if let Some(files) = &config.files {
            for file in files {
                validate_file_path(file)?;
            }
        }

        let paths = ArtifactPaths::new(
            packages_dir,
            repository.repository_type(),
            repository.root(),
            &id,
        );

        Ok(Self {
            id,
            working_dir: config.working_dir.filter(|dir| !dir.is_empty()),
            files: config.files,
            default_file: config.default_file.filter(|file| !file.is_empty()),
            name: config.name,
            description: config.description,
            repository,
            paths,
            project_dir: project_dir.to_path_buf(),
        })
    }

    pub fn id(&self) -> &PackageId {
        &self.id
    }

    pub fn group(&self) -> &str {
        self.id.group()
    }

    pub fn artifact(&self) -> &str {
        self.id.artifact()
    }

    pub fn version(&self) -> &str {
        self.id.version()
    }

    pub fn working_dir(&self) -> Option<&str> {
        self.working_dir.as_deref()
    }

    pub fn files(&self) -> Option<&[String]> {
        self.files.as_deref()
    }

    pub fn default_file(&self) -> Option<&str> {
        self.default_file.as_deref()
    }

    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    pub fn description(&self) -> &str {
        self.description.as_ref()
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    fn working_dir_path(&self) -> Option<PathBuf> {
        self.working_dir
            .as_ref()
            .map(|dir| join_relative(&self.project_dir, &dir.replace('\\', "/")))
    }

    /// The record of this package on this machine, if it was published locally or downloaded.
    /// A local record shadows a production one.
    pub async fn package_info(&self) -> Result<Option<PackageInfo>, DependencyError> {
        for env in [Environment::Local, Environment::Production] {
            let info_path = self.paths.info_path(env);
            if file_exists(&info_path).await {
                let info = PackageInfo::from_file(&info_path, env == Environment::Local).await?;
                return Ok(Some(info));
            }
        }
        Ok(None)
    }

    /// Resolves the directory of this package, or one of its files.
    ///
    /// While a working directory is set up, it answers first: the whole directory when no file is
    /// asked for (unless an allow-list narrows the package down to some files), or the requested
    /// file when it is there. Everything else is answered from the installed package, where a
    /// local copy wins over a production one.
    ///
    #[instrument(name = "Dependency::get_path", skip(self), fields(package = %self.id))]
    pub async fn get_path(&self, file_path: Option<&str>) -> Result<PathBuf, DependencyError> {
        let file_path = file_path
            .map(|file| file.replace('\\', "/"))
            .filter(|file| !file.is_empty());

        if let Some(file) = &file_path {
            if !is_contained_path(file) {
                return Err(DependencyError::PathOutsideOfPackage { file: file.clone() });
            }
        }

        if let Some(working_dir) = self.working_dir_path() {
            match &file_path {
                None if self.files.is_none() => {
                    if !is_dir_empty(&working_dir).await? {
                        return Ok(working_dir);
                    }
                }
                None => (),
                Some(file) => {
                    if let Some(files) = &self.files {
                        if !files.contains(file) {
                            return Err(DependencyError::FileNotInAllowList {
                                file: file.clone(),
                                package: format!("{}:{}", self.group(), self.artifact()),
                            });
                        }
                    }

                    let path = join_relative(&working_dir, file);
                    if file_exists(&path).await {
                        return Ok(path);
                    }
                }
            }
        }

        let info = self
            .package_info()
            .await?
            .ok_or_else(|| DependencyError::NotInstalled {
                package: self.id.to_string(),
            })?;

        let data_dir = self.paths.data_dir(info.environment());
        match file_path {
            None => Ok(data_dir),
            Some(file) if info.contains(&file) => Ok(join_relative(&data_dir, &file)),
            Some(file) => Err(DependencyError::FileNotInPackage {
                file,
                package: self.id.to_string(),
            }),
        }
    }

    /// Stages the working directory (or just its allow-listed files) into `Tmp`, and writes the
    /// package record next to it. Returns the staged artifact directory.
    #[instrument(name = "Dependency::build", skip(self), fields(package = %self.id))]
    pub async fn build(&self) -> Result<PathBuf, DependencyError> {
        let working_dir = self
            .working_dir_path()
            .ok_or(DependencyError::NoWorkingDir)?;
        if !dir_exists(&working_dir).await {
            return Err(DependencyError::WorkingDirMissing { dir: working_dir });
        }

        let artifact_dir = self.paths.artifact_dir(Environment::Tmp);
        remove_dir_if_exists(&artifact_dir).await?;

        let result = self.stage(&working_dir).await;
        if result.is_err() {
            remove_dir_if_exists(&artifact_dir).await?;
        }
        result.map(|_| artifact_dir)
    }

    async fn stage(&self, working_dir: &Path) -> Result<PackageInfo, DependencyError> {
        let data_dir = self.paths.data_dir(Environment::Tmp);
        fs::create_dir_all(&data_dir).await?;

        match &self.files {
            Some(files) => {
                for file in files {
                    let src = join_relative(working_dir, file);
                    if !file_exists(&src).await {
                        return Err(DependencyError::FileMissingFromWorkingDir {
                            file: file.clone(),
                        });
                    }
                    copy_file(&src, &join_relative(&data_dir, file)).await?;
                }
            }
            None => copy_dir(working_dir, &data_dir).await?,
        }

        let files = list_files(&data_dir).await?;
        let hash = ContentHasher::hash(&data_dir, &files).await?;
        debug!("Staged {} files with hash {}", files.len(), hash);

        let info = PackageInfo::builder()
            .group(self.group())
            .artifact(self.artifact())
            .version(self.version())
            .files(files)
            .name(self.name.clone())
            .description(self.description.clone())
            .hash(hash)
            .build()?;
        info.write(&self.paths.info_path(Environment::Tmp)).await?;

        Ok(info)
    }

    /// Builds the package and publishes it, either to the repository or only on this machine.
    ///
    /// A version that already sits in `Production` is never published again. A local version
    /// is only replaced when `rewrite_local` is set. Returns whether the package was published;
    /// the reason it was not is written to `output`.
    #[instrument(name = "Dependency::publish", skip(self, output), fields(package = %self.id))]
    pub async fn publish(
        &self,
        local: bool,
        rewrite_local: bool,
        output: &dyn Output,
    ) -> Result<bool, DependencyError> {
        if file_exists(&self.paths.info_path(Environment::Production)).await {
            output.write(&format!(
                "[-] Version \"{}\" already exists in the repository",
                self.version()
            ));
            return Ok(false);
        }

        if !rewrite_local && file_exists(&self.paths.info_path(Environment::Local)).await {
            output.write(&format!(
                "[-] Version \"{}\" already exists locally. Use \"-r\" flag to rewrite this version.",
                self.version()
            ));
            return Ok(false);
        }

        output.write("Building the package...");
        let tmp_dir = {
            let _indent = output.indent();
            match self.build().await {
                Ok(tmp_dir) => tmp_dir,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    output.write(&format!("[-] {}", err));
                    return Ok(false);
                }
            }
        };

        let result = if local {
            self.promote_local(&tmp_dir, output).await
        } else {
            self.upload(&tmp_dir, output).await
        };
        remove_dir_if_exists(&tmp_dir).await?;

        if !result? {
            return Ok(false);
        }

        if let Some(info) = self.package_info().await? {
            output.write("");
            output.write("Package files:");
            let _indent = output.indent();
            for file in info.files() {
                output.write(file);
            }
        }

        Ok(true)
    }

    async fn promote_local(&self, tmp_dir: &Path, output: &dyn Output) -> Result<bool, DependencyError> {
        output.write("Publishing the package locally...");
        move_dir(tmp_dir, &self.paths.artifact_dir(Environment::Local)).await?;

        let _indent = output.indent();
        output.write(&format!(
            "[+] Package \"{}\" was successfully published locally.",
            self.id
        ));
        Ok(true)
    }

    async fn upload(&self, tmp_dir: &Path, output: &dyn Output) -> Result<bool, DependencyError> {
        output.write("Publishing the package...");
        let _indent = output.indent();

        let driver = match self.repository.driver().await {
            Ok(driver) => driver,
            Err(err) => {
                output.write(&format!("[-] {}", err));
                return Ok(false);
            }
        };

        if let Err(err) = driver.upload(&self.id, tmp_dir).await {
            warn!("Could not upload {}: {:?}", self.id, err);
            output.write(&format!("[-] {}", err));
            return Ok(false);
        }

        move_dir(tmp_dir, &self.paths.artifact_dir(Environment::Production)).await?;
        remove_dir_if_exists(&self.paths.artifact_dir(Environment::Local)).await?;

        output.write(&format!(
            "[+] Package \"{}\" was successfully published.",
            self.id
        ));
        Ok(true)
    }

    /// Makes sure the package is installed on this machine, fetching it from the repository
    /// when it is neither published locally nor downloaded yet.
    ///
    /// Failures to fetch are written to `output` and reported as `None`, so a caller working
    /// through many dependencies can carry on with the rest.
    #[instrument(name = "Dependency::download", skip(self, output), fields(package = %self.id))]
    pub async fn download(
        &self,
        output: &dyn Output,
    ) -> Result<Option<PackageInfo>, DependencyError> {
        output.write(&format!("Downloading package \"{}\"...", self.id));
        let _indent = output.indent();

        if let Some(info) = self.package_info().await? {
            if info.is_local() {
                output.write("[+] It's a locally published package");
            } else {
                output.write("[+] The package was already downloaded");
            }
            return Ok(Some(info));
        }

        let tmp_dir = self.paths.artifact_dir(Environment::Tmp);
        remove_dir_if_exists(&tmp_dir).await?;
        fs::create_dir_all(&tmp_dir).await?;

        if let Err(err) = self.fetch(&tmp_dir).await {
            remove_dir_if_exists(&tmp_dir).await?;
            warn!("Could not download {}: {:?}", self.id, err);
            output.write(&format!("[-] {}", err));
            return Ok(None);
        }

        let artifact_dir = self.paths.artifact_dir(Environment::Production);
        if let Err(err) = move_dir(&tmp_dir, &artifact_dir).await {
            remove_dir_if_exists(&tmp_dir).await?;
            return Err(err.into());
        }

        let info = PackageInfo::from_file(&self.paths.info_path(Environment::Production), false)
            .await?;
        output.write("[+] The package was successfully downloaded");

        Ok(Some(info))
    }

    /// Downloads into `tmp_dir` and checks that what arrived is a whole package.
    async fn fetch(&self, tmp_dir: &Path) -> Result<(), DriverError> {
        let driver = self.repository.driver().await?;
        driver.download(&self.id, tmp_dir).await?;

        let info_path = tmp_dir.join(INFO_FILE);
        let info = PackageInfo::from_file(&info_path, false)
            .await
            .map_err(|err| {
                DriverError::TransferError(format!("Downloaded package is broken: {}", err))
            })?;

        let data_dir = tmp_dir.join(DATA_DIR);
        for file in info.files() {
            if validate_file_path(file).is_err()
                || !file_exists(&join_relative(&data_dir, file)).await
            {
                return Err(DriverError::TransferError(format!(
                    "File \"{}\" is missing from the downloaded package",
                    file
                )));
            }
        }

        Ok(())
    }

    /// Downloads the package and copies its content into the working directory.
    ///
    /// With an allow-list, each listed file is copied unless it is already there. Without one, the
    /// whole package is copied into an empty working directory, and a non-empty one is left
    /// alone. `rewrite_working_dir` overwrites in both cases. Returns whether the package could
    /// be downloaded.
    #[instrument(name = "Dependency::update", skip(self, output), fields(package = %self.id))]
    pub async fn update(
        &self,
        rewrite_working_dir: bool,
        output: &dyn Output,
    ) -> Result<bool, DependencyError> {
        let info = match self.download(output).await? {
            Some(info) => info,
            None => return Ok(false),
        };

        let (working_dir_name, working_dir) = match (&self.working_dir, self.working_dir_path()) {
            (Some(name), Some(path)) => (name, path),
            _ => return Ok(true),
        };

        let _outer = output.indent();
        output.write(&format!(
            "Copying files to the working directory \"{}\"...",
            working_dir_name
        ));
        let _inner = output.indent();

        fs::create_dir_all(&working_dir).await?;
        let data_dir = self.paths.data_dir(info.environment());

        match &self.files {
            Some(files) => {
                for file in files {
                    if !info.contains(file) {
                        output.write(&format!(
                            "[-] \"{}\": file doesn't exist in the package",
                            file
                        ));
                        continue;
                    }

                    let src = join_relative(&data_dir, file);
                    let dst = join_relative(&working_dir, file);
                    if !file_exists(&dst).await {
                        copy_file(&src, &dst).await?;
                        output.write(&format!("[+] \"{}\": file copied", file));
                    } else if rewrite_working_dir {
                        copy_file(&src, &dst).await?;
                        output.write(&format!("[+] \"{}\": file rewritten", file));
                    } else {
                        output.write(&format!("[-] \"{}\": file already exists", file));
                    }
                }
            }
            None => {
                if is_dir_empty(&working_dir).await? {
                    copy_dir(&data_dir, &working_dir).await?;
                    output.write(&format!(
                        "[+] files copied to the \"{}\" directory",
                        working_dir_name
                    ));
                } else if rewrite_working_dir {
                    copy_dir(&data_dir, &working_dir).await?;
                    output.write(&format!(
                        "[+] directory \"{}\" was rewritten",
                        working_dir_name
                    ));
                } else {
                    output.write(&format!(
                        "[-] files not changed: directory \"{}\" is not empty",
                        working_dir_name
                    ));
                }
            }
        }

        Ok(true)
    }
}

#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("Package \"{package}\" is not installed")]
    NotInstalled { package: String },

    #[error("File \"{file}\" doesn't exist in the package \"{package}\"")]
    FileNotInPackage { file: String, package: String },

    #[error("File \"{file}\" is not a part of the package \"{package}\"")]
    FileNotInAllowList { file: String, package: String },

    #[error("File \"{file}\" points outside of the package")]
    PathOutsideOfPackage { file: String },

    #[error("Package doesn't have working directory")]
    NoWorkingDir,

    #[error("Working directory {dir:?} doesn't exist")]
    WorkingDirMissing { dir: PathBuf },

    #[error("File \"{file}\" doesn't exist in the working directory")]
    FileMissingFromWorkingDir { file: String },

    #[error(transparent)]
    PackageInfoError(PackageInfoError),

    #[error(transparent)]
    IncompletePackageInfo(PackageInfoBuilderError),

    #[error(transparent)]
    IoError(std::io::Error),
}

impl DependencyError {
    /// Whether the error comes from the local environment rather than from the package setup.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DependencyError::PackageInfoError(_)
                | DependencyError::IncompletePackageInfo(_)
                | DependencyError::IoError(_)
        )
    }
}

impl From<PackageInfoError> for DependencyError {
    fn from(err: PackageInfoError) -> Self {
        DependencyError::PackageInfoError(err)
    }
}

impl From<PackageInfoBuilderError> for DependencyError {
    fn from(err: PackageInfoBuilderError) -> Self {
        DependencyError::IncompletePackageInfo(err)
    }
}

impl From<std::io::Error> for DependencyError {
    fn from(err: std::io::Error) -> Self {
        DependencyError::IoError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::{DriverRegistry, Parameters};
    use crate::output::NullOutput;
    use assert_fs::prelude::*;

    struct Fixture {
        project: assert_fs::TempDir,
        packages: assert_fs::TempDir,
        remote: assert_fs::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                project: assert_fs::TempDir::new().unwrap(),
                packages: assert_fs::TempDir::new().unwrap(),
                remote: assert_fs::TempDir::new().unwrap(),
            }
        }

        fn dependency(&self, config: DependencyConfig) -> Dependency {
            let mut parameters = Parameters::new();
            parameters.insert(
                "local_dir".to_string(),
                self.remote.path().to_string_lossy().to_string(),
            );
            let repository = Repository::new(
                RepositoryConfig {
                    repository_type: "test".to_string(),
                    root: "bucket".to_string(),
                    parameters,
                },
                Arc::new(DriverRegistry::new()),
            )
            .unwrap();

            Dependency::new(
                config,
                Arc::new(repository),
                self.packages.path(),
                self.project.path(),
            )
            .unwrap()
        }
    }

    fn config(working_dir: Option<&str>, files: Option<Vec<&str>>) -> DependencyConfig {
        DependencyConfig {
            group: "group1".to_string(),
            artifact: "artifact1".to_string(),
            version: "1.0".to_string(),
            working_dir: working_dir.map(|dir| dir.to_string()),
            files: files.map(|files| files.into_iter().map(|f| f.to_string()).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn parses_numeric_versions_and_kebab_case_keys() {
        let config: DependencyConfig = serde_yaml::from_str(
            "group: group1\nartifact: artifact1\nversion: 1.0\nworking-dir: data/a\nfiles: []\ndefault-file: a.txt\n",
        )
        .unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.working_dir.as_deref(), Some("data/a"));
        assert_eq!(config.default_file.as_deref(), Some("a.txt"));
        assert_eq!(config.files, None);

        let config: DependencyConfig =
            serde_yaml::from_str("group: group1\nartifact: artifact1\nversion: 2\n").unwrap();
        assert_eq!(config.version, "2");
    }

    #[test]
    fn rejects_malformed_allow_lists() {
        let fixture = Fixture::new();
        let repository = Arc::new(
            Repository::new(
                RepositoryConfig {
                    repository_type: "test".to_string(),
                    root: "bucket".to_string(),
                    parameters: Parameters::new(),
                },
                Arc::new(DriverRegistry::new()),
            )
            .unwrap(),
        );

        assert_matches!(
            Dependency::new(
                config(Some("data"), Some(vec!["../secret.txt"])),
                repository,
                fixture.packages.path(),
                fixture.project.path(),
            ),
            Err(ValidationError::InvalidFormat { field: "Path", .. })
        );
    }

    #[tokio::test]
    async fn builds_a_package_record_in_tmp() {
        let fixture = Fixture::new();
        fixture.project.child("data/a.txt").write_str("a").unwrap();
        fixture.project.child("data/sub/b.txt").write_str("b").unwrap();

        let dependency = fixture.dependency(config(Some("data"), None));
        let tmp_dir = dependency.build().await.unwrap();

        assert_eq!(tmp_dir, dependency.paths().artifact_dir(Environment::Tmp));
        let info = PackageInfo::from_file(&tmp_dir.join(INFO_FILE), false)
            .await
            .unwrap();
        assert_eq!(info.files(), &["a.txt".to_string(), "sub/b.txt".to_string()]);
        assert_eq!(info.hash().len(), 64);
    }

    #[tokio::test]
    async fn build_needs_a_working_dir() {
        let fixture = Fixture::new();

        let dependency = fixture.dependency(config(None, None));
        assert_matches!(dependency.build().await, Err(DependencyError::NoWorkingDir));

        let dependency = fixture.dependency(config(Some("missing"), None));
        assert_matches!(
            dependency.build().await,
            Err(DependencyError::WorkingDirMissing { .. })
        );
    }

    #[tokio::test]
    async fn build_cleans_up_after_a_missing_file() {
        let fixture = Fixture::new();
        fixture.project.child("data/a.txt").write_str("a").unwrap();

        let dependency = fixture.dependency(config(Some("data"), Some(vec!["a.txt", "b.txt"])));
        assert_matches!(
            dependency.build().await,
            Err(DependencyError::FileMissingFromWorkingDir { file }) if file == "b.txt"
        );
        assert!(!dir_exists(&dependency.paths().artifact_dir(Environment::Tmp)).await);
    }

    #[tokio::test]
    async fn working_dir_answers_first() {
        let fixture = Fixture::new();
        fixture.project.child("data/a.txt").write_str("a").unwrap();

        let dependency = fixture.dependency(config(Some("data"), None));
        assert_eq!(
            dependency.get_path(None).await.unwrap(),
            fixture.project.path().join("data")
        );
        assert_eq!(
            dependency.get_path(Some("a.txt")).await.unwrap(),
            fixture.project.path().join("data").join("a.txt")
        );
    }

    #[tokio::test]
    async fn requested_files_stay_inside_the_package() {
        let fixture = Fixture::new();
        fixture.project.child("data/a.txt").write_str("a").unwrap();
        fixture.project.child("secret.txt").write_str("s").unwrap();

        let dependency = fixture.dependency(config(Some("data"), None));
        assert_matches!(
            dependency.get_path(Some("../secret.txt")).await,
            Err(DependencyError::PathOutsideOfPackage { file }) if file == "../secret.txt"
        );
        assert_matches!(
            dependency.get_path(Some("..\\secret.txt")).await,
            Err(DependencyError::PathOutsideOfPackage { file }) if file == "../secret.txt"
        );
        assert_matches!(
            dependency.get_path(Some("/etc/passwd")).await,
            Err(DependencyError::PathOutsideOfPackage { .. })
        );
    }

    #[tokio::test]
    async fn uninstalled_packages_cannot_be_resolved() {
        let fixture = Fixture::new();

        let dependency = fixture.dependency(config(Some("data"), None));
        assert_matches!(
            dependency.get_path(None).await,
            Err(DependencyError::NotInstalled { .. })
        );
    }

    #[tokio::test]
    async fn publishing_without_a_working_dir_is_reported() {
        let fixture = Fixture::new();
        let output = crate::output::BufferOutput::new();

        let dependency = fixture.dependency(config(None, None));
        assert!(!dependency.publish(false, false, &output).await.unwrap());
        assert!(output.contains("[-] Package doesn't have working directory"));
        assert!(!dependency.publish(true, false, &NullOutput).await.unwrap());
    }
}
