use super::{Driver, DriverError, Parameters};
use crate::package::PackageId;
use crate::util::fs::*;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::*;

pub const FILESYSTEM_DRIVER: &str = "test";

/// Keeps packages in a plain directory tree, laid out as
/// `{local_dir}/{root}/{group path}/{artifact}-{version}/`.
///
/// Useful offline and in tests, where it stands in for a remote repository.
#[derive(Debug, Clone)]
pub struct FilesystemDriver {
    repository_dir: PathBuf,
}

impl FilesystemDriver {
    pub fn new(root: &str, parameters: &Parameters) -> Result<Self, DriverError> {
        let local_dir = parameters.get("local_dir").ok_or_else(|| {
            DriverError::InvalidParameters("\"local_dir\" parameter is required".to_string())
        })?;

        Ok(Self {
            repository_dir: PathBuf::from(local_dir).join(root),
        })
    }

    pub fn package_dir(&self, id: &PackageId) -> PathBuf {
        join_relative(&self.repository_dir, &id.group_path()).join(id.package_name())
    }
}

#[async_trait]
impl Driver for FilesystemDriver {
    #[instrument(name = "FilesystemDriver::download", skip(self))]
    async fn download(&self, id: &PackageId, dst: &Path) -> Result<(), DriverError> {
        let package_dir = self.package_dir(id);
        if !dir_exists(&package_dir).await {
            return Err(DriverError::NotFound);
        }

        debug!("Copying {:?} to {:?}", package_dir, dst);
        for file in list_files(&package_dir).await? {
            copy_file(
                &join_relative(&package_dir, &file),
                &join_relative(dst, &file),
            )
            .await?;
        }

        Ok(())
    }

    #[instrument(name = "FilesystemDriver::upload", skip(self))]
    async fn upload(&self, id: &PackageId, src: &Path) -> Result<(), DriverError> {
        let package_dir = self.package_dir(id);
        if dir_exists(&package_dir).await {
            return Err(DriverError::AlreadyExists);
        }

        // Copy next to the final location first, so a reader never sees half a package.
        let partial_dir = package_dir.with_file_name(format!(".{}.partial", id.package_name()));
        copy_dir(src, &partial_dir).await?;
        if let Err(err) = fs::rename(&partial_dir, &package_dir).await {
            remove_dir_if_exists(&partial_dir).await?;
            return Err(err.into());
        }

        Ok(())
    }

    async fn exists(&self, id: &PackageId) -> Result<bool, DriverError> {
        Ok(dir_exists(&self.package_dir(id)).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn driver(local_dir: &Path) -> FilesystemDriver {
        let mut parameters = Parameters::new();
        parameters.insert(
            "local_dir".to_string(),
            local_dir.to_string_lossy().to_string(),
        );
        FilesystemDriver::new("bucket", &parameters).unwrap()
    }

    #[test]
    fn requires_local_dir() {
        assert_matches!(
            FilesystemDriver::new("bucket", &Parameters::new()),
            Err(DriverError::InvalidParameters(_))
        );
    }

    #[test]
    fn lays_out_packages_by_group() {
        let driver = driver(Path::new("/repo"));
        let id = PackageId::new("group1.subgroup1", "artifact1", "1.0").unwrap();
        assert_eq!(
            driver.package_dir(&id),
            PathBuf::from("/repo/bucket/group1/subgroup1/artifact1-1.0")
        );
    }

    #[tokio::test]
    async fn uploads_then_downloads_a_package() {
        let repo = assert_fs::TempDir::new().unwrap();
        let src = assert_fs::TempDir::new().unwrap();
        let dst = assert_fs::TempDir::new().unwrap();
        src.child("info.json").write_str("{}").unwrap();
        src.child("data/dir/file.txt").write_str("hello").unwrap();

        let driver = driver(repo.path());
        let id = PackageId::new("group1", "artifact1", "1.0").unwrap();

        assert!(!driver.exists(&id).await.unwrap());
        driver.upload(&id, src.path()).await.unwrap();
        assert!(driver.exists(&id).await.unwrap());

        driver.download(&id, dst.path()).await.unwrap();
        dst.child("data/dir/file.txt").assert("hello");
        dst.child("info.json").assert("{}");
    }

    #[tokio::test]
    async fn refuses_to_overwrite_a_package() {
        let repo = assert_fs::TempDir::new().unwrap();
        let src = assert_fs::TempDir::new().unwrap();
        src.child("info.json").write_str("{}").unwrap();

        let driver = driver(repo.path());
        let id = PackageId::new("group1", "artifact1", "1.0").unwrap();

        driver.upload(&id, src.path()).await.unwrap();
        assert_matches!(
            driver.upload(&id, src.path()).await,
            Err(DriverError::AlreadyExists)
        );
    }

    #[tokio::test]
    async fn reports_missing_packages() {
        let repo = assert_fs::TempDir::new().unwrap();
        let dst = assert_fs::TempDir::new().unwrap();

        let driver = driver(repo.path());
        let id = PackageId::new("group1", "artifact1", "1.0").unwrap();

        assert_matches!(
            driver.download(&id, dst.path()).await,
            Err(DriverError::NotFound)
        );
    }
}
