use super::validators::*;
use crate::drivers::{Driver, DriverError, DriverRegistry, Parameters};
use serde_derive::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::*;

/// A repository as declared in the project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(rename = "type", default)]
    pub repository_type: String,

    #[serde(default)]
    pub root: String,

    #[serde(default)]
    pub parameters: Parameters,
}

/// A validated binding between a `(type, root, parameters)` triple and the [Driver] that serves
/// it. The driver is created on first use and then kept for as long as the repository lives.
#[derive(Debug)]
pub struct Repository {
    repository_type: String,
    root: String,
    parameters: Parameters,
    registry: Arc<DriverRegistry>,
    driver: OnceCell<Arc<dyn Driver>>,
}

impl Repository {
    pub fn new(
        config: RepositoryConfig,
        registry: Arc<DriverRegistry>,
    ) -> Result<Self, ValidationError> {
        validate_repository_type(&config.repository_type)?;
        validate_repository_root(&config.root)?;

        Ok(Self {
            repository_type: config.repository_type,
            root: config.root,
            parameters: config.parameters,
            registry,
            driver: OnceCell::new(),
        })
    }

    pub fn repository_type(&self) -> &str {
        self.repository_type.as_ref()
    }

    pub fn root(&self) -> &str {
        self.root.as_ref()
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[instrument(name = "Repository::driver", skip(self), fields(repository_type = %self.repository_type, root = %self.root))]
    pub async fn driver(&self) -> Result<Arc<dyn Driver>, DriverError> {
        let driver = self
            .driver
            .get_or_try_init(|| async {
                debug!("Creating driver");
                self.registry
                    .create(&self.repository_type, &self.root, &self.parameters)
                    .await
            })
            .await?;
        Ok(driver.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageId;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct NoopDriver;

    #[async_trait]
    impl Driver for NoopDriver {
        async fn download(&self, _id: &PackageId, _dst: &Path) -> Result<(), DriverError> {
            Ok(())
        }

        async fn upload(&self, _id: &PackageId, _src: &Path) -> Result<(), DriverError> {
            Ok(())
        }

        async fn exists(&self, _id: &PackageId) -> Result<bool, DriverError> {
            Ok(true)
        }
    }

    fn config(repository_type: &str, root: &str) -> RepositoryConfig {
        RepositoryConfig {
            repository_type: repository_type.to_string(),
            root: root.to_string(),
            parameters: Parameters::new(),
        }
    }

    #[test]
    fn validates_type_and_root() {
        let registry = Arc::new(DriverRegistry::new());
        assert_matches!(
            Repository::new(config("", "bucket"), registry.clone()),
            Err(ValidationError::Missing {
                field: "Repository type"
            })
        );
        assert_matches!(
            Repository::new(config("s3", "Bucket!"), registry.clone()),
            Err(ValidationError::InvalidFormat {
                field: "Repository root",
                ..
            })
        );
        assert!(Repository::new(config("s3", "my-bucket"), registry).is_ok());
    }

    #[tokio::test]
    async fn creates_the_driver_once() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();

        let mut registry = DriverRegistry::new();
        registry.register_fn("noop", move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(NoopDriver))
        });

        let repository = Repository::new(config("noop", "bucket"), Arc::new(registry)).unwrap();
        repository.driver().await.unwrap();
        repository.driver().await.unwrap();

        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_types_fail_on_first_use() {
        let repository =
            Repository::new(config("ftp", "bucket"), Arc::new(DriverRegistry::new())).unwrap();
        assert_matches!(
            repository.driver().await,
            Err(DriverError::UnknownDriver(_))
        );
    }
}
