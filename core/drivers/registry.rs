use super::{s3, Driver, DriverError, FilesystemDriver, Parameters, FILESYSTEM_DRIVER};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::*;

/// Knows how to create one kind of [Driver] out of a repository's root and parameters.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn create(&self, root: &str, parameters: &Parameters)
        -> Result<Arc<dyn Driver>, DriverError>;
}

struct FnFactory<F>(F);

#[async_trait]
impl<F> DriverFactory for FnFactory<F>
where
    F: Fn(&str, &Parameters) -> Result<Arc<dyn Driver>, DriverError> + Send + Sync,
{
    async fn create(
        &self,
        root: &str,
        parameters: &Parameters,
    ) -> Result<Arc<dyn Driver>, DriverError> {
        (self.0)(root, parameters)
    }
}

/// An open, name-keyed set of driver factories.
///
/// New backends are added with [DriverRegistry::register] and need no changes here. The offline
/// `test` driver is always registered.
///
pub struct DriverRegistry {
    factories: HashMap<String, Arc<dyn DriverFactory>>,
}

impl DriverRegistry {
    /// A registry with only the built-in offline driver.
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::default(),
        };
        registry.register_fn(FILESYSTEM_DRIVER, |root, parameters| {
            Ok(Arc::new(FilesystemDriver::new(root, parameters)?))
        });
        registry
    }

    /// The built-in driver plus the S3 backends.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        s3::register(&mut registry);
        registry
    }

    pub fn register<N, F>(&mut self, name: N, factory: F) -> &mut Self
    where
        N: Into<String>,
        F: DriverFactory + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
        self
    }

    /// Registers a synchronous constructor as a factory.
    pub fn register_fn<N, F>(&mut self, name: N, factory: F) -> &mut Self
    where
        N: Into<String>,
        F: Fn(&str, &Parameters) -> Result<Arc<dyn Driver>, DriverError> + Send + Sync + 'static,
    {
        self.register(name, FnFactory(factory))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(|k| k.as_str()).collect();
        names.sort();
        names
    }

    #[instrument(name = "DriverRegistry::create", skip(self, parameters))]
    pub async fn create(
        &self,
        name: &str,
        root: &str,
        parameters: &Parameters,
    ) -> Result<Arc<dyn Driver>, DriverError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| DriverError::UnknownDriver(name.to_string()))?;
        factory.create(root, parameters).await
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverRegistry")
            .field("drivers", &self.names())
            .finish()
    }
}
