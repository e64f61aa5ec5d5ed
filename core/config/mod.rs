mod settings_file;

pub use settings_file::*;

use crate::drivers::DriverRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::*;

pub const DEFAULT_PROFILE: &str = "default";

/// A collection of settings that affect how Darty runs. This is not specific to a project, it
/// relates to the machine and the user running it.
///
#[derive(Builder, Debug, Clone)]
#[builder(build_fn(error = "ConfigError"))]
pub struct Config {
    /// The home directory of the current user.
    #[builder(default = "self.default_home_dir()?")]
    home_dir: PathBuf,

    /// Where packages are kept on this machine, for every repository.
    #[builder(default = "self.default_packages_dir()?")]
    packages_dir: PathBuf,

    /// The settings profile this config was read from.
    #[builder(setter(into), default = "DEFAULT_PROFILE.to_string()")]
    profile: String,

    /// The per-user settings file.
    #[builder(default = "self.default_settings_path()?")]
    settings_path: PathBuf,

    /// The storage drivers available to repositories.
    /// NOTE: this is safe to clone since it is an [Arc] to a shared registry.
    #[builder(default = "self.default_driver_registry()")]
    driver_registry: Arc<DriverRegistry>,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Reads the default settings file and applies the given profile on top of the defaults.
    pub async fn from_profile(profile: &str) -> Result<Self, ConfigError> {
        let settings_path = Self::builder().default_settings_path()?;
        Self::from_settings(&settings_path, profile).await
    }

    /// Reads the settings file at `settings_path` and applies the given profile on top of the
    /// defaults. A settings file that does not exist yet means all defaults.
    pub async fn from_settings(settings_path: &Path, profile: &str) -> Result<Self, ConfigError> {
        let settings = SettingsFile::read(settings_path).await?;

        let mut builder = Self::builder();
        builder
            .settings_path(settings_path.to_path_buf())
            .profile(profile);

        if let Some(packages_dir) = settings
            .profile(profile)
            .and_then(|profile| profile.packages_dir.as_ref())
        {
            let home_dir = builder.default_home_dir()?;
            builder.packages_dir(expand_home(packages_dir, &home_dir));
        }

        builder.build()
    }

    pub fn home_dir(&self) -> &PathBuf {
        &self.home_dir
    }

    pub fn packages_dir(&self) -> &PathBuf {
        &self.packages_dir
    }

    pub fn set_packages_dir<P>(&mut self, packages_dir: P)
    where
        P: AsRef<str>,
    {
        self.packages_dir = expand_home(packages_dir.as_ref(), &self.home_dir);
    }

    pub fn profile(&self) -> &str {
        self.profile.as_ref()
    }

    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    pub fn driver_registry(&self) -> Arc<DriverRegistry> {
        self.driver_registry.clone()
    }
}

impl ConfigBuilder {
    fn _home_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.home_dir {
            Some(home_dir) => Ok(home_dir.clone()),
            None => self.default_home_dir(),
        }
    }

    fn default_home_dir(&self) -> Result<PathBuf, ConfigError> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().to_path_buf())
            .ok_or(ConfigError::CouldNotFindHomeDir)
    }

    fn default_packages_dir(&self) -> Result<PathBuf, ConfigError> {
        Ok(self._home_dir()?.join(".darty").join("packages"))
    }

    fn default_settings_path(&self) -> Result<PathBuf, ConfigError> {
        Ok(self._home_dir()?.join(".darty").join("config.json"))
    }

    fn default_driver_registry(&self) -> Arc<DriverRegistry> {
        Arc::new(DriverRegistry::with_defaults())
    }
}

/// Expands a leading `~` into the home directory.
pub fn expand_home(path: &str, home_dir: &Path) -> PathBuf {
    if path == "~" {
        return home_dir.to_path_buf();
    }
    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => home_dir.join(rest),
        None => PathBuf::from(path),
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not find the home directory of the current user")]
    CouldNotFindHomeDir,

    #[error(transparent)]
    SettingsFileError(SettingsFileError),

    #[error("Attempted to build a Config struct while missing fields: {0:?}")]
    BuilderError(derive_builder::UninitializedFieldError),
}

impl From<SettingsFileError> for ConfigError {
    fn from(err: SettingsFileError) -> Self {
        Self::SettingsFileError(err)
    }
}

impl From<derive_builder::UninitializedFieldError> for ConfigError {
    fn from(err: derive_builder::UninitializedFieldError) -> Self {
        Self::BuilderError(err)
    }
}
