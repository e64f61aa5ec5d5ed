//! # Storage Drivers
//!
//! A [Driver] moves the bytes of one package between a local directory and one storage medium.
//! Drivers are looked up by name in a [DriverRegistry], which ships with the offline
//! [FilesystemDriver] under the `test` name and can be extended with any other backend.
//!
//! Every driver checks the remote for the package on every call, rather than trusting anything
//! cached locally, because a repository is shared and may change under our feet. Uploads are
//! refused when the package already exists: remote storage is append-only per package version.
//!
//! NOTE: the existence check and the write are two separate round-trips, so two processes
//! publishing the same version at the same time can race. Backends with a conditional write
//! should use it.
//!
mod filesystem;
mod registry;
pub mod s3;

pub use filesystem::*;
pub use registry::*;

use crate::package::PackageId;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::*;

/// Free-form, per-repository driver settings, as written in the project file.
pub type Parameters = BTreeMap<String, String>;

#[async_trait]
pub trait Driver: Send + Sync + std::fmt::Debug {
    /// Fetches the package into `dst`, which must already exist and is expected to be empty.
    async fn download(&self, id: &PackageId, dst: &Path) -> Result<(), DriverError>;

    /// Sends the contents of `src` as the package.
    async fn upload(&self, id: &PackageId, src: &Path) -> Result<(), DriverError>;

    /// Asks the remote whether the package exists.
    async fn exists(&self, id: &PackageId) -> Result<bool, DriverError>;
}

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Package not found")]
    NotFound,

    #[error("This version of the package already exists in the repository")]
    AlreadyExists,

    #[error("No access to the repository")]
    AccessDenied,

    #[error("{0}")]
    TransferError(String),

    #[error("Invalid driver parameters: {0}")]
    InvalidParameters(String),

    #[error("Driver {0:?} not found")]
    UnknownDriver(String),

    #[error(transparent)]
    IoError(std::io::Error),
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::IoError(err)
    }
}
