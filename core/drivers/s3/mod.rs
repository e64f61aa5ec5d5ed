//! S3 storage, in two layouts:
//!
//! * `s3_files` keeps every file of a package as its own object, under
//!   `{group path}/.artifacts/{artifact}-{version}/`.
//! * `s3_zip` keeps a package as one `{group path}/{artifact}-{version}.zip` object.
//!
//! The repository root is the bucket name. Credentials come from the usual AWS environment, and
//! the optional `region` and `endpoint_url` parameters point the client somewhere else, such as
//! an S3-compatible store.
mod files;
mod zip;

pub use files::*;
pub use zip::*;

use super::{Driver, DriverError, DriverFactory, DriverRegistry, Parameters};
use async_trait::async_trait;
use aws_sdk_s3::types::{ByteStream, SdkError};
use futures::TryStreamExt;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub const S3_FILES_DRIVER: &str = "s3_files";
pub const S3_ZIP_DRIVER: &str = "s3_zip";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Files,
    Zip,
}

struct S3DriverFactory(Layout);

#[async_trait]
impl DriverFactory for S3DriverFactory {
    async fn create(
        &self,
        root: &str,
        parameters: &Parameters,
    ) -> Result<Arc<dyn Driver>, DriverError> {
        let client = client_from_parameters(parameters).await?;
        let driver: Arc<dyn Driver> = match self.0 {
            Layout::Files => Arc::new(S3FilesDriver::new(client, root)),
            Layout::Zip => Arc::new(S3ZipDriver::new(client, root)),
        };
        Ok(driver)
    }
}

pub fn register(registry: &mut DriverRegistry) {
    registry.register(S3_FILES_DRIVER, S3DriverFactory(Layout::Files));
    registry.register(S3_ZIP_DRIVER, S3DriverFactory(Layout::Zip));
}

/// Objects moved at once by a single package transfer.
const MAX_CONCURRENT_TRANSFERS: usize = 8;

const KNOWN_PARAMETERS: &[&str] = &["region", "endpoint_url"];

async fn client_from_parameters(parameters: &Parameters) -> Result<aws_sdk_s3::Client, DriverError> {
    if let Some(unknown) = parameters
        .keys()
        .find(|key| !KNOWN_PARAMETERS.contains(&key.as_str()))
    {
        return Err(DriverError::InvalidParameters(format!(
            "unknown parameter {:?}",
            unknown
        )));
    }

    let mut loader = aws_config::from_env();
    if let Some(region) = parameters.get("region") {
        loader = loader.region(aws_sdk_s3::Region::new(region.clone()));
    }
    let shared_config = loader.load().await;

    let mut config = aws_sdk_s3::config::Builder::from(&shared_config);
    if let Some(endpoint_url) = parameters.get("endpoint_url") {
        config = config.endpoint_url(endpoint_url).force_path_style(true);
    }

    Ok(aws_sdk_s3::Client::from_conf(config.build()))
}

fn status_code<E>(err: &SdkError<E>) -> Option<u16> {
    match err {
        SdkError::ServiceError(context) => Some(context.raw().http().status().as_u16()),
        _ => None,
    }
}

/// Turns an S3 failure into a [DriverError], keeping the access problems apart.
fn transfer_error<E>(action: &str, err: SdkError<E>) -> DriverError
where
    E: std::error::Error + 'static,
{
    match status_code(&err) {
        Some(403) => DriverError::AccessDenied,
        _ => DriverError::TransferError(format!("{} error: {}", action, err)),
    }
}

/// Streams an object body into a file at `dst`, one chunk at a time.
async fn write_body(body: ByteStream, dst: &Path) -> Result<(), DriverError> {
    let mut file = fs::File::create(dst).await?;

    tokio::pin!(body);
    while let Some(mut chunk) = body
        .try_next()
        .await
        .map_err(|err| DriverError::TransferError(format!("Download error: {}", err)))?
    {
        file.write_all_buf(&mut chunk).await?;
    }
    file.flush().await?;

    Ok(())
}
