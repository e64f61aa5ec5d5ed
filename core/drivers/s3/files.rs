use super::{status_code, transfer_error, write_body, MAX_CONCURRENT_TRANSFERS};
use crate::drivers::{Driver, DriverError};
use crate::package::{validate_file_path, PackageId, INFO_FILE};
use crate::util::fs::*;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use futures::{StreamExt, TryStreamExt};
use std::path::Path;
use tokio::fs;
use tracing::*;

/// One S3 object per package file.
///
/// The package's `info.json` is uploaded after every other object and marks the package as
/// present. Objects left behind by an interrupted upload are invisible until it lands.
#[derive(Debug, Clone)]
pub struct S3FilesDriver {
    client: Client,
    bucket: String,
}

impl S3FilesDriver {
    pub fn new(client: Client, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    /// The key prefix shared by every object of a package, ending with a `/`.
    pub fn package_prefix(id: &PackageId) -> String {
        format!("{}/.artifacts/{}/", id.group_path(), id.package_name())
    }

    /// The key of the object whose presence means the package was published.
    pub fn marker_key(id: &PackageId) -> String {
        format!("{}{}", Self::package_prefix(id), INFO_FILE)
    }

    /// The package-relative path of an object key, if the key is a file of the package.
    pub fn relative_path<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(prefix)
            .filter(|path| !path.is_empty() && !path.ends_with('/'))
    }

    /// Splits the files of a package into the data files and the marker, which goes up last.
    pub fn upload_order(mut files: Vec<String>) -> Result<(Vec<String>, String), DriverError> {
        let marker = files
            .iter()
            .position(|file| file == INFO_FILE)
            .ok_or_else(|| {
                DriverError::TransferError(format!("Package has no {} to upload", INFO_FILE))
            })?;
        let marker = files.remove(marker);
        Ok((files, marker))
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, DriverError> {
        let mut keys = vec![];
        let mut continuation_token: Option<String> = None;

        loop {
            let output = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|err| transfer_error("List", err))?;

            for object in output.contents().unwrap_or_default() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }

            match output.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(keys)
    }

    async fn download_object(&self, key: String, dst: &Path) -> Result<(), DriverError> {
        debug!("Downloading s3://{}/{} to {:?}", self.bucket, key, dst);

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|err| transfer_error("Download", err))?;

        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent).await?;
        }
        write_body(output.body, dst).await
    }

    async fn upload_object(&self, src: &Path, key: &str) -> Result<(), DriverError> {
        debug!("Uploading {:?} to s3://{}/{}", src, self.bucket, key);

        let body = aws_sdk_s3::types::ByteStream::from_path(src)
            .await
            .map_err(|err| DriverError::TransferError(format!("Upload error: {}", err)))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|err| transfer_error("Upload", err))?;

        Ok(())
    }

    /// Removes objects written by a failed upload. Failures here are only logged.
    async fn delete_objects(&self, keys: Vec<String>) {
        futures::stream::iter(keys)
            .for_each_concurrent(MAX_CONCURRENT_TRANSFERS, |key| async move {
                let result = self
                    .client
                    .delete_object()
                    .bucket(&self.bucket)
                    .key(&key)
                    .send()
                    .await;
                if let Err(err) = result {
                    warn!("Could not remove s3://{}/{}: {}", self.bucket, key, err);
                }
            })
            .await;
    }
}

#[async_trait]
impl Driver for S3FilesDriver {
    #[instrument(name = "S3FilesDriver::download", skip(self))]
    async fn download(&self, id: &PackageId, dst: &Path) -> Result<(), DriverError> {
        if !self.exists(id).await? {
            return Err(DriverError::NotFound);
        }

        let prefix = Self::package_prefix(id);
        let mut objects = vec![];
        for key in self.list_keys(&prefix).await? {
            let relative = match Self::relative_path(&prefix, &key) {
                Some(relative) => relative.to_string(),
                None => continue,
            };
            validate_file_path(&relative).map_err(|_| {
                DriverError::TransferError(format!("Unexpected object in the package: {:?}", key))
            })?;
            let path = join_relative(dst, &relative);
            objects.push((key, path));
        }

        futures::stream::iter(objects)
            .map(|(key, path)| async move { self.download_object(key, &path).await })
            .buffer_unordered(MAX_CONCURRENT_TRANSFERS)
            .try_collect::<Vec<()>>()
            .await?;

        Ok(())
    }

    #[instrument(name = "S3FilesDriver::upload", skip(self))]
    async fn upload(&self, id: &PackageId, src: &Path) -> Result<(), DriverError> {
        if self.exists(id).await? {
            return Err(DriverError::AlreadyExists);
        }

        let prefix = Self::package_prefix(id);
        let (files, marker) = Self::upload_order(list_files(src).await?)?;

        let results: Vec<(String, Result<(), DriverError>)> = futures::stream::iter(files)
            .map(|file| {
                let path = join_relative(src, &file);
                let key = format!("{}{}", prefix, file);
                async move {
                    let result = self.upload_object(&path, &key).await;
                    (key, result)
                }
            })
            .buffer_unordered(MAX_CONCURRENT_TRANSFERS)
            .collect()
            .await;

        let mut written = vec![];
        let mut failure = None;
        for (key, result) in results {
            match result {
                Ok(()) => written.push(key),
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }

        if failure.is_none() {
            let marker_key = format!("{}{}", prefix, marker);
            if let Err(err) = self.upload_object(&join_relative(src, &marker), &marker_key).await {
                failure = Some(err);
            }
        }

        if let Some(err) = failure {
            self.delete_objects(written).await;
            return Err(err);
        }

        Ok(())
    }

    #[instrument(name = "S3FilesDriver::exists", skip(self))]
    async fn exists(&self, id: &PackageId) -> Result<bool, DriverError> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(Self::marker_key(id))
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) if status_code(&err) == Some(404) => Ok(false),
            Err(err) => Err(transfer_error("Check", err)),
        }
    }
}
