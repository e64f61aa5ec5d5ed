use super::{status_code, transfer_error, write_body};
use crate::drivers::{Driver, DriverError};
use crate::package::{validate_file_path, PackageId};
use crate::util::fs::*;
use async_trait::async_trait;
use async_zip::write::{EntryOptions, ZipFileWriter};
use async_zip::Compression;
use aws_sdk_s3::Client;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::*;

/// One zip archive per package.
#[derive(Debug, Clone)]
pub struct S3ZipDriver {
    client: Client,
    bucket: String,
}

impl S3ZipDriver {
    pub fn new(client: Client, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    pub fn archive_key(id: &PackageId) -> String {
        format!("{}/{}.zip", id.group_path(), id.package_name())
    }
}

#[async_trait]
impl Driver for S3ZipDriver {
    #[instrument(name = "S3ZipDriver::download", skip(self))]
    async fn download(&self, id: &PackageId, dst: &Path) -> Result<(), DriverError> {
        if !self.exists(id).await? {
            return Err(DriverError::NotFound);
        }

        let key = Self::archive_key(id);
        debug!("Downloading s3://{}/{}", self.bucket, key);

        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| transfer_error("Download", err))?;

        let archive = tempfile::NamedTempFile::new()?;
        write_body(output.body, archive.path()).await?;
        unpack_archive(archive.path(), dst).await
    }

    #[instrument(name = "S3ZipDriver::upload", skip(self))]
    async fn upload(&self, id: &PackageId, src: &Path) -> Result<(), DriverError> {
        if self.exists(id).await? {
            return Err(DriverError::AlreadyExists);
        }

        let archive = tempfile::NamedTempFile::new()?;
        pack_archive(src, archive.path()).await?;

        let key = Self::archive_key(id);
        debug!("Uploading {:?} to s3://{}/{}", archive.path(), self.bucket, key);

        let body = aws_sdk_s3::types::ByteStream::from_path(archive.path())
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

    #[instrument(name = "S3ZipDriver::exists", skip(self))]
    async fn exists(&self, id: &PackageId) -> Result<bool, DriverError> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(Self::archive_key(id))
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) if status_code(&err) == Some(404) => Ok(false),
            Err(err) => Err(transfer_error("Check", err)),
        }
    }
}

fn archive_error(err: async_zip::error::ZipError) -> DriverError {
    DriverError::TransferError(format!("Archive error: {}", err))
}

/// Writes every file under `src` into a zip archive at `archive_path`, stored uncompressed.
///
/// Entries are written whole, one file in memory at a time. Streamed entries end in a data
/// descriptor, which the archive reader finds by scanning for its signature, so payloads that
/// happen to contain those bytes would be cut short on the way back.
pub async fn pack_archive(src: &Path, archive_path: &Path) -> Result<(), DriverError> {
    let mut file = fs::File::create(archive_path).await?;
    let mut writer = ZipFileWriter::new(&mut file);

    for name in list_files(src).await? {
        trace!("Packing {}", name);
        let data = fs::read(join_relative(src, &name)).await?;
        writer
            .write_entry_whole(EntryOptions::new(name, Compression::Stored), &data)
            .await
            .map_err(archive_error)?;
    }

    writer.close().await.map_err(archive_error)?;
    file.flush().await?;

    Ok(())
}

/// Extracts a zip archive into `dst`. Entries that would land outside of `dst` are refused.
pub async fn unpack_archive(archive_path: &Path, dst: &Path) -> Result<(), DriverError> {
    let mut file = fs::File::open(archive_path).await?;
    let mut zip = async_zip::read::seek::ZipFileReader::new(&mut file)
        .await
        .map_err(archive_error)?;

    for i in 0..zip.entries().len() {
        let reader = zip.entry_reader(i).await.map_err(archive_error)?;

        if reader.entry().dir() {
            continue;
        }

        let name = reader.entry().name().to_string();
        validate_file_path(&name).map_err(|_| {
            DriverError::TransferError(format!("Unexpected entry in the archive: {:?}", name))
        })?;

        let path = join_relative(dst, &name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        trace!("Unpacking {}", name);
        let mut output = fs::File::create(&path).await?;
        reader
            .copy_to_end_crc(&mut output, 65536)
            .await
            .map_err(archive_error)?;
    }

    Ok(())
}
