//! Storage service implementation using Apache OpenDAL.

use std::collections::HashMap;

use opendal::{ErrorKind, Operator, services};

use seclink_shared::config::{DiskProvider, StorageSettings};

use super::error::StorageError;
use super::stream::{CleanupHandle, DeleteOnComplete, FileByteStream};

/// Read chunk size for streamed downloads.
const CHUNK_SIZE: usize = 64 * 1024;

/// Metadata for a stored file.
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// File size in bytes.
    pub size: u64,
    /// Content type reported by the backend, if any.
    pub content_type: Option<String>,
}

/// Storage service over a registry of named disks.
pub struct StorageService {
    disks: HashMap<String, Operator>,
    default_disk: String,
}

impl StorageService {
    /// Create a storage service from the configured disk registry.
    ///
    /// # Errors
    ///
    /// Returns an error if a provider cannot be initialized or the default
    /// disk is not among the configured disks.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let mut disks = HashMap::new();
        for (name, provider) in &settings.disks {
            disks.insert(name.clone(), Self::create_operator(provider)?);
        }
        if !disks.contains_key(&settings.default_disk) {
            return Err(StorageError::unknown_disk(&settings.default_disk));
        }
        Ok(Self {
            disks,
            default_disk: settings.default_disk.clone(),
        })
    }

    /// Create an OpenDAL operator from a provider config.
    fn create_operator(provider: &DiskProvider) -> Result<Operator, StorageError> {
        match provider {
            DiskProvider::Fs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            DiskProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
        }
    }

    /// Name of the disk used when a payload names none.
    #[must_use]
    pub fn default_disk(&self) -> &str {
        &self.default_disk
    }

    fn operator(&self, disk: Option<&str>) -> Result<&Operator, StorageError> {
        let name = disk.unwrap_or(&self.default_disk);
        self.disks
            .get(name)
            .ok_or_else(|| StorageError::unknown_disk(name))
    }

    /// Stat a file; `Ok(None)` means it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown disks and backend failures other than
    /// not-found.
    pub async fn stat(
        &self,
        disk: Option<&str>,
        path: &str,
    ) -> Result<Option<FileInfo>, StorageError> {
        let op = self.operator(disk)?;
        match op.stat(path).await {
            Ok(meta) => Ok(Some(FileInfo {
                size: meta.content_length(),
                content_type: meta.content_type().map(String::from),
            })),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    /// Check if a file exists on a disk.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown disks and backend failures.
    pub async fn exists(&self, disk: Option<&str>, path: &str) -> Result<bool, StorageError> {
        Ok(self.stat(disk, path).await?.is_some())
    }

    /// MIME type for a file: the backend's reported content type when
    /// present, else a guess from the path, else `application/octet-stream`.
    #[must_use]
    pub fn mime_type(path: &str, info: &FileInfo) -> String {
        info.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(path)
                .first_or_octet_stream()
                .to_string()
        })
    }

    /// Delete a file from a disk.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    pub async fn delete(&self, disk: Option<&str>, path: &str) -> Result<(), StorageError> {
        self.operator(disk)?
            .delete(path)
            .await
            .map_err(StorageError::from)
    }

    /// Open a chunked byte stream over a file.
    ///
    /// With `delete_after` set, the file is deleted once the stream has
    /// yielded its final chunk successfully; an errored or abandoned
    /// stream leaves the file in place for a retry.
    ///
    /// # Errors
    ///
    /// Returns an error if the disk is unknown or the reader cannot be
    /// opened.
    pub async fn read_stream(
        &self,
        disk: Option<&str>,
        path: &str,
        size: u64,
        delete_after: bool,
    ) -> Result<DeleteOnComplete<FileByteStream>, StorageError> {
        let op = self.operator(disk)?;
        let reader = op
            .reader_with(path)
            .chunk(CHUNK_SIZE)
            .await
            .map_err(StorageError::from)?;
        let stream = reader
            .into_bytes_stream(0..size)
            .await
            .map_err(|e| StorageError::operation(e.to_string()))?;

        let cleanup = delete_after.then(|| CleanupHandle::new(op.clone(), path.to_string()));
        Ok(DeleteOnComplete::new(stream, cleanup))
    }
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}
