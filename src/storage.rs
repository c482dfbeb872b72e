//! Storage Abstraction Layer
//!
//! Resolves a location (`s3://bucket/prefix`, `file:///dir`, or a plain local
//! directory) to an object store plus key prefix, and provides the read and
//! overwrite operations the pipeline needs.

use crate::config::AwsCredentials;
use crate::error::{EtlError, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::path::Path;
use object_store::{ObjectMeta, ObjectStore, PutPayload};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// A resolved storage root
#[derive(Debug, Clone)]
pub struct StorageLocation {
    url: Url,
    store: Arc<dyn ObjectStore>,
    prefix: Path,
}

impl StorageLocation {
    /// Turn a location string into a URL. Strings without a scheme are local
    /// directories, resolved against the current directory.
    pub fn parse_url(location: &str) -> Result<Url> {
        if location.contains("://") {
            return Ok(Url::parse(location)?);
        }

        let path = std::path::Path::new(location);
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        Url::from_directory_path(&absolute).map_err(|_| EtlError::Location {
            location: location.to_string(),
            reason: "not a valid local directory path".to_string(),
        })
    }

    /// Open a location. S3 locations require credentials.
    pub fn open(location: &str, credentials: Option<&AwsCredentials>) -> Result<Self> {
        let url = Self::parse_url(location)?;

        let options = match url.scheme() {
            "s3" | "s3a" => {
                let credentials = credentials.ok_or_else(|| {
                    EtlError::Config(format!(
                        "location {} requires AWS credentials ([AWS] section or environment)",
                        url
                    ))
                })?;
                credentials.storage_options()
            }
            "file" => Vec::new(),
            other => {
                return Err(EtlError::Location {
                    location: location.to_string(),
                    reason: format!("unsupported scheme '{}'", other),
                })
            }
        };

        let (store, prefix) = object_store::parse_url_opts(&url, options)?;
        debug!("opened storage location {} (prefix '{}')", url, prefix);

        Ok(Self {
            url,
            store: Arc::from(store),
            prefix,
        })
    }

    /// Build a location over an already constructed store
    pub fn with_store(url: Url, store: Arc<dyn ObjectStore>, prefix: Path) -> Self {
        Self { url, store, prefix }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Object path for `parts` joined under the prefix
    pub fn path_for(&self, parts: &[&str]) -> Path {
        parts
            .iter()
            .fold(self.prefix.clone(), |path, part| path.child(*part))
    }

    /// Human-readable location of `parts`, used in logs and reports
    pub fn display(&self, parts: &[&str]) -> String {
        let root = self.url.as_str().trim_end_matches('/');
        if parts.is_empty() {
            root.to_string()
        } else {
            format!("{}/{}", root, parts.join("/"))
        }
    }

    /// Read a whole object located directly under the prefix
    pub async fn read(&self, file_name: &str) -> Result<Bytes> {
        let path = self.path_for(&[file_name]);
        match self.store.get(&path).await {
            Ok(result) => Ok(result.bytes().await?),
            Err(object_store::Error::NotFound { .. }) => {
                Err(EtlError::MissingInput(self.display(&[file_name])))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List every object below `dir`; a missing directory lists as empty
    pub async fn list(&self, dir: &str) -> Result<Vec<ObjectMeta>> {
        let dir_path = self.path_for(&[dir]);
        match self.store.list(Some(&dir_path)).try_collect::<Vec<_>>().await {
            Ok(mut objects) => {
                objects.sort_by(|a, b| a.location.cmp(&b.location));
                Ok(objects)
            }
            Err(object_store::Error::NotFound { .. }) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the contents of `dir` with a single object `file_name`.
    ///
    /// Not atomic: prior objects are deleted before the new one is written.
    pub async fn overwrite(&self, dir: &str, file_name: &str, payload: Vec<u8>) -> Result<Path> {
        for object in self.list(dir).await? {
            debug!("deleting previous output {}", object.location);
            match self.store.delete(&object.location).await {
                Ok(()) | Err(object_store::Error::NotFound { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        let path = self.path_for(&[dir, file_name]);
        self.store.put(&path, PutPayload::from(payload)).await?;
        Ok(path)
    }
}
