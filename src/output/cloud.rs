//! Object storage upload (GCS, local directory, in-memory)

use crate::auth::{StoreCredentials, TokenProvider};
use crate::error::{Error, Result};
use bytes::Bytes;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Build the object key of a unit's file
///
/// Format: `{dataset}/{segment}/{file}`
///
/// Examples:
/// - `taxi/month=2025-01/yellow_tripdata.parquet`
/// - `imdb/title.basics/title.basics.parquet`
pub fn build_object_key(dataset: &str, segment: &str, file_name: &str) -> String {
    format!(
        "{}/{}/{file_name}",
        dataset.trim_matches('/'),
        segment.trim_matches('/')
    )
}

/// Upload destination parsed from URL
#[derive(Debug, Clone)]
pub struct ObjectStorage {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Bucket name, or root directory for local stores
    bucket: String,
    /// Key prefix within the bucket
    prefix: String,
    /// URL scheme of produced URIs
    scheme: String,
}

impl ObjectStorage {
    /// Parse a destination URL and create the matching object store
    ///
    /// Supported formats:
    /// - `gs://bucket/prefix` - Google Cloud Storage
    /// - `memory://bucket` - in-process store
    /// - `file:///path` or `/path` - local directory, created if absent
    ///
    /// GCS authenticates with `credentials` when given, and with the
    /// `GOOGLE_*` environment variables otherwise.
    pub fn parse(url: &str, credentials: Option<Arc<dyn TokenProvider>>) -> Result<Self> {
        if let Some(rest) = url.strip_prefix("gs://") {
            Self::parse_gcs(rest, credentials)
        } else if let Some(rest) = url.strip_prefix("memory://") {
            let (bucket, prefix) = split_bucket(rest);
            Ok(Self::from_store(Arc::new(InMemory::new()), "memory", bucket).with_prefix(prefix))
        } else {
            Self::parse_local(url)
        }
    }

    /// Wrap an existing store
    pub fn from_store(
        store: Arc<dyn ObjectStore>,
        scheme: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            prefix: String::new(),
            scheme: scheme.into(),
        }
    }

    /// Set a key prefix
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    /// Parse GCS URL (without scheme)
    fn parse_gcs(rest: &str, credentials: Option<Arc<dyn TokenProvider>>) -> Result<Self> {
        let (bucket, prefix) = split_bucket(rest);
        if bucket.is_empty() {
            return Err(Error::config(format!("Invalid GCS URL: gs://{rest}")));
        }

        let builder = match credentials {
            Some(provider) => GoogleCloudStorageBuilder::new()
                .with_credentials(Arc::new(StoreCredentials::new(provider))),
            None => GoogleCloudStorageBuilder::from_env(),
        };

        let store = builder
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self::from_store(Arc::new(store), "gs", bucket).with_prefix(prefix))
    }

    /// Parse local filesystem path
    fn parse_local(path: &str) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);

        std::fs::create_dir_all(path)
            .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?;
        let root = std::fs::canonicalize(path)
            .map_err(|e| Error::config(format!("Failed to resolve directory {path}: {e}")))?;

        let store = LocalFileSystem::new_with_prefix(&root)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self::from_store(
            Arc::new(store),
            "file",
            root.to_string_lossy().trim_end_matches('/'),
        ))
    }

    /// Check if this is a cloud destination
    pub fn is_cloud(&self) -> bool {
        self.scheme == "gs"
    }

    /// Get the scheme (gs, memory, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Get the bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Get the underlying store
    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Full key including the prefix
    fn full_key(&self, key: &str) -> String {
        let key = key.trim_start_matches('/');
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{key}", self.prefix)
        }
    }

    /// URI of `key`, as the warehouse addresses it
    pub fn uri(&self, key: &str) -> String {
        let bucket = if self.scheme == "file" {
            self.bucket.trim_start_matches('/')
        } else {
            self.bucket.as_str()
        };
        let root = if self.scheme == "file" { "/" } else { "" };
        format!("{}://{root}{bucket}/{}", self.scheme, self.full_key(key))
    }

    /// Write bytes at `key`, replacing any existing object
    pub async fn put(&self, key: &str, data: Bytes) -> Result<String> {
        let full_key = self.full_key(key);
        let path = ObjectPath::from(full_key.as_str());

        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| Error::upload(&full_key, e.to_string()))?;

        Ok(self.uri(key))
    }

    /// Upload a local file at `key`, replacing any existing object
    pub async fn upload_file(&self, local: &Path, key: &str) -> Result<String> {
        info!("Uploading {} to {}", local.display(), self.uri(key));

        let data = tokio::fs::read(local).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: local.display().to_string(),
            },
            _ => Error::Io(e),
        })?;

        self.put(key, Bytes::from(data)).await
    }
}

/// Split `bucket/prefix/...` into bucket and prefix
fn split_bucket(rest: &str) -> (&str, &str) {
    match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx + 1..]),
        None => (rest, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_object_key() {
        assert_eq!(
            build_object_key("taxi", "month=2025-01", "yellow_tripdata.parquet"),
            "taxi/month=2025-01/yellow_tripdata.parquet"
        );
        assert_eq!(
            build_object_key("imdb/", "title.crew", "title.crew.parquet"),
            "imdb/title.crew/title.crew.parquet"
        );
    }

    #[test]
    fn test_parse_memory_url() {
        let storage = ObjectStorage::parse("memory://christophe-2026", None).unwrap();
        assert_eq!(storage.scheme(), "memory");
        assert_eq!(storage.bucket(), "christophe-2026");
        assert!(!storage.is_cloud());
        assert_eq!(
            storage.uri("taxi/month=2025-01/yellow_tripdata.parquet"),
            "memory://christophe-2026/taxi/month=2025-01/yellow_tripdata.parquet"
        );
    }

    #[test]
    fn test_prefix_in_uri() {
        let storage = ObjectStorage::parse("memory://bucket/raw/", None).unwrap();
        assert_eq!(storage.uri("imdb/x/x.parquet"), "memory://bucket/raw/imdb/x/x.parquet");
    }

    #[test]
    fn test_parse_local_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bucket");
        let dest = ObjectStorage::parse(path.to_str().unwrap(), None).unwrap();
        assert_eq!(dest.scheme(), "file");
        assert!(path.exists());
        assert!(dest.uri("a/b.parquet").starts_with("file:///"));
        assert!(dest.uri("a/b.parquet").ends_with("/bucket/a/b.parquet"));
    }

    #[test]
    fn test_local_uri_uses_resolved_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = std::fs::canonicalize(temp_dir.path()).unwrap();
        let indirect = temp_dir.path().join("scratch").join("..").join("out");

        let dest = ObjectStorage::parse(indirect.to_str().unwrap(), None).unwrap();

        assert!(Path::new(dest.bucket()).is_absolute());
        assert_eq!(
            dest.uri("imdb/a/a.parquet"),
            format!("file://{}/out/imdb/a/a.parquet", root.display())
        );
    }

    #[test]
    fn test_parse_gcs_with_injected_credentials() {
        let provider: Arc<dyn TokenProvider> =
            Arc::new(crate::auth::GoogleAuthenticator::fixed("token"));
        let dest = ObjectStorage::parse("gs://christophe-2026", Some(provider)).unwrap();
        assert!(dest.is_cloud());
        assert_eq!(
            dest.uri("taxi/month=2025-01/yellow_tripdata.parquet"),
            "gs://christophe-2026/taxi/month=2025-01/yellow_tripdata.parquet"
        );
    }

    #[test]
    fn test_parse_gcs_without_bucket() {
        assert!(ObjectStorage::parse("gs://", None).is_err());
    }
}
