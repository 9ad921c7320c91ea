//! Byte retrieval for local paths and object store URLs.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use geoload_core_common::ByteSource;
use log::debug;
use url::Url;

use crate::error::FetchError;

/// [`ByteSource`] backed by `object_store`.
///
/// Accepts local paths and `file://`, `http(s)://`, `s3://`, `gs://` and
/// `az://` URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectStoreSource;

impl ObjectStoreSource {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ByteSource for ObjectStoreSource {
    async fn fetch(&self, locator: &str) -> Result<Bytes> {
        let url = locator_url(locator)?;
        let (store, path) =
            object_store::parse_url(&url).map_err(|e| FetchError::InvalidLocator {
                locator: locator.to_string(),
                reason: e.to_string(),
            })?;

        debug!("Fetching {path} from {url}");
        let request_err = |e: object_store::Error| match e {
            object_store::Error::NotFound { .. } => FetchError::NotFound {
                locator: locator.to_string(),
            },
            other => FetchError::Request {
                locator: locator.to_string(),
                source: Box::new(other),
            },
        };

        let result = store.get(&path).await.map_err(request_err)?;
        let bytes = result.bytes().await.map_err(request_err)?;
        debug!("Fetched {} bytes from {locator}", bytes.len());
        Ok(bytes)
    }
}

/// Turns a locator into a URL, treating anything that is not a URL as a path.
///
/// # Errors
///
/// Returns [`FetchError::InvalidLocator`] for empty locators and paths that
/// cannot be made absolute.
pub fn locator_url(locator: &str) -> Result<Url, FetchError> {
    let invalid = |reason: &str| FetchError::InvalidLocator {
        locator: locator.to_string(),
        reason: reason.to_string(),
    };

    if locator.trim().is_empty() {
        return Err(invalid("locator is empty"));
    }

    // Single-letter schemes are Windows drive letters, not URLs.
    if let Ok(url) = Url::parse(locator)
        && url.scheme().len() > 1
    {
        return Ok(url);
    }

    let absolute = std::path::absolute(Path::new(locator))
        .map_err(|e| invalid(&format!("cannot resolve path: {e}")))?;
    Url::from_file_path(&absolute).map_err(|()| invalid("not an absolute file path"))
}

/// Fetches `locator` through `source`, classifying failures as [`FetchError`].
///
/// # Errors
///
/// Returns the source's own [`FetchError`] when it raised one, otherwise wraps
/// its error in [`FetchError::Request`].
pub async fn fetch_bytes(source: &dyn ByteSource, locator: &str) -> Result<Bytes, FetchError> {
    source.fetch(locator).await.map_err(|err| match err.downcast::<FetchError>() {
        Ok(fetch_err) => fetch_err,
        Err(other) => FetchError::Request {
            locator: locator.to_string(),
            source: other.into(),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_locator_url_keeps_urls() {
        let url = locator_url("https://example.com/data/file.parquet").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.path(), "/data/file.parquet");

        let url = locator_url("s3://bucket/key.parquet").unwrap();
        assert_eq!(url.scheme(), "s3");
    }

    #[test]
    fn test_locator_url_converts_paths() {
        let url = locator_url("/tmp/data.parquet").unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with("/tmp/data.parquet"));

        let url = locator_url("relative/data.parquet").unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.path().ends_with("relative/data.parquet"));
    }

    #[test]
    fn test_locator_url_rejects_empty() {
        let err = locator_url("  ").unwrap_err();
        assert!(matches!(err, FetchError::InvalidLocator { .. }));
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"PAR1 bytes").unwrap();

        let locator = file.path().to_str().unwrap();
        let bytes = fetch_bytes(&ObjectStoreSource::new(), locator).await.unwrap();
        assert_eq!(bytes.as_ref(), b"PAR1 bytes");
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("missing.parquet");

        let err = fetch_bytes(&ObjectStoreSource::new(), missing.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }), "got {err}");
    }

    struct FailingSource;

    #[async_trait]
    impl ByteSource for FailingSource {
        async fn fetch(&self, _locator: &str) -> Result<Bytes> {
            Err(anyhow::anyhow!("connection reset"))
        }
    }

    #[tokio::test]
    async fn test_foreign_errors_become_request_errors() {
        let err = fetch_bytes(&FailingSource, "mem://x").await.unwrap_err();
        match err {
            FetchError::Request { locator, source } => {
                assert_eq!(locator, "mem://x");
                assert_eq!(source.to_string(), "connection reset");
            },
            other => panic!("unexpected error: {other}"),
        }
    }
}
