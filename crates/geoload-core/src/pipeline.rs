//! The ingestion pipeline: fetch → decode → resolve → assemble.
//!
//! An [`IngestContext`] owns the collaborators and the codec handle for its
//! whole lifetime, so the codec is initialised at most once per context.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use geoload_core_common::{ByteSource, ColumnarDecoder, DecodeOptions};
use geoload_parquet::ParquetDecoder;
use geojson::FeatureCollection;
use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::assemble::assemble;
use crate::codec::CodecHandle;
use crate::columnar::decode_rows;
use crate::error::{ConfigError, IngestError, Result};
use crate::fetch::{ObjectStoreSource, fetch_bytes};
use crate::resolver::resolve_geometry_source;

/// Options controlling an ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOptions {
    /// Options handed to the columnar decoder unchanged.
    pub decode: DecodeOptions,
    /// Geometry column chosen by the caller, if any.
    pub geometry_column: Option<String>,
}

impl IngestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_decode_options(mut self, decode: DecodeOptions) -> Self {
        self.decode = decode;
        self
    }

    #[must_use]
    pub fn with_geometry_column(mut self, column: Option<String>) -> Self {
        self.geometry_column = column;
        self
    }

    /// Checks the options the pipeline itself interprets.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for a blank geometry column name.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if let Some(column) = &self.geometry_column
            && column.trim().is_empty()
        {
            return Err(ConfigError::InvalidOption {
                option: "geometry_column".to_string(),
                message: "column name must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

type SuccessCallback = Box<dyn FnOnce(&FeatureCollection) + Send>;
type FailureCallback = Box<dyn FnOnce(&IngestError) + Send>;

/// Optional success/failure callbacks for [`IngestContext::run`].
#[derive(Default)]
pub struct IngestCallbacks {
    on_success: Option<SuccessCallback>,
    on_failure: Option<FailureCallback>,
}

impl IngestCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_success(
        mut self,
        callback: impl FnOnce(&FeatureCollection) + Send + 'static,
    ) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_failure(mut self, callback: impl FnOnce(&IngestError) + Send + 'static) -> Self {
        self.on_failure = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for IngestCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestCallbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

/// Result of a cancellable run.
#[derive(Debug)]
pub enum RunOutcome {
    Ready(FeatureCollection),
    Failed(IngestError),
    /// The consumer went away; nothing was published.
    Cancelled,
}

impl RunOutcome {
    /// Converts the outcome into a renderable state.
    ///
    /// Returns `None` for a cancelled run, which must not change what is shown.
    #[must_use]
    pub fn into_load_state(self) -> Option<LoadState> {
        match self {
            RunOutcome::Ready(collection) => Some(LoadState::Ready(collection)),
            RunOutcome::Failed(error) => Some(LoadState::Failed {
                message: error.user_message(),
                suggestion: error.recovery_suggestion(),
            }),
            RunOutcome::Cancelled => None,
        }
    }
}

/// What a renderer should display for a locator.
///
/// The failed state is terminal and carries no features.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready(FeatureCollection),
    Failed {
        message: String,
        suggestion: Option<String>,
    },
}

/// Owns the collaborators of the pipeline and the decompression codec.
pub struct IngestContext {
    source: Arc<dyn ByteSource>,
    decoder: Arc<dyn ColumnarDecoder>,
    codec: CodecHandle,
    options: IngestOptions,
}

impl IngestContext {
    #[must_use]
    pub fn new(source: Arc<dyn ByteSource>, decoder: Arc<dyn ColumnarDecoder>) -> Self {
        Self {
            source,
            decoder,
            codec: CodecHandle::new(),
            options: IngestOptions::default(),
        }
    }

    /// Context reading Parquet through `object_store`.
    #[must_use]
    pub fn parquet() -> Self {
        Self::new(Arc::new(ObjectStoreSource::new()), Arc::new(ParquetDecoder::new()))
    }

    #[must_use]
    pub fn with_options(mut self, options: IngestOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    #[must_use]
    pub fn codec(&self) -> &CodecHandle {
        &self.codec
    }

    /// Fetches `locator` and turns it into a feature collection.
    ///
    /// # Errors
    ///
    /// Any fatal [`IngestError`]; rows with unusable geometry are dropped
    /// silently instead.
    pub async fn ingest(&self, locator: &str) -> Result<FeatureCollection> {
        self.options.validate()?;
        info!("Loading {locator}");
        let bytes = fetch_bytes(self.source.as_ref(), locator).await?;
        self.ingest_bytes(bytes).await
    }

    /// Runs the pipeline on bytes that were already fetched.
    ///
    /// # Errors
    ///
    /// See [`IngestContext::ingest`].
    pub async fn ingest_bytes(&self, bytes: Bytes) -> Result<FeatureCollection> {
        self.options.validate()?;
        let decoded = decode_rows(
            self.decoder.as_ref(),
            &self.codec,
            bytes,
            &self.options.decode,
        )
        .await?;
        debug!(
            "Decoded {} row(s) (decompressed: {})",
            decoded.rows.len(),
            decoded.decompressed
        );

        let source = resolve_geometry_source(
            decoded.schema.as_ref(),
            &decoded.rows,
            self.options.geometry_column.as_deref(),
        )?;
        assemble(&decoded.rows, &source)
    }

    /// Runs the pipeline for a consumer that may go away.
    ///
    /// Exactly one callback fires unless `token` is cancelled first; a
    /// cancelled run abandons outstanding work and fires none.
    pub async fn run(
        &self,
        locator: &str,
        token: &CancellationToken,
        callbacks: IngestCallbacks,
    ) -> RunOutcome {
        let result = tokio::select! {
            biased;
            () = token.cancelled() => None,
            result = self.ingest(locator) => Some(result),
        };

        // Liveness guard: nothing is published once the consumer is gone.
        let Some(result) = result.filter(|_| !token.is_cancelled()) else {
            info!("Discarding result for {locator}: run was cancelled");
            return RunOutcome::Cancelled;
        };

        match result {
            Ok(collection) => {
                if let Some(callback) = callbacks.on_success {
                    callback(&collection);
                }
                RunOutcome::Ready(collection)
            },
            Err(error) => {
                if let Some(callback) = callbacks.on_failure {
                    callback(&error);
                }
                RunOutcome::Failed(error)
            },
        }
    }
}

impl fmt::Debug for IngestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestContext")
            .field("decoder", &self.decoder.name())
            .field("codec", &self.codec)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_geometry_column_is_rejected() {
        let options = IngestOptions::new().with_geometry_column(Some("  ".to_string()));
        assert!(options.validate().is_err());
        assert!(IngestOptions::new().validate().is_ok());
    }

    #[test]
    fn test_cancelled_outcome_has_no_load_state() {
        assert!(RunOutcome::Cancelled.into_load_state().is_none());
    }

    #[test]
    fn test_failed_outcome_is_terminal_state() {
        let state = RunOutcome::Failed(IngestError::EmptyResult { rows: 4 })
            .into_load_state()
            .unwrap();
        match state {
            LoadState::Failed { message, suggestion } => {
                assert!(message.contains("4 decoded row(s)"));
                assert!(suggestion.is_some());
            },
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn test_callbacks_debug() {
        let callbacks = IngestCallbacks::new().on_success(|_| {});
        assert_eq!(
            format!("{callbacks:?}"),
            "IngestCallbacks { on_success: true, on_failure: false }"
        );
    }
}
