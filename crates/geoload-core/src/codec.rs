//! Chunked streaming decompression.
//!
//! A [`CodecHandle`] is owned by the ingestion context. The codec behind it is
//! initialised lazily, exactly once, on the first decompression request;
//! concurrent first requests all wait on that single initialisation.

use std::fmt;
use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::read::MultiGzDecoder;
use log::{debug, info};
use tokio::sync::OnceCell;

use crate::error::DecompressionError;

/// Size of the chunks fed to the codec.
///
/// Matches the chunking of the columnar writer so multi-chunk streams it
/// produces decompress as one sequence.
pub const CHUNK_SIZE: usize = 1_000_000;

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Compression formats understood by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    Zstd,
    Gzip,
}

impl CompressionFormat {
    /// Picks a format from the leading bytes of a stream.
    ///
    /// Unknown magic falls back to zstd, which then reports the corruption.
    #[must_use]
    pub fn sniff(head: &[u8]) -> Self {
        if head.starts_with(&GZIP_MAGIC) {
            CompressionFormat::Gzip
        } else {
            CompressionFormat::Zstd
        }
    }

    /// Returns `true` if `head` starts with a known magic number.
    #[must_use]
    pub fn is_recognized(head: &[u8]) -> bool {
        head.starts_with(&ZSTD_MAGIC) || head.starts_with(&GZIP_MAGIC)
    }
}

impl fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressionFormat::Zstd => f.write_str("zstd"),
            CompressionFormat::Gzip => f.write_str("gzip"),
        }
    }
}

/// Initialised codec state.
#[derive(Debug)]
pub struct Codec {
    /// Largest zstd window accepted, as a power of two.
    window_log_max: u32,
}

impl Codec {
    fn init() -> Self {
        Self { window_log_max: 31 }
    }

    /// Decompresses a sequence of chunks as one continuous stream.
    ///
    /// # Errors
    ///
    /// Returns [`DecompressionError::Empty`] for an empty chunk sequence and
    /// [`DecompressionError::Corrupt`] when the codec rejects the stream.
    pub fn decompress_chunks(&self, chunks: &[&[u8]]) -> Result<Vec<u8>, DecompressionError> {
        let head = chunks.first().ok_or(DecompressionError::Empty)?;
        let format = CompressionFormat::sniff(head);
        if !CompressionFormat::is_recognized(head) {
            debug!("No known compression magic; trying {format}");
        }
        let corrupt = |source| DecompressionError::Corrupt { format, source };

        let reader = ChunkReader::new(chunks.iter().copied());
        let mut out = Vec::new();
        match format {
            CompressionFormat::Zstd => {
                let mut decoder = zstd::stream::read::Decoder::new(reader).map_err(corrupt)?;
                decoder.window_log_max(self.window_log_max).map_err(corrupt)?;
                decoder.read_to_end(&mut out).map_err(corrupt)?;
            },
            CompressionFormat::Gzip => {
                MultiGzDecoder::new(reader)
                    .read_to_end(&mut out)
                    .map_err(corrupt)?;
            },
        }

        debug!(
            "{format} stream of {} chunk(s) expanded to {} bytes",
            chunks.len(),
            out.len()
        );
        Ok(out)
    }
}

/// Context-owned, lazily initialised codec.
#[derive(Debug, Default)]
pub struct CodecHandle {
    codec: OnceCell<Codec>,
    initializations: AtomicUsize,
}

impl CodecHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the codec, initialising it on first use.
    pub async fn codec(&self) -> &Codec {
        self.codec
            .get_or_init(|| async {
                self.initializations.fetch_add(1, Ordering::SeqCst);
                info!("Initialising decompression codec");
                Codec::init()
            })
            .await
    }

    /// Returns `true` once the codec has been initialised.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.codec.initialized()
    }

    /// Number of times the codec has been initialised (0 or 1).
    #[must_use]
    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }
}

/// Decompresses `buffer`, feeding it to the codec in [`CHUNK_SIZE`] chunks.
///
/// # Errors
///
/// Fails when `buffer` is empty or the codec reports corruption.
pub async fn decompress(
    handle: &CodecHandle,
    buffer: &[u8],
) -> Result<Vec<u8>, DecompressionError> {
    let chunks: Vec<&[u8]> = buffer.chunks(CHUNK_SIZE).collect();
    let codec = handle.codec().await;
    codec.decompress_chunks(&chunks)
}

/// Presents a sequence of byte chunks as one [`Read`] stream.
struct ChunkReader<'a, I> {
    chunks: I,
    current: &'a [u8],
}

impl<'a, I: Iterator<Item = &'a [u8]>> ChunkReader<'a, I> {
    fn new(chunks: I) -> Self {
        Self {
            chunks,
            current: &[],
        }
    }
}

impl<'a, I: Iterator<Item = &'a [u8]>> Read for ChunkReader<'a, I> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.current.is_empty() {
            match self.chunks.next() {
                Some(chunk) => self.current = chunk,
                None => return Ok(0),
            }
        }
        self.current.read(buf)
    }
}
