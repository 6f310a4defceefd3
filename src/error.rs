use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Vidscribe's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Vidscribe's crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
///
/// Variants fall into three severity tiers that the batch coordinator relies on:
/// - precondition errors (`InvalidInputPath`, `EngineInit`) abort the run before any file
///   is processed
/// - file-level errors (everything else surfaced from the per-file pipeline) are recorded
///   as that file's outcome and the batch continues
/// - chunk-level errors never reach this type at all; the transcription driver absorbs
///   them into empty fragments
#[derive(Debug, Error)]
pub enum Error {
    /// The input sample width is not one we can decode (supported: 1, 2, 4 bytes).
    #[error("unsupported sample width: {width_bytes} bytes per sample")]
    UnsupportedFormat { width_bytes: u16 },

    /// The extracted audio track contained no samples.
    ///
    /// A zero-length track almost always means upstream extraction failed, so we surface
    /// it as an error instead of silently producing an empty transcript.
    #[error("audio track is empty (zero duration)")]
    EmptyAudio,

    /// An enhancement parameter was outside its valid range.
    #[error("invalid enhancement parameters: {0}")]
    InvalidEnhancementParams(String),

    /// The requested chunk duration was not a positive amount of time.
    #[error("invalid chunk duration: {0:?}")]
    InvalidChunkDuration(Duration),

    /// An explicitly-named input file does not carry a supported video extension.
    #[error("unsupported input file: {}", .0.display())]
    UnsupportedInput(PathBuf),

    /// The input path names neither a file nor a directory.
    #[error("input path is neither a file nor a directory: {}", .0.display())]
    InvalidInputPath(PathBuf),

    /// The media decoder could not produce an audio track for this file.
    #[error("failed to read media from {}: {reason}", path.display())]
    UnreadableMedia { path: PathBuf, reason: String },

    /// The speech engine failed to initialize (e.g. missing model file).
    #[error("speech engine initialization failed: {0}")]
    EngineInit(String),

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Whether this error must stop the whole batch before any work starts.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::InvalidInputPath(_) | Self::EngineInit(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}
