use crate::Result;
use crate::audio::CanonicalAudio;

/// Pluggable speech-to-text engine used by [`crate::driver::TranscriptionDriver`].
///
/// An engine is responsible for turning canonical audio (mono, 16 kHz, 16-bit)
/// into recognized text. Two interaction modes are supported:
/// - batch: one call over a complete buffer ([`SpeechEngine::transcribe_full`])
/// - incremental: a stateful session fed chunk by chunk ([`SpeechEngine::open_session`])
///
/// Engine construction is where model loading happens; a construction failure
/// is a precondition error and is reported before any input is processed.
pub trait SpeechEngine {
    /// Incremental recognition state for this engine.
    ///
    /// The lifetime ties the session to the engine borrow (`&'a self`); the
    /// session is stateful and must be fed strictly in order on one logical
    /// stream.
    type Session<'a>: EngineSession + 'a
    where
        Self: 'a;

    /// Run a single recognition pass over a complete audio buffer.
    fn transcribe_full(&self, audio: &CanonicalAudio) -> Result<String>;

    /// Open an incremental session that accepts chunk samples in order.
    fn open_session(&self) -> Result<Self::Session<'_>>;
}

/// Incremental recognition session returned by [`SpeechEngine::open_session`].
pub trait EngineSession {
    /// Feed the next chunk of mono 16 kHz `i16` samples.
    ///
    /// Returns the text recognized so far for this chunk, if any.
    fn feed(&mut self, samples: &[i16]) -> Result<Option<String>>;

    /// Signal end of input and collect any trailing text.
    ///
    /// Called exactly once, after the last chunk.
    fn finalize(&mut self) -> Result<Option<String>>;
}

/// How the transcription driver talks to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineMode {
    /// One recognition pass over the whole file; the chunker is bypassed.
    Batch,
    /// Chunked feeding through an incremental session.
    #[default]
    Incremental,
}
