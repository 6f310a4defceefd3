//! Drives a speech engine across one file's audio and assembles the transcript.
//!
//! Two engine interaction modes:
//! - batch: a single recognition pass over the whole file (the chunker is
//!   bypassed — the file is one implicit chunk)
//! - incremental: chunks are fed strictly in `sequence_index` order through a
//!   stateful engine session, then `finalize` is called exactly once
//!
//! The incremental path is a small state machine:
//! `New → Streaming → Finalizing → Done`, no backward transitions, no re-entry.
//!
//! Failure policy: a `feed` error for one chunk records an empty fragment for
//! that index and transcription continues — a chunk never takes down the file.
//! Only session-open (and, in batch mode, the single pass) fails the file.

use std::time::Duration;

use tracing::{debug, warn};

use crate::audio::CanonicalAudio;
use crate::chunk::split;
use crate::engine::{EngineMode, EngineSession, SpeechEngine};
use crate::error::Result;

/// Recognized text for one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFragment {
    pub sequence_index: usize,
    /// Empty when the chunk produced no text (silence or a decode failure).
    pub text: String,
}

/// The assembled result for one source file.
///
/// Fragments may be recorded in any order; the final text is always joined by
/// ascending `sequence_index`, never by arrival order.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    fragments: Vec<TranscriptFragment>,
}

impl Transcript {
    pub fn push(&mut self, fragment: TranscriptFragment) {
        self.fragments.push(fragment);
    }

    pub fn fragments(&self) -> &[TranscriptFragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.iter().all(|f| f.text.is_empty())
    }

    /// Join non-empty fragment texts with a single space, ordered by `sequence_index`.
    pub fn text(&self) -> String {
        let mut ordered: Vec<&TranscriptFragment> = self.fragments.iter().collect();
        ordered.sort_by_key(|f| f.sequence_index);

        let mut out = String::new();
        for fragment in ordered {
            if fragment.text.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&fragment.text);
        }
        out
    }
}

/// Lifecycle of one incremental transcription run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    New,
    Streaming,
    Finalizing,
    Done,
}

/// Owns the engine interaction for one file at a time.
///
/// The driver borrows the engine (loaded once by the batch coordinator) so a
/// mock engine can be injected in tests.
pub struct TranscriptionDriver<'e, E: SpeechEngine> {
    engine: &'e E,
    mode: EngineMode,
    chunk_duration: Duration,
}

impl<'e, E: SpeechEngine> TranscriptionDriver<'e, E> {
    pub fn new(engine: &'e E, mode: EngineMode, chunk_duration: Duration) -> Self {
        Self {
            engine,
            mode,
            chunk_duration,
        }
    }

    /// Transcribe one file's canonical audio into a [`Transcript`].
    pub fn transcribe(&self, audio: &CanonicalAudio) -> Result<Transcript> {
        match self.mode {
            EngineMode::Batch => self.transcribe_batch(audio),
            EngineMode::Incremental => self.transcribe_incremental(audio),
        }
    }

    fn transcribe_batch(&self, audio: &CanonicalAudio) -> Result<Transcript> {
        let text = self.engine.transcribe_full(audio)?;

        let mut transcript = Transcript::default();
        transcript.push(TranscriptFragment {
            sequence_index: 0,
            text,
        });
        Ok(transcript)
    }

    fn transcribe_incremental(&self, audio: &CanonicalAudio) -> Result<Transcript> {
        let mut state = DriverState::New;
        let mut transcript = Transcript::default();

        // Chunk validation happens before the session opens, so a bad chunk
        // duration never leaves a half-open engine session behind.
        let chunks = split(audio, self.chunk_duration)?;

        let mut session = self.engine.open_session()?;
        state = advance(state, DriverState::Streaming);

        let mut next_index = 0usize;
        for chunk in chunks {
            debug_assert_eq!(chunk.sequence_index, next_index);

            let text = match session.feed(chunk.samples) {
                Ok(text) => text.unwrap_or_default(),
                Err(err) => {
                    // Chunk-level failure: record an empty fragment and move on.
                    warn!(
                        sequence_index = chunk.sequence_index,
                        error = %err,
                        "chunk decode failed; continuing with empty fragment"
                    );
                    String::new()
                }
            };

            transcript.push(TranscriptFragment {
                sequence_index: chunk.sequence_index,
                text,
            });
            next_index = chunk.sequence_index + 1;
        }

        state = advance(state, DriverState::Finalizing);
        match session.finalize() {
            Ok(Some(trailing)) if !trailing.is_empty() => {
                transcript.push(TranscriptFragment {
                    sequence_index: next_index,
                    text: trailing,
                });
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, "finalize failed; transcript may be missing a tail");
            }
        }

        let state = advance(state, DriverState::Done);
        debug!(?state, fragments = transcript.fragments().len(), "transcription complete");

        Ok(transcript)
    }
}

/// Enforce forward-only transitions.
fn advance(from: DriverState, to: DriverState) -> DriverState {
    debug_assert!(
        matches!(
            (from, to),
            (DriverState::New, DriverState::Streaming)
                | (DriverState::New, DriverState::Finalizing)
                | (DriverState::Streaming, DriverState::Finalizing)
                | (DriverState::Finalizing, DriverState::Done)
        ),
        "invalid driver transition: {from:?} -> {to:?}"
    );
    to
}
