//! Built-in speech engine powered by `whisper-rs` / `whisper.cpp`.
//!
//! The model is loaded once, at construction; a load failure is surfaced as
//! [`Error::EngineInit`] so the batch coordinator can refuse to start.
//!
//! The incremental session runs one recognition pass per fed chunk. Whisper is
//! not a true streaming recognizer, so chunk-wise passes on a single session
//! are how we approximate incremental decoding; chunks must arrive in order on
//! one session, which is exactly what the transcription driver guarantees.

use std::os::raw::{c_char, c_void};
use std::sync::Once;

use anyhow::Context;
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::{CanonicalAudio, TARGET_SAMPLE_RATE};
use crate::engine::{EngineSession, SpeechEngine};
use crate::error::{Error, Result};

/// whisper.cpp refuses very short inputs; pad anything below this many samples
/// with trailing silence before running a pass.
const MIN_PASS_SAMPLES: usize = TARGET_SAMPLE_RATE as usize;

/// A no-op log callback used to silence logs emitted by whisper.cpp.
unsafe extern "C" fn whisper_log_callback(
    _level: u32,
    _c_msg: *const c_char,
    _user_data: *mut c_void,
) {
    // Intentionally left empty.
}

/// Ensure whisper logging is configured exactly once for the lifetime of the process.
///
/// Whisper can be very chatty; keep it quiet so callers fully control stdout/stderr.
fn init_whisper_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| unsafe {
        whisper_rs::set_log_callback(Some(whisper_log_callback), std::ptr::null_mut());
    });
}

/// Recognition options forwarded to whisper on every pass.
#[derive(Debug, Clone, Default)]
pub struct WhisperOpts {
    /// Optional language hint (e.g. `"en"`, `"es"`); `None` lets whisper auto-detect.
    pub language: Option<String>,
    /// Translate speech to English instead of transcribing verbatim.
    pub translate_to_english: bool,
}

/// Built-in engine that wraps a loaded whisper.cpp model.
pub struct WhisperEngine {
    ctx: WhisperContext,
    opts: WhisperOpts,
}

impl WhisperEngine {
    /// Load a ggml model from disk and initialize the engine.
    pub fn new(model_path: &str, opts: WhisperOpts) -> Result<Self> {
        init_whisper_logging();

        let ctx_params = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(model_path, ctx_params).map_err(|e| {
            Error::EngineInit(format!("failed to load model from path {model_path}: {e}"))
        })?;

        Ok(Self { ctx, opts })
    }

    /// Access the underlying Whisper context.
    ///
    /// This is primarily intended for advanced or experimental use-cases.
    pub fn context(&self) -> &WhisperContext {
        &self.ctx
    }

    fn build_full_params(&self) -> FullParams<'_, '_> {
        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: 5,
            patience: 1.0,
        });

        params.set_n_threads(num_cpus::get() as i32);
        params.set_translate(self.opts.translate_to_english);
        params.set_language(self.opts.language.as_deref());
        params.set_no_context(true);
        params.set_single_segment(false);

        params.set_print_progress(false);
        params.set_print_special(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        params
    }

    /// Run one full whisper pass and join the recognized segment texts.
    fn run_pass(&self, samples: &[f32]) -> Result<String> {
        let mut padded;
        let samples = if samples.len() < MIN_PASS_SAMPLES {
            padded = samples.to_vec();
            padded.resize(MIN_PASS_SAMPLES, 0.0);
            padded.as_slice()
        } else {
            samples
        };

        let params = self.build_full_params();
        let mut state = self
            .ctx
            .create_state()
            .context("failed to create whisper state")?;
        state
            .full(params, samples)
            .context("failed to run whisper full()")?;

        let mut text = String::new();
        for segment in state.as_iter() {
            let piece = segment
                .to_str()
                .context("failed to get segment text")?
                .trim()
                .to_owned();
            if piece.is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&piece);
        }

        Ok(text)
    }
}

impl SpeechEngine for WhisperEngine {
    type Session<'a>
        = WhisperSession<'a>
    where
        Self: 'a;

    fn transcribe_full(&self, audio: &CanonicalAudio) -> Result<String> {
        self.run_pass(&audio.to_f32())
    }

    fn open_session(&self) -> Result<Self::Session<'_>> {
        Ok(WhisperSession { engine: self })
    }
}

/// Incremental session for [`WhisperEngine`]: one whisper pass per fed chunk.
pub struct WhisperSession<'a> {
    engine: &'a WhisperEngine,
}

impl EngineSession for WhisperSession<'_> {
    fn feed(&mut self, samples: &[i16]) -> Result<Option<String>> {
        let samples_f32: Vec<f32> = samples
            .iter()
            .map(|&s| s as f32 / i16::MAX as f32)
            .collect();

        let text = self.engine.run_pass(&samples_f32)?;
        Ok((!text.is_empty()).then_some(text))
    }

    fn finalize(&mut self) -> Result<Option<String>> {
        // Every chunk is decoded eagerly in `feed`, so there is no buffered tail.
        Ok(None)
    }
}
