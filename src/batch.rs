//! Batch coordination: enumerate inputs, run the per-file pipeline, isolate failures.
//!
//! Failure policy is tiered:
//! - precondition errors (bad input path; engine construction, which the caller
//!   performs before building the coordinator) abort before any file is touched
//! - per-file errors (unreadable media, normalization failure, engine session
//!   failure) are recorded as that file's outcome and the batch continues
//! - chunk-level errors never reach this module; the driver absorbs them
//!
//! Files are processed one at a time, each with its own buffers; nothing is
//! shared across files except the loaded engine, which is borrowed read-only
//! by each file's driver.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::driver::TranscriptionDriver;
use crate::engine::SpeechEngine;
use crate::enhance::enhance;
use crate::error::{Error, Result};
use crate::media::MediaDecoder;
use crate::normalize::normalize;
use crate::opts::Opts;

/// What happened to one input file.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Success { input: PathBuf, output: PathBuf },
    Failure { input: PathBuf, reason: String },
}

impl FileOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn input(&self) -> &Path {
        match self {
            Self::Success { input, .. } | Self::Failure { input, .. } => input,
        }
    }
}

/// The result of one batch run: the resolved input plus a per-file outcome list.
#[derive(Debug, Clone, Serialize)]
pub struct BatchJob {
    pub input_path: PathBuf,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchJob {
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }
}

/// Runs the full decode → normalize → enhance → chunk → transcribe → write
/// pipeline over a set of input files.
///
/// The coordinator owns the loaded engine and lends it to each file's driver,
/// so the (expensive) model load happens exactly once per run and tests can
/// inject mock decoders and engines.
pub struct BatchCoordinator<D: MediaDecoder, E: SpeechEngine> {
    decoder: D,
    engine: E,
    opts: Opts,
}

impl<D: MediaDecoder, E: SpeechEngine> BatchCoordinator<D, E> {
    pub fn new(decoder: D, engine: E, opts: Opts) -> Self {
        Self {
            decoder,
            engine,
            opts,
        }
    }

    /// Process every file resolved from `input_path`.
    ///
    /// Only precondition failures return `Err`; everything else is captured in
    /// the returned job's outcome list and the batch always runs to completion.
    pub fn run(&self, input_path: &Path) -> Result<BatchJob> {
        let files = resolve_inputs(input_path, &self.opts.extensions)?;
        let total = files.len();

        let mut outcomes = Vec::with_capacity(total);
        for (i, file) in files.iter().enumerate() {
            info!(
                file = %file.display(),
                progress = format!("{}/{total}", i + 1),
                "processing"
            );

            let outcome = match self.process_file(file) {
                Ok(output) => {
                    info!(output = %output.display(), "transcript written");
                    FileOutcome::Success {
                        input: file.clone(),
                        output,
                    }
                }
                Err(err) => {
                    warn!(file = %file.display(), error = %err, "file failed; continuing");
                    FileOutcome::Failure {
                        input: file.clone(),
                        reason: err.to_string(),
                    }
                }
            };
            outcomes.push(outcome);
        }

        Ok(BatchJob {
            input_path: input_path.to_path_buf(),
            outcomes,
        })
    }

    /// The per-file pipeline. Any error here is a file-level failure.
    fn process_file(&self, path: &Path) -> Result<PathBuf> {
        let raw = self.decoder.extract_audio(path)?;
        let mut canonical = normalize(raw)?;

        if let Some(params) = &self.opts.enhance {
            canonical = enhance(canonical, params)?;
        }

        let driver = TranscriptionDriver::new(
            &self.engine,
            self.opts.engine_mode,
            self.opts.chunk_duration,
        );
        let transcript = driver.transcribe(&canonical)?;

        let output = output_path_for(path, &self.opts.output_suffix);
        fs::write(&output, transcript.text())?;
        Ok(output)
    }
}

/// Resolve an input path into an ordered list of candidate files.
///
/// - a file: a singleton list, or [`Error::UnsupportedInput`] if its extension
///   doesn't match
/// - a directory: every direct child with a matching extension. Directory
///   listing order is not guaranteed by the OS, so the list is sorted by file
///   name for reproducible runs.
/// - anything else: [`Error::InvalidInputPath`] (fatal precondition)
pub fn resolve_inputs(input_path: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if input_path.is_file() {
        if !has_supported_extension(input_path, extensions) {
            return Err(Error::UnsupportedInput(input_path.to_path_buf()));
        }
        return Ok(vec![input_path.to_path_buf()]);
    }

    if input_path.is_dir() {
        let mut files = Vec::new();
        for entry in fs::read_dir(input_path)? {
            let path = entry?.path();
            if path.is_file() && has_supported_extension(&path, extensions) {
                files.push(path);
            }
        }
        files.sort();
        return Ok(files);
    }

    Err(Error::InvalidInputPath(input_path.to_path_buf()))
}

fn has_supported_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
}

/// Transcript path for an input: same directory, `<stem><suffix>.txt`.
fn output_path_for(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("transcript");
    input.with_file_name(format!("{stem}{suffix}.txt"))
}
