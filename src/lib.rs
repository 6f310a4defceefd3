//! `vidscribe` — batch transcription of video files built on top of Whisper.
//!
//! This crate provides:
//! - Audio extraction from video containers (via Symphonia)
//! - Normalization to the canonical engine format (mono, 16 kHz, 16-bit)
//! - Optional audio conditioning (loudness, compression, band-pass)
//! - Fixed-duration chunking and chunk-by-chunk incremental decoding
//! - Batch coordination with per-file failure isolation
//!
//! The library is designed to be used by both CLI tools and programmatic batch
//! jobs, with an emphasis on clear failure boundaries: a bad chunk never fails
//! a file, and a bad file never fails the batch.

// High-level API (most consumers should start here).
pub mod batch;
pub mod opts;

// Audio data model and preparation stages.
pub mod audio;
pub mod chunk;
pub mod enhance;
pub mod normalize;

// Engine abstraction, the built-in Whisper engine, and the per-file driver.
pub mod driver;
pub mod engine;
pub mod engines;

// Media decoding boundary.
pub mod media;

// Error taxonomy.
pub mod error;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

pub use error::{Error, Result};
