//! Concrete speech engine implementations.

pub mod whisper;

pub use whisper::WhisperEngine;
