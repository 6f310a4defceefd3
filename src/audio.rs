//! Audio data model for vidscribe.
//!
//! Two shapes flow through the pipeline:
//! - [`AudioBuffer`] — arbitrary PCM as it comes out of the media decoder
//!   (any sample rate, channel layout, or supported sample width)
//! - [`CanonicalAudio`] — mono, 16 kHz, 16-bit signed; the only shape the
//!   chunker and the speech engine accept
//!
//! Ownership passes linearly from stage to stage: each stage consumes one
//! buffer and produces a new one, so there is no aliasing or in-place mutation
//! to reason about.

use std::time::Duration;

use crate::error::{Error, Result};

/// The sample rate every downstream stage assumes (Hz).
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// The sample width every downstream stage assumes (bytes).
pub const TARGET_SAMPLE_WIDTH_BYTES: u16 = 2;

/// Raw interleaved PCM plus the metadata needed to interpret it.
///
/// Supported sample widths:
/// - 1 byte  → unsigned 8-bit (bias 128)
/// - 2 bytes → signed 16-bit little-endian
/// - 4 bytes → 32-bit float little-endian
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    data: Vec<u8>,
    sample_rate: u32,
    channel_count: u16,
    sample_width_bytes: u16,
}

impl AudioBuffer {
    /// Wrap raw PCM bytes, checking that the byte length is consistent with the
    /// declared channel count and sample width.
    pub fn new(
        data: Vec<u8>,
        sample_rate: u32,
        channel_count: u16,
        sample_width_bytes: u16,
    ) -> Result<Self> {
        if sample_rate == 0 {
            return Err(Error::msg("audio buffer sample rate must be non-zero"));
        }
        if channel_count == 0 {
            return Err(Error::msg("audio buffer must have at least one channel"));
        }
        if sample_width_bytes == 0 {
            return Err(Error::msg("audio buffer sample width must be non-zero"));
        }

        let frame_bytes = channel_count as usize * sample_width_bytes as usize;
        if data.len() % frame_bytes != 0 {
            return Err(Error::msg(format!(
                "audio buffer length {} is not a whole number of {frame_bytes}-byte frames",
                data.len()
            )));
        }

        Ok(Self {
            data,
            sample_rate,
            channel_count,
            sample_width_bytes,
        })
    }

    /// Build a buffer from interleaved `f32` samples (the media decoder's native output).
    pub fn from_f32(samples: &[f32], sample_rate: u32, channel_count: u16) -> Result<Self> {
        let mut data = Vec::with_capacity(samples.len() * 4);
        for s in samples {
            data.extend_from_slice(&s.to_le_bytes());
        }
        Self::new(data, sample_rate, channel_count, 4)
    }

    /// Build a buffer from interleaved `i16` samples.
    pub fn from_i16(samples: &[i16], sample_rate: u32, channel_count: u16) -> Result<Self> {
        let mut data = Vec::with_capacity(samples.len() * 2);
        for s in samples {
            data.extend_from_slice(&s.to_le_bytes());
        }
        Self::new(data, sample_rate, channel_count, 2)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channel_count
    }

    pub fn sample_width_bytes(&self) -> u16 {
        self.sample_width_bytes
    }

    /// Number of frames (one sample per channel).
    pub fn frame_count(&self) -> usize {
        let frame_bytes = self.channel_count as usize * self.sample_width_bytes as usize;
        self.data.len() / frame_bytes
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frame_count() as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode the raw bytes into interleaved `f32` samples in `[-1.0, 1.0]`.
    ///
    /// Fails with [`Error::UnsupportedFormat`] for sample widths other than 1, 2, or 4.
    pub fn decode_f32(&self) -> Result<Vec<f32>> {
        match self.sample_width_bytes {
            1 => Ok(self
                .data
                .iter()
                .map(|&b| (b as f32 - 128.0) / 128.0)
                .collect()),
            2 => Ok(self
                .data
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / i16::MAX as f32)
                .collect()),
            4 => Ok(self
                .data
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect()),
            width_bytes => Err(Error::UnsupportedFormat { width_bytes }),
        }
    }
}

/// Audio constrained to the shape the speech engine expects: mono, 16 kHz, 16-bit.
///
/// The invariant is carried by the type itself — samples are stored as `i16`
/// and the rate/width/channel metadata is fixed — so downstream stages never
/// re-check the shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalAudio {
    samples: Vec<i16>,
}

impl CanonicalAudio {
    /// Wrap mono 16 kHz `i16` samples directly.
    pub fn from_samples(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    /// Requantize mono `f32` samples (nominally in `[-1.0, 1.0]`) to `i16`.
    ///
    /// Conversion saturates; the number of samples that actually clipped is
    /// returned so callers can report it instead of clipping silently.
    pub fn from_f32(samples: &[f32]) -> (Self, usize) {
        let mut clipped = 0usize;
        let samples = samples
            .iter()
            .map(|&s| {
                if !(-1.0..=1.0).contains(&s) {
                    clipped += 1;
                }
                (s.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
            })
            .collect();
        (Self { samples }, clipped)
    }

    /// Validate an arbitrary buffer as already-canonical audio.
    pub fn try_from_buffer(buffer: &AudioBuffer) -> Result<Self> {
        if buffer.sample_rate() != TARGET_SAMPLE_RATE
            || buffer.channel_count() != 1
            || buffer.sample_width_bytes() != TARGET_SAMPLE_WIDTH_BYTES
        {
            return Err(Error::msg(format!(
                "buffer is not canonical audio: {} Hz, {} channel(s), {} byte(s) per sample",
                buffer.sample_rate(),
                buffer.channel_count(),
                buffer.sample_width_bytes()
            )));
        }

        let samples = buffer
            .data()
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / TARGET_SAMPLE_RATE as f64)
    }

    /// Decode to `f32` in `[-1.0, 1.0]` for engines and filters that work in float.
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples
            .iter()
            .map(|&s| s as f32 / i16::MAX as f32)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_rejects_ragged_frames() {
        // 3 bytes cannot hold a whole number of stereo i16 frames.
        let err = AudioBuffer::new(vec![0; 3], 16_000, 2, 2).unwrap_err();
        assert!(err.to_string().contains("whole number"));
    }

    #[test]
    fn buffer_frame_count_and_duration() -> Result<()> {
        let samples = vec![0i16; 32_000];
        let buf = AudioBuffer::from_i16(&samples, 16_000, 2)?;
        assert_eq!(buf.frame_count(), 16_000);
        assert_eq!(buf.duration(), Duration::from_secs(1));
        Ok(())
    }

    #[test]
    fn decode_f32_rejects_unsupported_width() {
        let buf = AudioBuffer::new(vec![0; 6], 16_000, 1, 3).unwrap();
        match buf.decode_f32() {
            Err(Error::UnsupportedFormat { width_bytes }) => assert_eq!(width_bytes, 3),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn requantize_counts_clipped_samples() {
        let (audio, clipped) = CanonicalAudio::from_f32(&[0.0, 0.5, 1.5, -2.0]);
        assert_eq!(clipped, 2);
        assert_eq!(audio.samples()[2], i16::MAX);
        assert_eq!(audio.samples()[3], i16::MIN + 1);
    }

    #[test]
    fn canonical_round_trips_through_buffer() -> Result<()> {
        let audio = CanonicalAudio::from_samples(vec![-3, 0, 7, i16::MAX]);
        let buf = AudioBuffer::from_i16(audio.samples(), TARGET_SAMPLE_RATE, 1)?;
        let back = CanonicalAudio::try_from_buffer(&buf)?;
        assert_eq!(back, audio);
        Ok(())
    }
}
