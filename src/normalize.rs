//! Audio normalization for vidscribe.
//!
//! Responsibilities:
//! - Decode a raw [`AudioBuffer`] (any supported width) into `f32`
//! - Downmix to mono
//! - Resample to the target sample rate (when needed)
//! - Requantize to 16-bit signed, producing [`CanonicalAudio`]
//!
//! Notes:
//! - Everything here is deterministic: the same input bytes always produce the
//!   same output bytes.
//! - Requantization saturates rather than wrapping; clipped samples are counted
//!   and logged, never dropped silently.

use anyhow::{Context, anyhow};
use rubato::{Resampler, SincFixedIn, WindowFunction};
use tracing::warn;

use crate::audio::{AudioBuffer, CanonicalAudio, TARGET_SAMPLE_RATE};
use crate::error::{Error, Result};

/// Convert an arbitrary PCM buffer to canonical form (mono, 16 kHz, 16-bit).
///
/// Fails with:
/// - [`Error::EmptyAudio`] when the buffer holds no samples (a zero-length
///   track means upstream extraction failed and is worth surfacing)
/// - [`Error::UnsupportedFormat`] for sample widths other than 1, 2, or 4 bytes
///
/// Already-canonical input takes a fast path with no resampler and returns
/// byte-identical output.
pub fn normalize(buffer: AudioBuffer) -> Result<CanonicalAudio> {
    if buffer.is_empty() {
        return Err(Error::EmptyAudio);
    }

    let interleaved = buffer.decode_f32()?;
    let mono = downmix_to_mono(&interleaved, buffer.channel_count() as usize);

    let mono_16k = if buffer.sample_rate() == TARGET_SAMPLE_RATE {
        mono
    } else {
        resample_to_target(&mono, buffer.sample_rate())?
    };

    let (canonical, clipped) = CanonicalAudio::from_f32(&mono_16k);
    if clipped > 0 {
        warn!(clipped, "normalization clipped samples during requantization");
    }

    Ok(canonical)
}

/// Downmix interleaved samples into mono by averaging channels.
///
/// Policy: equal-weight average across channels (simple, predictable, and it
/// never discards a channel's content).
fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels == 1 {
        return interleaved.to_vec();
    }

    let frames = interleaved.len() / channels;
    let mut mono = Vec::with_capacity(frames);

    for f in 0..frames {
        let base = f * channels;
        let mut acc = 0.0;
        for c in 0..channels {
            acc += interleaved[base + c];
        }
        mono.push(acc / channels as f32);
    }

    mono
}

/// Resample a mono buffer to the target sample rate.
///
/// rubato expects fixed-size input blocks; the final partial block is padded
/// with zeros and the output is truncated back to the expected frame count so
/// padding never leaks trailing silence into the result.
fn resample_to_target(mono_src: &[f32], src_rate: u32) -> Result<Vec<f32>> {
    // How many source frames we feed rubato per `process()` call.
    // Tradeoff: larger blocks = better throughput; smaller blocks = less padding waste.
    let in_chunk_src_frames = 2048;

    let mut rs = SincFixedIn::<f32>::new(
        TARGET_SAMPLE_RATE as f64 / src_rate as f64,
        2.0,
        rubato::SincInterpolationParameters {
            sinc_len: 256,
            f_cutoff: 0.95,
            interpolation: rubato::SincInterpolationType::Linear,
            oversampling_factor: 256,
            window: WindowFunction::BlackmanHarris2,
        },
        in_chunk_src_frames,
        1, // mono
    )
    .map_err(|e| anyhow!(e))
    .context("failed to init resampler")?;

    let in_max = rs.input_frames_max();
    let expected_out =
        (mono_src.len() as f64 * TARGET_SAMPLE_RATE as f64 / src_rate as f64).round() as usize;

    let mut padded = mono_src.to_vec();
    let rem = padded.len() % in_max;
    if rem != 0 {
        padded.resize(padded.len() + (in_max - rem), 0.0);
    }

    let mut out = Vec::with_capacity(expected_out);
    for block in padded.chunks(in_max) {
        let input = vec![block.to_vec()];
        let resampled = rs
            .process(&input, None)
            .map_err(|e| anyhow!(e))
            .context("resampler process failed")?;

        if resampled.len() != 1 {
            return Err(Error::msg("expected mono output from resampler"));
        }
        out.extend_from_slice(&resampled[0]);
    }

    out.truncate(expected_out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_buffer_is_reported_not_skipped() {
        let buf = AudioBuffer::new(Vec::new(), TARGET_SAMPLE_RATE, 1, 2).unwrap();
        match normalize(buf) {
            Err(Error::EmptyAudio) => {}
            other => panic!("expected EmptyAudio, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_width_is_rejected() {
        let buf = AudioBuffer::new(vec![0; 6], TARGET_SAMPLE_RATE, 1, 3).unwrap();
        match normalize(buf) {
            Err(Error::UnsupportedFormat { width_bytes }) => assert_eq!(width_bytes, 3),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn normalize_is_idempotent_on_canonical_input() -> Result<()> {
        let samples: Vec<i16> = (0..4_000).map(|i| ((i * 37) % 20_000) as i16 - 10_000).collect();
        let buf = AudioBuffer::from_i16(&samples, TARGET_SAMPLE_RATE, 1)?;
        let once = normalize(buf)?;

        let again_in = AudioBuffer::from_i16(once.samples(), TARGET_SAMPLE_RATE, 1)?;
        let twice = normalize(again_in)?;

        assert_eq!(once, twice);
        assert_eq!(once.samples(), samples.as_slice());
        Ok(())
    }

    #[test]
    fn stereo_is_downmixed_by_averaging() -> Result<()> {
        // Two frames of stereo: (L=1000, R=3000), (L=-1000, R=1000) => mono: 2000, 0
        let buf = AudioBuffer::from_i16(&[1_000, 3_000, -1_000, 1_000], TARGET_SAMPLE_RATE, 2)?;
        let mono = normalize(buf)?;
        assert_eq!(mono.samples(), &[2_000, 0]);
        Ok(())
    }

    #[test]
    fn eight_bit_audio_is_supported() -> Result<()> {
        // 128 is the u8 zero point; 255 is near full scale positive.
        let buf = AudioBuffer::new(vec![128, 255, 0, 128], TARGET_SAMPLE_RATE, 1, 1)?;
        let out = normalize(buf)?;
        assert_eq!(out.sample_count(), 4);
        assert_eq!(out.samples()[0], 0);
        assert!(out.samples()[1] > 30_000);
        assert!(out.samples()[2] < -30_000);
        Ok(())
    }

    #[test]
    fn resampling_reaches_the_target_rate() -> Result<()> {
        // One second of 8 kHz audio should become one second of 16 kHz audio.
        let samples = vec![0i16; 8_000];
        let buf = AudioBuffer::from_i16(&samples, 8_000, 1)?;
        let out = normalize(buf)?;
        assert_eq!(out.sample_count(), 16_000);
        assert_eq!(out.duration().as_secs(), 1);
        Ok(())
    }
}
