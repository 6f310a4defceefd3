//! Optional audio conditioning applied between normalization and chunking.
//!
//! The enhancer is a fixed-order pipeline of independent filters:
//! 1. peak loudness normalization
//! 2. dynamic-range compression
//! 3. fixed gain offset
//! 4. first-order high-pass
//! 5. first-order low-pass
//!
//! Every filter is a pure function over `f32` samples: same input samples and
//! parameters always produce the same output. The canonical shape (mono,
//! 16 kHz, 16-bit) is preserved exactly; only amplitude and spectral content
//! change.
//!
//! Parameter validation is strict: out-of-range values fail with
//! [`Error::InvalidEnhancementParams`] instead of being clamped silently.

use tracing::warn;

use crate::audio::{CanonicalAudio, TARGET_SAMPLE_RATE};
use crate::error::{Error, Result};

/// Dynamic-range compressor settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorParams {
    /// Level above which gain reduction kicks in (dBFS, must be <= 0).
    pub threshold_db: f32,
    /// Compression ratio (must be >= 1.0; 1.0 means no compression).
    pub ratio: f32,
    /// Envelope attack time in milliseconds (must be >= 0).
    pub attack_ms: f32,
    /// Envelope release time in milliseconds (must be >= 0).
    pub release_ms: f32,
}

/// Enhancement parameters. Every stage is optional; the default applies nothing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnhanceParams {
    /// Target peak level in dBFS (must be <= 0), e.g. `-1.0`.
    pub target_peak_dbfs: Option<f32>,
    pub compressor: Option<CompressorParams>,
    /// Fixed gain offset in dB (0.0 = no change).
    pub gain_db: f32,
    /// High-pass cutoff in Hz (must be within (0, Nyquist)).
    pub high_pass_hz: Option<f32>,
    /// Low-pass cutoff in Hz (must be within (0, Nyquist)).
    pub low_pass_hz: Option<f32>,
}

impl EnhanceParams {
    /// A conservative preset for speech recordings: trims rumble and hiss,
    /// evens out levels, and normalizes the peak close to full scale.
    pub fn speech_preset() -> Self {
        Self {
            target_peak_dbfs: Some(-1.0),
            compressor: Some(CompressorParams {
                threshold_db: -18.0,
                ratio: 3.0,
                attack_ms: 5.0,
                release_ms: 100.0,
            }),
            gain_db: 0.0,
            high_pass_hz: Some(80.0),
            low_pass_hz: Some(7_000.0),
        }
    }

    fn validate(&self) -> Result<()> {
        let nyquist = TARGET_SAMPLE_RATE as f32 / 2.0;

        if let Some(peak) = self.target_peak_dbfs {
            if !peak.is_finite() || peak > 0.0 {
                return Err(invalid(format!(
                    "target peak must be a finite dBFS value <= 0, got {peak}"
                )));
            }
        }

        if let Some(c) = &self.compressor {
            if !c.threshold_db.is_finite() || c.threshold_db > 0.0 {
                return Err(invalid(format!(
                    "compressor threshold must be a finite dBFS value <= 0, got {}",
                    c.threshold_db
                )));
            }
            if !c.ratio.is_finite() || c.ratio < 1.0 {
                return Err(invalid(format!(
                    "compressor ratio must be >= 1.0, got {}",
                    c.ratio
                )));
            }
            if !c.attack_ms.is_finite() || c.attack_ms < 0.0 {
                return Err(invalid(format!(
                    "compressor attack must be >= 0 ms, got {}",
                    c.attack_ms
                )));
            }
            if !c.release_ms.is_finite() || c.release_ms < 0.0 {
                return Err(invalid(format!(
                    "compressor release must be >= 0 ms, got {}",
                    c.release_ms
                )));
            }
        }

        if !self.gain_db.is_finite() {
            return Err(invalid(format!("gain must be finite, got {}", self.gain_db)));
        }

        for (name, cutoff) in [
            ("high-pass", self.high_pass_hz),
            ("low-pass", self.low_pass_hz),
        ] {
            if let Some(hz) = cutoff {
                if !hz.is_finite() || hz <= 0.0 || hz >= nyquist {
                    return Err(invalid(format!(
                        "{name} cutoff must be within (0, {nyquist}) Hz, got {hz}"
                    )));
                }
            }
        }

        if let (Some(hp), Some(lp)) = (self.high_pass_hz, self.low_pass_hz) {
            if hp >= lp {
                return Err(invalid(format!(
                    "high-pass cutoff ({hp} Hz) must be below low-pass cutoff ({lp} Hz)"
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: String) -> Error {
    Error::InvalidEnhancementParams(message)
}

/// Apply the enhancement pipeline to canonical audio.
///
/// Never fails on valid parameters; the output has the same sample count,
/// rate, width, and channel count as the input.
pub fn enhance(audio: CanonicalAudio, params: &EnhanceParams) -> Result<CanonicalAudio> {
    params.validate()?;

    if audio.is_empty() {
        return Ok(audio);
    }

    let mut samples = audio.to_f32();

    if let Some(peak) = params.target_peak_dbfs {
        samples = normalize_peak(&samples, peak);
    }
    if let Some(c) = &params.compressor {
        samples = compress(&samples, c);
    }
    if params.gain_db != 0.0 {
        samples = apply_gain(&samples, params.gain_db);
    }
    if let Some(hz) = params.high_pass_hz {
        samples = high_pass(&samples, hz);
    }
    if let Some(hz) = params.low_pass_hz {
        samples = low_pass(&samples, hz);
    }

    let (out, clipped) = CanonicalAudio::from_f32(&samples);
    if clipped > 0 {
        warn!(clipped, "enhancement clipped samples during requantization");
    }

    Ok(out)
}

fn db_to_linear(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

fn linear_to_db(linear: f32) -> f32 {
    // Floor tiny values so silence maps to a very low level instead of -inf.
    20.0 * linear.max(1e-10).log10()
}

/// Scale the whole buffer so its absolute peak sits at `target_dbfs`.
///
/// Digital silence is returned unchanged (there is no peak to move).
fn normalize_peak(samples: &[f32], target_dbfs: f32) -> Vec<f32> {
    let peak = samples.iter().fold(0f32, |acc, s| acc.max(s.abs()));
    if peak <= 0.0 {
        return samples.to_vec();
    }

    let scale = db_to_linear(target_dbfs) / peak;
    samples.iter().map(|s| s * scale).collect()
}

/// Feed-forward dynamic-range compressor with an attack/release envelope follower.
fn compress(samples: &[f32], params: &CompressorParams) -> Vec<f32> {
    let attack = smoothing_coefficient(params.attack_ms);
    let release = smoothing_coefficient(params.release_ms);

    let mut envelope = 0f32;
    samples
        .iter()
        .map(|&s| {
            let level = s.abs();
            let coeff = if level > envelope { attack } else { release };
            envelope = coeff * envelope + (1.0 - coeff) * level;

            let env_db = linear_to_db(envelope);
            if env_db <= params.threshold_db {
                return s;
            }

            let over_db = env_db - params.threshold_db;
            let reduction_db = over_db - over_db / params.ratio;
            s * db_to_linear(-reduction_db)
        })
        .collect()
}

/// One-pole smoothing coefficient for a time constant in milliseconds.
fn smoothing_coefficient(time_ms: f32) -> f32 {
    if time_ms <= 0.0 {
        return 0.0;
    }
    (-1.0 / (time_ms * 1e-3 * TARGET_SAMPLE_RATE as f32)).exp()
}

fn apply_gain(samples: &[f32], gain_db: f32) -> Vec<f32> {
    let scale = db_to_linear(gain_db);
    samples.iter().map(|s| s * scale).collect()
}

/// First-order high-pass (RC) filter.
fn high_pass(samples: &[f32], cutoff_hz: f32) -> Vec<f32> {
    let dt = 1.0 / TARGET_SAMPLE_RATE as f32;
    let rc = 1.0 / (2.0 * std::f32::consts::PI * cutoff_hz);
    let alpha = rc / (rc + dt);

    let mut out = Vec::with_capacity(samples.len());
    let mut prev_in = 0f32;
    let mut prev_out = 0f32;
    for &s in samples {
        let y = alpha * (prev_out + s - prev_in);
        prev_in = s;
        prev_out = y;
        out.push(y);
    }
    out
}

/// First-order low-pass (RC) filter.
fn low_pass(samples: &[f32], cutoff_hz: f32) -> Vec<f32> {
    let dt = 1.0 / TARGET_SAMPLE_RATE as f32;
    let rc = 1.0 / (2.0 * std::f32::consts::PI * cutoff_hz);
    let alpha = dt / (rc + dt);

    let mut out = Vec::with_capacity(samples.len());
    let mut prev = 0f32;
    for &s in samples {
        prev += alpha * (s - prev);
        out.push(prev);
    }
    out
}
