//! Media decoding boundary: turn a video file into a raw PCM [`AudioBuffer`].
//!
//! The pipeline treats the decoder as an external collaborator behind the
//! [`MediaDecoder`] trait, so tests can substitute a mock and the batch
//! coordinator never knows which container library is underneath.
//!
//! [`SymphoniaDecoder`] is the built-in implementation:
//! - probe the container with an extension hint
//! - pick the first decodable audio track with a known sample rate
//! - decode packets to interleaved `f32`, skipping corrupt frames and treating
//!   IO errors as end-of-stream (streaming-friendly error policy)
//!
//! Any failure in here surfaces as [`Error::UnreadableMedia`] for the file,
//! which the batch coordinator records without stopping the run.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, anyhow};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Track};
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

use crate::audio::AudioBuffer;
use crate::error::{Error, Result};

/// External media decoder contract: raw PCM for a video path.
pub trait MediaDecoder {
    fn extract_audio(&self, video_path: &Path) -> Result<AudioBuffer>;
}

/// Container/codec decoding via Symphonia.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl MediaDecoder for SymphoniaDecoder {
    fn extract_audio(&self, video_path: &Path) -> Result<AudioBuffer> {
        extract_audio_impl(video_path).map_err(|e| Error::UnreadableMedia {
            path: video_path.to_path_buf(),
            reason: format!("{e:#}"),
        })
    }
}

fn extract_audio_impl(video_path: &Path) -> anyhow::Result<AudioBuffer> {
    let file = File::open(video_path).context("failed to open input file")?;

    let (mut format, track) = probe_file_and_pick_audio_track(file, video_path)?;
    let mut decoder = make_decoder_for_track(&track)?;

    let mut interleaved = Vec::<f32>::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;
    let mut sample_rate = 0u32;
    let mut channel_count = 0u16;

    loop {
        let Some(packet) = next_packet(&mut format)? else {
            break;
        };

        // Ignore packets from non-audio tracks (video files carry several).
        if packet.track_id() != track.id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                if sample_rate == 0 {
                    sample_rate = spec.rate;
                    channel_count = u16::try_from(spec.channels.count())
                        .context("audio track has too many channels")?;
                    if channel_count == 0 {
                        anyhow::bail!("decoded audio had zero channels");
                    }
                }

                let buf = sample_buf.get_or_insert_with(|| {
                    SampleBuffer::<f32>::new(decoded.capacity() as u64, spec)
                });
                buf.copy_interleaved_ref(decoded);
                interleaved.extend_from_slice(buf.samples());
            }

            // Recoverable: corrupted frame, but decoding can continue.
            Err(SymphoniaError::DecodeError(_)) => continue,

            // Treat IO errors as graceful end-of-stream.
            Err(SymphoniaError::IoError(_)) => break,

            // Anything else is considered fatal.
            Err(e) => return Err(anyhow!(e)).context("decoder failure"),
        }
    }

    if sample_rate == 0 {
        anyhow::bail!("audio track produced no decodable frames");
    }

    debug!(
        path = %video_path.display(),
        sample_rate,
        channel_count,
        frames = interleaved.len() / channel_count as usize,
        "extracted audio track"
    );

    Ok(AudioBuffer::from_f32(
        &interleaved,
        sample_rate,
        channel_count,
    )?)
}

/// Probe the container and pick a default audio track.
///
/// Track selection policy:
/// - choose the first track that looks decodable (codec != NULL)
/// - and has a known sample rate (required for resampling decisions downstream)
///
/// The file extension is passed as a probe hint; it noticeably improves
/// detection for ambiguous container layouts.
fn probe_file_and_pick_audio_track(
    file: File,
    video_path: &Path,
) -> anyhow::Result<(Box<dyn FormatReader>, Track)> {
    let mss_opts = MediaSourceStreamOptions {
        // Symphonia expects a power-of-two buffer > 32KiB for good probing behavior.
        buffer_len: 256 * 1024,
    };
    let mss = MediaSourceStream::new(Box::new(file), mss_opts);

    let mut hint = Hint::new();
    if let Some(ext) = video_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let format_opts: FormatOptions = Default::default();
    let metadata_opts: MetadataOptions = Default::default();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &format_opts, &metadata_opts)
        .map_err(|e| anyhow!(e))
        .context("failed to probe media container")?;

    let format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
        .cloned()
        .ok_or_else(|| anyhow!("no audio track found"))?;

    Ok((format, track))
}

/// Create a decoder for the given audio track using Symphonia's default codec registry.
fn make_decoder_for_track(track: &Track) -> anyhow::Result<Box<dyn Decoder>> {
    let decoder_opts: DecoderOptions = Default::default();

    symphonia::default::get_codecs()
        .make(&track.codec_params, &decoder_opts)
        .map_err(|e| anyhow!(e))
        .context("failed to create decoder for audio track")
}

/// Read the next packet, treating IO errors as "end of stream".
fn next_packet(
    format: &mut Box<dyn FormatReader>,
) -> anyhow::Result<Option<symphonia::core::formats::Packet>> {
    match format.next_packet() {
        Ok(p) => Ok(Some(p)),
        Err(SymphoniaError::IoError(_)) => Ok(None),
        Err(e) => Err(anyhow!(e)).context("failed reading packet"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, sample_rate: u32, channels: u16, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames * channels as usize {
            writer.write_sample(((i % 200) as i16) - 100).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn extracts_pcm_from_a_wav_container() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_wav(&path, 22_050, 2, 4_410);

        let buffer = SymphoniaDecoder.extract_audio(&path).unwrap();
        assert_eq!(buffer.sample_rate(), 22_050);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 4_410);
    }

    #[test]
    fn missing_file_is_unreadable_media() {
        let err = SymphoniaDecoder
            .extract_audio(Path::new("/definitely/not/here.mp4"))
            .unwrap_err();
        match err {
            Error::UnreadableMedia { path, .. } => {
                assert_eq!(path, Path::new("/definitely/not/here.mp4"));
            }
            other => panic!("expected UnreadableMedia, got {other:?}"),
        }
    }

    #[test]
    fn garbage_bytes_are_unreadable_media() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.mp4");
        std::fs::write(&path, b"this is not a video").unwrap();

        let err = SymphoniaDecoder.extract_audio(&path).unwrap_err();
        assert!(matches!(err, Error::UnreadableMedia { .. }));
    }
}
