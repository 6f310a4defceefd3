//! Fixed-duration chunking of canonical audio.
//!
//! Chunk boundaries are computed purely from the chunk duration and the sample
//! rate — there is no snapping to silence or word boundaries, so a word may
//! straddle two chunks and downstream consumers must tolerate that.
//!
//! [`split`] only borrows the audio, so the resulting iterator is finite,
//! side-effect free, and restartable: calling `split` again on the same audio
//! yields the same sequence.

use std::time::Duration;

use crate::audio::{CanonicalAudio, TARGET_SAMPLE_RATE};
use crate::error::{Error, Result};

/// A contiguous, non-overlapping slice of one source's canonical audio.
///
/// Concatenating all chunks' samples in `sequence_index` order reconstructs
/// the source exactly.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    /// Position of this chunk within the source, starting at 0.
    pub sequence_index: usize,
    /// Mono 16 kHz `i16` samples.
    pub samples: &'a [i16],
    /// True only for the last chunk of the source.
    pub is_final: bool,
}

impl Chunk<'_> {
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / TARGET_SAMPLE_RATE as f64)
    }
}

/// Split canonical audio into fixed-duration chunks.
///
/// The final chunk may be shorter than `chunk_duration` but is never empty: an
/// exact-multiple input produces no trailing zero-length chunk, and empty audio
/// yields an empty iterator.
///
/// Fails with [`Error::InvalidChunkDuration`] when `chunk_duration` is zero or
/// rounds to fewer than one sample.
pub fn split(audio: &CanonicalAudio, chunk_duration: Duration) -> Result<Chunks<'_>> {
    let samples_per_chunk =
        (chunk_duration.as_secs_f64() * TARGET_SAMPLE_RATE as f64).round() as usize;
    if chunk_duration.is_zero() || samples_per_chunk == 0 {
        return Err(Error::InvalidChunkDuration(chunk_duration));
    }

    Ok(Chunks {
        samples: audio.samples(),
        samples_per_chunk,
        offset: 0,
        next_index: 0,
    })
}

/// Iterator over the chunks of one source, in temporal order.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    samples: &'a [i16],
    samples_per_chunk: usize,
    offset: usize,
    next_index: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Chunk<'a>;

    fn next(&mut self) -> Option<Chunk<'a>> {
        if self.offset >= self.samples.len() {
            return None;
        }

        let end = (self.offset + self.samples_per_chunk).min(self.samples.len());
        let chunk = Chunk {
            sequence_index: self.next_index,
            samples: &self.samples[self.offset..end],
            is_final: end == self.samples.len(),
        };

        self.offset = end;
        self.next_index += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.samples.len() - self.offset.min(self.samples.len());
        let chunks = remaining.div_ceil(self.samples_per_chunk);
        (chunks, Some(chunks))
    }
}

impl ExactSizeIterator for Chunks<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio_of_seconds(seconds: u64) -> CanonicalAudio {
        let n = seconds as usize * TARGET_SAMPLE_RATE as usize;
        CanonicalAudio::from_samples((0..n).map(|i| (i % 977) as i16).collect())
    }

    #[test]
    fn zero_chunk_duration_is_invalid() {
        let audio = audio_of_seconds(1);
        match split(&audio, Duration::ZERO) {
            Err(Error::InvalidChunkDuration(_)) => {}
            other => panic!("expected InvalidChunkDuration, got {other:?}"),
        }
    }

    #[test]
    fn empty_audio_yields_no_chunks() -> Result<()> {
        let audio = CanonicalAudio::from_samples(Vec::new());
        let mut chunks = split(&audio, Duration::from_secs(30))?;
        assert_eq!(chunks.len(), 0);
        assert!(chunks.next().is_none());
        Ok(())
    }

    #[test]
    fn seventy_five_seconds_in_thirty_second_chunks() -> Result<()> {
        let audio = audio_of_seconds(75);
        let chunks: Vec<_> = split(&audio, Duration::from_secs(30))?.collect();

        assert_eq!(chunks.len(), 3);
        let indexes: Vec<_> = chunks.iter().map(|c| c.sequence_index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);

        assert_eq!(chunks[0].duration(), Duration::from_secs(30));
        assert_eq!(chunks[1].duration(), Duration::from_secs(30));
        assert_eq!(chunks[2].duration(), Duration::from_secs(15));

        let finals: Vec<_> = chunks.iter().map(|c| c.is_final).collect();
        assert_eq!(finals, vec![false, false, true]);
        Ok(())
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_chunk() -> Result<()> {
        let audio = audio_of_seconds(60);
        let chunks: Vec<_> = split(&audio, Duration::from_secs(30))?.collect();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].duration(), Duration::from_secs(30));
        assert!(chunks[1].is_final);
        Ok(())
    }

    #[test]
    fn partition_is_lossless() -> Result<()> {
        let audio = audio_of_seconds(7);
        let mut rebuilt = Vec::new();
        for chunk in split(&audio, Duration::from_millis(1_700))? {
            rebuilt.extend_from_slice(chunk.samples);
        }
        assert_eq!(rebuilt, audio.samples());
        Ok(())
    }

    #[test]
    fn split_is_restartable() -> Result<()> {
        let audio = audio_of_seconds(3);
        let first: Vec<usize> = split(&audio, Duration::from_secs(1))?
            .map(|c| c.samples.len())
            .collect();
        let second: Vec<usize> = split(&audio, Duration::from_secs(1))?
            .map(|c| c.samples.len())
            .collect();
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn size_hint_matches_ceil_division() -> Result<()> {
        let audio = audio_of_seconds(10);
        let chunks = split(&audio, Duration::from_secs(3))?;
        assert_eq!(chunks.len(), 4); // ceil(10 / 3)
        Ok(())
    }
}
