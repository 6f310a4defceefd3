//! Batch coordinator behavior with mocked decoder and engine: failure
//! isolation, output artifacts, and input resolution.

use std::fs;
use std::path::{Path, PathBuf};

use vidscribe::audio::{AudioBuffer, TARGET_SAMPLE_RATE};
use vidscribe::batch::{BatchCoordinator, FileOutcome};
use vidscribe::engine::{EngineMode, EngineSession, SpeechEngine};
use vidscribe::error::{Error, Result};
use vidscribe::media::MediaDecoder;
use vidscribe::opts::Opts;

/// Yields a fixed-length mono track for every path, except paths it is told to
/// reject, which fail the way an unreadable container would.
struct MockDecoder {
    fail_for: Vec<PathBuf>,
    seconds: usize,
}

impl MockDecoder {
    fn new(seconds: usize) -> Self {
        Self {
            fail_for: Vec::new(),
            seconds,
        }
    }

    fn failing_for(mut self, path: impl Into<PathBuf>) -> Self {
        self.fail_for.push(path.into());
        self
    }
}

impl MediaDecoder for MockDecoder {
    fn extract_audio(&self, video_path: &Path) -> Result<AudioBuffer> {
        if self.fail_for.iter().any(|p| p == video_path) {
            return Err(Error::UnreadableMedia {
                path: video_path.to_path_buf(),
                reason: "mock decode failure".into(),
            });
        }

        let samples = vec![1_000i16; self.seconds * TARGET_SAMPLE_RATE as usize];
        AudioBuffer::from_i16(&samples, TARGET_SAMPLE_RATE, 1)
    }
}

/// Emits one "part<n>" fragment per fed chunk and a fixed full-pass text.
struct MockEngine;

struct MockSession {
    next_index: usize,
}

impl SpeechEngine for MockEngine {
    type Session<'a>
        = MockSession
    where
        Self: 'a;

    fn transcribe_full(&self, _audio: &vidscribe::audio::CanonicalAudio) -> Result<String> {
        Ok("full pass".to_owned())
    }

    fn open_session(&self) -> Result<Self::Session<'_>> {
        Ok(MockSession { next_index: 0 })
    }
}

impl EngineSession for MockSession {
    fn feed(&mut self, _samples: &[i16]) -> Result<Option<String>> {
        let index = self.next_index;
        self.next_index += 1;
        Ok(Some(format!("part{index}")))
    }

    fn finalize(&mut self) -> Result<Option<String>> {
        Ok(None)
    }
}

#[test]
fn one_failing_file_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.mp4", "b.mp4", "c.mp4"] {
        fs::write(dir.path().join(name), "placeholder").unwrap();
    }

    let decoder = MockDecoder::new(5).failing_for(dir.path().join("b.mp4"));
    let coordinator = BatchCoordinator::new(decoder, MockEngine, Opts::default());

    let job = coordinator.run(dir.path()).unwrap();
    assert_eq!(job.outcomes.len(), 3);
    assert_eq!(job.success_count(), 2);
    assert_eq!(job.failure_count(), 1);

    for outcome in &job.outcomes {
        match outcome {
            FileOutcome::Success { input, output } => {
                assert_ne!(input.file_name().unwrap(), "b.mp4");
                let written = fs::read_to_string(output).unwrap();
                assert!(!written.is_empty(), "{} is empty", output.display());
            }
            FileOutcome::Failure { input, reason } => {
                assert_eq!(input.file_name().unwrap(), "b.mp4");
                assert!(reason.contains("mock decode failure"));
            }
        }
    }
}

#[test]
fn transcripts_are_written_adjacent_with_the_suffix() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("lecture.mkv");
    fs::write(&input, "placeholder").unwrap();

    let coordinator = BatchCoordinator::new(MockDecoder::new(65), MockEngine, Opts::default());
    let job = coordinator.run(&input).unwrap();

    assert_eq!(job.success_count(), 1);
    let expected = dir.path().join("lecture_transcription.txt");
    // 65s at the default 30s chunking: three chunks, joined in order.
    assert_eq!(fs::read_to_string(expected).unwrap(), "part0 part1 part2");
}

#[test]
fn batch_engine_mode_bypasses_chunking() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("talk.mp4");
    fs::write(&input, "placeholder").unwrap();

    let opts = Opts {
        engine_mode: EngineMode::Batch,
        ..Opts::default()
    };
    let coordinator = BatchCoordinator::new(MockDecoder::new(65), MockEngine, opts);
    let job = coordinator.run(&input).unwrap();

    assert_eq!(job.success_count(), 1);
    let written = fs::read_to_string(dir.path().join("talk_transcription.txt")).unwrap();
    assert_eq!(written, "full pass");
}

#[test]
fn empty_track_is_a_file_level_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("silent.mov");
    fs::write(&input, "placeholder").unwrap();

    let coordinator = BatchCoordinator::new(MockDecoder::new(0), MockEngine, Opts::default());
    let job = coordinator.run(&input).unwrap();

    assert_eq!(job.failure_count(), 1);
    match &job.outcomes[0] {
        FileOutcome::Failure { reason, .. } => assert!(reason.contains("empty")),
        other => panic!("expected a failure outcome, got {other:?}"),
    }
}

#[test]
fn unsupported_single_file_is_reported_up_front() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("audio.ogg");
    fs::write(&input, "placeholder").unwrap();

    let coordinator = BatchCoordinator::new(MockDecoder::new(5), MockEngine, Opts::default());
    match coordinator.run(&input) {
        Err(Error::UnsupportedInput(p)) => assert_eq!(p, input),
        other => panic!("expected UnsupportedInput, got {other:?}"),
    }
}

#[test]
fn invalid_input_path_is_fatal() {
    let coordinator = BatchCoordinator::new(MockDecoder::new(5), MockEngine, Opts::default());
    let err = coordinator.run(Path::new("/no/such/input")).unwrap_err();
    assert!(err.is_precondition());
}

#[test]
fn outcome_report_serializes_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    fs::write(&input, "placeholder").unwrap();

    let coordinator = BatchCoordinator::new(MockDecoder::new(2), MockEngine, Opts::default());
    let job = coordinator.run(&input).unwrap();

    let json = serde_json::to_string(&job).unwrap();
    assert!(json.contains("\"status\":\"success\""));
}
