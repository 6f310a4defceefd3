use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use vidscribe::batch::BatchCoordinator;
use vidscribe::engine::EngineMode;
use vidscribe::engines::whisper::{WhisperEngine, WhisperOpts};
use vidscribe::enhance::EnhanceParams;
use vidscribe::media::SymphoniaDecoder;
use vidscribe::opts::Opts;

fn main() -> Result<()> {
    vidscribe::logging::init();
    let params = Params::parse();

    // Load the model once, before touching any input. A failure here is a
    // precondition error and aborts the run with a non-zero exit code.
    let engine = WhisperEngine::new(
        &params.model_path,
        WhisperOpts {
            language: params.language.clone(),
            translate_to_english: params.enable_translation_to_english,
        },
    )?;

    let mut opts = Opts {
        chunk_duration: Duration::from_secs(params.chunk_seconds),
        engine_mode: if params.batch_engine {
            EngineMode::Batch
        } else {
            EngineMode::Incremental
        },
        enhance: params.enhance.then(EnhanceParams::speech_preset),
        output_suffix: params.suffix.clone(),
        ..Opts::default()
    };
    if !params.extensions.is_empty() {
        opts.extensions = params.extensions.clone();
    }

    let coordinator = BatchCoordinator::new(SymphoniaDecoder, engine, opts);
    let job = coordinator.run(&params.input_path)?;

    if params.report_json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else {
        for outcome in &job.outcomes {
            match outcome {
                vidscribe::batch::FileOutcome::Success { input, output } => {
                    println!("ok   {} -> {}", input.display(), output.display());
                }
                vidscribe::batch::FileOutcome::Failure { input, reason } => {
                    println!("fail {} ({reason})", input.display());
                }
            }
        }
        println!(
            "{} succeeded, {} failed",
            job.success_count(),
            job.failure_count()
        );
    }

    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "vidscribe")]
#[command(about = "Batch transcription of video files using Whisper")]
struct Params {
    /// Path to a video file or a directory of video files.
    input_path: PathBuf,

    /// Path to a ggml Whisper model file.
    #[arg(short = 'm', long = "model")]
    model_path: String,

    /// Chunk length fed to the engine in incremental mode.
    #[arg(long = "chunk-seconds", default_value_t = 30)]
    chunk_seconds: u64,

    /// Run one recognition pass per file instead of chunked decoding.
    #[arg(long = "batch-engine", default_value_t = false)]
    batch_engine: bool,

    /// Apply the speech enhancement preset before transcription.
    #[arg(long = "enhance", default_value_t = false)]
    enhance: bool,

    /// Optional language hint (e.g. "en"); omit to auto-detect.
    #[arg(short = 'l', long = "language")]
    language: Option<String>,

    #[arg(
        short = 't',
        long = "enable-translation-to-english",
        default_value_t = false
    )]
    enable_translation_to_english: bool,

    /// Suffix appended to the input stem for the transcript file name.
    #[arg(long = "suffix", default_value = "_transcription")]
    suffix: String,

    /// Additional accepted video extension (repeatable); defaults to mp4/avi/mov/mkv.
    #[arg(long = "ext")]
    extensions: Vec<String>,

    /// Print the per-file outcome list as JSON instead of plain text.
    #[arg(long = "report-json", default_value_t = false)]
    report_json: bool,
}
