use std::time::Duration;

use crate::engine::EngineMode;
use crate::enhance::EnhanceParams;

/// Default chunk length fed to an incremental engine session.
pub const DEFAULT_CHUNK_DURATION: Duration = Duration::from_secs(30);

/// Default output suffix: `movie.mp4` → `movie_transcription.txt`.
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_transcription";

/// Video container extensions accepted by default.
pub const DEFAULT_EXTENSIONS: [&str; 4] = ["mp4", "avi", "mov", "mkv"];

/// Options that control how a batch run is performed.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The CLI is responsible for mapping user input into this type so that:
/// - the library remains reusable outside of a CLI context
/// - other frontends (APIs, tests, batch jobs) can construct options programmatically
#[derive(Debug, Clone)]
pub struct Opts {
    /// Duration of each chunk fed to the engine in incremental mode.
    pub chunk_duration: Duration,

    /// Whether to run one pass per file or chunked incremental decoding.
    pub engine_mode: EngineMode,

    /// Optional audio conditioning applied after normalization.
    ///
    /// `None` (the default) skips the enhancement stage entirely.
    pub enhance: Option<EnhanceParams>,

    /// Accepted video extensions, matched case-insensitively.
    pub extensions: Vec<String>,

    /// Appended to the input file stem to form the transcript file name.
    pub output_suffix: String,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            chunk_duration: DEFAULT_CHUNK_DURATION,
            engine_mode: EngineMode::default(),
            enhance: None,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_owned(),
        }
    }
}
