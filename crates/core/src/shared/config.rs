use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    APP_DIR_NAME, DEFAULT_BODY_LIMIT_BYTES, DEFAULT_HOST, DEFAULT_MAX_CONCURRENT_RENDERS,
    DEFAULT_PORT, DEFAULT_RENDER_TIMEOUT_SECS, DEFAULT_TRANSCRIBE_TIMEOUT_SECS,
    REMOTION_COMPOSITION_ID, REMOTION_CONCURRENCY, REMOTION_ENTRY_POINT, REMOTION_GL_BACKEND,
    REMOTION_PREFIX_ARGS, REMOTION_PROGRAM, WHISPER_MODEL_FILENAME, WHISPER_MODEL_ID,
    WHISPER_MODEL_URL,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// How audio reaches the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionStrategy {
    /// Decode the source's audio stream in memory.
    Direct,
    /// Extract the audio track to a staged WAV file first.
    Extract,
}

impl std::fmt::Display for TranscriptionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TranscriptionStrategy::Direct => write!(f, "direct"),
            TranscriptionStrategy::Extract => write!(f, "extract"),
        }
    }
}

impl std::str::FromStr for TranscriptionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(TranscriptionStrategy::Direct),
            "extract" => Ok(TranscriptionStrategy::Extract),
            other => Err(format!(
                "strategy must be 'direct' or 'extract', got '{other}'"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Identifier reported by the health endpoint.
    pub id: String,
    pub file_name: String,
    pub url: String,
    pub path: Option<PathBuf>,
    pub bundled_dir: Option<PathBuf>,
    /// Load the model at startup instead of on the first request.
    pub preload: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            id: WHISPER_MODEL_ID.to_string(),
            file_name: WHISPER_MODEL_FILENAME.to_string(),
            url: WHISPER_MODEL_URL.to_string(),
            path: None,
            bundled_dir: None,
            preload: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub strategy: TranscriptionStrategy,
    /// `None` waits forever.
    pub timeout_secs: Option<u64>,
    pub threads: Option<u32>,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            strategy: TranscriptionStrategy::Direct,
            timeout_secs: Some(DEFAULT_TRANSCRIBE_TIMEOUT_SECS),
            threads: None,
        }
    }
}

impl TranscriptionConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub program: String,
    pub prefix_args: Vec<String>,
    pub entry_point: String,
    pub composition_id: String,
    /// Value for `--gl=`; `None` lets the renderer choose.
    pub gl_backend: Option<String>,
    pub concurrency: Option<u32>,
    /// Remotion project root the process runs in.
    pub working_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub max_concurrent_renders: usize,
    /// How long a job may wait for a render slot. `None` waits forever.
    pub admission_timeout_secs: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            program: REMOTION_PROGRAM.to_string(),
            prefix_args: REMOTION_PREFIX_ARGS.iter().map(|s| s.to_string()).collect(),
            entry_point: REMOTION_ENTRY_POINT.to_string(),
            composition_id: REMOTION_COMPOSITION_ID.to_string(),
            gl_backend: Some(REMOTION_GL_BACKEND.to_string()),
            concurrency: Some(REMOTION_CONCURRENCY),
            working_dir: None,
            timeout_secs: Some(DEFAULT_RENDER_TIMEOUT_SECS),
            max_concurrent_renders: DEFAULT_MAX_CONCURRENT_RENDERS,
            admission_timeout_secs: None,
        }
    }
}

impl RenderConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn admission_timeout(&self) -> Option<Duration> {
        self.admission_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Reject edited segments that are out of order or overlap.
    pub enforce_ordering: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, uploads included.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Top-level configuration shared by the CLI and the HTTP service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionerConfig {
    pub model: ModelConfig,
    pub transcription: TranscriptionConfig,
    pub render: RenderConfig,
    pub segments: SegmentConfig,
    pub server: ServerConfig,
    /// Root for per-job temp directories. Defaults to the system temp dir.
    pub work_dir: Option<PathBuf>,
}

impl CaptionerConfig {
    /// Default config file location: `<config dir>/Captioner/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.json"))
    }

    /// Load from `path`, or from [`Self::default_path`] when it exists, or
    /// fall back to defaults. An explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn work_dir(&self) -> PathBuf {
        self.work_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("captioner"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_remotion_contract() {
        let config = CaptionerConfig::default();
        assert_eq!(config.render.program, "npx");
        assert_eq!(config.render.prefix_args, vec!["remotion", "render"]);
        assert_eq!(config.render.composition_id, "CaptionVideo");
        assert_eq!(config.render.concurrency, Some(1));
        assert_eq!(config.render.max_concurrent_renders, 1);
        assert_eq!(config.model.id, "whisper-tiny.en");
        assert!(!config.segments.enforce_ordering);
        assert_eq!(config.server.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.server.body_limit_bytes, 512 * 1024 * 1024);
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(
            &path,
            r#"{"render": {"working_dir": "/srv/remotion"}, "transcription": {"strategy": "extract"}}"#,
        )
        .unwrap();

        let config = CaptionerConfig::load(Some(&path)).unwrap();
        assert_eq!(
            config.render.working_dir.as_deref(),
            Some(Path::new("/srv/remotion"))
        );
        assert_eq!(config.render.entry_point, REMOTION_ENTRY_POINT);
        assert_eq!(config.transcription.strategy, TranscriptionStrategy::Extract);
        assert_eq!(config.model.file_name, WHISPER_MODEL_FILENAME);
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let err = CaptionerConfig::load(Some(&tmp.path().join("nope.json"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let err = CaptionerConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[rstest]
    #[case("direct", Some(TranscriptionStrategy::Direct))]
    #[case("extract", Some(TranscriptionStrategy::Extract))]
    #[case("both", None)]
    fn test_strategy_from_str(#[case] input: &str, #[case] expected: Option<TranscriptionStrategy>) {
        assert_eq!(input.parse::<TranscriptionStrategy>().ok(), expected);
    }

    #[test]
    fn test_timeouts_convert_to_durations() {
        let mut config = CaptionerConfig::default();
        config.render.timeout_secs = Some(5);
        config.transcription.timeout_secs = None;
        assert_eq!(config.render.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.transcription.timeout(), None);
    }
}
