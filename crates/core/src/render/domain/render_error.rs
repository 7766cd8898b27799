use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot resolve absolute path for {path}: {source}")]
    ResolvePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode render props: {0}")]
    Props(#[source] serde_json::Error),
    #[error("failed to start render process `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to start render runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed waiting for render process: {0}")]
    Wait(#[source] std::io::Error),
    #[error("render process exited with {status}: {stderr_tail}")]
    ProcessFailed { status: String, stderr_tail: String },
    #[error("render timed out after {0:?}")]
    Timeout(Duration),
    #[error("no render slot became free within {0:?}")]
    AdmissionTimeout(Duration),
    #[error("failed to clear previous output {path}: {source}")]
    ClearOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("render failed to produce output file")]
    MissingOutput(PathBuf),
}
