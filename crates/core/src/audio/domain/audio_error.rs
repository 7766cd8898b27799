use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("failed to decode audio from {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: ffmpeg_next::Error,
    },
    #[error("failed to write audio to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },
}
