use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::audio::domain::audio_error::AudioError;
use crate::resources::resource_error::ResourceError;

#[derive(Error, Debug)]
pub enum TranscriptionError {
    #[error("source file not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("no audio track in {0}")]
    NoAudioTrack(PathBuf),
    #[error(transparent)]
    Decode(#[from] AudioError),
    #[error("failed to stage extracted audio: {0}")]
    Staging(#[source] ResourceError),
    #[error("speech model error: {0}")]
    Model(String),
    #[error("speech recognizer is not running")]
    WorkerUnavailable,
    #[error("transcription timed out after {0:?}")]
    Timeout(Duration),
}
