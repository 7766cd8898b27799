use std::path::PathBuf;

use thiserror::Error;

use crate::render::domain::render_error::RenderError;
use crate::resources::resource_error::ResourceError;
use crate::segments::domain::invalid_segments_error::InvalidSegmentsError;
use crate::shared::model_resolver::ModelResolveError;
use crate::transcription::domain::transcription_error::TranscriptionError;

/// Every way a single caption job can fail.
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
    #[error(transparent)]
    InvalidSegments(#[from] InvalidSegmentsError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error("input file not found: {0}")]
    InputNotFound(PathBuf),
    #[error("failed to read {path}: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl JobError {
    /// True when the request itself was at fault rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, JobError::InputNotFound(_))
    }
}

/// Failures while assembling a [`CaptionPipeline`](super::caption_pipeline::CaptionPipeline)
/// from configuration.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Model(#[from] ModelResolveError),
    #[error(transparent)]
    Recognizer(#[from] TranscriptionError),
    #[error(transparent)]
    Resources(#[from] ResourceError),
}
