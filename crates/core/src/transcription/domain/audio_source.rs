use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::resources::job_workspace::JobWorkspace;

use super::transcription_error::TranscriptionError;

/// Strategy for turning a staged media file into recognizer input.
///
/// Implementations may stage intermediate files in the job's workspace.
pub trait AudioSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn load(
        &self,
        source: &Path,
        workspace: &mut JobWorkspace,
    ) -> Result<AudioSegment, TranscriptionError>;
}
