use std::path::Path;

use super::audio_error::AudioError;
use super::audio_segment::AudioSegment;

/// Domain interface for persisting decoded audio as a standalone file.
pub trait AudioWriter: Send + Sync {
    fn write_audio(&self, path: &Path, audio: &AudioSegment) -> Result<(), AudioError>;
}
