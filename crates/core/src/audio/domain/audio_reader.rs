use std::path::Path;

use super::audio_error::AudioError;
use super::audio_segment::AudioSegment;

/// Domain interface for decoding the audio track of a media file.
pub trait AudioReader: Send + Sync {
    /// Decode the audio track to mono PCM at the given sample rate.
    /// Returns `None` if the file has no audio track.
    fn read_audio(
        &self,
        path: &Path,
        target_sample_rate: u32,
    ) -> Result<Option<AudioSegment>, AudioError>;
}
