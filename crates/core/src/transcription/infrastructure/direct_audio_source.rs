use std::path::Path;

use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::resources::job_workspace::JobWorkspace;
use crate::shared::constants::WHISPER_SAMPLE_RATE;
use crate::transcription::domain::audio_source::AudioSource;
use crate::transcription::domain::transcription_error::TranscriptionError;

/// Decodes the source's audio straight into memory.
pub struct DirectAudioSource {
    reader: Box<dyn AudioReader>,
}

impl DirectAudioSource {
    pub fn new(reader: Box<dyn AudioReader>) -> Self {
        Self { reader }
    }
}

impl AudioSource for DirectAudioSource {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn load(
        &self,
        source: &Path,
        _workspace: &mut JobWorkspace,
    ) -> Result<AudioSegment, TranscriptionError> {
        self.reader
            .read_audio(source, WHISPER_SAMPLE_RATE)?
            .ok_or_else(|| TranscriptionError::NoAudioTrack(source.to_path_buf()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::audio_error::AudioError;
    use crate::resources::job_workspace::ResourceKind;
    use crate::resources::temp_resource_manager::TempResourceManager;

    struct StubAudioReader {
        segment: Option<AudioSegment>,
    }

    impl AudioReader for StubAudioReader {
        fn read_audio(&self, _: &Path, _: u32) -> Result<Option<AudioSegment>, AudioError> {
            Ok(self.segment.clone())
        }
    }

    #[test]
    fn test_returns_decoded_audio_without_staging() {
        let root = tempfile::tempdir().unwrap();
        let mut job = TempResourceManager::new(root.path()).unwrap().begin_job().unwrap();
        let source = DirectAudioSource::new(Box::new(StubAudioReader {
            segment: Some(AudioSegment::new(vec![0.0; 160], 16000, 1)),
        }));

        let audio = source.load(Path::new("in.mp4"), &mut job).unwrap();
        assert_eq!(audio.samples().len(), 160);
        assert!(job.staged(ResourceKind::ExtractedAudio).is_none());
    }

    #[test]
    fn test_missing_audio_track_is_error() {
        let root = tempfile::tempdir().unwrap();
        let mut job = TempResourceManager::new(root.path()).unwrap().begin_job().unwrap();
        let source = DirectAudioSource::new(Box::new(StubAudioReader { segment: None }));

        let err = source.load(Path::new("silent.mp4"), &mut job).unwrap_err();
        assert!(matches!(err, TranscriptionError::NoAudioTrack(_)));
    }
}
