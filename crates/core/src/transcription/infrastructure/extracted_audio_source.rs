use std::path::Path;

use crate::audio::domain::audio_reader::AudioReader;
use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::audio_writer::AudioWriter;
use crate::resources::job_workspace::{JobWorkspace, ResourceKind};
use crate::shared::constants::WHISPER_SAMPLE_RATE;
use crate::transcription::domain::audio_source::AudioSource;
use crate::transcription::domain::transcription_error::TranscriptionError;

/// Extracts the audio track to a WAV file in the job workspace, then
/// transcribes from that file.
pub struct ExtractedAudioSource {
    reader: Box<dyn AudioReader>,
    writer: Box<dyn AudioWriter>,
}

impl ExtractedAudioSource {
    pub fn new(reader: Box<dyn AudioReader>, writer: Box<dyn AudioWriter>) -> Self {
        Self { reader, writer }
    }
}

impl AudioSource for ExtractedAudioSource {
    fn name(&self) -> &'static str {
        "extract"
    }

    fn load(
        &self,
        source: &Path,
        workspace: &mut JobWorkspace,
    ) -> Result<AudioSegment, TranscriptionError> {
        log::info!("[job {}] Extracting audio from {}", workspace.id(), source.display());
        let track = self
            .reader
            .read_audio(source, WHISPER_SAMPLE_RATE)?
            .ok_or_else(|| TranscriptionError::NoAudioTrack(source.to_path_buf()))?;

        let audio_path = workspace
            .reserve(ResourceKind::ExtractedAudio, "wav")
            .map_err(TranscriptionError::Staging)?;
        self.writer.write_audio(&audio_path, &track)?;
        drop(track);

        self.reader
            .read_audio(&audio_path, WHISPER_SAMPLE_RATE)?
            .ok_or(TranscriptionError::NoAudioTrack(audio_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::domain::audio_error::AudioError;
    use crate::resources::temp_resource_manager::TempResourceManager;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    struct RecordingReader {
        reads: Arc<Mutex<Vec<PathBuf>>>,
        segment: Option<AudioSegment>,
    }

    impl AudioReader for RecordingReader {
        fn read_audio(&self, path: &Path, _: u32) -> Result<Option<AudioSegment>, AudioError> {
            self.reads.lock().unwrap().push(path.to_path_buf());
            Ok(self.segment.clone())
        }
    }

    struct TouchWriter;

    impl AudioWriter for TouchWriter {
        fn write_audio(&self, path: &Path, _: &AudioSegment) -> Result<(), AudioError> {
            std::fs::write(path, b"RIFF").unwrap();
            Ok(())
        }
    }

    #[test]
    fn test_transcribes_from_staged_wav() {
        let root = tempfile::tempdir().unwrap();
        let mut job = TempResourceManager::new(root.path()).unwrap().begin_job().unwrap();
        let reads = Arc::new(Mutex::new(Vec::new()));
        let source = ExtractedAudioSource::new(
            Box::new(RecordingReader {
                reads: reads.clone(),
                segment: Some(AudioSegment::new(vec![0.0; 32], 16000, 1)),
            }),
            Box::new(TouchWriter),
        );

        source.load(Path::new("video.mp4"), &mut job).unwrap();

        let staged = job.staged(ResourceKind::ExtractedAudio).unwrap().to_path_buf();
        assert!(staged.exists());
        assert_eq!(staged.extension().unwrap(), "wav");
        let reads = reads.lock().unwrap();
        assert_eq!(reads.as_slice(), &[PathBuf::from("video.mp4"), staged.clone()]);

        drop(job);
        assert!(!staged.exists());
    }

    #[test]
    fn test_video_without_audio_stages_nothing() {
        let root = tempfile::tempdir().unwrap();
        let mut job = TempResourceManager::new(root.path()).unwrap().begin_job().unwrap();
        let source = ExtractedAudioSource::new(
            Box::new(RecordingReader {
                reads: Arc::new(Mutex::new(Vec::new())),
                segment: None,
            }),
            Box::new(TouchWriter),
        );

        let err = source.load(Path::new("video.mp4"), &mut job).unwrap_err();
        assert!(matches!(err, TranscriptionError::NoAudioTrack(_)));
        assert!(job.staged(ResourceKind::ExtractedAudio).is_none());
    }
}
