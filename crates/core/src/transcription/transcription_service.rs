use std::path::Path;
use std::time::Duration;

use crate::audio::infrastructure::ffmpeg_audio_reader::FfmpegAudioReader;
use crate::audio::infrastructure::wav_audio_writer::WavAudioWriter;
use crate::resources::job_workspace::JobWorkspace;
use crate::segments::domain::segment::{Segment, TranscriptionResult};
use crate::shared::config::TranscriptionStrategy;
use crate::transcription::domain::audio_source::AudioSource;
use crate::transcription::domain::speech_recognizer::RecognizedSegment;
use crate::transcription::domain::transcription_error::TranscriptionError;
use crate::transcription::infrastructure::direct_audio_source::DirectAudioSource;
use crate::transcription::infrastructure::extracted_audio_source::ExtractedAudioSource;
use crate::transcription::infrastructure::recognizer_worker::RecognizerWorker;

/// Turns a staged media file into an ordered list of caption segments.
pub struct TranscriptionService {
    source: Box<dyn AudioSource>,
    recognizer: RecognizerWorker,
    timeout: Option<Duration>,
}

impl TranscriptionService {
    pub fn new(
        source: Box<dyn AudioSource>,
        recognizer: RecognizerWorker,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            source,
            recognizer,
            timeout,
        }
    }

    /// Service backed by ffmpeg decoding with the given strategy.
    pub fn with_strategy(
        strategy: TranscriptionStrategy,
        recognizer: RecognizerWorker,
        timeout: Option<Duration>,
    ) -> Self {
        let source: Box<dyn AudioSource> = match strategy {
            TranscriptionStrategy::Direct => Box::new(DirectAudioSource::new(Box::new(FfmpegAudioReader))),
            TranscriptionStrategy::Extract => Box::new(ExtractedAudioSource::new(
                Box::new(FfmpegAudioReader),
                Box::new(WavAudioWriter),
            )),
        };
        Self::new(source, recognizer, timeout)
    }

    pub fn model_id(&self) -> &str {
        self.recognizer.model_id()
    }

    pub fn strategy_name(&self) -> &'static str {
        self.source.name()
    }

    pub fn transcribe(
        &self,
        source: &Path,
        workspace: &mut JobWorkspace,
    ) -> Result<TranscriptionResult, TranscriptionError> {
        if !source.is_file() {
            return Err(TranscriptionError::SourceNotFound(source.to_path_buf()));
        }

        let audio = self.source.load(source, workspace)?;
        log::info!(
            "[job {}] Transcribing {:.1}s of audio ({} strategy)",
            workspace.id(),
            audio.duration(),
            self.source.name()
        );
        if audio.is_silent() {
            log::warn!("[job {}] Audio track is silent; expect no segments", workspace.id());
        }

        let recognized = self.recognizer.recognize(audio, self.timeout)?;
        let result = normalize(recognized);
        log::info!(
            "[job {}] Transcription complete: {} segments",
            workspace.id(),
            result.len()
        );
        Ok(result)
    }
}

/// Trim text and drop spans that cannot form a valid segment.
fn normalize(recognized: Vec<RecognizedSegment>) -> TranscriptionResult {
    let segments = recognized
        .into_iter()
        .filter_map(|r| match Segment::new(r.start, r.end, r.text.trim()) {
            Ok(segment) => Some(segment),
            Err(e) => {
                log::warn!("Dropping recognized span {:.2}-{:.2}: {e}", r.start, r.end);
                None
            }
        })
        .collect();
    TranscriptionResult::new(segments)
}
