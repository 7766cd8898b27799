use crate::audio::domain::audio_segment::AudioSegment;

use super::transcription_error::TranscriptionError;

/// One span as reported by a recognizer, before trimming or validation.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognizedSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Domain interface for the external speech model.
///
/// Implementations are not assumed to be safe for parallel use; they are
/// driven by a single owner (see `RecognizerWorker`).
pub trait SpeechRecognizer: Send {
    fn model_id(&self) -> &str;

    /// Load model weights. Called at most once before the first
    /// [`SpeechRecognizer::recognize`] when preloading; otherwise the
    /// implementation loads lazily.
    fn load(&mut self) -> Result<(), TranscriptionError> {
        Ok(())
    }

    /// Transcribe mono 16 kHz audio into segments in ascending start order.
    fn recognize(
        &mut self,
        audio: &AudioSegment,
    ) -> Result<Vec<RecognizedSegment>, TranscriptionError>;
}
