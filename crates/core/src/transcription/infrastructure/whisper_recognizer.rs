use std::path::{Path, PathBuf};

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::domain::audio_segment::AudioSegment;
use crate::shared::constants::{WHISPER_BEAM_SIZE, WHISPER_LANGUAGE};
use crate::transcription::domain::speech_recognizer::{RecognizedSegment, SpeechRecognizer};
use crate::transcription::domain::transcription_error::TranscriptionError;

/// Speech recognizer using whisper.cpp via whisper-rs.
///
/// The model is loaded on the first call to `load` or `recognize` and kept
/// for the lifetime of the recognizer.
pub struct WhisperRecognizer {
    model_id: String,
    model_path: PathBuf,
    threads: i32,
    context: Option<WhisperContext>,
}

impl WhisperRecognizer {
    pub fn new(model_id: &str, model_path: &Path) -> Result<Self, TranscriptionError> {
        if !model_path.exists() {
            return Err(TranscriptionError::Model(format!(
                "Whisper model not found at: {}",
                model_path.display()
            )));
        }
        Ok(Self {
            model_id: model_id.to_string(),
            model_path: model_path.to_path_buf(),
            threads: num_cpus().min(4) as i32,
            context: None,
        })
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = threads.max(1) as i32;
        self
    }

    fn context(&mut self) -> Result<&WhisperContext, TranscriptionError> {
        if self.context.is_none() {
            let path = self
                .model_path
                .to_str()
                .ok_or_else(|| TranscriptionError::Model("Invalid model path".to_string()))?;
            log::info!("Loading Whisper model {} from {path}", self.model_id);
            let ctx = WhisperContext::new_with_params(path, WhisperContextParameters::default())
                .map_err(|e| TranscriptionError::Model(format!("Failed to load Whisper model: {e}")))?;
            log::info!("Whisper model loaded");
            self.context = Some(ctx);
        }
        self.context
            .as_ref()
            .ok_or_else(|| TranscriptionError::Model("Whisper model not loaded".to_string()))
    }
}

impl SpeechRecognizer for WhisperRecognizer {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn load(&mut self) -> Result<(), TranscriptionError> {
        self.context().map(|_| ())
    }

    fn recognize(
        &mut self,
        audio: &AudioSegment,
    ) -> Result<Vec<RecognizedSegment>, TranscriptionError> {
        if audio.is_empty() {
            return Ok(Vec::new());
        }
        let threads = self.threads;
        let ctx = self.context()?;

        let mut state = ctx
            .create_state()
            .map_err(|e| TranscriptionError::Model(format!("Failed to create Whisper state: {e}")))?;

        let mut params = FullParams::new(SamplingStrategy::BeamSearch {
            beam_size: WHISPER_BEAM_SIZE,
            patience: -1.0,
        });
        params.set_language(Some(WHISPER_LANGUAGE));
        params.set_translate(false);
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);
        params.set_n_threads(threads);

        state
            .full(params, audio.samples())
            .map_err(|e| TranscriptionError::Model(format!("Whisper inference failed: {e}")))?;

        let mut segments = Vec::new();
        let num_segments = state.full_n_segments();

        for seg_idx in 0..num_segments {
            let segment = match state.get_segment(seg_idx) {
                Some(s) => s,
                None => continue,
            };
            let text = segment
                .to_str_lossy()
                .map_err(|e| TranscriptionError::Model(format!("Invalid segment text: {e}")))?;

            // Segment timestamps are in centiseconds (10ms units)
            segments.push(RecognizedSegment {
                start: segment.start_timestamp() as f64 / 100.0,
                end: segment.end_timestamp() as f64 / 100.0,
                text: text.into_owned(),
            });
        }

        Ok(segments)
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
