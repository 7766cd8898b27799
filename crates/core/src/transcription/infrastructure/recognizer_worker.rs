use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::audio::domain::audio_segment::AudioSegment;
use crate::transcription::domain::speech_recognizer::{RecognizedSegment, SpeechRecognizer};
use crate::transcription::domain::transcription_error::TranscriptionError;

type Reply = Result<Vec<RecognizedSegment>, TranscriptionError>;

struct Request {
    audio: AudioSegment,
    reply: Sender<Reply>,
}

/// Handle to the process-wide speech recognizer.
///
/// The recognizer lives on one dedicated thread and handles requests one at
/// a time in arrival order, so the model is never entered concurrently.
/// Handles are cheap to clone; the thread exits once every handle is dropped.
#[derive(Clone)]
pub struct RecognizerWorker {
    requests: Sender<Request>,
    model_id: String,
}

impl RecognizerWorker {
    /// Move `recognizer` onto its worker thread. With `preload`, the model is
    /// loaded before this returns and a load failure is reported here.
    pub fn spawn(
        mut recognizer: Box<dyn SpeechRecognizer>,
        preload: bool,
    ) -> Result<Self, TranscriptionError> {
        let model_id = recognizer.model_id().to_string();
        let (requests, inbox) = crossbeam_channel::unbounded::<Request>();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), TranscriptionError>>(1);

        thread::Builder::new()
            .name("speech-recognizer".to_string())
            .spawn(move || {
                let loaded = if preload { recognizer.load() } else { Ok(()) };
                let failed = loaded.is_err();
                let _ = ready_tx.send(loaded);
                if !failed {
                    serve(recognizer, inbox);
                }
            })
            .map_err(|e| TranscriptionError::Model(format!("Failed to start recognizer thread: {e}")))?;

        ready_rx
            .recv()
            .map_err(|_| TranscriptionError::WorkerUnavailable)??;

        Ok(Self { requests, model_id })
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Queue `audio` for recognition and wait for the answer.
    ///
    /// On timeout the request is abandoned from the caller's side only; the
    /// worker still finishes it before taking the next one.
    pub fn recognize(&self, audio: AudioSegment, timeout: Option<Duration>) -> Reply {
        let (reply, answer) = crossbeam_channel::bounded(1);
        self.requests
            .send(Request { audio, reply })
            .map_err(|_| TranscriptionError::WorkerUnavailable)?;

        match timeout {
            Some(limit) => match answer.recv_timeout(limit) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => Err(TranscriptionError::Timeout(limit)),
                Err(RecvTimeoutError::Disconnected) => Err(TranscriptionError::WorkerUnavailable),
            },
            None => answer
                .recv()
                .unwrap_or(Err(TranscriptionError::WorkerUnavailable)),
        }
    }
}

fn serve(mut recognizer: Box<dyn SpeechRecognizer>, inbox: Receiver<Request>) {
    for request in inbox {
        let result = recognizer.recognize(&request.audio);
        if request.reply.send(result).is_err() {
            log::warn!("Transcription finished after its caller gave up; result discarded");
        }
    }
    log::debug!("Speech recognizer thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct StubRecognizer {
        active: Arc<AtomicUsize>,
        max_active: Arc<AtomicUsize>,
        loads: Arc<AtomicUsize>,
        delay: Duration,
        fail_load: bool,
    }

    impl StubRecognizer {
        fn new(delay: Duration) -> Self {
            Self {
                active: Arc::new(AtomicUsize::new(0)),
                max_active: Arc::new(AtomicUsize::new(0)),
                loads: Arc::new(AtomicUsize::new(0)),
                delay,
                fail_load: false,
            }
        }
    }

    impl SpeechRecognizer for StubRecognizer {
        fn model_id(&self) -> &str {
            "stub"
        }

        fn load(&mut self) -> Result<(), TranscriptionError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail_load {
                Err(TranscriptionError::Model("corrupt weights".to_string()))
            } else {
                Ok(())
            }
        }

        fn recognize(&mut self, audio: &AudioSegment) -> Reply {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            thread::sleep(self.delay);
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(vec![RecognizedSegment {
                start: 0.0,
                end: audio.duration(),
                text: " hello ".to_string(),
            }])
        }
    }

    fn one_second() -> AudioSegment {
        AudioSegment::new(vec![0.0; 16000], 16000, 1)
    }

    #[test]
    fn test_recognize_returns_segments() {
        let worker = RecognizerWorker::spawn(Box::new(StubRecognizer::new(Duration::ZERO)), false)
            .unwrap();
        let segments = worker.recognize(one_second(), None).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].end, 1.0);
        assert_eq!(worker.model_id(), "stub");
    }

    #[test]
    fn test_concurrent_callers_are_serialized() {
        let stub = StubRecognizer::new(Duration::from_millis(20));
        let max_active = stub.max_active.clone();
        let worker = RecognizerWorker::spawn(Box::new(stub), false).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let worker = worker.clone();
                thread::spawn(move || worker.recognize(one_second(), None))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_ok());
        }

        assert_eq!(max_active.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_preload_loads_once() {
        let stub = StubRecognizer::new(Duration::ZERO);
        let loads = stub.loads.clone();
        let worker = RecognizerWorker::spawn(Box::new(stub), true).unwrap();
        worker.recognize(one_second(), None).unwrap();
        worker.recognize(one_second(), None).unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_preload_failure_surfaces_at_spawn() {
        let mut stub = StubRecognizer::new(Duration::ZERO);
        stub.fail_load = true;
        let result = RecognizerWorker::spawn(Box::new(stub), true);
        assert!(matches!(result, Err(TranscriptionError::Model(_))));
    }

    #[test]
    fn test_timeout_fails_the_caller() {
        let worker =
            RecognizerWorker::spawn(Box::new(StubRecognizer::new(Duration::from_millis(300))), false)
                .unwrap();
        let result = worker.recognize(one_second(), Some(Duration::from_millis(10)));
        assert!(matches!(result, Err(TranscriptionError::Timeout(_))));

        // The worker is still usable afterwards.
        assert!(worker.recognize(one_second(), None).is_ok());
    }
}
