pub mod direct_audio_source;
pub mod extracted_audio_source;
pub mod recognizer_worker;
pub mod whisper_recognizer;
