pub mod domain;
pub mod infrastructure;
pub mod transcription_service;
