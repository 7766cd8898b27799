pub mod invalid_segments_error;
pub mod segment;
pub mod segment_validator;
