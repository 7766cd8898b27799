pub mod domain;
pub mod segment_pipeline;
