pub mod caption_pipeline;
pub mod job_error;
pub mod job_timings;
