pub mod render_error;
pub mod render_job;
pub mod renderer;
