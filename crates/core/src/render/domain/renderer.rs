use std::path::PathBuf;

use super::render_error::RenderError;
use super::render_job::RenderJob;

/// Domain interface for the external rendering engine.
///
/// `submit` blocks until the engine is done and returns the path it claims
/// to have written. Callers must not trust that claim without checking it.
pub trait Renderer: Send + Sync {
    fn submit(&self, job: &RenderJob) -> Result<PathBuf, RenderError>;
}
