use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::render::domain::render_error::RenderError;
use crate::render::domain::render_job::RenderJob;
use crate::render::domain::renderer::Renderer;
use crate::render::infrastructure::remotion_renderer::RemotionRenderer;
use crate::render::render_admission::RenderAdmission;
use crate::segments::domain::segment::TranscriptionResult;
use crate::shared::config::RenderConfig;

/// Submits render jobs and checks that a video actually came out.
pub struct RenderOrchestrator {
    renderer: Box<dyn Renderer>,
    admission: RenderAdmission,
    admission_timeout: Option<Duration>,
}

impl RenderOrchestrator {
    pub fn new(
        renderer: Box<dyn Renderer>,
        admission: RenderAdmission,
        admission_timeout: Option<Duration>,
    ) -> Self {
        Self {
            renderer,
            admission,
            admission_timeout,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self::new(
            Box::new(RemotionRenderer::from_config(config)),
            RenderAdmission::new(config.max_concurrent_renders),
            config.admission_timeout(),
        )
    }

    pub fn admission(&self) -> &RenderAdmission {
        &self.admission
    }

    /// Render `segments` over `video` into `output`.
    ///
    /// Anything already at `output` is removed first, so a leftover file can
    /// never pass for a fresh render.
    pub fn render(
        &self,
        video: &Path,
        segments: TranscriptionResult,
        output: &Path,
    ) -> Result<PathBuf, RenderError> {
        let job = RenderJob::new(video, segments, output)?;
        clear_output(job.output_path())?;

        let waited = Instant::now();
        let _permit = self.admission.acquire(self.admission_timeout)?;
        let queued_ms = waited.elapsed().as_millis();
        if queued_ms > 0 {
            log::debug!("Render slot acquired after {queued_ms}ms");
        }

        let started = Instant::now();
        let produced = self.renderer.submit(&job)?;
        verify_output(&produced)?;
        log::info!(
            "Rendered {} in {:.1}s",
            produced.display(),
            started.elapsed().as_secs_f64()
        );
        Ok(produced)
    }
}

fn clear_output(path: &Path) -> Result<(), RenderError> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed stale output {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(RenderError::ClearOutput {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

fn verify_output(path: &Path) -> Result<(), RenderError> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
        _ => Err(RenderError::MissingOutput(path.to_path_buf())),
    }
}
