use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::segments::domain::segment::{Segment, TranscriptionResult};

use super::render_error::RenderError;

/// Props payload handed to the caption composition.
#[derive(Debug, Serialize)]
pub struct RenderProps<'a> {
    pub segments: &'a [Segment],
    #[serde(rename = "videoSrc")]
    pub video_src: String,
}

/// One video plus its captions, bound for the renderer.
///
/// Both paths are absolute because the renderer may run in another
/// working directory.
#[derive(Debug, Clone)]
pub struct RenderJob {
    video_path: PathBuf,
    segments: TranscriptionResult,
    output_path: PathBuf,
}

impl RenderJob {
    pub fn new(
        video_path: &Path,
        segments: TranscriptionResult,
        output_path: &Path,
    ) -> Result<Self, RenderError> {
        Ok(Self {
            video_path: absolute(video_path)?,
            segments,
            output_path: absolute(output_path)?,
        })
    }

    pub fn video_path(&self) -> &Path {
        &self.video_path
    }

    pub fn segments(&self) -> &TranscriptionResult {
        &self.segments
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn props(&self) -> RenderProps<'_> {
        RenderProps {
            segments: self.segments.segments(),
            video_src: self.video_path.to_string_lossy().into_owned(),
        }
    }

    pub fn props_json(&self) -> Result<String, RenderError> {
        serde_json::to_string(&self.props()).map_err(RenderError::Props)
    }
}

fn absolute(path: &Path) -> Result<PathBuf, RenderError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|e| RenderError::ResolvePath {
            path: path.to_path_buf(),
            source: e,
        })
}
