use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::render::render_orchestrator::RenderOrchestrator;
use crate::resources::job_workspace::{JobWorkspace, ResourceKind};
use crate::resources::output_artifact::OutputArtifact;
use crate::resources::temp_resource_manager::TempResourceManager;
use crate::segments::domain::segment::TranscriptionResult;
use crate::segments::segment_pipeline::SegmentPipeline;
use crate::shared::config::CaptionerConfig;
use crate::shared::model_resolver::{self, ModelLocation, ProgressFn};
use crate::transcription::infrastructure::recognizer_worker::RecognizerWorker;
use crate::transcription::infrastructure::whisper_recognizer::WhisperRecognizer;
use crate::transcription::transcription_service::TranscriptionService;

use super::job_error::{JobError, SetupError};
use super::job_timings::JobTimings;

/// A media file received from a client.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Name the client gave the file. Only its extension is ever used.
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// Transcribe-then-render workflow shared by the HTTP service and the CLI.
///
/// Each call is one job with its own workspace; the workspace is released
/// before the call returns, whatever the outcome.
pub struct CaptionPipeline {
    transcription: TranscriptionService,
    segments: SegmentPipeline,
    renderer: RenderOrchestrator,
    resources: TempResourceManager,
}

impl CaptionPipeline {
    pub fn new(
        transcription: TranscriptionService,
        segments: SegmentPipeline,
        renderer: RenderOrchestrator,
        resources: TempResourceManager,
    ) -> Self {
        Self {
            transcription,
            segments,
            renderer,
            resources,
        }
    }

    /// Resolve the speech model, start the recognizer and wire up the
    /// Remotion renderer as described by `config`.
    pub fn from_config(config: &CaptionerConfig) -> Result<Self, SetupError> {
        let model_path = model_resolver::resolve(
            &ModelLocation {
                name: &config.model.file_name,
                url: &config.model.url,
                explicit: config.model.path.as_deref(),
                bundled_dir: config.model.bundled_dir.as_deref(),
            },
            Some(download_progress()),
        )?;
        log::info!("Using speech model {}", model_path.display());

        let mut recognizer = WhisperRecognizer::new(&config.model.id, &model_path)?;
        if let Some(threads) = config.transcription.threads {
            recognizer = recognizer.with_threads(threads);
        }
        let worker = RecognizerWorker::spawn(Box::new(recognizer), config.model.preload)?;

        Ok(Self::new(
            TranscriptionService::with_strategy(
                config.transcription.strategy,
                worker,
                config.transcription.timeout(),
            ),
            SegmentPipeline::from_config(config.segments.enforce_ordering),
            RenderOrchestrator::from_config(&config.render),
            TempResourceManager::new(&config.work_dir())?,
        ))
    }

    pub fn model_id(&self) -> &str {
        self.transcription.model_id()
    }

    pub fn resources(&self) -> &TempResourceManager {
        &self.resources
    }

    pub fn transcribe_upload(&self, upload: &Upload) -> Result<TranscriptionResult, JobError> {
        self.in_job("transcribe", |workspace, timings| {
            let source = timings.time("stage", || {
                workspace.stage_bytes(ResourceKind::Upload, upload.file_name.as_deref(), &upload.bytes)
            })?;
            let result = timings.time("transcribe", || self.transcription.transcribe(&source, workspace))?;
            Ok(self.segments.accept(result))
        })
    }

    /// Render client-edited `segments_json` over the uploaded video.
    ///
    /// The returned artifact owns the rendered file; dropping it deletes it.
    pub fn render_upload(
        &self,
        upload: &Upload,
        segments_json: &str,
    ) -> Result<OutputArtifact, JobError> {
        self.in_job("render", |workspace, timings| {
            let segments = timings.time("validate", || self.segments.decode(segments_json))?;
            let video = timings.time("stage", || -> Result<PathBuf, JobError> {
                let video = workspace.stage_bytes(
                    ResourceKind::Upload,
                    upload.file_name.as_deref(),
                    &upload.bytes,
                )?;
                workspace.stage_json(ResourceKind::SegmentPayload, &segments)?;
                Ok(video)
            })?;

            let output = self.resources.create_output(workspace);
            timings.time("render", || self.renderer.render(&video, segments, output.path()))?;
            Ok(output)
        })
    }

    /// Transcribe `video` and write the segments as a pretty-printed JSON array.
    pub fn transcribe_to_file(
        &self,
        video: &Path,
        segments_path: &Path,
    ) -> Result<TranscriptionResult, JobError> {
        if !video.is_file() {
            return Err(JobError::InputNotFound(video.to_path_buf()));
        }
        let result = self.in_job("transcribe", |workspace, timings| {
            let result = timings.time("transcribe", || self.transcription.transcribe(video, workspace))?;
            Ok(self.segments.accept(result))
        })?;

        let write_err = |e: std::io::Error| JobError::WriteOutput {
            path: segments_path.to_path_buf(),
            source: e,
        };
        let json = serde_json::to_string_pretty(&result).map_err(|e| write_err(e.into()))?;
        fs::write(segments_path, json).map_err(write_err)?;
        log::info!(
            "Wrote {} segments to {}",
            result.len(),
            segments_path.display()
        );
        Ok(result)
    }

    /// Render `video` with the segments stored in `segments_path`.
    pub fn render_from_file(
        &self,
        video: &Path,
        segments_path: &Path,
        output: &Path,
    ) -> Result<PathBuf, JobError> {
        if !video.is_file() {
            return Err(JobError::InputNotFound(video.to_path_buf()));
        }
        let json = fs::read_to_string(segments_path).map_err(|e| JobError::ReadInput {
            path: segments_path.to_path_buf(),
            source: e,
        })?;

        self.in_job("render", |_, timings| {
            let segments = timings.time("validate", || self.segments.decode(&json))?;
            let produced = timings.time("render", || self.renderer.render(video, segments, output))?;
            Ok(produced)
        })
    }

    /// Transcribe into `segments_path`, then render from it into `output`.
    pub fn run(
        &self,
        video: &Path,
        segments_path: &Path,
        output: &Path,
    ) -> Result<PathBuf, JobError> {
        log::info!("Step 1: transcribing {}", video.display());
        self.transcribe_to_file(video, segments_path)?;
        log::info!("Step 2: rendering {}", output.display());
        self.render_from_file(video, segments_path, output)
    }

    fn in_job<T>(
        &self,
        label: &'static str,
        body: impl FnOnce(&mut JobWorkspace, &mut JobTimings) -> Result<T, JobError>,
    ) -> Result<T, JobError> {
        let mut workspace = self.resources.begin_job()?;
        let id = workspace.id();
        let mut timings = JobTimings::new(id, label);

        let result = body(&mut workspace, &mut timings);

        if let Err(e) = workspace.release() {
            log::warn!("[job {id}] {e}");
        }
        match &result {
            Ok(_) => timings.log_summary(),
            Err(e) => log::error!("[job {id}] {label} failed: {e}"),
        }
        result
    }
}

/// Logs model download progress in 10% steps.
fn download_progress() -> ProgressFn {
    let last_decile = Cell::new(0u64);
    Box::new(move |done, total| {
        if total == 0 {
            return;
        }
        let decile = done * 10 / total;
        if decile > last_decile.get() {
            last_decile.set(decile);
            log::info!("Downloading model: {}%", decile * 10);
        }
    })
}
