use std::fs;
use std::path::{Path, PathBuf};

use super::job_workspace::{JobId, JobWorkspace};
use super::output_artifact::OutputArtifact;
use super::resource_error::ResourceError;
use crate::shared::constants::OUTPUT_VIDEO_EXTENSION;

const JOB_DIR_PREFIX: &str = "job-";
const OUTPUT_PREFIX: &str = "render-";
const OUTPUTS_DIR: &str = "outputs";

/// Counts of leftovers removed by [`TempResourceManager::sweep_stale`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub workspaces: usize,
    pub outputs: usize,
}

/// Hands out per-job workspaces and output paths under one root directory.
///
/// Layout:
/// - `<root>/job-<id>-XXXX/` one directory per job, removed when the job ends
/// - `<root>/outputs/render-<id>.mp4` rendered videos, owned by the response layer
#[derive(Debug, Clone)]
pub struct TempResourceManager {
    root: PathBuf,
    outputs: PathBuf,
}

impl TempResourceManager {
    pub fn new(root: &Path) -> Result<Self, ResourceError> {
        let outputs = root.join(OUTPUTS_DIR);
        fs::create_dir_all(&outputs).map_err(|e| ResourceError::CreateDir {
            path: outputs.clone(),
            source: e,
        })?;
        Ok(Self {
            root: root.to_path_buf(),
            outputs,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn outputs_dir(&self) -> &Path {
        &self.outputs
    }

    pub fn begin_job(&self) -> Result<JobWorkspace, ResourceError> {
        let id = JobId::new();
        let dir = tempfile::Builder::new()
            .prefix(&format!("{JOB_DIR_PREFIX}{id}-"))
            .tempdir_in(&self.root)
            .map_err(|e| ResourceError::CreateDir {
                path: self.root.clone(),
                source: e,
            })?;
        log::debug!("[job {id}] workspace {}", dir.path().display());
        Ok(JobWorkspace::new(id, dir))
    }

    /// Output location for `job`'s rendered video. The file does not exist yet.
    pub fn create_output(&self, job: &JobWorkspace) -> OutputArtifact {
        OutputArtifact::new(
            self.outputs
                .join(format!("{OUTPUT_PREFIX}{}.{OUTPUT_VIDEO_EXTENSION}", job.id())),
        )
    }

    /// Remove workspaces and outputs left behind by a previous process.
    ///
    /// Only call this before any job starts: it does not know which entries
    /// belong to live jobs.
    pub fn sweep_stale(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for path in entries_with_prefix(&self.root, JOB_DIR_PREFIX) {
            if path.is_dir() {
                match fs::remove_dir_all(&path) {
                    Ok(()) => report.workspaces += 1,
                    Err(e) => log::warn!("Failed to remove stale {}: {e}", path.display()),
                }
            }
        }
        for path in entries_with_prefix(&self.outputs, OUTPUT_PREFIX) {
            if path.is_file() {
                match fs::remove_file(&path) {
                    Ok(()) => report.outputs += 1,
                    Err(e) => log::warn!("Failed to remove stale {}: {e}", path.display()),
                }
            }
        }

        report
    }
}

fn entries_with_prefix(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot list {}: {e}", dir.display());
            return Vec::new();
        }
    };
    entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(prefix))
        .map(|entry| entry.path())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::job_workspace::ResourceKind;

    fn manager() -> (tempfile::TempDir, TempResourceManager) {
        let root = tempfile::tempdir().unwrap();
        let manager = TempResourceManager::new(root.path()).unwrap();
        (root, manager)
    }

    #[test]
    fn test_new_creates_outputs_dir() {
        let (_root, manager) = manager();
        assert!(manager.outputs_dir().is_dir());
    }

    #[test]
    fn test_identical_upload_names_never_collide() {
        let (_root, manager) = manager();
        let mut a = manager.begin_job().unwrap();
        let mut b = manager.begin_job().unwrap();

        let path_a = a.stage_bytes(ResourceKind::Upload, Some("clip.mp4"), b"first").unwrap();
        let path_b = b.stage_bytes(ResourceKind::Upload, Some("clip.mp4"), b"second").unwrap();

        assert_ne!(path_a, path_b);
        assert_eq!(fs::read(&path_a).unwrap(), b"first");
        assert_eq!(fs::read(&path_b).unwrap(), b"second");
    }

    #[test]
    fn test_concurrent_jobs_stage_independently() {
        let (_root, manager) = manager();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let manager = manager.clone();
                std::thread::spawn(move || {
                    let mut job = manager.begin_job().unwrap();
                    let payload = format!("job {i}");
                    let path = job
                        .stage_bytes(ResourceKind::Upload, Some("same.mp4"), payload.as_bytes())
                        .unwrap();
                    let read_back = fs::read_to_string(&path).unwrap();
                    job.release().unwrap();
                    (read_back, payload, path)
                })
            })
            .collect();

        for handle in handles {
            let (read_back, payload, path) = handle.join().unwrap();
            assert_eq!(read_back, payload);
            assert!(!path.exists());
        }
    }

    #[test]
    fn test_output_is_keyed_by_job_and_outside_workspace() {
        let (_root, manager) = manager();
        let job = manager.begin_job().unwrap();
        let output = manager.create_output(&job);

        assert!(output.path().starts_with(manager.outputs_dir()));
        assert!(output
            .path()
            .to_string_lossy()
            .contains(&job.id().to_string()));

        let output_path = output.path().to_path_buf();
        fs::write(&output_path, b"video").unwrap();
        job.release().unwrap();
        assert!(output_path.exists());
        drop(output);
        assert!(!output_path.exists());
    }

    #[test]
    fn test_sweep_removes_leftovers_only() {
        let (root, manager) = manager();
        let job = manager.begin_job().unwrap();
        let leaked_dir = job.path().to_path_buf();
        let leaked_output = manager.create_output(&job).keep();
        fs::write(&leaked_output, b"video").unwrap();
        std::mem::forget(job);

        let unrelated = root.path().join("keep-me.txt");
        fs::write(&unrelated, b"x").unwrap();

        let report = manager.sweep_stale();
        assert_eq!(
            report,
            SweepReport {
                workspaces: 1,
                outputs: 1
            }
        );
        assert!(!leaked_dir.exists());
        assert!(!leaked_output.exists());
        assert!(unrelated.exists());
    }
}
