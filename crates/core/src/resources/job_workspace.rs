use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::TempDir;
use uuid::Uuid;

use super::resource_error::ResourceError;

/// Unique identifier of one job; keys every file the job stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// The kinds of input a job may stage, at most one of each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Upload,
    ExtractedAudio,
    SegmentPayload,
}

impl ResourceKind {
    fn file_stem(&self) -> &'static str {
        match self {
            ResourceKind::Upload => "upload",
            ResourceKind::ExtractedAudio => "audio",
            ResourceKind::SegmentPayload => "segments",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_stem())
    }
}

const FALLBACK_EXTENSION: &str = "bin";
const MAX_EXTENSION_LEN: usize = 8;

/// Scratch directory holding every input file of a single job.
///
/// The directory and everything in it is removed by [`JobWorkspace::release`]
/// or, failing that, when the workspace is dropped. File names come from the
/// resource kind only; an upload's original name contributes at most its
/// extension.
pub struct JobWorkspace {
    id: JobId,
    path: PathBuf,
    dir: Option<TempDir>,
    staged: HashMap<ResourceKind, PathBuf>,
}

impl JobWorkspace {
    pub(crate) fn new(id: JobId, dir: TempDir) -> Self {
        Self {
            id,
            path: dir.path().to_path_buf(),
            dir: Some(dir),
            staged: HashMap::new(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Claim the path for `kind` without creating the file.
    pub fn reserve(&mut self, kind: ResourceKind, extension: &str) -> Result<PathBuf, ResourceError> {
        if self.staged.contains_key(&kind) {
            return Err(ResourceError::AlreadyStaged(kind));
        }
        let path = self.path.join(format!("{}.{extension}", kind.file_stem()));
        self.staged.insert(kind, path.clone());
        Ok(path)
    }

    /// Write `bytes` as the `kind` resource. Only the extension of
    /// `original_name` is kept.
    pub fn stage_bytes(
        &mut self,
        kind: ResourceKind,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<PathBuf, ResourceError> {
        let extension = original_name
            .and_then(sanitized_extension)
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
        let path = self.reserve(kind, &extension)?;
        fs::write(&path, bytes).map_err(|e| ResourceError::Stage {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    pub fn stage_json<T: Serialize + ?Sized>(
        &mut self,
        kind: ResourceKind,
        value: &T,
    ) -> Result<PathBuf, ResourceError> {
        let json = serde_json::to_vec(value).map_err(ResourceError::Serialize)?;
        let path = self.reserve(kind, "json")?;
        fs::write(&path, json).map_err(|e| ResourceError::Stage {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    pub fn staged(&self, kind: ResourceKind) -> Option<&Path> {
        self.staged.get(&kind).map(PathBuf::as_path)
    }

    /// Remove the workspace directory and everything staged in it.
    pub fn release(mut self) -> Result<(), ResourceError> {
        match self.dir.take() {
            Some(dir) => dir.close().map_err(|e| ResourceError::Release {
                path: self.path.clone(),
                source: e,
            }),
            None => Ok(()),
        }
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                log::warn!("[job {}] failed to release {}: {e}", self.id, self.path.display());
            }
        }
    }
}

fn sanitized_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn workspace() -> (TempDir, JobWorkspace) {
        let root = tempfile::tempdir().unwrap();
        let dir = tempfile::Builder::new()
            .prefix("job-")
            .tempdir_in(root.path())
            .unwrap();
        (root, JobWorkspace::new(JobId::new(), dir))
    }

    #[rstest]
    #[case("clip.MP4", Some("mp4"))]
    #[case("archive.tar.gz", Some("gz"))]
    #[case("noext", None)]
    #[case("../../etc/passwd", None)]
    #[case("weird.m p4", None)]
    #[case("long.abcdefghijk", None)]
    fn test_sanitized_extension(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(sanitized_extension(name).as_deref(), expected);
    }

    #[test]
    fn test_stage_bytes_ignores_original_file_name() {
        let (_root, mut ws) = workspace();
        let path = ws
            .stage_bytes(ResourceKind::Upload, Some("my holiday.mov"), b"data")
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "upload.mov");
        assert_eq!(path.parent().unwrap(), ws.path());
        assert_eq!(fs::read(&path).unwrap(), b"data");
    }

    #[test]
    fn test_stage_without_name_uses_fallback_extension() {
        let (_root, mut ws) = workspace();
        let path = ws.stage_bytes(ResourceKind::Upload, None, b"x").unwrap();
        assert_eq!(path.extension().unwrap(), "bin");
    }

    #[test]
    fn test_same_kind_twice_is_rejected() {
        let (_root, mut ws) = workspace();
        ws.reserve(ResourceKind::ExtractedAudio, "wav").unwrap();
        let err = ws.reserve(ResourceKind::ExtractedAudio, "wav").unwrap_err();
        assert!(matches!(err, ResourceError::AlreadyStaged(ResourceKind::ExtractedAudio)));
    }

    #[test]
    fn test_stage_json_writes_payload() {
        let (_root, mut ws) = workspace();
        let path = ws
            .stage_json(ResourceKind::SegmentPayload, &serde_json::json!([{"a": 1}]))
            .unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), r#"[{"a":1}]"#);
        assert!(ws.staged(ResourceKind::SegmentPayload).is_some());
    }

    #[test]
    fn test_release_removes_everything() {
        let (_root, mut ws) = workspace();
        let upload = ws.stage_bytes(ResourceKind::Upload, Some("a.mp4"), b"v").unwrap();
        let payload = ws.stage_json(ResourceKind::SegmentPayload, &Vec::<u8>::new()).unwrap();
        let dir = ws.path().to_path_buf();

        ws.release().unwrap();

        assert!(!upload.exists());
        assert!(!payload.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn test_drop_removes_everything() {
        let (_root, mut ws) = workspace();
        let upload = ws.stage_bytes(ResourceKind::Upload, Some("a.mp4"), b"v").unwrap();
        let dir = ws.path().to_path_buf();

        drop(ws);

        assert!(!upload.exists());
        assert!(!dir.exists());
    }

    #[test]
    fn test_job_ids_are_unique() {
        assert_ne!(JobId::new(), JobId::new());
    }
}
