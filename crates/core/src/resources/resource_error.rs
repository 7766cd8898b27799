use std::path::PathBuf;

use thiserror::Error;

use super::job_workspace::ResourceKind;

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to stage {path}: {source}")]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} already staged for this job")]
    AlreadyStaged(ResourceKind),
    #[error("failed to serialize staged payload: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to release {path}: {source}")]
    Release {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
