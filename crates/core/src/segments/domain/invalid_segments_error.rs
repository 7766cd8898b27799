use thiserror::Error;

use super::segment::SegmentError;

/// A segment list supplied by a caller could not be accepted.
#[derive(Error, Debug)]
pub enum InvalidSegmentsError {
    #[error("malformed segments payload: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("invalid segment at index {index}: {source}")]
    InvalidSegment {
        index: usize,
        #[source]
        source: SegmentError,
    },
    #[error("segments rejected by {validator}: {reason}")]
    Rejected {
        validator: &'static str,
        reason: String,
    },
}
