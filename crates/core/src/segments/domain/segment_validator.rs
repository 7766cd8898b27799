use super::invalid_segments_error::InvalidSegmentsError;
use super::segment::Segment;

/// Cross-segment check applied to caller-supplied segment lists.
///
/// Per-segment invariants are enforced by [`Segment`] itself; validators
/// cover properties of the whole sequence.
pub trait SegmentValidator: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, segments: &[Segment]) -> Result<(), InvalidSegmentsError>;
}

/// Requires ascending start times and no overlap between neighbours.
pub struct OrderingValidator;

impl SegmentValidator for OrderingValidator {
    fn name(&self) -> &'static str {
        "ordering"
    }

    fn check(&self, segments: &[Segment]) -> Result<(), InvalidSegmentsError> {
        for (i, pair) in segments.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.start() < prev.start() {
                return Err(InvalidSegmentsError::Rejected {
                    validator: self.name(),
                    reason: format!(
                        "segment {} starts at {} before segment {} at {}",
                        i + 1,
                        next.start(),
                        i,
                        prev.start()
                    ),
                });
            }
            if prev.overlaps(next) {
                return Err(InvalidSegmentsError::Rejected {
                    validator: self.name(),
                    reason: format!("segment {} overlaps segment {}", i + 1, i),
                });
            }
        }
        Ok(())
    }
}
