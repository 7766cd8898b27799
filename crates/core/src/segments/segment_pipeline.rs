use crate::segments::domain::invalid_segments_error::InvalidSegmentsError;
use crate::segments::domain::segment::{RawSegment, Segment, TranscriptionResult};
use crate::segments::domain::segment_validator::{OrderingValidator, SegmentValidator};

/// Carries segments from transcription to rendering, validating anything a
/// caller may have edited in between.
///
/// By default only the per-segment invariant is checked. Ordering and
/// non-overlap are left to the caller unless a validator is registered.
#[derive(Default)]
pub struct SegmentPipeline {
    validators: Vec<Box<dyn SegmentValidator>>,
}

impl SegmentPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator(mut self, validator: Box<dyn SegmentValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    /// Pipeline with [`OrderingValidator`] registered when `enforce_ordering` is set.
    pub fn from_config(enforce_ordering: bool) -> Self {
        let pipeline = Self::new();
        if enforce_ordering {
            pipeline.with_validator(Box::new(OrderingValidator))
        } else {
            pipeline
        }
    }

    /// Decode a JSON array of segment records and validate it.
    pub fn decode(&self, json: &str) -> Result<TranscriptionResult, InvalidSegmentsError> {
        let raw: Vec<RawSegment> =
            serde_json::from_str(json).map_err(InvalidSegmentsError::Malformed)?;
        let segments = raw
            .into_iter()
            .enumerate()
            .map(|(index, r)| {
                Segment::try_from(r)
                    .map_err(|source| InvalidSegmentsError::InvalidSegment { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.validate(segments)
    }

    /// Run the registered validators over already-typed segments.
    pub fn validate(
        &self,
        segments: Vec<Segment>,
    ) -> Result<TranscriptionResult, InvalidSegmentsError> {
        for validator in &self.validators {
            validator.check(&segments)?;
        }
        Ok(TranscriptionResult::new(segments))
    }

    /// Internally produced results are already valid.
    pub fn accept(&self, result: TranscriptionResult) -> TranscriptionResult {
        result
    }
}
