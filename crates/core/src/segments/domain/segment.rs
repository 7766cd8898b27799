use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    #[error("timestamps must be finite numbers")]
    NonFinite,
    #[error("end ({end}) must be greater than start ({start})")]
    EndNotAfterStart { start: f64, end: f64 },
    #[error("text is empty")]
    EmptyText,
}

/// A timed span of caption text, in seconds.
///
/// Always satisfies `end > start` and has non-blank text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSegment")]
pub struct Segment {
    start: f64,
    end: f64,
    text: String,
}

/// Wire shape of a segment record before its invariant is checked.
#[derive(Clone, Debug, Deserialize)]
pub struct RawSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Result<Self, SegmentError> {
        let text = text.into();
        if !start.is_finite() || !end.is_finite() {
            return Err(SegmentError::NonFinite);
        }
        if end <= start {
            return Err(SegmentError::EndNotAfterStart { start, end });
        }
        if text.trim().is_empty() {
            return Err(SegmentError::EmptyText);
        }
        Ok(Self { start, end, text })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn overlaps(&self, other: &Segment) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl TryFrom<RawSegment> for Segment {
    type Error = SegmentError;

    fn try_from(raw: RawSegment) -> Result<Self, Self::Error> {
        Segment::new(raw.start, raw.end, raw.text)
    }
}

/// Ordered segments for one media source. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranscriptionResult {
    segments: Vec<Segment>,
}

impl TranscriptionResult {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_keeps_fields() {
        let s = Segment::new(1.0, 2.5, "hello").unwrap();
        assert_eq!(s.start(), 1.0);
        assert_eq!(s.end(), 2.5);
        assert_eq!(s.text(), "hello");
    }

    #[rstest]
    #[case::equal_bounds(1.0, 1.0, "x")]
    #[case::reversed(2.0, 1.0, "x")]
    fn test_end_must_follow_start(#[case] start: f64, #[case] end: f64, #[case] text: &str) {
        assert!(matches!(
            Segment::new(start, end, text),
            Err(SegmentError::EndNotAfterStart { .. })
        ));
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace("  \n\t ")]
    fn test_blank_text_rejected(#[case] text: &str) {
        assert_eq!(Segment::new(0.0, 1.0, text), Err(SegmentError::EmptyText));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert_eq!(
            Segment::new(f64::NAN, 1.0, "x"),
            Err(SegmentError::NonFinite)
        );
        assert_eq!(
            Segment::new(0.0, f64::INFINITY, "x"),
            Err(SegmentError::NonFinite)
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Segment = serde_json::from_str(r#"{"start":0,"end":2,"text":"Hi"}"#).unwrap();
        assert_eq!(ok.text(), "Hi");

        let bad = serde_json::from_str::<Segment>(r#"{"start":2,"end":2,"text":"Hi"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_serialize_shape() {
        let s = Segment::new(0.0, 2.0, "Hi").unwrap();
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json, serde_json::json!({"start": 0.0, "end": 2.0, "text": "Hi"}));
    }

    #[test]
    fn test_overlaps() {
        let a = Segment::new(0.0, 2.0, "a").unwrap();
        let b = Segment::new(1.5, 3.0, "b").unwrap();
        let c = Segment::new(2.0, 3.0, "c").unwrap();
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_result_serializes_as_bare_array() {
        let result = TranscriptionResult::new(vec![
            Segment::new(0.0, 1.0, "hello").unwrap(),
            Segment::new(1.0, 2.0, "world").unwrap(),
        ]);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.starts_with('['));
        assert_eq!(result.len(), 2);
    }
}
