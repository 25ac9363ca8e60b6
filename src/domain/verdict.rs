//! Tampering verdicts.

use serde::{Deserialize, Serialize};

/// Class predicted for an analyzed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Label {
    /// No sign of local editing.
    Authentic,
    /// Regions with a recompression history different from the rest.
    Tampered,
}

impl Label {
    /// Returns the canonical upper-case name of the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Authentic => "AUTHENTIC",
            Label::Tampered => "TAMPERED",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label plus confidence for one analysis run.
///
/// `confidence` is always within `[0, 1]`; a low value is a valid, ambiguous
/// result rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Predicted class.
    pub label: Label,
    /// Probability of `label`.
    pub confidence: f32,
}

impl Verdict {
    /// Creates a verdict, clamping `confidence` into `[0, 1]`.
    pub fn new(label: Label, confidence: f32) -> Self {
        Self {
            label,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// Confidence as a percentage, the way it is shown to operators.
    pub fn confidence_percent(&self) -> f32 {
        self.confidence * 100.0
    }

    /// Returns true if the label is [`Label::Tampered`].
    pub fn is_tampered(&self) -> bool {
        self.label == Label::Tampered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(Verdict::new(Label::Authentic, 1.2).confidence, 1.0);
        assert_eq!(Verdict::new(Label::Tampered, -0.3).confidence, 0.0);
        assert_eq!(Verdict::new(Label::Tampered, 0.75).confidence, 0.75);
    }

    #[test]
    fn test_confidence_percent() {
        let verdict = Verdict::new(Label::Authentic, 0.875);
        assert!((verdict.confidence_percent() - 87.5).abs() < 1e-4);
    }

    #[test]
    fn test_is_tampered() {
        assert!(Verdict::new(Label::Tampered, 0.6).is_tampered());
        assert!(!Verdict::new(Label::Authentic, 0.6).is_tampered());
    }

    #[test]
    fn test_label_serializes_upper_case() {
        let json = serde_json::to_string(&Verdict::new(Label::Tampered, 0.5)).unwrap();
        assert_eq!(json, r#"{"label":"TAMPERED","confidence":0.5}"#);
        let label: Label = serde_json::from_str("\"AUTHENTIC\"").unwrap();
        assert_eq!(label, Label::Authentic);
    }
}
