//! Age estimation types.
//!
//! Age is predicted as one of eight coarse buckets. The classifier itself is
//! a backend behind [`crate::infer::InferenceBackend`]; this module holds the
//! shared vocabulary: bucket labels, the score-to-estimate mapping, and the
//! confidence gate. An estimate carries no frame coordinates: the overlay
//! anchors it to wherever the face currently is.

/// Classifier output buckets, in model output order.
pub const AGE_BUCKETS: [&str; 8] = [
    "(0-2)",
    "(4-6)",
    "(8-12)",
    "(15-20)",
    "(25-32)",
    "(38-43)",
    "(48-53)",
    "(60-100)",
];

/// Default minimum confidence for publishing an estimate.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// One age prediction from a face crop.
#[derive(Clone, Debug, PartialEq)]
pub struct AgeEstimate {
    /// Bucket label, e.g. `"(25-32)"`.
    pub bucket: String,
    pub confidence: f32,
}

/// Map raw per-bucket scores to an estimate, applying the confidence gate.
///
/// Returns `None` when the winning score is at or below `threshold`, or the
/// score vector does not match the bucket count; a low-confidence guess is
/// worse than no guess on screen.
pub fn estimate_from_scores(scores: &[f32], threshold: f32) -> Option<AgeEstimate> {
    if scores.len() != AGE_BUCKETS.len() {
        return None;
    }
    let (best, &confidence) = scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))?;
    if confidence <= threshold {
        return None;
    }
    Some(AgeEstimate {
        bucket: AGE_BUCKETS[best].to_string(),
        confidence,
    })
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_highest_scoring_bucket() {
        let mut scores = [0.0f32; 8];
        scores[4] = 0.9;
        let estimate = estimate_from_scores(&scores, 0.5).unwrap();
        assert_eq!(estimate.bucket, "(25-32)");
        assert!((estimate.confidence - 0.9).abs() < 1e-6);
    }

    #[test]
    fn rejects_low_confidence() {
        let mut scores = [0.0f32; 8];
        scores[2] = 0.3;
        assert!(estimate_from_scores(&scores, 0.5).is_none());
    }

    #[test]
    fn rejects_wrong_score_count() {
        assert!(estimate_from_scores(&[1.0, 0.0], 0.5).is_none());
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut scores = [0.0f32; 8];
        scores[0] = 0.5;
        assert!(estimate_from_scores(&scores, 0.5).is_none());
    }
}
