//! Detection output -> [`MarkRecord`]s.

use crate::types::{DetectorLabel, MarkClass, MarkRecord, RawDetection};

/// Maps a source label to its grading class. `checkmark_policy` decides how
/// checkmarks are scored; unrecognized labels become `Unknown`.
pub fn classify(label: DetectorLabel, checkmark_policy: MarkClass) -> MarkClass {
    match label {
        DetectorLabel::Circle => MarkClass::Correct,
        DetectorLabel::Cross => MarkClass::Incorrect,
        DetectorLabel::Triangle => MarkClass::Partial,
        DetectorLabel::Checkmark => checkmark_policy,
        DetectorLabel::Unrecognized => MarkClass::Unknown,
    }
}

/// Normalizes raw detections without dropping any of them. Order is kept;
/// the grading assembler sorts.
pub fn normalize_detections(raw: &[RawDetection], checkmark_policy: MarkClass) -> Vec<MarkRecord> {
    raw.iter()
        .map(|d| {
            let label = DetectorLabel::parse(&d.class);
            if label == DetectorLabel::Unrecognized {
                tracing::debug!(class = %d.class, "Unrecognized mark label, grading as unknown");
            }
            MarkRecord::new(
                classify(label, checkmark_policy),
                clamp_coordinate(d.y),
                clamp_coordinate(d.x),
                clamp_confidence(d.confidence),
            )
        })
        .collect()
}

fn clamp_coordinate(v: f64) -> f64 {
    if v.is_finite() && v > 0.0 {
        v
    } else {
        0.0
    }
}

fn clamp_confidence(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_label_maps_to_one_class() {
        let policy = MarkClass::Incorrect;
        assert_eq!(classify(DetectorLabel::Circle, policy), MarkClass::Correct);
        assert_eq!(classify(DetectorLabel::Cross, policy), MarkClass::Incorrect);
        assert_eq!(classify(DetectorLabel::Triangle, policy), MarkClass::Partial);
        assert_eq!(classify(DetectorLabel::Checkmark, policy), MarkClass::Incorrect);
        assert_eq!(classify(DetectorLabel::Unrecognized, policy), MarkClass::Unknown);
    }

    #[test]
    fn checkmark_follows_policy() {
        assert_eq!(
            classify(DetectorLabel::Checkmark, MarkClass::Correct),
            MarkClass::Correct
        );
    }

    #[test]
    fn keeps_unrecognized_and_clamps_values() {
        let raw = vec![
            RawDetection::new("scribble", -4.0, f64::NAN, 1.7),
            RawDetection::new("circle", 120.0, 33.0, f64::NAN),
        ];
        let marks = normalize_detections(&raw, MarkClass::Incorrect);
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0], MarkRecord::new(MarkClass::Unknown, 0.0, 0.0, 1.0));
        assert_eq!(marks[1], MarkRecord::new(MarkClass::Correct, 120.0, 33.0, 0.0));
    }
}
