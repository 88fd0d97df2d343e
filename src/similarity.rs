//! Pairwise-distance similarity between two normalized poses.
//!
//! Each pose is compared through the lengths of a fixed set of reference
//! segments, each divided by that pose's mean segment length. A segment whose
//! relative length differs by a factor `1 + d` contributes `floor(d / 0.2)`
//! to the score, so small jitter does not move the score at all.

use serde::Serialize;

use crate::normalize::NormalizedPose;
use crate::types::{Pose, JOINT_NAMES};

/// Number of reference segments.
pub const SEGMENT_COUNT: usize = 24;

/// Landmark index pairs compared between two poses: wrist to fingertips,
/// finger lengths, neighbouring fingertips, and a few cross-finger spans.
pub const REFERENCE_SEGMENTS: [(usize, usize); SEGMENT_COUNT] = [
    (0, 4),
    (0, 8),
    (0, 12),
    (0, 16),
    (0, 20),
    (5, 8),
    (9, 12),
    (13, 16),
    (17, 20),
    (4, 8),
    (8, 12),
    (12, 16),
    (16, 20),
    (4, 6),
    (6, 10),
    (10, 14),
    (14, 18),
    (8, 10),
    (8, 11),
    (3, 6),
    (4, 5),
    (4, 12),
    (4, 14),
    (4, 17),
];

/// Width of one score bucket, as a fraction of relative segment length.
pub const DEVIATION_BUCKET: f64 = 0.2;

/// A segment whose deviation contributes to the score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedSegment {
    /// Deviation floored to two decimal places.
    pub deviation: f64,
    pub from: &'static str,
    pub to: &'static str,
}

/// Result of comparing two poses. A score of 0 is a perfect match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Closeness {
    pub score: u32,
    pub deviations: [f64; SEGMENT_COUNT],
    pub flagged: Vec<FlaggedSegment>,
}

/// Mean length of the reference segments of `pose`.
pub fn baseline_scale(pose: &Pose) -> f64 {
    let total: f64 = REFERENCE_SEGMENTS
        .iter()
        .map(|&(a, b)| pose.distance(a, b))
        .sum();
    total / SEGMENT_COUNT as f64
}

/// `max(ra / rb, rb / ra) - 1`, the symmetric relative difference of two lengths.
pub fn segment_deviation(ra: f64, rb: f64) -> f64 {
    if ra == rb {
        return 0.0;
    }
    if ra == 0.0 || rb == 0.0 {
        return f64::INFINITY;
    }
    (ra / rb).max(rb / ra) - 1.0
}

/// Number of whole buckets a deviation spans. Saturates for infinite input.
pub fn bucket_count(deviation: f64) -> u32 {
    (deviation / DEVIATION_BUCKET).floor() as u32
}

fn floor_hundredths(x: f64) -> f64 {
    (x / 0.01).floor() * 0.01
}

/// Scores `a` against `b`. Symmetric in its arguments.
pub fn closeness(a: &NormalizedPose, b: &NormalizedPose) -> Closeness {
    let scale_a = baseline_scale(a);
    let scale_b = baseline_scale(b);

    let mut deviations = [0.0; SEGMENT_COUNT];
    for (dev, &(i, j)) in deviations.iter_mut().zip(REFERENCE_SEGMENTS.iter()) {
        let ra = a.distance(i, j) / scale_a;
        let rb = b.distance(i, j) / scale_b;
        *dev = segment_deviation(ra, rb);
    }

    let score = deviations
        .iter()
        .fold(0u32, |acc, &d| acc.saturating_add(bucket_count(d)));

    let flagged = deviations
        .iter()
        .zip(REFERENCE_SEGMENTS.iter())
        .filter(|(d, _)| **d >= DEVIATION_BUCKET)
        .map(|(&d, &(i, j))| FlaggedSegment {
            deviation: floor_hundredths(d),
            from: JOINT_NAMES[i],
            to: JOINT_NAMES[j],
        })
        .collect();

    Closeness {
        score,
        deviations,
        flagged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::normalize::normalize;
    use crate::types::{joints, Landmark};
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    #[test]
    fn test_segments_are_distinct() {
        let unique: HashSet<_> = REFERENCE_SEGMENTS
            .iter()
            .map(|&(a, b)| (a.min(b), a.max(b)))
            .collect();
        assert_eq!(unique.len(), SEGMENT_COUNT);
        assert!(REFERENCE_SEGMENTS.iter().all(|&(a, b)| a != b && a < 21 && b < 21));
    }

    #[test]
    fn test_identical_poses_score_zero() {
        let p = normalize(&fixtures::fist()).unwrap();
        let c = closeness(&p, &p);
        assert_eq!(c.score, 0);
        assert!(c.deviations.iter().all(|&d| d == 0.0));
        assert!(c.flagged.is_empty());
    }

    #[test]
    fn test_symmetric() {
        let a = normalize(&fixtures::open_hand()).unwrap();
        let b = normalize(&fixtures::fist()).unwrap();
        assert_eq!(closeness(&a, &b), closeness(&b, &a));
    }

    #[test]
    fn test_deviation_of_25_percent_is_one_bucket() {
        let d = segment_deviation(1.25, 1.0);
        assert_relative_eq!(d, 0.25);
        assert_eq!(bucket_count(d), 1);
        assert_eq!(segment_deviation(1.0, 1.25), d);
        assert_eq!(bucket_count(segment_deviation(0.9, 0.9)), 0);
    }

    #[test]
    fn test_segment_stretched_by_25_percent_scores_one() {
        let base = fixtures::open_hand();
        let mut points = *base.points();
        let (ring, pinky) = (points[joints::RING_PIP], points[joints::PINKY_PIP]);
        // pinky2 sits on a single reference segment, ring2 -> pinky2
        points[joints::PINKY_PIP] = Landmark::new(
            ring.x + (pinky.x - ring.x) * 1.25,
            ring.y + (pinky.y - ring.y) * 1.25,
            ring.z + (pinky.z - ring.z) * 1.25,
        );

        let a = normalize(&Pose::new(points)).unwrap();
        let b = normalize(&base).unwrap();
        let c = closeness(&a, &b);

        let stretched = REFERENCE_SEGMENTS
            .iter()
            .position(|&s| s == (joints::RING_PIP, joints::PINKY_PIP))
            .unwrap();
        let expected = 1.25 * baseline_scale(&b) / baseline_scale(&a) - 1.0;
        assert_relative_eq!(c.deviations[stretched], expected, epsilon = 1e-9);
        assert_eq!(bucket_count(c.deviations[stretched]), 1);

        assert_eq!(c.score, 1);
        assert_eq!(c.flagged.len(), 1);
        assert_eq!((c.flagged[0].from, c.flagged[0].to), ("ring2", "pinky2"));
        assert_relative_eq!(c.flagged[0].deviation, 0.24, epsilon = 1e-9);
    }

    #[test]
    fn test_bucket_edges() {
        assert_eq!(bucket_count(0.0), 0);
        assert_eq!(bucket_count(0.19), 0);
        assert_eq!(bucket_count(0.45), 2);
        assert_eq!(bucket_count(f64::INFINITY), u32::MAX);
    }

    #[test]
    fn test_zero_length_segments() {
        assert_eq!(segment_deviation(0.0, 0.0), 0.0);
        assert_eq!(segment_deviation(0.0, 0.5), f64::INFINITY);
    }

    #[test]
    fn test_different_gestures_are_flagged() {
        let open = normalize(&fixtures::open_hand()).unwrap();
        let fist = normalize(&fixtures::fist()).unwrap();
        let c = closeness(&open, &fist);

        assert!(c.score > 0);
        assert!(!c.flagged.is_empty());
        let contributing = c.deviations.iter().filter(|&&d| d >= DEVIATION_BUCKET).count();
        assert_eq!(c.flagged.len(), contributing);

        let middle = c
            .flagged
            .iter()
            .find(|f| f.from == "mid1" && f.to == "mid4")
            .expect("curled middle finger should be flagged");
        assert!(middle.deviation >= 0.2);
        // floored to hundredths
        assert!((middle.deviation * 100.0 - (middle.deviation * 100.0).round()).abs() < 1e-6);
    }

    #[test]
    fn test_moving_one_fingertip_only_flags_its_segments() {
        let base = fixtures::open_hand();
        let mut points = *base.points();
        let tip = points[joints::PINKY_TIP];
        points[joints::PINKY_TIP] = Landmark::new(tip.x, tip.y - 4.0, tip.z + 2.0);

        let a = normalize(&base).unwrap();
        let b = normalize(&Pose::new(points)).unwrap();
        let c = closeness(&a, &b);

        assert!(c.score > 0);
        assert!(c.flagged.iter().all(|f| f.from == "pinky4" || f.to == "pinky4"));
    }

    #[test]
    fn test_baseline_scale_is_linear() {
        let p = fixtures::pointing();
        assert_relative_eq!(
            baseline_scale(&p.scaled(3.0)),
            3.0 * baseline_scale(&p),
            epsilon = 1e-9
        );
    }
}
