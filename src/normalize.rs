//! Pose normalization: wrist to origin, wrist-to-middle-base distance to 100.
//!
//! Only translation and scale are removed. Two normalized poses can still
//! differ by an arbitrary rotation; palm-forward alignment is not implemented.

use serde::{Deserialize, Serialize};
use std::ops::Deref;

use crate::error::PoseError;
use crate::types::{joints, Landmark, Pose};

/// Distance between the wrist and the middle finger base after normalization.
pub const NORMALIZED_SPAN: f64 = 100.0;

const SPAN_TOLERANCE: f64 = 1e-6;

/// A [`Pose`] with the wrist at the origin and the wrist to middle finger base
/// distance equal to [`NORMALIZED_SPAN`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Pose", into = "Pose")]
pub struct NormalizedPose(Pose);

impl NormalizedPose {
    pub fn as_pose(&self) -> &Pose {
        &self.0
    }

    pub fn into_pose(self) -> Pose {
        self.0
    }
}

impl Deref for NormalizedPose {
    type Target = Pose;

    fn deref(&self) -> &Pose {
        &self.0
    }
}

impl TryFrom<Pose> for NormalizedPose {
    type Error = PoseError;

    /// Accepts a pose that already satisfies the normalization invariant.
    fn try_from(pose: Pose) -> Result<Self, Self::Error> {
        if let Some(i) = pose.points().iter().position(|p| !p.is_finite()) {
            return Err(PoseError::NonFinite(i));
        }
        if pose.point(joints::WRIST).distance(&Landmark::ORIGIN) > SPAN_TOLERANCE {
            return Err(PoseError::NotNormalized("wrist is not at the origin".to_string()));
        }
        let span = pose.distance(joints::WRIST, joints::MIDDLE_MCP);
        if (span - NORMALIZED_SPAN).abs() > SPAN_TOLERANCE {
            return Err(PoseError::NotNormalized(format!(
                "wrist to middle finger base is {span}, expected {NORMALIZED_SPAN}"
            )));
        }
        Ok(Self(pose))
    }
}

impl From<NormalizedPose> for Pose {
    fn from(pose: NormalizedPose) -> Self {
        pose.0
    }
}

/// Maps a raw pose into the canonical frame.
pub fn normalize(pose: &Pose) -> Result<NormalizedPose, PoseError> {
    if let Some(i) = pose.points().iter().position(|p| !p.is_finite()) {
        return Err(PoseError::NonFinite(i));
    }

    let wrist = *pose.point(joints::WRIST);
    let span = pose.distance(joints::WRIST, joints::MIDDLE_MCP);
    let factor = NORMALIZED_SPAN / span;
    // span underflows to 0 or overflows to inf for extreme coordinates
    if span == 0.0 || !factor.is_finite() || factor == 0.0 {
        return Err(PoseError::Degenerate);
    }

    let mut points = *pose.points();
    for p in points.iter_mut() {
        *p = p.offset_scaled(&wrist, factor);
    }
    NormalizedPose::try_from(Pose::new(points))
}
