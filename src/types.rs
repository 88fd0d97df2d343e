use serde::{Deserialize, Serialize};

use crate::error::PoseError;

/// Number of landmarks in a hand pose.
pub const LANDMARK_COUNT: usize = 21;

/// Landmark indices (MediaPipe hand landmark order).
pub mod joints {
    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_DIP: usize = 7;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_DIP: usize = 11;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_PIP: usize = 14;
    pub const RING_DIP: usize = 15;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;
}

/// Human readable joint names, indexed like a [`Pose`].
pub const JOINT_NAMES: [&str; LANDMARK_COUNT] = [
    "wrist", "thumb1", "thumb2", "thumb3", "thumb4", "index1", "index2", "index3", "index4",
    "mid1", "mid2", "mid3", "mid4", "ring1", "ring2", "ring3", "ring4", "pinky1", "pinky2",
    "pinky3", "pinky4",
];

/// A single 3D point on a tracked hand. Stored on disk as `[x, y, z]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Landmark {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Landmark {
    pub const ORIGIN: Landmark = Landmark { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Landmark) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub(crate) fn offset_scaled(&self, origin: &Landmark, factor: f64) -> Landmark {
        Landmark {
            x: (self.x - origin.x) * factor,
            y: (self.y - origin.y) * factor,
            z: (self.z - origin.z) * factor,
        }
    }
}

impl From<[f64; 3]> for Landmark {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Landmark> for [f64; 3] {
    fn from(l: Landmark) -> Self {
        [l.x, l.y, l.z]
    }
}

/// The ordered 21-landmark snapshot of one hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct Pose {
    points: [Landmark; LANDMARK_COUNT],
}

impl Pose {
    pub fn new(points: [Landmark; LANDMARK_COUNT]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[Landmark; LANDMARK_COUNT] {
        &self.points
    }

    pub fn point(&self, index: usize) -> &Landmark {
        &self.points[index]
    }

    pub fn distance(&self, a: usize, b: usize) -> f64 {
        self.points[a].distance(&self.points[b])
    }

    /// Returns a copy with every landmark multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Pose {
        let mut points = self.points;
        for p in points.iter_mut() {
            *p = p.offset_scaled(&Landmark::ORIGIN, factor);
        }
        Pose { points }
    }
}

impl TryFrom<Vec<Landmark>> for Pose {
    type Error = PoseError;

    fn try_from(points: Vec<Landmark>) -> Result<Self, Self::Error> {
        let points: [Landmark; LANDMARK_COUNT] = points
            .try_into()
            .map_err(|v: Vec<Landmark>| PoseError::LandmarkCount(v.len()))?;
        Ok(Self { points })
    }
}

impl From<Pose> for Vec<Landmark> {
    fn from(pose: Pose) -> Self {
        pose.points.to_vec()
    }
}

/// One hand found by a detector.
#[derive(Debug, Clone)]
pub struct HandDetection {
    /// Landmarks in the detector's metric world space, used for matching.
    pub world: Pose,
    /// Landmarks in frame space with x and y normalized to `0..1`, used for drawing.
    pub image: Pose,
}
