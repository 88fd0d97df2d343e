//! Sample hand poses shared by the unit tests.

use std::collections::HashMap;

use crate::types::{Landmark, Pose};

const HANDS_JSON: &str = include_str!("../tests/data/hands.json");

fn hand(name: &str) -> Pose {
    let hands: HashMap<String, Pose> = serde_json::from_str(HANDS_JSON).unwrap();
    hands[name].clone()
}

pub fn open_hand() -> Pose {
    hand("open_hand")
}

pub fn fist() -> Pose {
    hand("fist")
}

pub fn pointing() -> Pose {
    hand("pointing")
}

pub fn shifted(pose: &Pose, dx: f64, dy: f64, dz: f64) -> Pose {
    let mut points = *pose.points();
    for p in points.iter_mut() {
        *p = Landmark::new(p.x + dx, p.y + dy, p.z + dz);
    }
    Pose::new(points)
}
