//! Hand pose capture and matching.
//!
//! A pose from the hand landmark detector is [`normalize`]d (wrist at the
//! origin, wrist to middle finger base = 100), compared with [`closeness`],
//! and looked up in a [`GestureLibrary`] with [`rank`] / [`best_match`].
//! [`session::Session`] drives all of this from a camera and a window.

pub mod camera;
pub mod config;
pub mod detector;
pub mod error;
pub mod library;
pub mod normalize;
pub mod output;
pub mod overlay;
pub mod ranking;
pub mod session;
pub mod similarity;
pub mod types;

#[cfg(test)]
mod fixtures;

pub use error::{LibraryError, PoseError};
pub use library::{GestureExample, GestureLibrary};
pub use normalize::{normalize, NormalizedPose};
pub use ranking::{best_match, rank, sort_by_score, Candidate, MatchOutcome};
pub use similarity::{closeness, Closeness, FlaggedSegment};
pub use types::{HandDetection, Landmark, Pose};
