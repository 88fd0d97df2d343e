//! Error types for the pose matching core.

use std::path::PathBuf;
use thiserror::Error;

/// Input shape problems with a hand pose.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    #[error("expected 21 landmarks, got {0}")]
    LandmarkCount(usize),

    #[error("landmark {0} has a non-finite coordinate")]
    NonFinite(usize),

    #[error("degenerate pose: wrist to middle finger base distance is zero or out of range")]
    Degenerate,

    #[error("pose is not normalized: {0}")]
    NotNormalized(String),
}

/// Gesture library persistence errors.
#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("failed to read library {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write library {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse library {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize library: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write reference image {path:?}: {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("gesture name must not be empty")]
    EmptyName,

    #[error("gesture name {0:?} must not contain a path separator")]
    InvalidName(String),
}
