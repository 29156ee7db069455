//! Core geometry for marker-anchored AR sessions.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete marker detector, camera API or transport: corners
//! arrive as plain 2D points, intrinsics as a per-frame snapshot.

mod corner;
mod homography;
mod intrinsics;
mod logger;
mod pnp;

pub use corner::{CornerLabel, MarkerCorners, MarkerObservation};
pub use homography::{homography_from_4pt, Homography};
pub use intrinsics::CameraIntrinsics;
pub use pnp::{marker_model_points, reproject, solve_marker_pose, PnpError, PoseEstimate};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
