//! Orientation-dependent corner remapping and axes-frame composition.
//!
//! Camera intrinsics and screen coordinates depend on the device display
//! orientation. Everything orientation-specific lives in one static table per
//! orientation ([`OrientationProfile`]): the corner-order permutation fed to
//! the PnP solver, the screen-to-image-pixel axis swap, and the axis
//! permutation/sign correction applied to the raw solver pose.

mod compose;
mod orientation;

pub use compose::{axes_transform, correct_pose, pose_matrix};
pub use orientation::{solver_corners, AxisCorrection, DisplayOrientation, OrientationProfile};
