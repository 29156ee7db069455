//! High-level facade crate for the `marker-anchor-*` workspace.
//!
//! This crate provides:
//! - stable, convenient re-exports of the underlying crates
//! - [`AnchorSession`]: the per-device session tying marker pose recovery to
//!   the cross-device transform relay.
//!
//! ## Quickstart
//!
//! ```
//! use marker_anchor::{AnchorSession, FrameInput, SessionParams};
//! use marker_anchor::pose::DisplayOrientation;
//! use nalgebra::Vector2;
//!
//! let mut session = AnchorSession::new(SessionParams::default());
//! let report = session.tick(&FrameInput {
//!     camera: None,
//!     viewport: Vector2::new(375.0, 812.0),
//!     orientation: DisplayOrientation::Portrait,
//!     detection: None,
//! });
//! assert!(report.outbound.is_empty());
//! ```
//!
//! ## API map
//! - `marker_anchor::core`: marker observations, intrinsics, planar PnP.
//! - `marker_anchor::pose`: display-orientation tables and axes composition.
//! - `marker_anchor::relay`: wire codec, scene registry, relative transforms.

pub use marker_anchor_core as core;
pub use marker_anchor_pose as pose;
pub use marker_anchor_relay as relay;

pub use marker_anchor_core::{
    CameraIntrinsics, CornerLabel, MarkerCorners, MarkerObservation, PnpError, PoseEstimate,
};
pub use marker_anchor_pose::DisplayOrientation;
pub use marker_anchor_relay::{SceneRegistry, WireMessage};

mod session;

pub use session::{
    sphere_spawn_transform, AnchorSession, CameraFrame, FrameInput, PoseOutcome, PoseUpdateError,
    SessionParams, TickReport,
};
