use std::sync::mpsc::{self, Receiver, Sender};

use log::{debug, info};
use nalgebra::{Matrix4, Vector2};
use serde::{Deserialize, Serialize};

use marker_anchor_core::{
    solve_marker_pose, CameraIntrinsics, MarkerCorners, MarkerObservation, PnpError,
};
use marker_anchor_pose::{axes_transform, correct_pose, solver_corners, DisplayOrientation};
use marker_anchor_relay::{
    apply_message, decode, encode_camera_transform, encode_create_sphere,
    encode_sphere_transform, Applied, SceneRegistry,
};

/// Distance in front of the camera at which new spheres are spawned, meters.
const SPHERE_SPAWN_DISTANCE: f64 = 0.1;

/// Per-frame camera snapshot supplied by the host AR framework.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraFrame {
    pub intrinsics: CameraIntrinsics,
    /// Captured image resolution (width, height), in pixels.
    pub image_resolution: Vector2<f64>,
    /// Camera-to-world transform.
    pub camera_to_world: Matrix4<f64>,
}

/// Everything the session consumes on one display-frame tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInput {
    /// Current camera frame; `None` when the camera subsystem has nothing
    /// for this display frame.
    pub camera: Option<CameraFrame>,
    /// Viewport size (width, height), in screen points.
    pub viewport: Vector2<f64>,
    pub orientation: DisplayOrientation,
    /// This frame's marker detection, if the external detector reported one.
    pub detection: Option<MarkerCorners>,
}

/// Session configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionParams {
    /// Physical side length of the printed marker, in meters.
    pub marker_size: f64,
    /// Emit a camera-avatar update on every tick with a camera frame.
    pub broadcast_camera: bool,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self {
            marker_size: 0.1,
            broadcast_camera: true,
        }
    }
}

/// Why this frame's pose update was skipped.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoseUpdateError {
    #[error("no camera frame or usable intrinsics for this frame")]
    MissingCameraFrame,
    #[error("pose recovery is unsupported in this display orientation")]
    UnknownOrientation,
    #[error(transparent)]
    Solve(#[from] PnpError),
}

/// Outcome of the pose-recovery stage of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PoseOutcome {
    /// Axes transform recomputed from this frame's marker observation.
    Updated,
    /// Marker not visible this frame; the previous axes transform is kept.
    MarkerNotVisible,
    /// Scan mode is off; marker tracking is paused.
    ScanDisabled,
    /// Update skipped; the previous axes transform is kept.
    Skipped(PoseUpdateError),
}

/// Result of one [`AnchorSession::tick`].
#[derive(Clone, Debug)]
pub struct TickReport {
    /// Messages to hand to the messaging channel, in order.
    pub outbound: Vec<String>,
    pub pose: PoseOutcome,
    /// Remote messages applied while draining the inbound queue.
    pub applied_messages: usize,
}

/// The per-device session owning all shared-frame state.
///
/// All mutation happens inside [`tick`](Self::tick) (and the explicit
/// [`place_sphere`](Self::place_sphere) / [`restart`](Self::restart) calls),
/// which the host must invoke from its serialized frame callback. Peer
/// messages may arrive on any thread through the [`inbox`](Self::inbox)
/// handle; they are queued and drained at the start of the next tick.
pub struct AnchorSession {
    params: SessionParams,
    /// Shared axes frame in world space; holds its last value while the
    /// marker is out of view.
    axes: Matrix4<f64>,
    anchored: bool,
    marker: MarkerObservation,
    registry: SceneRegistry,
    in_scan_mode: bool,
    inbox_rx: Receiver<String>,
    inbox_tx: Sender<String>,
}

impl AnchorSession {
    pub fn new(params: SessionParams) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::channel();
        Self {
            marker: MarkerObservation::new(params.marker_size),
            params,
            axes: Matrix4::identity(),
            anchored: false,
            registry: SceneRegistry::new(),
            in_scan_mode: true,
            inbox_rx,
            inbox_tx,
        }
    }

    /// Handle for delivering peer messages from any thread.
    pub fn inbox(&self) -> Sender<String> {
        self.inbox_tx.clone()
    }

    /// Queue a peer message for the next tick.
    pub fn enqueue(&self, message: impl Into<String>) {
        // the session owns the receiving end, so send cannot fail
        let _ = self.inbox_tx.send(message.into());
    }

    /// Current shared axes frame in world space.
    pub fn axes(&self) -> &Matrix4<f64> {
        &self.axes
    }

    /// The axes frame has been anchored at a marker at least once.
    pub fn is_anchored(&self) -> bool {
        self.anchored
    }

    pub fn marker(&self) -> &MarkerObservation {
        &self.marker
    }

    pub fn scene(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn in_scan_mode(&self) -> bool {
        self.in_scan_mode
    }

    pub fn set_scan_mode(&mut self, enabled: bool) {
        self.in_scan_mode = enabled;
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Run one display-frame tick: drain queued peer messages, update marker
    /// visibility and the axes transform, then emit the local camera-avatar
    /// update.
    ///
    /// Pose failures are frame-scoped: the session logs them, keeps the
    /// previous axes transform and carries on.
    pub fn tick(&mut self, input: &FrameInput) -> TickReport {
        let applied_messages = self.drain_inbox();

        let pose = if self.in_scan_mode {
            match input.detection {
                Some(corners) => self.marker.advance(corners),
                None => self.marker.mark_hidden(),
            }
            if self.marker.visible {
                match self.update_axes(input) {
                    Ok(()) => PoseOutcome::Updated,
                    Err(err) => {
                        debug!("pose update skipped: {err}");
                        PoseOutcome::Skipped(err)
                    }
                }
            } else {
                PoseOutcome::MarkerNotVisible
            }
        } else {
            self.marker.mark_hidden();
            PoseOutcome::ScanDisabled
        };

        let mut outbound = Vec::new();
        if self.params.broadcast_camera {
            if let Some(camera) = &input.camera {
                if let Some(message) =
                    encode_camera_transform(&camera.camera_to_world, &self.axes)
                {
                    outbound.push(message);
                }
            }
        }

        TickReport {
            outbound,
            pose,
            applied_messages,
        }
    }

    /// Create a local sphere instance with the next sequential id.
    ///
    /// Returns the id and the messages announcing the instance and its
    /// initial transform to peers.
    pub fn place_sphere(&mut self, world: Matrix4<f64>) -> (u32, Vec<String>) {
        let id = self.registry.allocate_id();
        self.registry.set_sphere_transform(id, world);
        info!("placed sphere {id}");

        let mut outbound = vec![encode_create_sphere(id)];
        if let Some(update) = encode_sphere_transform(id, &world, &self.axes) {
            outbound.push(update);
        }
        (id, outbound)
    }

    /// Reset to a fresh session: drop replicated state, marker state, the
    /// axes transform and any queued peer messages.
    pub fn restart(&mut self) {
        info!("restarting session");
        self.registry.clear();
        self.marker = MarkerObservation::new(self.params.marker_size);
        self.axes = Matrix4::identity();
        self.anchored = false;
        self.in_scan_mode = true;
        while self.inbox_rx.try_recv().is_ok() {}
    }

    fn drain_inbox(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(raw) = self.inbox_rx.try_recv() {
            match decode(&raw) {
                Some(message) => {
                    if apply_message(&message, &self.axes, &mut self.registry) != Applied::Ignored
                    {
                        applied += 1;
                    }
                }
                None => debug!("unrecognized peer message dropped ({} bytes)", raw.len()),
            }
        }
        applied
    }

    fn update_axes(&mut self, input: &FrameInput) -> Result<(), PoseUpdateError> {
        let camera = input
            .camera
            .as_ref()
            .ok_or(PoseUpdateError::MissingCameraFrame)?;
        if !camera.intrinsics.is_valid() {
            return Err(PoseUpdateError::MissingCameraFrame);
        }
        let profile = input
            .orientation
            .profile()
            .ok_or(PoseUpdateError::UnknownOrientation)?;

        let corners = solver_corners(
            &self.marker.corners,
            camera.image_resolution,
            input.viewport,
            profile,
        )
        .ok_or(PoseUpdateError::MissingCameraFrame)?;

        let raw = solve_marker_pose(&corners, self.marker.side_length, &camera.intrinsics)?;
        let corrected = correct_pose(&raw, &profile.correction);
        self.axes = axes_transform(&corrected, &camera.camera_to_world);
        self.anchored = true;
        Ok(())
    }
}

/// World transform for a sphere spawned in front of the camera.
///
/// Places the sphere 0.1 m along the camera's viewing direction (the negative
/// z basis of the camera-to-world transform), with identity orientation.
pub fn sphere_spawn_transform(camera_to_world: &Matrix4<f64>) -> Matrix4<f64> {
    let forward = -camera_to_world.fixed_view::<3, 1>(0, 2).clone_owned();
    let position = camera_to_world.fixed_view::<3, 1>(0, 3).clone_owned()
        + forward * SPHERE_SPAWN_DISTANCE;
    Matrix4::new_translation(&position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Vector3};

    #[test]
    fn spawn_transform_sits_in_front_of_camera() {
        let camera = Isometry3::translation(1.0, 2.0, 3.0).to_homogeneous();
        let spawn = sphere_spawn_transform(&camera);
        assert_relative_eq!(spawn[(0, 3)], 1.0, epsilon = 1e-12);
        assert_relative_eq!(spawn[(1, 3)], 2.0, epsilon = 1e-12);
        assert_relative_eq!(spawn[(2, 3)], 3.0 - SPHERE_SPAWN_DISTANCE, epsilon = 1e-12);
    }

    #[test]
    fn params_serde_round_trip() {
        let params = SessionParams {
            marker_size: 0.17,
            broadcast_camera: false,
        };
        let json = serde_json::to_string(&params).expect("serialize");
        let back: SessionParams = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(params, back);
    }

    #[test]
    fn restart_drops_queued_messages() {
        let mut session = AnchorSession::new(SessionParams::default());
        session.enqueue("addNode sphereNode 0");
        session.restart();
        let report = session.tick(&FrameInput {
            camera: None,
            viewport: Vector2::new(375.0, 812.0),
            orientation: DisplayOrientation::Portrait,
            detection: None,
        });
        assert_eq!(report.applied_messages, 0);
        assert_eq!(session.scene().sphere_count(), 0);
    }

    #[test]
    fn place_sphere_announces_creation_and_transform() {
        let mut session = AnchorSession::new(SessionParams::default());
        let world = Matrix4::new_translation(&Vector3::new(0.5, 0.0, -0.2));
        let (id, outbound) = session.place_sphere(world);
        assert_eq!(id, 0);
        assert_eq!(outbound.len(), 2);
        assert_eq!(outbound[0], "addNode sphereNode 0");
        assert!(outbound[1].ends_with("sphereNode 0"));
    }
}
