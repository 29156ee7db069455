//! Two in-process sessions anchored at the same marker, exchanging relay
//! messages as a stand-in for the peer-to-peer channel.
//!
//! Run with `RUST_LOG=debug cargo run --example two_peers` for relay logging.

use nalgebra::{Matrix4, Point2, Vector2};

use marker_anchor::{
    sphere_spawn_transform, AnchorSession, CameraFrame, CameraIntrinsics, DisplayOrientation,
    FrameInput, MarkerCorners, SessionParams,
};

fn frame(detection: Option<MarkerCorners>) -> FrameInput {
    FrameInput {
        camera: Some(CameraFrame {
            intrinsics: CameraIntrinsics::new(1000.0, 1000.0, 320.0, 240.0),
            image_resolution: Vector2::new(640.0, 480.0),
            camera_to_world: Matrix4::identity(),
        }),
        viewport: Vector2::new(480.0, 640.0),
        orientation: DisplayOrientation::Portrait,
        detection,
    }
}

/// Screen corners of a 0.1 m marker facing the camera 0.5 m away.
fn marker_corners() -> MarkerCorners {
    MarkerCorners::new(
        Point2::new(220.0, 340.0),
        Point2::new(420.0, 340.0),
        Point2::new(420.0, 140.0),
        Point2::new(220.0, 140.0),
    )
}

fn main() {
    env_logger::init();

    let mut alice = AnchorSession::new(SessionParams::default());
    let mut bob = AnchorSession::new(SessionParams::default());

    // Both devices see the marker and anchor their shared frame.
    let report = alice.tick(&frame(Some(marker_corners())));
    println!("alice pose outcome: {:?}", report.pose);
    for message in report.outbound {
        bob.enqueue(message);
    }
    bob.tick(&frame(Some(marker_corners())));

    // Alice drops a sphere in front of her camera and announces it.
    let spawn = sphere_spawn_transform(&Matrix4::identity());
    let (id, outbound) = alice.place_sphere(spawn);
    for message in outbound {
        bob.enqueue(message);
    }

    let report = bob.tick(&frame(None));
    println!("bob applied {} peer message(s)", report.applied_messages);

    let replicated = bob
        .scene()
        .sphere(id)
        .and_then(|n| n.world_transform)
        .expect("sphere replicated on bob");
    println!(
        "sphere {id} world position on bob: ({:.3}, {:.3}, {:.3})",
        replicated[(0, 3)],
        replicated[(1, 3)],
        replicated[(2, 3)]
    );
}
