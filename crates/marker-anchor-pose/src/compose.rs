use nalgebra::{Isometry3, Matrix4, Quaternion, Translation3, UnitQuaternion, Vector3};

use marker_anchor_core::PoseEstimate;

use crate::orientation::AxisCorrection;

/// Apply the orientation correction to a raw solver pose.
///
/// The permutation and sign flips preserve the quaternion norm, so the
/// corrected rotation stays unit.
pub fn correct_pose(raw: &PoseEstimate, correction: &AxisCorrection) -> PoseEstimate {
    let q = raw.rotation.into_inner();
    let [qx, qy, qz] = correction.apply([q.i, q.j, q.k]);
    let [t0, t1, t2] = correction.apply([
        raw.translation.x,
        raw.translation.y,
        raw.translation.z,
    ]);

    PoseEstimate {
        rotation: UnitQuaternion::new_unchecked(Quaternion::new(q.w, qx, qy, qz)),
        translation: Vector3::new(t0, t1, t2),
    }
}

/// 4x4 rigid transform of a pose estimate.
pub fn pose_matrix(pose: &PoseEstimate) -> Matrix4<f64> {
    Isometry3::from_parts(Translation3::from(pose.translation), pose.rotation).to_homogeneous()
}

/// Compose the corrected marker pose with the camera-to-world transform to
/// obtain the shared axes frame in world space.
pub fn axes_transform(corrected: &PoseEstimate, camera_to_world: &Matrix4<f64>) -> Matrix4<f64> {
    camera_to_world * pose_matrix(corrected)
}
