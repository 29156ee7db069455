//! Planar PnP for a square marker of known physical size.
//!
//! The solver recovers the rigid pose of the marker in the camera frame from
//! the four corner projections: pixels are normalized with the intrinsics, a
//! 4-point homography maps the marker plane to the normalized image, and the
//! homography columns are rescaled and projected onto SO(3).

use log::debug;
use nalgebra::{Matrix3, Point2, Point3, Rotation3, UnitQuaternion, Vector3};

use crate::homography::homography_from_4pt;
use crate::intrinsics::CameraIntrinsics;

/// Rigid pose of the marker in the camera frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseEstimate {
    /// Unit rotation quaternion, canonicalized so the scalar part is >= 0.
    pub rotation: UnitQuaternion<f64>,
    /// Marker origin in camera coordinates, in meters.
    pub translation: Vector3<f64>,
}

impl PoseEstimate {
    /// Map a marker-frame point into the camera frame.
    #[inline]
    pub fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        self.rotation * p + self.translation
    }
}

/// Errors produced by the planar PnP solver.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PnpError {
    #[error("corner configuration does not admit a planar pose")]
    DegenerateConfiguration,
}

/// Marker-frame corner positions for a square marker with side `real_size`.
///
/// The marker origin is its center; slot order matches the canonical corner
/// order the orientation corrector feeds into [`solve_marker_pose`].
pub fn marker_model_points(real_size: f64) -> [Point3<f64>; 4] {
    let h = real_size / 2.0;
    [
        Point3::new(h, -h, 0.0),
        Point3::new(h, h, 0.0),
        Point3::new(-h, h, 0.0),
        Point3::new(-h, -h, 0.0),
    ]
}

/// Recover the marker pose from four corner pixels.
///
/// `corners` must be in the canonical slot order of [`marker_model_points`].
/// Degenerate configurations (collinear or coincident corners, non-positive
/// marker size) fail with [`PnpError::DegenerateConfiguration`] instead of
/// returning an undefined pose.
pub fn solve_marker_pose(
    corners: &[Point2<f64>; 4],
    real_size: f64,
    intrinsics: &CameraIntrinsics,
) -> Result<PoseEstimate, PnpError> {
    if !(real_size > 0.0) || !intrinsics.is_valid() {
        return Err(PnpError::DegenerateConfiguration);
    }

    let normalized = corners.map(|c| intrinsics.normalize(c));
    if min_triangle_area(&normalized) < 1e-12 {
        debug!("pnp: near-collinear corner configuration rejected");
        return Err(PnpError::DegenerateConfiguration);
    }

    let model = marker_model_points(real_size);
    let plane = model.map(|p| Point2::new(p.x, p.y));

    let h = homography_from_4pt(&plane, &normalized).ok_or(PnpError::DegenerateConfiguration)?;

    let h1 = h.column(0);
    let h2 = h.column(1);
    let h3 = h.column(2);

    let n1 = h1.norm();
    let n2 = h2.norm();
    if n1 < 1e-12 || n2 < 1e-12 {
        return Err(PnpError::DegenerateConfiguration);
    }

    let lambda = 2.0 / (n1 + n2);
    let mut r1 = h1 * lambda;
    let mut r2 = h2 * lambda;
    let mut t = h3 * lambda;

    // Cheirality: the marker must lie in front of the camera.
    if t.z < 0.0 {
        r1 = -r1;
        r2 = -r2;
        t = -t;
    }

    let r3 = r1.cross(&r2);
    let r = project_to_so3(Matrix3::from_columns(&[r1, r2, r3]))
        .ok_or(PnpError::DegenerateConfiguration)?;

    let mut q = UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r));
    if q.w < 0.0 {
        q = UnitQuaternion::new_unchecked(-q.into_inner());
    }

    Ok(PoseEstimate {
        rotation: q,
        translation: t,
    })
}

/// Project a marker-frame point through the pose and the pinhole model.
pub fn reproject(
    pose: &PoseEstimate,
    model_point: &Point3<f64>,
    intrinsics: &CameraIntrinsics,
) -> Option<Point2<f64>> {
    intrinsics.project(&pose.transform_point(model_point))
}

/// Nearest rotation matrix in the Frobenius sense: R = U * V^T with the sign
/// of the last U column fixed so det(R) = +1.
fn project_to_so3(m: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let svd = m.svd(true, true);
    let mut u = svd.u?;
    let v_t = svd.v_t?;
    let mut r = u * v_t;
    if r.determinant() < 0.0 {
        u.column_mut(2).neg_mut();
        r = u * v_t;
    }
    Some(r)
}

fn min_triangle_area(pts: &[Point2<f64>; 4]) -> f64 {
    const TRIS: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIS.iter()
        .map(|&[a, b, c]| {
            let ab = pts[b] - pts[a];
            let ac = pts[c] - pts[a];
            0.5 * (ab.x * ac.y - ab.y * ac.x).abs()
        })
        .fold(f64::INFINITY, f64::min)
}
