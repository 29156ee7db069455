use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};

/// Pinhole camera intrinsics: focal lengths and principal point, in pixels.
///
/// Supplied per frame by the camera subsystem; lens distortion is assumed to
/// be zero (or already removed upstream).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Both focal lengths are finite and non-zero.
    pub fn is_valid(&self) -> bool {
        self.fx.is_finite()
            && self.fy.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.fx.abs() > f64::EPSILON
            && self.fy.abs() > f64::EPSILON
    }

    /// Project a camera-space point to pixel coordinates.
    ///
    /// Returns `None` for points on or behind the image plane.
    pub fn project(&self, p: &Point3<f64>) -> Option<Point2<f64>> {
        if p.z <= f64::EPSILON {
            return None;
        }
        Some(Point2::new(
            self.cx + self.fx * p.x / p.z,
            self.cy + self.fy * p.y / p.z,
        ))
    }

    /// Map a pixel to normalized image coordinates (the z=1 plane).
    #[inline]
    pub fn normalize(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::new((p.x - self.cx) / self.fx, (p.y - self.cy) / self.fy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn project_then_normalize_recovers_ray() {
        let intr = CameraIntrinsics::new(1000.0, 1000.0, 320.0, 240.0);
        let p = Point3::new(0.05, -0.02, 0.5);
        let px = intr.project(&p).expect("in front of camera");
        let n = intr.normalize(px);
        assert_relative_eq!(n.x, p.x / p.z, epsilon = 1e-12);
        assert_relative_eq!(n.y, p.y / p.z, epsilon = 1e-12);
    }

    #[test]
    fn point_behind_camera_does_not_project() {
        let intr = CameraIntrinsics::new(1000.0, 1000.0, 320.0, 240.0);
        assert!(intr.project(&Point3::new(0.0, 0.0, -1.0)).is_none());
        assert!(intr.project(&Point3::new(0.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn zero_focal_length_is_invalid() {
        assert!(!CameraIntrinsics::new(0.0, 1000.0, 320.0, 240.0).is_valid());
        assert!(!CameraIntrinsics::new(1000.0, f64::NAN, 320.0, 240.0).is_valid());
        assert!(CameraIntrinsics::new(1000.0, 1000.0, 320.0, 240.0).is_valid());
    }

    #[test]
    fn serde_round_trip() {
        let intr = CameraIntrinsics::new(1012.5, 1013.0, 320.25, 239.75);
        let json = serde_json::to_string(&intr).expect("serialize");
        let back: CameraIntrinsics = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(intr, back);
    }
}
