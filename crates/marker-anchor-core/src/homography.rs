use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// Planar projective transform mapping marker-plane coordinates to
/// normalized image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Option<Point2<f64>> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        if v[2].abs() < 1e-12 {
            return None;
        }
        Some(Point2::new(v[0] / v[2], v[1] / v[2]))
    }

    /// Column of the 3x3 matrix as a vector.
    #[inline]
    pub fn column(&self, i: usize) -> Vector3<f64> {
        Vector3::new(self.h[(0, i)], self.h[(1, i)], self.h[(2, i)])
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn normalize_points4(pts: &[Point2<f64>; 4]) -> ([Point2<f64>; 4], Matrix3<f64>) {
    // Hartley normalization: translate to centroid, scale so mean distance = sqrt(2)
    let n = 4.0_f64;
    let mut cx = 0.0_f64;
    let mut cy = 0.0_f64;
    for p in pts {
        cx += p.x;
        cy += p.y;
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0_f64;
    for p in pts {
        let dx = p.x - cx;
        let dy = p.y - cy;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n;

    let t = hartley_normalization(cx, cy, mean_dist);

    let mut out = [Point2::new(0.0_f64, 0.0_f64); 4];
    for (i, p) in pts.iter().enumerate() {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        out[i] = Point2::new(v[0], v[1]);
    }

    (out, t)
}

fn denormalize_homography(
    hn: Matrix3<f64>,
    t_src: Matrix3<f64>,
    t_dst: Matrix3<f64>,
) -> Option<Matrix3<f64>> {
    let t_dst_inv = t_dst.try_inverse()?;
    let h = t_dst_inv * hn * t_src;
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    Some(h / s)
}

/// Compute H such that: dst ~ H * src (projective), from 4 correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// when the configuration is degenerate (collinear or coincident points).
pub fn homography_from_4pt(src: &[Point2<f64>; 4], dst: &[Point2<f64>; 4]) -> Option<Homography> {
    // Unknowns: [h11 h12 h13 h21 h22 h23 h31 h32], with h33 = 1
    // For each correspondence (x,y)->(u,v):
    // h11 x + h12 y + h13 - u h31 x - u h32 y = u
    // h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let (src_n, t_src) = normalize_points4(src);
    let (dst_n, t_dst) = normalize_points4(dst);

    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for k in 0..4 {
        let x = src_n[k].x;
        let y = src_n[k].y;
        let u = dst_n[k].x;
        let v = dst_n[k].y;

        // row 2k
        let r0 = 2 * k;
        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        // row 2k+1
        let r1 = 2 * k + 1;
        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;

    let hn = Matrix3::new(
        x[0], x[1], x[2], //
        x[3], x[4], x[5], //
        x[6], x[7], 1.0,
    );

    denormalize_homography(hn, t_src, t_dst).map(Homography::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point2<f64>, b: Point2<f64>, tol: f64) {
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        assert!(
            dx < tol && dy < tol,
            "expected ({:.9},{:.9}) ~ ({:.9},{:.9}) within {}",
            a.x,
            a.y,
            b.x,
            b.y,
            tol
        );
    }

    #[test]
    fn four_point_solve_recovers_h() {
        let ground_truth = Homography::new(Matrix3::new(
            0.8, 0.05, 0.12, //
            -0.02, 1.1, 0.08, //
            0.09, -0.04, 1.0,
        ));

        let src = [
            Point2::new(-0.05_f64, -0.05),
            Point2::new(0.05_f64, -0.05),
            Point2::new(0.05_f64, 0.05),
            Point2::new(-0.05_f64, 0.05),
        ];
        let dst = src.map(|p| ground_truth.apply(p).expect("finite"));

        let recovered = homography_from_4pt(&src, &dst).expect("recoverable");

        for p in [
            Point2::new(0.0_f64, 0.0),
            Point2::new(0.03, -0.02),
            Point2::new(-0.04, 0.04),
        ] {
            assert_close(
                recovered.apply(p).expect("finite"),
                ground_truth.apply(p).expect("finite"),
                1e-9,
            );
        }
    }

    #[test]
    fn collinear_points_fail() {
        let src = [
            Point2::new(0.0_f64, 0.0),
            Point2::new(1.0_f64, 0.0),
            Point2::new(2.0_f64, 0.0),
            Point2::new(3.0_f64, 0.0),
        ];
        let dst = src;
        assert!(homography_from_4pt(&src, &dst).is_none());
    }

    #[test]
    fn coincident_points_fail() {
        let p = Point2::new(1.0_f64, 2.0);
        assert!(homography_from_4pt(&[p; 4], &[p; 4]).is_none());
    }
}
