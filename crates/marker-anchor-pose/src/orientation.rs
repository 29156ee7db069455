use log::debug;
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use marker_anchor_core::{CornerLabel, MarkerCorners};

/// Device display orientation as reported by the host UI layer.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DisplayOrientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    Unknown,
}

/// Axis permutation plus sign flips applied to the raw solver output.
///
/// The same correction is applied to the quaternion vector part and to the
/// translation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisCorrection {
    /// Source index in the raw (x, y, z) triple for each output axis.
    pub perm: [usize; 3],
    /// Sign applied after the permutation.
    pub signs: [f64; 3],
}

impl AxisCorrection {
    /// Apply to a raw (x, y, z) triple.
    #[inline]
    pub fn apply(&self, raw: [f64; 3]) -> [f64; 3] {
        [
            self.signs[0] * raw[self.perm[0]],
            self.signs[1] * raw[self.perm[1]],
            self.signs[2] * raw[self.perm[2]],
        ]
    }
}

/// Everything orientation-dependent in the corner-to-pose path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrientationProfile {
    /// Which marker corner feeds each canonical solver slot.
    pub corner_order: [CornerLabel; 4],
    /// Portrait-family orientations scale screen x by image-height over
    /// viewport-width and screen y by image-width over viewport-height;
    /// landscape orientations use the unswapped image dimensions.
    pub swap_image_axes: bool,
    pub correction: AxisCorrection,
}

const PORTRAIT: OrientationProfile = OrientationProfile {
    corner_order: [
        CornerLabel::BottomRight,
        CornerLabel::TopRight,
        CornerLabel::TopLeft,
        CornerLabel::BottomLeft,
    ],
    swap_image_axes: true,
    correction: AxisCorrection {
        perm: [1, 0, 2],
        signs: [1.0, 1.0, -1.0],
    },
};

const LANDSCAPE_LEFT: OrientationProfile = OrientationProfile {
    corner_order: [
        CornerLabel::BottomRight,
        CornerLabel::TopRight,
        CornerLabel::TopLeft,
        CornerLabel::BottomLeft,
    ],
    swap_image_axes: false,
    correction: AxisCorrection {
        perm: [0, 1, 2],
        signs: [-1.0, 1.0, -1.0],
    },
};

const LANDSCAPE_RIGHT: OrientationProfile = OrientationProfile {
    corner_order: [
        CornerLabel::TopLeft,
        CornerLabel::BottomLeft,
        CornerLabel::BottomRight,
        CornerLabel::TopRight,
    ],
    swap_image_axes: false,
    correction: AxisCorrection {
        perm: [0, 1, 2],
        signs: [1.0, -1.0, -1.0],
    },
};

impl DisplayOrientation {
    /// Profile for this orientation.
    ///
    /// `None` for portrait-upside-down and unknown orientations: pose
    /// recovery is a no-op there, not an error.
    pub fn profile(self) -> Option<&'static OrientationProfile> {
        match self {
            DisplayOrientation::Portrait => Some(&PORTRAIT),
            DisplayOrientation::LandscapeLeft => Some(&LANDSCAPE_LEFT),
            DisplayOrientation::LandscapeRight => Some(&LANDSCAPE_RIGHT),
            DisplayOrientation::PortraitUpsideDown | DisplayOrientation::Unknown => None,
        }
    }
}

/// Scale screen-space corners into image pixels and reorder them into the
/// canonical solver slot order.
///
/// `image_resolution` and `viewport` are (width, height). Returns `None`
/// when either size is non-positive.
pub fn solver_corners(
    corners: &MarkerCorners,
    image_resolution: Vector2<f64>,
    viewport: Vector2<f64>,
    profile: &OrientationProfile,
) -> Option<[Point2<f64>; 4]> {
    if image_resolution.x <= 0.0
        || image_resolution.y <= 0.0
        || viewport.x <= 0.0
        || viewport.y <= 0.0
    {
        debug!(
            "invalid frame geometry: image {}x{}, viewport {}x{}",
            image_resolution.x, image_resolution.y, viewport.x, viewport.y
        );
        return None;
    }

    let (x_coef, y_coef) = if profile.swap_image_axes {
        (image_resolution.y / viewport.x, image_resolution.x / viewport.y)
    } else {
        (image_resolution.x / viewport.x, image_resolution.y / viewport.y)
    };

    Some(profile.corner_order.map(|label| {
        let p = corners.get(label);
        Point2::new(p.x * x_coef, p.y * y_coef)
    }))
}
