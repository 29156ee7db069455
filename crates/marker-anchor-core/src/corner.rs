use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Labels for the four corners of a square marker, in the marker's own frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum CornerLabel {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

/// Four screen-space corners of one marker detection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerCorners {
    pub top_left: Point2<f64>,
    pub top_right: Point2<f64>,
    pub bottom_right: Point2<f64>,
    pub bottom_left: Point2<f64>,
}

impl MarkerCorners {
    pub fn new(
        top_left: Point2<f64>,
        top_right: Point2<f64>,
        bottom_right: Point2<f64>,
        bottom_left: Point2<f64>,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// Corner position by label.
    #[inline]
    pub fn get(&self, label: CornerLabel) -> Point2<f64> {
        match label {
            CornerLabel::TopLeft => self.top_left,
            CornerLabel::TopRight => self.top_right,
            CornerLabel::BottomRight => self.bottom_right,
            CornerLabel::BottomLeft => self.bottom_left,
        }
    }
}

impl Default for MarkerCorners {
    fn default() -> Self {
        let origin = Point2::new(0.0, 0.0);
        Self::new(origin, origin, origin, origin)
    }
}

/// Latest marker detection together with its physical side length and the
/// frame-to-frame visibility flag.
///
/// Visibility is a liveness heuristic, not a detection confidence: the marker
/// counts as visible only while its top-left corner keeps moving between
/// consecutive frames. A detector that re-reports the exact same position is
/// indistinguishable from a stale detection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerObservation {
    pub corners: MarkerCorners,
    /// Physical side length of the printed marker, in meters.
    pub side_length: f64,
    pub visible: bool,
}

impl MarkerObservation {
    pub fn new(side_length: f64) -> Self {
        Self {
            corners: MarkerCorners::default(),
            side_length,
            visible: false,
        }
    }

    /// Overwrite the stored corners with this frame's detection and recompute
    /// the visibility flag.
    pub fn advance(&mut self, corners: MarkerCorners) {
        self.visible = corners.top_left != self.corners.top_left;
        self.corners = corners;
    }

    /// Mark the marker as not visible, keeping the last corners.
    pub fn mark_hidden(&mut self) {
        self.visible = false;
    }
}
