//! Axis-aligned box geometry.
//!
//! Boxes are stored in corner form (`left`, `top`, `right`, `bottom`) in pixel
//! units. The detection head emits center form (`cx`, `cy`, `w`, `h`), which is
//! converted with [`CenterBox::to_corners`].

pub mod iou;
pub mod transform;

pub use iou::{box_intersection, box_iou, box_union};
pub use transform::FrameTransform;

/// Corner-form axis-aligned rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    /// Creates a box from its corner coordinates.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Horizontal extent; negative for inverted boxes.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Vertical extent; negative for inverted boxes.
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Area with inverted extents counted as zero.
    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Center point `(cx, cy)`.
    pub fn center(&self) -> (f32, f32) {
        (
            (self.left + self.right) / 2.0,
            (self.top + self.bottom) / 2.0,
        )
    }

    /// Clamps the box into `[0, width - 1] x [0, height - 1]`.
    ///
    /// Only the outward-facing edge is clamped on each side: `left`/`top` are
    /// raised to zero and `right`/`bottom` are lowered to the last pixel.
    pub fn clamp_to(&self, width: usize, height: usize) -> Self {
        let max_x = width.saturating_sub(1) as f32;
        let max_y = height.saturating_sub(1) as f32;
        Self {
            left: self.left.max(0.0),
            top: self.top.max(0.0),
            right: self.right.min(max_x),
            bottom: self.bottom.min(max_y),
        }
    }
}

/// Center-form box as produced by the detection head.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CenterBox {
    pub cx: f32,
    pub cy: f32,
    pub w: f32,
    pub h: f32,
}

impl CenterBox {
    /// Builds a center-form box from a `[cx, cy, w, h]` row.
    pub fn from_row(row: &[f32; 4]) -> Self {
        Self {
            cx: row[0],
            cy: row[1],
            w: row[2],
            h: row[3],
        }
    }

    /// True when all four components are finite.
    pub fn is_finite(&self) -> bool {
        self.cx.is_finite() && self.cy.is_finite() && self.w.is_finite() && self.h.is_finite()
    }

    /// Converts to corner form without clamping.
    pub fn to_corners(&self) -> BoundingBox {
        let half_w = self.w / 2.0;
        let half_h = self.h / 2.0;
        BoundingBox {
            left: self.cx - half_w,
            top: self.cy - half_h,
            right: self.cx + half_w,
            bottom: self.cy + half_h,
        }
    }
}

impl From<CenterBox> for BoundingBox {
    fn from(value: CenterBox) -> Self {
        value.to_corners()
    }
}
