//! Hot-corner and popup rectangles, in y-up screen coordinates.

use crate::shared::settings::HotCornerMargins;
use crate::shared::types::{Point, Rect};

/// Region around an anchor just below the top centre of the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotCorner {
    anchor: Point,
    margins: HotCornerMargins,
}

impl HotCorner {
    pub fn for_screen(screen: Rect, margins: &HotCornerMargins) -> Self {
        Self {
            anchor: Point::new(screen.mid_x(), screen.max_y() - margins.anchor_inset),
            margins: *margins,
        }
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Open-interval test: points on the edge are outside.
    pub fn contains(&self, p: Point) -> bool {
        let m = &self.margins;
        p.x > self.anchor.x - m.half_width
            && p.x < self.anchor.x + m.half_width
            && p.y > self.anchor.y - m.below
            && p.y < self.anchor.y + m.above
    }
}

/// Revealed popup frame: horizontally centred, flush with the top edge.
pub fn popup_frame(screen: Rect, width: f64, height: f64) -> Rect {
    Rect::new(
        screen.mid_x() - width / 2.0,
        screen.max_y() - height,
        width,
        height,
    )
}

/// Zero-size rect the reveal animation grows from.
pub fn reveal_origin(screen: Rect) -> Rect {
    Rect::new(screen.mid_x(), screen.max_y(), 0.0, 0.0)
}
