//! Global cursor position and main-screen geometry.
//!
//! Cursor samples come from `mouse_position` (top-left origin) and are flipped
//! into the y-up space the hot-corner test works in.

use mouse_position::mouse_position::Mouse;

use crate::core::activation::poller::PointerTracker;
use crate::shared::types::{Point, Rect};

pub struct SystemPointer;

impl PointerTracker for SystemPointer {
    fn cursor(&self) -> Option<Point> {
        let Mouse::Position { x, y } = Mouse::get_mouse_position() else {
            return None;
        };
        let flip_height = platform::primary_screen_height()?;
        Some(flip_to_y_up(x, y, flip_height))
    }

    fn main_screen(&self) -> Option<Rect> {
        platform::main_screen()
    }
}

/// Convert top-left-origin pixel coordinates into y-up points.
fn flip_to_y_up(x: i32, y: i32, primary_height: f64) -> Point {
    Point::new(f64::from(x), primary_height - f64::from(y))
}

#[cfg(target_os = "macos")]
mod platform {
    use cocoa::base::{id, nil};
    use cocoa::foundation::{NSRect, NSUInteger};
    use objc::{class, msg_send, sel, sel_impl};

    use crate::shared::types::Rect;

    fn to_rect(frame: NSRect) -> Rect {
        Rect::new(frame.origin.x, frame.origin.y, frame.size.width, frame.size.height)
    }

    /// Screen holding the key window, as the popup is placed on it.
    pub fn main_screen() -> Option<Rect> {
        unsafe {
            let screen: id = msg_send![class!(NSScreen), mainScreen];
            if screen == nil {
                return None;
            }
            let frame: NSRect = msg_send![screen, frame];
            Some(to_rect(frame))
        }
    }

    /// Global coordinates are flipped relative to the first (menu bar) screen.
    pub fn primary_screen_height() -> Option<f64> {
        unsafe {
            let screens: id = msg_send![class!(NSScreen), screens];
            if screens == nil {
                return None;
            }
            let count: NSUInteger = msg_send![screens, count];
            if count == 0 {
                return None;
            }
            let primary: id = msg_send![screens, objectAtIndex: 0 as NSUInteger];
            let frame: NSRect = msg_send![primary, frame];
            Some(frame.size.height)
        }
    }
}

#[cfg(not(target_os = "macos"))]
mod platform {
    use crate::shared::types::Rect;

    pub fn main_screen() -> Option<Rect> {
        None
    }

    pub fn primary_screen_height() -> Option<f64> {
        None
    }
}
