//! Helpers shared by the overlays drawn over the main screen.

use ratatui::layout::Rect;
use ratatui::style::Color;

pub const OVERLAY_BORDER: Color = Color::Indexed(62);
pub const OVERLAY_BG: Color = Color::Indexed(235);
pub const OVERLAY_FG: Color = Color::Indexed(230);
pub const OVERLAY_HINT: Color = Color::Indexed(240);

/// A `width` x `height` rect centered in `outer`, shrunk to fit.
pub fn centered_fixed(width: u16, height: u16, outer: Rect) -> Rect {
    let width = width.min(outer.width);
    let height = height.min(outer.height);
    Rect {
        x: outer.x + (outer.width - width) / 2,
        y: outer.y + (outer.height - height) / 2,
        width,
        height,
    }
}
