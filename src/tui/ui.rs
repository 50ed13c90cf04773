//! Frame layout: status row, the bordered top box, the input area, then any
//! overlay on top of everything.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders};

use crate::core::layout::{REGION_TOP_INNER, STATUS_ROWS};

use super::component::Component;
use super::message::Screen;
use super::root::RootWindow;

const BOX_BORDER: Color = Color::DarkGray;

pub fn draw(frame: &mut Frame, root: &mut RootWindow) {
    let area = frame.area();
    let [status_area, top_area, bottom_area] = regions(root, area);

    if status_area.height > 0 {
        root.status.render(frame, status_area);
    }

    if root.tree.is_visible() && top_area.height > 0 {
        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(BOX_BORDER));
        let inner = block.inner(top_area);
        frame.render_widget(block, top_area);

        if root.tree.find(REGION_TOP_INNER).is_some_and(|n| n.is_visible()) {
            match root.screen {
                Screen::Log => root.viewport.render(frame, inner),
                Screen::History => root.history.render(frame, inner),
            }
        }
    }

    if root.bottom.is_visible() && bottom_area.height > 0 {
        root.textarea.render(frame, bottom_area);
    }

    if let Some(help) = &mut root.help {
        help.render(frame, area);
    } else if let Some(modal) = &mut root.followup {
        modal.render(frame, area);
    }
}

/// Stack the regions from the top, clipped to the frame.
fn regions(root: &RootWindow, area: Rect) -> [Rect; 3] {
    let mut y = area.y;
    let bottom = area.y + area.height;
    let mut take = |rows: u16| {
        let height = rows.min(bottom.saturating_sub(y));
        let rect = Rect::new(area.x, y, area.width, height);
        y += height;
        rect
    };

    [
        take(STATUS_ROWS),
        take(root.tree.height),
        take(root.bottom.height),
    ]
}
