//! Lays tools out as columns, newest on the right.

use ratatui::Frame;
use ratatui::layout::Rect;

use crate::app::dataset::Store;
use crate::app::swimlane::Swimlane;
use crate::ui::components::tools::{render_tool, tool_width};

const GAP: u16 = 1;

/// Screen column of each tool, `None` for tools scrolled off the left edge.
///
/// The rightmost tools are kept; the focused one is always the newest.
pub fn columns(widths: &[u16], area: Rect) -> Vec<Option<Rect>> {
    let mut first_visible = widths.len();
    let mut used: u16 = 0;
    for (index, width) in widths.iter().enumerate().rev() {
        let needed = if used == 0 { *width } else { width + GAP };
        if used.saturating_add(needed) > area.width && first_visible < widths.len() {
            break;
        }
        used = used.saturating_add(needed);
        first_visible = index;
    }

    let mut x = area.x;
    let right = area.x.saturating_add(area.width);
    widths
        .iter()
        .enumerate()
        .map(|(index, width)| {
            if index < first_visible || x >= right {
                return None;
            }
            let rect = Rect {
                x,
                y: area.y,
                width: (*width).min(right - x),
                height: area.height,
            };
            x = x.saturating_add(width + GAP);
            Some(rect)
        })
        .collect()
}

pub fn tool_columns(swimlane: &Swimlane, area: Rect) -> Vec<Option<Rect>> {
    let widths: Vec<u16> = swimlane
        .tools()
        .iter()
        .map(|tool| tool_width(tool.kind()))
        .collect();
    columns(&widths, area)
}

#[derive(Debug, Default)]
pub struct SwimlaneView;

impl SwimlaneView {
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect, swimlane: &Swimlane, store: &Store) {
        let focused = swimlane.focused_id();
        for (tool, column) in swimlane.tools().iter().zip(tool_columns(swimlane, area)) {
            if let Some(column) = column {
                render_tool(frame, column, tool, store, Some(tool.id()) == focused);
            }
        }
    }
}
