//! One-line banner drawing an arc between tools that selected the same item.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};

use crate::app::cycle::CycleEdge;

const LABEL: &str = " c y c l e ";

/// Arc spanning from the centre of one column to the centre of another.
pub fn arc(width: u16) -> String {
    match width {
        0 => String::new(),
        1 => "═".to_owned(),
        _ => format!("╔{}╗", "═".repeat(usize::from(width) - 2)),
    }
}

#[derive(Debug, Default)]
pub struct CycleBar;

impl CycleBar {
    pub fn render(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        edges: &[CycleEdge],
        columns: &[Option<Rect>],
    ) {
        if edges.is_empty() || area.height == 0 {
            return;
        }
        let buffer = frame.buffer_mut();
        let right = area.x.saturating_add(area.width);

        for edge in edges {
            let (Some(Some(from)), Some(Some(to))) = (columns.get(edge.from), columns.get(edge.to))
            else {
                continue;
            };
            let start = from.x + from.width / 2;
            let end = (to.x + to.width / 2).min(right);
            if end <= start {
                continue;
            }
            buffer.set_string(start, area.y, arc(end - start), Style::default().fg(Color::Red));
        }

        buffer.set_string(
            area.x,
            area.y,
            LABEL,
            Style::default().fg(Color::Black).bg(Color::Red),
        );
    }
}
