//! Renderers for the individual tools of the swimlane.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use crate::app::dataset::Store;
use crate::app::search::{SearchHit, SearchOutcome};
use crate::app::tool::{
    ChooserView, ChunkList, ModuleTree, SymbolPanel, Tool, ToolKind, ToolState, ToolView, TreeNode,
    TreeRow,
};

const SEARCH_HINT: &str = "(hit enter to type. use * for wildcard searching)";

/// Column width used for each kind of tool.
pub fn tool_width(kind: ToolKind) -> u16 {
    match kind {
        ToolKind::Chooser => 30,
        ToolKind::Chunks => 36,
        ToolKind::Modules => 42,
        ToolKind::Symbols => 100,
    }
}

fn accent(kind: ToolKind) -> Color {
    match kind {
        ToolKind::Chooser => Color::Green,
        ToolKind::Chunks => Color::Cyan,
        ToolKind::Modules => Color::Magenta,
        ToolKind::Symbols => Color::Yellow,
    }
}

pub fn tool_title(tool: &Tool) -> String {
    let title = match tool.view() {
        ToolView::Chooser(_) => "tools".to_owned(),
        ToolView::Chunks(list) => format!("chunks (x{})", list.rows().len()),
        ToolView::Modules(tree) => {
            let modules = tree
                .rows()
                .iter()
                .filter(|row| matches!(row.node, TreeNode::Module(_)))
                .count();
            format!("modules (x{modules})")
        }
        ToolView::Symbols(_) => "symbols".to_owned(),
    };
    if tool.state() == ToolState::Loading {
        format!("{title} · loading")
    } else {
        title
    }
}

/// One text line per module tree row, indented by depth.
pub fn module_tree_line(row: &TreeRow) -> String {
    let indent = "  ".repeat(row.depth);
    match row.node {
        TreeNode::Dir(_) => format!("{indent}▾ {}/ ({})", row.name, row.count),
        TreeNode::Module(_) => format!("{indent}• {} (c{})", row.name, row.count),
    }
}

pub fn render_tool(frame: &mut Frame<'_>, area: Rect, tool: &Tool, store: &Store, focused: bool) {
    let color = accent(tool.kind());
    let mut border = Style::default().fg(color);
    if focused {
        border = border.add_modifier(Modifier::BOLD);
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(
            tool_title(tool),
            if focused {
                Style::default().fg(Color::Black).bg(color)
            } else {
                Style::default().fg(color)
            },
        ));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match tool.view() {
        ToolView::Chooser(view) => render_chooser(frame, inner, view, focused),
        ToolView::Chunks(list) => render_chunks(frame, inner, list, store, focused),
        ToolView::Modules(tree) => render_modules(frame, inner, tree, focused),
        ToolView::Symbols(panel) => render_symbols(frame, inner, panel, store),
    }
}

fn highlight(focused: bool, color: Color) -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(if focused { color } else { Color::Gray })
        .add_modifier(Modifier::BOLD)
}

fn render_list(
    frame: &mut Frame<'_>,
    area: Rect,
    items: Vec<ListItem<'static>>,
    selected: Option<usize>,
    style: Style,
) {
    if items.is_empty() {
        let placeholder = Paragraph::new("(empty)").style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        );
        frame.render_widget(placeholder, area);
        return;
    }
    let mut state = ListState::default();
    state.select(selected);
    let list = List::new(items).highlight_style(style).highlight_symbol("▸ ");
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_chooser(frame: &mut Frame<'_>, area: Rect, view: &ChooserView, focused: bool) {
    let items = view
        .options()
        .iter()
        .map(|option| {
            let style = if option.count == 0 && option.kind != ToolKind::Symbols {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(Line::styled(option.label(), style))
        })
        .collect();
    render_list(frame, area, items, view.cursor(), highlight(focused, Color::Yellow));
}

fn render_chunks(frame: &mut Frame<'_>, area: Rect, list: &ChunkList, store: &Store, focused: bool) {
    let items = list
        .rows()
        .iter()
        .map(|id| ListItem::new(ChunkList::row_label(store, *id)))
        .collect();
    render_list(frame, area, items, Some(list.cursor()), highlight(focused, Color::Cyan));
}

fn render_modules(frame: &mut Frame<'_>, area: Rect, tree: &ModuleTree, focused: bool) {
    let items = tree
        .rows()
        .iter()
        .map(|row| {
            let style = match row.node {
                TreeNode::Dir(_) => Style::default().fg(Color::Yellow),
                TreeNode::Module(_) => Style::default(),
            };
            ListItem::new(Line::styled(module_tree_line(row), style))
        })
        .collect();
    render_list(frame, area, items, Some(tree.cursor()), highlight(focused, Color::Magenta));
}

fn render_symbols(frame: &mut Frame<'_>, area: Rect, panel: &SymbolPanel, store: &Store) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(2), Constraint::Min(1)])
        .split(area);

    let mut search_style = Style::default().fg(Color::Yellow);
    if panel.is_editing() {
        search_style = search_style.add_modifier(Modifier::BOLD);
    }
    let search_block = Block::default()
        .borders(Borders::ALL)
        .border_style(search_style)
        .title("search");
    let query = if panel.is_editing() {
        Line::from(vec![
            Span::raw(panel.query().to_owned()),
            Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        ])
    } else if panel.query().is_empty() {
        Line::styled(SEARCH_HINT, Style::default().fg(Color::DarkGray))
    } else {
        Line::raw(panel.query().to_owned())
    };
    frame.render_widget(Paragraph::new(query).block(search_block), layout[0]);

    let Some(outcome) = panel.outcome() else {
        return;
    };
    let results = match outcome {
        SearchOutcome::NoMatches { .. } => {
            frame.render_widget(
                Paragraph::new("(no matches)").style(Style::default().fg(Color::DarkGray)),
                layout[1],
            );
            return;
        }
        SearchOutcome::Matches(results) => results,
    };

    let summary = format!(
        " symbols ({:.1} kB) modules (x{}) chunks (x{}) ",
        results.matched_bytes as f64 / 1024.0,
        results.dataset.modules.len(),
        results.dataset.chunks.len(),
    );
    frame.render_widget(
        Paragraph::new(Line::styled(
            summary,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Gray)
                .add_modifier(Modifier::BOLD),
        )),
        layout[1],
    );

    let lines: Vec<Line<'static>> = results
        .hits
        .iter()
        .skip(panel.scroll())
        .take(layout[2].height as usize)
        .map(|hit| hit_line(store, hit))
        .collect();
    frame.render_widget(Paragraph::new(lines), layout[2]);
}

/// A search hit with its location and the match highlighted in context.
pub fn hit_line(store: &Store, hit: &SearchHit) -> Line<'static> {
    let module = store.module(hit.symbol.module);
    Line::from(vec![
        Span::styled(
            format!("{}:{}:{} ", module.path, hit.symbol.line + 1, hit.symbol.column),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(hit.context.before.trim_start().to_owned()),
        Span::styled(
            hit.context.matched.clone(),
            Style::default()
                .bg(Color::Green)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(hit.context.after.clone()),
    ])
}
