//! Drawing for boards, detail surfaces, help and alerts.

use super::editor::with_cursor;
use super::keymap::Keymap;
use cairn_core::command::{Command, Scope};
use cairn_core::nav::Highlight;
use cairn_core::panel::PanelKind;
use cairn_core::session::Session;
use cairn_core::surface::{Surface, SurfaceState};
use cairn_core::tree::{BoardId, GroupId, ItemId};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

const HIGHLIGHT: Style = Style::new().bg(Color::DarkGray).add_modifier(Modifier::BOLD);
const KEY: Style = Style::new().fg(Color::Cyan);
const DIM: Style = Style::new().fg(Color::DarkGray);

/// What a mouse click at a screen cell refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Item(ItemId),
    Group(GroupId),
    Panel(PanelKind),
}

/// Clickable regions from the last frame. Later entries sit on top.
#[derive(Debug, Default)]
pub struct HitMap {
    entries: Vec<(Rect, Hit)>,
}

impl HitMap {
    pub fn push(&mut self, area: Rect, hit: Hit) {
        if area.width > 0 && area.height > 0 {
            self.entries.push((area, hit));
        }
    }

    #[must_use]
    pub fn at(&self, x: u16, y: u16) -> Option<Hit> {
        self.entries
            .iter()
            .rev()
            .find(|(area, _)| area.contains((x, y).into()))
            .map(|(_, hit)| *hit)
    }
}

fn panel_block(title: String, focused: bool) -> Block<'static> {
    let (border_color, title_color) = if focused {
        (Color::Green, Color::White)
    } else {
        (Color::DarkGray, Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(border_color))
        .title(title)
        .title_style(
            Style::default()
                .fg(title_color)
                .add_modifier(Modifier::BOLD),
        )
}

/// Draw one board. `editing` carries the filter buffer while its input has focus.
pub fn board_panel(
    frame: &mut Frame<'_>,
    area: Rect,
    session: &Session,
    board_id: BoardId,
    editing: Option<&str>,
    hits: &mut HitMap,
) {
    let tree = session.tree();
    let board = tree.board(board_id);
    let focused = session.current_panel() == PanelKind::Board(board_id);
    let block = panel_block(format!(" {} ", board.name), focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    hits.push(area, Hit::Panel(PanelKind::Board(board_id)));

    let mut body = inner;
    if let Some(binding) = board.filter() {
        let line = match editing {
            Some(buf) => Line::from(vec![
                Span::styled("/ ", KEY),
                Span::styled(
                    with_cursor(buf, buf.chars().count()),
                    Style::default().fg(Color::White),
                ),
            ]),
            None if binding.query.is_empty() => Line::from(Span::styled("/ filter", DIM)),
            None => Line::from(vec![
                Span::styled("/ ", DIM),
                Span::styled(binding.query.clone(), KEY),
            ]),
        };
        frame.render_widget(Paragraph::new(line), Rect { height: 1.min(inner.height), ..inner });
        body = Rect {
            y: inner.y.saturating_add(1),
            height: inner.height.saturating_sub(1),
            ..inner
        };
    }

    let highlight = if session.nav().current_board() == Some(board_id) {
        session.nav().highlight()
    } else {
        None
    };

    let mut rows: Vec<(Line<'static>, Option<Hit>)> = Vec::new();
    let mut selected_row = None;
    for &group_id in board.groups() {
        let group = tree.group(group_id);
        let counter = group.counter();
        let marker = if group.is_expanding() {
            "… "
        } else if group.is_collapsed() {
            "▸ "
        } else {
            "▾ "
        };
        let counter_style = if counter.is_filtered() {
            Style::default().fg(Color::Yellow)
        } else {
            DIM
        };
        let mut line = Line::from(vec![
            Span::styled(marker, DIM),
            Span::styled(
                group.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" ({counter})"), counter_style),
        ]);
        if highlight == Some(Highlight::Group(group_id)) {
            selected_row = Some(rows.len());
            line = line.style(HIGHLIGHT);
        }
        rows.push((line, Some(Hit::Group(group_id))));

        if !group.is_expanded() {
            continue;
        }
        if group.filtered().is_empty() && counter.total > 0 {
            rows.push((Line::from(Span::styled("    no matches", DIM)), None));
        }
        for &item_id in group.filtered() {
            let item = tree.item(item_id);
            let number = if group.repository.as_deref() == Some(item.key.repository.as_str()) {
                format!("  #{:<5} ", item.key.number)
            } else {
                format!("  {} ", item.key)
            };
            let closed = item.state.as_deref() == Some("closed");
            let title_style = if closed { DIM } else { Style::default() };
            let mut spans = vec![
                Span::styled(number, DIM),
                Span::styled(item.title.clone(), title_style),
            ];
            if !item.labels.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", item.labels.join(" ")),
                    Style::default().fg(Color::Magenta),
                ));
            }
            let mut line = Line::from(spans);
            if highlight == Some(Highlight::Item(item_id)) {
                selected_row = Some(rows.len());
                line = line.style(HIGHLIGHT);
            }
            rows.push((line, Some(Hit::Item(item_id))));
        }
    }

    if rows.is_empty() {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled("No issues", DIM))),
            body,
        );
        return;
    }

    let height = usize::from(body.height);
    let offset = selected_row.map_or(0, |row| (row + 1).saturating_sub(height));
    for (index, (_, hit)) in rows.iter().enumerate().skip(offset).take(height) {
        if let Some(hit) = hit {
            let y = body.y + u16::try_from(index - offset).unwrap_or(u16::MAX);
            hits.push(Rect::new(body.x, y, body.width, 1), *hit);
        }
    }
    let lines: Vec<Line<'static>> = rows.into_iter().skip(offset).map(|(line, _)| line).collect();
    frame.render_widget(Paragraph::new(lines), body);
}

/// Draw a detail surface with already-rendered content lines.
pub fn detail_panel(
    frame: &mut Frame<'_>,
    area: Rect,
    surface: &Surface,
    item_title: Option<&str>,
    document: &[Line<'static>],
    focused: bool,
) {
    let target = surface.target();
    let mut title = if target.is_empty() {
        " Issue ".to_string()
    } else {
        match item_title.filter(|t| !t.is_empty()) {
            Some(item_title) => format!(" {target} · {item_title} "),
            None => format!(" {target} "),
        }
    };
    if surface.is_verbose() {
        title.push_str("[full] ");
    }
    let block = panel_block(title, focused);

    let paragraph = match surface.state() {
        SurfaceState::Empty => Paragraph::new(Line::from(Span::styled(
            "Select an issue to show it here",
            DIM,
        ))),
        SurfaceState::Loading => Paragraph::new(Line::from(Span::styled(
            "Loading…",
            Style::default().fg(Color::Yellow),
        ))),
        SurfaceState::Ready(_) => {
            let offset = surface.scroll().map_or(0, |binding| binding.offset);
            Paragraph::new(document.to_vec())
                .wrap(Wrap { trim: false })
                .scroll((offset, 0))
        }
        SurfaceState::Failed(message) => Paragraph::new(vec![
            Line::from(Span::styled(message.clone(), Style::default().fg(Color::Red))),
            Line::default(),
            Line::from(vec![
                Span::styled("x", KEY),
                Span::styled(" dismiss  ", DIM),
                Span::styled("r", KEY),
                Span::styled(" retry", DIM),
            ]),
        ])
        .wrap(Wrap { trim: true }),
    };
    frame.render_widget(paragraph.block(block), area);
}

/// Centered area covering most of `area`.
#[must_use]
pub fn overlay_area(area: Rect) -> Rect {
    let width = area.width.saturating_mul(4) / 5;
    let height = area.height.saturating_mul(4) / 5;
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

/// Key/description pairs for the status bar.
#[must_use]
pub fn hint_line(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, label) in hints {
        spans.push(Span::styled((*key).to_string(), KEY));
        spans.push(Span::styled(format!(" {label}  "), DIM));
    }
    Line::from(spans)
}

const VIEW_KEYS: &[(&str, &str, &str)] = &[
    ("q", "global", "quit"),
    ("?", "global", "open help overlay"),
    ("#", "global", "go to issue by number"),
    ("a", "global", "new issue"),
    ("e", "global", "edit selected issue"),
    ("c", "global", "comment on selected issue"),
    ("x", "detail", "dismiss load error"),
    ("Enter", "filter", "apply and leave filter"),
    ("Esc", "filter", "leave filter"),
    ("Ctrl+U", "filter", "clear filter text"),
    ("Tab", "form", "next field"),
    ("Shift+Tab", "form", "previous field"),
    ("Ctrl+S", "form", "submit"),
    ("Esc", "form", "cancel"),
];

const fn scope_label(scope: Scope) -> &'static str {
    match scope {
        Scope::Board => "board",
        Scope::Panel => "detail",
        Scope::Focus => "panel",
    }
}

/// Every help row: bound commands first, then view keys.
#[must_use]
pub fn help_rows() -> Vec<(String, &'static str, &'static str)> {
    let mut rows: Vec<(String, &'static str, &'static str)> = Command::ALL
        .into_iter()
        .map(|command| {
            (
                Keymap::keys_for(command).join("/"),
                scope_label(command.scope()),
                command.describe(),
            )
        })
        .collect();
    rows.extend(
        VIEW_KEYS
            .iter()
            .map(|&(key, ctx, desc)| (key.to_string(), ctx, desc)),
    );
    rows
}

pub fn help_overlay(frame: &mut Frame<'_>, area: Rect, query: &str) {
    let popup_w = area.width.saturating_sub(8).min(96);
    let popup_h = area.height.saturating_sub(6).min(40);
    let x = area.x + area.width.saturating_sub(popup_w) / 2;
    let y = area.y + area.height.saturating_sub(popup_h) / 2;
    let popup = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup);
    let block = panel_block(" Hotkeys ".to_string(), true);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let rows_area = Rect {
        x: inner.x,
        y: inner.y + 2,
        width: inner.width,
        height: inner.height.saturating_sub(3),
    };

    let needle = query.to_lowercase();
    let mut lines: Vec<Line<'static>> = help_rows()
        .into_iter()
        .filter(|(key, ctx, desc)| {
            needle.is_empty()
                || key.to_lowercase().contains(&needle)
                || ctx.contains(&needle)
                || desc.to_lowercase().contains(&needle)
        })
        .map(|(key, ctx, desc)| {
            Line::from(vec![
                Span::styled(format!("{key:14}"), KEY),
                Span::styled(format!("{ctx:8}"), KEY),
                Span::styled(desc.to_string(), Style::default().fg(Color::White)),
            ])
        })
        .collect();
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No hotkeys match the current filter",
            DIM,
        )));
    }

    let query_line = Line::from(vec![
        Span::styled("Filter: ", DIM),
        Span::styled(
            with_cursor(query, query.chars().count()),
            Style::default().fg(Color::White),
        ),
    ]);
    frame.render_widget(Paragraph::new(query_line), Rect { height: 1.min(inner.height), ..inner });
    frame.render_widget(Paragraph::new(lines), rows_area);
    frame.render_widget(
        Paragraph::new(hint_line(&[("Esc", "close"), ("Type", "search hotkeys")])),
        Rect {
            x: inner.x,
            y: inner.y + inner.height.saturating_sub(1),
            width: inner.width,
            height: 1.min(inner.height),
        },
    );
}

/// Blocking message box.
pub fn alert_box(frame: &mut Frame<'_>, area: Rect, message: &str) {
    let width = area.width.saturating_sub(8).min(64);
    let height = 7.min(area.height);
    let popup = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_set(border::ROUNDED)
        .border_style(Style::default().fg(Color::Red))
        .title(" Error ")
        .title_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD));
    let lines = vec![
        Line::from(message.to_string()),
        Line::default(),
        hint_line(&[("Enter", "dismiss")]),
    ];
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
        popup,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_hits_win() {
        let mut hits = HitMap::default();
        hits.push(Rect::new(0, 0, 10, 10), Hit::Panel(PanelKind::InlineDetail));
        hits.push(Rect::new(2, 2, 4, 1), Hit::Panel(PanelKind::OverlayDetail));
        assert_eq!(hits.at(3, 2), Some(Hit::Panel(PanelKind::OverlayDetail)));
        assert_eq!(hits.at(3, 5), Some(Hit::Panel(PanelKind::InlineDetail)));
        assert_eq!(hits.at(20, 20), None);
    }

    #[test]
    fn empty_areas_are_not_clickable() {
        let mut hits = HitMap::default();
        hits.push(Rect::new(0, 0, 0, 5), Hit::Panel(PanelKind::InlineDetail));
        assert_eq!(hits.at(0, 0), None);
    }

    #[test]
    fn help_lists_every_command() {
        let rows = help_rows();
        for command in Command::ALL {
            assert!(rows.iter().any(|(_, _, desc)| *desc == command.describe()));
        }
        assert!(rows.iter().any(|(key, _, _)| key == "#"));
    }

    #[test]
    fn overlay_is_centered() {
        let area = overlay_area(Rect::new(0, 0, 100, 50));
        assert_eq!(area, Rect::new(10, 5, 80, 40));
    }
}
