//! Modal editor for create, edit and comment forms.
//!
//! Each form field gets its own text buffer. Single-line fields edit one
//! line; the body is multiline. `Ctrl+S` validates locally and hands the
//! form back to the caller; `Esc` cancels.

use cairn_core::form::{FieldKind, IssueForm};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

/// What the editor wants the caller to do after a key.
#[derive(Debug)]
pub enum EditorAction {
    None,
    Cancel,
    /// The form passed local validation.
    Submit(IssueForm),
}

struct FieldBuffer {
    kind: FieldKind,
    lines: Vec<String>,
    row: usize,
    col: usize,
}

impl FieldBuffer {
    fn new(kind: FieldKind, value: &str) -> Self {
        let mut lines: Vec<String> = if kind.is_multiline() {
            value.lines().map(str::to_string).collect()
        } else {
            vec![value.replace('\n', " ")]
        };
        if lines.is_empty() {
            lines.push(String::new());
        }
        let row = lines.len() - 1;
        let col = char_len(&lines[row]);
        Self {
            kind,
            lines,
            row,
            col,
        }
    }

    fn text(&self) -> String {
        self.lines.join("\n")
    }
}

pub struct FormEditor {
    form: IssueForm,
    buffers: Vec<FieldBuffer>,
    active: usize,
    /// Local validation or server-side errors for display.
    errors: Vec<String>,
    /// A submission is in flight.
    pending: bool,
}

impl FormEditor {
    pub fn new(form: IssueForm) -> Self {
        let buffers = form
            .fields()
            .iter()
            .map(|field| FieldBuffer::new(field.kind, &field.value))
            .collect();
        Self {
            form,
            buffers,
            active: 0,
            errors: Vec::new(),
            pending: false,
        }
    }

    pub const fn form(&self) -> &IssueForm {
        &self.form
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// The server sent the form back.
    pub fn reject(&mut self, errors: Vec<String>) {
        self.pending = false;
        self.errors = if errors.is_empty() {
            vec!["The server rejected the form".to_string()]
        } else {
            errors
        };
    }

    fn active_kind(&self) -> Option<FieldKind> {
        self.buffers.get(self.active).map(|b| b.kind)
    }

    fn sync(&mut self) {
        for buffer in &self.buffers {
            self.form.set(buffer.kind, &buffer.text());
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorAction {
        if self.pending {
            return EditorAction::None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return EditorAction::Cancel,
            KeyCode::Char('s') if ctrl => {
                self.sync();
                match self.form.encode() {
                    Ok(_) => {
                        self.errors.clear();
                        self.pending = true;
                        return EditorAction::Submit(self.form.clone());
                    }
                    Err(errors) => {
                        self.errors = errors.iter().map(ToString::to_string).collect();
                    }
                }
            }
            KeyCode::Tab => {
                if !self.buffers.is_empty() {
                    self.active = (self.active + 1) % self.buffers.len();
                }
            }
            KeyCode::BackTab => {
                if !self.buffers.is_empty() {
                    self.active = (self.active + self.buffers.len() - 1) % self.buffers.len();
                }
            }
            _ => {
                if let Some(buffer) = self.buffers.get_mut(self.active) {
                    if buffer.kind.is_multiline() {
                        edit_multiline(&mut buffer.lines, &mut buffer.row, &mut buffer.col, key);
                    } else if key.code != KeyCode::Enter {
                        edit_single_line(&mut buffer.lines[0], &mut buffer.col, key);
                    }
                }
            }
        }
        EditorAction::None
    }

    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        let modal_width = area.width.saturating_sub(8).min(96);
        let modal_height = area.height.saturating_sub(4).min(24);
        let x = area.x + area.width.saturating_sub(modal_width) / 2;
        let y = area.y + area.height.saturating_sub(modal_height) / 2;
        let modal_area = Rect::new(x, y, modal_width, modal_height);

        frame.render_widget(Clear, modal_area);

        let title = format!(" {} · {} ", self.form.kind.title(), self.form.target);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_set(border::ROUNDED)
            .border_style(Style::default().fg(Color::Green))
            .title(title)
            .title_style(
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            );
        let inner = block.inner(modal_area);
        frame.render_widget(block, modal_area);

        let error_height = u16::try_from(self.errors.len()).unwrap_or(u16::MAX).min(4);
        let mut constraints: Vec<Constraint> = self
            .buffers
            .iter()
            .map(|b| {
                if b.kind.is_multiline() {
                    Constraint::Min(4)
                } else {
                    Constraint::Length(3)
                }
            })
            .collect();
        constraints.push(Constraint::Length(error_height));
        constraints.push(Constraint::Length(1));
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        for (idx, buffer) in self.buffers.iter().enumerate() {
            let focused = idx == self.active;
            let lines: Vec<Line<'static>> = buffer
                .lines
                .iter()
                .enumerate()
                .map(|(row, line)| {
                    if focused && row == buffer.row {
                        Line::from(with_cursor(line, buffer.col))
                    } else {
                        Line::from(line.clone())
                    }
                })
                .collect();
            let border_color = if focused { Color::Cyan } else { Color::DarkGray };
            frame.render_widget(
                Paragraph::new(lines).wrap(Wrap { trim: false }).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_set(border::ROUNDED)
                        .border_style(Style::default().fg(border_color))
                        .title(format!(" {} ", buffer.kind.label())),
                ),
                chunks[idx],
            );
        }

        let n = self.buffers.len();
        let errors: Vec<Line<'static>> = self
            .errors
            .iter()
            .map(|e| Line::from(Span::styled(e.clone(), Style::default().fg(Color::Red))))
            .collect();
        frame.render_widget(Paragraph::new(errors), chunks[n]);

        let footer = if self.pending {
            Line::from(Span::styled(
                "Submitting…",
                Style::default().fg(Color::Yellow),
            ))
        } else {
            Line::from(vec![
                Span::styled("Tab", Style::default().fg(Color::Cyan)),
                Span::styled(" next field  ", Style::default().fg(Color::DarkGray)),
                Span::styled("Ctrl+S", Style::default().fg(Color::Cyan)),
                Span::styled(" submit  ", Style::default().fg(Color::DarkGray)),
                Span::styled("Esc", Style::default().fg(Color::Cyan)),
                Span::styled(" cancel", Style::default().fg(Color::DarkGray)),
            ])
        };
        frame.render_widget(Paragraph::new(footer), chunks[n + 1]);
    }
}

pub fn edit_single_line(text: &mut String, cursor: &mut usize, key: KeyEvent) {
    match key.code {
        KeyCode::Left => *cursor = cursor.saturating_sub(1),
        KeyCode::Right => *cursor = (*cursor + 1).min(char_len(text)),
        KeyCode::Home => *cursor = 0,
        KeyCode::End => *cursor = char_len(text),
        KeyCode::Backspace => {
            if *cursor > 0 {
                remove_char_at(text, *cursor - 1);
                *cursor -= 1;
            }
        }
        KeyCode::Delete => remove_char_at(text, *cursor),
        KeyCode::Char(c) => {
            insert_char_at(text, *cursor, c);
            *cursor += 1;
        }
        _ => {}
    }
}

fn edit_multiline(lines: &mut Vec<String>, row: &mut usize, col: &mut usize, key: KeyEvent) {
    if lines.is_empty() {
        lines.push(String::new());
    }
    match key.code {
        KeyCode::Left => {
            if *col > 0 {
                *col -= 1;
            } else if *row > 0 {
                *row -= 1;
                *col = char_len(&lines[*row]);
            }
        }
        KeyCode::Right => {
            let line_len = char_len(&lines[*row]);
            if *col < line_len {
                *col += 1;
            } else if *row + 1 < lines.len() {
                *row += 1;
                *col = 0;
            }
        }
        KeyCode::Up => {
            if *row > 0 {
                *row -= 1;
                *col = (*col).min(char_len(&lines[*row]));
            }
        }
        KeyCode::Down => {
            if *row + 1 < lines.len() {
                *row += 1;
                *col = (*col).min(char_len(&lines[*row]));
            }
        }
        KeyCode::Home => *col = 0,
        KeyCode::End => *col = char_len(&lines[*row]),
        KeyCode::Enter => {
            let split_at = byte_index_at_char(&lines[*row], *col);
            let tail = lines[*row].split_off(split_at);
            *row += 1;
            *col = 0;
            lines.insert(*row, tail);
        }
        KeyCode::Backspace => {
            if *col > 0 {
                let remove_idx = *col - 1;
                remove_char_at(&mut lines[*row], remove_idx);
                *col = remove_idx;
            } else if *row > 0 {
                let current = lines.remove(*row);
                *row -= 1;
                *col = char_len(&lines[*row]);
                lines[*row].push_str(&current);
            }
        }
        KeyCode::Delete => {
            let line_len = char_len(&lines[*row]);
            if *col < line_len {
                remove_char_at(&mut lines[*row], *col);
            } else if *row + 1 < lines.len() {
                let next = lines.remove(*row + 1);
                lines[*row].push_str(&next);
            }
        }
        KeyCode::Char(c) => {
            insert_char_at(&mut lines[*row], *col, c);
            *col += 1;
        }
        _ => {}
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn byte_index_at_char(value: &str, char_idx: usize) -> usize {
    value
        .char_indices()
        .nth(char_idx)
        .map_or(value.len(), |(idx, _)| idx)
}

fn insert_char_at(value: &mut String, char_idx: usize, ch: char) {
    let idx = byte_index_at_char(value, char_idx);
    value.insert(idx, ch);
}

fn remove_char_at(value: &mut String, char_idx: usize) {
    if char_idx >= char_len(value) {
        return;
    }
    let start = byte_index_at_char(value, char_idx);
    let end = byte_index_at_char(value, char_idx + 1);
    value.replace_range(start..end, "");
}

pub fn with_cursor(value: &str, char_idx: usize) -> String {
    let mut out = String::new();
    let mut inserted = false;
    for (idx, ch) in value.chars().enumerate() {
        if idx == char_idx {
            out.push('█');
            inserted = true;
        }
        out.push(ch);
    }
    if !inserted {
        out.push('█');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::IssueKey;
    use cairn_core::form::FormKind;

    fn press(editor: &mut FormEditor, code: KeyCode) -> EditorAction {
        editor.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn type_text(editor: &mut FormEditor, text: &str) {
        for c in text.chars() {
            press(editor, KeyCode::Char(c));
        }
    }

    fn submit(editor: &mut FormEditor) -> EditorAction {
        editor.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL))
    }

    #[test]
    fn comment_body_accepts_newlines() {
        let mut editor = FormEditor::new(IssueForm::comment(IssueKey::new(1, "acme/api")));
        type_text(&mut editor, "first");
        press(&mut editor, KeyCode::Enter);
        type_text(&mut editor, "second");
        match submit(&mut editor) {
            EditorAction::Submit(form) => {
                assert_eq!(form.value(FieldKind::Body), Some("first\nsecond"));
            }
            other => panic!("expected submit, got {other:?}"),
        }
        assert!(editor.is_pending());
    }

    #[test]
    fn submit_requires_title_for_create() {
        let mut editor = FormEditor::new(IssueForm::create("acme/api"));
        assert!(matches!(submit(&mut editor), EditorAction::None));
        assert_eq!(editor.errors().len(), 1);
        assert!(editor.errors()[0].contains("title"));
        assert!(!editor.is_pending());
    }

    #[test]
    fn tab_cycles_fields_and_single_line_ignores_enter() {
        let mut editor = FormEditor::new(IssueForm::create("acme/api"));
        type_text(&mut editor, "Crash");
        press(&mut editor, KeyCode::Enter);
        press(&mut editor, KeyCode::Tab);
        assert_eq!(editor.active_kind(), Some(FieldKind::Body));
        editor.handle_key(KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT));
        assert_eq!(editor.active_kind(), Some(FieldKind::Title));
        match submit(&mut editor) {
            EditorAction::Submit(form) => assert_eq!(form.value(FieldKind::Title), Some("Crash")),
            other => panic!("expected submit, got {other:?}"),
        }
    }

    #[test]
    fn edit_form_starts_prefilled() {
        let mut form = IssueForm::new(FormKind::Edit, IssueKey::new(2, "acme/api"));
        form.set(FieldKind::Title, "Slow search");
        let mut editor = FormEditor::new(form);
        press(&mut editor, KeyCode::Backspace);
        match submit(&mut editor) {
            EditorAction::Submit(form) => {
                assert_eq!(form.value(FieldKind::Title), Some("Slow searc"));
            }
            other => panic!("expected submit, got {other:?}"),
        }
    }

    #[test]
    fn rejected_form_shows_errors_and_unlocks() {
        let mut editor = FormEditor::new(IssueForm::comment(IssueKey::new(1, "acme/api")));
        type_text(&mut editor, "hi");
        assert!(matches!(submit(&mut editor), EditorAction::Submit(_)));
        assert!(matches!(press(&mut editor, KeyCode::Esc), EditorAction::None));

        editor.reject(vec!["Body is too short".into()]);
        assert!(!editor.is_pending());
        assert_eq!(editor.errors(), ["Body is too short"]);
        assert!(matches!(press(&mut editor, KeyCode::Esc), EditorAction::Cancel));
    }

    #[test]
    fn multiline_backspace_joins_lines() {
        let mut lines = vec!["ab".to_string(), "cd".to_string()];
        let (mut row, mut col) = (1, 0);
        edit_multiline(
            &mut lines,
            &mut row,
            &mut col,
            KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE),
        );
        assert_eq!(lines, ["abcd"]);
        assert_eq!((row, col), (0, 2));
    }

    #[test]
    fn with_cursor_marks_position() {
        assert_eq!(with_cursor("ab", 1), "a█b");
        assert_eq!(with_cursor("ab", 2), "ab█");
    }
}
