//! Markdown issue content to styled terminal lines.

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

const REF_STYLE: Style = Style::new().fg(Color::Magenta).add_modifier(Modifier::BOLD);
const CODE_STYLE: Style = Style::new().fg(Color::Yellow);

#[derive(Default)]
struct Renderer {
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    styles: Vec<Style>,
    /// Next number per open list; `None` for bullet lists.
    lists: Vec<Option<u64>>,
    in_code_block: bool,
}

impl Renderer {
    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, patch: Style) {
        let next = self.style().patch(patch);
        self.styles.push(next);
    }

    fn flush(&mut self) {
        if !self.spans.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.spans)));
        }
    }

    fn blank(&mut self) {
        self.flush();
        if self.lines.last().is_some_and(|line| line.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn text(&mut self, text: &str) {
        if self.in_code_block {
            for line in text.lines() {
                self.lines
                    .push(Line::from(Span::styled(format!("  {line}"), CODE_STYLE)));
            }
            return;
        }
        let style = self.style();
        for (chunk, is_ref) in split_issue_refs(text) {
            let span_style = if is_ref { style.patch(REF_STYLE) } else { style };
            self.spans.push(Span::styled(chunk.to_string(), span_style));
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } => {
                self.blank();
                self.push_style(Style::new().fg(Color::Cyan).add_modifier(Modifier::BOLD));
            }
            Tag::Emphasis => self.push_style(Style::new().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::new().add_modifier(Modifier::BOLD)),
            Tag::Link { .. } => self.push_style(
                Style::new()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED),
            ),
            Tag::CodeBlock(_) => {
                self.blank();
                self.in_code_block = true;
            }
            Tag::List(start) => {
                if self.lists.is_empty() {
                    self.blank();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let marker = format!("{indent}{next}. ");
                        *next += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.spans
                    .push(Span::styled(marker, Style::new().fg(Color::DarkGray)));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.flush();
                self.styles.pop();
                self.blank();
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Link => {
                self.styles.pop();
            }
            TagEnd::Paragraph => {
                if self.lists.is_empty() {
                    self.blank();
                } else {
                    self.flush();
                }
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.blank();
            }
            TagEnd::Item => self.flush(),
            TagEnd::List(_) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            _ => {}
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|line| line.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Render Markdown into lines for a `Paragraph`.
#[must_use]
pub fn render_markdown(source: &str) -> Vec<Line<'static>> {
    let mut renderer = Renderer::default();
    for event in Parser::new(source) {
        match event {
            Event::Start(tag) => renderer.start(tag),
            Event::End(tag) => renderer.end(tag),
            Event::Text(text) => renderer.text(&text),
            Event::Code(code) => renderer
                .spans
                .push(Span::styled(code.to_string(), CODE_STYLE)),
            Event::SoftBreak => renderer.text(" "),
            Event::HardBreak => renderer.flush(),
            Event::Rule => {
                renderer.blank();
                renderer.lines.push(Line::from(Span::styled(
                    "─".repeat(40),
                    Style::new().fg(Color::DarkGray),
                )));
                renderer.blank();
            }
            _ => {}
        }
    }
    renderer.finish()
}

/// Split text around `#123` references. A reference must not follow a word character.
fn split_issue_refs(text: &str) -> Vec<(&str, bool)> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        let after_word = i > 0 && (bytes[i - 1].is_ascii_alphanumeric() || bytes[i - 1] == b'_');
        if bytes[i] == b'#' && !after_word {
            let digits = bytes[i + 1..]
                .iter()
                .take_while(|b| b.is_ascii_digit())
                .count();
            if digits > 0 {
                if plain_start < i {
                    parts.push((&text[plain_start..i], false));
                }
                let end = i + 1 + digits;
                parts.push((&text[i..end], true));
                plain_start = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }
    if plain_start < text.len() {
        parts.push((&text[plain_start..], false));
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn headings_and_paragraphs_are_separated() {
        let lines = render_markdown("# Crash on start\n\nIt panics.\n");
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, ["Crash on start", "", "It panics."]);
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn lists_get_markers() {
        let lines = render_markdown("- one\n- two\n\n1. first\n2. second\n");
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert!(text.contains(&"• one".to_string()));
        assert!(text.contains(&"• two".to_string()));
        assert!(text.contains(&"1. first".to_string()));
        assert!(text.contains(&"2. second".to_string()));
    }

    #[test]
    fn code_blocks_keep_their_lines() {
        let lines = render_markdown("```\nfn main() {}\nlet x = 1;\n```\n");
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(text, ["  fn main() {}", "  let x = 1;"]);
        assert_eq!(lines[0].spans[0].style, CODE_STYLE);
    }

    #[test]
    fn issue_refs_are_highlighted() {
        let lines = render_markdown("Duplicate of #12, see issue#3.");
        let spans = &lines[0].spans;
        let refs: Vec<&str> = spans
            .iter()
            .filter(|span| span.style.fg == Some(Color::Magenta))
            .map(|span| span.content.as_ref())
            .collect();
        assert_eq!(refs, ["#12"]);
        assert_eq!(plain(&lines[0]), "Duplicate of #12, see issue#3.");
    }

    #[test]
    fn split_handles_edges() {
        assert_eq!(split_issue_refs("#1"), [("#1", true)]);
        assert_eq!(split_issue_refs("# heading"), [("# heading", false)]);
        assert_eq!(split_issue_refs("a #7 b"), [("a ", false), ("#7", true), (" b", false)]);
        assert!(split_issue_refs("").is_empty());
    }

    #[test]
    fn empty_source_renders_nothing() {
        assert!(render_markdown("").is_empty());
    }
}
