//! Interactive board browser state.
//!
//! [`BrowserView`] owns the [`Session`] and layers the terminal-only
//! concerns on top: input modes, the filter buffer and its debounce, the
//! go-to prompt, the form editor and rendered Markdown. It does no I/O;
//! the runtime drains [`BrowserView::take_jobs`] and feeds results back
//! through [`BrowserView::on_result`].

use super::editor::{EditorAction, FormEditor, edit_single_line};
use super::keymap::Keymap;
use super::markup::render_markdown;
use super::render::{self, Hit, HitMap, hint_line};
use cairn_core::IssueKey;
use cairn_core::command::Command;
use cairn_core::config::Config;
use cairn_core::error::FetchError;
use cairn_core::filter::Debounce;
use cairn_core::form::{FormKind, IssueForm, SubmitResponse};
use cairn_core::location::parse_issue_number;
use cairn_core::nav::Handled;
use cairn_core::panel::PanelKind;
use cairn_core::session::{Notice, Session};
use cairn_core::surface::{
    Completion, FetchRequest, FetchResponse, SurfaceHint, SurfaceKind, SurfaceState,
};
use cairn_core::tree::{BoardId, ItemId};
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const STATUS_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    pub debounce: Duration,
    /// Width of the board column when the inline panel is shown.
    pub split_percent: u16,
    /// Repository for new issues when nothing is selected.
    pub default_repository: Option<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl BrowserOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            debounce: config.filter.debounce(),
            split_percent: config.ui.split_percent.clamp(20, 80),
            default_repository: config.ui.default_repository.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    /// Keys edit this board's filter text.
    Filter(BoardId),
    GoTo,
    Form,
    Help,
}

/// Work for the runtime's background workers.
#[derive(Debug)]
pub enum Job {
    Fetch(FetchRequest),
    Submit(IssueForm),
}

#[derive(Debug)]
pub enum JobResult {
    Fetched(FetchResponse),
    Submitted {
        form: IssueForm,
        result: Result<SubmitResponse, FetchError>,
    },
}

pub struct BrowserView {
    session: Session,
    keymap: Keymap,
    mode: InputMode,
    filter_buf: String,
    debounce: Debounce,
    goto_buf: String,
    goto_error: Option<String>,
    editor: Option<FormEditor>,
    submits: Vec<IssueForm>,
    alert: Option<String>,
    help_query: String,
    status_msg: Option<(String, Instant)>,
    documents: HashMap<SurfaceKind, Vec<Line<'static>>>,
    options: BrowserOptions,
    hits: HitMap,
    should_quit: bool,
}

impl BrowserView {
    #[must_use]
    pub fn new(session: Session, options: BrowserOptions) -> Self {
        let mut view = Self {
            session,
            keymap: Keymap::new(),
            mode: InputMode::Normal,
            filter_buf: String::new(),
            debounce: Debounce::new(options.debounce),
            goto_buf: String::new(),
            goto_error: None,
            editor: None,
            submits: Vec::new(),
            alert: None,
            help_query: String::new(),
            status_msg: None,
            documents: HashMap::new(),
            options,
            hits: HitMap::default(),
            should_quit: false,
        };
        view.process_notices();
        view
    }

    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub const fn mode(&self) -> InputMode {
        self.mode
    }

    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }

    #[must_use]
    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.status_msg
            .as_ref()
            .filter(|(_, at)| at.elapsed() < STATUS_TTL)
            .map(|(msg, _)| msg.as_str())
    }

    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_msg = Some((msg.into(), Instant::now()));
    }

    // -- events -------------------------------------------------------------

    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(*key),
            Event::Mouse(mouse) => self.handle_mouse(*mouse),
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        if self.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.alert = None;
            }
            return;
        }
        match self.mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Filter(board) => self.handle_filter_key(board, key),
            InputMode::GoTo => self.handle_goto_key(key),
            InputMode::Form => self.handle_form_key(key),
            InputMode::Help => self.handle_help_key(key),
        }
        self.process_notices();
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        let plain = !key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        if plain {
            match key.code {
                KeyCode::Char('q') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('?') => {
                    self.help_query.clear();
                    self.mode = InputMode::Help;
                    return;
                }
                KeyCode::Char('#') => {
                    self.goto_buf.clear();
                    self.goto_error = None;
                    self.mode = InputMode::GoTo;
                    return;
                }
                KeyCode::Char('a') => return self.open_form(FormKind::Create),
                KeyCode::Char('e') => return self.open_form(FormKind::Edit),
                KeyCode::Char('c') => return self.open_form(FormKind::Comment),
                KeyCode::Char('x') => {
                    self.session.dismiss_error();
                    return;
                }
                _ => {}
            }
        }

        let Some(command) = self.keymap.lookup(key) else {
            return;
        };
        if self.session.dispatch(command) == Handled::Ignored {
            self.fallback(command);
        }
    }

    /// Second chance for commands the session ignored.
    fn fallback(&mut self, command: Command) {
        let retry = match command {
            Command::NextItem if self.session.current_surface().is_some() => Command::ScrollDown,
            Command::PreviousItem if self.session.current_surface().is_some() => Command::ScrollUp,
            Command::CloseOverlay => {
                self.session.dismiss_error();
                return;
            }
            _ => return,
        };
        self.session.dispatch(retry);
    }

    fn handle_filter_key(&mut self, board: BoardId, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Down | KeyCode::Tab => {
                self.flush_filter(board);
                self.session.blur_filter();
                self.mode = InputMode::Normal;
            }
            KeyCode::Char('u') if ctrl => {
                self.filter_buf.clear();
                self.flush_filter(board);
            }
            _ if ctrl => {}
            _ => {
                let mut cursor = self.filter_buf.chars().count();
                let before = self.filter_buf.len();
                edit_single_line(&mut self.filter_buf, &mut cursor, key);
                if self.filter_buf.len() != before {
                    self.debounce.keystroke(Instant::now());
                }
            }
        }
    }

    /// Apply the buffer now if it differs from the board's filter.
    fn flush_filter(&mut self, board: BoardId) {
        let applied = self
            .session
            .tree()
            .board(board)
            .filter()
            .map(|binding| binding.query.clone());
        if applied.as_deref() != Some(self.filter_buf.as_str()) {
            let report = self.session.apply_filter(board, &self.filter_buf);
            debug!(visible = report.visible, total = report.total, "filter applied");
        }
        self.debounce.settle(&self.filter_buf);
    }

    fn enter_filter(&mut self, board: BoardId) {
        if self.mode == InputMode::Filter(board) {
            return;
        }
        self.filter_buf = self
            .session
            .tree()
            .board(board)
            .filter()
            .map(|binding| binding.query.clone())
            .unwrap_or_default();
        self.debounce.settle(&self.filter_buf);
        self.mode = InputMode::Filter(board);
    }

    fn handle_goto_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.goto_error = None;
                self.mode = InputMode::Normal;
            }
            KeyCode::Enter => match parse_goto(&self.goto_buf) {
                Ok((number, repository)) => {
                    self.goto_error = None;
                    self.mode = InputMode::Normal;
                    info!(number, repository = ?repository, "go to issue");
                    self.session.go_to_issue(number, repository.as_deref());
                }
                Err(message) => self.goto_error = Some(message),
            },
            _ => {
                let mut cursor = self.goto_buf.chars().count();
                edit_single_line(&mut self.goto_buf, &mut cursor, key);
            }
        }
    }

    fn handle_help_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('?') => self.mode = InputMode::Normal,
            KeyCode::Backspace => {
                self.help_query.pop();
            }
            KeyCode::Char(c) => self.help_query.push(c),
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let Some(editor) = self.editor.as_mut() else {
            self.mode = InputMode::Normal;
            return;
        };
        match editor.handle_key(key) {
            EditorAction::None => {}
            EditorAction::Cancel => {
                self.editor = None;
                self.mode = InputMode::Normal;
            }
            EditorAction::Submit(form) => {
                info!(kind = ?form.kind, issue = %form.target, "submitting form");
                self.submits.push(form);
            }
        }
    }

    /// Item a form or go-to acts on: the focused detail surface's issue,
    /// otherwise the board highlight.
    fn selected_item(&self) -> Option<ItemId> {
        if let Some(kind) = self.session.current_surface()
            && let Some(surface) = self.session.surfaces().surface(kind)
            && !surface.target().is_empty()
        {
            return self.session.tree().lookup(surface.target());
        }
        self.session.nav().current_item()
    }

    fn open_form(&mut self, kind: FormKind) {
        let tree = self.session.tree();
        let selected = self.selected_item();
        let form = match (kind, selected) {
            (FormKind::Edit, Some(item)) => IssueForm::edit(tree.item(item)),
            (FormKind::Comment, Some(item)) => IssueForm::comment(tree.item(item).key.clone()),
            (FormKind::Create, _) => {
                let repository = selected
                    .map(|item| tree.item(item).key.repository.clone())
                    .or_else(|| self.current_group_repository())
                    .or_else(|| self.options.default_repository.clone());
                match repository {
                    Some(repository) => IssueForm::create(repository),
                    None => {
                        self.set_status("No repository to create the issue in");
                        return;
                    }
                }
            }
            (_, None) => {
                self.set_status("Select an issue first");
                return;
            }
        };
        self.editor = Some(FormEditor::new(form));
        self.mode = InputMode::Form;
    }

    fn current_group_repository(&self) -> Option<String> {
        let tree = self.session.tree();
        let board = self.session.routing_board()?;
        let group = tree.board(board).current_group()?;
        tree.group(group).repository.clone()
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.mode != InputMode::Normal || self.alert.is_some() {
            return;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                match self.hits.at(mouse.column, mouse.row) {
                    Some(Hit::Item(item)) => {
                        self.session.select_item(item, SurfaceHint::Auto, false);
                    }
                    Some(Hit::Group(group)) => {
                        self.session.click_group(group);
                    }
                    Some(Hit::Panel(kind)) => {
                        self.session.click_panel(kind);
                    }
                    None => {}
                }
            }
            MouseEventKind::ScrollDown => self.scroll_or_step(Command::ScrollDown, Command::NextItem),
            MouseEventKind::ScrollUp => self.scroll_or_step(Command::ScrollUp, Command::PreviousItem),
            _ => {}
        }
        self.process_notices();
    }

    fn scroll_or_step(&mut self, scroll: Command, step: Command) {
        let command = if self.session.current_surface().is_some() {
            scroll
        } else {
            step
        };
        self.session.dispatch(command);
    }

    // -- session plumbing ---------------------------------------------------

    fn process_notices(&mut self) {
        for notice in self.session.take_notices() {
            match notice {
                Notice::ContentChanged(kind) => self.rerender(kind),
                Notice::Alert(message) => {
                    warn!(%message, "alert");
                    self.alert = Some(message);
                }
                Notice::FocusFilter(board) => self.enter_filter(board),
            }
        }
    }

    fn rerender(&mut self, kind: SurfaceKind) {
        let lines = match self.session.surfaces().surface(kind).map(|s| s.state()) {
            Some(SurfaceState::Ready(content)) => render_markdown(content),
            _ => Vec::new(),
        };
        self.documents.insert(kind, lines);
    }

    /// Advance debounced filtering and group transitions. Returns `true`
    /// when a redraw is due.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = false;
        if let InputMode::Filter(board) = self.mode
            && self.debounce.due(&self.filter_buf, now)
        {
            let report = self.session.apply_filter(board, &self.filter_buf);
            debug!(visible = report.visible, total = report.total, "filter applied");
            changed = true;
        }
        changed |= self.session.tick();
        self.process_notices();
        changed
    }

    pub fn take_jobs(&mut self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .session
            .take_fetches()
            .into_iter()
            .map(Job::Fetch)
            .collect();
        jobs.extend(self.submits.drain(..).map(Job::Submit));
        jobs
    }

    pub fn on_result(&mut self, result: JobResult) {
        match result {
            JobResult::Fetched(response) => {
                if let Completion::Failed { message, .. } = self.session.complete(response) {
                    debug!(%message, "fetch failed");
                }
            }
            JobResult::Submitted { form, result } => self.on_submitted(form, result),
        }
        self.process_notices();
    }

    fn on_submitted(&mut self, form: IssueForm, result: Result<SubmitResponse, FetchError>) {
        match result {
            Ok(SubmitResponse::Content(content)) => {
                self.editor = None;
                if self.mode == InputMode::Form {
                    self.mode = InputMode::Normal;
                }
                let done = match form.kind {
                    FormKind::Create => format!("Created issue in {}", form.target.repository),
                    FormKind::Edit => format!("Updated {}", form.target),
                    FormKind::Comment => format!("Commented on {}", form.target),
                };
                info!(issue = %form.target, "form accepted");
                self.set_status(done);
                let key = if form.kind == FormKind::Create {
                    IssueKey::empty()
                } else {
                    form.target
                };
                self.session.show_content(key, content);
            }
            Ok(SubmitResponse::Form { errors }) => {
                debug!(count = errors.len(), "form returned with errors");
                if let Some(editor) = self.editor.as_mut() {
                    editor.reject(errors);
                }
            }
            Err(err) => {
                warn!(error = %err, "submission failed");
                if let Some(editor) = self.editor.as_mut() {
                    editor.reject(vec![err.to_string()]);
                }
            }
        }
    }

    // -- drawing ------------------------------------------------------------

    pub fn render(&mut self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(area);
        let content = chunks[0];
        let status_area = chunks[1];

        let boards: Vec<BoardId> = self.session.tree().board_ids().collect();
        let inline = self.session.surfaces().inline_exists();
        let (boards_area, detail_area) = match (boards.is_empty(), inline) {
            (true, _) => (Rect::default(), content),
            (false, false) => (content, Rect::default()),
            (false, true) => {
                let split = self.options.split_percent;
                let columns = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([
                        Constraint::Percentage(split),
                        Constraint::Percentage(100 - split),
                    ])
                    .split(content);
                (columns[0], columns[1])
            }
        };
        let overlay_area = render::overlay_area(area);

        let visible_rows = if self.session.surfaces().overlay_open() {
            overlay_area.height
        } else {
            detail_area.height
        };
        self.session.set_page_size(visible_rows.saturating_sub(3));

        let mut hits = HitMap::default();
        if !boards.is_empty() {
            let count = u32::try_from(boards.len()).unwrap_or(u32::MAX);
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints(boards.iter().map(|_| Constraint::Ratio(1, count)))
                .split(boards_area);
            for (board, board_area) in boards.iter().zip(rows.iter()) {
                let editing = (self.mode == InputMode::Filter(*board)).then_some(self.filter_buf.as_str());
                render::board_panel(frame, *board_area, &self.session, *board, editing, &mut hits);
            }
        }

        let current = self.session.current_surface();
        if inline && let Some(surface) = self.session.surfaces().surface(SurfaceKind::Inline) {
            hits.push(detail_area, Hit::Panel(PanelKind::InlineDetail));
            render::detail_panel(
                frame,
                detail_area,
                surface,
                self.title_of(surface.target()),
                self.document(SurfaceKind::Inline),
                current == Some(SurfaceKind::Inline),
            );
        }
        if self.session.surfaces().overlay_open()
            && let Some(surface) = self.session.surfaces().surface(SurfaceKind::Overlay)
        {
            hits.push(overlay_area, Hit::Panel(PanelKind::OverlayDetail));
            frame.render_widget(Clear, overlay_area);
            render::detail_panel(
                frame,
                overlay_area,
                surface,
                self.title_of(surface.target()),
                self.document(SurfaceKind::Overlay),
                current == Some(SurfaceKind::Overlay),
            );
        }

        frame.render_widget(Paragraph::new(self.status_line()), status_area);

        if self.mode == InputMode::Form
            && let Some(editor) = &self.editor
        {
            editor.render(frame, area);
        }
        if self.mode == InputMode::Help {
            render::help_overlay(frame, area, &self.help_query);
        }
        if let Some(message) = &self.alert {
            render::alert_box(frame, area, message);
        }
        self.hits = hits;
    }

    fn title_of(&self, key: &IssueKey) -> Option<&str> {
        let tree = self.session.tree();
        tree.lookup(key).map(|item| tree.item(item).title.as_str())
    }

    fn document(&self, kind: SurfaceKind) -> &[Line<'static>] {
        self.documents.get(&kind).map_or(&[], Vec::as_slice)
    }

    fn status_line(&self) -> Line<'static> {
        match self.mode {
            InputMode::GoTo => {
                let mut spans = vec![
                    Span::styled("Go to issue: ", Style::default().fg(Color::Cyan)),
                    Span::raw(super::editor::with_cursor(
                        &self.goto_buf,
                        self.goto_buf.chars().count(),
                    )),
                ];
                if let Some(error) = &self.goto_error {
                    spans.push(Span::styled(
                        format!("  {error}"),
                        Style::default().fg(Color::Red),
                    ));
                }
                Line::from(spans)
            }
            InputMode::Filter(_) => hint_line(&[
                ("Enter", "apply"),
                ("Esc", "done"),
                ("Ctrl+U", "clear"),
            ]),
            InputMode::Form => hint_line(&[("Ctrl+S", "submit"), ("Esc", "cancel")]),
            InputMode::Help => hint_line(&[("Esc", "close")]),
            InputMode::Normal => {
                if let Some(msg) = self.status() {
                    return Line::from(Span::styled(
                        msg.to_string(),
                        Style::default().fg(Color::Cyan),
                    ));
                }
                hint_line(&[
                    ("?", "help"),
                    ("/", "filter"),
                    ("#", "go to"),
                    ("Enter", "open"),
                    ("q", "quit"),
                ])
            }
        }
    }
}

/// Parse the go-to prompt: `12`, `#12` or `owner/repo#12`.
fn parse_goto(input: &str) -> Result<(u64, Option<String>), String> {
    let trimmed = input.trim();
    let (repository, number) = match trimmed.rsplit_once('#') {
        Some((repo, number)) if !repo.trim().is_empty() => {
            (Some(repo.trim().to_string()), number)
        }
        _ => (None, trimmed),
    };
    parse_issue_number(number)
        .map(|n| (n, repository))
        .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_core::model::listing::Listing;
    use cairn_core::session::SessionOptions;
    use cairn_core::tree::EntityTree;
    use ratatui::{Terminal, backend::TestBackend, buffer::Buffer};

    const LISTING: &str = r#"{"boards": [
        {"name": "Open", "filter": true, "groups": [
            {"title": "api - open", "repository": "acme/api", "items": [
                {"number": 1, "title": "Crash on start", "labels": ["bug"]},
                {"number": 2, "title": "Slow search"}]},
            {"title": "web - open", "repository": "acme/web", "collapsed": true, "items": [
                {"number": 10, "title": "Button misaligned"}]}]}
    ]}"#;

    fn make_view() -> BrowserView {
        let listing = Listing::from_json(LISTING).expect("listing");
        let tree = EntityTree::from_listing(&listing).expect("tree");
        let session = Session::new(
            tree,
            SessionOptions {
                open_ticks: 1,
                ..SessionOptions::default()
            },
        );
        BrowserView::new(
            session,
            BrowserOptions {
                debounce: Duration::from_millis(50),
                split_percent: 50,
                default_repository: None,
            },
        )
    }

    fn press(view: &mut BrowserView, code: KeyCode) {
        view.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(view: &mut BrowserView, text: &str) {
        for c in text.chars() {
            press(view, KeyCode::Char(c));
        }
    }

    fn fetches(view: &mut BrowserView) -> Vec<FetchRequest> {
        view.take_jobs()
            .into_iter()
            .filter_map(|job| match job {
                Job::Fetch(request) => Some(request),
                Job::Submit(_) => None,
            })
            .collect()
    }

    fn answer(view: &mut BrowserView, request: FetchRequest, body: &str) {
        view.on_result(JobResult::Fetched(FetchResponse {
            request,
            result: Ok(body.to_string()),
        }));
    }

    fn buffer_to_string(buffer: &Buffer) -> String {
        let mut result = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                let cell = buffer.cell((x, y)).expect("cell");
                result.push_str(cell.symbol());
            }
            result.push('\n');
        }
        result
    }

    fn first_board(view: &BrowserView) -> BoardId {
        view.session().tree().board_ids().next().expect("board")
    }

    fn draw(view: &mut BrowserView) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("terminal");
        terminal.draw(|frame| view.render(frame)).expect("draw");
        buffer_to_string(terminal.backend().buffer())
    }

    #[test]
    fn next_item_selects_and_fetches_inline() {
        let mut view = make_view();
        press(&mut view, KeyCode::Char('j'));

        let requests = fetches(&mut view);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].key, IssueKey::new(1, "acme/api"));
        assert_eq!(requests[0].surface, SurfaceKind::Inline);
        assert_eq!(view.session().current_panel(), PanelKind::InlineDetail);
    }

    #[test]
    fn fetched_markdown_is_drawn() {
        let mut view = make_view();
        press(&mut view, KeyCode::Char('j'));
        let request = fetches(&mut view).remove(0);
        answer(&mut view, request, "# Crash on start\n\nPanics in `main`, see #2.");

        let screen = draw(&mut view);
        assert!(screen.contains("Panics in main, see #2."), "{screen}");
        assert!(screen.contains("acme/api#1"));
    }

    #[test]
    fn typed_filter_applies_after_debounce() {
        let mut view = make_view();
        press(&mut view, KeyCode::Char('/'));
        assert_eq!(view.mode(), InputMode::Filter(first_board(&view)));

        type_text(&mut view, "slow");
        let group = view.session().tree().board(first_board(&view)).groups()[0];
        assert_eq!(view.session().tree().group(group).counter().visible, 2);

        assert!(view.tick(Instant::now() + Duration::from_secs(1)));
        assert_eq!(view.session().tree().group(group).counter().visible, 1);

        press(&mut view, KeyCode::Enter);
        assert_eq!(view.mode(), InputMode::Normal);
        let filter = view.session().tree().board(first_board(&view)).filter();
        assert_eq!(filter.map(|f| f.query.as_str()), Some("slow"));
    }

    #[test]
    fn enter_in_filter_applies_immediately() {
        let mut view = make_view();
        press(&mut view, KeyCode::Char('/'));
        type_text(&mut view, "crash");
        press(&mut view, KeyCode::Enter);
        let group = view.session().tree().board(first_board(&view)).groups()[0];
        assert_eq!(view.session().tree().group(group).counter().visible, 1);
        assert!(!view.tick(Instant::now() + Duration::from_secs(1)));
    }

    #[test]
    fn ctrl_u_clears_the_filter_at_once() {
        let mut view = make_view();
        let board = first_board(&view);
        press(&mut view, KeyCode::Char('/'));
        type_text(&mut view, "crash");
        assert!(view.tick(Instant::now() + Duration::from_secs(1)));
        let group = view.session().tree().board(board).groups()[0];
        assert_eq!(view.session().tree().group(group).counter().visible, 1);

        view.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert_eq!(view.mode(), InputMode::Filter(board));
        assert_eq!(view.session().tree().group(group).counter().visible, 2);
        assert!(!view.tick(Instant::now() + Duration::from_secs(1)));
    }

    #[test]
    fn goto_rejects_bad_input_without_request() {
        let mut view = make_view();
        press(&mut view, KeyCode::Char('#'));
        type_text(&mut view, "abc");
        press(&mut view, KeyCode::Enter);
        assert_eq!(view.mode(), InputMode::GoTo);
        assert!(view.goto_error.is_some());
        assert!(fetches(&mut view).is_empty());

        press(&mut view, KeyCode::Esc);
        assert_eq!(view.mode(), InputMode::Normal);
    }

    #[test]
    fn goto_opens_overlay() {
        let mut view = make_view();
        press(&mut view, KeyCode::Char('#'));
        type_text(&mut view, "acme/web#10");
        press(&mut view, KeyCode::Enter);

        let requests = fetches(&mut view);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].surface, SurfaceKind::Overlay);
        assert_eq!(requests[0].key, IssueKey::new(10, "acme/web"));
        assert_eq!(view.session().current_panel(), PanelKind::OverlayDetail);
    }

    #[test]
    fn overlay_failure_raises_alert() {
        let mut view = make_view();
        press(&mut view, KeyCode::Char('j'));
        fetches(&mut view);
        press(&mut view, KeyCode::Enter);
        let request = fetches(&mut view).remove(0);
        view.on_result(JobResult::Fetched(FetchResponse {
            request,
            result: Err(FetchError::Transport("connection refused".into())),
        }));

        assert!(view.alert().is_some());
        assert!(!view.session().surfaces().overlay_open());
        press(&mut view, KeyCode::Char('j'));
        assert!(view.alert().is_some(), "keys only dismiss the alert");
        press(&mut view, KeyCode::Enter);
        assert!(view.alert().is_none());
    }

    #[test]
    fn comment_requires_selection() {
        let mut view = make_view();
        press(&mut view, KeyCode::Char('c'));
        assert_eq!(view.mode(), InputMode::Normal);
        assert_eq!(view.status(), Some("Select an issue first"));
    }

    #[test]
    fn comment_form_submits_and_shows_content() {
        let mut view = make_view();
        press(&mut view, KeyCode::Char('j'));
        let request = fetches(&mut view).remove(0);
        answer(&mut view, request, "old body");

        press(&mut view, KeyCode::Char('c'));
        assert_eq!(view.mode(), InputMode::Form);
        type_text(&mut view, "me too");
        view.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));

        let form = match view.take_jobs().pop() {
            Some(Job::Submit(form)) => form,
            other => panic!("expected submit job, got {other:?}"),
        };
        assert_eq!(form.target, IssueKey::new(1, "acme/api"));

        view.on_result(JobResult::Submitted {
            form,
            result: Ok(SubmitResponse::Content("new body".into())),
        });
        assert_eq!(view.mode(), InputMode::Normal);
        let inline = view
            .session()
            .surfaces()
            .surface(SurfaceKind::Inline)
            .expect("inline");
        assert_eq!(inline.state(), &SurfaceState::Ready("new body".into()));
        assert_eq!(view.status(), Some("Commented on acme/api#1"));
    }

    #[test]
    fn rejected_form_stays_open() {
        let mut view = make_view();
        press(&mut view, KeyCode::Char('n'));
        press(&mut view, KeyCode::Char('a'));
        assert_eq!(view.mode(), InputMode::Form, "group repository is used");
        type_text(&mut view, "New bug");
        view.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        let Some(Job::Submit(form)) = view.take_jobs().pop() else {
            panic!("expected submit job");
        };
        view.on_result(JobResult::Submitted {
            form,
            result: Err(FetchError::ReadOnly),
        });
        assert_eq!(view.mode(), InputMode::Form);
        let editor = view.editor.as_ref().expect("editor");
        assert_eq!(editor.errors().len(), 1);
    }

    #[test]
    fn help_overlay_filters_and_closes() {
        let mut view = make_view();
        press(&mut view, KeyCode::Char('?'));
        assert_eq!(view.mode(), InputMode::Help);
        type_text(&mut view, "overlay");
        let screen = draw(&mut view);
        assert!(screen.contains("Open issue in overlay"));
        assert!(!screen.contains("Scroll to bottom"));
        press(&mut view, KeyCode::Esc);
        assert_eq!(view.mode(), InputMode::Normal);
    }

    #[test]
    fn clicking_a_collapsed_header_expands_it() {
        let mut view = make_view();
        let screen = draw(&mut view);
        let row = screen
            .lines()
            .position(|line| line.contains("web - open"))
            .expect("header row");
        let column = screen.lines().nth(row).and_then(|line| {
            line.chars().position(|c| c == 'w')
        });
        view.handle_mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: u16::try_from(column.expect("column")).expect("u16"),
            row: u16::try_from(row).expect("u16"),
            modifiers: KeyModifiers::NONE,
        });
        let group = view.session().tree().board(first_board(&view)).groups()[1];
        assert!(view.session().tree().group(group).is_expanding());
        view.tick(Instant::now());
        assert!(view.session().tree().group(group).is_expanded());
    }

    #[test]
    fn q_quits() {
        let mut view = make_view();
        press(&mut view, KeyCode::Char('q'));
        assert!(view.should_quit());
    }

    #[test]
    fn goto_parsing() {
        assert_eq!(parse_goto("12"), Ok((12, None)));
        assert_eq!(parse_goto(" #7 "), Ok((7, None)));
        assert_eq!(parse_goto("acme/api#3"), Ok((3, Some("acme/api".to_string()))));
        assert!(parse_goto("").is_err());
        assert!(parse_goto("#0").is_err());
    }
}
