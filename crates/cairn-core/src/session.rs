//! Navigation session: the explicit context wiring navigation, detail
//! surfaces and panel focus together.
//!
//! The session is single-threaded and sans-I/O. Callers feed it commands
//! and fetch results, then drain [`Session::take_fetches`] and
//! [`Session::take_notices`].

use crate::IssueKey;
use crate::command::{Command, Scope};
use crate::config::Config;
use crate::filter::FilterReport;
use crate::location::InitialSelection;
use crate::nav::{Continuation, DEFAULT_OPEN_TICKS, Handled, NavContext, NavEvent};
use crate::panel::{PanelArbitrator, PanelEnv, PanelKind};
use crate::surface::{
    Completion, DisplayOutcome, DisplayRequest, FetchRequest, FetchResponse, ScrollOp, SurfaceHint,
    SurfaceKind, SurfaceManager,
};
use crate::tree::{BoardId, EntityTree, GroupId, ItemId};

const DEFAULT_PAGE_SIZE: u16 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub inline_detail: bool,
    pub open_ticks: u8,
    pub fuzzy: bool,
    pub default_repository: Option<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            inline_detail: true,
            open_ticks: DEFAULT_OPEN_TICKS,
            fuzzy: false,
            default_repository: None,
        }
    }
}

impl SessionOptions {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            inline_detail: config.ui.inline_detail,
            open_ticks: config.ui.open_ticks,
            fuzzy: config.filter.fuzzy,
            default_repository: config.ui.default_repository.clone(),
        }
    }
}

/// Something the front end should react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// New content was applied; re-render markup and issue links.
    ContentChanged(SurfaceKind),
    /// Blocking message the user must dismiss.
    Alert(String),
    /// The board's filter input should take keyboard input.
    FocusFilter(BoardId),
}

#[derive(Debug, Clone)]
pub struct Session {
    nav: NavContext,
    surfaces: SurfaceManager,
    panels: PanelArbitrator,
    default_repository: Option<String>,
    page_size: u16,
    fetches: Vec<FetchRequest>,
    notices: Vec<Notice>,
}

impl Session {
    /// Start a session over `tree`. Without boards the inline surface is
    /// always present so some panel can hold focus.
    #[must_use]
    pub fn new(tree: EntityTree, options: SessionOptions) -> Self {
        let inline = options.inline_detail || tree.board_count() == 0;
        let panels = PanelArbitrator::new(tree.board_ids(), inline);
        let nav = NavContext::new(tree)
            .with_open_ticks(options.open_ticks)
            .with_fuzzy(options.fuzzy);
        tracing::info!(
            boards = nav.tree().board_count(),
            items = nav.tree().item_count(),
            inline,
            "session started"
        );
        Self {
            nav,
            surfaces: SurfaceManager::new(inline),
            panels,
            default_repository: options.default_repository,
            page_size: DEFAULT_PAGE_SIZE,
            fetches: Vec::new(),
            notices: Vec::new(),
        }
    }

    #[must_use]
    pub const fn nav(&self) -> &NavContext {
        &self.nav
    }

    #[must_use]
    pub const fn tree(&self) -> &EntityTree {
        self.nav.tree()
    }

    #[must_use]
    pub const fn surfaces(&self) -> &SurfaceManager {
        &self.surfaces
    }

    #[must_use]
    pub const fn panels(&self) -> &PanelArbitrator {
        &self.panels
    }

    #[must_use]
    pub fn current_panel(&self) -> PanelKind {
        self.panels.current()
    }

    #[must_use]
    pub const fn env(&self) -> PanelEnv {
        PanelEnv {
            overlay_open: self.surfaces.overlay_open(),
            inline_exists: self.surfaces.inline_exists(),
        }
    }

    /// Rows moved by page up/down on detail surfaces.
    pub const fn set_page_size(&mut self, rows: u16) {
        self.page_size = if rows == 0 { 1 } else { rows };
    }

    pub fn take_fetches(&mut self) -> Vec<FetchRequest> {
        std::mem::take(&mut self.fetches)
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // -- command routing ----------------------------------------------------

    pub fn dispatch(&mut self, command: Command) -> Handled {
        let handled = match command.scope() {
            Scope::Board => self.dispatch_board(command),
            Scope::Panel => self.dispatch_panel(command),
            Scope::Focus => self.dispatch_focus(command),
        };
        self.pump();
        tracing::debug!(%command, consumed = handled.is_consumed(), "command dispatched");
        handled
    }

    /// Board that navigation commands act on from the current panel.
    /// `None` while the overlay is current: it is modal.
    #[must_use]
    pub fn routing_board(&self) -> Option<BoardId> {
        match self.panels.current() {
            PanelKind::Board(board) => Some(board),
            PanelKind::InlineDetail => self
                .nav
                .current_board()
                .or_else(|| self.nav.previous_board())
                .or_else(|| self.tree().board_ids().next()),
            PanelKind::OverlayDetail => None,
        }
    }

    fn dispatch_board(&mut self, command: Command) -> Handled {
        let Some(board) = self.routing_board() else {
            return Handled::Ignored;
        };
        match command {
            Command::NextItem => self.nav.go_to_next_item(board),
            Command::PreviousItem => self.nav.go_to_previous_item(board),
            Command::NextGroup => self.nav.go_to_next_group(board),
            Command::PreviousGroup => self.nav.go_to_previous_group(board),
            Command::FirstGroup => self.nav.go_to_first_group(board),
            Command::LastGroup => self.nav.go_to_last_group(board),
            Command::FirstItem => self.nav.go_to_first_item(board),
            Command::LastItem => self.nav.go_to_last_item(board),
            Command::OpenGroup => self.nav.open_current_group(board),
            Command::CloseGroup => self.nav.close_current_group(board),
            Command::ToggleGroup => self.nav.toggle_current_group(board),
            Command::FocusFilter => self.nav.focus_filter(board),
            Command::ClearFilter => self.clear_filter(board),
            Command::OpenOverlay => match self.nav.current_item() {
                Some(item) => self.nav.set_current(
                    item,
                    true,
                    DisplayRequest::new(SurfaceHint::Overlay, false),
                ),
                None => Handled::Ignored,
            },
            _ => Handled::Ignored,
        }
    }

    /// Surface owned by the current panel, if it is a detail panel.
    #[must_use]
    pub fn current_surface(&self) -> Option<SurfaceKind> {
        match self.panels.current() {
            PanelKind::InlineDetail => Some(SurfaceKind::Inline),
            PanelKind::OverlayDetail => Some(SurfaceKind::Overlay),
            PanelKind::Board(_) => None,
        }
    }

    fn dispatch_panel(&mut self, command: Command) -> Handled {
        let Some(kind) = self.current_surface() else {
            return Handled::Ignored;
        };
        let page = i32::from(self.page_size);
        match command {
            Command::ToggleDetails => {
                let request = self.surfaces.toggle_verbose(kind);
                self.queue(request).or(Handled::Consumed)
            }
            Command::Reload => {
                let request = self.surfaces.reload(kind);
                self.queue(request)
            }
            Command::ScrollUp => self.scroll(kind, ScrollOp::Lines(-1)),
            Command::ScrollDown => self.scroll(kind, ScrollOp::Lines(1)),
            Command::PageUp => self.scroll(kind, ScrollOp::Lines(-page)),
            Command::PageDown => self.scroll(kind, ScrollOp::Lines(page)),
            Command::ScrollTop => self.scroll(kind, ScrollOp::Top),
            Command::ScrollBottom => self.scroll(kind, ScrollOp::Bottom),
            _ => Handled::Ignored,
        }
    }

    fn dispatch_focus(&mut self, command: Command) -> Handled {
        let env = self.env();
        let activated = match command {
            Command::PanelLeft => self.panels.go_prev_panel(env),
            Command::PanelRight => self.panels.go_next_panel(env),
            Command::CloseOverlay => return self.close_overlay(),
            _ => None,
        };
        match activated {
            Some(kind) => {
                self.on_panel_activated(kind);
                Handled::Consumed
            }
            None => Handled::Ignored,
        }
    }

    fn queue(&mut self, request: Option<FetchRequest>) -> Handled {
        match request {
            Some(request) => {
                self.fetches.push(request);
                Handled::Consumed
            }
            None => Handled::Ignored,
        }
    }

    fn scroll(&mut self, kind: SurfaceKind, op: ScrollOp) -> Handled {
        if self.surfaces.scroll(kind, op) {
            Handled::Consumed
        } else {
            Handled::Ignored
        }
    }

    // -- event plumbing -----------------------------------------------------

    fn pump(&mut self) {
        for event in self.nav.take_events() {
            match event {
                NavEvent::Display { item, request } => self.display_item(item, request),
                NavEvent::FocusFilter(board) => self.notices.push(Notice::FocusFilter(board)),
            }
        }
    }

    fn display_item(&mut self, item: ItemId, request: DisplayRequest) {
        let key = self.tree().item(item).key.clone();
        let kind = self.surfaces.resolve(request.hint);
        if let DisplayOutcome::Requested(fetch) = self.surfaces.display(key, request.hint, request.force)
        {
            self.fetches.push(fetch);
        }
        match kind {
            SurfaceKind::Overlay => {
                let env = self.env();
                if let Some(activated) = self.panels.open_overlay(env) {
                    self.on_panel_activated(activated);
                }
            }
            SurfaceKind::Inline => self.activate(PanelKind::InlineDetail),
        }
    }

    /// Request focus for `kind`. The overlay keeps focus until closed.
    fn activate(&mut self, kind: PanelKind) {
        if self.panels.current() == PanelKind::OverlayDetail && kind != PanelKind::OverlayDetail {
            return;
        }
        let env = self.env();
        if let Some(activated) = self.panels.select_panel(kind, env) {
            self.on_panel_activated(activated);
        }
    }

    /// Owner hook run after a panel takes focus.
    fn on_panel_activated(&mut self, kind: PanelKind) {
        let surface = match kind {
            PanelKind::Board(board) => {
                self.nav.assert_board(board);
                return;
            }
            PanelKind::InlineDetail => SurfaceKind::Inline,
            PanelKind::OverlayDetail => SurfaceKind::Overlay,
        };
        let Some(target) = self.surfaces.surface(surface).map(|s| s.target().clone()) else {
            return;
        };
        if target.is_empty() {
            return;
        }
        let owner = self
            .tree()
            .lookup(&target)
            .and_then(|item| self.tree().board_of(item));
        match owner {
            Some(board) => self.nav.assert_board(board),
            None => self.nav.clear_board_highlight(),
        }
    }

    // -- pointer and prompt entry points ------------------------------------

    /// The overlay is current and swallows input aimed at other panels.
    #[must_use]
    pub fn overlay_is_modal(&self) -> bool {
        self.panels.current() == PanelKind::OverlayDetail
    }

    /// Pointer or Enter selection of an item. Ignored under the overlay.
    pub fn select_item(&mut self, item: ItemId, hint: SurfaceHint, force: bool) -> Handled {
        if self.overlay_is_modal() {
            return Handled::Ignored;
        }
        let handled = self
            .nav
            .set_current(item, true, DisplayRequest::new(hint, force));
        self.pump();
        handled
    }

    /// Pointer click on a group header: select it and toggle it.
    pub fn click_group(&mut self, group: GroupId) -> Handled {
        if self.overlay_is_modal() {
            return Handled::Ignored;
        }
        self.nav.select_group(group);
        let board = self.tree().group(group).board();
        self.activate(PanelKind::Board(board));
        self.nav.toggle(group);
        self.pump();
        Handled::Consumed
    }

    /// Pointer click inside a panel.
    pub fn click_panel(&mut self, kind: PanelKind) -> Handled {
        if self.overlay_is_modal() {
            return Handled::Ignored;
        }
        let env = self.env();
        match self.panels.claim_by_click(kind, env) {
            Some(activated) => {
                self.on_panel_activated(activated);
                Handled::Consumed
            }
            None => Handled::Ignored,
        }
    }

    pub fn apply_filter(&mut self, board: BoardId, raw: &str) -> FilterReport {
        let report = self.nav.apply_filter(board, raw);
        self.pump();
        report
    }

    pub fn focus_filter(&mut self, board: BoardId) -> Handled {
        let handled = self.nav.focus_filter(board);
        self.pump();
        handled
    }

    pub fn blur_filter(&mut self) -> Handled {
        self.nav.blur_filter()
    }

    /// Empty the board's filter immediately.
    pub fn clear_filter(&mut self, board: BoardId) -> Handled {
        if !self.tree().board(board).has_filter() {
            return Handled::Ignored;
        }
        self.nav.apply_filter(board, "");
        self.pump();
        Handled::Consumed
    }

    /// Show issue `number` in the overlay, preferring `repository`.
    ///
    /// Issues on no board are synthesized as detached items; without any
    /// repository to place them in, an alert is raised instead.
    pub fn go_to_issue(&mut self, number: u64, repository: Option<&str>) -> Handled {
        let Some(item) = self.resolve_issue(number, repository) else {
            return Handled::Ignored;
        };
        let request = DisplayRequest::new(SurfaceHint::Overlay, false);
        if self.nav.set_current(item, true, request) == Handled::Ignored {
            self.display_item(item, request);
        }
        self.pump();
        Handled::Consumed
    }

    fn resolve_issue(&mut self, number: u64, repository: Option<&str>) -> Option<ItemId> {
        if let Some(item) = self.tree().find_number(number, repository) {
            return Some(item);
        }
        let repository = repository
            .map(str::to_string)
            .or_else(|| self.default_repository.clone());
        match repository {
            Some(repo) => Some(self.nav.ensure_detached(IssueKey::new(number, repo))),
            None => {
                self.notices.push(Notice::Alert(format!(
                    "Issue #{number} is not on any board. Use owner/repo#{number}."
                )));
                None
            }
        }
    }

    /// Apply the selection requested on the command line.
    pub fn select_initial(&mut self, selection: &InitialSelection) -> Handled {
        let Some(item) = self.resolve_issue(selection.number, selection.repository.as_deref())
        else {
            return Handled::Ignored;
        };
        let handled = match self.tree().item(item).group() {
            Some(group) if self.tree().group(group).is_collapsed() => {
                self.nav.select_group(group);
                self.nav
                    .request_open(group, Some(Continuation::SelectItem(item)))
            }
            _ => self.nav.set_current(item, true, DisplayRequest::default()),
        };
        self.pump();
        handled
    }

    /// Advance timed transitions. Returns `true` if a redraw is due.
    pub fn tick(&mut self) -> bool {
        let changed = self.nav.tick();
        self.pump();
        changed
    }

    // -- fetch protocol -----------------------------------------------------

    pub fn complete(&mut self, response: FetchResponse) -> Completion {
        let completion = self.surfaces.complete(response);
        match &completion {
            Completion::Applied(kind) => self.notices.push(Notice::ContentChanged(*kind)),
            Completion::Failed {
                surface: SurfaceKind::Overlay,
                message,
                ..
            } => {
                self.notices.push(Notice::Alert(message.clone()));
                let env = self.env();
                if let Some(kind) = self.panels.close_overlay(env) {
                    self.on_panel_activated(kind);
                }
            }
            Completion::Failed { .. } | Completion::Stale => {}
        }
        completion
    }

    /// Close the overlay, clearing it back to the empty identity.
    pub fn close_overlay(&mut self) -> Handled {
        if !self.surfaces.close_overlay() {
            return Handled::Ignored;
        }
        let env = self.env();
        if let Some(kind) = self.panels.close_overlay(env) {
            self.on_panel_activated(kind);
        }
        Handled::Consumed
    }

    /// Clear a dismissible inline error.
    pub fn dismiss_error(&mut self) -> Handled {
        if self.surfaces.dismiss_error(SurfaceKind::Inline) {
            Handled::Consumed
        } else {
            Handled::Ignored
        }
    }

    /// Show content returned by a submission for `key`.
    pub fn show_content(&mut self, key: IssueKey, content: String) {
        let kind = if self.surfaces.overlay_open() {
            SurfaceKind::Overlay
        } else {
            self.surfaces.resolve(SurfaceHint::Auto)
        };
        if self.surfaces.show(kind, key, content) {
            self.notices.push(Notice::ContentChanged(kind));
        }
    }
}
