//! Keyboard navigation over the entity tree.
//!
//! [`NavContext`] owns the tree and every "current" pointer. Operations
//! mutate those pointers and queue [`NavEvent`]s describing what the rest of
//! the session must do (display an item, focus a filter input).
//!
//! Boundary rules when stepping off the end of a group:
//!
//! - forward: the next group with visible items is entered; an expanded
//!   group selects its first item, a collapsed one is header-selected;
//! - backward: an expanded previous group selects its last item, anything
//!   else is header-selected;
//! - no group in that direction: the selection is cleared and the board's
//!   filter input (if any) receives focus.

use crate::IssueKey;
use crate::filter::{self, FilterReport, Query};
use crate::surface::DisplayRequest;
use crate::tree::{BoardId, EntityTree, Group, GroupId, GroupState, ItemId};
use std::collections::BTreeMap;

/// Ticks an expansion takes by default.
pub const DEFAULT_OPEN_TICKS: u8 = 3;

/// Whether an input event was consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Consumed,
    /// Not consumed; the caller may fall through to other handlers.
    Ignored,
}

impl Handled {
    #[must_use]
    pub const fn is_consumed(self) -> bool {
        matches!(self, Self::Consumed)
    }

    #[must_use]
    pub const fn or(self, other: Self) -> Self {
        match self {
            Self::Consumed => Self::Consumed,
            Self::Ignored => other,
        }
    }
}

/// Result of stepping within one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved,
    Boundary,
    Ignored,
}

/// What to do once a group finishes expanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Continuation {
    SelectFirstItem,
    SelectItem(ItemId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    Display { item: ItemId, request: DisplayRequest },
    FocusFilter(BoardId),
}

/// The single selection highlight, derived from `current_board`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Highlight {
    Item(ItemId),
    Group(GroupId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Clone)]
pub struct NavContext {
    tree: EntityTree,
    current_board: Option<BoardId>,
    previous_board: Option<BoardId>,
    filter_focus: Option<BoardId>,
    pending_open: BTreeMap<GroupId, Option<Continuation>>,
    open_ticks: u8,
    fuzzy: bool,
    events: Vec<NavEvent>,
}

impl NavContext {
    #[must_use]
    pub const fn new(tree: EntityTree) -> Self {
        Self {
            tree,
            current_board: None,
            previous_board: None,
            filter_focus: None,
            pending_open: BTreeMap::new(),
            open_ticks: DEFAULT_OPEN_TICKS,
            fuzzy: false,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_open_ticks(mut self, ticks: u8) -> Self {
        self.open_ticks = ticks;
        self
    }

    #[must_use]
    pub const fn with_fuzzy(mut self, fuzzy: bool) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    #[must_use]
    pub const fn tree(&self) -> &EntityTree {
        &self.tree
    }

    #[must_use]
    pub const fn current_board(&self) -> Option<BoardId> {
        self.current_board
    }

    #[must_use]
    pub const fn previous_board(&self) -> Option<BoardId> {
        self.previous_board
    }

    #[must_use]
    pub const fn filter_focus(&self) -> Option<BoardId> {
        self.filter_focus
    }

    pub fn take_events(&mut self) -> Vec<NavEvent> {
        std::mem::take(&mut self.events)
    }

    /// The one highlighted entity, if any.
    #[must_use]
    pub fn highlight(&self) -> Option<Highlight> {
        let board = self.tree.board(self.current_board?);
        let group_id = board.current_group()?;
        let group = self.tree.group(group_id);
        match group.current() {
            Some(item) if group.is_expanded() => Some(Highlight::Item(item)),
            _ => Some(Highlight::Group(group_id)),
        }
    }

    /// Highlighted item, if the highlight is on an item.
    #[must_use]
    pub fn current_item(&self) -> Option<ItemId> {
        match self.highlight()? {
            Highlight::Item(item) => Some(item),
            Highlight::Group(_) => None,
        }
    }

    /// Items of a collapsed or expanding group cannot be stepped or selected.
    #[must_use]
    pub fn is_interactable(&self, item: ItemId) -> bool {
        let item = self.tree.item(item);
        match item.group() {
            None => true,
            Some(group) => item.is_visible() && self.tree.group(group).is_expanded(),
        }
    }

    pub fn ensure_detached(&mut self, key: IssueKey) -> ItemId {
        self.tree.ensure_detached(key, String::new())
    }

    // -- selection ----------------------------------------------------------

    /// Make `item` current in its group and request its display.
    ///
    /// With `propagate`, the group becomes its board's current group and the
    /// board becomes `current_board`. Detached items are only displayed.
    pub fn set_current(&mut self, item: ItemId, propagate: bool, request: DisplayRequest) -> Handled {
        let Some(group) = self.tree.item(item).group() else {
            self.events.push(NavEvent::Display { item, request });
            return Handled::Consumed;
        };
        if !self.is_interactable(item) {
            return Handled::Ignored;
        }
        self.tree.group_mut(group).set_current(Some(item));
        if propagate {
            let board = self.tree.group(group).board();
            self.tree.board_mut(board).set_current_group(Some(group));
            self.current_board = Some(board);
        }
        tracing::debug!(key = %self.tree.item(item).key, propagate, "item selected");
        self.events.push(NavEvent::Display { item, request });
        Handled::Consumed
    }

    fn select(&mut self, item: ItemId) -> Handled {
        self.set_current(item, true, DisplayRequest::default())
    }

    /// Header-select `group`. A collapsed group keeps its current item but
    /// the highlight stays on the header.
    fn select_header(&mut self, board: BoardId, group: GroupId) -> Handled {
        self.tree.board_mut(board).set_current_group(Some(group));
        self.current_board = Some(board);
        tracing::debug!(board = board.index(), group = group.index(), "group header selected");
        Handled::Consumed
    }

    /// Header-select `group` on its own board (pointer click on a header).
    pub fn select_group(&mut self, group: GroupId) -> Handled {
        let board = self.tree.group(group).board();
        self.select_header(board, group)
    }

    // -- group-level stepping -----------------------------------------------

    /// Step to the next visible item inside `group`.
    pub fn step_next(&mut self, group: GroupId) -> Step {
        let g = self.tree.group(group);
        if !g.is_expanded() {
            return Step::Boundary;
        }
        let target = match g.current() {
            None => g.first_visible(),
            Some(current) => g
                .position(current)
                .and_then(|pos| g.filtered().get(pos + 1).copied()),
        };
        match target {
            Some(item) => {
                self.select(item);
                Step::Moved
            }
            None => Step::Boundary,
        }
    }

    /// Step to the previous visible item inside `group`.
    pub fn step_previous(&mut self, group: GroupId) -> Step {
        let g = self.tree.group(group);
        if !g.is_expanded() {
            return Step::Boundary;
        }
        let Some(current) = g.current() else {
            return Step::Ignored;
        };
        let target = g
            .position(current)
            .and_then(|pos| pos.checked_sub(1))
            .and_then(|pos| g.filtered().get(pos).copied());
        match target {
            Some(item) => {
                self.select(item);
                Step::Moved
            }
            None => Step::Boundary,
        }
    }

    // -- board-level traversal ----------------------------------------------

    pub fn go_to_next_item(&mut self, board: BoardId) -> Handled {
        let Some(group) = self.tree.board(board).current_group() else {
            return match self.visible_groups(board).first() {
                Some(&target) => self.enter_group(board, target, Direction::Forward),
                None => self.run_off(board),
            };
        };
        match self.step_next(group) {
            Step::Moved => Handled::Consumed,
            Step::Boundary | Step::Ignored => self.cross(board, group, Direction::Forward),
        }
    }

    pub fn go_to_previous_item(&mut self, board: BoardId) -> Handled {
        let Some(group) = self.tree.board(board).current_group() else {
            return Handled::Ignored;
        };
        let g = self.tree.group(group);
        if g.is_expanded() && g.current().is_some() && self.step_previous(group) == Step::Moved {
            return Handled::Consumed;
        }
        self.cross(board, group, Direction::Backward)
    }

    fn cross(&mut self, board: BoardId, from: GroupId, direction: Direction) -> Handled {
        let groups = self.visible_groups(board);
        let all = self.tree.board(board).groups();
        let Some(from_pos) = all.iter().position(|g| *g == from) else {
            return Handled::Ignored;
        };
        let adjacent = match direction {
            Direction::Forward => all[from_pos + 1..].iter().find(|g| groups.contains(g)),
            Direction::Backward => all[..from_pos].iter().rev().find(|g| groups.contains(g)),
        }
        .copied();
        match adjacent {
            Some(target) => self.enter_group(board, target, direction),
            None => self.run_off(board),
        }
    }

    fn enter_group(&mut self, board: BoardId, target: GroupId, direction: Direction) -> Handled {
        let g = self.tree.group(target);
        let item = match direction {
            Direction::Forward if g.is_expanded() => g
                .current()
                .filter(|item| g.filtered().contains(item))
                .or_else(|| g.first_visible()),
            Direction::Backward if g.is_expanded() => g.last_visible(),
            _ => None,
        };
        match item {
            Some(item) => self.select(item),
            None => self.select_header(board, target),
        }
    }

    /// Ran off either end of the board: clear the selection and hand focus
    /// to the filter input when there is one.
    fn run_off(&mut self, board: BoardId) -> Handled {
        if let Some(group) = self.tree.board(board).current_group() {
            self.tree.group_mut(group).set_current(None);
        }
        self.tree.board_mut(board).set_current_group(None);
        tracing::debug!(board = board.index(), "ran off board, selection cleared");
        if self.tree.board(board).has_filter() {
            self.focus_filter(board);
        }
        Handled::Consumed
    }

    /// Groups of `board` that currently have visible items, in board order.
    fn visible_groups(&self, board: BoardId) -> Vec<GroupId> {
        self.tree
            .board(board)
            .groups()
            .iter()
            .copied()
            .filter(|g| self.tree.group(*g).has_visible_items())
            .collect()
    }

    // -- direct jumps -------------------------------------------------------

    fn jump_to_group(&mut self, board: BoardId, target: GroupId) -> Handled {
        if self.tree.group(target).is_expanded() {
            self.tree.group_mut(target).set_current(None);
        }
        self.select_header(board, target)
    }

    pub fn go_to_next_group(&mut self, board: BoardId) -> Handled {
        let groups = self.visible_groups(board);
        let current = self.tree.board(board).current_group();
        let target = match current.and_then(|c| groups.iter().position(|g| *g == c)) {
            None => groups.first(),
            Some(pos) => groups.get(pos + 1),
        };
        match target.copied() {
            Some(target) => self.jump_to_group(board, target),
            None => Handled::Ignored,
        }
    }

    pub fn go_to_previous_group(&mut self, board: BoardId) -> Handled {
        let groups = self.visible_groups(board);
        let current = self.tree.board(board).current_group();
        let target = match current.and_then(|c| groups.iter().position(|g| *g == c)) {
            None => groups.last(),
            Some(pos) => pos.checked_sub(1).and_then(|pos| groups.get(pos)),
        };
        match target.copied() {
            Some(target) => self.jump_to_group(board, target),
            None => Handled::Ignored,
        }
    }

    pub fn go_to_first_group(&mut self, board: BoardId) -> Handled {
        match self.visible_groups(board).first() {
            Some(&target) => self.jump_to_group(board, target),
            None => Handled::Ignored,
        }
    }

    pub fn go_to_last_group(&mut self, board: BoardId) -> Handled {
        match self.visible_groups(board).last() {
            Some(&target) => self.jump_to_group(board, target),
            None => Handled::Ignored,
        }
    }

    fn current_group_with_item(&self, board: BoardId) -> Option<&Group> {
        let group = self.tree.group(self.tree.board(board).current_group()?);
        (group.is_expanded() && group.current().is_some()).then_some(group)
    }

    pub fn go_to_first_item(&mut self, board: BoardId) -> Handled {
        match self.current_group_with_item(board).and_then(Group::first_visible) {
            Some(item) => self.select(item),
            None => Handled::Ignored,
        }
    }

    pub fn go_to_last_item(&mut self, board: BoardId) -> Handled {
        match self.current_group_with_item(board).and_then(Group::last_visible) {
            Some(item) => self.select(item),
            None => Handled::Ignored,
        }
    }

    // -- expansion ----------------------------------------------------------

    /// Start expanding `group`; `then` runs once it is open.
    pub fn request_open(&mut self, group: GroupId, then: Option<Continuation>) -> Handled {
        let g = self.tree.group(group);
        if !g.is_collapsible() || !g.is_collapsed() || !g.has_visible_items() {
            return Handled::Ignored;
        }
        if self.open_ticks == 0 {
            self.on_opened(group, then);
            return Handled::Consumed;
        }
        self.tree.group_mut(group).set_state(GroupState::Expanding {
            ticks_left: self.open_ticks,
        });
        self.pending_open.insert(group, then);
        tracing::debug!(group = group.index(), "group expanding");
        Handled::Consumed
    }

    /// Collapse `group`, cancelling an in-flight expansion.
    pub fn close(&mut self, group: GroupId) -> Handled {
        let g = self.tree.group(group);
        if !g.is_collapsible() || g.is_collapsed() {
            return Handled::Ignored;
        }
        self.pending_open.remove(&group);
        self.tree.group_mut(group).set_state(GroupState::Collapsed);
        tracing::debug!(group = group.index(), "group collapsed");
        Handled::Consumed
    }

    pub fn toggle(&mut self, group: GroupId) -> Handled {
        if self.tree.group(group).is_collapsed() {
            self.request_open(group, Some(Continuation::SelectFirstItem))
        } else {
            self.close(group)
        }
    }

    pub fn open_current_group(&mut self, board: BoardId) -> Handled {
        match self.tree.board(board).current_group() {
            Some(group) => self.request_open(group, Some(Continuation::SelectFirstItem)),
            None => Handled::Ignored,
        }
    }

    pub fn close_current_group(&mut self, board: BoardId) -> Handled {
        match self.tree.board(board).current_group() {
            Some(group) => self.close(group),
            None => Handled::Ignored,
        }
    }

    pub fn toggle_current_group(&mut self, board: BoardId) -> Handled {
        match self.tree.board(board).current_group() {
            Some(group) => self.toggle(group),
            None => Handled::Ignored,
        }
    }

    #[must_use]
    pub fn has_pending_opens(&self) -> bool {
        !self.pending_open.is_empty()
    }

    /// Advance expansion transitions. Returns `true` if anything changed.
    pub fn tick(&mut self) -> bool {
        if self.pending_open.is_empty() {
            return false;
        }
        let mut finished = Vec::new();
        for &group in self.pending_open.keys() {
            let g = self.tree.group_mut(group);
            match g.state() {
                GroupState::Expanding { ticks_left } if ticks_left > 1 => {
                    g.set_state(GroupState::Expanding {
                        ticks_left: ticks_left - 1,
                    });
                }
                _ => finished.push(group),
            }
        }
        for group in finished {
            let then = self.pending_open.remove(&group).flatten();
            self.on_opened(group, then);
        }
        true
    }

    fn on_opened(&mut self, group: GroupId, then: Option<Continuation>) {
        self.tree.group_mut(group).set_state(GroupState::Expanded);
        tracing::debug!(group = group.index(), "group expanded");
        let target = match then {
            Some(Continuation::SelectFirstItem) => self.tree.group(group).first_visible(),
            Some(Continuation::SelectItem(item)) => Some(item),
            None => None,
        };
        if let Some(item) = target {
            self.select(item);
        }
    }

    // -- filtering ----------------------------------------------------------

    /// Run a filter pass over `board`, then auto-select for non-empty text.
    pub fn apply_filter(&mut self, board: BoardId, raw: &str) -> FilterReport {
        let query = Query::parse(raw);
        let report = filter::apply(&mut self.tree, board, &query, self.fuzzy);
        if !query.is_empty() {
            self.auto_select(board);
        }
        report
    }

    fn auto_select(&mut self, board: BoardId) -> Handled {
        let target = self
            .tree
            .board(board)
            .groups()
            .iter()
            .map(|g| self.tree.group(*g))
            .find(|g| g.is_expanded() && g.has_visible_items())
            .and_then(Group::first_visible);
        match target {
            Some(item) => self.select(item),
            None => self.focus_filter(board),
        }
    }

    /// Give the board's filter input focus, stashing `current_board`.
    pub fn focus_filter(&mut self, board: BoardId) -> Handled {
        if !self.tree.board(board).has_filter() {
            return Handled::Ignored;
        }
        if let Some(current) = self.current_board.take() {
            self.previous_board = Some(current);
        }
        self.filter_focus = Some(board);
        self.events.push(NavEvent::FocusFilter(board));
        Handled::Consumed
    }

    /// Leave the filter input; restores the stashed board if nothing else
    /// became current meanwhile.
    pub fn blur_filter(&mut self) -> Handled {
        if self.filter_focus.take().is_none() {
            return Handled::Ignored;
        }
        if self.current_board.is_none() {
            self.current_board = self.previous_board.take();
        }
        Handled::Consumed
    }

    // -- panel callbacks ----------------------------------------------------

    /// A panel owned by `board` (or showing one of its items) took focus.
    pub const fn assert_board(&mut self, board: BoardId) {
        self.current_board = Some(board);
    }

    /// Focus moved to something no board owns; drop the stale highlight.
    pub fn clear_board_highlight(&mut self) {
        if let Some(current) = self.current_board.take() {
            self.previous_board = Some(current);
        }
    }
}
