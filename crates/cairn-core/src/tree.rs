//! Board -> Group -> Item arena.
//!
//! Entities live in flat vectors and refer to each other through opaque
//! handles ([`BoardId`], [`GroupId`], [`ItemId`]). Lookup by issue identity
//! goes through the key index. Handles are only minted by the tree itself,
//! so indexing with them never goes out of bounds.
//!
//! # Invariants
//!
//! - A group's current item, if set, is in the group's filtered sequence.
//! - A board's current group, if set, is one of the board's groups.
//! - Every [`IssueKey`] maps to exactly one item.

use crate::IssueKey;
use crate::model::listing::{GroupEntry, ItemEntry, Listing, ListingError};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoardId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub(crate) usize);

impl BoardId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl GroupId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl ItemId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// A single selectable issue.
#[derive(Debug, Clone)]
pub struct Item {
    pub key: IssueKey,
    pub title: String,
    pub state: Option<String>,
    pub labels: Vec<String>,
    pub author: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    group: Option<GroupId>,
    visible: bool,
    search_text: String,
}

impl Item {
    fn from_entry(key: IssueKey, entry: &ItemEntry, group: GroupId) -> Self {
        let search_text = index_text(
            &key,
            &entry.title,
            &entry.labels,
            [
                entry.author.as_deref(),
                entry.state.as_deref(),
                entry.search.as_deref(),
            ],
        );
        Self {
            key,
            title: entry.title.clone(),
            state: entry.state.clone(),
            labels: entry.labels.clone(),
            author: entry.author.clone(),
            updated_at: entry.updated_at,
            group: Some(group),
            visible: true,
            search_text,
        }
    }

    fn detached(key: IssueKey, title: String) -> Self {
        let search_text = index_text(&key, &title, &[], [None, None, None]);
        Self {
            key,
            title,
            state: None,
            labels: Vec::new(),
            author: None,
            updated_at: None,
            group: None,
            visible: true,
            search_text,
        }
    }

    /// Owning group, `None` for an item synthesized outside every board.
    #[must_use]
    pub const fn group(&self) -> Option<GroupId> {
        self.group
    }

    #[must_use]
    pub const fn is_detached(&self) -> bool {
        self.group.is_none()
    }

    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Lowercase text the filter engine matches against.
    #[must_use]
    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub(crate) const fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}

fn index_text(key: &IssueKey, title: &str, labels: &[String], extra: [Option<&str>; 3]) -> String {
    let mut parts: Vec<String> = vec![
        title.to_string(),
        format!("#{}", key.number),
        key.repository.clone(),
    ];
    parts.extend(labels.iter().cloned());
    parts.extend(extra.into_iter().flatten().map(str::to_string));
    parts.join(" ").to_lowercase()
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// Collapse state of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    Expanded,
    Collapsed,
    /// Opening; items become interactable once the transition finishes.
    Expanding { ticks_left: u8 },
}

/// Visible/total item counter shown next to a group title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    pub visible: usize,
    pub total: usize,
}

impl Counter {
    #[must_use]
    pub const fn is_filtered(self) -> bool {
        self.visible != self.total
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_filtered() {
            write!(f, "{}/{}", self.visible, self.total)
        } else {
            write!(f, "{}", self.total)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub title: String,
    pub repository: Option<String>,
    board: BoardId,
    collapsible: bool,
    state: GroupState,
    items: Vec<ItemId>,
    filtered: Vec<ItemId>,
    current: Option<ItemId>,
}

impl Group {
    #[must_use]
    pub const fn board(&self) -> BoardId {
        self.board
    }

    #[must_use]
    pub const fn is_collapsible(&self) -> bool {
        self.collapsible
    }

    #[must_use]
    pub const fn state(&self) -> GroupState {
        self.state
    }

    /// Fully open: items are interactable.
    #[must_use]
    pub const fn is_expanded(&self) -> bool {
        matches!(self.state, GroupState::Expanded)
    }

    #[must_use]
    pub const fn is_collapsed(&self) -> bool {
        matches!(self.state, GroupState::Collapsed)
    }

    #[must_use]
    pub const fn is_expanding(&self) -> bool {
        matches!(self.state, GroupState::Expanding { .. })
    }

    /// Full item sequence in listing order.
    #[must_use]
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Items matching the active filter, in listing order.
    #[must_use]
    pub fn filtered(&self) -> &[ItemId] {
        &self.filtered
    }

    #[must_use]
    pub const fn current(&self) -> Option<ItemId> {
        self.current
    }

    #[must_use]
    pub fn has_visible_items(&self) -> bool {
        !self.filtered.is_empty()
    }

    #[must_use]
    pub fn counter(&self) -> Counter {
        Counter {
            visible: self.filtered.len(),
            total: self.items.len(),
        }
    }

    #[must_use]
    pub fn first_visible(&self) -> Option<ItemId> {
        self.filtered.first().copied()
    }

    #[must_use]
    pub fn last_visible(&self) -> Option<ItemId> {
        self.filtered.last().copied()
    }

    /// Position of `item` inside the filtered sequence.
    #[must_use]
    pub fn position(&self, item: ItemId) -> Option<usize> {
        self.filtered.iter().position(|id| *id == item)
    }

    pub(crate) const fn set_state(&mut self, state: GroupState) {
        self.state = state;
    }

    pub(crate) const fn set_current(&mut self, item: Option<ItemId>) {
        self.current = item;
    }

    pub(crate) fn set_filtered(&mut self, filtered: Vec<ItemId>) {
        self.filtered = filtered;
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Text bound to a board's filter input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterBinding {
    pub query: String,
}

#[derive(Debug, Clone)]
pub struct Board {
    pub name: String,
    groups: Vec<GroupId>,
    current_group: Option<GroupId>,
    filter: Option<FilterBinding>,
}

impl Board {
    #[must_use]
    pub fn groups(&self) -> &[GroupId] {
        &self.groups
    }

    #[must_use]
    pub const fn current_group(&self) -> Option<GroupId> {
        self.current_group
    }

    #[must_use]
    pub const fn filter(&self) -> Option<&FilterBinding> {
        self.filter.as_ref()
    }

    #[must_use]
    pub const fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    pub(crate) const fn set_current_group(&mut self, group: Option<GroupId>) {
        self.current_group = group;
    }

    pub(crate) const fn filter_mut(&mut self) -> Option<&mut FilterBinding> {
        self.filter.as_mut()
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct EntityTree {
    items: Vec<Item>,
    groups: Vec<Group>,
    boards: Vec<Board>,
    index: HashMap<IssueKey, ItemId>,
}

impl EntityTree {
    /// Build the arena from a listing, honoring each group's collapse markup.
    ///
    /// # Errors
    ///
    /// Returns a [`ListingError`] for items without an identity or for
    /// duplicate identities.
    pub fn from_listing(listing: &Listing) -> Result<Self, ListingError> {
        let mut tree = Self::default();
        for board_entry in &listing.boards {
            let board_id = BoardId(tree.boards.len());
            tree.boards.push(Board {
                name: board_entry.name.clone(),
                groups: Vec::new(),
                current_group: None,
                filter: board_entry.filter.then(FilterBinding::default),
            });
            for group_entry in &board_entry.groups {
                let group_id = tree.push_group(board_id, group_entry)?;
                tree.boards[board_id.0].groups.push(group_id);
            }
        }
        tracing::debug!(
            boards = tree.boards.len(),
            groups = tree.groups.len(),
            items = tree.items.len(),
            "entity tree built"
        );
        Ok(tree)
    }

    fn push_group(&mut self, board: BoardId, entry: &GroupEntry) -> Result<GroupId, ListingError> {
        let group_id = GroupId(self.groups.len());
        let mut items = Vec::with_capacity(entry.items.len());
        for item_entry in &entry.items {
            let key = item_entry.key(entry)?;
            if self.index.contains_key(&key) {
                return Err(ListingError::DuplicateItem(key));
            }
            let item_id = ItemId(self.items.len());
            self.index.insert(key.clone(), item_id);
            self.items.push(Item::from_entry(key, item_entry, group_id));
            items.push(item_id);
        }
        let state = if entry.collapsible && entry.collapsed {
            GroupState::Collapsed
        } else {
            GroupState::Expanded
        };
        self.groups.push(Group {
            title: entry.title.clone(),
            repository: entry.repository.clone(),
            board,
            collapsible: entry.collapsible,
            state,
            filtered: items.clone(),
            items,
            current: None,
        });
        Ok(group_id)
    }

    pub fn board_ids(&self) -> impl Iterator<Item = BoardId> + '_ {
        (0..self.boards.len()).map(BoardId)
    }

    #[must_use]
    pub fn board(&self, id: BoardId) -> &Board {
        &self.boards[id.0]
    }

    #[must_use]
    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.0]
    }

    #[must_use]
    pub fn item(&self, id: ItemId) -> &Item {
        &self.items[id.0]
    }

    #[must_use]
    pub fn board_count(&self) -> usize {
        self.boards.len()
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn lookup(&self, key: &IssueKey) -> Option<ItemId> {
        self.index.get(key).copied()
    }

    /// Find an item by number, preferring one in `repository`.
    #[must_use]
    pub fn find_number(&self, number: u64, repository: Option<&str>) -> Option<ItemId> {
        if let Some(repo) = repository {
            return self.lookup(&IssueKey::new(number, repo));
        }
        self.items
            .iter()
            .position(|item| item.key.number == number)
            .map(ItemId)
    }

    /// Return the item for `key`, synthesizing a detached one if needed.
    pub fn ensure_detached(&mut self, key: IssueKey, title: impl Into<String>) -> ItemId {
        if let Some(id) = self.lookup(&key) {
            return id;
        }
        let id = ItemId(self.items.len());
        tracing::debug!(%key, "synthesized detached item");
        self.index.insert(key.clone(), id);
        self.items.push(Item::detached(key, title.into()));
        id
    }

    /// Board that owns `item`, `None` when detached.
    #[must_use]
    pub fn board_of(&self, item: ItemId) -> Option<BoardId> {
        self.item(item).group.map(|group| self.group(group).board)
    }

    /// Whether `item` is its group's current item.
    #[must_use]
    pub fn is_current(&self, item: ItemId) -> bool {
        self.item(item)
            .group
            .is_some_and(|group| self.group(group).current == Some(item))
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> &mut Item {
        &mut self.items[id.0]
    }

    pub(crate) fn group_mut(&mut self, id: GroupId) -> &mut Group {
        &mut self.groups[id.0]
    }

    pub(crate) fn board_mut(&mut self, id: BoardId) -> &mut Board {
        &mut self.boards[id.0]
    }
}
