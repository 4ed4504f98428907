//! Live text filter over a board's groups.
//!
//! A query is a list of lowercase whitespace-delimited tokens. An item is
//! visible when every token is a substring of its indexed text, or, with
//! fuzzy matching on, an ordered subsequence of it.

use crate::tree::{BoardId, EntityTree, ItemId};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use std::time::{Duration, Instant};

/// Default keystroke debounce before a filter pass runs.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    raw: String,
    tokens: Vec<String>,
}

impl Query {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let tokens = raw.split_whitespace().map(str::to_lowercase).collect();
        Self {
            raw: raw.to_string(),
            tokens,
        }
    }

    /// Text as typed.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Whether `text` (already lowercase) satisfies every token of `query`.
#[must_use]
pub fn matches(text: &str, query: &Query, fuzzy: bool) -> bool {
    let mut matcher: Option<SkimMatcherV2> = None;
    query.tokens.iter().all(|token| {
        if text.contains(token.as_str()) {
            return true;
        }
        if !fuzzy {
            return false;
        }
        matcher
            .get_or_insert_with(SkimMatcherV2::default)
            .fuzzy_match(text, token)
            .is_some()
    })
}

/// Outcome of one filter pass over a board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub visible: usize,
    pub total: usize,
    /// Group current items cleared because they became hidden.
    pub cleared_items: Vec<ItemId>,
    /// The board lost its current group because it has nothing visible.
    pub cleared_group: bool,
}

/// Recompute every group of `board` against `query`.
pub fn apply(tree: &mut EntityTree, board: BoardId, query: &Query, fuzzy: bool) -> FilterReport {
    let mut report = FilterReport::default();
    let groups = tree.board(board).groups().to_vec();

    for group_id in groups {
        let items = tree.group(group_id).items().to_vec();
        let mut filtered = Vec::with_capacity(items.len());
        for item_id in items {
            let visible = query.is_empty() || matches(tree.item(item_id).search_text(), query, fuzzy);
            tree.item_mut(item_id).set_visible(visible);
            report.total += 1;
            if visible {
                filtered.push(item_id);
            }
        }
        report.visible += filtered.len();

        let group = tree.group_mut(group_id);
        if let Some(current) = group.current()
            && !filtered.contains(&current)
        {
            group.set_current(None);
            report.cleared_items.push(current);
        }
        let empty = filtered.is_empty();
        group.set_filtered(filtered);

        if empty && tree.board(board).current_group() == Some(group_id) {
            tree.board_mut(board).set_current_group(None);
            report.cleared_group = true;
        }
    }

    if let Some(binding) = tree.board_mut(board).filter_mut() {
        binding.query = query.raw().to_string();
    }
    tracing::debug!(
        board = board.index(),
        query = query.raw(),
        visible = report.visible,
        total = report.total,
        "filter pass"
    );
    report
}

/// Keystroke debouncer for the filter input.
///
/// Call [`Debounce::keystroke`] on every edit and poll [`Debounce::due`]
/// from the event loop tick.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Duration,
    last_keystroke: Option<Instant>,
    applied: String,
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl Debounce {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_keystroke: None,
            applied: String::new(),
        }
    }

    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    pub const fn keystroke(&mut self, now: Instant) {
        self.last_keystroke = Some(now);
    }

    /// True once `query` differs from the last applied text and the input
    /// has been idle for the delay. Marks `query` as applied.
    pub fn due(&mut self, query: &str, now: Instant) -> bool {
        let Some(last) = self.last_keystroke else {
            return false;
        };
        if query == self.applied || now.saturating_duration_since(last) < self.delay {
            return false;
        }
        self.settle(query);
        true
    }

    /// Record `query` as applied without waiting (explicit refresh).
    pub fn settle(&mut self, query: &str) {
        self.applied = query.to_string();
        self.last_keystroke = None;
    }
}
