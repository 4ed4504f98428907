//! Keyboard focus arbitration between panels.
//!
//! Panels are ordered boards first, then the inline detail panel, then the
//! overlay. Exactly one panel is current. Handlable panels that are not
//! current hold a click claim: clicking inside them takes focus.

use crate::tree::BoardId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Board(BoardId),
    InlineDetail,
    OverlayDetail,
}

/// Facts the activability predicates depend on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PanelEnv {
    pub overlay_open: bool,
    pub inline_exists: bool,
}

impl PanelKind {
    #[must_use]
    pub const fn is_activable(self, env: PanelEnv) -> bool {
        match self {
            Self::Board(_) => true,
            Self::InlineDetail => env.inline_exists,
            Self::OverlayDetail => env.overlay_open,
        }
    }

    #[must_use]
    pub const fn is_board(self) -> bool {
        matches!(self, Self::Board(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Panel {
    pub kind: PanelKind,
    pub index: usize,
    /// Takes part in click and tab handoff.
    pub handlable: bool,
    click_claim: bool,
}

impl Panel {
    #[must_use]
    pub const fn has_click_claim(&self) -> bool {
        self.click_claim
    }
}

#[derive(Debug, Clone)]
pub struct PanelArbitrator {
    panels: Vec<Panel>,
    current: usize,
    previous: Option<usize>,
}

impl PanelArbitrator {
    /// Build the ring for `boards`, with the inline panel when `inline`.
    ///
    /// The first board starts current, or the inline panel when there are
    /// no boards.
    pub fn new(boards: impl IntoIterator<Item = BoardId>, inline: bool) -> Self {
        let mut kinds: Vec<(PanelKind, bool)> = boards
            .into_iter()
            .map(|board| (PanelKind::Board(board), true))
            .collect();
        if inline {
            kinds.push((PanelKind::InlineDetail, true));
        }
        kinds.push((PanelKind::OverlayDetail, false));

        let panels = kinds
            .into_iter()
            .enumerate()
            .map(|(index, (kind, handlable))| Panel {
                kind,
                index,
                handlable,
                click_claim: handlable && index != 0,
            })
            .collect();
        Self {
            panels,
            current: 0,
            previous: None,
        }
    }

    #[must_use]
    pub fn current(&self) -> PanelKind {
        self.panels[self.current].kind
    }

    #[must_use]
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    #[must_use]
    pub fn previous(&self) -> Option<PanelKind> {
        self.previous.map(|idx| self.panels[idx].kind)
    }

    fn index_of(&self, kind: PanelKind) -> Option<usize> {
        self.panels.iter().position(|panel| panel.kind == kind)
    }

    #[must_use]
    pub fn has_click_claim(&self, kind: PanelKind) -> bool {
        self.index_of(kind)
            .is_some_and(|idx| self.panels[idx].click_claim)
    }

    fn activate(&mut self, idx: usize) -> PanelKind {
        self.panels[idx].click_claim = false;
        let old = self.current;
        let kind = self.panels[idx].kind;
        // Nothing under the overlay can be clicked into focus.
        if self.panels[old].handlable && kind != PanelKind::OverlayDetail {
            self.panels[old].click_claim = true;
        }
        self.current = idx;
        tracing::debug!(from = ?self.panels[old].kind, to = ?kind, "panel activated");
        kind
    }

    /// Make `kind` current. Returns the activated kind so the caller can
    /// run the owner's activation hook, `None` for a no-op.
    pub fn select_panel(&mut self, kind: PanelKind, env: PanelEnv) -> Option<PanelKind> {
        let idx = self.index_of(kind)?;
        if idx == self.current || !kind.is_activable(env) {
            return None;
        }
        Some(self.activate(idx))
    }

    fn step(&mut self, env: PanelEnv, forward: bool) -> Option<PanelKind> {
        if !self.panels[self.current].handlable {
            return None;
        }
        let eligible = |panel: &&Panel| panel.handlable && panel.kind.is_activable(env);
        let found = if forward {
            self.panels[self.current + 1..].iter().find(eligible)
        } else {
            self.panels[..self.current].iter().rev().find(eligible)
        };
        let target = found?.index;
        Some(self.activate(target))
    }

    pub fn go_next_panel(&mut self, env: PanelEnv) -> Option<PanelKind> {
        self.step(env, true)
    }

    pub fn go_prev_panel(&mut self, env: PanelEnv) -> Option<PanelKind> {
        self.step(env, false)
    }

    /// A click landed in `kind`; activates it only if it holds a claim.
    pub fn claim_by_click(&mut self, kind: PanelKind, env: PanelEnv) -> Option<PanelKind> {
        if self.current() == PanelKind::OverlayDetail || !self.has_click_claim(kind) {
            return None;
        }
        self.select_panel(kind, env)
    }

    /// Remember the current panel and focus the overlay.
    pub fn open_overlay(&mut self, env: PanelEnv) -> Option<PanelKind> {
        let overlay = self.index_of(PanelKind::OverlayDetail)?;
        if self.current == overlay {
            return None;
        }
        let previous = self.current;
        let activated = self.select_panel(PanelKind::OverlayDetail, env)?;
        self.previous = Some(previous);
        Some(activated)
    }

    /// Leave the overlay for the remembered panel, or the first activable
    /// panel when that one is gone.
    pub fn close_overlay(&mut self, env: PanelEnv) -> Option<PanelKind> {
        let previous = self.previous.take();
        if self.current() != PanelKind::OverlayDetail {
            return None;
        }
        let env = PanelEnv {
            overlay_open: false,
            ..env
        };
        let target = previous
            .filter(|idx| self.panels[*idx].kind.is_activable(env))
            .or_else(|| self.panels.iter().position(|p| p.kind.is_board()))
            .or_else(|| self.panels.iter().position(|p| p.kind.is_activable(env)))?;
        Some(self.activate(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENV: PanelEnv = PanelEnv {
        overlay_open: false,
        inline_exists: true,
    };
    const OPEN: PanelEnv = PanelEnv {
        overlay_open: true,
        inline_exists: true,
    };

    fn arbitrator() -> PanelArbitrator {
        PanelArbitrator::new([BoardId(0), BoardId(1)], true)
    }

    #[test]
    fn layout_orders_boards_inline_overlay() {
        let panels = arbitrator();
        let kinds: Vec<PanelKind> = panels.panels().iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                PanelKind::Board(BoardId(0)),
                PanelKind::Board(BoardId(1)),
                PanelKind::InlineDetail,
                PanelKind::OverlayDetail,
            ]
        );
        assert_eq!(panels.current(), PanelKind::Board(BoardId(0)));
        assert!(!panels.panels()[3].handlable);
    }

    #[test]
    fn no_boards_starts_on_inline() {
        let panels = PanelArbitrator::new([], true);
        assert_eq!(panels.current(), PanelKind::InlineDetail);
    }

    #[test]
    fn select_moves_click_claims() {
        let mut panels = arbitrator();
        assert!(panels.has_click_claim(PanelKind::InlineDetail));
        assert!(!panels.has_click_claim(PanelKind::Board(BoardId(0))));

        assert_eq!(
            panels.select_panel(PanelKind::InlineDetail, ENV),
            Some(PanelKind::InlineDetail)
        );
        assert!(!panels.has_click_claim(PanelKind::InlineDetail));
        assert!(panels.has_click_claim(PanelKind::Board(BoardId(0))));
        assert_eq!(panels.select_panel(PanelKind::InlineDetail, ENV), None);
    }

    #[test]
    fn inactivable_panels_are_skipped() {
        let mut panels = arbitrator();
        assert_eq!(panels.select_panel(PanelKind::OverlayDetail, ENV), None);
        let no_inline = PanelEnv {
            inline_exists: false,
            ..ENV
        };
        assert_eq!(panels.go_next_panel(no_inline), Some(PanelKind::Board(BoardId(1))));
        assert_eq!(panels.go_next_panel(no_inline), None);
    }

    #[test]
    fn tab_handoff_does_not_wrap() {
        let mut panels = arbitrator();
        assert_eq!(panels.go_prev_panel(ENV), None);
        panels.go_next_panel(ENV);
        panels.go_next_panel(ENV);
        assert_eq!(panels.current(), PanelKind::InlineDetail);
        // Overlay is not handlable, so the ring ends here.
        assert_eq!(panels.go_next_panel(OPEN), None);
    }

    #[test]
    fn click_requires_a_claim() {
        let mut panels = arbitrator();
        assert_eq!(panels.claim_by_click(PanelKind::Board(BoardId(0)), ENV), None);
        assert_eq!(
            panels.claim_by_click(PanelKind::Board(BoardId(1)), ENV),
            Some(PanelKind::Board(BoardId(1)))
        );
    }

    #[test]
    fn overlay_round_trip_restores_previous_panel() {
        let mut panels = arbitrator();
        panels.select_panel(PanelKind::Board(BoardId(1)), ENV);
        assert_eq!(panels.open_overlay(OPEN), Some(PanelKind::OverlayDetail));
        assert_eq!(panels.previous(), Some(PanelKind::Board(BoardId(1))));
        // Overlay is modal: no tab handoff out of it.
        assert_eq!(panels.go_prev_panel(OPEN), None);

        assert!(!panels.has_click_claim(PanelKind::Board(BoardId(1))));
        assert_eq!(panels.claim_by_click(PanelKind::InlineDetail, OPEN), None);
        assert_eq!(panels.current(), PanelKind::OverlayDetail);

        assert_eq!(panels.close_overlay(ENV), Some(PanelKind::Board(BoardId(1))));
        assert_eq!(panels.current(), PanelKind::Board(BoardId(1)));
        assert_eq!(panels.previous(), None);
        // The overlay never gets a click claim.
        assert!(!panels.has_click_claim(PanelKind::OverlayDetail));
    }

    #[test]
    fn close_without_open_overlay_is_noop() {
        let mut panels = arbitrator();
        assert_eq!(panels.close_overlay(ENV), None);
    }
}
