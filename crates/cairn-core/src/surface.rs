//! Detail surfaces: the inline side panel and the modal overlay.
//!
//! A surface tracks the identity it targets (requested) and the identity
//! it shows (content applied). Content arrives asynchronously as a
//! [`FetchResponse`]; responses for anything but the current target are
//! dropped.

use crate::IssueKey;
use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Inline,
    Overlay,
}

/// Where a selection would like to be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceHint {
    #[default]
    Auto,
    Inline,
    Overlay,
}

/// Display parameters attached to a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisplayRequest {
    pub hint: SurfaceHint,
    /// Refetch even when the surface already targets the issue.
    pub force: bool,
}

impl DisplayRequest {
    #[must_use]
    pub const fn new(hint: SurfaceHint, force: bool) -> Self {
        Self { hint, force }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceState {
    Empty,
    Loading,
    Ready(String),
    /// Dismissible error text (inline surface only).
    Failed(String),
}

/// Scroll position, attached only while content is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollBinding {
    pub offset: u16,
}

/// Work order for the content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: u64,
    pub surface: SurfaceKind,
    pub key: IssueKey,
    /// Include comment and event sections.
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub request: FetchRequest,
    pub result: Result<String, FetchError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayOutcome {
    Requested(FetchRequest),
    /// The surface already targets this issue; no new fetch.
    Coalesced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Applied(SurfaceKind),
    Stale,
    /// `alert` is set when the failure must block the user (overlay).
    Failed {
        surface: SurfaceKind,
        alert: bool,
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct Surface {
    kind: SurfaceKind,
    target: IssueKey,
    shown: IssueKey,
    state: SurfaceState,
    scroll: Option<ScrollBinding>,
    verbose: bool,
}

impl Surface {
    const fn new(kind: SurfaceKind) -> Self {
        Self {
            kind,
            target: IssueKey::empty(),
            shown: IssueKey::empty(),
            state: SurfaceState::Empty,
            scroll: None,
            verbose: false,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> SurfaceKind {
        self.kind
    }

    /// Identity most recently requested.
    #[must_use]
    pub const fn target(&self) -> &IssueKey {
        &self.target
    }

    /// Identity whose content is currently applied.
    #[must_use]
    pub const fn shown(&self) -> &IssueKey {
        &self.shown
    }

    #[must_use]
    pub const fn state(&self) -> &SurfaceState {
        &self.state
    }

    #[must_use]
    pub const fn scroll(&self) -> Option<ScrollBinding> {
        self.scroll
    }

    #[must_use]
    pub const fn is_verbose(&self) -> bool {
        self.verbose
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.state, SurfaceState::Loading)
    }

    fn reset(&mut self) {
        self.target = IssueKey::empty();
        self.shown = IssueKey::empty();
        self.state = SurfaceState::Empty;
        self.scroll = None;
    }
}

/// Scroll operation on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollOp {
    Lines(i32),
    Top,
    Bottom,
}

#[derive(Debug, Clone)]
pub struct SurfaceManager {
    inline: Option<Surface>,
    overlay: Surface,
    overlay_open: bool,
    next_ticket: u64,
}

impl SurfaceManager {
    #[must_use]
    pub const fn new(inline: bool) -> Self {
        Self {
            inline: if inline {
                Some(Surface::new(SurfaceKind::Inline))
            } else {
                None
            },
            overlay: Surface::new(SurfaceKind::Overlay),
            overlay_open: false,
            next_ticket: 1,
        }
    }

    #[must_use]
    pub const fn inline_exists(&self) -> bool {
        self.inline.is_some()
    }

    #[must_use]
    pub const fn overlay_open(&self) -> bool {
        self.overlay_open
    }

    #[must_use]
    pub const fn surface(&self, kind: SurfaceKind) -> Option<&Surface> {
        match kind {
            SurfaceKind::Inline => self.inline.as_ref(),
            SurfaceKind::Overlay => Some(&self.overlay),
        }
    }

    const fn surface_mut(&mut self, kind: SurfaceKind) -> Option<&mut Surface> {
        match kind {
            SurfaceKind::Inline => self.inline.as_mut(),
            SurfaceKind::Overlay => Some(&mut self.overlay),
        }
    }

    /// Surface a hint resolves to.
    #[must_use]
    pub const fn resolve(&self, hint: SurfaceHint) -> SurfaceKind {
        match hint {
            SurfaceHint::Overlay => SurfaceKind::Overlay,
            SurfaceHint::Inline | SurfaceHint::Auto if self.inline.is_some() => SurfaceKind::Inline,
            SurfaceHint::Inline | SurfaceHint::Auto => SurfaceKind::Overlay,
        }
    }

    /// Point a surface at `key`, producing a fetch unless coalesced.
    pub fn display(&mut self, key: IssueKey, hint: SurfaceHint, force: bool) -> DisplayOutcome {
        let kind = self.resolve(hint);
        if kind == SurfaceKind::Overlay {
            self.overlay_open = true;
        }
        let ticket = self.next_ticket;
        let Some(surface) = self.surface_mut(kind) else {
            return DisplayOutcome::Coalesced;
        };

        let live = matches!(surface.state, SurfaceState::Loading | SurfaceState::Ready(_));
        if !force && live && surface.target == key {
            tracing::debug!(%key, ?kind, "display coalesced");
            return DisplayOutcome::Coalesced;
        }

        surface.target = key.clone();
        surface.state = SurfaceState::Loading;
        surface.scroll = None;
        let verbose = surface.verbose;
        self.next_ticket += 1;
        tracing::debug!(%key, ?kind, ticket, "display requested");
        DisplayOutcome::Requested(FetchRequest {
            ticket,
            surface: kind,
            key,
            verbose,
        })
    }

    /// Apply a fetch result to its surface.
    pub fn complete(&mut self, response: FetchResponse) -> Completion {
        let FetchResponse { request, result } = response;
        let overlay_open = self.overlay_open;
        let Some(surface) = self.surface_mut(request.surface) else {
            return Completion::Stale;
        };
        let closed = request.surface == SurfaceKind::Overlay && !overlay_open;
        if closed || surface.target != request.key || surface.verbose != request.verbose {
            tracing::debug!(key = %request.key, target = %surface.target, "dropping stale response");
            return Completion::Stale;
        }

        match result {
            Ok(content) => {
                surface.shown = request.key;
                surface.state = SurfaceState::Ready(content);
                surface.scroll = Some(ScrollBinding::default());
                Completion::Applied(request.surface)
            }
            Err(err) => {
                let message = format!("Could not load {}: {err}", request.key);
                tracing::warn!(key = %request.key, error = %err, "content fetch failed");
                match request.surface {
                    SurfaceKind::Inline => {
                        surface.state = SurfaceState::Failed(message.clone());
                        surface.scroll = None;
                        Completion::Failed {
                            surface: SurfaceKind::Inline,
                            alert: false,
                            message,
                        }
                    }
                    SurfaceKind::Overlay => {
                        self.close_overlay();
                        Completion::Failed {
                            surface: SurfaceKind::Overlay,
                            alert: true,
                            message,
                        }
                    }
                }
            }
        }
    }

    /// Show content that arrived outside the fetch protocol (a submission
    /// answer), replacing whatever the surface targets.
    pub fn show(&mut self, kind: SurfaceKind, key: IssueKey, content: String) -> bool {
        if kind == SurfaceKind::Overlay {
            self.overlay_open = true;
        }
        let Some(surface) = self.surface_mut(kind) else {
            return false;
        };
        surface.target = key.clone();
        surface.shown = key;
        surface.state = SurfaceState::Ready(content);
        surface.scroll = Some(ScrollBinding::default());
        true
    }

    /// Close the overlay and clear it back to the empty identity.
    pub fn close_overlay(&mut self) -> bool {
        let was_open = self.overlay_open;
        self.overlay_open = false;
        self.overlay.reset();
        was_open
    }

    /// Flip compact/full content and refetch the target.
    pub fn toggle_verbose(&mut self, kind: SurfaceKind) -> Option<FetchRequest> {
        let surface = self.surface_mut(kind)?;
        surface.verbose = !surface.verbose;
        self.reload(kind)
    }

    /// Force a refetch of the current target.
    pub fn reload(&mut self, kind: SurfaceKind) -> Option<FetchRequest> {
        let target = self.surface(kind)?.target.clone();
        if target.is_empty() {
            return None;
        }
        let hint = match kind {
            SurfaceKind::Inline => SurfaceHint::Inline,
            SurfaceKind::Overlay => SurfaceHint::Overlay,
        };
        match self.display(target, hint, true) {
            DisplayOutcome::Requested(request) => Some(request),
            DisplayOutcome::Coalesced => None,
        }
    }

    /// Clear an inline error back to empty.
    pub fn dismiss_error(&mut self, kind: SurfaceKind) -> bool {
        let Some(surface) = self.surface_mut(kind) else {
            return false;
        };
        if !matches!(surface.state, SurfaceState::Failed(_)) {
            return false;
        }
        surface.reset();
        true
    }

    /// Move the scroll binding; no-op while content is detached.
    pub fn scroll(&mut self, kind: SurfaceKind, op: ScrollOp) -> bool {
        let Some(surface) = self.surface_mut(kind) else {
            return false;
        };
        let SurfaceState::Ready(content) = &surface.state else {
            return false;
        };
        let max = u16::try_from(content.lines().count().saturating_sub(1)).unwrap_or(u16::MAX);
        let Some(binding) = surface.scroll.as_mut() else {
            return false;
        };
        let next = match op {
            ScrollOp::Top => 0,
            ScrollOp::Bottom => max,
            ScrollOp::Lines(delta) => {
                let moved = i64::from(binding.offset) + i64::from(delta);
                u16::try_from(moved.clamp(0, i64::from(max))).unwrap_or(max)
            }
        };
        let changed = next != binding.offset;
        binding.offset = next;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u64) -> IssueKey {
        IssueKey::new(n, "acme/api")
    }

    fn requested(outcome: DisplayOutcome) -> FetchRequest {
        match outcome {
            DisplayOutcome::Requested(request) => request,
            DisplayOutcome::Coalesced => panic!("expected a fetch"),
        }
    }

    #[test]
    fn hint_resolution() {
        let with_inline = SurfaceManager::new(true);
        assert_eq!(with_inline.resolve(SurfaceHint::Auto), SurfaceKind::Inline);
        assert_eq!(with_inline.resolve(SurfaceHint::Overlay), SurfaceKind::Overlay);
        let without = SurfaceManager::new(false);
        assert_eq!(without.resolve(SurfaceHint::Inline), SurfaceKind::Overlay);
    }

    #[test]
    fn same_key_while_pending_is_coalesced() {
        let mut surfaces = SurfaceManager::new(true);
        let first = requested(surfaces.display(key(1), SurfaceHint::Auto, false));
        assert_eq!(first.surface, SurfaceKind::Inline);
        assert_eq!(
            surfaces.display(key(1), SurfaceHint::Auto, false),
            DisplayOutcome::Coalesced
        );
        // Forced requests always go out.
        let forced = requested(surfaces.display(key(1), SurfaceHint::Auto, true));
        assert!(forced.ticket > first.ticket);
    }

    #[test]
    fn new_target_enters_loading_and_detaches_scroll() {
        let mut surfaces = SurfaceManager::new(true);
        let request = requested(surfaces.display(key(1), SurfaceHint::Auto, false));
        surfaces.complete(FetchResponse {
            request,
            result: Ok("body".into()),
        });
        let inline = surfaces.surface(SurfaceKind::Inline).expect("inline");
        assert!(inline.scroll().is_some());

        requested(surfaces.display(key(2), SurfaceHint::Auto, false));
        let inline = surfaces.surface(SurfaceKind::Inline).expect("inline");
        assert!(inline.is_loading());
        assert_eq!(inline.scroll(), None);
        assert_eq!(inline.shown(), &key(1));
        assert_eq!(inline.target(), &key(2));
    }

    #[test]
    fn superseded_response_is_stale() {
        let mut surfaces = SurfaceManager::new(true);
        let old = requested(surfaces.display(key(1), SurfaceHint::Auto, false));
        let new = requested(surfaces.display(key(2), SurfaceHint::Auto, false));

        let stale = surfaces.complete(FetchResponse {
            request: old,
            result: Ok("one".into()),
        });
        assert_eq!(stale, Completion::Stale);

        let applied = surfaces.complete(FetchResponse {
            request: new,
            result: Ok("two".into()),
        });
        assert_eq!(applied, Completion::Applied(SurfaceKind::Inline));
        let inline = surfaces.surface(SurfaceKind::Inline).expect("inline");
        assert_eq!(inline.state(), &SurfaceState::Ready("two".into()));
        assert_eq!(inline.shown(), &key(2));
    }

    #[test]
    fn inline_failure_is_dismissible() {
        let mut surfaces = SurfaceManager::new(true);
        let request = requested(surfaces.display(key(1), SurfaceHint::Auto, false));
        let completion = surfaces.complete(FetchResponse {
            request,
            result: Err(FetchError::Transport("timed out".into())),
        });
        assert!(matches!(completion, Completion::Failed { alert: false, .. }));
        assert!(surfaces.dismiss_error(SurfaceKind::Inline));
        let inline = surfaces.surface(SurfaceKind::Inline).expect("inline");
        assert_eq!(inline.state(), &SurfaceState::Empty);
    }

    #[test]
    fn overlay_failure_alerts_and_closes() {
        let mut surfaces = SurfaceManager::new(true);
        let request = requested(surfaces.display(key(1), SurfaceHint::Overlay, false));
        assert!(surfaces.overlay_open());
        let completion = surfaces.complete(FetchResponse {
            request,
            result: Err(FetchError::Status {
                status: 500,
                url: "http://x".into(),
            }),
        });
        assert!(matches!(completion, Completion::Failed { alert: true, .. }));
        assert!(!surfaces.overlay_open());
        assert!(surfaces.surface(SurfaceKind::Overlay).expect("overlay").target().is_empty());
    }

    #[test]
    fn response_after_overlay_close_is_stale() {
        let mut surfaces = SurfaceManager::new(false);
        let request = requested(surfaces.display(key(1), SurfaceHint::Auto, false));
        assert!(surfaces.close_overlay());
        let completion = surfaces.complete(FetchResponse {
            request,
            result: Ok("late".into()),
        });
        assert_eq!(completion, Completion::Stale);
    }

    #[test]
    fn toggle_verbose_refetches_and_drops_old_verbosity() {
        let mut surfaces = SurfaceManager::new(true);
        let compact = requested(surfaces.display(key(1), SurfaceHint::Auto, false));
        let full = surfaces
            .toggle_verbose(SurfaceKind::Inline)
            .expect("refetch");
        assert!(full.verbose);
        assert_eq!(
            surfaces.complete(FetchResponse {
                request: compact,
                result: Ok("short".into()),
            }),
            Completion::Stale
        );
        assert_eq!(
            surfaces.complete(FetchResponse {
                request: full,
                result: Ok("long".into()),
            }),
            Completion::Applied(SurfaceKind::Inline)
        );
    }

    #[test]
    fn scrolling_clamps_to_content() {
        let mut surfaces = SurfaceManager::new(true);
        assert!(!surfaces.scroll(SurfaceKind::Inline, ScrollOp::Lines(1)));
        surfaces.show(SurfaceKind::Inline, key(1), "a\nb\nc".into());
        assert!(surfaces.scroll(SurfaceKind::Inline, ScrollOp::Lines(10)));
        let offset = |s: &SurfaceManager| {
            s.surface(SurfaceKind::Inline)
                .and_then(Surface::scroll)
                .map(|b| b.offset)
        };
        assert_eq!(offset(&surfaces), Some(2));
        surfaces.scroll(SurfaceKind::Inline, ScrollOp::Top);
        assert_eq!(offset(&surfaces), Some(0));
        assert!(!surfaces.scroll(SurfaceKind::Inline, ScrollOp::Lines(-3)));
    }
}
