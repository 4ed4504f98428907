//! Closed set of keyboard commands.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    PreviousItem,
    NextItem,
    PreviousGroup,
    NextGroup,
    OpenGroup,
    CloseGroup,
    ToggleGroup,
    FirstGroup,
    LastGroup,
    FirstItem,
    LastItem,
    FocusFilter,
    ClearFilter,
    ToggleDetails,
    PanelLeft,
    PanelRight,
    OpenOverlay,
    CloseOverlay,
    Reload,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    ScrollTop,
    ScrollBottom,
}

/// Which component a command is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Board navigation on the current board.
    Board,
    /// Acts on whichever panel currently owns focus.
    Panel,
    /// Panel focus handoff and overlay lifecycle.
    Focus,
}

impl Command {
    pub const ALL: [Self; 25] = [
        Self::PreviousItem,
        Self::NextItem,
        Self::PreviousGroup,
        Self::NextGroup,
        Self::OpenGroup,
        Self::CloseGroup,
        Self::ToggleGroup,
        Self::FirstGroup,
        Self::LastGroup,
        Self::FirstItem,
        Self::LastItem,
        Self::FocusFilter,
        Self::ClearFilter,
        Self::ToggleDetails,
        Self::PanelLeft,
        Self::PanelRight,
        Self::OpenOverlay,
        Self::CloseOverlay,
        Self::Reload,
        Self::ScrollUp,
        Self::ScrollDown,
        Self::PageUp,
        Self::PageDown,
        Self::ScrollTop,
        Self::ScrollBottom,
    ];

    #[must_use]
    pub const fn scope(self) -> Scope {
        match self {
            Self::PreviousItem
            | Self::NextItem
            | Self::PreviousGroup
            | Self::NextGroup
            | Self::OpenGroup
            | Self::CloseGroup
            | Self::ToggleGroup
            | Self::FirstGroup
            | Self::LastGroup
            | Self::FirstItem
            | Self::LastItem
            | Self::FocusFilter
            | Self::ClearFilter
            | Self::OpenOverlay => Scope::Board,
            Self::ToggleDetails
            | Self::Reload
            | Self::ScrollUp
            | Self::ScrollDown
            | Self::PageUp
            | Self::PageDown
            | Self::ScrollTop
            | Self::ScrollBottom => Scope::Panel,
            Self::PanelLeft | Self::PanelRight | Self::CloseOverlay => Scope::Focus,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PreviousItem => "previous-item",
            Self::NextItem => "next-item",
            Self::PreviousGroup => "previous-group",
            Self::NextGroup => "next-group",
            Self::OpenGroup => "open-group",
            Self::CloseGroup => "close-group",
            Self::ToggleGroup => "toggle-group",
            Self::FirstGroup => "first-group",
            Self::LastGroup => "last-group",
            Self::FirstItem => "first-item",
            Self::LastItem => "last-item",
            Self::FocusFilter => "focus-filter",
            Self::ClearFilter => "clear-filter",
            Self::ToggleDetails => "toggle-details",
            Self::PanelLeft => "panel-left",
            Self::PanelRight => "panel-right",
            Self::OpenOverlay => "open-overlay",
            Self::CloseOverlay => "close-overlay",
            Self::Reload => "reload",
            Self::ScrollUp => "scroll-up",
            Self::ScrollDown => "scroll-down",
            Self::PageUp => "page-up",
            Self::PageDown => "page-down",
            Self::ScrollTop => "scroll-top",
            Self::ScrollBottom => "scroll-bottom",
        }
    }

    /// One-line description for the help overlay.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::PreviousItem => "Previous issue",
            Self::NextItem => "Next issue",
            Self::PreviousGroup => "Previous group",
            Self::NextGroup => "Next group",
            Self::OpenGroup => "Expand group",
            Self::CloseGroup => "Collapse group",
            Self::ToggleGroup => "Toggle group",
            Self::FirstGroup => "First group",
            Self::LastGroup => "Last group",
            Self::FirstItem => "First issue in group",
            Self::LastItem => "Last issue in group",
            Self::FocusFilter => "Focus filter",
            Self::ClearFilter => "Clear filter",
            Self::ToggleDetails => "Toggle comments and events",
            Self::PanelLeft => "Focus previous panel",
            Self::PanelRight => "Focus next panel",
            Self::OpenOverlay => "Open issue in overlay",
            Self::CloseOverlay => "Close overlay",
            Self::Reload => "Reload issue",
            Self::ScrollUp => "Scroll up",
            Self::ScrollDown => "Scroll down",
            Self::PageUp => "Page up",
            Self::PageDown => "Page down",
            Self::ScrollTop => "Scroll to top",
            Self::ScrollBottom => "Scroll to bottom",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command '{0}'")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.name() == s)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}
