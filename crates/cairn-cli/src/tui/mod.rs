//! Terminal user interface (TUI) for cairn.
//!
//! Boards on the left, the inline issue panel on the right, and a modal
//! overlay for issues opened with Enter or the go-to prompt.
//!
//! ## Entry points
//!
//! - [`runtime::run`]: terminal setup and the event loop.
//! - [`browser::BrowserView`]: input handling and drawing over a session.

pub mod browser;
pub mod editor;
pub mod keymap;
pub mod markup;
pub mod render;
pub mod runtime;
