//! cairn-core library.
//!
//! Sans-I/O state for the cairn issue browser: the board/group/item arena,
//! the live filter, keyboard navigation, detail surfaces and panel focus.
//! Nothing in this crate touches the terminal or the network; the CLI feeds
//! it commands and fetch results and drains the requests it produces.
//!
//! # Conventions
//!
//! - **Errors**: module-level `thiserror` enums mapped onto [`error::ErrorCode`];
//!   `anyhow::Result` for config loading.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).
//! - **Navigation results**: operations never fail; "nothing to do" is
//!   reported as [`nav::Handled::Ignored`].

pub mod command;
pub mod config;
pub mod error;
pub mod filter;
pub mod form;
pub mod location;
pub mod model;
pub mod nav;
pub mod panel;
pub mod session;
pub mod surface;
pub mod tree;

pub use model::key::IssueKey;
