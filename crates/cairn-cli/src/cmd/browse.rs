//! `cairn browse`: interactive board browser.

use crate::source::{load_listing, source_for};
use crate::tui::browser::{BrowserOptions, BrowserView};
use crate::tui::runtime;
use anyhow::Context;
use cairn_core::config::Config;
use cairn_core::location::parse_location;
use cairn_core::session::{Session, SessionOptions};
use cairn_core::tree::EntityTree;
use clap::Args;
use tracing::info;

#[derive(Args, Debug)]
pub struct BrowseArgs {
    /// Listing file or http(s) URL.
    pub listing: String,

    /// Issue to select on start: `#issue-12`, `owner/repo#12` or an issue path.
    #[arg(short, long)]
    pub select: Option<String>,

    /// Show issues in the overlay only, without the side panel.
    #[arg(long)]
    pub no_inline: bool,
}

fn session_options(args: &BrowseArgs, config: &Config) -> SessionOptions {
    let mut options = SessionOptions::from_config(config);
    if args.no_inline {
        options.inline_detail = false;
    }
    options
}

/// Run `cairn browse`.
///
/// # Errors
///
/// Returns an error if the listing, the selection or the terminal cannot be set up.
pub fn run_browse(args: &BrowseArgs, config: &Config) -> anyhow::Result<()> {
    let selection = args
        .select
        .as_deref()
        .map(parse_location)
        .transpose()
        .context("Invalid --select location")?;

    let listing = load_listing(&args.listing, config.server.timeout())?;
    let tree = EntityTree::from_listing(&listing)
        .with_context(|| format!("Invalid listing {}", args.listing))?;
    let source = source_for(&config.server, &args.listing)?;
    info!(source = %source.describe(), "content source ready");

    let mut session = Session::new(tree, session_options(args, config));
    if let Some(selection) = &selection {
        session.select_initial(selection);
    }

    let view = BrowserView::new(session, BrowserOptions::from_config(config));
    runtime::run(view, source.into())
}
