//! `cairn list`: print a listing, optionally filtered.

use crate::output::{OutputMode, pretty_section, render_mode};
use crate::source::load_listing;
use anyhow::{Context, bail};
use cairn_core::config::Config;
use cairn_core::filter::{self, Query};
use cairn_core::tree::{BoardId, EntityTree};
use clap::Args;
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Listing file or http(s) URL.
    pub listing: String,

    /// Only show the board with this name.
    #[arg(short, long)]
    pub board: Option<String>,

    /// Filter text applied to every shown board.
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Fall back to fuzzy matching for tokens without a substring match.
    #[arg(long)]
    pub fuzzy: bool,
}

#[derive(Debug, Serialize)]
struct ListOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    visible: usize,
    total: usize,
    boards: Vec<BoardRow>,
}

#[derive(Debug, Serialize)]
struct BoardRow {
    name: String,
    groups: Vec<GroupRow>,
}

#[derive(Debug, Serialize)]
struct GroupRow {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    repository: Option<String>,
    collapsed: bool,
    visible: usize,
    total: usize,
    items: Vec<ItemRow>,
}

#[derive(Debug, Serialize)]
struct ItemRow {
    number: u64,
    repository: String,
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    updated: Option<String>,
}

/// Run `cairn list`.
///
/// # Errors
///
/// Returns an error if the listing cannot be loaded or no board matches `--board`.
pub fn run_list(args: &ListArgs, config: &Config, output: OutputMode) -> anyhow::Result<()> {
    let listing = load_listing(&args.listing, config.server.timeout())?;
    let mut tree = EntityTree::from_listing(&listing)
        .with_context(|| format!("Invalid listing {}", args.listing))?;
    let fuzzy = args.fuzzy || config.filter.fuzzy;
    let list_output = build_output(&mut tree, args.board.as_deref(), args.filter.as_deref(), fuzzy)?;

    render_mode(output, &list_output, render_list_text, render_list_human)
}

fn build_output(
    tree: &mut EntityTree,
    board_name: Option<&str>,
    filter_text: Option<&str>,
    fuzzy: bool,
) -> anyhow::Result<ListOutput> {
    let boards: Vec<BoardId> = tree
        .board_ids()
        .filter(|id| board_name.is_none_or(|name| tree.board(*id).name == name))
        .collect();
    if let Some(name) = board_name
        && boards.is_empty()
    {
        bail!("No board named '{name}' in the listing");
    }

    let query = Query::parse(filter_text.unwrap_or_default());
    let mut list_output = ListOutput {
        filter: filter_text.map(str::to_string),
        visible: 0,
        total: 0,
        boards: Vec::with_capacity(boards.len()),
    };

    for board in boards {
        let report = filter::apply(tree, board, &query, fuzzy);
        list_output.visible += report.visible;
        list_output.total += report.total;

        let groups = tree
            .board(board)
            .groups()
            .iter()
            .map(|&group_id| {
                let group = tree.group(group_id);
                let counter = group.counter();
                GroupRow {
                    title: group.title.clone(),
                    repository: group.repository.clone(),
                    collapsed: group.is_collapsed(),
                    visible: counter.visible,
                    total: counter.total,
                    items: group
                        .filtered()
                        .iter()
                        .map(|&item_id| {
                            let item = tree.item(item_id);
                            ItemRow {
                                number: item.key.number,
                                repository: item.key.repository.clone(),
                                title: item.title.clone(),
                                state: item.state.clone(),
                                labels: item.labels.clone(),
                                author: item.author.clone(),
                                updated: item.updated_at.map(|at| at.format("%Y-%m-%d").to_string()),
                            }
                        })
                        .collect(),
                }
            })
            .collect();
        list_output.boards.push(BoardRow {
            name: tree.board(board).name.clone(),
            groups,
        });
    }
    Ok(list_output)
}

fn render_list_human(out: &ListOutput, w: &mut dyn Write) -> std::io::Result<()> {
    if out.visible == 0 {
        match &out.filter {
            Some(filter) => writeln!(w, "No issues match '{filter}'")?,
            None => writeln!(w, "No issues in this listing")?,
        }
        return Ok(());
    }

    for board in &out.boards {
        pretty_section(w, &board.name)?;
        for group in &board.groups {
            let counter = if group.visible == group.total {
                group.total.to_string()
            } else {
                format!("{}/{}", group.visible, group.total)
            };
            let marker = if group.collapsed { "▸" } else { "▾" };
            writeln!(w, "{marker} {} ({counter})", group.title)?;
            for item in &group.items {
                let state = item.state.as_deref().unwrap_or("-");
                write!(w, "    #{:<6} {:<8} {}", item.number, state, item.title)?;
                if !item.labels.is_empty() {
                    write!(w, "  [{}]", item.labels.join(", "))?;
                }
                writeln!(w)?;
            }
        }
        writeln!(w)?;
    }
    writeln!(w, "{} of {} issue(s) shown", out.visible, out.total)
}

fn render_list_text(out: &ListOutput, w: &mut dyn Write) -> std::io::Result<()> {
    for board in &out.boards {
        for group in &board.groups {
            for item in &group.items {
                writeln!(
                    w,
                    "{}  {}#{}  {}  {}",
                    board.name,
                    item.repository,
                    item.number,
                    item.state.as_deref().unwrap_or("-"),
                    item.title
                )?;
            }
        }
    }
    Ok(())
}
