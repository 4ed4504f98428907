use cairn_core::command::Command;
use cairn_core::model::listing::{BoardEntry, GroupEntry, ItemEntry, Listing};
use proptest::prelude::*;

const WORDS: [&str; 8] = [
    "crash", "parser", "slow", "login", "render", "docs", "api", "panic",
];

pub fn arb_title() -> impl Strategy<Value = String> + Clone {
    prop::collection::vec(prop::sample::select(WORDS.to_vec()), 1..4).prop_map(|w| w.join(" "))
}

pub fn arb_group(board: usize, group: usize) -> impl Strategy<Value = GroupEntry> {
    (
        prop::collection::vec(arb_title(), 0..5),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(move |(titles, collapsible, collapsed)| GroupEntry {
            title: format!("group {board}.{group}"),
            repository: Some(format!("acme/repo{board}")),
            collapsible,
            collapsed,
            items: titles
                .into_iter()
                .enumerate()
                .map(|(i, title)| ItemEntry {
                    number: (group * 100 + i + 1) as u64,
                    repository: None,
                    title,
                    state: None,
                    labels: Vec::new(),
                    author: None,
                    updated_at: None,
                    search: None,
                })
                .collect(),
        })
}

pub fn arb_board(board: usize) -> impl Strategy<Value = BoardEntry> {
    (1usize..4, any::<bool>())
        .prop_flat_map(move |(groups, filter)| {
            let groups: Vec<_> = (0..groups).map(|g| arb_group(board, g)).collect();
            (groups, Just(filter))
        })
        .prop_map(move |(groups, filter)| BoardEntry {
            name: format!("board {board}"),
            filter,
            groups,
        })
}

/// Listings with unique `(number, repository)` pairs: one repository per
/// board, numbers unique per group.
pub fn arb_listing() -> impl Strategy<Value = Listing> {
    (1usize..3)
        .prop_flat_map(|boards| (0..boards).map(arb_board).collect::<Vec<_>>())
        .prop_map(|boards| Listing { boards })
}

#[derive(Debug, Clone)]
pub enum Action {
    Command(Command),
    Tick,
    Filter(String),
    /// Complete every pending fetch, successfully or not.
    Complete(bool),
    GoTo(u64),
    /// Pointer click, resolved against the session when run.
    Click(Click),
}

#[derive(Debug, Clone)]
pub enum Click {
    Item(prop::sample::Index),
    Group(prop::sample::Index),
    Panel(prop::sample::Index),
}

pub fn arb_click() -> impl Strategy<Value = Click> {
    prop_oneof![
        any::<prop::sample::Index>().prop_map(Click::Item),
        any::<prop::sample::Index>().prop_map(Click::Group),
        any::<prop::sample::Index>().prop_map(Click::Panel),
    ]
}

pub fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        6 => prop::sample::select(Command::ALL.to_vec()).prop_map(Action::Command),
        2 => Just(Action::Tick),
        1 => prop::option::of(prop::sample::select(WORDS.to_vec()))
            .prop_map(|word| Action::Filter(word.unwrap_or_default().to_string())),
        1 => any::<bool>().prop_map(Action::Complete),
        1 => (1u64..400).prop_map(Action::GoTo),
        2 => arb_click().prop_map(Action::Click),
    ]
}
