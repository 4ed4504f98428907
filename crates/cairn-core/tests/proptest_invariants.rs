use cairn_core::IssueKey;
use cairn_core::error::FetchError;
use cairn_core::panel::PanelKind;
use cairn_core::session::{Session, SessionOptions};
use cairn_core::surface::{FetchResponse, SurfaceHint};
use cairn_core::tree::EntityTree;
use proptest::prelude::*;

#[path = "generators.rs"]
mod generators;
use generators::*;

fn start(listing: &cairn_core::model::listing::Listing) -> Session {
    let tree = EntityTree::from_listing(listing).expect("generated listings are valid");
    Session::new(
        tree,
        SessionOptions {
            open_ticks: 2,
            default_repository: Some("acme/elsewhere".into()),
            ..SessionOptions::default()
        },
    )
}

fn run(session: &mut Session, action: &Action) {
    match action {
        Action::Command(command) => {
            session.dispatch(*command);
        }
        Action::Tick => {
            session.tick();
        }
        Action::Filter(raw) => {
            if let Some(board) = session.routing_board() {
                session.apply_filter(board, raw);
            }
        }
        Action::Complete(ok) => {
            for request in session.take_fetches() {
                let result = if *ok {
                    Ok(format!("# {}", request.key))
                } else {
                    Err(FetchError::Transport("unreachable".into()))
                };
                session.complete(FetchResponse { request, result });
            }
        }
        Action::GoTo(number) => {
            session.go_to_issue(*number, None);
        }
        Action::Click(click) => click_on(session, click),
    }
}

fn click_on(session: &mut Session, click: &Click) {
    let tree = session.tree();
    let groups: Vec<_> = tree
        .board_ids()
        .flat_map(|board| tree.board(board).groups().to_vec())
        .collect();
    match click {
        Click::Item(pick) => {
            let items: Vec<_> = groups
                .iter()
                .flat_map(|group| tree.group(*group).filtered().to_vec())
                .collect();
            if !items.is_empty() {
                let item = items[pick.index(items.len())];
                session.select_item(item, SurfaceHint::Auto, false);
            }
        }
        Click::Group(pick) => {
            if !groups.is_empty() {
                let group = groups[pick.index(groups.len())];
                session.click_group(group);
            }
        }
        Click::Panel(pick) => {
            let panels: Vec<_> = session.panels().panels().iter().map(|p| p.kind).collect();
            let kind = panels[pick.index(panels.len())];
            session.click_panel(kind);
        }
    }
}

fn check_invariants(session: &Session) -> Result<(), TestCaseError> {
    let tree = session.tree();
    for board_id in tree.board_ids() {
        let board = tree.board(board_id);
        if let Some(group) = board.current_group() {
            prop_assert!(board.groups().contains(&group), "current group outside board");
        }
        for &group_id in board.groups() {
            let group = tree.group(group_id);
            if let Some(item) = group.current() {
                prop_assert!(
                    group.filtered().contains(&item),
                    "current item outside filtered sequence"
                );
                prop_assert!(tree.item(item).is_visible());
            }
            prop_assert!(group.filtered().iter().all(|id| group.items().contains(id)));
            let counter = group.counter();
            prop_assert_eq!(counter.visible, group.filtered().len());
            prop_assert_eq!(counter.total, group.items().len());
        }
    }

    let current = session.current_panel();
    prop_assert!(current.is_activable(session.env()), "current panel {current:?} not activable");
    let current_count = session
        .panels()
        .panels()
        .iter()
        .filter(|panel| panel.kind == current)
        .count();
    prop_assert_eq!(current_count, 1);
    prop_assert!(!session.panels().has_click_claim(current));
    if session.surfaces().overlay_open() {
        prop_assert_eq!(current, PanelKind::OverlayDetail, "overlay open behind another panel");
    }
    Ok(())
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn invariants_hold_after_every_action(
        listing in arb_listing(),
        actions in prop::collection::vec(arb_action(), 0..60),
    ) {
        let mut session = start(&listing);
        check_invariants(&session)?;
        for action in &actions {
            run(&mut session, action);
            check_invariants(&session)?;
        }
    }

    #[test]
    fn clearing_the_filter_restores_every_item(
        listing in arb_listing(),
        query in "[a-z ]{0,12}",
    ) {
        let mut session = start(&listing);
        let boards: Vec<_> = session.tree().board_ids().collect();
        for board in boards {
            session.apply_filter(board, &query);
            session.apply_filter(board, "");
            for &group in session.tree().board(board).groups() {
                let group = session.tree().group(group);
                prop_assert_eq!(group.filtered(), group.items());
                prop_assert!(!group.counter().is_filtered());
            }
        }
    }

    #[test]
    fn set_current_twice_leaves_identical_pointers(
        listing in arb_listing(),
        pick in any::<prop::sample::Index>(),
    ) {
        let mut session = start(&listing);
        prop_assume!(session.tree().item_count() > 0);
        let key: IssueKey = {
            let keys: Vec<IssueKey> = session
                .tree()
                .board_ids()
                .flat_map(|b| session.tree().board(b).groups().to_vec())
                .flat_map(|g| session.tree().group(g).items().to_vec())
                .map(|i| session.tree().item(i).key.clone())
                .collect();
            keys[pick.index(keys.len())].clone()
        };
        let item = session.tree().lookup(&key).expect("listed item");

        let snapshot = |s: &Session| {
            let boards: Vec<_> = s
                .tree()
                .board_ids()
                .map(|b| {
                    let board = s.tree().board(b);
                    let groups: Vec<_> = board
                        .groups()
                        .iter()
                        .map(|g| s.tree().group(*g).current())
                        .collect();
                    (board.current_group(), groups)
                })
                .collect();
            (s.nav().current_board(), boards)
        };

        session.select_item(item, SurfaceHint::Auto, false);
        let first = snapshot(&session);
        session.select_item(item, SurfaceHint::Auto, false);
        prop_assert_eq!(first, snapshot(&session));
    }
}
