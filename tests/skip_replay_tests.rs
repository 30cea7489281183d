//! Deterministic skip-replay behavior
//!
//! A branch evaluated during a normal run caches its outcome; a later skip
//! replays the recorded path even if the world changed in between. Entries
//! that never ran evaluate fresh.

use maku::{
    Action, ActionEnd, ActionKind, ActionList, Arg, Comparison, Directive, Engine, GameState,
};

fn say(speaker: &str, text: &str) -> Action {
    Action::new(ActionKind::Say {
        speaker: Arg::literal(speaker),
        text: Arg::literal(text),
        seconds: 0.0,
    })
}

fn said(directives: &[Directive]) -> Vec<String> {
    directives
        .iter()
        .filter_map(|d| match d {
            Directive::Say { text, .. } => Some(text.clone()),
            _ => None,
        })
        .collect()
}

fn branching_scene() -> ActionList {
    ActionList::new(
        "scene",
        vec![
            say("Guard", "Papers, please."),
            Action::new(ActionKind::Check {
                variable: "a".to_string(),
                comparison: Comparison::Equal,
                value: Arg::literal(1),
                on_true: ActionEnd::Skip { index: 2 },
                on_false: ActionEnd::Stop,
            }),
            say("Guard", "Move along."),
        ],
    )
}

/// An unskippable blocking list that keeps gameplay blocked, so the skip
/// queue survives the completed run.
fn holder() -> ActionList {
    let mut list = ActionList::new(
        "holder",
        vec![Action::new(ActionKind::Wait { seconds: 100.0 })],
    );
    list.skippable = false;
    list
}

#[test]
fn completed_run_replays_identically_after_world_change() {
    let mut engine = Engine::new();
    engine.set_var("a", "1");
    engine.start(branching_scene()).unwrap();
    engine.start(holder()).unwrap();

    let report = engine.tick(0.0);
    assert_eq!(
        said(&report.directives),
        vec!["Papers, please.", "Move along."]
    );
    assert!(!engine.is_list_running("scene"));
    // Gameplay is still blocked, so the queue entry survives
    assert!(engine.is_gameplay_blocked());

    // Flip the branch variable: a fresh evaluation would now stop early
    engine.set_var("a", "0");
    let skipped = engine.skip_all();
    assert_eq!(said(&skipped), vec!["Papers, please.", "Move along."]);
}

#[test]
fn unran_entry_evaluates_fresh_on_skip() {
    let mut scene = branching_scene();
    scene.trigger_time = 60.0; // still queued when the skip arrives
    let mut engine = Engine::new();
    engine.set_var("a", "0");
    engine.start(scene).unwrap();
    engine.start(holder()).unwrap();

    let report = engine.tick(0.0);
    assert!(said(&report.directives).is_empty());

    let skipped = engine.skip_all();
    // No cached outcome: the false socket stops after the first line
    assert_eq!(said(&skipped), vec!["Papers, please."]);
}

#[test]
fn mid_flight_skip_replays_the_recorded_branch() {
    let scene = ActionList::new(
        "scene",
        vec![
            Action::new(ActionKind::Check {
                variable: "a".to_string(),
                comparison: Comparison::Equal,
                value: Arg::literal(1),
                on_true: ActionEnd::Skip { index: 1 },
                on_false: ActionEnd::Stop,
            }),
            say("Guard", "This way."),
            Action::new(ActionKind::Wait { seconds: 30.0 }),
            say("Guard", "We made it."),
        ],
    );
    let mut engine = Engine::new();
    engine.set_var("a", "1");
    engine.start(scene).unwrap();

    let report = engine.tick(0.0);
    assert_eq!(said(&report.directives), vec!["This way."]);
    assert!(engine.is_list_running("scene"));

    // Branch variable flips while the wait is in flight
    engine.set_var("a", "0");
    let skipped = engine.skip_all();
    assert_eq!(said(&skipped), vec!["This way.", "We made it."]);
    assert!(!engine.are_lists_running());
    assert_eq!(engine.game_state(), GameState::Normal);
}

#[test]
fn skip_queue_clears_once_gameplay_catches_up() {
    let mut engine = Engine::new();
    engine.set_var("a", "1");
    engine.start(branching_scene()).unwrap();

    let report = engine.tick(0.0);
    assert_eq!(report.state, GameState::Normal);

    // The scene finished and nothing blocks gameplay: the queue is gone,
    // so a skip request has nothing to replay.
    engine.set_var("a", "0");
    let skipped = engine.skip_all();
    assert!(skipped.is_empty());
}

#[test]
fn skip_applies_variable_writes_for_state_catchup() {
    let scene = ActionList::new(
        "loot",
        vec![
            Action::new(ActionKind::Wait { seconds: 10.0 }),
            Action::new(ActionKind::SetVar {
                name: "gold".to_string(),
                value: Arg::literal(50),
            }),
        ],
    );
    let mut engine = Engine::new();
    engine.start(scene).unwrap();
    engine.tick(0.0);
    assert_eq!(engine.get_var("gold"), None);

    engine.skip_all();
    assert_eq!(engine.get_var("gold").as_deref(), Some("50"));
}

#[test]
fn skipped_chain_inherits_skip_mode() {
    let mut engine = Engine::new();
    engine
        .register_script(
            r#"
# Part Two
[WAIT 60s]
[SAY speaker=N]
part two done
"#,
        )
        .unwrap();
    engine
        .register_script(
            r#"
# Part One
[SAY speaker=N]
part one
[WAIT 60s]
[RUN asset=part_two]
"#,
        )
        .unwrap();
    engine.start_asset("part_one").unwrap();

    let report = engine.tick(0.0);
    assert_eq!(said(&report.directives), vec!["part one"]);

    // Skipping part one chains into part two, which is fast-forwarded too
    let skipped = engine.skip_all();
    assert_eq!(said(&skipped), vec!["part one", "part two done"]);
    assert!(!engine.are_lists_running());
}
