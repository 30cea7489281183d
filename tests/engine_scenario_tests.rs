//! End-to-end scenarios through the public engine API

use maku::{
    Action, ActionEnd, ActionKind, ActionList, Arg, Comparison, Directive, Engine, EndPolicy,
    GameState, ListType, ParamSet, VarValue,
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

#[test]
fn three_action_list_visits_every_index() {
    // [Say, Check(a==1) -> {true: index 2, false: stop}, Say]
    let scene = ActionList::new(
        "gate",
        vec![
            say("Guard", "You are seen."),
            Action::new(ActionKind::Check {
                variable: "a".to_string(),
                comparison: Comparison::Equal,
                value: Arg::literal(1),
                on_true: ActionEnd::Skip { index: 2 },
                on_false: ActionEnd::Stop,
            }),
            say("Guard", "Come in."),
        ],
    );

    let mut engine = Engine::new();
    engine.set_var("a", "1");
    engine.start(scene).unwrap();
    let report = engine.tick(0.0);

    assert_eq!(said(&report.directives), vec!["You are seen.", "Come in."]);
    assert!(!engine.are_lists_running());
}

#[test]
fn check_false_socket_stops_the_list() {
    let scene = ActionList::new(
        "gate",
        vec![
            say("Guard", "You are seen."),
            Action::new(ActionKind::Check {
                variable: "a".to_string(),
                comparison: Comparison::Equal,
                value: Arg::literal(1),
                on_true: ActionEnd::Skip { index: 2 },
                on_false: ActionEnd::Stop,
            }),
            say("Guard", "Come in."),
        ],
    );

    let mut engine = Engine::new();
    engine.set_var("a", "0");
    engine.start(scene).unwrap();
    let report = engine.tick(0.0);

    assert_eq!(said(&report.directives), vec!["You are seen."]);
    assert!(!engine.are_lists_running());
}

#[test]
fn scripts_hand_off_between_assets() {
    let mut engine = Engine::new();
    engine
        .register_script(
            r#"
# Finale
[SAY speaker=Narrator]
And so it ended.
"#,
        )
        .unwrap();
    engine
        .register_script(
            r#"
# Opening
[SAY speaker=Narrator]
It began at dusk.
[RUN asset=finale]
"#,
        )
        .unwrap();

    engine.start_asset("opening").unwrap();
    let report = engine.tick(0.0);

    assert_eq!(
        said(&report.directives),
        vec!["It began at dusk.", "And so it ended."]
    );
    assert!(!engine.are_lists_running());
}

#[test]
fn trigger_time_delays_the_first_action() {
    let mut engine = Engine::new();
    engine
        .register_script(
            r#"
# Delayed
[CUTSCENE trigger=2.0]
[SAY speaker=A]
finally
"#,
        )
        .unwrap();
    engine.start_asset("delayed").unwrap();

    let report = engine.tick(1.0);
    assert!(report.directives.is_empty());
    // Queued lists already count as blocking cutscenes
    assert_eq!(report.state, GameState::Cutscene);

    let report = engine.tick(1.0);
    assert_eq!(said(&report.directives), vec!["finally"]);
}

#[test]
fn dispatch_params_override_asset_defaults() {
    let mut engine = Engine::new();
    engine
        .register_script(
            r#"
# Greeting
[PARAM name=hero value=Someone]
[SAY speaker=$hero]
I have arrived.
"#,
        )
        .unwrap();

    let mut overrides = ParamSet::new();
    overrides.insert("hero".to_string(), VarValue::from("Mira"));
    engine
        .start_asset_with_params("greeting", overrides)
        .unwrap();
    let report = engine.tick(0.0);

    assert_eq!(
        report.directives,
        vec![Directive::Say {
            speaker: "Mira".to_string(),
            text: "I have arrived.".to_string(),
        }]
    );
}

#[test]
fn background_scripts_leave_gameplay_unblocked() {
    let mut engine = Engine::new();
    engine
        .register_script(
            r#"
# Ambience
[CUTSCENE type=background]
[PLAY_MUSIC name=wind]
[WAIT 300s]
[PLAY_MUSIC name=rain]
"#,
        )
        .unwrap();
    engine.start_asset("ambience").unwrap();

    let report = engine.tick(0.0);
    assert_eq!(report.state, GameState::Normal);
    assert!(!engine.is_gameplay_blocked());
    assert!(engine.is_list_running("ambience"));

    // A global skip leaves background lists untouched
    let skipped = engine.skip_all();
    assert!(skipped.is_empty());
    assert!(engine.is_list_running("ambience"));
}

#[test]
fn parallel_script_continuations_all_play() {
    let mut engine = Engine::new();
    engine
        .register_script(
            r#"
# Ambush
[PARALLEL sockets=continue|shout]
[SAY speaker=Left end=stop]
From the left!
[LABEL name=shout]
[SAY speaker=Right]
From the right!
"#,
        )
        .unwrap();
    engine.start_asset("ambush").unwrap();
    let report = engine.tick(0.0);

    let mut lines = said(&report.directives);
    lines.sort();
    assert_eq!(lines, vec!["From the left!", "From the right!"]);
    assert!(!engine.are_lists_running());
}

#[test]
fn starting_an_unknown_asset_is_an_error() {
    let mut engine = Engine::new();
    assert!(engine.start_asset("ghost").is_err());
}

#[test]
fn invalid_lists_are_rejected_at_start() {
    let broken = ActionList::new(
        "broken",
        vec![Action::new(ActionKind::Parallel { sockets: vec![] })],
    );
    let mut engine = Engine::new();
    assert!(engine.start(broken).is_err());
}

#[test]
fn single_socket_actions_never_jump_to_an_index() {
    // Witness: the single-socket policy type widens only into
    // continue/stop/run-list outcomes.
    let policies = [
        EndPolicy::Continue,
        EndPolicy::Stop,
        EndPolicy::RunList {
            asset: "x".to_string(),
        },
    ];
    for policy in policies {
        let action = Action::with_end(
            ActionKind::Wait { seconds: 0.0 },
            policy,
        );
        assert_eq!(action.socket_count(), 1);
    }
    let branch = Action::new(ActionKind::Check {
        variable: "v".to_string(),
        comparison: Comparison::Equal,
        value: Arg::literal(1),
        on_true: ActionEnd::Skip { index: 0 },
        on_false: ActionEnd::Continue,
    });
    assert_eq!(branch.socket_count(), 2);
}

#[test]
fn snapshot_round_trips_through_storage() {
    let mut engine = Engine::new();
    engine.set_var("chapter", "3");
    engine.tick(1.5);

    let bytes = maku::save(&engine.snapshot()).unwrap();
    let snapshot = maku::load(&bytes).unwrap();

    let mut restored = Engine::new();
    restored.restore(snapshot);
    assert_eq!(restored.get_var("chapter").as_deref(), Some("3"));
    assert_eq!(restored.clock(), engine.clock());
}

#[test]
fn conversation_interrupt_and_resume_via_engine() {
    let talk = ActionList::new(
        "talk",
        vec![
            say("Merchant", "Welcome."),
            Action::new(ActionKind::Wait { seconds: 5.0 }),
            say("Merchant", "Anything else?"),
        ],
    );
    let mut engine = Engine::new();
    engine.start(talk).unwrap();
    engine.tick(0.0);

    engine.override_conversation("merchant_options", "talk", 2);
    engine.end_list("talk");
    assert_eq!(engine.game_state(), GameState::DialogOptions);
    assert_eq!(engine.active_conversation(), Some("merchant_options"));

    engine.resume_conversation();
    let report = engine.tick(0.0);
    assert_eq!(said(&report.directives), vec!["Anything else?"]);
    assert!(!engine.are_lists_running());
}

#[test]
fn background_type_wins_over_skippable_flag() {
    let mut ambient = ActionList::new(
        "ambient",
        vec![Action::new(ActionKind::Wait { seconds: 100.0 })],
    );
    ambient.list_type = ListType::Background;
    ambient.skippable = true;
    assert!(!ambient.is_skippable());
}
