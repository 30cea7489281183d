//! Host hook integration: pause query, player restoration, audio stop

use std::cell::RefCell;
use std::rc::Rc;

use maku::{Action, ActionKind, ActionList, Arg, Engine, GameState, HostHooks};

#[derive(Default)]
struct HostLog {
    paused: bool,
    player: Option<String>,
    events: Vec<String>,
}

struct RecordingHooks {
    log: Rc<RefCell<HostLog>>,
}

impl HostHooks for RecordingHooks {
    fn menu_pausing_open(&self) -> bool {
        self.log.borrow().paused
    }

    fn active_player(&self) -> Option<String> {
        self.log.borrow().player.clone()
    }

    fn restore_player(&mut self, player: &str) {
        self.log
            .borrow_mut()
            .events
            .push(format!("restore:{player}"));
    }

    fn stop_ambient_audio(&mut self) {
        self.log.borrow_mut().events.push("stop_audio".to_string());
    }
}

fn engine_with_log() -> (Engine, Rc<RefCell<HostLog>>) {
    let log = Rc::new(RefCell::new(HostLog::default()));
    let engine = Engine::with_hooks(Box::new(RecordingHooks { log: log.clone() }));
    (engine, log)
}

fn slow_scene(name: &str) -> ActionList {
    ActionList::new(
        name,
        vec![
            Action::new(ActionKind::Say {
                speaker: Arg::literal("A"),
                text: Arg::literal("..."),
                seconds: 0.0,
            }),
            Action::new(ActionKind::Wait { seconds: 60.0 }),
        ],
    )
}

#[test]
fn pausing_menu_wins_the_state_derivation() {
    let (mut engine, log) = engine_with_log();
    engine.start(slow_scene("scene")).unwrap();
    engine.tick(0.0);
    assert_eq!(engine.game_state(), GameState::Cutscene);

    log.borrow_mut().paused = true;
    assert_eq!(engine.game_state(), GameState::Paused);

    log.borrow_mut().paused = false;
    assert_eq!(engine.game_state(), GameState::Cutscene);
}

#[test]
fn skip_stops_audio_and_restores_the_recorded_player() {
    let (mut engine, log) = engine_with_log();
    log.borrow_mut().player = Some("manny".to_string());

    engine.start(slow_scene("scene")).unwrap();
    engine.tick(0.0);

    // The player changes mid-cutscene; the skip restores the one recorded
    // when the skip cycle began.
    log.borrow_mut().player = Some("glottis".to_string());
    engine.skip_all();

    let events = log.borrow().events.clone();
    assert_eq!(events, vec!["stop_audio", "restore:manny"]);
}

#[test]
fn no_player_record_means_no_restore() {
    let (mut engine, log) = engine_with_log();
    engine.start(slow_scene("scene")).unwrap();
    engine.tick(0.0);
    engine.skip_all();

    let events = log.borrow().events.clone();
    assert_eq!(events, vec!["stop_audio"]);
}
