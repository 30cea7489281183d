//! Host integration seams
//!
//! The engine consumes a few host services: the pause-menu query used for
//! game-state derivation, the player registry consulted around a global
//! skip, and the audio stop applied when a cutscene is fast-forwarded.
//! Hosts inject an implementation; every method has a no-op default.

pub trait HostHooks {
    /// Is a gameplay-pausing menu currently open?
    fn menu_pausing_open(&self) -> bool {
        false
    }

    /// Identifier of the currently active player character, if any.
    fn active_player(&self) -> Option<String> {
        None
    }

    /// Restore the player recorded at the start of a skip cycle.
    fn restore_player(&mut self, _player: &str) {}

    /// Stop non-looping audio before a global skip replays the queue.
    fn stop_ambient_audio(&mut self) {}
}

/// Default hooks for hosts that need none of the integration points.
#[derive(Debug, Default)]
pub struct NullHooks;

impl HostHooks for NullHooks {}
