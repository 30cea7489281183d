//! List manager - registry of running lists and derived global state
//!
//! The manager owns every active [`Runner`], recomputes the global
//! [`GameState`] from their aggregate, and carries the machinery behind the
//! user-facing "skip the whole cutscene" operation: the skip queue, the
//! forced end of stragglers, and the deterministic replay.

use serde::{Deserialize, Serialize};

use crate::runtime::runner::{Runner, RunnerSignal};
use crate::runtime::skip::SkipEntry;
use crate::runtime::EngineCtx;
use crate::types::action::RunContext;
use crate::types::directive::Directive;
use crate::types::list::{ActionList, ListSource, ListType};

/// Hand-off chains deeper than this are dropped with a warning.
const HANDOFF_BUDGET: usize = 64;
/// Rounds a skip replay may take before remaining lists are force-ended.
const SKIP_ROUNDS_BUDGET: usize = 1024;

/// Global mode derived from the set of active lists; never stored, never set
/// directly by a single list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Normal,
    Cutscene,
    Paused,
    DialogOptions,
}

/// Resume record for an interrupted conversation list.
#[derive(Debug, Clone)]
pub struct ConversationPoint {
    conversation: String,
    list_id: String,
    resume_index: usize,
    list: ActionList,
}

impl ConversationPoint {
    pub fn conversation(&self) -> &str {
        &self.conversation
    }

    pub fn list_id(&self) -> &str {
        &self.list_id
    }

    pub fn resume_index(&self) -> usize {
        self.resume_index
    }
}

#[derive(Debug)]
struct RunningList {
    runner: Runner,
    in_skip_queue: bool,
}

struct Handoff {
    asset: String,
    skip: bool,
    parent_in_queue: bool,
}

/// Tracks all concurrently running lists.
#[derive(Debug, Default)]
pub struct ListManager {
    running: Vec<RunningList>,
    skip_queue: Vec<SkipEntry>,
    player_at_skip_start: Option<String>,
    conversation_override: Option<ConversationPoint>,
    active_conversation: Option<String>,
    pending_autosave: bool,
    cutscene_forced: bool,
}

impl ListManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly started list. Any in-flight run of the same id is
    /// reset first. Skippable lists join the skip queue when asked to; the
    /// first queued entry of a skip cycle records the active player for
    /// restoration at skip time.
    pub fn add_list(
        &mut self,
        list: ActionList,
        add_to_skip_queue: bool,
        start_index: usize,
        ctx: &mut EngineCtx<'_>,
    ) {
        if start_index > 0 && start_index >= list.len() {
            log::warn!(
                "list '{}' started at index {start_index} past its end, it will finish immediately",
                list.id
            );
        }
        self.remove_running(&list.id);
        let in_skip_queue = add_to_skip_queue && list.is_skippable();
        if in_skip_queue {
            if self.skip_queue.is_empty() {
                self.player_at_skip_start = ctx.hooks.active_player();
            }
            self.push_queue_entry(SkipEntry::capture(&list, start_index));
        }
        let mut runner = Runner::new(list);
        runner.interact(start_index, ctx.now);
        self.running.push(RunningList {
            runner,
            in_skip_queue,
        });
    }

    /// Drive every runner one tick, chase hand-offs, process endings, and
    /// clear the skip queue once gameplay has caught up.
    pub fn tick(&mut self, ctx: &mut EngineCtx<'_>) {
        let mut pending = Vec::new();
        for entry in &mut self.running {
            let signals = {
                let mut rctx = RunContext {
                    now: ctx.now,
                    vars: &mut *ctx.vars,
                    out: &mut *ctx.out,
                };
                entry.runner.tick(&mut rctx)
            };
            collect_handoffs(signals, entry.in_skip_queue, &mut pending);
        }
        self.drain_ended(ctx);
        self.chase_handoffs(pending, ctx);

        if !self.is_gameplay_blocked() {
            self.skip_queue.clear();
            self.player_at_skip_start = None;
            if self.pending_autosave {
                ctx.out.push(Directive::Autosave);
                self.pending_autosave = false;
            }
        }
    }

    /// Force-end one list, with the normal end-of-list transitions.
    pub fn end_list(&mut self, id: &str, ctx: &mut EngineCtx<'_>) {
        let Some(pos) = self.running.iter().position(|e| e.runner.id() == id) else {
            log::warn!("end_list: '{id}' is not running");
            return;
        };
        let mut entry = self.running.swap_remove(pos);
        entry.runner.kill();
        self.finish_list(entry, ctx);
    }

    /// The user-facing "skip everything" operation.
    ///
    /// Stops ambient audio, force-ends every active skippable list (queued
    /// ones donate their branch caches to their replay entries first),
    /// restores the player recorded at skip-cycle start, then replays each
    /// queue entry in skip mode to completion within this call.
    pub fn end_cutscene(&mut self, ctx: &mut EngineCtx<'_>) {
        let any_skippable = self
            .running
            .iter()
            .any(|e| e.runner.list().is_skippable());
        if self.skip_queue.is_empty() && !any_skippable {
            return;
        }
        ctx.hooks.stop_ambient_audio();

        let mut idx = 0;
        while idx < self.running.len() {
            if self.running[idx].runner.list().is_skippable() {
                let mut entry = self.running.swap_remove(idx);
                if entry.in_skip_queue {
                    let list = entry.runner.list();
                    if let Some(queued) = self
                        .skip_queue
                        .iter_mut()
                        .find(|q| q.list_id() == list.id)
                    {
                        queued.sync(list);
                    }
                }
                // Bypasses finish_list: state must not shift mid-skip
                entry.runner.kill();
            } else {
                idx += 1;
            }
        }

        if let Some(player) = self.player_at_skip_start.take() {
            ctx.hooks.restore_player(&player);
        }

        for entry in std::mem::take(&mut self.skip_queue) {
            log::debug!(
                "skip replay of '{}' from index {}",
                entry.asset_id().unwrap_or_else(|| entry.list_id()),
                entry.start_index()
            );
            self.remove_running(entry.list_id());
            let runner = entry.skip_runner(ctx.now);
            self.running.push(RunningList {
                runner,
                in_skip_queue: false,
            });
        }

        // Skipped actions are instantaneous; only deferred self-jumps take
        // extra rounds.
        let mut rounds = 0usize;
        while self
            .running
            .iter()
            .any(|e| e.runner.is_skipping() && !e.runner.has_ended())
        {
            rounds += 1;
            if rounds > SKIP_ROUNDS_BUDGET {
                log::warn!("skip replay did not settle, force-ending the remainder");
                for entry in &mut self.running {
                    if entry.runner.is_skipping() {
                        entry.runner.kill();
                    }
                }
                self.drain_ended(ctx);
                break;
            }
            let mut pending = Vec::new();
            for entry in &mut self.running {
                if !entry.runner.is_skipping() || entry.runner.has_ended() {
                    continue;
                }
                let signals = {
                    let mut rctx = RunContext {
                        now: ctx.now,
                        vars: &mut *ctx.vars,
                        out: &mut *ctx.out,
                    };
                    entry.runner.tick(&mut rctx)
                };
                collect_handoffs(signals, entry.in_skip_queue, &mut pending);
            }
            self.drain_ended(ctx);
            self.chase_handoffs(pending, ctx);
        }
    }

    /// Store a resume record for an in-progress conversation list so it can
    /// be picked up again at the exact interruption point.
    pub fn override_conversation(
        &mut self,
        conversation: impl Into<String>,
        list_id: &str,
        resume_index: usize,
    ) {
        let Some(entry) = self.running.iter().find(|e| e.runner.id() == list_id) else {
            log::warn!("conversation override targets '{list_id}', which is not running");
            return;
        };
        let mut list = entry.runner.list().clone();
        list.reset();
        self.conversation_override = Some(ConversationPoint {
            conversation: conversation.into(),
            list_id: list_id.to_string(),
            resume_index,
            list,
        });
    }

    pub fn conversation_point(&self) -> Option<&ConversationPoint> {
        self.conversation_override.as_ref()
    }

    /// Restart the overridden list from its recorded index and leave the
    /// DialogOptions state.
    pub fn resume_conversation(&mut self, ctx: &mut EngineCtx<'_>) {
        let Some(point) = self.conversation_override.take() else {
            log::warn!("no conversation point to resume");
            return;
        };
        self.active_conversation = None;
        self.remove_running(&point.list_id);
        let mut runner = Runner::new(point.list);
        runner.interact(point.resume_index, ctx.now);
        self.running.push(RunningList {
            runner,
            in_skip_queue: false,
        });
    }

    /// The host closed the options screen without resuming.
    pub fn end_conversation(&mut self) {
        self.active_conversation = None;
        self.conversation_override = None;
    }

    /// Hard cutscene flag, independent of any list (scene transitions etc.)
    pub fn set_cutscene_forced(&mut self, forced: bool) {
        self.cutscene_forced = forced;
    }

    /// Derive the global state from the registry and the host. Recomputed
    /// from scratch on every query; order: a pausing menu wins, then an open
    /// conversation, then any blocking list.
    pub fn game_state(&self, hooks: &dyn crate::hooks::HostHooks) -> GameState {
        if hooks.menu_pausing_open() {
            GameState::Paused
        } else if self.active_conversation.is_some() {
            GameState::DialogOptions
        } else if self.cutscene_forced || self.any_blocking_active() {
            GameState::Cutscene
        } else {
            GameState::Normal
        }
    }

    /// Gate for input, movement and menus elsewhere in a host.
    pub fn is_gameplay_blocked(&self) -> bool {
        self.cutscene_forced || self.active_conversation.is_some() || self.any_blocking_active()
    }

    pub fn is_list_running(&self, id: &str) -> bool {
        self.running
            .iter()
            .any(|e| e.runner.id() == id && !e.runner.has_ended())
    }

    pub fn are_lists_running(&self) -> bool {
        self.running.iter().any(|e| !e.runner.has_ended())
    }

    pub fn skip_queue_len(&self) -> usize {
        self.skip_queue.len()
    }

    pub fn active_conversation(&self) -> Option<&str> {
        self.active_conversation.as_deref()
    }

    /// Synchronously cancel everything (scene teardown).
    pub fn kill_all(&mut self) {
        for entry in &mut self.running {
            entry.runner.kill();
        }
        self.running.clear();
        self.skip_queue.clear();
        self.player_at_skip_start = None;
        self.conversation_override = None;
        self.active_conversation = None;
        self.pending_autosave = false;
    }

    fn any_blocking_active(&self) -> bool {
        self.running.iter().any(|e| {
            e.runner.list().list_type == ListType::Blocking && !e.runner.has_ended()
        })
    }

    fn remove_running(&mut self, id: &str) {
        if let Some(pos) = self.running.iter().position(|e| e.runner.id() == id) {
            let mut entry = self.running.swap_remove(pos);
            entry.runner.kill();
        }
    }

    fn push_queue_entry(&mut self, entry: SkipEntry) {
        self.skip_queue.retain(|e| e.list_id() != entry.list_id());
        self.skip_queue.push(entry);
    }

    fn drain_ended(&mut self, ctx: &mut EngineCtx<'_>) {
        let mut idx = 0;
        while idx < self.running.len() {
            if self.running[idx].runner.has_ended() {
                let entry = self.running.swap_remove(idx);
                self.finish_list(entry, ctx);
            } else {
                idx += 1;
            }
        }
    }

    /// Normal end-of-list transitions: cache hand-over to the skip queue,
    /// conversation hand-off, and the (possibly deferred) autosave.
    fn finish_list(&mut self, entry: RunningList, ctx: &mut EngineCtx<'_>) {
        let list = entry.runner.list();
        let list_id = list.id.clone();
        let autosave_requested = list.autosave_after;

        if let Some(queued) = self.skip_queue.iter_mut().find(|q| q.list_id() == list_id) {
            queued.sync(list);
        }

        if let Some(point) = &self.conversation_override {
            if point.list_id == list_id {
                let conversation = point.conversation.clone();
                self.active_conversation = Some(conversation.clone());
                ctx.out.push(Directive::BeginOptions { conversation });
            }
        }

        drop(entry);

        if autosave_requested {
            if self.is_gameplay_blocked() {
                self.pending_autosave = true;
            } else {
                ctx.out.push(Directive::Autosave);
            }
        }
    }

    fn chase_handoffs(&mut self, mut pending: Vec<Handoff>, ctx: &mut EngineCtx<'_>) {
        let mut hops = 0usize;
        while let Some(handoff) = pending.pop() {
            hops += 1;
            if hops > HANDOFF_BUDGET {
                log::warn!("hand-off chain exceeded {HANDOFF_BUDGET} lists, dropping the rest");
                break;
            }
            let more = self.start_handoff(&handoff, ctx);
            pending.extend(more);
            self.drain_ended(ctx);
        }
    }

    fn start_handoff(&mut self, handoff: &Handoff, ctx: &mut EngineCtx<'_>) -> Vec<Handoff> {
        let Some(template) = ctx.assets.get(&handoff.asset) else {
            log::warn!(
                "hand-off target asset '{}' is not registered, ignoring",
                handoff.asset
            );
            return Vec::new();
        };
        let mut list = template.clone();
        list.source = ListSource::Asset {
            id: handoff.asset.clone(),
        };
        if handoff.skip && list.list_type == ListType::Blocking {
            // Invoked lists inherit the caller's skippability
            list.skippable = true;
        }
        self.remove_running(&list.id);
        let in_skip_queue = handoff.parent_in_queue && list.is_skippable();
        if in_skip_queue {
            if self.skip_queue.is_empty() {
                self.player_at_skip_start = ctx.hooks.active_player();
            }
            self.push_queue_entry(SkipEntry::capture(&list, 0));
        }
        let mut runner = Runner::new(list);
        if handoff.skip {
            runner.skip_from(0, ctx.now);
        } else {
            runner.interact(0, ctx.now);
        }
        // One immediate tick so chained hand-offs resolve within the frame
        let signals = {
            let mut rctx = RunContext {
                now: ctx.now,
                vars: &mut *ctx.vars,
                out: &mut *ctx.out,
            };
            runner.tick(&mut rctx)
        };
        let mut produced = Vec::new();
        collect_handoffs(signals, in_skip_queue, &mut produced);
        self.running.push(RunningList {
            runner,
            in_skip_queue,
        });
        produced
    }
}

fn collect_handoffs(signals: Vec<RunnerSignal>, parent_in_queue: bool, out: &mut Vec<Handoff>) {
    for signal in signals {
        match signal {
            RunnerSignal::Handoff { asset, skip } => out.push(Handoff {
                asset,
                skip,
                parent_in_queue,
            }),
        }
    }
}
