//! Per-list cooperative scheduler
//!
//! A [`Runner`] drives the cursors of one [`ActionList`] forward each tick.
//! Suspension happens at exactly three points: the trigger-time delay before
//! the first action, a timed re-poll while an action reports itself still
//! running, and a one-tick deferral when a branch socket targets its own
//! action.

use crate::types::action::{ActionEnd, RunContext, RunProgress};
use crate::types::list::ActionList;

/// Upper bound on instantaneous steps one cursor may take per tick. A cycle
/// of zero-length actions is cut here with a warning and resumes next tick.
const STEP_BUDGET: usize = 1024;

/// Lifecycle of a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerPhase {
    Idle,
    /// Trigger-time delay pending
    Queued,
    Running,
    /// At least one cursor is suspended on a timed re-poll
    WaitingOnAction,
    Ended,
}

/// Control-transfer requests surfaced to the list manager.
#[derive(Debug, Clone, PartialEq)]
pub enum RunnerSignal {
    /// Hand control to another list asset; this runner has finalized
    Handoff { asset: String, skip: bool },
}

#[derive(Debug, Clone)]
struct Cursor {
    index: usize,
    /// Deadline of the current timed re-poll
    poll_at: Option<f64>,
    /// Jump applied at the start of the next tick (self-jump deferral)
    deferred: Option<usize>,
    ended: bool,
}

impl Cursor {
    fn at(index: usize) -> Self {
        Self {
            index,
            poll_at: None,
            deferred: None,
            ended: false,
        }
    }
}

/// Executes one list; owned and driven by the manager.
#[derive(Debug)]
pub struct Runner {
    list: ActionList,
    cursors: Vec<Cursor>,
    queued_until: Option<f64>,
    queued_start: usize,
    skip_mode: bool,
    started: bool,
    ended: bool,
}

enum StepResult {
    Waiting(f64),
    Ends(Vec<ActionEnd>),
}

impl Runner {
    pub fn new(list: ActionList) -> Self {
        Self {
            list,
            cursors: Vec::new(),
            queued_until: None,
            queued_start: 0,
            skip_mode: false,
            started: false,
            ended: false,
        }
    }

    pub fn list(&self) -> &ActionList {
        &self.list
    }

    pub fn into_list(self) -> ActionList {
        self.list
    }

    pub fn id(&self) -> &str {
        &self.list.id
    }

    pub fn is_skipping(&self) -> bool {
        self.skip_mode
    }

    pub fn has_ended(&self) -> bool {
        self.ended
    }

    pub fn phase(&self) -> RunnerPhase {
        if self.ended {
            RunnerPhase::Ended
        } else if self.queued_until.is_some() {
            RunnerPhase::Queued
        } else if !self.started {
            RunnerPhase::Idle
        } else if self
            .cursors
            .iter()
            .any(|c| !c.ended && c.poll_at.is_some())
        {
            RunnerPhase::WaitingOnAction
        } else {
            RunnerPhase::Running
        }
    }

    /// Begin (or restart) a normal run. Starting a new run resets any
    /// in-flight one first. A trigger-time delay only applies when starting
    /// from index 0.
    pub fn interact(&mut self, start_index: usize, now: f64) {
        self.list.reset();
        self.cursors.clear();
        self.skip_mode = false;
        self.ended = false;
        self.started = true;
        if self.list.trigger_time > 0.0 && start_index == 0 {
            self.queued_until = Some(now + f64::from(self.list.trigger_time));
            self.queued_start = 0;
        } else {
            self.queued_until = None;
            self.cursors.push(Cursor::at(start_index));
        }
    }

    /// Restart in skip mode from `index`. Lists that cannot be skipped run
    /// normally instead; a runner already mid-skip is left alone.
    pub fn skip_from(&mut self, index: usize, now: f64) {
        if !self.list.is_skippable() {
            self.interact(index, now);
            return;
        }
        if self.skip_mode && self.started && !self.ended {
            return;
        }
        self.list.reset();
        self.cursors.clear();
        self.queued_until = None;
        self.skip_mode = true;
        self.started = true;
        self.ended = false;
        self.cursors.push(Cursor::at(index));
    }

    /// Synchronous cancellation: clears running flags and pending waits.
    /// Any further tick is a no-op.
    pub fn kill(&mut self) {
        self.list.reset();
        self.cursors.clear();
        self.queued_until = None;
        self.ended = true;
    }

    /// Advance every cursor as far as it can go this tick.
    pub fn tick(&mut self, ctx: &mut RunContext<'_>) -> Vec<RunnerSignal> {
        let mut signals = Vec::new();
        if self.ended {
            return signals;
        }
        if let Some(at) = self.queued_until {
            if ctx.now < at {
                return signals;
            }
            self.queued_until = None;
            let start = self.queued_start;
            self.cursors.push(Cursor::at(start));
        }
        if !self.started {
            return signals;
        }

        // Deferred jumps recorded last tick become live now.
        for cursor in &mut self.cursors {
            if let Some(target) = cursor.deferred.take() {
                cursor.index = target;
            }
        }

        let mut i = 0;
        while i < self.cursors.len() {
            if self.cursors[i].ended || self.cursors[i].deferred.is_some() {
                i += 1;
                continue;
            }
            let mut steps = 0usize;
            loop {
                let index = self.cursors[i].index;
                if index >= self.list.actions.len() {
                    // 末尾まで来たら通常終了
                    self.cursors[i].ended = true;
                    break;
                }
                if let Some(at) = self.cursors[i].poll_at {
                    if ctx.now < at {
                        break;
                    }
                }
                if !self.list.actions[index].enabled {
                    self.cursors[i].index += 1;
                    steps += 1;
                    if steps > STEP_BUDGET {
                        log::warn!("list '{}' exceeded its step budget, deferring", self.list.id);
                        break;
                    }
                    continue;
                }

                let step = {
                    let ActionList { actions, params, .. } = &mut self.list;
                    let action = &mut actions[index];
                    if self.skip_mode {
                        action.skip(ctx, params);
                        StepResult::Ends(action.end_results())
                    } else {
                        match action.run(ctx, params) {
                            RunProgress::Wait { seconds } => {
                                StepResult::Waiting(ctx.now + f64::from(seconds))
                            }
                            RunProgress::Done => StepResult::Ends(action.end_results()),
                        }
                    }
                };

                match step {
                    StepResult::Waiting(at) => {
                        self.cursors[i].poll_at = Some(at);
                        break;
                    }
                    StepResult::Ends(ends) => {
                        self.cursors[i].poll_at = None;
                        let mut ends = ends.into_iter();
                        let primary = ends.next().unwrap_or(ActionEnd::Continue);

                        // Extra outcomes fan out as parallel continuations.
                        for extra in ends {
                            match extra {
                                ActionEnd::Continue => {
                                    self.cursors.push(Cursor::at(index + 1));
                                }
                                ActionEnd::Stop => {}
                                ActionEnd::Skip { index: target } => {
                                    let mut cursor = Cursor::at(target);
                                    if target == index {
                                        cursor.deferred = Some(target);
                                    }
                                    self.cursors.push(cursor);
                                }
                                ActionEnd::RunList { asset } => {
                                    signals.push(RunnerSignal::Handoff {
                                        asset,
                                        skip: self.skip_mode,
                                    });
                                    self.finalize();
                                    return signals;
                                }
                            }
                        }

                        match primary {
                            ActionEnd::Continue => {
                                self.cursors[i].index = index + 1;
                            }
                            ActionEnd::Stop => {
                                self.cursors[i].ended = true;
                                break;
                            }
                            ActionEnd::Skip { index: target } => {
                                if target == index {
                                    // Self-jump: defer one tick instead of
                                    // recursing synchronously
                                    self.cursors[i].deferred = Some(target);
                                    break;
                                }
                                self.cursors[i].index = target;
                            }
                            ActionEnd::RunList { asset } => {
                                signals.push(RunnerSignal::Handoff {
                                    asset,
                                    skip: self.skip_mode,
                                });
                                self.finalize();
                                return signals;
                            }
                        }

                        steps += 1;
                        if steps > STEP_BUDGET {
                            log::warn!(
                                "list '{}' exceeded its step budget, deferring",
                                self.list.id
                            );
                            break;
                        }
                    }
                }
            }
            i += 1;
        }

        if self.queued_until.is_none() && self.cursors.iter().all(|c| c.ended) {
            self.ended = true;
        }
        signals
    }

    /// A hand-off finalizes the whole list: every continuation stops.
    fn finalize(&mut self) {
        for cursor in &mut self.cursors {
            cursor.ended = true;
        }
        self.list.reset();
        self.ended = true;
    }
}
