//! Actions - the executable steps of a cutscene list
//!
//! Each action is a tagged variant with a run/skip contract: `run` may
//! complete instantly or ask to be re-polled after a wait, `skip` applies the
//! action's end state immediately, and end-processing yields the outcome that
//! decides where the cursor goes next.

use serde::{Deserialize, Serialize};

use crate::types::directive::Directive;
use crate::types::value::{Arg, Comparison, NumericOp, ParamSet, VarStore, VarValue};

/// After-run policy of a single-socket action.
///
/// Arbitrary jump-to-index outcomes deliberately have no representation
/// here; they can only originate from branch sockets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EndPolicy {
    /// Advance to the next action
    Continue,
    /// Finalize the list
    Stop,
    /// Hand control to another list asset and finalize this one
    RunList { asset: String },
}

impl EndPolicy {
    /// Widen into the full outcome type shared with branch sockets.
    pub fn widen(&self) -> ActionEnd {
        match self {
            EndPolicy::Continue => ActionEnd::Continue,
            EndPolicy::Stop => ActionEnd::Stop,
            EndPolicy::RunList { asset } => ActionEnd::RunList {
                asset: asset.clone(),
            },
        }
    }
}

/// The outcome of a finished action: where the cursor goes next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionEnd {
    Continue,
    Stop,
    /// Jump to an explicit action index (branch sockets only)
    Skip { index: usize },
    RunList { asset: String },
}

/// Exhaustive set of action variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Spoken dialogue; `seconds > 0` keeps the action running for that long
    Say { speaker: Arg, text: Arg, seconds: f32 },
    /// One-shot sound effect
    PlaySound { name: String },
    /// Looping background music
    PlayMusic { name: String },
    /// Timed pause
    Wait { seconds: f32 },
    /// Write a variable
    SetVar { name: String, value: Arg },
    /// Arithmetic on an integer variable
    ModifyVar { name: String, op: NumericOp, value: Arg },
    /// Invoke another list asset; the spawned list inherits the caller's
    /// skip state
    RunList { asset: String },
    /// Two-socket branch on a variable comparison
    Check {
        variable: String,
        comparison: Comparison,
        value: Arg,
        on_true: ActionEnd,
        on_false: ActionEnd,
    },
    /// N-socket branch selected by an integer variable
    CheckMultiple { variable: String, sockets: Vec<ActionEnd> },
    /// Fires every socket at once, spawning parallel continuation points
    Parallel { sockets: Vec<ActionEnd> },
}

/// Progress reported by [`Action::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunProgress {
    /// The action finished; proceed to end-processing
    Done,
    /// Still running; re-poll after this many seconds
    Wait { seconds: f32 },
}

/// Mutable state an action sees while executing.
pub struct RunContext<'a> {
    /// Engine clock, in seconds
    pub now: f64,
    pub vars: &'a mut VarStore,
    pub out: &'a mut Vec<Directive>,
}

/// One executable step of an [`crate::types::list::ActionList`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Disabled actions are stepped over without running
    pub enabled: bool,
    /// After-run policy; ignored by branch kinds and `RunList`, which derive
    /// their outcome from the variant data
    pub end: EndPolicy,
    pub kind: ActionKind,
    #[serde(skip)]
    running: bool,
    #[serde(skip)]
    until: Option<f64>,
    #[serde(skip)]
    last_result: Option<ActionEnd>,
}

impl Action {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            enabled: true,
            end: EndPolicy::Continue,
            kind,
            running: false,
            until: None,
            last_result: None,
        }
    }

    pub fn with_end(kind: ActionKind, end: EndPolicy) -> Self {
        Self {
            end,
            ..Self::new(kind)
        }
    }

    /// Number of outgoing sockets (1 except for branch kinds).
    pub fn socket_count(&self) -> usize {
        match &self.kind {
            ActionKind::Check { .. } => 2,
            ActionKind::CheckMultiple { sockets, .. } | ActionKind::Parallel { sockets } => {
                sockets.len()
            }
            _ => 1,
        }
    }

    /// Branch kinds cache their chosen outcome for deterministic skip replay.
    pub fn is_branch(&self) -> bool {
        matches!(
            self.kind,
            ActionKind::Check { .. } | ActionKind::CheckMultiple { .. }
        )
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Cached outcome of the most recent branch evaluation, if any.
    pub fn last_result(&self) -> Option<&ActionEnd> {
        self.last_result.as_ref()
    }

    /// Clear transient run state. The branch cache survives so a later skip
    /// replay reuses the recorded path.
    pub(crate) fn reset(&mut self) {
        self.running = false;
        self.until = None;
    }

    /// Execute one poll of this action.
    pub(crate) fn run(&mut self, ctx: &mut RunContext<'_>, params: &ParamSet) -> RunProgress {
        match &self.kind {
            ActionKind::Say { speaker, text, seconds } => {
                let seconds = *seconds;
                if self.running {
                    // 再ポーリング：締め切りまで喋り続ける
                    let until = self.until.unwrap_or(ctx.now);
                    if ctx.now >= until {
                        self.running = false;
                        self.until = None;
                        RunProgress::Done
                    } else {
                        RunProgress::Wait {
                            seconds: (until - ctx.now).max(0.0) as f32,
                        }
                    }
                } else {
                    ctx.out.push(Directive::Say {
                        speaker: resolve_text(speaker, params, "speaker"),
                        text: resolve_text(text, params, "text"),
                    });
                    if seconds > 0.0 {
                        self.running = true;
                        self.until = Some(ctx.now + f64::from(seconds));
                        RunProgress::Wait { seconds }
                    } else {
                        RunProgress::Done
                    }
                }
            }
            ActionKind::PlaySound { name } => {
                ctx.out.push(Directive::PlaySound { name: name.clone() });
                RunProgress::Done
            }
            ActionKind::PlayMusic { name } => {
                ctx.out.push(Directive::PlayMusic { name: name.clone() });
                RunProgress::Done
            }
            ActionKind::Wait { seconds } => {
                let seconds = *seconds;
                if self.running {
                    let until = self.until.unwrap_or(ctx.now);
                    if ctx.now >= until {
                        self.running = false;
                        self.until = None;
                        RunProgress::Done
                    } else {
                        RunProgress::Wait {
                            seconds: (until - ctx.now).max(0.0) as f32,
                        }
                    }
                } else if seconds > 0.0 {
                    self.running = true;
                    self.until = Some(ctx.now + f64::from(seconds));
                    RunProgress::Wait { seconds }
                } else {
                    RunProgress::Done
                }
            }
            ActionKind::SetVar { name, value } => {
                apply_set(ctx.vars, name, value, params);
                RunProgress::Done
            }
            ActionKind::ModifyVar { name, op, value } => {
                apply_modify(ctx.vars, name, *op, value, params);
                RunProgress::Done
            }
            ActionKind::RunList { .. } => RunProgress::Done,
            ActionKind::Check { .. } | ActionKind::CheckMultiple { .. } => {
                let chosen = evaluate_branch(&self.kind, ctx.vars, params);
                self.last_result = Some(chosen);
                RunProgress::Done
            }
            ActionKind::Parallel { .. } => RunProgress::Done,
        }
    }

    /// Apply this action's end state instantly, bypassing timed waits.
    ///
    /// Dialogue and looping music still surface their directives (the host
    /// must land on the correct end state); one-shot sounds and pauses do
    /// not. Variable writes always apply. Branch kinds evaluate only when no
    /// cached outcome exists yet.
    pub(crate) fn skip(&mut self, ctx: &mut RunContext<'_>, params: &ParamSet) {
        self.running = false;
        self.until = None;
        match &self.kind {
            ActionKind::Say { speaker, text, .. } => {
                ctx.out.push(Directive::Say {
                    speaker: resolve_text(speaker, params, "speaker"),
                    text: resolve_text(text, params, "text"),
                });
            }
            ActionKind::PlaySound { .. } => {}
            ActionKind::PlayMusic { name } => {
                ctx.out.push(Directive::PlayMusic { name: name.clone() });
            }
            ActionKind::Wait { .. } => {}
            ActionKind::SetVar { name, value } => {
                apply_set(ctx.vars, name, value, params);
            }
            ActionKind::ModifyVar { name, op, value } => {
                apply_modify(ctx.vars, name, *op, value, params);
            }
            ActionKind::RunList { .. } => {}
            ActionKind::Check { .. } | ActionKind::CheckMultiple { .. } => {
                if self.last_result.is_none() {
                    let chosen = evaluate_branch(&self.kind, ctx.vars, params);
                    self.last_result = Some(chosen);
                }
            }
            ActionKind::Parallel { .. } => {}
        }
    }

    /// Outcomes produced by end-processing. A single entry for every kind
    /// except `Parallel`, which fans out all of its sockets at once.
    pub(crate) fn end_results(&self) -> Vec<ActionEnd> {
        match &self.kind {
            ActionKind::Parallel { sockets } => sockets.clone(),
            ActionKind::RunList { asset } => vec![ActionEnd::RunList {
                asset: asset.clone(),
            }],
            ActionKind::Check { .. } | ActionKind::CheckMultiple { .. } => {
                vec![self.last_result.clone().unwrap_or_else(|| {
                    log::warn!("branch action ended without an evaluated outcome");
                    ActionEnd::Continue
                })]
            }
            _ => vec![self.end.widen()],
        }
    }
}

fn resolve_text(arg: &Arg, params: &ParamSet, field: &str) -> String {
    match arg.resolve(params) {
        Some(value) => value.to_string(),
        None => {
            log::warn!("unresolved parameter binding for '{field}', using empty text");
            String::new()
        }
    }
}

fn apply_set(vars: &mut VarStore, name: &str, value: &Arg, params: &ParamSet) {
    match value.resolve(params) {
        Some(value) => {
            vars.insert(name.to_string(), value.clone());
        }
        None => log::warn!("unresolved parameter binding while setting '{name}'"),
    }
}

fn apply_modify(vars: &mut VarStore, name: &str, op: NumericOp, value: &Arg, params: &ParamSet) {
    let Some(delta) = value.resolve(params).and_then(VarValue::as_integer) else {
        log::warn!("modify of '{name}' needs an integer operand, skipping");
        return;
    };
    match vars.get_mut(name) {
        Some(VarValue::Integer(current)) => match op {
            NumericOp::Add => *current += delta,
            NumericOp::Subtract => *current -= delta,
        },
        Some(_) => log::warn!("variable '{name}' is not an integer, modify skipped"),
        None => log::warn!("variable '{name}' not found, modify skipped"),
    }
}

fn evaluate_branch(kind: &ActionKind, vars: &VarStore, params: &ParamSet) -> ActionEnd {
    match kind {
        ActionKind::Check {
            variable,
            comparison,
            value,
            on_true,
            on_false,
        } => {
            let matched = match (vars.get(variable), value.resolve(params)) {
                (Some(lhs), Some(rhs)) => comparison.evaluate(lhs, rhs),
                (None, _) => {
                    log::debug!("check variable '{variable}' not set, taking false socket");
                    false
                }
                (_, None) => {
                    log::warn!("unresolved comparison operand for '{variable}', taking false socket");
                    false
                }
            };
            if matched { on_true.clone() } else { on_false.clone() }
        }
        ActionKind::CheckMultiple { variable, sockets } => {
            let index = vars
                .get(variable)
                .and_then(VarValue::as_integer)
                .and_then(|i| usize::try_from(i).ok());
            match index {
                Some(i) if i < sockets.len() => sockets[i].clone(),
                _ => {
                    log::warn!("socket selector '{variable}' out of range, continuing");
                    ActionEnd::Continue
                }
            }
        }
        _ => ActionEnd::Continue,
    }
}
