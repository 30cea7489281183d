//! ActionList - an ordered, resumable sequence of actions

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::action::{Action, ActionEnd, ActionKind};
use crate::types::value::ParamSet;

/// Whether a running list blocks gameplay or stays in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListType {
    /// Blocks gameplay while running; contributes to the Cutscene state
    Blocking,
    /// Runs alongside gameplay; never blocks and never skips
    Background,
}

/// Where a list instance came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListSource {
    /// Constructed directly by the host
    Embedded,
    /// Instantiated from a registered asset
    Asset { id: String },
}

/// An ordered sequence of [`Action`]s plus its execution policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionList {
    pub id: String,
    pub name: String,
    pub actions: Vec<Action>,
    pub source: ListSource,
    /// Default parameter slots; overridable at dispatch
    pub params: ParamSet,
    pub skippable: bool,
    /// Start delay in seconds, applied when starting from index 0
    pub trigger_time: f32,
    pub list_type: ListType,
    /// Request an autosave once this list ends and gameplay is unblocked
    pub autosave_after: bool,
}

impl ActionList {
    /// A blocking, skippable, embedded list — the common case.
    pub fn new(name: impl Into<String>, actions: Vec<Action>) -> Self {
        let name = name.into();
        Self {
            id: slug(&name),
            name,
            actions,
            source: ListSource::Embedded,
            params: ParamSet::new(),
            skippable: true,
            trigger_time: 0.0,
            list_type: ListType::Blocking,
            autosave_after: false,
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Background lists can never be skipped, whatever their flag says.
    pub fn is_skippable(&self) -> bool {
        self.skippable && self.list_type == ListType::Blocking
    }

    /// Check every branch socket against the list bounds.
    pub fn validate(&self) -> Result<(), ListError> {
        for (index, action) in self.actions.iter().enumerate() {
            let sockets: Vec<&ActionEnd> = match &action.kind {
                ActionKind::Check { on_true, on_false, .. } => vec![on_true, on_false],
                ActionKind::CheckMultiple { sockets, .. }
                | ActionKind::Parallel { sockets } => {
                    if sockets.is_empty() {
                        return Err(ListError::EmptySockets { action: index });
                    }
                    sockets.iter().collect()
                }
                _ => Vec::new(),
            };
            // One past the end is legal: the cursor runs off and finishes.
            for socket in sockets {
                if let ActionEnd::Skip { index: target } = socket {
                    if *target > self.actions.len() {
                        return Err(ListError::SocketOutOfRange {
                            action: index,
                            target: *target,
                            len: self.actions.len(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Clear transient run state on every action (branch caches survive).
    pub(crate) fn reset(&mut self) {
        for action in &mut self.actions {
            action.reset();
        }
    }
}

/// Validation failures for authored lists
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ListError {
    #[error("action {action}: branch socket targets index {target}, list has {len} actions")]
    SocketOutOfRange {
        action: usize,
        target: usize,
        len: usize,
    },
    #[error("action {action}: branch has no sockets")]
    EmptySockets { action: usize },
}

pub(crate) fn slug(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if slug.is_empty() { "untitled".to_string() } else { slug }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::action::EndPolicy;
    use crate::types::value::{Arg, Comparison};

    #[test]
    fn validate_rejects_out_of_range_sockets() {
        let list = ActionList::new(
            "broken",
            vec![Action::new(ActionKind::Check {
                variable: "a".to_string(),
                comparison: Comparison::Equal,
                value: Arg::literal(1),
                on_true: ActionEnd::Skip { index: 9 },
                on_false: ActionEnd::Stop,
            })],
        );
        assert_eq!(
            list.validate(),
            Err(ListError::SocketOutOfRange {
                action: 0,
                target: 9,
                len: 1
            })
        );
    }

    #[test]
    fn validate_rejects_empty_branches() {
        let list = ActionList::new(
            "empty",
            vec![Action::new(ActionKind::Parallel { sockets: vec![] })],
        );
        assert_eq!(list.validate(), Err(ListError::EmptySockets { action: 0 }));
    }

    #[test]
    fn background_lists_are_never_skippable() {
        let mut list = ActionList::new("ambient", vec![]);
        list.skippable = true;
        list.list_type = ListType::Background;
        assert!(!list.is_skippable());
    }

    #[test]
    fn names_slug_into_ids() {
        let list = ActionList::new(
            "Intro Scene!",
            vec![Action::with_end(
                ActionKind::Wait { seconds: 0.0 },
                EndPolicy::Stop,
            )],
        );
        assert_eq!(list.id, "intro_scene_");
    }
}
