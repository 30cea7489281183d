//! Core data model: values, actions, lists and directives

pub mod action;
pub mod directive;
pub mod list;
pub mod value;

pub use action::{Action, ActionEnd, ActionKind, EndPolicy, RunContext, RunProgress};
pub use directive::Directive;
pub use list::{ActionList, ListError, ListSource, ListType};
pub use value::{Arg, Comparison, NumericOp, ParamSet, VarStore, VarValue};
