//! # maku
//!
//! A cooperative cutscene sequencing engine for adventure games: ordered
//! lists of discrete actions with conditional branching, parallel fan-out,
//! cross-list hand-off, a registry of concurrently running lists, derived
//! global game state, and deterministic skip-to-end replay.
//!
//! Scheduling is single-threaded and tick-driven. The engine renders
//! nothing: actions emit [`Directive`]s that the host drains and interprets.
//!
//! ## Quick Start
//!
//! ```rust
//! use maku::{Directive, Engine, GameState};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let script = r#"
//! [SAY speaker=Guard]
//! Halt! Who goes there?
//! [SET name=alerted value=true]
//! "#;
//! let mut engine = Engine::from_script(script)?;
//!
//! while engine.are_lists_running() {
//!     let report = engine.tick(0.1);
//!     for directive in &report.directives {
//!         if let Directive::Say { speaker, text } = directive {
//!             println!("{speaker}: {text}");
//!         }
//!     }
//! }
//!
//! assert_eq!(engine.game_state(), GameState::Normal);
//! assert_eq!(engine.get_var("alerted").as_deref(), Some("true"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Hand-built lists
//!
//! ```rust
//! use maku::{Action, ActionKind, ActionList, Arg, Engine};
//!
//! let mut engine = Engine::new();
//! let list = ActionList::new(
//!     "greeting",
//!     vec![Action::new(ActionKind::Say {
//!         speaker: Arg::literal("Hero"),
//!         text: Arg::literal("Hello!"),
//!         seconds: 0.0,
//!     })],
//! );
//! engine.start(list).unwrap();
//! let report = engine.tick(0.0);
//! assert_eq!(report.directives.len(), 1);
//! ```

pub mod application;
pub mod assets;
pub mod cli;
pub mod hooks;
pub mod parser;
pub mod runtime;
pub mod storage;
pub mod types;

// Stable public surface
pub use application::api::{ApiError, TickReport};
pub use application::engine::Engine;
pub use hooks::{HostHooks, NullHooks};
pub use parser::{parse_script, ParseError};
pub use runtime::manager::{ConversationPoint, GameState, ListManager};
pub use runtime::runner::{Runner, RunnerPhase};
pub use runtime::skip::SkipEntry;
pub use storage::{load, save, Snapshot};
pub use types::action::{Action, ActionEnd, ActionKind, EndPolicy};
pub use types::directive::Directive;
pub use types::list::{ActionList, ListError, ListSource, ListType};
pub use types::value::{Arg, Comparison, NumericOp, ParamSet, VarStore, VarValue};
