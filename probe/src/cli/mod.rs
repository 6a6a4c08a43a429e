//! CLI module
//!
//! - `args`: command-line flags
//! - `input`: stdin listener and the `v` toggle
//! - `states`: interaction states and menu command parsing
//! - `repl`: the interactive tool session

pub mod args;
pub mod input;
pub mod repl;
pub mod states;

pub use args::Cli;
pub use input::{InputListener, LineSource, ScriptedInput};
pub use repl::{ExitReason, InteractionLoop, LoopError, LoopSummary};
pub use states::LoopState;
