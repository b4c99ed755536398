//! This crate provides a deterministic Turing machine interpreter.
//! It includes a sparse, bidirectionally infinite tape, the step engine that applies
//! `(state, symbol) -> (state, symbol, direction)` rules, and the surrounding tooling for
//! parsing, analyzing, encoding, loading and running programs.

pub mod analyzer;
pub mod encoder;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod runner;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` functions and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, analyze_all, AnalysisError};
/// Re-exports the encoding function from the encoder module.
pub use encoder::encode;
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the `Machine` struct from the machine module.
pub use machine::Machine;
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
/// Re-exports the bounded runners from the runner module.
pub use runner::{run, run_all, Report};
/// Re-exports the `Tape` struct from the tape module.
pub use tape::Tape;
/// Re-exports various types related to program definition and execution from the types module.
pub use types::{
    Action, Direction, MachineError, Outcome, Program, State, Step, Symbol, Transition,
    TransitionTable, MAX_EXECUTION_STEPS, MAX_PROGRAM_SIZE,
};
