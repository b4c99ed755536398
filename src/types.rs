//! This module defines the core data structures and types used throughout the interpreter,
//! including symbols and states, transition rules, program configuration, execution results,
//! and error types.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::Rule;

/// The default blank symbol returned for every tape cell that was never written.
pub const DEFAULT_BLANK_SYMBOL: &str = "[]";
/// The default field separator used to split an input string into tape symbols.
pub const DEFAULT_SEPARATOR: &str = "_";
/// A bare symbol in program rules that stands for the program's blank symbol.
pub const INPUT_BLANK_SYMBOL: &str = "_";
/// The maximum allowed size for a program file in bytes.
pub const MAX_PROGRAM_SIZE: usize = 65536; // 64KB
/// The default number of steps a bounded run executes before giving up.
pub const MAX_EXECUTION_STEPS: usize = 100_000;

macro_rules! label {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(value: impl AsRef<str>) -> Self {
                Self(Arc::from(value.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(Arc::from(value))
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                &*self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                &*self.0 == *other
            }
        }
    };
}

label! {
    /// An opaque tape symbol. Multi-word labels such as `Under cling` are single symbols.
    ///
    /// Cloning is cheap: the text is shared between every copy.
    Symbol
}

label! {
    /// An opaque machine state label.
    State
}

/// Represents the possible directions the head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
}

impl Direction {
    /// The head adjustment this direction stands for.
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }

    /// The single-letter form used by the text format.
    pub fn as_char(self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }
}

/// The right-hand side of a transition rule: what the machine does after reading a symbol
/// in a given state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// The state the machine moves to.
    pub next_state: State,
    /// The symbol written under the head.
    pub write: Symbol,
    /// The direction the head moves after writing.
    pub direction: Direction,
}

/// One rule of a transition table in its flat, serializable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub state: State,
    pub read: Symbol,
    pub write: Symbol,
    pub direction: Direction,
    pub next: State,
}

/// A deterministic transition table mapping `(state, symbol)` to an [`Action`].
///
/// There is at most one rule per key. The table is never mutated by a running machine and
/// can be shared read-only between machines running on different threads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Transition>", into = "Vec<Transition>")]
pub struct TransitionTable {
    rules: HashMap<(State, Symbol), Action>,
}

impl TransitionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule for `(state, read)`.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the key had no rule yet.
    /// * `Err(MachineError::DuplicateRule)` if a rule for the key already exists. The existing
    ///   rule is kept.
    pub fn insert(
        &mut self,
        state: State,
        read: Symbol,
        action: Action,
    ) -> Result<(), MachineError> {
        use std::collections::hash_map::Entry;

        match self.rules.entry((state, read)) {
            Entry::Occupied(e) => Err(MachineError::DuplicateRule {
                state: e.key().0.to_string(),
                symbol: e.key().1.to_string(),
            }),
            Entry::Vacant(e) => {
                e.insert(action);
                Ok(())
            }
        }
    }

    /// Convenience form of [`TransitionTable::insert`] taking plain labels.
    pub fn add(
        &mut self,
        state: &str,
        read: &str,
        next: &str,
        write: &str,
        direction: Direction,
    ) -> Result<(), MachineError> {
        self.insert(
            State::new(state),
            Symbol::new(read),
            Action {
                next_state: State::new(next),
                write: Symbol::new(write),
                direction,
            },
        )
    }

    /// Looks up the rule for `(state, symbol)`.
    pub fn get(&self, state: &State, symbol: &Symbol) -> Option<&Action> {
        // Clones are reference count bumps.
        self.rules.get(&(state.clone(), symbol.clone()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates over every rule in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&State, &Symbol, &Action)> {
        self.rules
            .iter()
            .map(|((state, symbol), action)| (state, symbol, action))
    }

    /// Every state that has at least one outgoing rule.
    pub fn states(&self) -> BTreeSet<State> {
        self.rules.keys().map(|(state, _)| state.clone()).collect()
    }

    /// Returns every rule in its flat form, sorted by state and read symbol.
    pub fn transitions(&self) -> Vec<Transition> {
        let mut transitions: Vec<Transition> = self
            .iter()
            .map(|(state, read, action)| Transition {
                state: state.clone(),
                read: read.clone(),
                write: action.write.clone(),
                direction: action.direction,
                next: action.next_state.clone(),
            })
            .collect();
        transitions.sort_by(|a, b| (&a.state, &a.read).cmp(&(&b.state, &b.read)));
        transitions
    }
}

impl TryFrom<Vec<Transition>> for TransitionTable {
    type Error = MachineError;

    fn try_from(transitions: Vec<Transition>) -> Result<Self, Self::Error> {
        let mut table = TransitionTable::new();
        for t in transitions {
            table.insert(
                t.state,
                t.read,
                Action {
                    next_state: t.next,
                    write: t.write,
                    direction: t.direction,
                },
            )?;
        }
        Ok(table)
    }
}

impl From<TransitionTable> for Vec<Transition> {
    fn from(table: TransitionTable) -> Self {
        table.transitions()
    }
}

/// A complete machine configuration: the table plus everything a caller needs to build
/// machines from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// The name of the program.
    pub name: String,
    /// The symbol read from cells that were never written.
    #[serde(default = "default_blank")]
    pub blank: Symbol,
    /// The field separator used to split input strings into symbols.
    #[serde(default = "default_separator")]
    pub separator: String,
    /// The state every run starts in.
    pub initial_state: State,
    /// Reaching any of these states ends a run.
    pub halting_states: BTreeSet<State>,
    /// The transition rules.
    pub table: TransitionTable,
    /// Sample inputs shipped with the program.
    #[serde(default)]
    pub inputs: Vec<String>,
}

fn default_blank() -> Symbol {
    Symbol::new(DEFAULT_BLANK_SYMBOL)
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

impl Program {
    /// Splits an input string into symbols using the program's separator.
    pub fn symbols(&self, input: &str) -> Vec<Symbol> {
        input.split(self.separator.as_str()).map(Symbol::new).collect()
    }

    /// Checks the settings every loading path must agree on.
    ///
    /// An empty separator would split inputs between every character and add an empty symbol
    /// at both ends.
    pub fn validate(&self) -> Result<(), MachineError> {
        if self.separator.is_empty() {
            return Err(MachineError::ValidationError(
                "Separator must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_halting(&self, state: &State) -> bool {
        self.halting_states.contains(state)
    }

    /// Every state named anywhere in the program, sorted.
    pub fn states(&self) -> BTreeSet<State> {
        let mut states = self.table.states();
        states.insert(self.initial_state.clone());
        states.extend(self.halting_states.iter().cloned());
        states.extend(self.table.iter().map(|(_, _, a)| a.next_state.clone()));
        states
    }
}

/// Represents the outcome of a single machine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A rule was applied: the tape was written, the head moved and the state changed.
    Moved,
    /// No rule exists for the current state and symbol. Nothing changed, and nothing will
    /// change however often the machine is stepped again.
    Stalled,
}

/// The result of a bounded run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// The machine reached a halting state.
    Halted { steps: usize },
    /// The machine got stuck on a `(state, symbol)` pair with no rule.
    Stalled {
        steps: usize,
        state: State,
        symbol: Symbol,
    },
    /// The step budget ran out before the machine halted.
    Exhausted { steps: usize },
}

impl Outcome {
    pub fn steps(&self) -> usize {
        match self {
            Outcome::Halted { steps }
            | Outcome::Stalled { steps, .. }
            | Outcome::Exhausted { steps } => *steps,
        }
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, Outcome::Halted { .. })
    }
}

/// Represents the errors raised while building or loading programs. Running a machine
/// never fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MachineError {
    /// Two rules share the same `(state, symbol)` key.
    #[error("Duplicate rule for state {state} and symbol {symbol}")]
    DuplicateRule { state: String, symbol: String },
    /// Indicates an error during the parsing of a program definition.
    #[error("Program parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates that a program is structurally incomplete or inconsistent.
    #[error("Program validation error: {0}")]
    ValidationError(String),
    /// Indicates that a JSON program could not be decoded.
    #[error("JSON error: {0}")]
    JsonError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
}

impl From<serde_json::Error> for MachineError {
    fn from(error: serde_json::Error) -> Self {
        MachineError::JsonError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        let right_json = serde_json::to_string(&Direction::Right).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(right_json, "\"Right\"");

        let left: Direction = serde_json::from_str(&left_json).unwrap();
        assert_eq!(left, Direction::Left);
        assert_eq!(Direction::Left.offset(), -1);
        assert_eq!(Direction::Right.offset(), 1);
    }

    #[test]
    fn test_symbols_compare_by_text() {
        let a = Symbol::new("Under cling");
        let b = Symbol::from(String::from("Under cling"));

        assert_eq!(a, b);
        assert_eq!(a, "Under cling");
        assert_ne!(a, Symbol::new("Side cling"));
        assert_eq!(a.to_string(), "Under cling");
    }

    #[test]
    fn test_table_rejects_duplicate_keys() {
        let mut table = TransitionTable::new();
        table.add("S0", "B", "S1", "B", Direction::Right).unwrap();

        let err = table
            .add("S0", "B", "S2", "X", Direction::Left)
            .unwrap_err();
        assert_eq!(
            err,
            MachineError::DuplicateRule {
                state: "S0".into(),
                symbol: "B".into()
            }
        );

        // The first rule survives.
        let action = table.get(&"S0".into(), &"B".into()).unwrap();
        assert_eq!(action.next_state, "S1");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_table_lookup_misses() {
        let mut table = TransitionTable::new();
        table.add("S0", "B", "S1", "B", Direction::Right).unwrap();

        assert!(table.get(&"S0".into(), &"1".into()).is_none());
        assert!(table.get(&"S1".into(), &"B".into()).is_none());
    }

    #[test]
    fn test_table_json_is_a_rule_list() {
        let mut table = TransitionTable::new();
        table.add("S0", "B", "S1", "X", Direction::Right).unwrap();

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "state": "S0",
                "read": "B",
                "write": "X",
                "direction": "Right",
                "next": "S1"
            }])
        );

        let back: TransitionTable = serde_json::from_value(json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_table_json_rejects_duplicates() {
        let json = r#"[
            {"state": "S0", "read": "B", "write": "B", "direction": "Right", "next": "S1"},
            {"state": "S0", "read": "B", "write": "X", "direction": "Left", "next": "S2"}
        ]"#;

        let result: Result<TransitionTable, _> = serde_json::from_str(json);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Duplicate rule for state S0 and symbol B"));
    }

    #[test]
    fn test_program_splits_inputs_on_separator() {
        let program = Program {
            name: "Split".into(),
            blank: default_blank(),
            separator: "_".into(),
            initial_state: "S0".into(),
            halting_states: BTreeSet::new(),
            table: TransitionTable::new(),
            inputs: vec![],
        };

        assert_eq!(
            program.symbols("B_Under cling_Jug"),
            vec![
                Symbol::new("B"),
                Symbol::new("Under cling"),
                Symbol::new("Jug")
            ]
        );
    }

    #[test]
    fn test_program_rejects_empty_separator() {
        let mut program = Program {
            name: "Separator".into(),
            blank: default_blank(),
            separator: "_".into(),
            initial_state: "S0".into(),
            halting_states: BTreeSet::new(),
            table: TransitionTable::new(),
            inputs: vec![],
        };
        assert!(program.validate().is_ok());

        program.separator.clear();
        assert_eq!(
            program.validate(),
            Err(MachineError::ValidationError(
                "Separator must not be empty".to_string()
            ))
        );
    }

    #[test]
    fn test_error_display() {
        let error = MachineError::ValidationError("Missing 'halt' section".to_string());
        assert_eq!(
            error.to_string(),
            "Program validation error: Missing 'halt' section"
        );
    }
}
