//! This module provides functions for analyzing programs to detect common mistakes before
//! execution. The machine itself never validates its configuration; these checks are an
//! opt-in lint for callers that load programs from untrusted files.

use crate::types::{MachineError, Program, State, Symbol};
use std::collections::{BTreeSet, HashSet};

/// Represents the problems that can be found during the analysis of a program.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The initial state has no rules and is not a halting state, so every run stalls at once.
    InvalidStartState(String),
    /// No halting state can be reached from the initial state.
    NoReachableHaltingState(Vec<String>),
    /// States with rules that can never be entered from the initial state.
    UnreachableStates(Vec<String>),
    /// Reachable, non-halting states without any rule. Entering one stalls the machine.
    DeadEndStates(Vec<String>),
    /// Symbols of the program's inputs that no rule reads.
    UnhandledInputSymbols(Vec<String>),
}

impl From<AnalysisError> for MachineError {
    /// Converts an `AnalysisError` into a `MachineError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::InvalidStartState(state) => {
                MachineError::ValidationError(format!("Invalid start state: {}", state))
            }
            AnalysisError::NoReachableHaltingState(states) => MachineError::ValidationError(
                format!("No halting state is reachable: {:?}", states),
            ),
            AnalysisError::UnreachableStates(states) => MachineError::ValidationError(format!(
                "Unreachable states detected: {:?}",
                states
            )),
            AnalysisError::DeadEndStates(states) => MachineError::ValidationError(format!(
                "States without rules will stall the machine: {:?}",
                states
            )),
            AnalysisError::UnhandledInputSymbols(symbols) => {
                MachineError::ValidationError(format!(
                    "Inputs contain symbols not handled by any rule: {:?}",
                    symbols
                ))
            }
        }
    }
}

/// Analyzes a program and returns the first problem found.
///
/// # Returns
///
/// * `Ok(())` if no problems are found.
/// * `Err(MachineError::ValidationError)` describing the first problem otherwise.
pub fn analyze(program: &Program) -> Result<(), MachineError> {
    match analyze_all(program).into_iter().next() {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

/// Runs every check and returns all problems found, in a fixed order.
pub fn analyze_all(program: &Program) -> Vec<AnalysisError> {
    [
        check_valid_start_state,
        check_halting_reachable,
        check_unreachable_states,
        check_dead_end_states,
        check_input_symbols,
    ]
    .iter()
    .filter_map(|f| f(program).err())
    .collect()
}

/// Collects every state reachable from the initial state by following rules.
///
/// The search does not continue out of halting states, since a run stops there.
fn reachable_states(program: &Program) -> HashSet<State> {
    let mut visited = HashSet::new();
    let mut queue = vec![program.initial_state.clone()];

    while let Some(state) = queue.pop() {
        if !visited.insert(state.clone()) || program.is_halting(&state) {
            continue;
        }

        for (from, _, action) in program.table.iter() {
            if *from == state && !visited.contains(&action.next_state) {
                queue.push(action.next_state.clone());
            }
        }
    }

    visited
}

/// Checks whether the initial state can do anything at all.
fn check_valid_start_state(program: &Program) -> Result<(), AnalysisError> {
    let has_rules = program
        .table
        .iter()
        .any(|(state, _, _)| *state == program.initial_state);

    if !has_rules && !program.is_halting(&program.initial_state) {
        return Err(AnalysisError::InvalidStartState(
            program.initial_state.to_string(),
        ));
    }

    Ok(())
}

/// Checks that at least one halting state is reachable from the initial state.
fn check_halting_reachable(program: &Program) -> Result<(), AnalysisError> {
    let reachable = reachable_states(program);

    if program.halting_states.iter().any(|s| reachable.contains(s)) {
        return Ok(());
    }

    Err(AnalysisError::NoReachableHaltingState(
        program.halting_states.iter().map(|s| s.to_string()).collect(),
    ))
}

/// Checks for states with rules that cannot be reached from the initial state.
fn check_unreachable_states(program: &Program) -> Result<(), AnalysisError> {
    let reachable = reachable_states(program);

    let unreachable: Vec<String> = program
        .table
        .states()
        .into_iter()
        .filter(|state| !reachable.contains(state) && !program.is_halting(state))
        .map(|state| state.to_string())
        .collect();

    if !unreachable.is_empty() {
        return Err(AnalysisError::UnreachableStates(unreachable));
    }

    Ok(())
}

/// Checks for reachable states that are neither halting nor have any rule.
fn check_dead_end_states(program: &Program) -> Result<(), AnalysisError> {
    let with_rules = program.table.states();

    let dead_ends: BTreeSet<String> = reachable_states(program)
        .into_iter()
        .filter(|state| !with_rules.contains(state) && !program.is_halting(state))
        .map(|state| state.to_string())
        .collect();

    if !dead_ends.is_empty() {
        return Err(AnalysisError::DeadEndStates(dead_ends.into_iter().collect()));
    }

    Ok(())
}

/// Checks that every symbol of the program's inputs is read by at least one rule.
fn check_input_symbols(program: &Program) -> Result<(), AnalysisError> {
    let handled: HashSet<&Symbol> = program.table.iter().map(|(_, read, _)| read).collect();

    let unhandled: BTreeSet<String> = program
        .inputs
        .iter()
        .flat_map(|input| program.symbols(input))
        .filter(|symbol| !handled.contains(symbol))
        .map(|symbol| symbol.to_string())
        .collect();

    if !unhandled.is_empty() {
        return Err(AnalysisError::UnhandledInputSymbols(
            unhandled.into_iter().collect(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, TransitionTable};

    fn create_test_program(
        initial_state: &str,
        halting: &[&str],
        rules: &[(&str, &str, &str, &str, Direction)],
    ) -> Program {
        let mut table = TransitionTable::new();
        for (state, read, next, write, direction) in rules {
            table.add(state, read, next, write, *direction).unwrap();
        }

        Program {
            name: "Test Program".to_string(),
            blank: "[]".into(),
            separator: "_".to_string(),
            initial_state: initial_state.into(),
            halting_states: halting.iter().map(|s| State::new(s)).collect(),
            table,
            inputs: vec![],
        }
    }

    #[test]
    fn test_valid_program() {
        let program = create_test_program(
            "start",
            &["halt"],
            &[
                ("start", "a", "start", "b", Direction::Right),
                ("start", "[]", "halt", "[]", Direction::Left),
            ],
        );

        assert!(analyze(&program).is_ok());
        assert!(analyze_all(&program).is_empty());
    }

    #[test]
    fn test_invalid_start_state() {
        let program = create_test_program(
            "nowhere",
            &["halt"],
            &[("start", "a", "halt", "a", Direction::Right)],
        );

        let errors = analyze_all(&program);
        assert_eq!(
            errors[0],
            AnalysisError::InvalidStartState("nowhere".to_string())
        );
        assert!(matches!(
            analyze(&program),
            Err(MachineError::ValidationError(msg)) if msg == "Invalid start state: nowhere"
        ));
    }

    #[test]
    fn test_start_in_halting_state() {
        let program = create_test_program("halt", &["halt"], &[]);

        assert!(analyze(&program).is_ok());
    }

    #[test]
    fn test_no_reachable_halting_state() {
        let program = create_test_program(
            "loop",
            &["halt"],
            &[("loop", "a", "loop", "a", Direction::Right)],
        );

        assert_eq!(
            analyze_all(&program),
            vec![AnalysisError::NoReachableHaltingState(vec![
                "halt".to_string()
            ])]
        );
    }

    #[test]
    fn test_unreachable_states() {
        let program = create_test_program(
            "start",
            &["halt"],
            &[
                ("start", "a", "halt", "a", Direction::Right),
                ("island", "a", "halt", "a", Direction::Right),
                // Rules out of a halting state never run, but the state is not unreachable.
                ("halt", "a", "after", "a", Direction::Right),
            ],
        );

        assert_eq!(
            analyze_all(&program),
            vec![AnalysisError::UnreachableStates(vec!["island".to_string()])]
        );
    }

    #[test]
    fn test_dead_end_states() {
        let program = create_test_program(
            "start",
            &["halt"],
            &[
                ("start", "a", "halt", "a", Direction::Right),
                ("start", "b", "limbo", "b", Direction::Right),
            ],
        );

        assert_eq!(
            analyze_all(&program),
            vec![AnalysisError::DeadEndStates(vec!["limbo".to_string()])]
        );
    }

    #[test]
    fn test_unhandled_input_symbols() {
        let mut program = create_test_program(
            "start",
            &["halt"],
            &[
                ("start", "B", "start", "B", Direction::Right),
                ("start", "Crimp", "halt", "Crimp", Direction::Right),
            ],
        );
        program.inputs = vec!["B_Crimp_Rock over".into(), "B_Jug".into()];

        assert_eq!(
            analyze_all(&program),
            vec![AnalysisError::UnhandledInputSymbols(vec![
                "Jug".to_string(),
                "Rock over".to_string()
            ])]
        );
    }
}
