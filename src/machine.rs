//! This module defines the `Machine` struct, which executes a deterministic single-tape
//! Turing machine. It holds the current state, the head position and the tape, and applies
//! the rules of a borrowed transition table one step at a time.

use crate::tape::Tape;
use crate::types::{Action, Outcome, Program, State, Step, Symbol, TransitionTable};
use log::{debug, trace};
use std::collections::HashSet;

/// A deterministic single-tape Turing machine.
///
/// The transition table is borrowed and never modified, so any number of machines can run
/// against the same table at once. The tape is owned by the machine.
#[derive(Debug, Clone)]
pub struct Machine<'t> {
    state: State,
    head: i64,
    tape: Tape,
    table: &'t TransitionTable,
    halting: HashSet<State>,
    step_count: usize,
}

impl<'t> Machine<'t> {
    /// Creates a new machine with its head at position 0.
    ///
    /// # Arguments
    ///
    /// * `table` - The transition rules to execute.
    /// * `tape` - The starting tape.
    /// * `initial_state` - The state of the machine before the first step.
    /// * `halting_states` - Entering any of these states halts the machine.
    pub fn new<I>(
        table: &'t TransitionTable,
        tape: Tape,
        initial_state: State,
        halting_states: I,
    ) -> Self
    where
        I: IntoIterator<Item = State>,
    {
        Self {
            state: initial_state,
            head: 0,
            tape,
            table,
            halting: halting_states.into_iter().collect(),
            step_count: 0,
        }
    }

    /// Creates a machine for `program` with `input` split onto the tape.
    pub fn from_program(program: &'t Program, input: &str) -> Self {
        let tape = Tape::parse(input, &program.separator, program.blank.clone());
        Self::new(
            &program.table,
            tape,
            program.initial_state.clone(),
            program.halting_states.iter().cloned(),
        )
    }

    /// Returns `true` if the current state is one of the halting states.
    pub fn halted(&self) -> bool {
        self.halting.contains(&self.state)
    }

    /// Executes a single step.
    ///
    /// Reads the symbol under the head and looks up the rule for the current state and that
    /// symbol. If there is one, the machine writes the rule's symbol, moves the head and
    /// enters the rule's next state. If there is none, nothing changes.
    ///
    /// Rules are applied whether or not the machine has halted; stopping at a halting state
    /// is up to the caller's drive loop (see [`Machine::run`]).
    ///
    /// # Returns
    ///
    /// * `Step::Moved` if a rule was applied.
    /// * `Step::Stalled` if no rule exists. Repeated calls keep returning `Stalled`.
    pub fn step(&mut self) -> Step {
        let Some(action) = self.rule() else {
            debug!(
                "Stalled in state {} reading {} at {}",
                self.state,
                self.symbol(),
                self.head
            );
            return Step::Stalled;
        };

        let Action {
            next_state,
            write,
            direction,
        } = action.clone();

        trace!(
            "{} @ {}: {} -> {}, {:?}, {}",
            self.state,
            self.head,
            self.symbol(),
            write,
            direction,
            next_state
        );

        self.tape.write(self.head, write);
        self.head += direction.offset();
        self.state = next_state;
        self.step_count += 1;

        Step::Moved
    }

    /// Steps until the machine halts.
    ///
    /// There is no step limit: a machine that never reaches a halting state, including one
    /// that stalls, makes this loop run forever. Use [`Machine::run_bounded`] when the input
    /// is not trusted.
    pub fn run(&mut self) {
        while !self.halted() {
            self.step();
        }
        debug!("Halted in state {} after {} steps", self.state, self.step_count);
    }

    /// Steps until the machine halts, stalls, or `max_steps` rules have been applied.
    ///
    /// The step count in the returned `Outcome` is the total for this machine, including
    /// steps taken before the call.
    pub fn run_bounded(&mut self, max_steps: usize) -> Outcome {
        let mut budget = max_steps;

        loop {
            if self.halted() {
                return Outcome::Halted {
                    steps: self.step_count,
                };
            }

            if budget == 0 {
                debug!("Step budget of {} exhausted in state {}", max_steps, self.state);
                return Outcome::Exhausted {
                    steps: self.step_count,
                };
            }

            match self.step() {
                Step::Moved => budget -= 1,
                Step::Stalled => {
                    return Outcome::Stalled {
                        steps: self.step_count,
                        state: self.state.clone(),
                        symbol: self.symbol().clone(),
                    }
                }
            }
        }
    }

    /// Returns the rule the next step would apply, if any.
    pub fn rule(&self) -> Option<&'t Action> {
        self.table.get(&self.state, self.symbol())
    }

    /// Returns the symbol under the head.
    pub fn symbol(&self) -> &Symbol {
        self.tape.read(self.head)
    }

    /// Returns the current state.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Returns the head position.
    pub fn head(&self) -> i64 {
        self.head
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Consumes the machine and returns its tape.
    pub fn into_tape(self) -> Tape {
        self.tape
    }

    /// Returns the number of rules applied so far. Stalled steps are not counted.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn table(&self) -> &'t TransitionTable {
        self.table
    }

    pub fn halting_states(&self) -> &HashSet<State> {
        &self.halting
    }
}
