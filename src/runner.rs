//! Bounded execution of a program on one or more inputs.
//!
//! Each run owns its tape and machine. Batches run on scoped threads that share the
//! program's transition table read-only.

use crate::machine::Machine;
use crate::types::{Outcome, Program, State, Symbol};
use log::{debug, info};
use serde::Serialize;
use std::{panic, thread};

/// The result of running a program on one input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// The input as given.
    pub input: String,
    /// How the run ended.
    pub outcome: Outcome,
    /// The state the machine ended in.
    pub state: State,
    /// The final head position.
    pub head: i64,
    /// The rendered tape.
    pub tape: Vec<Symbol>,
}

impl Report {
    /// The rendered tape as one line of space-separated symbols.
    pub fn tape_string(&self) -> String {
        self.tape
            .iter()
            .map(Symbol::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs `program` on `input` for at most `max_steps` steps.
pub fn run(program: &Program, input: &str, max_steps: usize) -> Report {
    let mut machine = Machine::from_program(program, input);
    let outcome = machine.run_bounded(max_steps);

    debug!("{}: {:?} on {:?}", program.name, outcome, input);

    Report {
        input: input.to_string(),
        outcome,
        state: machine.state().clone(),
        head: machine.head(),
        tape: machine.into_tape().render(),
    }
}

/// Runs `program` on every input, each on its own thread.
///
/// Reports are returned in the order of `inputs`.
pub fn run_all<S>(program: &Program, inputs: &[S], max_steps: usize) -> Vec<Report>
where
    S: AsRef<str> + Sync,
{
    info!("Running {} on {} input(s)", program.name, inputs.len());

    thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| scope.spawn(move || run(program, input.as_ref(), max_steps)))
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn program() -> Program {
        parse(
            r#"
name: Unary double
halt: done
rules:
  scan:
    1 -> x, R, seek
    y -> R, scan
    _ -> L, clean
  seek:
    1 -> R, seek
    y -> R, seek
    _ -> y, L, back
  back:
    1 -> L, back
    y -> L, back
    x -> 1, R, scan
  clean:
    y -> 1, L, clean
    1 -> L, clean
    _ -> R, done
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_run_reports_halt() {
        let program = program();
        let report = run(&program, "1_1", 1000);

        assert!(report.outcome.is_halted());
        assert_eq!(report.state, "done");
        assert_eq!(report.tape_string(), "[] 1 1 1 1 []");
        assert_eq!(report.head, 0);
    }

    #[test]
    fn test_run_reports_stall() {
        let program = program();
        let report = run(&program, "1_z", 1000);

        assert!(matches!(
            report.outcome,
            Outcome::Stalled { ref symbol, .. } if symbol == "z"
        ));
        assert_eq!(report.state, "seek");
    }

    #[test]
    fn test_run_reports_exhaustion() {
        let program = program();
        let report = run(&program, "1_1_1", 3);

        assert_eq!(report.outcome, Outcome::Exhausted { steps: 3 });
    }

    #[test]
    fn test_run_all_keeps_input_order() {
        let program = program();
        let inputs = ["1", "1_1", "1_z", "1_1_1"];
        let reports = run_all(&program, &inputs, 10_000);

        assert_eq!(reports.len(), inputs.len());
        for (report, input) in reports.iter().zip(inputs) {
            assert_eq!(report.input, input);
            assert_eq!(report, &run(&program, input, 10_000));
        }
        assert_eq!(reports[3].tape_string(), "[] 1 1 1 1 1 1 []");
    }

    #[test]
    fn test_report_serialization() {
        let program = program();
        let report = run(&program, "1_z", 1000);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["input"], "1_z");
        assert_eq!(json["outcome"]["status"], "stalled");
        assert_eq!(json["outcome"]["symbol"], "z");
        assert_eq!(json["outcome"]["steps"], 1);
        assert_eq!(json["state"], "seek");
        assert_eq!(json["head"], 1);
        assert_eq!(json["tape"], serde_json::json!(["x", "z"]));
    }
}
