//! This module provides encoding functionality for writing a `Program` back into the `.dtm`
//! text format understood by the parser.

use crate::types::{Program, State, Transition, INPUT_BLANK_SYMBOL};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Encodes a program into `.dtm` text.
///
/// States are listed with the initial state first and the rest in sorted order; rules within a
/// state are sorted by the symbol they read. Tokens are quoted whenever the bare form would be
/// misread, so parsing the result yields the same program. Text containing a line break, or
/// both kinds of quote, has no written form.
///
/// # Arguments
///
/// * `program` - The Program to encode.
///
/// # Returns
///
/// * `String` - The program text.
pub fn encode(program: &Program) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail.
    let _ = writeln!(out, "name: {}", line(&program.name));
    let _ = writeln!(out, "blank: {}", quote(program.blank.as_str()));
    let _ = writeln!(out, "separator: {}", quote(&program.separator));
    let _ = writeln!(out, "start: {}", token(program.initial_state.as_str()));

    let halting: Vec<String> = program
        .halting_states
        .iter()
        .map(|state| token(state.as_str()))
        .collect();
    if halting.is_empty() {
        let _ = writeln!(out, "halt:");
    } else {
        let _ = writeln!(out, "halt: {}", halting.join(", "));
    }

    if !program.inputs.is_empty() {
        let _ = writeln!(out, "inputs:");
        for input in &program.inputs {
            let _ = writeln!(out, "  - {}", line(input));
        }
    }

    let _ = writeln!(out, "rules:");
    for (state, transitions) in group_by_state(program) {
        let _ = writeln!(out, "  {}:", token(state.as_str()));
        for t in transitions {
            let _ = writeln!(
                out,
                "    {} -> {}, {}, {}",
                token(t.read.as_str()),
                token(t.write.as_str()),
                t.direction.as_char(),
                token(t.next.as_str())
            );
        }
    }

    out
}

/// Groups the program's rules by source state, initial state first.
fn group_by_state(program: &Program) -> Vec<(State, Vec<Transition>)> {
    let mut groups: BTreeMap<State, Vec<Transition>> = BTreeMap::new();
    for transition in program.table.transitions() {
        groups
            .entry(transition.state.clone())
            .or_default()
            .push(transition);
    }

    let mut ordered = Vec::with_capacity(groups.len());
    if let Some(initial) = groups.remove(&program.initial_state) {
        ordered.push((program.initial_state.clone(), initial));
    }
    ordered.extend(groups);
    ordered
}

/// Writes a state or symbol so the parser reads it back unchanged.
fn token(text: &str) -> String {
    if is_bare(text) {
        text.to_string()
    } else {
        quote(text)
    }
}

/// Writes a name or input line so the parser reads it back unchanged.
fn line(text: &str) -> String {
    let plain = !text.is_empty()
        && text.trim() == text
        && !text.contains('#')
        && !text.starts_with(|c| c == '"' || c == '\'');

    if plain {
        text.to_string()
    } else {
        quote(text)
    }
}

/// Whether `text` survives as an unquoted token.
fn is_bare(text: &str) -> bool {
    !text.is_empty()
        && text != INPUT_BLANK_SYMBOL
        && !matches!(text, "L" | "R" | "<" | ">" | "rules" | "inputs")
        && !text.contains("->")
        && !text
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ',' | ':' | '#' | '"' | '\''))
}

/// Quotes `text`, preferring double quotes.
fn quote(text: &str) -> String {
    if text.contains('"') {
        format!("'{}'", text)
    } else {
        format!("\"{}\"", text)
    }
}
