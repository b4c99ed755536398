//! This module provides the parser for `.dtm` program files, utilizing the `pest` crate.
//! It defines the grammar for program files and functions to parse the input into a `Program`
//! struct.

use crate::types::{
    Action, Direction, MachineError, Program, State, Symbol, TransitionTable,
    DEFAULT_BLANK_SYMBOL, DEFAULT_SEPARATOR, INPUT_BLANK_SYMBOL,
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::{BTreeSet, HashSet};

/// Derives a `PestParser` for the program grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct ProgramParser;

/// Parses the given input string into a `Program` struct.
///
/// This is the main entry point for parsing program definitions. It trims the input,
/// parses it using the `ProgramParser`, and then processes the resulting parse tree into a
/// structured `Program`.
///
/// The program is not analyzed; use [`crate::analyze`] to lint it.
///
/// # Arguments
///
/// * `input` - A string slice containing the program definition.
///
/// # Returns
///
/// * `Ok(Program)` if the input is successfully parsed.
/// * `Err(MachineError::ParseError)` if there are syntax errors, duplicate sections or
///   duplicate rules.
/// * `Err(MachineError::ValidationError)` if a required section is missing or the separator
///   is empty.
pub fn parse(input: &str) -> Result<Program, MachineError> {
    let root = ProgramParser::parse(Rule::program, input.trim())
        .map_err(|e| MachineError::ParseError(Box::new(e)))?
        .next()
        .ok_or_else(|| MachineError::ValidationError("Empty program".to_string()))?;

    parse_program(root)
}

/// Parses the top-level structure of a program from a `Pair<Rule::program>`.
fn parse_program(pair: Pair<Rule>) -> Result<Program, MachineError> {
    let mut name: Option<String> = None;
    let mut separator: Option<String> = None;
    let mut start: Option<State> = None;
    let mut halting: Option<BTreeSet<State>> = None;
    let mut inputs: Option<Vec<String>> = None;
    let mut rules: Option<(TransitionTable, Option<State>)> = None;
    let mut seen = HashSet::new();

    let sections: Vec<Pair<Rule>> = pair.into_inner().collect();

    // `_` in rules stands for the blank, which may be declared after them.
    let blank = match sections.iter().find(|p| p.as_rule() == Rule::blank) {
        Some(p) => Symbol::new(parse_token(first_inner(p.clone())?)?),
        None => Symbol::new(DEFAULT_BLANK_SYMBOL),
    };

    for p in sections {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::name => name = Some(parse_line(p)?),
            Rule::separator => separator = Some(parse_quoted(p)?),
            Rule::start => start = Some(State::new(parse_token(first_inner(p)?)?)),
            Rule::halt => halting = Some(parse_halting_states(p)?),
            Rule::inputs => inputs = Some(parse_inputs(p)?),
            Rule::rules => rules = Some(parse_rules(p, &blank)?),
            _ => {} // blank, EOI
        }
    }

    let name = check_required_rule(name, "name")?;
    let halting_states = check_required_rule(halting, "halt")?;
    let (table, first_state) = check_required_rule(rules, "rules")?;
    let separator = separator.unwrap_or_else(|| DEFAULT_SEPARATOR.to_string());
    let initial_state = check_required_rule(start.or(first_state), "start")?;

    let program = Program {
        name,
        blank,
        separator,
        initial_state,
        halting_states,
        table,
        inputs: inputs.unwrap_or_default(),
    };
    program.validate()?;

    Ok(program)
}

/// Parses the comma-separated halting states of a `Pair<Rule::halt>`. The list may be empty.
fn parse_halting_states(pair: Pair<Rule>) -> Result<BTreeSet<State>, MachineError> {
    pair.into_inner()
        .map(|p| parse_token(p).map(State::new))
        .collect()
}

/// Parses the `- input` lines of a `Pair<Rule::inputs>`.
fn parse_inputs(pair: Pair<Rule>) -> Result<Vec<String>, MachineError> {
    pair.into_inner()
        .filter(|p| p.as_rule() == Rule::input)
        .map(parse_line)
        .collect()
}

/// Parses the rules section from a `Pair<Rule::rules>`.
///
/// Returns the table together with the first state block, which is the default initial state.
/// A bare `_` in a rule reads or writes `blank`.
fn parse_rules(
    pair: Pair<Rule>,
    blank: &Symbol,
) -> Result<(TransitionTable, Option<State>), MachineError> {
    let mut table = TransitionTable::new();
    let mut first_state = None;

    for block in pair.into_inner() {
        let mut pairs = block.into_inner();
        let state_pair = pairs
            .next()
            .ok_or_else(|| MachineError::ValidationError("Rule block without state".into()))?;
        let state = State::new(parse_token(state_pair)?);

        if first_state.is_none() {
            first_state = Some(state.clone());
        }

        for transition in pairs {
            let span = transition.as_span();
            let (read, action) = parse_transition(transition, blank)?;

            table
                .insert(state.clone(), read, action)
                .map_err(|e| parse_error(&e.to_string(), span))?;
        }
    }

    Ok((table, first_state))
}

/// Parses a single rule from a `Pair<Rule::transition>`.
///
/// If `write` is omitted, the rule writes back the symbol it read.
fn parse_transition(pair: Pair<Rule>, blank: &Symbol) -> Result<(Symbol, Action), MachineError> {
    let mut read = None;
    let mut write = None;
    let mut direction = None;
    let mut next_state = None;

    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::symbol if read.is_none() => read = Some(parse_symbol(p, blank)?),
            Rule::symbol => write = Some(parse_symbol(p, blank)?),
            Rule::direction => direction = Some(parse_direction(p)?),
            Rule::state => next_state = Some(State::new(parse_token(p)?)),
            _ => {}
        }
    }

    let read = read.ok_or_else(|| MachineError::ValidationError("Rule without symbol".into()))?;
    let direction =
        direction.ok_or_else(|| MachineError::ValidationError("Rule without direction".into()))?;
    let next_state =
        next_state.ok_or_else(|| MachineError::ValidationError("Rule without next state".into()))?;

    Ok((
        read.clone(),
        Action {
            next_state,
            write: write.unwrap_or(read),
            direction,
        },
    ))
}

/// Parses a single direction from a `Pair<Rule::direction>`.
///
/// Supports '<' or 'L' for Left and '>' or 'R' for Right.
fn parse_direction(pair: Pair<Rule>) -> Result<Direction, MachineError> {
    let span = pair.as_span();
    match pair.as_str() {
        "<" | "L" => Ok(Direction::Left),
        ">" | "R" => Ok(Direction::Right),
        _ => Err(parse_error(
            &format!("Unsupported direction: {}", pair.as_str()),
            span,
        )),
    }
}

/// Parses a `Pair<Rule::symbol>`. A bare `_` is the blank symbol; a quoted one is not.
fn parse_symbol(pair: Pair<Rule>, blank: &Symbol) -> Result<Symbol, MachineError> {
    let token = first_inner(pair)?;
    let inner = first_inner(token)?;

    match inner.as_rule() {
        Rule::bare if inner.as_str() == INPUT_BLANK_SYMBOL => Ok(blank.clone()),
        _ => Ok(Symbol::new(inner.as_str())),
    }
}

/// Extracts the text of a `Pair<Rule::state>`, `Pair<Rule::symbol>` or `Pair<Rule::token>`,
/// with surrounding quotes removed.
fn parse_token(pair: Pair<Rule>) -> Result<String, MachineError> {
    let mut pair = pair;
    while matches!(pair.as_rule(), Rule::state | Rule::symbol | Rule::token) {
        pair = first_inner(pair)?;
    }

    Ok(pair.as_str().to_string())
}

/// Extracts the unquoted content of the `Pair<Rule::quoted>` inside `pair`.
fn parse_quoted(pair: Pair<Rule>) -> Result<String, MachineError> {
    let quoted = first_inner(pair)?;
    Ok(first_inner(quoted)?.as_str().to_string())
}

/// Extracts the value of a `Pair<Rule::name>` or `Pair<Rule::input>`: the content of a quoted
/// string as is, or the trimmed free text.
fn parse_line(pair: Pair<Rule>) -> Result<String, MachineError> {
    match pair.into_inner().next() {
        Some(p) if p.as_rule() == Rule::quoted => Ok(first_inner(p)?.as_str().to_string()),
        Some(p) => Ok(p.as_str().trim().to_string()),
        None => Ok(String::new()),
    }
}

/// Returns the first inner pair, or a parse error pointing at `pair`.
fn first_inner(pair: Pair<Rule>) -> Result<Pair<Rule>, MachineError> {
    let span = pair.as_span();
    let rule = pair.as_rule();
    pair.into_inner()
        .next()
        .ok_or_else(|| parse_error(&format!("Expected content in {rule:?}"), span))
}

/// Creates a `MachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> MachineError {
    MachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Checks if a given section has already been declared.
fn check_unique_rule(
    rule: Rule,
    span: Span,
    seen: &mut HashSet<Rule>,
) -> Result<(), MachineError> {
    if rule == Rule::EOI {
        return Ok(());
    }

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{rule:?}:\" declaration"),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required section is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, name: &str) -> Result<T, MachineError> {
    value.ok_or_else(|| MachineError::ValidationError(format!("Missing '{name}' section")))
}
