//! This module defines the `Tape`, a sparse tape that is infinite in both directions.
//! Only cells that were written are stored; every other cell reads as the blank symbol.

use crate::types::Symbol;
use std::collections::HashMap;
use std::fmt;

/// A sparse, bidirectionally infinite tape of symbols addressed by signed position.
#[derive(Debug, Clone, PartialEq)]
pub struct Tape {
    cells: HashMap<i64, Symbol>,
    blank: Symbol,
}

impl Tape {
    /// Creates an empty tape where every cell reads as `blank`.
    pub fn new(blank: Symbol) -> Self {
        Self {
            cells: HashMap::new(),
            blank,
        }
    }

    /// Creates a tape holding `symbols` at positions `0..N`.
    pub fn from_symbols<I>(symbols: I, blank: Symbol) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Symbol>,
    {
        let cells = symbols
            .into_iter()
            .enumerate()
            .map(|(i, symbol)| (i as i64, symbol.into()))
            .collect();

        Self { cells, blank }
    }

    /// Splits `input` on `separator` and places the fields at positions `0..N`.
    ///
    /// An empty input still yields one (empty) field at position 0.
    pub fn parse(input: &str, separator: &str, blank: Symbol) -> Self {
        Self::from_symbols(input.split(separator), blank)
    }

    /// Returns the symbol at `position`, or the blank symbol if the cell was never written.
    pub fn read(&self, position: i64) -> &Symbol {
        self.cells.get(&position).unwrap_or(&self.blank)
    }

    /// Writes `symbol` at `position`, overwriting whatever was there.
    pub fn write(&mut self, position: i64, symbol: Symbol) {
        self.cells.insert(position, symbol);
    }

    /// The blank symbol of this tape.
    pub fn blank(&self) -> &Symbol {
        &self.blank
    }

    /// The number of stored cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The lowest and highest stored positions, if any cell was ever written.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        let min = self.cells.keys().min()?;
        let max = self.cells.keys().max()?;
        Some((*min, *max))
    }

    /// Returns the symbols from the lowest to the highest stored position, inclusive.
    ///
    /// Cells in between that were never written render as the blank symbol. A written blank
    /// is a stored cell like any other and counts toward the range.
    pub fn render(&self) -> Vec<Symbol> {
        match self.bounds() {
            Some((min, max)) => (min..=max).map(|p| self.read(p).clone()).collect(),
            None => Vec::new(),
        }
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbols = self.render();
        for (i, symbol) in symbols.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}
