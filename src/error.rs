// 🚨 Roster Errors - Data contract violations
// Anything here aborts the run: the inputs break an upstream contract

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RosterError {
    /// A row without a usable name (name is the mandatory join key)
    #[error("{roster} roster row {line} has no name")]
    MissingName { roster: &'static str, line: usize },

    /// Two country mapping rows normalize to the same demonym key
    #[error("demonym '{demonym}' is mapped more than once (rows {first_row} and {second_row})")]
    DuplicateDemonym {
        demonym: String,
        first_row: usize,
        second_row: usize,
    },

    /// File extension we don't know how to read
    #[error("unsupported roster format: {0}")]
    UnsupportedFormat(String),
}
