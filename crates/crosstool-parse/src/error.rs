//! Parse errors.

use std::io;

use thiserror::Error;

/// Errors that can occur while reading or parsing a CROSSTOOL file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{line}:{column}: unexpected character '{found}'")]
    UnexpectedCharacter {
        line: usize,
        column: usize,
        found: char,
    },

    #[error("{line}:{column}: unterminated string literal")]
    UnterminatedString { line: usize, column: usize },

    #[error("{line}:{column}: invalid escape sequence '\\{escape}'")]
    InvalidEscape {
        line: usize,
        column: usize,
        escape: char,
    },

    #[error("{line}:{column}: expected {expected}, found {found}")]
    Expected {
        line: usize,
        column: usize,
        expected: &'static str,
        found: String,
    },

    #[error("{line}:{column}: expected boolean, found '{found}'")]
    InvalidBool {
        line: usize,
        column: usize,
        found: String,
    },

    #[error("{line}:{column}: flag_group mixes 'flag' and nested 'flag_group' entries")]
    MixedFlagGroupBody { line: usize, column: usize },

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ParseError>;
