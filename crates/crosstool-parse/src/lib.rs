//! Parser for the CROSSTOOL protobuf text format.
//!
//! Turns raw file text into a [`crosstool_model::CrosstoolRelease`]. Parse
//! errors carry line/column positions and are surfaced to callers verbatim;
//! this crate performs no semantic validation beyond the field shapes.

pub mod error;
pub mod lexer;
pub mod parser;

pub use error::ParseError;
pub use parser::{load_crosstool, parse_crosstool};
