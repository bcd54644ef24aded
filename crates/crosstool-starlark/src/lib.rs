//! Transformation engine turning a parsed legacy toolchain description into
//! a Starlark rule definition.
//!
//! The entry point is [`transform`]: it validates the toolchain, merges the
//! legacy default features in around the explicit ones, and emits the
//! complete `.bzl` script through a small Starlark value AST. Output is
//! deterministic: the same toolchain always renders byte for byte the same.
//!
//! Fatal conditions surface as [`TransformError`]; recoverable oddities in
//! the input are reproduced as authored and reported as [`Warning`]s.

pub mod action;
pub mod defaults;
pub mod error;
pub mod expr;
pub mod feature;
pub mod flag_group;
pub mod starlark;
pub mod transform;

pub use defaults::DefaultCatalog;
pub use error::{Result, TransformError, Warning};
pub use transform::{transform, transform_with_catalog, TransformOutput};
