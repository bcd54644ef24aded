//! Data model for legacy CROSSTOOL toolchain descriptions.
//!
//! These types are a read-only, in-memory view of a parsed CROSSTOOL file.
//! The parser populates them once; the transform engine walks them without
//! mutation. Field and message names follow the legacy schema so a migrated
//! file can be reviewed side by side with its source.

pub mod action;
pub mod feature;
pub mod toolchain;

pub use action::{ActionConfig, Tool};
pub use feature::{
    EnvEntry, EnvSet, Feature, FeatureSet, FlagGroup, FlagGroupBody, FlagSet, VariableWithValue,
    WithFeatureSet,
};
pub use toolchain::{CrosstoolRelease, MakeVariable, ToolPath, ToolchainConfig};
