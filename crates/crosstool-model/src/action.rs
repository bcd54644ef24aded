//! Action configs: bindings from build actions to tool invocations.

use serde::{Deserialize, Serialize};

use crate::feature::{FlagSet, WithFeatureSet};

/// One candidate tool for an action. Tools form a priority list: the build
/// system selects the first whose condition holds at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub path: String,
    pub with_features: Vec<WithFeatureSet>,
}

/// Binds a build action name to an ordered tool priority list plus flags
/// that apply to the action regardless of which tool is selected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionConfig {
    pub action_name: String,
    pub enabled: bool,
    pub tools: Vec<Tool>,
    pub implies: Vec<String>,
    pub flag_sets: Vec<FlagSet>,
}
