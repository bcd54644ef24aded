//! The toolchain root entity and the release container.

use serde::{Deserialize, Serialize};

use crate::action::ActionConfig;
use crate::feature::Feature;

/// A tool-name → filesystem-path binding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPath {
    pub name: String,
    pub path: String,
}

/// A build-system make variable definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeVariable {
    pub name: String,
    pub value: String,
}

/// One complete toolchain description.
///
/// Scalar fields are `Option` because the legacy schema leaves them all
/// optional; the transform decides which absences are fatal
/// (`toolchain_identifier` and `compiler`) and which merely render as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    pub toolchain_identifier: Option<String>,
    pub host_system_name: Option<String>,
    pub target_system_name: Option<String>,
    pub target_cpu: Option<String>,
    pub target_libc: Option<String>,
    pub compiler: Option<String>,
    pub abi_version: Option<String>,
    pub abi_libc_version: Option<String>,
    pub builtin_sysroot: Option<String>,
    pub cc_target_os: Option<String>,
    pub cxx_builtin_include_directories: Vec<String>,
    pub tool_paths: Vec<ToolPath>,
    pub make_variables: Vec<MakeVariable>,
    pub features: Vec<Feature>,
    pub action_configs: Vec<ActionConfig>,
}

impl ToolchainConfig {
    /// The identifier, if present and non-empty.
    pub fn identifier(&self) -> Option<&str> {
        self.toolchain_identifier.as_deref().filter(|s| !s.is_empty())
    }
}

/// The file-level container: release metadata plus one or more toolchains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrosstoolRelease {
    pub major_version: Option<String>,
    pub minor_version: Option<String>,
    pub default_target_cpu: Option<String>,
    pub toolchains: Vec<ToolchainConfig>,
}

impl CrosstoolRelease {
    /// Find a toolchain by its identifier.
    pub fn toolchain_named(&self, identifier: &str) -> Option<&ToolchainConfig> {
        self.toolchains
            .iter()
            .find(|t| t.identifier() == Some(identifier))
    }
}
