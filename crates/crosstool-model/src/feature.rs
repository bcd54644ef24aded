//! Features, flag sets, and the recursive flag-group structure.

use serde::{Deserialize, Serialize};

/// One AND-group of a `requires` condition: every named feature must be
/// active for the group to be satisfied. A feature's `requires` is an
/// OR over its groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub features: Vec<String>,
}

/// One AND-group of a `with_features` condition. The group is satisfied when
/// every name in `features` is active and none in `not_features` is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithFeatureSet {
    pub features: Vec<String>,
    pub not_features: Vec<String>,
}

/// An `expand_if_equal` guard: the group expands only when the build
/// variable holds exactly this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableWithValue {
    pub variable: String,
    pub value: String,
}

/// The body of a flag group. The legacy schema makes flat flags and nested
/// sub-groups mutually exclusive, so the model enforces that with a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagGroupBody {
    /// Ordered flag literals; `%{var}` placeholders are preserved verbatim.
    Flags(Vec<String>),
    /// Nested sub-groups, recursing to arbitrary depth.
    Groups(Vec<FlagGroup>),
}

/// A (possibly iterated, possibly guarded) group of flags.
///
/// Guards are orthogonal to the body: any combination of `iterate_over` and
/// `expand_if_*` attributes may decorate either body variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagGroup {
    pub body: FlagGroupBody,
    pub iterate_over: Option<String>,
    pub expand_if_all_available: Vec<String>,
    pub expand_if_none_available: Vec<String>,
    pub expand_if_true: Option<String>,
    pub expand_if_false: Option<String>,
    pub expand_if_equal: Option<VariableWithValue>,
}

impl FlagGroup {
    /// An unguarded group of flat flags.
    pub fn flags<I, S>(flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FlagGroup {
            body: FlagGroupBody::Flags(flags.into_iter().map(Into::into).collect()),
            iterate_over: None,
            expand_if_all_available: Vec::new(),
            expand_if_none_available: Vec::new(),
            expand_if_true: None,
            expand_if_false: None,
            expand_if_equal: None,
        }
    }

    /// An unguarded group wrapping nested sub-groups.
    pub fn groups(groups: Vec<FlagGroup>) -> Self {
        FlagGroup {
            body: FlagGroupBody::Groups(groups),
            iterate_over: None,
            expand_if_all_available: Vec::new(),
            expand_if_none_available: Vec::new(),
            expand_if_true: None,
            expand_if_false: None,
            expand_if_equal: None,
        }
    }

    /// Whether the group carries `expand_if_true` and `expand_if_false`
    /// guards naming the same variable. Such a group can never expand; the
    /// transform reproduces it as authored but reports a diagnostic.
    pub fn has_contradictory_guards(&self) -> bool {
        match (&self.expand_if_true, &self.expand_if_false) {
            (Some(t), Some(f)) => t == f,
            _ => false,
        }
    }
}

/// An ordered collection of flag groups scoped to build actions, optionally
/// gated by a `with_features` condition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagSet {
    pub actions: Vec<String>,
    pub with_features: Vec<WithFeatureSet>,
    pub flag_groups: Vec<FlagGroup>,
}

/// One environment variable assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
}

/// Environment variables applied to the given actions, optionally gated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvSet {
    pub actions: Vec<String>,
    pub env_entries: Vec<EnvEntry>,
    pub with_features: Vec<WithFeatureSet>,
}

/// A named, independently toggleable unit of toolchain behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub enabled: bool,
    /// Capability tags this feature provides (conflict detection downstream).
    pub provides: Vec<String>,
    /// OR-of-AND activation requirement over other feature names.
    pub requires: Vec<FeatureSet>,
    /// Features activated transitively when this one activates.
    pub implies: Vec<String>,
    pub flag_sets: Vec<FlagSet>,
    pub env_sets: Vec<EnvSet>,
}

impl Feature {
    /// A named feature with no flags and everything else defaulted.
    pub fn named(name: impl Into<String>) -> Self {
        Feature {
            name: name.into(),
            ..Feature::default()
        }
    }
}
