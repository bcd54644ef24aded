//! Condition builders: OR-of-AND requirement structures rendered as
//! `feature_set` / `with_feature_set` disjunction lists.
//!
//! The target representation is a list whose elements are conjunction terms;
//! the list as a whole is the disjunction. An empty list is the
//! universally-true condition. Disjunct and conjunct order follows the input
//! exactly so output stays reproducible and diffable.

use crosstool_model::{FeatureSet, WithFeatureSet};

use crate::starlark::{Arg, Value};

/// Render a `requires` condition: each AND-group becomes
/// `feature_set(features = [...])`.
pub fn requires_list(requires: &[FeatureSet]) -> Value {
    Value::List(
        requires
            .iter()
            .map(|group| {
                Value::call(
                    "feature_set",
                    vec![Arg::named("features", Value::str_list(&group.features))],
                )
            })
            .collect(),
    )
}

/// Render a `with_features` condition: each AND-group becomes
/// `with_feature_set(features = [...], not_features = [...])` with both
/// predicate lists rendered explicitly even when empty.
pub fn with_features_list(with_features: &[WithFeatureSet]) -> Value {
    Value::List(
        with_features
            .iter()
            .map(|group| {
                Value::call(
                    "with_feature_set",
                    vec![
                        Arg::named("features", Value::str_list(&group.features)),
                        Arg::named("not_features", Value::str_list(&group.not_features)),
                    ],
                )
            })
            .collect(),
    )
}
