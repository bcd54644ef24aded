//! Feature emitter: features, flag sets, and env sets.

use crosstool_model::{EnvSet, Feature, FlagSet};

use crate::error::Warning;
use crate::expr::{requires_list, with_features_list};
use crate::flag_group::flag_group_value;
use crate::starlark::{Arg, Value};

/// Render one `flag_set(...)` declaration.
pub fn flag_set_value(flag_set: &FlagSet, context: &str, warnings: &mut Vec<Warning>) -> Value {
    Value::call(
        "flag_set",
        vec![
            Arg::named("actions", Value::str_list(&flag_set.actions)),
            Arg::named("with_features", with_features_list(&flag_set.with_features)),
            Arg::named(
                "flag_groups",
                Value::List(
                    flag_set
                        .flag_groups
                        .iter()
                        .map(|group| flag_group_value(group, context, warnings))
                        .collect(),
                ),
            ),
        ],
    )
}

/// Render one `env_set(...)` declaration.
pub fn env_set_value(env_set: &EnvSet) -> Value {
    Value::call(
        "env_set",
        vec![
            Arg::named("actions", Value::str_list(&env_set.actions)),
            Arg::named(
                "env_entries",
                Value::List(
                    env_set
                        .env_entries
                        .iter()
                        .map(|entry| {
                            Value::call(
                                "env_entry",
                                vec![
                                    Arg::named("key", Value::str(&entry.key)),
                                    Arg::named("value", Value::str(&entry.value)),
                                ],
                            )
                        })
                        .collect(),
                ),
            ),
            Arg::named("with_features", with_features_list(&env_set.with_features)),
        ],
    )
}

/// Render one `feature(...)` declaration.
///
/// `implies` stays a plain ordered list of names: transitive activation is
/// the consumer's job, never recomputed here. Flag-set and env-set order is
/// preserved exactly; reordering would change observable flag ordering in
/// final compiler invocations.
pub fn feature_value(feature: &Feature, warnings: &mut Vec<Warning>) -> Value {
    let context = format!("feature '{}'", feature.name);
    Value::call(
        "feature",
        vec![
            Arg::named("name", Value::str(&feature.name)),
            Arg::named("enabled", Value::Bool(feature.enabled)),
            Arg::named(
                "flag_sets",
                Value::List(
                    feature
                        .flag_sets
                        .iter()
                        .map(|flag_set| flag_set_value(flag_set, &context, warnings))
                        .collect(),
                ),
            ),
            Arg::named(
                "env_sets",
                Value::List(feature.env_sets.iter().map(env_set_value).collect()),
            ),
            Arg::named("requires", requires_list(&feature.requires)),
            Arg::named("implies", Value::str_list(&feature.implies)),
            Arg::named("provides", Value::str_list(&feature.provides)),
        ],
    )
}
