//! Recursive flag-group emitter.
//!
//! Flag groups map onto `flag_group(...)` declarations. None of the guards
//! are resolved at migration time; each becomes an attribute the build system
//! evaluates during flag computation. `%{var}` placeholders in flag literals
//! pass through verbatim for the same reason.
//!
//! The target's `flag_group` accepts a single `expand_if_available` /
//! `expand_if_not_available` variable, while the legacy schema allows lists;
//! surplus variables become wrapper groups nested around the declaration,
//! which conjoins them exactly as the legacy AND semantics require.

use crosstool_model::{FlagGroup, FlagGroupBody};

use crate::error::Warning;
use crate::starlark::{Arg, Value};

/// Render one flag group, recursing into nested sub-groups.
///
/// `context` names the enclosing feature or action config for diagnostics.
pub fn flag_group_value(group: &FlagGroup, context: &str, warnings: &mut Vec<Warning>) -> Value {
    if group.has_contradictory_guards() {
        let variable = group.expand_if_true.as_deref().unwrap_or_default();
        warnings.push(Warning::new(format!(
            "{context}: flag group requires '{variable}' to be both true and false \
             and can never expand; reproduced as authored"
        )));
    }

    let mut args = Vec::new();
    match &group.body {
        FlagGroupBody::Flags(flags) => {
            args.push(Arg::named("flags", Value::str_list(flags)));
        }
        FlagGroupBody::Groups(subgroups) => {
            args.push(Arg::named(
                "flag_groups",
                Value::List(
                    subgroups
                        .iter()
                        .map(|sub| flag_group_value(sub, context, warnings))
                        .collect(),
                ),
            ));
        }
    }

    if let Some(variable) = &group.iterate_over {
        args.push(Arg::named("iterate_over", Value::str(variable)));
    }

    let mut all_available = group.expand_if_all_available.iter();
    if let Some(variable) = all_available.next() {
        args.push(Arg::named("expand_if_available", Value::str(variable)));
    }
    let mut none_available = group.expand_if_none_available.iter();
    if let Some(variable) = none_available.next() {
        args.push(Arg::named("expand_if_not_available", Value::str(variable)));
    }
    if let Some(variable) = &group.expand_if_true {
        args.push(Arg::named("expand_if_true", Value::str(variable)));
    }
    if let Some(variable) = &group.expand_if_false {
        args.push(Arg::named("expand_if_false", Value::str(variable)));
    }
    if let Some(equal) = &group.expand_if_equal {
        args.push(Arg::named(
            "expand_if_equal",
            Value::call(
                "variable_with_value",
                vec![
                    Arg::named("name", Value::str(&equal.variable)),
                    Arg::named("value", Value::str(&equal.value)),
                ],
            ),
        ));
    }

    let mut value = Value::call("flag_group", args);

    // Surplus guard variables wrap the declaration, innermost first.
    for variable in all_available {
        value = wrap_with_guard(value, "expand_if_available", variable);
    }
    for variable in none_available {
        value = wrap_with_guard(value, "expand_if_not_available", variable);
    }
    value
}

fn wrap_with_guard(inner: Value, guard: &str, variable: &str) -> Value {
    Value::call(
        "flag_group",
        vec![
            Arg::named("flag_groups", Value::List(vec![inner])),
            Arg::named(guard, Value::str(variable)),
        ],
    )
}
