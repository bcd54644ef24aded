//! Action-config emitter.

use crosstool_model::{ActionConfig, Tool};

use crate::error::Warning;
use crate::expr::with_features_list;
use crate::feature::flag_set_value;
use crate::starlark::{Arg, Value};

fn tool_value(tool: &Tool) -> Value {
    Value::call(
        "tool",
        vec![
            Arg::named("path", Value::str(&tool.path)),
            Arg::named("with_features", with_features_list(&tool.with_features)),
        ],
    )
}

/// Render one `action_config(...)` declaration.
///
/// Tools are a priority list: the build system picks the first whose
/// condition holds. Their order is reproduced verbatim; no selection happens
/// here. The trailing flag sets apply to the action regardless of which tool
/// wins.
pub fn action_config_value(action: &ActionConfig, warnings: &mut Vec<Warning>) -> Value {
    let context = format!("action_config '{}'", action.action_name);
    Value::call(
        "action_config",
        vec![
            Arg::named("action_name", Value::str(&action.action_name)),
            Arg::named("enabled", Value::Bool(action.enabled)),
            Arg::named(
                "tools",
                Value::List(action.tools.iter().map(tool_value).collect()),
            ),
            Arg::named(
                "flag_sets",
                Value::List(
                    action
                        .flag_sets
                        .iter()
                        .map(|flag_set| flag_set_value(flag_set, &context, warnings))
                        .collect(),
                ),
            ),
            Arg::named("implies", Value::str_list(&action.implies)),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crosstool_model::{FlagGroup, FlagSet, WithFeatureSet};

    #[test]
    fn tool_priority_order_is_verbatim() {
        let mut warnings = Vec::new();
        let action = ActionConfig {
            action_name: "c++-link-executable".into(),
            enabled: true,
            tools: vec![
                Tool {
                    path: "/usr/bin/gold".into(),
                    with_features: vec![WithFeatureSet {
                        features: vec!["gold".into()],
                        not_features: vec![],
                    }],
                },
                Tool {
                    path: "/usr/bin/ld".into(),
                    with_features: vec![],
                },
            ],
            implies: vec![],
            flag_sets: vec![],
        };
        let text = action_config_value(&action, &mut warnings).render(0);
        let gold = text.find("/usr/bin/gold").unwrap();
        let ld = text.find("/usr/bin/ld").unwrap();
        assert!(gold < ld);
        // The unconditional fallback still renders its (empty) condition.
        assert!(text.contains(r#"tool(path = "/usr/bin/ld", with_features = [])"#));
    }

    #[test]
    fn action_flag_sets_follow_tools() {
        let mut warnings = Vec::new();
        let action = ActionConfig {
            action_name: "assemble".into(),
            enabled: false,
            tools: vec![Tool {
                path: "/usr/bin/as".into(),
                with_features: vec![],
            }],
            implies: vec!["dependency_file".into()],
            flag_sets: vec![FlagSet {
                actions: vec![],
                with_features: vec![],
                flag_groups: vec![FlagGroup::flags(["--defsym"])],
            }],
        };
        let text = action_config_value(&action, &mut warnings).render(0);
        assert!(text.contains("enabled = False"));
        assert!(text.contains(r#"implies = ["dependency_file"]"#));
        assert!(text.find("tools = [").unwrap() < text.find("--defsym").unwrap());
    }
}
