//! Transform orchestrator: one pass over a toolchain, one generated script.

use std::collections::HashSet;

use crosstool_model::ToolchainConfig;

use crate::action::action_config_value;
use crate::defaults::{inject_defaults, DefaultCatalog};
use crate::error::{Result, TransformError, Warning};
use crate::feature::feature_value;
use crate::starlark::{check_balanced, Arg, Value};

/// Symbols the generated script loads from the build system's toolchain
/// config library, in the order they appear in the load statement.
const LOADED_SYMBOLS: &[&str] = &[
    "action_config",
    "env_entry",
    "env_set",
    "feature",
    "feature_set",
    "flag_group",
    "flag_set",
    "make_variable",
    "tool",
    "tool_path",
    "variable_with_value",
    "with_feature_set",
];

/// A successful transform: the complete script plus any non-fatal
/// diagnostics collected along the way.
#[derive(Debug)]
pub struct TransformOutput {
    pub text: String,
    pub warnings: Vec<Warning>,
}

/// Transform one toolchain using the standard legacy default catalog.
pub fn transform(config: &ToolchainConfig) -> Result<TransformOutput> {
    transform_with_catalog(config, &DefaultCatalog::legacy())
}

/// Transform one toolchain against an explicit default-feature catalog.
///
/// Pure function over the immutable input: no I/O, no mutation, and
/// identical input always yields byte-identical output.
pub fn transform_with_catalog(
    config: &ToolchainConfig,
    catalog: &DefaultCatalog,
) -> Result<TransformOutput> {
    let identifier = config
        .identifier()
        .ok_or(TransformError::MissingField {
            field: "toolchain_identifier",
        })?
        .to_string();
    let compiler = config
        .compiler
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(TransformError::MissingField { field: "compiler" })?
        .to_string();

    let mut warnings = Vec::new();
    let features = inject_defaults(catalog, &config.features, &mut warnings);
    validate_references(&features, config)?;

    let feature_values: Vec<Value> = features
        .iter()
        .map(|feature| feature_value(feature, &mut warnings))
        .collect();
    let action_values: Vec<Value> = config
        .action_configs
        .iter()
        .map(|action| action_config_value(action, &mut warnings))
        .collect();
    let tool_path_values: Vec<Value> = config
        .tool_paths
        .iter()
        .map(|tool_path| {
            Value::call(
                "tool_path",
                vec![
                    Arg::named("name", Value::str(&tool_path.name)),
                    Arg::named("path", Value::str(&tool_path.path)),
                ],
            )
        })
        .collect();
    let make_variable_values: Vec<Value> = config
        .make_variables
        .iter()
        .map(|make_variable| {
            Value::call(
                "make_variable",
                vec![
                    Arg::named("name", Value::str(&make_variable.name)),
                    Arg::named("value", Value::str(&make_variable.value)),
                ],
            )
        })
        .collect();

    let create = Value::call(
        "cc_common.create_cc_toolchain_config_info",
        vec![
            Arg::named("ctx", Value::ident("ctx")),
            Arg::named("features", Value::List(feature_values)),
            Arg::named("action_configs", Value::List(action_values)),
            Arg::named(
                "cxx_builtin_include_directories",
                Value::str_list(&config.cxx_builtin_include_directories),
            ),
            Arg::named("toolchain_identifier", Value::str(identifier)),
            Arg::named(
                "host_system_name",
                Value::opt_str(config.host_system_name.as_deref()),
            ),
            Arg::named(
                "target_system_name",
                Value::opt_str(config.target_system_name.as_deref()),
            ),
            Arg::named("target_cpu", Value::opt_str(config.target_cpu.as_deref())),
            Arg::named("target_libc", Value::opt_str(config.target_libc.as_deref())),
            Arg::named("compiler", Value::str(compiler)),
            Arg::named("abi_version", Value::opt_str(config.abi_version.as_deref())),
            Arg::named(
                "abi_libc_version",
                Value::opt_str(config.abi_libc_version.as_deref()),
            ),
            Arg::named("tool_paths", Value::List(tool_path_values)),
            Arg::named("make_variables", Value::List(make_variable_values)),
            Arg::named(
                "builtin_sysroot",
                Value::opt_str(config.builtin_sysroot.as_deref()),
            ),
            Arg::named("cc_target_os", Value::opt_str(config.cc_target_os.as_deref())),
        ],
    );

    let text = assemble_script(&create);
    check_balanced(&text).map_err(|detail| TransformError::UnbalancedOutput { detail })?;
    Ok(TransformOutput { text, warnings })
}

/// Every `requires` and `implies` edge must land on a feature that exists
/// after injection, or on a capability tag some feature provides.
fn validate_references(
    features: &[crosstool_model::Feature],
    config: &ToolchainConfig,
) -> Result<()> {
    let mut known: HashSet<&str> = HashSet::new();
    for feature in features {
        known.insert(feature.name.as_str());
        for tag in &feature.provides {
            known.insert(tag.as_str());
        }
    }

    for feature in features {
        let referrer = || format!("feature '{}'", feature.name);
        for group in &feature.requires {
            for name in &group.features {
                if !known.contains(name.as_str()) {
                    return Err(TransformError::UndeclaredFeature {
                        referrer: referrer(),
                        name: name.clone(),
                    });
                }
            }
        }
        for name in &feature.implies {
            if !known.contains(name.as_str()) {
                return Err(TransformError::UndeclaredFeature {
                    referrer: referrer(),
                    name: name.clone(),
                });
            }
        }
    }
    for action in &config.action_configs {
        for name in &action.implies {
            if !known.contains(name.as_str()) {
                return Err(TransformError::UndeclaredFeature {
                    referrer: format!("action_config '{}'", action.action_name),
                    name: name.clone(),
                });
            }
        }
    }
    Ok(())
}

fn assemble_script(create: &Value) -> String {
    let mut out = String::new();
    out.push_str("load(\n    \"@rules_cc//cc:cc_toolchain_config_lib.bzl\",\n");
    for symbol in LOADED_SYMBOLS {
        out.push_str(&format!("    \"{symbol}\",\n"));
    }
    out.push_str(")\n\ndef _impl(ctx):\n    return ");
    out.push_str(&create.render(1));
    out.push_str("\n\ncc_toolchain_config = rule(\n");
    out.push_str("    implementation = _impl,\n");
    out.push_str("    attrs = {},\n");
    out.push_str("    provides = [CcToolchainConfigInfo],\n");
    out.push_str(")\n");
    out
}
