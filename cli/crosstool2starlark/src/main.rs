//! crosstool2starlark CLI — converts a legacy CROSSTOOL file into a Starlark
//! rule definition.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use clap::Parser;

use crosstool_model::{CrosstoolRelease, ToolchainConfig};

#[derive(Parser)]
#[command(
    name = "crosstool2starlark",
    version,
    about = "Migrate legacy CROSSTOOL toolchain definitions to Starlark rules"
)]
struct Cli {
    /// Path to the CROSSTOOL file to convert
    #[arg(long)]
    crosstool: PathBuf,
    /// Where to write the generated .bzl file
    #[arg(long, required_unless_present = "dump_model")]
    output: Option<PathBuf>,
    /// Toolchain identifier to convert (required when the file declares
    /// more than one toolchain)
    #[arg(long)]
    toolchain: Option<String>,
    /// Print the selected toolchain as JSON instead of generating Starlark
    #[arg(long)]
    dump_model: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let release = crosstool_parse::load_crosstool(&cli.crosstool)
        .with_context(|| format!("failed to read {}", cli.crosstool.display()))?;
    let toolchain = select_toolchain(&release, cli.toolchain.as_deref())?;

    if cli.dump_model {
        println!("{}", serde_json::to_string_pretty(toolchain)?);
        return Ok(());
    }

    let result = crosstool_starlark::transform(toolchain)
        .with_context(|| format!("failed to convert {}", cli.crosstool.display()))?;
    for warning in &result.warnings {
        eprintln!("{warning}");
    }

    let output = cli.output.as_deref().context("--output is required")?;
    write_atomic(output, &result.text)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("wrote {}", output.display());
    Ok(())
}

/// Pick the toolchain to convert. With `--toolchain` the identifier must
/// match; without it the file must declare exactly one toolchain.
fn select_toolchain<'a>(
    release: &'a CrosstoolRelease,
    requested: Option<&str>,
) -> anyhow::Result<&'a ToolchainConfig> {
    match requested {
        Some(identifier) => release.toolchain_named(identifier).with_context(|| {
            format!(
                "no toolchain '{identifier}' in file (available: {})",
                available(release)
            )
        }),
        None => match release.toolchains.as_slice() {
            [] => anyhow::bail!("the CROSSTOOL file declares no toolchains"),
            [only] => Ok(only),
            many => anyhow::bail!(
                "the CROSSTOOL file declares {} toolchains; select one with \
                 --toolchain (available: {})",
                many.len(),
                available(release)
            ),
        },
    }
}

fn available(release: &CrosstoolRelease) -> String {
    release
        .toolchains
        .iter()
        .filter_map(ToolchainConfig::identifier)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Write through a sibling temp file and rename, so a failed run never
/// leaves a truncated .bzl behind.
fn write_atomic(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    const CROSSTOOL: &str = r#"
major_version: "local"
minor_version: ""
default_target_cpu: "k8"

toolchain {
  toolchain_identifier: "k8"
  host_system_name: "local"
  target_system_name: "local"
  target_cpu: "k8"
  target_libc: "glibc"
  compiler: "gcc"
  abi_version: "local"
  abi_libc_version: "local"
  tool_path { name: "gcc" path: "/usr/bin/gcc" }
  tool_path { name: "ld" path: "/usr/bin/ld" }
  cxx_builtin_include_directory: "/usr/include"
  feature {
    name: "opt"
    flag_set {
      action: "c-compile"
      action: "c++-compile"
      flag_group {
        flag: "-O2"
        flag: "-DNDEBUG"
      }
    }
  }
}
"#;

    fn cli(crosstool: &Path, output: Option<&Path>) -> Cli {
        Cli {
            crosstool: crosstool.to_path_buf(),
            output: output.map(Path::to_path_buf),
            toolchain: None,
            dump_model: false,
        }
    }

    #[test]
    fn converts_single_toolchain_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("CROSSTOOL");
        let output = dir.path().join("cc_toolchain_config.bzl");
        fs::write(&input, CROSSTOOL).unwrap();

        run(cli(&input, Some(&output))).unwrap();

        let text = fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("load(\n"));
        assert!(text.contains(r#"toolchain_identifier = "k8""#));
        assert!(text.contains(r#"flags = ["-O2", "-DNDEBUG"]"#));
        assert!(text.contains("cc_toolchain_config = rule("));
        // The temp file was renamed away.
        assert!(!dir.path().join("cc_toolchain_config.bzl.tmp").exists());
    }

    #[test]
    fn conversion_is_reproducible() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("CROSSTOOL");
        fs::write(&input, CROSSTOOL).unwrap();

        let first = dir.path().join("first.bzl");
        let second = dir.path().join("second.bzl");
        run(cli(&input, Some(&first))).unwrap();
        run(cli(&input, Some(&second))).unwrap();
        assert_eq!(
            fs::read_to_string(&first).unwrap(),
            fs::read_to_string(&second).unwrap()
        );
    }

    #[test]
    fn multiple_toolchains_require_selection() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("CROSSTOOL");
        let output = dir.path().join("out.bzl");
        let two = format!(
            "{CROSSTOOL}\ntoolchain {{ toolchain_identifier: \"armeabi-v7a\" compiler: \"gcc\" }}\n"
        );
        fs::write(&input, two).unwrap();

        let err = run(cli(&input, Some(&output))).unwrap_err();
        assert!(err.to_string().contains("--toolchain"));
        assert!(!output.exists());

        let mut selected = cli(&input, Some(&output));
        selected.toolchain = Some("armeabi-v7a".into());
        run(selected).unwrap();
        assert!(fs::read_to_string(&output)
            .unwrap()
            .contains(r#"toolchain_identifier = "armeabi-v7a""#));
    }

    #[test]
    fn unknown_toolchain_lists_available() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("CROSSTOOL");
        fs::write(&input, CROSSTOOL).unwrap();

        let mut args = cli(&input, Some(&dir.path().join("out.bzl")));
        args.toolchain = Some("ppc".into());
        let err = run(args).unwrap_err();
        assert!(err.to_string().contains("'ppc'"));
        assert!(err.to_string().contains("k8"));
    }

    #[test]
    fn invalid_toolchain_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("CROSSTOOL");
        let output = dir.path().join("out.bzl");
        // No compiler field: conversion must fail before any write.
        fs::write(
            &input,
            "toolchain { toolchain_identifier: \"k8\" }\n",
        )
        .unwrap();

        assert!(run(cli(&input, Some(&output))).is_err());
        assert!(!output.exists());
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("CROSSTOOL");
        fs::write(&input, "toolchain { feature { name: \"broken\" ").unwrap();

        let err = run(cli(&input, Some(&dir.path().join("out.bzl")))).unwrap_err();
        assert!(format!("{err:#}").contains("CROSSTOOL"));
    }

    #[test]
    fn dump_model_needs_no_output_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("CROSSTOOL");
        fs::write(&input, CROSSTOOL).unwrap();

        let mut args = cli(&input, None);
        args.dump_model = true;
        run(args).unwrap();
    }

    #[test]
    fn output_lands_in_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("CROSSTOOL");
        fs::write(&input, CROSSTOOL).unwrap();

        let output = dir.path().join("generated/toolchain/config.bzl");
        run(cli(&input, Some(&output))).unwrap();
        assert!(output.is_file());
    }

    #[test]
    fn cli_arguments_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
