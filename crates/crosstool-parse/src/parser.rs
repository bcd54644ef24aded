//! Recursive-descent parser mapping text-format tokens onto the model.
//!
//! The grammar is the protobuf text format restricted to what CROSSTOOL
//! files use: `name: scalar` fields, `name { ... }` sub-messages (with the
//! optional colon form `name: { ... }`), repeated fields by repetition, and
//! adjacent string literals concatenating into one value. Unknown fields are
//! skipped with their full value so inputs written against newer schema
//! revisions still parse.

use crosstool_model::{
    ActionConfig, CrosstoolRelease, EnvEntry, EnvSet, Feature, FeatureSet, FlagGroup,
    FlagGroupBody, FlagSet, MakeVariable, Tool, ToolPath, ToolchainConfig, VariableWithValue,
    WithFeatureSet,
};

use crate::error::{ParseError, Result};
use crate::lexer::{tokenize, Token, TokenKind};

/// Parse a complete CROSSTOOL release file.
pub fn parse_crosstool(input: &str) -> Result<CrosstoolRelease> {
    let tokens = tokenize(input)?;
    Parser { tokens, pos: 0 }.parse_release()
}

/// Read and parse a CROSSTOOL file from disk.
pub fn load_crosstool(path: &std::path::Path) -> Result<CrosstoolRelease> {
    let content = std::fs::read_to_string(path)?;
    parse_crosstool(&content)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Result<Token> {
        let token = self.tokens.get(self.pos).cloned().ok_or(ParseError::UnexpectedEof)?;
        self.pos += 1;
        Ok(token)
    }

    fn expected(&self, expected: &'static str, found: &Token) -> ParseError {
        ParseError::Expected {
            line: found.line,
            column: found.column,
            expected,
            found: found.describe(),
        }
    }

    /// Consume the field name that starts a field, or None at end of the
    /// enclosing message.
    fn next_field_name(&mut self) -> Result<Option<(String, usize, usize)>> {
        match self.peek() {
            None | Some(Token { kind: TokenKind::RBrace, .. }) => Ok(None),
            _ => {
                let token = self.advance()?;
                match token.kind {
                    TokenKind::Ident(name) => Ok(Some((name, token.line, token.column))),
                    _ => Err(self.expected("field name", &token)),
                }
            }
        }
    }

    /// `: "literal"` with adjacent-string concatenation.
    fn string_value(&mut self) -> Result<String> {
        self.expect_colon()?;
        let token = self.advance()?;
        let mut value = match token.kind {
            TokenKind::Str(s) => s,
            _ => return Err(self.expected("string literal", &token)),
        };
        while let Some(Token { kind: TokenKind::Str(_), .. }) = self.peek() {
            if let TokenKind::Str(s) = self.advance()?.kind {
                value.push_str(&s);
            }
        }
        Ok(value)
    }

    /// `: true` / `: false` (the numeric forms `1`/`0` also appear in the wild).
    fn bool_value(&mut self) -> Result<bool> {
        self.expect_colon()?;
        let token = self.advance()?;
        let word = match &token.kind {
            TokenKind::Ident(w) => w.as_str(),
            TokenKind::Str(s) => s.as_str(),
            _ => return Err(self.expected("boolean", &token)),
        };
        match word {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(ParseError::InvalidBool {
                line: token.line,
                column: token.column,
                found: other.to_string(),
            }),
        }
    }

    fn expect_colon(&mut self) -> Result<()> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::Colon => Ok(()),
            _ => Err(self.expected("':'", &token)),
        }
    }

    /// Enter a sub-message: `{` or `: {`.
    fn open_message(&mut self) -> Result<()> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::LBrace => Ok(()),
            TokenKind::Colon => {
                let token = self.advance()?;
                match token.kind {
                    TokenKind::LBrace => Ok(()),
                    _ => Err(self.expected("'{'", &token)),
                }
            }
            _ => Err(self.expected("'{'", &token)),
        }
    }

    fn close_message(&mut self) -> Result<()> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::RBrace => Ok(()),
            _ => Err(self.expected("'}'", &token)),
        }
    }

    /// Skip the value of an unrecognized field, whatever its shape.
    fn skip_value(&mut self) -> Result<()> {
        let token = self.advance()?;
        match token.kind {
            TokenKind::LBrace => self.skip_balanced(),
            TokenKind::Colon => {
                let token = self.advance()?;
                match token.kind {
                    TokenKind::LBrace => self.skip_balanced(),
                    TokenKind::Str(_) => {
                        while let Some(Token { kind: TokenKind::Str(_), .. }) = self.peek() {
                            self.advance()?;
                        }
                        Ok(())
                    }
                    TokenKind::Ident(_) => Ok(()),
                    _ => Err(self.expected("field value", &token)),
                }
            }
            _ => Err(self.expected("':' or '{'", &token)),
        }
    }

    /// Consume tokens until the brace depth returns to zero. The opening
    /// brace has already been consumed.
    fn skip_balanced(&mut self) -> Result<()> {
        let mut depth = 1usize;
        while depth > 0 {
            let token = self.advance()?;
            match token.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    fn parse_release(&mut self) -> Result<CrosstoolRelease> {
        let mut release = CrosstoolRelease::default();
        while let Some((name, _, _)) = self.next_field_name()? {
            match name.as_str() {
                "major_version" => release.major_version = Some(self.string_value()?),
                "minor_version" => release.minor_version = Some(self.string_value()?),
                "default_target_cpu" => release.default_target_cpu = Some(self.string_value()?),
                "toolchain" => {
                    self.open_message()?;
                    release.toolchains.push(self.parse_toolchain()?);
                }
                _ => self.skip_value()?,
            }
        }
        Ok(release)
    }

    fn parse_toolchain(&mut self) -> Result<ToolchainConfig> {
        let mut toolchain = ToolchainConfig::default();
        while let Some((name, _, _)) = self.next_field_name()? {
            match name.as_str() {
                "toolchain_identifier" => {
                    toolchain.toolchain_identifier = Some(self.string_value()?)
                }
                "host_system_name" => toolchain.host_system_name = Some(self.string_value()?),
                "target_system_name" => toolchain.target_system_name = Some(self.string_value()?),
                "target_cpu" => toolchain.target_cpu = Some(self.string_value()?),
                "target_libc" => toolchain.target_libc = Some(self.string_value()?),
                "compiler" => toolchain.compiler = Some(self.string_value()?),
                "abi_version" => toolchain.abi_version = Some(self.string_value()?),
                "abi_libc_version" => toolchain.abi_libc_version = Some(self.string_value()?),
                "builtin_sysroot" => toolchain.builtin_sysroot = Some(self.string_value()?),
                "cc_target_os" => toolchain.cc_target_os = Some(self.string_value()?),
                "cxx_builtin_include_directory" => toolchain
                    .cxx_builtin_include_directories
                    .push(self.string_value()?),
                "tool_path" => {
                    self.open_message()?;
                    toolchain.tool_paths.push(self.parse_tool_path()?);
                }
                "make_variable" => {
                    self.open_message()?;
                    toolchain.make_variables.push(self.parse_make_variable()?);
                }
                "feature" => {
                    self.open_message()?;
                    toolchain.features.push(self.parse_feature()?);
                }
                "action_config" => {
                    self.open_message()?;
                    toolchain.action_configs.push(self.parse_action_config()?);
                }
                _ => self.skip_value()?,
            }
        }
        self.close_message()?;
        Ok(toolchain)
    }

    fn parse_tool_path(&mut self) -> Result<ToolPath> {
        let mut tool_path = ToolPath::default();
        while let Some((name, _, _)) = self.next_field_name()? {
            match name.as_str() {
                "name" => tool_path.name = self.string_value()?,
                "path" => tool_path.path = self.string_value()?,
                _ => self.skip_value()?,
            }
        }
        self.close_message()?;
        Ok(tool_path)
    }

    fn parse_make_variable(&mut self) -> Result<MakeVariable> {
        let mut make_variable = MakeVariable::default();
        while let Some((name, _, _)) = self.next_field_name()? {
            match name.as_str() {
                "name" => make_variable.name = self.string_value()?,
                "value" => make_variable.value = self.string_value()?,
                _ => self.skip_value()?,
            }
        }
        self.close_message()?;
        Ok(make_variable)
    }

    fn parse_feature(&mut self) -> Result<Feature> {
        let mut feature = Feature::default();
        while let Some((name, _, _)) = self.next_field_name()? {
            match name.as_str() {
                "name" => feature.name = self.string_value()?,
                "enabled" => feature.enabled = self.bool_value()?,
                "provides" => feature.provides.push(self.string_value()?),
                "implies" => feature.implies.push(self.string_value()?),
                "requires" => {
                    self.open_message()?;
                    feature.requires.push(self.parse_feature_set()?);
                }
                "flag_set" => {
                    self.open_message()?;
                    feature.flag_sets.push(self.parse_flag_set()?);
                }
                "env_set" => {
                    self.open_message()?;
                    feature.env_sets.push(self.parse_env_set()?);
                }
                _ => self.skip_value()?,
            }
        }
        self.close_message()?;
        Ok(feature)
    }

    fn parse_feature_set(&mut self) -> Result<FeatureSet> {
        let mut features = Vec::new();
        while let Some((name, _, _)) = self.next_field_name()? {
            match name.as_str() {
                "feature" => features.push(self.string_value()?),
                _ => self.skip_value()?,
            }
        }
        self.close_message()?;
        Ok(FeatureSet { features })
    }

    fn parse_with_feature_set(&mut self) -> Result<WithFeatureSet> {
        let mut with = WithFeatureSet::default();
        while let Some((name, _, _)) = self.next_field_name()? {
            match name.as_str() {
                "feature" => with.features.push(self.string_value()?),
                "not_feature" => with.not_features.push(self.string_value()?),
                _ => self.skip_value()?,
            }
        }
        self.close_message()?;
        Ok(with)
    }

    fn parse_flag_set(&mut self) -> Result<FlagSet> {
        let mut flag_set = FlagSet::default();
        // expand_if_all_available was legal on flag_set in older schema
        // revisions; its variables distribute onto every flag group.
        let mut set_level_expand = Vec::new();
        while let Some((name, _, _)) = self.next_field_name()? {
            match name.as_str() {
                "action" => flag_set.actions.push(self.string_value()?),
                "expand_if_all_available" => set_level_expand.push(self.string_value()?),
                "with_feature" => {
                    self.open_message()?;
                    flag_set.with_features.push(self.parse_with_feature_set()?);
                }
                "flag_group" => {
                    self.open_message()?;
                    flag_set.flag_groups.push(self.parse_flag_group()?);
                }
                _ => self.skip_value()?,
            }
        }
        self.close_message()?;
        if !set_level_expand.is_empty() {
            for group in &mut flag_set.flag_groups {
                group
                    .expand_if_all_available
                    .extend(set_level_expand.iter().cloned());
            }
        }
        Ok(flag_set)
    }

    fn parse_flag_group(&mut self) -> Result<FlagGroup> {
        let mut group = FlagGroup::flags(Vec::<String>::new());
        let mut flags: Vec<String> = Vec::new();
        let mut subgroups: Vec<FlagGroup> = Vec::new();
        let mut body_conflict: Option<(usize, usize)> = None;
        while let Some((name, line, column)) = self.next_field_name()? {
            match name.as_str() {
                "flag" => {
                    if !subgroups.is_empty() {
                        body_conflict = Some((line, column));
                    }
                    flags.push(self.string_value()?);
                }
                "flag_group" => {
                    if !flags.is_empty() {
                        body_conflict = Some((line, column));
                    }
                    self.open_message()?;
                    subgroups.push(self.parse_flag_group()?);
                }
                "iterate_over" => group.iterate_over = Some(self.string_value()?),
                "expand_if_all_available" => {
                    group.expand_if_all_available.push(self.string_value()?)
                }
                "expand_if_none_available" => {
                    group.expand_if_none_available.push(self.string_value()?)
                }
                "expand_if_true" => group.expand_if_true = Some(self.string_value()?),
                "expand_if_false" => group.expand_if_false = Some(self.string_value()?),
                "expand_if_equal" => {
                    self.open_message()?;
                    group.expand_if_equal = Some(self.parse_variable_with_value()?);
                }
                _ => self.skip_value()?,
            }
        }
        self.close_message()?;
        if let Some((line, column)) = body_conflict {
            return Err(ParseError::MixedFlagGroupBody { line, column });
        }
        group.body = if subgroups.is_empty() {
            FlagGroupBody::Flags(flags)
        } else {
            FlagGroupBody::Groups(subgroups)
        };
        Ok(group)
    }

    fn parse_variable_with_value(&mut self) -> Result<VariableWithValue> {
        let mut variable = String::new();
        let mut value = String::new();
        while let Some((name, _, _)) = self.next_field_name()? {
            match name.as_str() {
                "variable" => variable = self.string_value()?,
                "value" => value = self.string_value()?,
                _ => self.skip_value()?,
            }
        }
        self.close_message()?;
        Ok(VariableWithValue { variable, value })
    }

    fn parse_env_set(&mut self) -> Result<EnvSet> {
        let mut env_set = EnvSet::default();
        while let Some((name, _, _)) = self.next_field_name()? {
            match name.as_str() {
                "action" => env_set.actions.push(self.string_value()?),
                "env_entry" => {
                    self.open_message()?;
                    env_set.env_entries.push(self.parse_env_entry()?);
                }
                "with_feature" => {
                    self.open_message()?;
                    env_set.with_features.push(self.parse_with_feature_set()?);
                }
                _ => self.skip_value()?,
            }
        }
        self.close_message()?;
        Ok(env_set)
    }

    fn parse_env_entry(&mut self) -> Result<EnvEntry> {
        let mut key = String::new();
        let mut value = String::new();
        while let Some((name, _, _)) = self.next_field_name()? {
            match name.as_str() {
                "key" => key = self.string_value()?,
                "value" => value = self.string_value()?,
                _ => self.skip_value()?,
            }
        }
        self.close_message()?;
        Ok(EnvEntry { key, value })
    }

    fn parse_action_config(&mut self) -> Result<ActionConfig> {
        let mut action_config = ActionConfig::default();
        while let Some((name, _, _)) = self.next_field_name()? {
            match name.as_str() {
                "action_name" => action_config.action_name = self.string_value()?,
                "enabled" => action_config.enabled = self.bool_value()?,
                "implies" => action_config.implies.push(self.string_value()?),
                "tool" => {
                    self.open_message()?;
                    action_config.tools.push(self.parse_tool()?);
                }
                "flag_set" => {
                    self.open_message()?;
                    action_config.flag_sets.push(self.parse_flag_set()?);
                }
                _ => self.skip_value()?,
            }
        }
        self.close_message()?;
        Ok(action_config)
    }

    fn parse_tool(&mut self) -> Result<Tool> {
        let mut tool = Tool::default();
        while let Some((name, _, _)) = self.next_field_name()? {
            match name.as_str() {
                "tool_path" => tool.path = self.string_value()?,
                "with_feature" => {
                    self.open_message()?;
                    tool.with_features.push(self.parse_with_feature_set()?);
                }
                _ => self.skip_value()?,
            }
        }
        self.close_message()?;
        Ok(tool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
major_version: "local"
minor_version: ""
toolchain {
  toolchain_identifier: "k8"
  host_system_name: "local"
  target_system_name: "local"
  target_cpu: "k8"
  target_libc: "local"
  compiler: "gcc"
  abi_version: "local"
  abi_libc_version: "local"
  cxx_builtin_include_directory: "/usr/lib/gcc/"
  cxx_builtin_include_directory: "/usr/include"
  tool_path { name: "gcc" path: "/usr/bin/gcc" }
  tool_path { name: "ld" path: "/usr/bin/ld" }
  make_variable { name: "STACK_FRAME_UNLIMITED" value: "-Wframe-larger-than=100000000" }
  feature {
    name: "opt"
    enabled: true
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

    #[test]
    fn parses_minimal_release() {
        let release = parse_crosstool(MINIMAL).unwrap();
        assert_eq!(release.major_version.as_deref(), Some("local"));
        assert_eq!(release.toolchains.len(), 1);
        let toolchain = &release.toolchains[0];
        assert_eq!(toolchain.identifier(), Some("k8"));
        assert_eq!(toolchain.compiler.as_deref(), Some("gcc"));
        assert_eq!(toolchain.cxx_builtin_include_directories.len(), 2);
        assert_eq!(toolchain.tool_paths[1].name, "ld");
        assert_eq!(toolchain.make_variables[0].name, "STACK_FRAME_UNLIMITED");
        let feature = &toolchain.features[0];
        assert_eq!(feature.name, "opt");
        assert!(feature.enabled);
        assert_eq!(
            feature.flag_sets[0].actions,
            vec!["c-compile".to_string(), "c++-compile".to_string()]
        );
        assert_eq!(
            feature.flag_sets[0].flag_groups[0].body,
            FlagGroupBody::Flags(vec!["-O2".into(), "-DNDEBUG".into()])
        );
    }

    #[test]
    fn parses_nested_flag_groups_with_guards() {
        let input = r#"
toolchain {
  feature {
    name: "libraries"
    flag_set {
      action: "c++-link-executable"
      flag_group {
        iterate_over: "libraries_to_link"
        expand_if_all_available: "libraries_to_link"
        flag_group {
          expand_if_true: "libraries_to_link.is_whole_archive"
          flag: "-Wl,-whole-archive"
        }
        flag_group {
          expand_if_equal {
            variable: "libraries_to_link.type"
            value: "object_file"
          }
          flag: "%{libraries_to_link.name}"
        }
      }
    }
  }
}
"#;
        let release = parse_crosstool(input).unwrap();
        let group = &release.toolchains[0].features[0].flag_sets[0].flag_groups[0];
        assert_eq!(group.iterate_over.as_deref(), Some("libraries_to_link"));
        assert_eq!(group.expand_if_all_available, vec!["libraries_to_link"]);
        match &group.body {
            FlagGroupBody::Groups(subgroups) => {
                assert_eq!(subgroups.len(), 2);
                assert_eq!(
                    subgroups[0].expand_if_true.as_deref(),
                    Some("libraries_to_link.is_whole_archive")
                );
                let eq = subgroups[1].expand_if_equal.as_ref().unwrap();
                assert_eq!(eq.variable, "libraries_to_link.type");
                assert_eq!(eq.value, "object_file");
            }
            other => panic!("expected nested groups, got {other:?}"),
        }
    }

    #[test]
    fn parses_requires_and_with_feature() {
        let input = r#"
toolchain {
  feature {
    name: "gated"
    requires { feature: "opt" feature: "pic" }
    requires { feature: "dbg" }
    flag_set {
      action: "c-compile"
      with_feature { feature: "opt" not_feature: "coverage" }
      flag_group { flag: "-fgate" }
    }
  }
}
"#;
        let feature = &parse_crosstool(input).unwrap().toolchains[0].features[0];
        assert_eq!(feature.requires.len(), 2);
        assert_eq!(feature.requires[0].features, vec!["opt", "pic"]);
        assert_eq!(feature.requires[1].features, vec!["dbg"]);
        let with = &feature.flag_sets[0].with_features[0];
        assert_eq!(with.features, vec!["opt"]);
        assert_eq!(with.not_features, vec!["coverage"]);
    }

    #[test]
    fn parses_action_config_with_tools() {
        let input = r#"
toolchain {
  action_config {
    action_name: "c++-link-executable"
    enabled: true
    tool {
      tool_path: "/usr/bin/gold"
      with_feature { feature: "gold" }
    }
    tool { tool_path: "/usr/bin/ld" }
    implies: "linker_flags"
    flag_set {
      flag_group { flag: "-fuse-ld=gold" }
    }
  }
}
"#;
        let action = &parse_crosstool(input).unwrap().toolchains[0].action_configs[0];
        assert_eq!(action.action_name, "c++-link-executable");
        assert!(action.enabled);
        assert_eq!(action.tools.len(), 2);
        assert_eq!(action.tools[0].path, "/usr/bin/gold");
        assert_eq!(action.tools[0].with_features[0].features, vec!["gold"]);
        assert_eq!(action.implies, vec!["linker_flags"]);
        assert_eq!(action.flag_sets.len(), 1);
    }

    #[test]
    fn parses_env_sets() {
        let input = r#"
toolchain {
  feature {
    name: "env"
    env_set {
      action: "c-compile"
      env_entry { key: "PATH" value: "/usr/bin" }
      with_feature { feature: "opt" }
    }
  }
}
"#;
        let env_set = &parse_crosstool(input).unwrap().toolchains[0].features[0].env_sets[0];
        assert_eq!(env_set.actions, vec!["c-compile"]);
        assert_eq!(env_set.env_entries[0].key, "PATH");
        assert_eq!(env_set.env_entries[0].value, "/usr/bin");
        assert_eq!(env_set.with_features[0].features, vec!["opt"]);
    }

    #[test]
    fn set_level_expand_if_all_available_distributes() {
        // Legacy schema placement: the variable list moves onto each group.
        let input = r#"
toolchain {
  feature {
    name: "sysroot"
    flag_set {
      action: "c-compile"
      expand_if_all_available: "sysroot"
      flag_group { flag: "--sysroot=%{sysroot}" expand_if_all_available: "other" }
      flag_group { flag: "-isysroot" }
    }
  }
}
"#;
        let flag_set = &parse_crosstool(input).unwrap().toolchains[0].features[0].flag_sets[0];
        assert_eq!(
            flag_set.flag_groups[0].expand_if_all_available,
            vec!["other", "sysroot"]
        );
        assert_eq!(flag_set.flag_groups[1].expand_if_all_available, vec!["sysroot"]);
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let input = r#"
default_toolchain { cpu: "k8" toolchain_identifier: "k8" }
toolchain {
  toolchain_identifier: "k8"
  supports_gold_linker: true
  compilation_mode_flags { mode: OPT compiler_flag: "-O2" }
  feature { name: "opt" unknown_scalar: "x" }
}
"#;
        let release = parse_crosstool(input).unwrap();
        assert_eq!(release.toolchains.len(), 1);
        assert_eq!(release.toolchains[0].features[0].name, "opt");
    }

    #[test]
    fn adjacent_strings_concatenate() {
        let input = r#"
toolchain {
  feature {
    name: "split"
    flag_set { flag_group { flag: "-Wl," "--gc-sections" } }
  }
}
"#;
        let feature = &parse_crosstool(input).unwrap().toolchains[0].features[0];
        assert_eq!(
            feature.flag_sets[0].flag_groups[0].body,
            FlagGroupBody::Flags(vec!["-Wl,--gc-sections".into()])
        );
    }

    #[test]
    fn mixed_flag_group_body_is_an_error() {
        let input = r#"
toolchain {
  feature {
    name: "bad"
    flag_set {
      flag_group {
        flag: "-a"
        flag_group { flag: "-b" }
      }
    }
  }
}
"#;
        assert!(matches!(
            parse_crosstool(input),
            Err(ParseError::MixedFlagGroupBody { .. })
        ));
    }

    #[test]
    fn missing_close_brace_is_an_error() {
        assert!(matches!(
            parse_crosstool("toolchain { feature { name: \"x\" }"),
            Err(ParseError::UnexpectedEof)
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CROSSTOOL");
        std::fs::write(&path, MINIMAL).unwrap();
        let release = load_crosstool(&path).unwrap();
        assert_eq!(release.toolchains[0].identifier(), Some("k8"));
    }

    #[test]
    fn load_missing_file_is_an_io_error() {
        let result = load_crosstool(std::path::Path::new("/nonexistent/CROSSTOOL"));
        assert!(matches!(result, Err(ParseError::Io(_))));
    }
}
