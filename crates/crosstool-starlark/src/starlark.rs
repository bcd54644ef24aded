//! Starlark value tree and literal formatting.
//!
//! The transform builds the generated rule as a tree of [`Value`] nodes and
//! serializes it once at the end. String escaping is injective: two distinct
//! input strings always render to distinct literals, and every literal parses
//! back to the original string under Starlark's escape rules.

use std::fmt::Write;

/// Spaces per indentation level in rendered output.
const INDENT: &str = "    ";

/// Maximum rendered width for a node to stay on one line.
const INLINE_LIMIT: usize = 72;

/// A keyword or positional argument of a [`Value::Call`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Value,
}

impl Arg {
    pub fn named(name: &str, value: Value) -> Self {
        Arg {
            name: Some(name.to_string()),
            value,
        }
    }

    pub fn positional(value: Value) -> Self {
        Arg { name: None, value }
    }
}

/// One node of the generated Starlark expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Double-quoted string literal.
    Str(String),
    /// `True` / `False`.
    Bool(bool),
    /// A bare identifier reference (`ctx`, `None`, `CcToolchainConfigInfo`).
    Ident(String),
    /// `[...]`. Empty lists render as `[]`, never disappear: the consuming
    /// build system defaults an omitted argument differently from an empty
    /// one.
    List(Vec<Value>),
    /// `function(arg = value, ...)`.
    Call { function: String, args: Vec<Arg> },
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn ident(s: impl Into<String>) -> Self {
        Value::Ident(s.into())
    }

    /// `None` for an absent optional scalar.
    pub fn none() -> Self {
        Value::Ident("None".to_string())
    }

    /// A string literal, or `None` when the field was never set.
    pub fn opt_str(s: Option<&str>) -> Self {
        match s {
            Some(s) => Value::str(s),
            None => Value::none(),
        }
    }

    /// A list of string literals.
    pub fn str_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Value::List(items.into_iter().map(|s| Value::str(s.as_ref())).collect())
    }

    pub fn call(function: &str, args: Vec<Arg>) -> Self {
        Value::Call {
            function: function.to_string(),
            args,
        }
    }

    /// Render at the given indentation level. The first line carries no
    /// leading indent; continuation lines are indented relative to `level`.
    pub fn render(&self, level: usize) -> String {
        let mut out = String::new();
        self.write(&mut out, level);
        out
    }

    fn write(&self, out: &mut String, level: usize) {
        let inline = self.render_inline();
        if inline.len() <= INLINE_LIMIT {
            out.push_str(&inline);
            return;
        }
        match self {
            Value::List(items) => {
                out.push_str("[\n");
                for item in items {
                    push_indent(out, level + 1);
                    item.write(out, level + 1);
                    out.push_str(",\n");
                }
                push_indent(out, level);
                out.push(']');
            }
            Value::Call { function, args } => {
                let _ = write!(out, "{function}(\n");
                for arg in args {
                    push_indent(out, level + 1);
                    if let Some(name) = &arg.name {
                        let _ = write!(out, "{name} = ");
                    }
                    arg.value.write(out, level + 1);
                    out.push_str(",\n");
                }
                push_indent(out, level);
                out.push(')');
            }
            // Scalars never exceed the limit path meaningfully; emit as-is.
            _ => out.push_str(&inline),
        }
    }

    /// Single-line rendering, used both for output and for width decisions.
    fn render_inline(&self) -> String {
        match self {
            Value::Str(s) => quote(s),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Ident(name) => name.clone(),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::render_inline).collect();
                format!("[{}]", inner.join(", "))
            }
            Value::Call { function, args } => {
                let inner: Vec<String> = args
                    .iter()
                    .map(|arg| match &arg.name {
                        Some(name) => format!("{name} = {}", arg.value.render_inline()),
                        None => arg.value.render_inline(),
                    })
                    .collect();
                format!("{function}({})", inner.join(", "))
            }
        }
    }
}

fn push_indent(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

/// Render a string as a Starlark double-quoted literal.
///
/// Backslash and quote are escaped first so the mapping is injective; raw
/// newlines, carriage returns, and tabs use their mnemonic escapes; any other
/// control byte falls back to `\xNN`.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Verify that `()`/`[]`/`{}` pair up outside string literals.
///
/// The value tree makes unbalanced output unreachable; this runs over the
/// final text anyway so an emitter defect surfaces as an internal error
/// instead of an unloadable generated file.
pub fn check_balanced(text: &str) -> Result<(), String> {
    let mut stack = Vec::new();
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                let quote_char = c;
                loop {
                    match chars.next() {
                        None => return Err("unterminated string literal".to_string()),
                        Some('\\') => {
                            chars.next();
                        }
                        Some(c) if c == quote_char => break,
                        Some(_) => {}
                    }
                }
            }
            '#' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return Err(format!("unmatched '{c}'"));
                }
            }
            _ => {}
        }
    }
    if let Some(open) = stack.pop() {
        return Err(format!("unclosed '{open}'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Decode a rendered literal back to the source string, following
    /// Starlark's escape rules. Test-only inverse of `quote`.
    fn unquote(literal: &str) -> String {
        let inner = literal
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .expect("double-quoted literal");
        let mut out = String::new();
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next().expect("dangling escape") {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                'x' => {
                    let hex: String = chars.by_ref().take(2).collect();
                    out.push(u8::from_str_radix(&hex, 16).unwrap() as char);
                }
                other => panic!("unexpected escape '\\{other}'"),
            }
        }
        out
    }

    #[test]
    fn quote_plain_string() {
        assert_eq!(quote("k8"), "\"k8\"");
    }

    #[test]
    fn quote_specials() {
        assert_eq!(quote("a\"b"), r#""a\"b""#);
        assert_eq!(quote("a\\b"), r#""a\\b""#);
        assert_eq!(quote("a\nb"), r#""a\nb""#);
        assert_eq!(quote("a\tb"), r#""a\tb""#);
        assert_eq!(quote("\x01"), r#""\x01""#);
    }

    #[test]
    fn quote_round_trips() {
        let cases = [
            "",
            "-O2",
            "a\"b\\c\nd",
            "%{libraries_to_link.name}",
            "tab\there",
            "\x07bell",
        ];
        for case in cases {
            assert_eq!(unquote(&quote(case)), case, "round-trip of {case:?}");
        }
    }

    #[test]
    fn quote_is_injective_on_tricky_pairs() {
        // Pairs whose naive renderings could collide.
        let pairs = [
            ("a\\nb", "a\nb"),
            ("a\\\"b", "a\"b"),
            ("\\x01", "\x01"),
            ("a\\tb", "a\tb"),
        ];
        for (left, right) in pairs {
            assert_ne!(quote(left), quote(right), "{left:?} vs {right:?}");
        }
    }

    #[test]
    fn empty_list_renders_explicitly() {
        assert_eq!(Value::List(vec![]).render(0), "[]");
    }

    #[test]
    fn short_call_renders_inline() {
        let call = Value::call(
            "tool_path",
            vec![
                Arg::named("name", Value::str("gcc")),
                Arg::named("path", Value::str("/usr/bin/gcc")),
            ],
        );
        assert_eq!(
            call.render(0),
            "tool_path(name = \"gcc\", path = \"/usr/bin/gcc\")"
        );
    }

    #[test]
    fn long_call_renders_multiline() {
        let call = Value::call(
            "flag_set",
            vec![
                Arg::named(
                    "actions",
                    Value::str_list(["c-compile", "c++-compile", "c++-header-parsing"]),
                ),
                Arg::named("with_features", Value::List(vec![])),
                Arg::named("flag_groups", Value::str_list(["placeholder"])),
            ],
        );
        let rendered = call.render(0);
        assert!(rendered.starts_with("flag_set(\n"));
        assert!(rendered.contains("    actions = [\"c-compile\", \"c++-compile\", \"c++-header-parsing\"],\n"));
        assert!(rendered.ends_with(")"));
    }

    #[test]
    fn nested_indentation_is_stable() {
        let inner = Value::call(
            "flag_group",
            vec![Arg::named(
                "flags",
                Value::str_list(["-very-long-flag-number-one", "-very-long-flag-number-two"]),
            )],
        );
        let outer = Value::call("feature", vec![Arg::named("flag_sets", Value::List(vec![inner]))]);
        let rendered = outer.render(0);
        // Re-rendering must be byte-identical (deterministic output).
        assert_eq!(rendered, outer.render(0));
        assert!(check_balanced(&rendered).is_ok());
    }

    #[test]
    fn render_is_deterministic() {
        let value = Value::call(
            "feature",
            vec![
                Arg::named("name", Value::str("opt")),
                Arg::named("enabled", Value::Bool(true)),
                Arg::named("implies", Value::List(vec![])),
            ],
        );
        assert_eq!(value.render(0), value.render(0));
    }

    #[test]
    fn check_balanced_accepts_quoted_brackets() {
        assert!(check_balanced(r#"f(["a)b", "c]d"])"#).is_ok());
    }

    #[test]
    fn check_balanced_rejects_mismatch() {
        assert!(check_balanced("f(]").is_err());
        assert!(check_balanced("f(").is_err());
        assert!(check_balanced("f)").is_err());
    }

    #[test]
    fn check_balanced_ignores_comments() {
        assert!(check_balanced("# unbalanced ( in a comment\nf()").is_ok());
    }
}
