//! Tokenizer for the protobuf text format subset used by CROSSTOOL files.
//!
//! Recognized tokens: bare identifiers/scalars, quoted strings (with the
//! standard escape sequences), `:`, `{`, `}`. Comments run from `#` to end
//! of line. Commas and semicolons are legal field separators in the text
//! format and are dropped as trivia.

use crate::error::{ParseError, Result};

/// A token kind plus its decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare word: field name, `true`/`false`, enum value, or number.
    Ident(String),
    /// Quoted string, escapes already decoded.
    Str(String),
    Colon,
    LBrace,
    RBrace,
}

/// A token with its source position (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Ident(s) => format!("'{s}'"),
            TokenKind::Str(s) => format!("\"{s}\""),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
        }
    }
}

/// Tokenize an entire input string.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1usize;
    let mut column = 1usize;

    while let Some(&c) = chars.peek() {
        let (tok_line, tok_column) = (line, column);
        match c {
            '\n' => {
                chars.next();
                line += 1;
                column = 1;
            }
            c if c.is_whitespace() => {
                chars.next();
                column += 1;
            }
            // Trivia: comments and optional field separators.
            '#' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                    column += 1;
                }
            }
            ',' | ';' => {
                chars.next();
                column += 1;
            }
            ':' => {
                chars.next();
                column += 1;
                tokens.push(Token {
                    kind: TokenKind::Colon,
                    line: tok_line,
                    column: tok_column,
                });
            }
            '{' => {
                chars.next();
                column += 1;
                tokens.push(Token {
                    kind: TokenKind::LBrace,
                    line: tok_line,
                    column: tok_column,
                });
            }
            '}' => {
                chars.next();
                column += 1;
                tokens.push(Token {
                    kind: TokenKind::RBrace,
                    line: tok_line,
                    column: tok_column,
                });
            }
            '"' | '\'' => {
                let quote = c;
                chars.next();
                column += 1;
                let mut value = String::new();
                loop {
                    match chars.next() {
                        None => {
                            return Err(ParseError::UnterminatedString {
                                line: tok_line,
                                column: tok_column,
                            })
                        }
                        Some('\n') => {
                            return Err(ParseError::UnterminatedString {
                                line: tok_line,
                                column: tok_column,
                            })
                        }
                        Some(c) if c == quote => {
                            column += 1;
                            break;
                        }
                        Some('\\') => {
                            column += 1;
                            let escape = chars.next().ok_or(ParseError::UnexpectedEof)?;
                            column += 1;
                            value.push(decode_escape(
                                escape,
                                &mut chars,
                                &mut column,
                                line,
                            )?);
                        }
                        Some(c) => {
                            column += 1;
                            value.push(c);
                        }
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Str(value),
                    line: tok_line,
                    column: tok_column,
                });
            }
            c if is_ident_char(c) => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_ident_char(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                    column += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(word),
                    line: tok_line,
                    column: tok_column,
                });
            }
            other => {
                return Err(ParseError::UnexpectedCharacter {
                    line,
                    column,
                    found: other,
                })
            }
        }
    }

    Ok(tokens)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '+' | '/')
}

/// Decode the character following a backslash. Supports the C-style escapes
/// the text format defines, plus octal (`\NNN`) and hex (`\xNN`) forms.
fn decode_escape<I>(
    escape: char,
    chars: &mut std::iter::Peekable<I>,
    column: &mut usize,
    line: usize,
) -> Result<char>
where
    I: Iterator<Item = char>,
{
    let decoded = match escape {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'a' => '\x07',
        'b' => '\x08',
        'f' => '\x0c',
        'v' => '\x0b',
        '\\' => '\\',
        '\'' => '\'',
        '"' => '"',
        '?' => '?',
        'x' => {
            let mut value = 0u32;
            let mut digits = 0;
            while digits < 2 {
                match chars.peek().and_then(|c| c.to_digit(16)) {
                    Some(d) => {
                        value = value * 16 + d;
                        chars.next();
                        *column += 1;
                        digits += 1;
                    }
                    None => break,
                }
            }
            if digits == 0 {
                return Err(ParseError::InvalidEscape {
                    line,
                    column: *column,
                    escape,
                });
            }
            char::from_u32(value).unwrap_or('\u{fffd}')
        }
        d @ '0'..='7' => {
            let mut value = d.to_digit(8).unwrap_or(0);
            let mut digits = 1;
            while digits < 3 {
                match chars.peek().and_then(|c| c.to_digit(8)) {
                    Some(d) => {
                        value = value * 8 + d;
                        chars.next();
                        *column += 1;
                        digits += 1;
                    }
                    None => break,
                }
            }
            char::from_u32(value).unwrap_or('\u{fffd}')
        }
        other => {
            return Err(ParseError::InvalidEscape {
                line,
                column: *column,
                escape: other,
            })
        }
    };
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_scalar_field() {
        assert_eq!(
            kinds("toolchain_identifier: \"k8\""),
            vec![
                TokenKind::Ident("toolchain_identifier".into()),
                TokenKind::Colon,
                TokenKind::Str("k8".into()),
            ]
        );
    }

    #[test]
    fn tokenizes_message_field() {
        assert_eq!(
            kinds("feature { name: \"opt\" }"),
            vec![
                TokenKind::Ident("feature".into()),
                TokenKind::LBrace,
                TokenKind::Ident("name".into()),
                TokenKind::Colon,
                TokenKind::Str("opt".into()),
                TokenKind::RBrace,
            ]
        );
    }

    #[test]
    fn skips_comments_and_separators() {
        assert_eq!(
            kinds("enabled: true, # always on\nname: \"x\";"),
            vec![
                TokenKind::Ident("enabled".into()),
                TokenKind::Colon,
                TokenKind::Ident("true".into()),
                TokenKind::Ident("name".into()),
                TokenKind::Colon,
                TokenKind::Str("x".into()),
            ]
        );
    }

    #[test]
    fn decodes_common_escapes() {
        assert_eq!(
            kinds(r#"flag: "a\nb\t\"c\"\\d""#),
            vec![
                TokenKind::Ident("flag".into()),
                TokenKind::Colon,
                TokenKind::Str("a\nb\t\"c\"\\d".into()),
            ]
        );
    }

    #[test]
    fn decodes_octal_and_hex_escapes() {
        assert_eq!(kinds(r#"flag: "\101\x42""#)[2], TokenKind::Str("AB".into()));
    }

    #[test]
    fn single_quoted_strings() {
        assert_eq!(kinds("flag: 'hi'")[2], TokenKind::Str("hi".into()));
    }

    #[test]
    fn flag_like_bare_words() {
        // Unquoted enum-ish values contain dashes and dots.
        assert_eq!(
            kinds("mode: OPT-1.2")[2],
            TokenKind::Ident("OPT-1.2".into())
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(matches!(
            tokenize("flag: \"oops"),
            Err(ParseError::UnterminatedString { .. })
        ));
    }

    #[test]
    fn invalid_escape_is_an_error() {
        assert!(matches!(
            tokenize(r#"flag: "\q""#),
            Err(ParseError::InvalidEscape { .. })
        ));
    }

    #[test]
    fn positions_are_tracked() {
        let tokens = tokenize("a: \"x\"\nb: \"y\"").unwrap();
        assert_eq!(tokens[3].line, 2);
        assert_eq!(tokens[3].column, 1);
    }
}
