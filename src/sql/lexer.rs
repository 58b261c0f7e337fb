//! SQL lexer.
//!
//! Turns a statement string into a token stream ending in an EOF
//! token. Whitespace is skipped; a `-` directly followed by a digit
//! starts a negative number; `''` inside a string literal is the
//! escaped quote.

use super::token::{Token, TokenKind};
use crate::error::{Error, Result};

/// Tokenize one SQL statement.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        let ch = bytes[pos] as char;

        if ch.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if is_identifier_start(ch) {
            let start = pos;
            pos += 1;
            while pos < bytes.len() && is_identifier_part(bytes[pos] as char) {
                pos += 1;
            }
            let text = &input[start..pos];
            tokens.push(Token {
                kind: TokenKind::Identifier,
                text: text.to_string(),
                upper: text.to_ascii_uppercase(),
                position: start,
            });
            continue;
        }

        let negative_number = ch == '-'
            && pos + 1 < bytes.len()
            && (bytes[pos + 1] as char).is_ascii_digit();
        if ch.is_ascii_digit() || negative_number {
            let start = pos;
            if ch == '-' {
                pos += 1;
            }
            let mut seen_dot = false;
            while pos < bytes.len() {
                let cur = bytes[pos] as char;
                if cur.is_ascii_digit() {
                    pos += 1;
                } else if cur == '.' && !seen_dot {
                    seen_dot = true;
                    pos += 1;
                } else {
                    break;
                }
            }
            let text = &input[start..pos];
            tokens.push(Token {
                kind: TokenKind::Number,
                text: text.to_string(),
                upper: text.to_string(),
                position: start,
            });
            continue;
        }

        if ch == '\'' {
            let start = pos;
            pos += 1;
            // Collected as raw bytes so multi-byte characters pass
            // through unchanged.
            let mut literal: Vec<u8> = Vec::new();
            let mut closed = false;
            while pos < bytes.len() {
                let cur = bytes[pos];
                pos += 1;
                if cur == b'\'' {
                    if pos < bytes.len() && bytes[pos] == b'\'' {
                        literal.push(b'\'');
                        pos += 1;
                    } else {
                        closed = true;
                        break;
                    }
                } else {
                    literal.push(cur);
                }
            }
            if !closed {
                return Err(Error::SyntaxError {
                    position: start,
                    expected: "closing '".to_string(),
                });
            }
            let literal = String::from_utf8_lossy(&literal).into_owned();
            tokens.push(Token {
                kind: TokenKind::Str,
                upper: literal.clone(),
                text: literal,
                position: start,
            });
            continue;
        }

        // Two-character comparison operators.
        if matches!(ch, '!' | '<' | '>' | '=') {
            let start = pos;
            let mut text = String::from(ch);
            if pos + 1 < bytes.len() {
                let next = bytes[pos + 1] as char;
                let pair = matches!(
                    (ch, next),
                    ('!', '=') | ('<', '=') | ('<', '>') | ('>', '=')
                );
                if pair {
                    text.push(next);
                    pos += 1;
                }
            }
            pos += 1;
            tokens.push(Token {
                kind: TokenKind::Symbol,
                upper: text.clone(),
                text,
                position: start,
            });
            continue;
        }

        // Everything else is a single-character symbol; the parser
        // rejects symbols the grammar does not know.
        tokens.push(Token {
            kind: TokenKind::Symbol,
            text: ch.to_string(),
            upper: ch.to_string(),
            position: pos,
        });
        pos += 1;
    }

    tokens.push(Token::eof(input.len()));
    Ok(tokens)
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(sql: &str) -> Vec<TokenKind> {
        tokenize(sql).unwrap().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_simple_select() {
        let tokens = tokenize("SELECT * FROM users").unwrap();
        assert_eq!(tokens.len(), 5);
        assert!(tokens[0].is_keyword("SELECT"));
        assert!(tokens[1].is_symbol("*"));
        assert!(tokens[2].is_keyword("FROM"));
        assert_eq!(tokens[3].text, "users");
        assert_eq!(tokens[4].kind, TokenKind::Eof);
    }

    #[test]
    fn test_keyword_case_insensitive() {
        let tokens = tokenize("select Name frOM t").unwrap();
        assert!(tokens[0].is_keyword("SELECT"));
        assert_eq!(tokens[1].text, "Name");
        assert_eq!(tokens[1].upper, "NAME");
        assert!(tokens[2].is_keyword("FROM"));
    }

    #[test]
    fn test_numbers() {
        let tokens = tokenize("1 -2 3.5 -4.25").unwrap();
        let texts: Vec<_> = tokens[..4].iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["1", "-2", "3.5", "-4.25"]);
        assert!(tokens[..4].iter().all(|t| t.kind == TokenKind::Number));
    }

    #[test]
    fn test_minus_without_digit_is_symbol() {
        let tokens = tokenize("a - b").unwrap();
        assert_eq!(tokens[1].kind, TokenKind::Symbol);
        assert_eq!(tokens[1].text, "-");
    }

    #[test]
    fn test_string_with_escape() {
        let tokens = tokenize("'it''s a test'").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text, "it's a test");
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("SELECT 'oops").unwrap_err();
        match err {
            Error::SyntaxError { position, .. } => assert_eq!(position, 7),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_comparison_operators() {
        let tokens = tokenize("= != <> < <= > >=").unwrap();
        let texts: Vec<_> = tokens[..7].iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["=", "!=", "<>", "<", "<=", ">", ">="]);
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("( ) , . ; *"),
            vec![
                TokenKind::Symbol,
                TokenKind::Symbol,
                TokenKind::Symbol,
                TokenKind::Symbol,
                TokenKind::Symbol,
                TokenKind::Symbol,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("SELECT id").unwrap();
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[1].position, 7);
        assert_eq!(tokens[2].position, 9);
    }
}
