//! Tokenizers that turn raw input into sequences of terminal names.

use logos::Logos;

// 算術式のトークン
#[derive(Debug, Copy, Clone, Logos, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum ExprToken {
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[regex(r"[0-9]+(?:\.[0-9]+)?")]
    Number,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
}

impl ExprToken {
    fn terminal(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Number | Self::Ident => "id",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized character `{}' at offset {}", fragment, offset)]
pub struct LexError {
    /// The byte offset of the unrecognized input.
    pub offset: usize,
    pub fragment: String,
}

/// Tokenize an arithmetic expression.
///
/// Numbers and identifiers become `id`; the operators and parentheses are
/// their own terminal names.
pub fn tokenize_expr(input: &str) -> Result<Vec<&'static str>, LexError> {
    let mut lexer = ExprToken::lexer(input);
    let mut tokens = vec![];
    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => tokens.push(token.terminal()),
            Err(()) => {
                return Err(LexError {
                    offset: lexer.span().start,
                    fragment: lexer.slice().to_owned(),
                })
            }
        }
    }
    Ok(tokens)
}

/// Treat every whitespace-separated word as a terminal name.
pub fn split_whitespace(input: &str) -> Vec<&str> {
    input.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expressions() {
        assert_eq!(
            tokenize_expr("x1 + 42 * (y - 3.5) / _z").unwrap(),
            ["id", "+", "id", "*", "(", "id", "-", "id", ")", "/", "id"]
        );
        assert_eq!(tokenize_expr(" \t\n").unwrap(), Vec::<&str>::new());
    }

    #[test]
    fn unknown_character() {
        let err = tokenize_expr("id + $").unwrap_err();
        assert_eq!(err.offset, 5);
        assert_eq!(err.fragment, "$");
    }

    #[test]
    fn whitespace() {
        assert_eq!(split_whitespace("  id +\tid\n"), ["id", "+", "id"]);
        assert!(split_whitespace("").is_empty());
    }
}
