//! The textual representation of grammars.
//!
//! ```text
//! # comment
//! E -> E + T | T
//! T -> T '*' F | F
//! F -> ( E ) | id
//! A -> a | ε
//! ```
//!
//! The head of the first production is the start symbol. A head may appear
//! on several lines. Quoted tokens (`'…'` or `"…"`) are taken literally.

use crate::grammar::{Grammar, GrammarDefError, EPSILON};
use std::{fs, path::Path};

/// The spellings accepted for the empty body.
const EPSILON_ALIASES: &[&str] = &[EPSILON, "epsilon", "EPSILON", "EPS", "empty"];

#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    #[error("line {}: missing `->'", line)]
    MissingArrow { line: usize },

    #[error("line {}: empty left-hand side", line)]
    EmptyHead { line: usize },

    #[error("line {}: empty alternative in `{} -> ...'", line, head)]
    EmptyAlternative { line: usize, head: String },

    #[error("line {}: unterminated quoted token", line)]
    UnterminatedQuote { line: usize },

    #[error("no production rules found")]
    Empty,

    #[error("invalid grammar: {}", _0)]
    Grammar(
        #[from]
        #[source]
        GrammarDefError,
    ),

    #[error("failed to read grammar file: {}", _0)]
    Io(
        #[from]
        #[source]
        std::io::Error,
    ),
}

/// Read a grammar from the specified file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Grammar, SyntaxError> {
    let source = fs::read_to_string(path)?;
    parse(&source)
}

/// Parse a grammar from its textual representation.
pub fn parse(source: &str) -> Result<Grammar, SyntaxError> {
    let _span = tracing::trace_span!("parse").entered();

    let mut productions: Vec<(String, Vec<Vec<String>>)> = vec![];
    for (i, line) in source.lines().enumerate() {
        let lineno = i + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (head, rhs) = line
            .split_once("->")
            .ok_or(SyntaxError::MissingArrow { line: lineno })?;
        let head = head.trim();
        if head.is_empty() {
            return Err(SyntaxError::EmptyHead { line: lineno });
        }

        let mut alternatives = vec![];
        for alternative in split_alternatives(rhs, lineno)? {
            if alternative.is_empty() {
                return Err(SyntaxError::EmptyAlternative {
                    line: lineno,
                    head: head.to_owned(),
                });
            }
            let body: Vec<String> = alternative
                .into_iter()
                .map(|token| match token {
                    Token::Bare(s) if EPSILON_ALIASES.contains(&s.as_str()) => EPSILON.to_owned(),
                    Token::Bare(s) | Token::Quoted(s) => s,
                })
                .collect();
            alternatives.push(body);
        }

        tracing::trace!("line {}: {} alternative(s) of `{}'", lineno, alternatives.len(), head);
        productions.push((head.to_owned(), alternatives));
    }

    let start = match productions.first() {
        Some((start, _)) => start.clone(),
        None => return Err(SyntaxError::Empty),
    };

    let grammar = Grammar::from_productions(&start, productions)?;
    tracing::debug!(
        "parsed grammar: {} terminals, {} nonterminals, {} rules",
        grammar.terminals.len(),
        grammar.nonterminals.len(),
        grammar.rules.len()
    );
    Ok(grammar)
}

#[derive(Debug, PartialEq)]
enum Token {
    Bare(String),
    Quoted(String),
}

/// Split the right-hand side on the unquoted `|`, then on whitespace.
fn split_alternatives(rhs: &str, line: usize) -> Result<Vec<Vec<Token>>, SyntaxError> {
    let mut alternatives = vec![];
    let mut current = vec![];
    let mut bare = String::new();

    let mut chars = rhs.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' if bare.is_empty() => {
                let mut quoted = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == ch => break,
                        Some(c) => quoted.push(c),
                        None => return Err(SyntaxError::UnterminatedQuote { line }),
                    }
                }
                current.push(Token::Quoted(quoted));
            }
            '|' => {
                if !bare.is_empty() {
                    current.push(Token::Bare(std::mem::take(&mut bare)));
                }
                alternatives.push(std::mem::take(&mut current));
            }
            c if c.is_whitespace() => {
                if !bare.is_empty() {
                    current.push(Token::Bare(std::mem::take(&mut bare)));
                }
            }
            c => bare.push(c),
        }
    }
    if !bare.is_empty() {
        current.push(Token::Bare(bare));
    }
    alternatives.push(current);

    Ok(alternatives)
}
