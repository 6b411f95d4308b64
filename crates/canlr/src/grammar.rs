//! Grammar types.

use crate::{
    types::{Map, Set},
    util::{display_fn, write_spaced},
};
use std::{borrow::Cow, fmt};

/// The name of the empty body in the external representation of grammars.
pub const EPSILON: &str = "ε";

/// The name of the terminal symbol that means the end of input.
pub const END_MARKER: &str = "$";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}

impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::from_raw(0);

    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }
}

#[derive(Debug)]
pub struct Terminal {
    id: TerminalID,
    name: Cow<'static, str>,
}

impl Terminal {
    pub fn id(&self) -> TerminalID {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u16,
}

impl NonterminalID {
    /// The start symbol of the augmented grammar.
    pub const START: Self = Self::new(0);

    const OFFSET: u16 = 1;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }
}

#[derive(Debug)]
pub struct Nonterminal {
    id: NonterminalID,
    name: Cow<'static, str>,
}

impl Nonterminal {
    pub fn id(&self) -> NonterminalID {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RuleID {
    raw: u16,
}

impl RuleID {
    /// The synthetic production `S' -> S` added by augmentation.
    pub const ACCEPT: Self = Self::new(0);

    const OFFSET: u16 = 1;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }
}

impl fmt::Display for RuleID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.raw)
    }
}

/// The type that represents a production rule in grammar.
///
/// The empty alternative (`A -> ε`) is stored with an empty right-hand side.
#[derive(Debug)]
pub struct Rule {
    id: RuleID,
    left: NonterminalID,
    right: Vec<SymbolID>,
}

impl Rule {
    pub fn id(&self) -> RuleID {
        self.id
    }

    /// Return the left-hand side of this production.
    pub fn left(&self) -> NonterminalID {
        self.left
    }

    /// Return the right-hand side of this production.
    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    /// Return whether this production is an empty alternative.
    pub fn is_epsilon(&self) -> bool {
        self.right.is_empty()
    }

    // `"LHS -> R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} -> ", g.nonterminals[&self.left])?;
            if self.right.is_empty() {
                return f.write_str(EPSILON);
            }
            write_spaced(f, self.right.iter().map(|symbol| g.symbol_name(*symbol)))
        })
    }
}

/// The grammar definition used to derive the parser tables.
///
/// A `Grammar` is always augmented: it holds the extra production
/// `S' -> S` under [`RuleID::ACCEPT`], whose left-hand side
/// [`NonterminalID::START`] is given a fresh name.
#[derive(Debug)]
#[non_exhaustive]
pub struct Grammar {
    pub terminals: Map<TerminalID, Terminal>,
    pub nonterminals: Map<NonterminalID, Nonterminal>,
    pub rules: Map<RuleID, Rule>,
    pub start_symbol: NonterminalID,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for terminal in self.terminals.values() {
            writeln!(f, "{}", terminal)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for nonterminal in self.nonterminals.values() {
            write!(f, "{}", nonterminal)?;
            if nonterminal.id() == self.start_symbol {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## rules:")?;
        for rule in self.rules.values() {
            writeln!(f, "{}", rule.display(self))?;
        }

        Ok(())
    }
}

impl Grammar {
    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef {
            terminals: Map::default(),
            nonterminals: Map::default(),
            rules: Map::default(),
            start: None,
            next_terminal_id: TerminalID::OFFSET,
            next_nonterminal_id: NonterminalID::OFFSET,
            next_rule_id: RuleID::OFFSET,
        };

        def.terminals.insert(
            TerminalID::EOI,
            Terminal {
                id: TerminalID::EOI,
                name: Cow::Borrowed(END_MARKER),
            },
        );

        // The name is fixed in `end()`, once every other symbol is known.
        def.nonterminals.insert(
            NonterminalID::START,
            Nonterminal {
                id: NonterminalID::START,
                name: Cow::Borrowed(""),
            },
        );

        f(&mut def)?;

        def.end()
    }

    /// Build a grammar from a list of `head -> [alternatives]` entries.
    ///
    /// Every symbol that never appears as a head is inferred to be a terminal.
    /// An alternative of exactly `[ε]` (or an empty one) is the empty
    /// alternative. Heads may be repeated; their alternatives are appended in
    /// order. The nonterminal `start` must be one of the heads.
    pub fn from_productions<I, A, B, S>(start: &str, productions: I) -> Result<Self, GrammarDefError>
    where
        I: IntoIterator<Item = (S, A)>,
        A: IntoIterator<Item = B>,
        B: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut heads: Map<String, Vec<Vec<String>>> = Map::default();
        for (head, alternatives) in productions {
            let slot = heads.entry(head.as_ref().to_owned()).or_default();
            for alternative in alternatives {
                slot.push(
                    alternative
                        .into_iter()
                        .map(|s| s.as_ref().to_owned())
                        .collect(),
                );
            }
        }

        if heads.values().all(|alternatives| alternatives.is_empty()) {
            return Err(GrammarDefError::Empty);
        }
        if !heads.contains_key(start) {
            return Err(GrammarDefError::UnknownStart(start.to_owned()));
        }

        Grammar::define(|g| {
            let mut nonterminals = Map::default();
            for head in heads.keys() {
                nonterminals.insert(head.as_str(), g.nonterminal(head)?);
            }

            let mut terminals = Map::default();
            for (head, alternatives) in &heads {
                for alternative in alternatives {
                    if is_epsilon_body(alternative) {
                        continue;
                    }
                    for name in alternative {
                        if name == EPSILON {
                            return Err(GrammarDefError::MixedEpsilon(head.clone()));
                        }
                        if nonterminals.contains_key(name.as_str())
                            || terminals.contains_key(name.as_str())
                        {
                            continue;
                        }
                        terminals.insert(name.as_str(), g.terminal(name)?);
                    }
                }
            }

            for (head, alternatives) in &heads {
                let left = nonterminals[head.as_str()];
                let mut seen: Vec<Vec<SymbolID>> = vec![];
                for alternative in alternatives {
                    let right: Vec<SymbolID> = if is_epsilon_body(alternative) {
                        vec![]
                    } else {
                        alternative
                            .iter()
                            .map(|name| match nonterminals.get(name.as_str()) {
                                Some(n) => SymbolID::N(*n),
                                None => SymbolID::T(terminals[name.as_str()]),
                            })
                            .collect()
                    };
                    // 重複した選択肢は一つにまとめる
                    if seen.contains(&right) {
                        tracing::trace!("skipped duplicate alternative of `{}'", head);
                        continue;
                    }
                    g.rule(left, right.iter().copied())?;
                    seen.push(right);
                }
            }

            g.start_symbol(nonterminals[start])
        })
    }

    pub fn rule(&self, id: RuleID) -> &Rule {
        &self.rules[&id]
    }

    /// Iterate the production rules whose left-hand side is `left`.
    pub fn rules_of(&self, left: NonterminalID) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.values().filter(move |rule| rule.left == left)
    }

    /// Return the nonterminal symbol introduced by augmentation (`S'`).
    pub fn augmented_start(&self) -> &Nonterminal {
        &self.nonterminals[&NonterminalID::START]
    }

    pub fn terminal_id(&self, name: &str) -> Option<TerminalID> {
        self.terminals
            .values()
            .find(|t| t.name() == name)
            .map(|t| t.id())
    }

    pub fn nonterminal_id(&self, name: &str) -> Option<NonterminalID> {
        self.nonterminals
            .values()
            .find(|n| n.name() == name)
            .map(|n| n.id())
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => self.terminals[&t].name(),
            SymbolID::N(n) => self.nonterminals[&n].name(),
        }
    }

    /// Iterate all grammar symbols, terminals first.
    pub fn symbols(&self) -> impl Iterator<Item = SymbolID> + '_ {
        let terminals = self.terminals.keys().map(|t| SymbolID::T(*t));
        let nonterminals = self.nonterminals.keys().map(|n| SymbolID::N(*n));
        terminals.chain(nonterminals)
    }
}

fn is_epsilon_body(body: &[String]) -> bool {
    match body {
        [] => true,
        [single] => single == EPSILON,
        _ => false,
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
pub struct GrammarDef {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    rules: Map<RuleID, Rule>,
    start: Option<NonterminalID>,
    next_terminal_id: u16,
    next_nonterminal_id: u16,
    next_rule_id: u16,
}

impl GrammarDef {
    /// Declare a terminal symbol used in this grammar.
    pub fn terminal(&mut self, name: &str) -> Result<TerminalID, GrammarDefError> {
        self.verify_new_name(name)?;

        let id = TerminalID::from_raw(self.next_terminal_id);
        self.next_terminal_id = self
            .next_terminal_id
            .checked_add(1)
            .ok_or(GrammarDefError::TooManySymbols)?;
        self.terminals.insert(
            id,
            Terminal {
                id,
                name: Cow::Owned(name.to_owned()),
            },
        );

        Ok(id)
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(&mut self, name: &str) -> Result<NonterminalID, GrammarDefError> {
        self.verify_new_name(name)?;

        let id = NonterminalID::new(self.next_nonterminal_id);
        self.next_nonterminal_id = self
            .next_nonterminal_id
            .checked_add(1)
            .ok_or(GrammarDefError::TooManySymbols)?;
        self.nonterminals.insert(
            id,
            Nonterminal {
                id,
                name: Cow::Owned(name.to_owned()),
            },
        );

        Ok(id)
    }

    /// Specify a production rule into this grammer.
    ///
    /// An empty `right` declares the empty alternative.
    pub fn rule<I>(&mut self, left: NonterminalID, right: I) -> Result<RuleID, GrammarDefError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        let left_name = match self.nonterminals.get(&left) {
            Some(n) if left != NonterminalID::START => n.name().to_owned(),
            _ => return Err(GrammarDefError::UndefinedSymbol(format!("{:?}", left))),
        };

        let right: Vec<SymbolID> = right.into_iter().collect();
        for symbol in &right {
            match symbol {
                SymbolID::T(TerminalID::EOI) => {
                    return Err(GrammarDefError::Reserved(END_MARKER.to_owned()))
                }
                SymbolID::N(NonterminalID::START) => {
                    return Err(GrammarDefError::UndefinedSymbol(left_name))
                }
                SymbolID::T(t) if !self.terminals.contains_key(t) => {
                    return Err(GrammarDefError::UndefinedSymbol(left_name))
                }
                SymbolID::N(n) if !self.nonterminals.contains_key(n) => {
                    return Err(GrammarDefError::UndefinedSymbol(left_name))
                }
                _ => (),
            }
        }

        if self
            .rules
            .values()
            .any(|rule| rule.left == left && rule.right == right)
        {
            return Err(GrammarDefError::DuplicateRule(left_name));
        }

        let id = RuleID::new(self.next_rule_id);
        self.next_rule_id = self
            .next_rule_id
            .checked_add(1)
            .ok_or(GrammarDefError::TooManyRules)?;
        self.rules.insert(id, Rule { id, left, right });

        Ok(id)
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, symbol: NonterminalID) -> Result<(), GrammarDefError> {
        if symbol == NonterminalID::START || !self.nonterminals.contains_key(&symbol) {
            return Err(GrammarDefError::UndefinedSymbol(format!("{:?}", symbol)));
        }
        self.start.replace(symbol);
        Ok(())
    }

    fn verify_new_name(&self, name: &str) -> Result<(), GrammarDefError> {
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(GrammarDefError::Other {
                msg: format!("incorrect symbol name: `{}'", name),
            });
        }
        if name == EPSILON || name == END_MARKER {
            return Err(GrammarDefError::Reserved(name.to_owned()));
        }
        let used = self.terminals.values().any(|t| t.name() == name)
            || self.nonterminals.values().any(|n| n.name() == name);
        if used {
            return Err(GrammarDefError::Duplicated(name.to_owned()));
        }
        Ok(())
    }

    fn end(mut self) -> Result<Grammar, GrammarDefError> {
        if self.rules.is_empty() {
            return Err(GrammarDefError::Empty);
        }

        // 指定されていない場合は最初に登録されたnonterminal symbolを用いる
        let start = match self.start.take() {
            Some(start) => start,
            None => self
                .nonterminals
                .keys()
                .find(|id| **id != NonterminalID::START)
                .copied()
                .ok_or(GrammarDefError::Empty)?,
        };

        for nonterminal in self.nonterminals.values() {
            if nonterminal.id() == NonterminalID::START {
                continue;
            }
            if self.rules.values().all(|rule| rule.left != nonterminal.id()) {
                return Err(GrammarDefError::NoRules(nonterminal.name().to_owned()));
            }
        }

        let used: Set<&str> = self
            .terminals
            .values()
            .map(|t| t.name())
            .chain(self.nonterminals.values().map(|n| n.name()))
            .collect();
        let mut augmented = format!("{}'", self.nonterminals[&start].name());
        while used.contains(augmented.as_str()) {
            augmented.push('\'');
        }
        self.nonterminals[&NonterminalID::START].name = Cow::Owned(augmented);

        self.rules.insert(
            RuleID::ACCEPT,
            Rule {
                id: RuleID::ACCEPT,
                left: NonterminalID::START,
                right: vec![SymbolID::N(start)],
            },
        );
        self.rules.sort_keys();

        Ok(Grammar {
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            rules: self.rules,
            start_symbol: start,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("the grammar has no production rules")]
    Empty,

    #[error("the start symbol `{}' is not defined by any production rule", _0)]
    UnknownStart(String),

    #[error("the symbol `{}' has already been declared", _0)]
    Duplicated(String),

    #[error("the symbol `{}' is reserved", _0)]
    Reserved(String),

    #[error("duplicate production rule detected for `{}'", _0)]
    DuplicateRule(String),

    #[error("an alternative of `{}' mixes ε with other symbols", _0)]
    MixedEpsilon(String),

    #[error("the nonterminal `{}' has no production rules", _0)]
    NoRules(String),

    #[error("a production rule of `{}' refers to an undefined symbol", _0)]
    UndefinedSymbol(String),

    #[error("too many symbols in the grammar")]
    TooManySymbols,

    #[error("too many production rules in the grammar")]
    TooManyRules,

    #[error("Other error: {}", msg)]
    Other { msg: String },
}
