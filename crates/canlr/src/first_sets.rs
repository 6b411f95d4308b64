//! Calculation of first set function.

use crate::{
    grammar::{Grammar, SymbolID, TerminalID, EPSILON},
    types::Map,
    util::display_fn,
};
use std::fmt;

/// A set of terminal symbols, backed by a bit set.
#[derive(Debug, Default, Clone)]
pub struct TerminalSet {
    inner: bit_set::BitSet,
}

impl TerminalSet {
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.into_raw().into())
    }
    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.into_raw().into())
    }
    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner
            .iter()
            .filter_map(|raw| u16::try_from(raw).ok().map(TerminalID::from_raw))
    }
}

impl PartialEq for TerminalSet {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}
impl Eq for TerminalSet {}

impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.into_raw().into()).collect(),
        }
    }
}

/// The FIRST set of a symbol or a sequence of symbols.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FirstSet {
    /// The terminal symbols that can begin a derivation.
    terminals: TerminalSet,
    /// Whether ε is a member of this set.
    has_epsilon: bool,
}

impl FirstSet {
    pub fn terminals(&self) -> &TerminalSet {
        &self.terminals
    }

    pub fn contains(&self, id: TerminalID) -> bool {
        self.terminals.contains(id)
    }

    pub fn has_epsilon(&self) -> bool {
        self.has_epsilon
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            f.write_str("{")?;
            let names = self
                .terminals
                .iter()
                .map(|t| g.terminals[&t].name())
                .chain(self.has_epsilon.then_some(EPSILON));
            for (i, name) in names.enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str(name)?;
            }
            f.write_str("}")
        })
    }
}

/// The FIRST sets of every symbol in a grammar.
#[derive(Debug)]
pub struct FirstSets {
    map: Map<SymbolID, FirstSet>,
}

impl FirstSets {
    pub fn new(grammar: &Grammar) -> Self {
        let mut map: Map<SymbolID, FirstSet> = Map::default();

        // terminal symbols については First(T) = {T} になる
        for &id in grammar.terminals.keys() {
            map.insert(
                SymbolID::T(id),
                FirstSet {
                    terminals: Some(id).into_iter().collect(),
                    has_epsilon: false,
                },
            );
        }

        // nonterminal symbols は First(N) = {} と初期化する
        for &id in grammar.nonterminals.keys() {
            map.insert(SymbolID::N(id), FirstSet::default());
        }

        // 値が更新されなくなるまで繰り返す
        let mut changed = true;
        while changed {
            changed = false;
            for rule in grammar.rules.values() {
                let derived = sequence(&map, rule.right());

                let first = &mut map[&SymbolID::N(rule.left())];
                let before = first.terminals.len();
                first.terminals.union_with(&derived.terminals);
                changed |= first.terminals.len() > before;
                if derived.has_epsilon && !first.has_epsilon {
                    first.has_epsilon = true;
                    changed = true;
                }
            }
        }

        Self { map }
    }

    /// `First(X)`
    pub fn first(&self, symbol: SymbolID) -> &FirstSet {
        &self.map[&symbol]
    }

    /// `First(X1 X2 ... Xn)`; the empty sequence yields `{ε}`.
    pub fn first_of_sequence(&self, seq: &[SymbolID]) -> FirstSet {
        sequence(&self.map, seq)
    }

    /// `First(prefix lookahead)`
    pub fn get(&self, prefix: &[SymbolID], lookahead: TerminalID) -> TerminalSet {
        let FirstSet {
            mut terminals,
            has_epsilon,
        } = self.first_of_sequence(prefix);
        if has_epsilon {
            terminals.insert(lookahead);
        }
        terminals
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolID, &FirstSet)> + '_ {
        self.map.iter().map(|(symbol, first)| (*symbol, first))
    }
}

fn sequence(map: &Map<SymbolID, FirstSet>, seq: &[SymbolID]) -> FirstSet {
    let mut res = FirstSet {
        terminals: TerminalSet::default(),
        has_epsilon: true,
    };
    for symbol in seq {
        let first = &map[symbol];
        res.terminals.union_with(&first.terminals);
        if !first.has_epsilon {
            res.has_epsilon = false;
            break;
        }
    }
    res
}
