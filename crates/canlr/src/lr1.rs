//! The implementation of canonical LR(1) automaton.

use crate::{
    first_sets::FirstSets,
    grammar::{Grammar, RuleID, SymbolID, TerminalID},
    types::{Map, Set},
    util::display_fn,
};
use std::{collections::BTreeSet, collections::VecDeque, fmt};

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u32);

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StateID {
    /// The initial state, `Closure({[S' -> . S, $]})`.
    pub const START: Self = Self::from_raw(0);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u32 {
        self.0
    }

    fn from_index(index: usize) -> Result<Self, BuildError> {
        u32::try_from(index)
            .map(Self)
            .map_err(|_| BuildError::TooManyStates)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("the number of LR(1) states exceeds the limit")]
    TooManyStates,
}

/// LR(1) item.
///
/// A production rule `X -> Y1 Y2 ... Yn` with the marker position and
/// a single lookahead symbol. Items are plain values; two items are equal
/// iff all of their fields are equal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LR1Item {
    pub rule: RuleID,
    pub marker: u16,
    pub lookahead: TerminalID,
}

impl LR1Item {
    pub fn new(rule: RuleID, lookahead: TerminalID) -> Self {
        Self {
            rule,
            marker: 0,
            lookahead,
        }
    }

    /// Return the symbol just after the marker, if any.
    pub fn next_symbol(&self, g: &Grammar) -> Option<SymbolID> {
        g.rule(self.rule).right().get(usize::from(self.marker)).copied()
    }

    /// Return whether the marker has reached the end of the production.
    pub fn is_complete(&self, g: &Grammar) -> bool {
        usize::from(self.marker) >= g.rule(self.rule).right().len()
    }

    pub fn advance(&self) -> Self {
        Self {
            marker: self.marker + 1,
            ..*self
        }
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let rule = g.rule(self.rule);
            write!(f, "[{} ->", g.nonterminals[&rule.left()])?;
            for (i, symbol) in rule.right().iter().enumerate() {
                if i == usize::from(self.marker) {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            if usize::from(self.marker) == rule.right().len() {
                f.write_str(" .")?;
            }
            write!(f, ", {}]", g.terminals[&self.lookahead])
        })
    }
}

/// A canonicalized set of LR(1) items.
///
/// The ordering of `BTreeSet` makes the set usable as a content-based key,
/// independent from the order in which the items were discovered.
pub type ItemSet = BTreeSet<LR1Item>;

#[derive(Debug)]
pub struct LR1State {
    pub items: ItemSet,
    pub edges: Map<SymbolID, StateID>,
}

/// The canonical collection of LR(1) item sets and its transitions.
#[derive(Debug)]
pub struct LR1Automaton {
    pub states: Map<StateID, LR1State>,
}

impl LR1Automaton {
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, id: StateID) -> &LR1State {
        &self.states[&id]
    }

    /// Return the target of the edge `(from, symbol)`.
    pub fn transition(&self, from: StateID, symbol: SymbolID) -> Option<StateID> {
        self.states.get(&from)?.edges.get(&symbol).copied()
    }

    /// Iterate every edge `(from, symbol) -> to` of this automaton.
    pub fn transitions(&self) -> impl Iterator<Item = (StateID, SymbolID, StateID)> + '_ {
        self.states.iter().flat_map(|(&from, state)| {
            state
                .edges
                .iter()
                .map(move |(&symbol, &to)| (from, symbol, to))
        })
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, state)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }
                writeln!(f, "#### State {:02}", id)?;
                writeln!(f, "## items")?;
                for item in &state.items {
                    writeln!(f, "- {}", item.display(g))?;
                }
                if !state.edges.is_empty() {
                    writeln!(f, "## edges")?;
                    for (symbol, to) in &state.edges {
                        writeln!(f, "- {} -> {:02}", g.symbol_name(*symbol), to)?;
                    }
                }
            }
            Ok(())
        })
    }
}

/// The builder of the canonical collection.
///
/// The worklist and the discovered item sets are owned by one builder,
/// which is consumed by [`Builder::build`].
#[derive(Debug)]
pub struct Builder<'g> {
    grammar: &'g Grammar,
    first_sets: FirstSets,
    // 発見済みのitem set (挿入順がそのまま状態番号になる)
    item_sets: Set<ItemSet>,
    edges: Map<StateID, Map<SymbolID, StateID>>,
    pending: VecDeque<StateID>,
}

impl<'g> Builder<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            first_sets: FirstSets::new(grammar),
            item_sets: Set::default(),
            edges: Map::default(),
            pending: VecDeque::new(),
        }
    }

    /// クロージャ展開
    pub fn closure<I>(&self, items: I) -> ItemSet
    where
        I: IntoIterator<Item = LR1Item>,
    {
        let mut set = ItemSet::new();
        let mut pending = vec![];
        for item in items {
            if set.insert(item) {
                pending.push(item);
            }
        }

        while let Some(item) = pending.pop() {
            let rule = self.grammar.rule(item.rule);

            // [X -> ... @ Y beta, a]
            //  Y: one nonterminal symbol
            let (y_symbol, beta) = match &rule.right()[usize::from(item.marker)..] {
                [SymbolID::N(y_symbol), beta @ ..] => (*y_symbol, beta),
                _ => continue,
            };

            // First(beta a) を満たすすべての終端記号 b に対して [Y -> @ gamma, b] を追加する
            let lookaheads = self.first_sets.get(beta, item.lookahead);
            for rule in self.grammar.rules_of(y_symbol) {
                for b in lookaheads.iter() {
                    let new_item = LR1Item::new(rule.id(), b);
                    if set.insert(new_item) {
                        pending.push(new_item);
                    }
                }
            }
        }

        set
    }

    /// `Goto(I, X)`: an empty set if no item in `items` advances on `symbol`.
    pub fn goto(&self, items: &ItemSet, symbol: SymbolID) -> ItemSet {
        let advanced: Vec<LR1Item> = items
            .iter()
            .filter(|item| item.next_symbol(self.grammar) == Some(symbol))
            .map(LR1Item::advance)
            .collect();
        if advanced.is_empty() {
            return ItemSet::new();
        }
        self.closure(advanced)
    }

    /// Construct the canonical collection by breadth-first search from
    /// `Closure({[S' -> . S, $]})`.
    pub fn build(self) -> Result<LR1Automaton, BuildError> {
        self.build_with_first_sets().map(|(automaton, _)| automaton)
    }

    /// Same as [`Builder::build`], also handing back the FIRST sets used
    /// for the lookaheads.
    pub fn build_with_first_sets(mut self) -> Result<(LR1Automaton, FirstSets), BuildError> {
        let start = self.closure(Some(LR1Item::new(RuleID::ACCEPT, TerminalID::EOI)));
        let start = self.discover(start)?;
        debug_assert_eq!(start, StateID::START);

        let symbols: Vec<SymbolID> = self.grammar.symbols().collect();

        // 新規に状態が生成されなくなるまで繰り返す
        while let Some(current) = self.pending.pop_front() {
            let items = match self.item_sets.get_index(current.index()) {
                Some(items) => items.clone(),
                None => continue,
            };

            let next_symbols: Set<SymbolID> = items
                .iter()
                .filter_map(|item| item.next_symbol(self.grammar))
                .collect();

            let mut edges = Map::default();
            for &symbol in symbols.iter().filter(|s| next_symbols.contains(*s)) {
                let target = self.goto(&items, symbol);
                if target.is_empty() {
                    continue;
                }
                let target = self.discover(target)?;
                edges.insert(symbol, target);
            }

            tracing::trace!(
                "state {:?}: {} items, {} edges",
                current,
                items.len(),
                edges.len()
            );
            self.edges.insert(current, edges);
        }

        tracing::debug!(
            "built canonical LR(1) collection with {} states",
            self.item_sets.len()
        );

        let mut edges = self.edges;
        let states = self
            .item_sets
            .into_iter()
            .enumerate()
            .map(|(index, items)| {
                let id = StateID::from_index(index)?;
                let edges = edges.swap_remove(&id).unwrap_or_default();
                Ok((id, LR1State { items, edges }))
            })
            .collect::<Result<_, BuildError>>()?;

        Ok((LR1Automaton { states }, self.first_sets))
    }

    /// Look up the state for an item set, registering it when it is new.
    fn discover(&mut self, items: ItemSet) -> Result<StateID, BuildError> {
        let (index, inserted) = self.item_sets.insert_full(items);
        let id = StateID::from_index(index)?;
        if inserted {
            self.pending.push_back(id);
        }
        Ok(id)
    }
}
