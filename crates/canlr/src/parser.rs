//! Driving the generated tables with the runtime parser engine.

use crate::{
    grammar::{Grammar, NonterminalID, RuleID, SymbolID, TerminalID, END_MARKER},
    lr1::StateID,
    table::{Action, ParseTable},
    types::Map,
};
use canlr_runtime::{definition::ParseAction, parser::Parser};
use std::fmt;

/// The outcome of parsing a token sequence against a grammar.
pub type ParseOutcome<'g> = canlr_runtime::ParseOutcome<StateID, &'g str, Production<'g>>;

/// A single step of the parse trace.
pub type TraceStep<'g> = canlr_runtime::TraceStep<StateID, &'g str, Production<'g>>;

pub type ParseError<'g> = canlr_runtime::ParseError<StateID, &'g str>;

/// A production rule borrowed from a grammar.
#[derive(Copy, Clone)]
pub struct Production<'g> {
    grammar: &'g Grammar,
    id: RuleID,
}

impl<'g> Production<'g> {
    pub fn new(grammar: &'g Grammar, id: RuleID) -> Self {
        Self { grammar, id }
    }

    pub fn id(&self) -> RuleID {
        self.id
    }

    pub fn head(&self) -> &'g str {
        let rule = self.grammar.rule(self.id);
        self.grammar.nonterminals[&rule.left()].name()
    }

    /// Return the names of the right-hand side; empty for `A -> ε`.
    pub fn body(&self) -> impl Iterator<Item = &'g str> + 'g {
        let grammar = self.grammar;
        grammar
            .rule(self.id)
            .right()
            .iter()
            .map(move |symbol| grammar.symbol_name(*symbol))
    }

    /// The number of symbols popped when reducing by this production.
    pub fn len(&self) -> usize {
        self.grammar.rule(self.id).right().len()
    }

    pub fn is_epsilon(&self) -> bool {
        self.grammar.rule(self.id).is_epsilon()
    }
}

impl PartialEq for Production<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.grammar, other.grammar) && self.id == other.id
    }
}

impl fmt::Debug for Production<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Production")
            .field(&self.id)
            .field(&self.to_string())
            .finish()
    }
}

impl fmt::Display for Production<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.grammar.rule(self.id).display(self.grammar))
    }
}

/// The ACTION/GOTO tables bound to their grammar, so that the parser engine
/// can look up the symbols by name.
#[derive(Debug, Clone)]
pub struct Tables<'g> {
    grammar: &'g Grammar,
    table: &'g ParseTable,
    terminals: Map<&'g str, TerminalID>,
    nonterminals: Map<&'g str, NonterminalID>,
}

impl<'g> Tables<'g> {
    pub fn new(grammar: &'g Grammar, table: &'g ParseTable) -> Self {
        let terminals = grammar
            .terminals
            .values()
            .map(|t| (t.name(), t.id()))
            .collect();
        let nonterminals = grammar
            .nonterminals
            .values()
            .map(|n| (n.name(), n.id()))
            .collect();
        Self {
            grammar,
            table,
            terminals,
            nonterminals,
        }
    }
}

impl<'g> canlr_runtime::ParseTable for Tables<'g> {
    type State = StateID;
    type Symbol = &'g str;
    type Reduce = Production<'g>;

    fn initial_state(&self) -> StateID {
        StateID::START
    }

    fn end_of_input(&self) -> &'g str {
        END_MARKER
    }

    fn action(
        &self,
        current: StateID,
        lookahead: &&'g str,
    ) -> Option<ParseAction<StateID, &'g str, Production<'g>>> {
        // An unknown token simply has no entry in the table.
        let terminal = self.terminals.get(lookahead).copied()?;
        Some(match self.table.action(current, terminal)? {
            Action::Shift(next) => ParseAction::Shift(next),
            Action::Reduce(rule) => {
                let production = Production::new(self.grammar, rule);
                ParseAction::Reduce(production, production.head(), production.len())
            }
            Action::Accept => ParseAction::Accept,
        })
    }

    fn goto(&self, current: StateID, symbol: &&'g str) -> Option<StateID> {
        let nonterminal = self.nonterminals.get(symbol).copied()?;
        self.table.goto(current, nonterminal)
    }
}

/// Parse a sequence of terminal names, appending `$` if absent.
pub fn parse<'g, I>(grammar: &'g Grammar, table: &'g ParseTable, tokens: I) -> ParseOutcome<'g>
where
    I: IntoIterator<Item = &'g str>,
{
    Parser::new(Tables::new(grammar, table), tokens).run()
}

/// Return the terminal names that have an action in the specified state.
pub fn expected_terminals<'g>(
    grammar: &'g Grammar,
    table: &'g ParseTable,
    state: StateID,
) -> Vec<&'g str> {
    table
        .states
        .get(&state)
        .into_iter()
        .flat_map(|row| row.actions.keys())
        .map(|t| grammar.symbol_name(SymbolID::T(*t)))
        .collect()
}
