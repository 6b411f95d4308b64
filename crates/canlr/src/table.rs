//! Calculation of LR(1) parse table.

use crate::{
    grammar::{Grammar, NonterminalID, RuleID, SymbolID, TerminalID},
    lr1::{LR1Automaton, StateID},
    types::Map,
    util::display_fn,
};
use indexmap::map::Entry;
use std::fmt;

#[derive(Debug)]
pub struct ParseTable {
    pub states: Map<StateID, ParseTableRow>,
    /// The conflicts detected while filling the table, in detection order.
    pub conflicts: Vec<Conflict>,
}

#[derive(Debug, Default)]
#[non_exhaustive]
pub struct ParseTableRow {
    pub actions: Map<TerminalID, Action>,
    pub gotos: Map<NonterminalID, StateID>,
}

/// The action that the LR automaton in a state performs on a particular
/// lookahead symbol.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// Read a lookahead symbol and transition to the specified state.
    Shift(StateID),

    /// Reduce to the specified production rule.
    Reduce(RuleID),

    Accept,
}

impl Action {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| match self {
            Action::Shift(n) => write!(f, "shift({})", n),
            Action::Reduce(rule) => write!(f, "reduce({})", g.rule(*rule).display(g)),
            Action::Accept => f.write_str("accept"),
        })
    }
}

/// Two actions competing for the same `ACTION[state, terminal]` cell.
///
/// The action assigned first is the one kept in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateID,
    pub terminal: TerminalID,
    pub kept: Action,
    pub rejected: Action,
}

impl Conflict {
    pub fn is_shift_reduce(&self) -> bool {
        matches!(
            (self.kept, self.rejected),
            (Action::Shift(..), Action::Reduce(..)) | (Action::Reduce(..), Action::Shift(..))
        )
    }

    pub fn is_reduce_reduce(&self) -> bool {
        matches!(
            (self.kept, self.rejected),
            (Action::Reduce(..), Action::Reduce(..))
        )
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let kind = if self.is_shift_reduce() {
                "shift/reduce"
            } else if self.is_reduce_reduce() {
                "reduce/reduce"
            } else {
                "action"
            };
            write!(
                f,
                "{} conflict in state {} on `{}': kept {}, rejected {}",
                kind,
                self.state,
                g.terminals[&self.terminal],
                self.kept.display(g),
                self.rejected.display(g),
            )
        })
    }
}

impl ParseTable {
    /// Fill the ACTION/GOTO tables from the canonical collection.
    ///
    /// The table is always produced. When two actions compete for a cell,
    /// the one assigned first (shifts before reductions, items in order)
    /// stays and the other is recorded as a [`Conflict`].
    pub fn generate(g: &Grammar, automaton: &LR1Automaton) -> Self {
        let mut states = Map::default();
        let mut conflicts = vec![];

        for (&id, state) in &automaton.states {
            let mut row = ParseTableRow::default();

            // shift
            for item in &state.items {
                let Some(SymbolID::T(t)) = item.next_symbol(g) else {
                    continue;
                };
                if let Some(&next) = state.edges.get(&SymbolID::T(t)) {
                    set_action(&mut row, &mut conflicts, id, t, Action::Shift(next));
                }
            }

            // reduce / accept
            for item in &state.items {
                if !item.is_complete(g) {
                    continue;
                }
                let action = if item.rule == RuleID::ACCEPT {
                    if item.lookahead != TerminalID::EOI {
                        continue;
                    }
                    Action::Accept
                } else {
                    Action::Reduce(item.rule)
                };
                set_action(&mut row, &mut conflicts, id, item.lookahead, action);
            }

            // goto
            for (symbol, &next) in &state.edges {
                if let SymbolID::N(n) = symbol {
                    row.gotos.insert(*n, next);
                }
            }

            states.insert(id, row);
        }

        tracing::debug!(
            "generated parse table: {} states, {} conflicts",
            states.len(),
            conflicts.len()
        );

        Self { states, conflicts }
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// `ACTION[state, terminal]`
    pub fn action(&self, state: StateID, terminal: TerminalID) -> Option<Action> {
        self.states.get(&state)?.actions.get(&terminal).copied()
    }

    /// `GOTO[state, nonterminal]`
    pub fn goto(&self, state: StateID, nonterminal: NonterminalID) -> Option<StateID> {
        self.states.get(&state)?.gotos.get(&nonterminal).copied()
    }

    /// Return whether the grammar is LR(1), i.e. no conflict was recorded.
    pub fn is_lr1(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, (id, row)) in self.states.iter().enumerate() {
                if i > 0 {
                    writeln!(f)?;
                }

                writeln!(f, "#### State {:02}", id)?;
                writeln!(f, "## actions")?;
                for (token, action) in &row.actions {
                    writeln!(f, "- {} => {}", g.terminals[token], action.display(g))?;
                }

                writeln!(f, "## gotos")?;
                for (symbol, goto) in &row.gotos {
                    writeln!(f, "- {} => goto({})", g.nonterminals[symbol], goto)?;
                }
            }

            if !self.conflicts.is_empty() {
                writeln!(f, "\n#### Conflicts")?;
                for conflict in &self.conflicts {
                    writeln!(f, "- {}", conflict.display(g))?;
                }
            }
            Ok(())
        })
    }
}

fn set_action(
    row: &mut ParseTableRow,
    conflicts: &mut Vec<Conflict>,
    state: StateID,
    terminal: TerminalID,
    action: Action,
) {
    match row.actions.entry(terminal) {
        Entry::Vacant(entry) => {
            entry.insert(action);
        }
        Entry::Occupied(entry) => {
            let kept = *entry.get();
            if kept != action {
                tracing::trace!("conflict in state {:?}: {:?} vs {:?}", state, kept, action);
                conflicts.push(Conflict {
                    state,
                    terminal,
                    kept,
                    rejected: action,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lr1::Builder;

    fn expr_grammar() -> Grammar {
        Grammar::from_productions(
            "E",
            [
                ("E", vec![vec!["E", "+", "T"], vec!["T"]]),
                ("T", vec![vec!["T", "*", "F"], vec!["F"]]),
                ("F", vec![vec!["(", "E", ")"], vec!["id"]]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn expression_grammar_is_lr1() {
        let g = expr_grammar();
        let automaton = Builder::new(&g).build().unwrap();
        let table = ParseTable::generate(&g, &automaton);

        assert!(table.is_lr1());
        assert_eq!(table.num_states(), automaton.len());

        // Goto(0, E) has the accepting item [E' -> E ., $].
        let e = g.nonterminal_id("E").unwrap();
        let after_e = table.goto(StateID::START, e).unwrap();
        assert_eq!(table.action(after_e, TerminalID::EOI), Some(Action::Accept));

        // Nothing starts with `+`.
        let plus = g.terminal_id("+").unwrap();
        assert_eq!(table.action(StateID::START, plus), None);

        let id = g.terminal_id("id").unwrap();
        assert!(matches!(
            table.action(StateID::START, id),
            Some(Action::Shift(..))
        ));
    }

    #[test]
    fn accept_only_on_end_of_input() {
        let g = expr_grammar();
        let automaton = Builder::new(&g).build().unwrap();
        let table = ParseTable::generate(&g, &automaton);

        let accepts: Vec<_> = table
            .states
            .iter()
            .flat_map(|(id, row)| {
                row.actions
                    .iter()
                    .filter(|(_, action)| **action == Action::Accept)
                    .map(move |(t, _)| (*id, *t))
            })
            .collect();
        assert_eq!(accepts.len(), 1);
        assert_eq!(accepts[0].1, TerminalID::EOI);
    }

    #[test]
    fn ambiguous_grammar_keeps_first_action() {
        let g = Grammar::from_productions("S", [("S", vec![vec!["S", "S"], vec!["a"]])]).unwrap();
        let automaton = Builder::new(&g).build().unwrap();
        let table = ParseTable::generate(&g, &automaton);

        assert!(!table.is_lr1());
        assert!(table.conflicts.iter().any(Conflict::is_shift_reduce));
        for conflict in &table.conflicts {
            assert_ne!(conflict.kept, conflict.rejected);
            assert_eq!(
                table.action(conflict.state, conflict.terminal),
                Some(conflict.kept)
            );
            // shifts are assigned before reductions
            if conflict.is_shift_reduce() {
                assert!(matches!(conflict.kept, Action::Shift(..)));
            }
        }
        assert_eq!(table.num_states(), automaton.len());
    }

    #[test]
    fn reduce_reduce_conflict() {
        // S -> A | B ; A -> x ; B -> x
        let g = Grammar::from_productions(
            "S",
            [
                ("S", vec![vec!["A"], vec!["B"]]),
                ("A", vec![vec!["x"]]),
                ("B", vec![vec!["x"]]),
            ],
        )
        .unwrap();
        let automaton = Builder::new(&g).build().unwrap();
        let table = ParseTable::generate(&g, &automaton);

        assert_eq!(table.conflicts.len(), 1);
        let conflict = &table.conflicts[0];
        assert!(conflict.is_reduce_reduce());
        assert_eq!(conflict.terminal, TerminalID::EOI);

        let a = g.nonterminal_id("A").unwrap();
        let kept = match conflict.kept {
            Action::Reduce(rule) => rule,
            _ => panic!("unexpected action"),
        };
        assert_eq!(g.rule(kept).left(), a);
        assert!(conflict
            .display(&g)
            .to_string()
            .starts_with("reduce/reduce conflict"));
    }

    #[test]
    fn display_table() {
        let g = Grammar::from_productions("S", [("S", vec![vec!["a"]])]).unwrap();
        let automaton = Builder::new(&g).build().unwrap();
        let table = ParseTable::generate(&g, &automaton);

        let text = table.display(&g).to_string();
        assert!(text.contains("#### State 00"));
        assert!(text.contains("- a => shift(1)"));
        assert!(text.contains("- S => goto(2)"));
        assert!(text.contains("- $ => accept"));
        assert!(text.contains("- $ => reduce(S -> a)"));
        assert!(!text.contains("Conflicts"));
    }
}
