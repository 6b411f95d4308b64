//! Construction of canonical LR(1) parse tables.

pub mod derivation;
pub mod first_sets;
pub mod follow_sets;
pub mod grammar;
pub mod lexer;
pub mod lr1;
pub mod parser;
pub mod syntax;
pub mod table;
pub mod types;
pub mod util;

pub use canlr_runtime as runtime;

use crate::{
    first_sets::FirstSets,
    grammar::Grammar,
    lr1::{BuildError, LR1Automaton},
    table::ParseTable,
};

/// The canonical collection and the parse table derived from a grammar.
#[derive(Debug)]
pub struct Build {
    pub automaton: LR1Automaton,
    pub table: ParseTable,
    /// The FIRST sets the lookaheads were computed from.
    pub first_sets: FirstSets,
}

impl Build {
    pub fn num_states(&self) -> usize {
        self.automaton.len()
    }

    pub fn conflicts(&self) -> &[table::Conflict] {
        &self.table.conflicts
    }
}

/// Construct the canonical LR(1) collection and its ACTION/GOTO tables.
///
/// Conflicts never abort the construction; they are recorded in the table.
pub fn build(grammar: &Grammar) -> Result<Build, BuildError> {
    let (automaton, first_sets) = lr1::Builder::new(grammar).build_with_first_sets()?;
    let table = ParseTable::generate(grammar, &automaton);
    Ok(Build {
        automaton,
        table,
        first_sets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_keeps_first_sets() {
        let g = Grammar::from_productions(
            "S",
            [("S", vec![vec!["A", "b"]]), ("A", vec![vec!["a"], vec!["ε"]])],
        )
        .unwrap();
        let build = build(&g).unwrap();

        let expected = FirstSets::new(&g);
        assert_eq!(build.first_sets.iter().count(), expected.iter().count());
        for (symbol, first) in expected.iter() {
            assert_eq!(build.first_sets.first(symbol), first);
        }
        assert_eq!(build.table.num_states(), build.num_states());
    }
}
