//! Calculation of follow set function.

use crate::{
    first_sets::{FirstSets, TerminalSet},
    grammar::{Grammar, NonterminalID, SymbolID, TerminalID},
    types::Map,
};

/// The FOLLOW sets of every nonterminal symbol in a grammar.
#[derive(Debug)]
pub struct FollowSets {
    map: Map<NonterminalID, TerminalSet>,
}

impl FollowSets {
    pub fn new(grammar: &Grammar, first_sets: &FirstSets) -> Self {
        let mut map: Map<NonterminalID, TerminalSet> = grammar
            .nonterminals
            .keys()
            .map(|&id| (id, TerminalSet::default()))
            .collect();
        map[&NonterminalID::START].insert(TerminalID::EOI);

        // A -> α B β という構文規則に対し、
        //  - First(β) \ {ε} ⊆ Follow(B)
        //  - β が nullable ならば Follow(A) ⊆ Follow(B)
        let mut changed = true;
        while changed {
            changed = false;
            for rule in grammar.rules.values() {
                for (i, symbol) in rule.right().iter().enumerate() {
                    let SymbolID::N(b) = *symbol else {
                        continue;
                    };
                    let beta = first_sets.first_of_sequence(&rule.right()[i + 1..]);

                    let mut added = beta.terminals().clone();
                    if beta.has_epsilon() {
                        added.union_with(&map[&rule.left()]);
                    }

                    let follow = &mut map[&b];
                    let before = follow.len();
                    follow.union_with(&added);
                    changed |= follow.len() > before;
                }
            }
        }

        Self { map }
    }

    /// `Follow(A)`
    pub fn get(&self, symbol: NonterminalID) -> &TerminalSet {
        &self.map[&symbol]
    }

    pub fn iter(&self) -> impl Iterator<Item = (NonterminalID, &TerminalSet)> + '_ {
        self.map.iter().map(|(symbol, follow)| (*symbol, follow))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(g: &Grammar, set: &TerminalSet) -> Vec<String> {
        let mut names: Vec<_> = set.iter().map(|t| g.terminals[&t].name().to_owned()).collect();
        names.sort();
        names
    }

    #[test]
    fn expression_follow_sets() {
        let g = Grammar::from_productions(
            "E",
            [
                ("E", vec![vec!["E", "+", "T"], vec!["T"]]),
                ("T", vec![vec!["T", "*", "F"], vec!["F"]]),
                ("F", vec![vec!["(", "E", ")"], vec!["id"]]),
            ],
        )
        .unwrap();
        let first = FirstSets::new(&g);
        let follow = FollowSets::new(&g, &first);
        let get = |name| names(&g, follow.get(g.nonterminal_id(name).unwrap()));

        assert_eq!(get("E"), ["$", ")", "+"]);
        assert_eq!(get("T"), ["$", ")", "*", "+"]);
        assert_eq!(get("F"), ["$", ")", "*", "+"]);
    }

    #[test]
    fn nullable_tail_propagates() {
        let g = Grammar::from_productions(
            "S",
            [
                ("S", vec![vec!["A", "B"]]),
                ("A", vec![vec!["a"]]),
                ("B", vec![vec!["b"], vec!["ε"]]),
            ],
        )
        .unwrap();
        let first = FirstSets::new(&g);
        let follow = FollowSets::new(&g, &first);
        let get = |name| names(&g, follow.get(g.nonterminal_id(name).unwrap()));

        assert_eq!(get("A"), ["$", "b"]);
        assert_eq!(get("B"), ["$"]);
    }
}
