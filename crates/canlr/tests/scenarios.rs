use canlr::{
    derivation::Derivation,
    grammar::{Grammar, END_MARKER},
    lexer,
    lr1::{Builder, LR1Automaton, StateID},
    parser::{parse, ParseError},
    runtime::StepAction,
    table::{Action, ParseTable},
};

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
fn accepts_and_round_trips() {
    let g = expr_grammar();
    let build = canlr::build(&g).unwrap();
    assert!(build.conflicts().is_empty());

    let input = ["id", "+", "id", "*", "id"];
    let outcome = parse(&g, &build.table, input);
    assert!(outcome.accepted);
    assert!(outcome.error.is_none());

    let first = &outcome.trace[0];
    assert_eq!(first.states, [StateID::START]);
    assert!(first.symbols.is_empty());
    assert_eq!(first.input, ["id", "+", "id", "*", "id", END_MARKER]);
    assert!(matches!(
        outcome.trace.last().map(|step| &step.action),
        Some(StepAction::Accept)
    ));

    let derivation = Derivation::rightmost("E", &outcome.reductions);
    assert_eq!(derivation.forms()[0], ["E"]);
    assert_eq!(derivation.sentence(), input);
}

#[test]
fn rejects_incomplete_input() {
    let g = expr_grammar();
    let build = canlr::build(&g).unwrap();

    let outcome = parse(&g, &build.table, ["id", "+"]);
    assert!(!outcome.accepted);
    match outcome.error {
        Some(ParseError::NoAction { state, symbol }) => {
            assert_eq!(symbol, END_MARKER);
            let eoi = g.terminal_id(END_MARKER).unwrap();
            assert_eq!(build.table.action(state, eoi), None);
        }
        err => panic!("unexpected error: {:?}", err),
    }
    assert!(matches!(
        outcome.trace.last().map(|step| &step.action),
        Some(StepAction::Error(..))
    ));
}

#[test]
fn rejects_end_marker_before_the_end() {
    let g = expr_grammar();
    let build = canlr::build(&g).unwrap();

    let outcome = parse(&g, &build.table, ["id", "$", "id"]);
    assert!(!outcome.accepted);
    assert!(outcome.reductions.is_empty());
    assert!(matches!(
        outcome.error,
        Some(ParseError::NoAction { symbol: END_MARKER, .. })
    ));
    let last = outcome.trace.last().unwrap();
    assert_eq!(last.input, ["$", "id", "$"]);

    // an explicit marker at the very end is fine
    assert!(parse(&g, &build.table, ["id", "$"]).accepted);
}

#[test]
fn accepts_parenthesized() {
    let g = expr_grammar();
    let build = canlr::build(&g).unwrap();

    let tokens = lexer::tokenize_expr("(a + 1)").unwrap();
    assert_eq!(tokens, ["(", "id", "+", "id", ")"]);
    let outcome = parse(&g, &build.table, tokens);
    assert!(outcome.accepted);
    let derivation = Derivation::rightmost("E", &outcome.reductions);
    assert_eq!(derivation.sentence(), ["(", "id", "+", "id", ")"]);
}

#[test]
fn ambiguous_grammar_still_has_tables() {
    let g = Grammar::from_productions("S", [("S", vec![vec!["S", "S"], vec!["a"]])]).unwrap();
    let build = canlr::build(&g).unwrap();

    assert!(!build.conflicts().is_empty());
    assert!(!build.table.is_lr1());
    assert_eq!(build.table.num_states(), build.num_states());

    // the first assigned action is kept, so the parser still runs
    let outcome = parse(&g, &build.table, ["a", "a"]);
    assert!(outcome.accepted);
}

#[test]
fn empty_production_pops_nothing() {
    let g = Grammar::from_productions(
        "S",
        [("S", vec![vec!["A", "b"]]), ("A", vec![vec!["a"], vec!["ε"]])],
    )
    .unwrap();
    let build = canlr::build(&g).unwrap();
    assert!(build.conflicts().is_empty());

    let outcome = parse(&g, &build.table, ["b"]);
    assert!(outcome.accepted);

    let first = outcome.reductions[0];
    assert_eq!(first.head(), "A");
    assert!(first.is_epsilon());
    assert_eq!(first.len(), 0);
    assert_eq!(first.to_string(), "A -> ε");

    // the stacks are unchanged by the pop, then grow by the goto
    let reduce = outcome
        .trace
        .iter()
        .position(|step| matches!(step.action, StepAction::Reduce(..)))
        .unwrap();
    assert_eq!(outcome.trace[reduce].states, [StateID::START]);
    assert_eq!(outcome.trace[reduce + 1].symbols, ["A"]);

    let derivation = Derivation::rightmost("S", &outcome.reductions);
    assert_eq!(derivation.sentence(), ["b"]);
}

fn all_grammars() -> Vec<Grammar> {
    vec![
        expr_grammar(),
        Grammar::from_productions(
            "S",
            [("S", vec![vec!["A", "b"]]), ("A", vec![vec!["a"], vec!["ε"]])],
        )
        .unwrap(),
        Grammar::from_productions("S", [("S", vec![vec!["S", "S"], vec!["a"]])]).unwrap(),
        canlr::syntax::parse(
            "List -> '[' Items ']'\n\
             Items -> Item Rest | ε\n\
             Rest -> ',' Item Rest | ε\n\
             Item -> num | List",
        )
        .unwrap(),
    ]
}

#[test]
fn closure_and_goto_properties() {
    for g in all_grammars() {
        let builder = Builder::new(&g);
        let automaton: LR1Automaton = Builder::new(&g).build().unwrap();

        for state in automaton.states.values() {
            assert_eq!(builder.closure(state.items.iter().copied()), state.items);
            for symbol in g.symbols() {
                let next = builder.goto(&state.items, symbol);
                assert_eq!(builder.goto(&state.items, symbol), next);
                match state.edges.get(&symbol) {
                    Some(to) => assert_eq!(automaton.state(*to).items, next),
                    None => assert!(next.is_empty()),
                }
            }
        }
    }
}

#[test]
fn invalid_inputs_are_diagnosed() {
    let g = canlr::syntax::parse(
        "List -> '[' Items ']'\n\
         Items -> Item Rest | ε\n\
         Rest -> ',' Item Rest | ε\n\
         Item -> num | List",
    )
    .unwrap();
    let build = canlr::build(&g).unwrap();
    assert!(build.table.is_lr1());

    for input in ["[ ]", "[ num ]", "[ num , [ ] , [ num ] ]"] {
        let outcome = parse(&g, &build.table, lexer::split_whitespace(input));
        assert!(outcome.accepted, "{}", input);
        let derivation = Derivation::rightmost("List", &outcome.reductions);
        assert_eq!(derivation.sentence(), lexer::split_whitespace(input));
    }

    for input in ["", "[", "[ num , ]", "[ ] ]", "[ num num ]", "[ ? ]"] {
        let outcome = parse(&g, &build.table, lexer::split_whitespace(input));
        assert!(!outcome.accepted, "{}", input);
        let error = outcome.error.unwrap();
        assert!(matches!(error, ParseError::NoAction { .. }), "{}", input);
        assert!(build.table.states.contains_key(&error.state()));
    }
}

#[test]
fn tables_are_shared_between_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Grammar>();
    assert_send_sync::<LR1Automaton>();
    assert_send_sync::<ParseTable>();

    let g = expr_grammar();
    let build = canlr::build(&g).unwrap();
    let inputs = ["id", "id + id", "( id ) * id", "id +"];
    std::thread::scope(|s| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| {
                let (g, table) = (&g, &build.table);
                s.spawn(move || parse(g, table, lexer::split_whitespace(input)).accepted)
            })
            .collect();
        let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, [true, true, true, false]);
    });
}

#[test]
fn accept_is_unique_to_end_of_input() {
    for g in all_grammars() {
        let build = canlr::build(&g).unwrap();
        let eoi = g.terminal_id(END_MARKER).unwrap();
        for row in build.table.states.values() {
            for (terminal, action) in &row.actions {
                if *action == Action::Accept {
                    assert_eq!(*terminal, eoi);
                }
            }
        }
    }
}
