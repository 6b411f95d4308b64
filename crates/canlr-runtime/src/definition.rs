//! Parser definition.

use std::fmt;

/// The trait for abstracting the LR(1) parse table.
pub trait ParseTable {
    /// The number to identify the state of LR(1) automaton.
    type State: Copy + fmt::Debug + fmt::Display;

    /// The value to identify the terminal/nonterminal symbols.
    type Symbol: Clone + PartialEq + fmt::Debug + fmt::Display;

    /// The context value corresponding to the matched production rule.
    type Reduce: Clone;

    /// Return the initial state number.
    fn initial_state(&self) -> Self::State;

    /// Return the terminal symbol that marks the end of input.
    fn end_of_input(&self) -> Self::Symbol;

    /// Return the action corresponding to the specified state number and
    /// lookahead symbol.
    ///
    /// A `None` means that the table has no entry for this pair.
    fn action(
        &self,
        current: Self::State,
        lookahead: &Self::Symbol,
    ) -> Option<ParseAction<Self::State, Self::Symbol, Self::Reduce>>;

    /// Return the state to transition after reducing to `symbol`.
    fn goto(&self, current: Self::State, symbol: &Self::Symbol) -> Option<Self::State>;
}

impl<T: ?Sized> ParseTable for &T
where
    T: ParseTable,
{
    type State = T::State;
    type Symbol = T::Symbol;
    type Reduce = T::Reduce;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn end_of_input(&self) -> Self::Symbol {
        (**self).end_of_input()
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: &Self::Symbol,
    ) -> Option<ParseAction<Self::State, Self::Symbol, Self::Reduce>> {
        (**self).action(current, lookahead)
    }

    fn goto(&self, current: Self::State, symbol: &Self::Symbol) -> Option<Self::State> {
        (**self).goto(current, symbol)
    }
}

impl<T: ?Sized> ParseTable for std::rc::Rc<T>
where
    T: ParseTable,
{
    type State = T::State;
    type Symbol = T::Symbol;
    type Reduce = T::Reduce;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn end_of_input(&self) -> Self::Symbol {
        (**self).end_of_input()
    }

    fn action(
        &self,
        current: Self::State,
        lookahead: &Self::Symbol,
    ) -> Option<ParseAction<Self::State, Self::Symbol, Self::Reduce>> {
        (**self).action(current, lookahead)
    }

    fn goto(&self, current: Self::State, symbol: &Self::Symbol) -> Option<Self::State> {
        (**self).goto(current, symbol)
    }
}

impl<T: ?Sized> ParseTable for std::sync::Arc<T>
where
    T: ParseTable,
{
    type State = T::State;
    type Symbol = T::Symbol;
    type Reduce = T::Reduce;

    fn initial_state(&self) -> Self::State {
        (**self).initial_state()
    }

    fn end_of_input(&self) -> Self::Symbol {
        (**self).end_of_input()
    }

    fn action(
        &self,
        current: Self::State,
        input: &Self::Symbol,
    ) -> Option<ParseAction<Self::State, Self::Symbol, Self::Reduce>> {
        (**self).action(current, input)
    }

    fn goto(&self, current: Self::State, symbol: &Self::Symbol) -> Option<Self::State> {
        (**self).goto(current, symbol)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseAction<TState, TSymbol, TReduce> {
    /// Push the lookahead symbol and transition to the specified state.
    Shift(TState),

    /// Reduce by a production rule: its context value, its left-hand side
    /// and the number of symbols to pop (zero for an empty production).
    Reduce(TReduce, TSymbol, usize),

    Accept,
}
