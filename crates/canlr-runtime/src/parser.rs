//! The implementation of LR(1) parser engine.

use crate::definition::{ParseAction, ParseTable};
use std::fmt;

/// The instance of LR(1) parser engine that drives a whole token sequence,
/// recording every step it takes.
pub struct Parser<TDef>
where
    TDef: ParseTable,
{
    definition: TDef,
    input: Vec<TDef::Symbol>,
    cursor: usize,
    states_stack: Vec<TDef::State>,
    symbols_stack: Vec<TDef::Symbol>,
    status: ParseStatus,
    trace: Vec<TraceStep<TDef::State, TDef::Symbol, TDef::Reduce>>,
    reductions: Vec<TDef::Reduce>,
    error: Option<ParseError<TDef::State, TDef::Symbol>>,
}

impl<TDef> fmt::Debug for Parser<TDef>
where
    TDef: ParseTable + fmt::Debug,
    TDef::Reduce: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("definition", &self.definition)
            .field("status", &self.status)
            .field("input", &self.input)
            .field("cursor", &self.cursor)
            .field("states_stack", &self.states_stack)
            .field("symbols_stack", &self.symbols_stack)
            .finish_non_exhaustive()
    }
}

/// The status of a [`Parser`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ParseStatus {
    Running,
    Accepted,
    Rejected,
}

impl<TDef> Parser<TDef>
where
    TDef: ParseTable,
{
    /// Create a parser for the specified token sequence.
    ///
    /// The end-of-input marker is appended unless the sequence already ends
    /// with it.
    pub fn new<I>(definition: TDef, tokens: I) -> Self
    where
        I: IntoIterator<Item = TDef::Symbol>,
    {
        let end = definition.end_of_input();
        let mut input: Vec<_> = tokens.into_iter().collect();
        if input.last() != Some(&end) {
            input.push(end);
        }
        let initial_state = definition.initial_state();
        Self {
            definition,
            input,
            cursor: 0,
            states_stack: vec![initial_state],
            symbols_stack: vec![],
            status: ParseStatus::Running,
            trace: vec![],
            reductions: vec![],
            error: None,
        }
    }

    pub fn status(&self) -> ParseStatus {
        self.status
    }

    pub fn states_stack(&self) -> &[TDef::State] {
        &self.states_stack
    }

    pub fn symbols_stack(&self) -> &[TDef::Symbol] {
        &self.symbols_stack
    }

    /// Return the input which has not been shifted yet.
    pub fn remaining(&self) -> &[TDef::Symbol] {
        &self.input[self.cursor.min(self.input.len())..]
    }

    pub fn trace(&self) -> &[TraceStep<TDef::State, TDef::Symbol, TDef::Reduce>] {
        &self.trace
    }

    /// Perform a single action of the automaton.
    ///
    /// Once the parser has stopped, this is a no-op returning the final status.
    pub fn step(&mut self) -> ParseStatus {
        if self.status != ParseStatus::Running {
            return self.status;
        }

        let current = self.current_state();
        let lookahead = match self.input.get(self.cursor) {
            Some(symbol) => symbol.clone(),
            None => self.definition.end_of_input(),
        };

        // The end-of-input marker is only valid as the last symbol.
        let is_last = self.cursor + 1 >= self.input.len();
        if !is_last && lookahead == self.definition.end_of_input() {
            self.reject(ParseError::NoAction {
                state: current,
                symbol: lookahead,
            });
            return self.status;
        }

        match self.definition.action(current, &lookahead) {
            None => {
                self.reject(ParseError::NoAction {
                    state: current,
                    symbol: lookahead,
                });
            }

            Some(ParseAction::Shift(next)) => {
                tracing::trace!("state {}: shift `{}', goto {}", current, lookahead, next);
                self.record(StepAction::Shift {
                    symbol: lookahead.clone(),
                    target: next,
                });
                self.symbols_stack.push(lookahead);
                self.states_stack.push(next);
                self.cursor += 1;
            }

            Some(ParseAction::Reduce(reduce, lhs, n)) => {
                tracing::trace!("state {}: reduce to `{}' (pop {})", current, lhs, n);
                self.record(StepAction::Reduce(reduce.clone()));

                if n > self.symbols_stack.len() {
                    self.reject(ParseError::StackUnderflow {
                        state: current,
                        symbol: lhs,
                    });
                    return self.status;
                }
                self.states_stack.truncate(self.states_stack.len() - n);
                self.symbols_stack.truncate(self.symbols_stack.len() - n);

                let top = self.current_state();
                match self.definition.goto(top, &lhs) {
                    Some(next) => {
                        self.symbols_stack.push(lhs);
                        self.states_stack.push(next);
                        self.reductions.push(reduce);
                    }
                    None => {
                        self.reject(ParseError::NoGoto {
                            state: top,
                            symbol: lhs,
                        });
                    }
                }
            }

            Some(ParseAction::Accept) => {
                tracing::trace!("state {}: accept", current);
                self.record(StepAction::Accept);
                self.status = ParseStatus::Accepted;
            }
        }

        self.status
    }

    /// Drive the parser until it accepts or rejects the input.
    pub fn run(mut self) -> ParseOutcome<TDef::State, TDef::Symbol, TDef::Reduce> {
        while self.step() == ParseStatus::Running {}
        tracing::debug!(
            "parser stopped after {} steps: {:?}",
            self.trace.len(),
            self.status
        );
        ParseOutcome {
            accepted: self.status == ParseStatus::Accepted,
            trace: self.trace,
            reductions: self.reductions,
            error: self.error,
        }
    }

    fn current_state(&self) -> TDef::State {
        // The bottom of the stack is never popped.
        match self.states_stack.last() {
            Some(state) => *state,
            None => self.definition.initial_state(),
        }
    }

    fn record(&mut self, action: StepAction<TDef::State, TDef::Symbol, TDef::Reduce>) {
        self.trace.push(TraceStep {
            states: self.states_stack.clone(),
            symbols: self.symbols_stack.clone(),
            input: self.remaining().to_vec(),
            action,
        });
    }

    fn reject(&mut self, error: ParseError<TDef::State, TDef::Symbol>) {
        tracing::trace!("rejected: {}", error);
        self.record(StepAction::Error(error.clone()));
        self.error.replace(error);
        self.status = ParseStatus::Rejected;
    }
}

/// A snapshot of the parser configuration together with the action chosen
/// in that configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceStep<TState, TSymbol, TReduce> {
    pub states: Vec<TState>,
    pub symbols: Vec<TSymbol>,
    pub input: Vec<TSymbol>,
    pub action: StepAction<TState, TSymbol, TReduce>,
}

impl<TState, TSymbol, TReduce> fmt::Display for TraceStep<TState, TSymbol, TReduce>
where
    TState: fmt::Display,
    TSymbol: fmt::Display,
    TReduce: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_list(f, &self.states)?;
        f.write_str(" | ")?;
        write_list(f, &self.symbols)?;
        f.write_str(" | ")?;
        write_list(f, &self.input)?;
        write!(f, " | {}", self.action)
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str("]")
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepAction<TState, TSymbol, TReduce> {
    Shift { symbol: TSymbol, target: TState },
    Reduce(TReduce),
    Accept,
    Error(ParseError<TState, TSymbol>),
}

impl<TState, TSymbol, TReduce> fmt::Display for StepAction<TState, TSymbol, TReduce>
where
    TState: fmt::Display,
    TSymbol: fmt::Display,
    TReduce: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift { symbol, target } => write!(f, "shift `{}', goto {}", symbol, target),
            Self::Reduce(reduce) => write!(f, "reduce {}", reduce),
            Self::Accept => f.write_str("accept"),
            Self::Error(err) => write!(f, "error: {}", err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError<TState, TSymbol> {
    #[error("no action for `{symbol}' in state {state}")]
    NoAction { state: TState, symbol: TSymbol },

    #[error("no goto for `{symbol}' from state {state}")]
    NoGoto { state: TState, symbol: TSymbol },

    #[error("stack underflow while reducing to `{symbol}' in state {state}")]
    StackUnderflow { state: TState, symbol: TSymbol },
}

impl<TState: Copy, TSymbol> ParseError<TState, TSymbol> {
    /// Return the state where the error was detected.
    pub fn state(&self) -> TState {
        match self {
            Self::NoAction { state, .. }
            | Self::NoGoto { state, .. }
            | Self::StackUnderflow { state, .. } => *state,
        }
    }

    /// Return the symbol that had no entry in the table.
    pub fn symbol(&self) -> &TSymbol {
        match self {
            Self::NoAction { symbol, .. }
            | Self::NoGoto { symbol, .. }
            | Self::StackUnderflow { symbol, .. } => symbol,
        }
    }
}

/// The result of driving a [`Parser`] to completion.
#[derive(Debug, Clone)]
pub struct ParseOutcome<TState, TSymbol, TReduce> {
    pub accepted: bool,
    pub trace: Vec<TraceStep<TState, TSymbol, TReduce>>,
    /// The applied reductions, in application order.
    pub reductions: Vec<TReduce>,
    pub error: Option<ParseError<TState, TSymbol>>,
}
