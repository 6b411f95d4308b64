//! Runtime library for table-driven LR(1) parsers.

pub mod definition;
pub mod parser;

pub use crate::{
    definition::{ParseAction, ParseTable},
    parser::{ParseError, ParseOutcome, ParseStatus, Parser, StepAction, TraceStep},
};
