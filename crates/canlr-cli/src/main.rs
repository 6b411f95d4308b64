use anyhow::Context as _;
use canlr::{
    derivation::Derivation,
    first_sets::FirstSets,
    follow_sets::FollowSets,
    grammar::{Grammar, SymbolID},
    lexer, parser, syntax,
};
use clap::{Parser, ValueEnum};
use std::{fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The path of grammar definition file.
    grammar: PathBuf,

    /// Read the input to parse from the specified file.
    #[arg(short, long, conflicts_with = "tokens")]
    input: Option<PathBuf>,

    /// The input to parse.
    #[arg(short, long)]
    tokens: Option<String>,

    /// How the input is split into terminal symbols.
    #[arg(long, value_enum, default_value_t = Lexer::Whitespace)]
    lexer: Lexer,

    /// Dump the canonical LR(1) collection.
    #[arg(long)]
    automaton: bool,

    /// Dump the ACTION/GOTO tables.
    #[arg(long)]
    table: bool,

    /// Dump the FIRST and FOLLOW sets.
    #[arg(long)]
    first: bool,

    /// Dump every step of the parser.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Lexer {
    /// Arithmetic expressions: numbers and identifiers become `id`.
    Expr,
    /// Every whitespace-separated word is a terminal symbol.
    Whitespace,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::trace!("CLI args = {:?}", args);

    let grammar = syntax::parse_file(&args.grammar).with_context(|| {
        anyhow::anyhow!("failed to load grammar from {}", args.grammar.display())
    })?;

    let build = canlr::build(&grammar)?;
    println!("{} states", build.num_states());
    for conflict in build.conflicts() {
        println!("[warning] {}", conflict.display(&grammar));
    }

    if args.first {
        dump_first_sets(&grammar, &build.first_sets);
    }
    if args.automaton {
        println!("{}", build.automaton.display(&grammar));
    }
    if args.table {
        println!("{}", build.table.display(&grammar));
    }

    let source = match (&args.input, &args.tokens) {
        (Some(path), _) => fs::read_to_string(path)
            .with_context(|| anyhow::anyhow!("failed to read input from {}", path.display()))?,
        (None, Some(tokens)) => tokens.clone(),
        (None, None) => return Ok(()),
    };
    let tokens = match args.lexer {
        Lexer::Expr => lexer::tokenize_expr(&source)?,
        Lexer::Whitespace => lexer::split_whitespace(&source),
    };

    let outcome = parser::parse(&grammar, &build.table, tokens);
    if args.trace {
        println!("\n## trace");
        for (i, step) in outcome.trace.iter().enumerate() {
            println!("{:>4}: {}", i, step);
        }
    }

    if let Some(error) = outcome.error {
        let expected = parser::expected_terminals(&grammar, &build.table, error.state());
        anyhow::bail!("rejected: {} (expected one of {:?})", error, expected);
    }

    println!("\n## derivation");
    let start = grammar.nonterminals[&grammar.start_symbol].name();
    println!("{}", Derivation::rightmost(start, &outcome.reductions));
    println!("\naccepted");

    Ok(())
}

fn dump_first_sets(grammar: &Grammar, first_sets: &FirstSets) {
    let follow_sets = FollowSets::new(grammar, first_sets);

    println!("## FIRST");
    for (symbol, first) in first_sets.iter() {
        if let SymbolID::N(..) = symbol {
            println!("{} : {}", grammar.symbol_name(symbol), first.display(grammar));
        }
    }

    println!("\n## FOLLOW");
    for (nonterminal, follow) in follow_sets.iter() {
        let names: Vec<_> = follow
            .iter()
            .map(|t| grammar.terminals[&t].name())
            .collect();
        println!(
            "{} : {{{}}}",
            grammar.nonterminals[&nonterminal],
            names.join(", ")
        );
    }
}
