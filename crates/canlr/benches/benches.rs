use std::{env, path::PathBuf};

use canlr::{lexer, parser, syntax};
use criterion::{criterion_group, criterion_main, Criterion};

criterion_main!(benches);
criterion_group!(benches, bench_tables, bench_parse);

fn bench_tables(c: &mut Criterion) {
    bench_table_gen(c, "arithmetic");
    bench_table_gen(c, "lvalue");
    bench_table_gen(c, "lists");
}

fn bench_table_gen(c: &mut Criterion, grammar_name: &str) {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    let grammar =
        syntax::parse_file(project_root.join(format!("tests/{}.bnf", grammar_name))).unwrap();

    c.bench_function(grammar_name, |b| {
        b.iter(|| canlr::build(&grammar).unwrap());
    });
}

fn bench_parse(c: &mut Criterion) {
    let grammar = syntax::parse(
        "E -> E + T | T\n\
         T -> T * F | F\n\
         F -> ( E ) | id",
    )
    .unwrap();
    let build = canlr::build(&grammar).unwrap();
    let source = "(a + b) * c + d * (e + f * (g + h)) + i";
    let tokens = lexer::tokenize_expr(source).unwrap();

    c.bench_function("parse_expr", |b| {
        b.iter(|| parser::parse(&grammar, &build.table, tokens.iter().copied()));
    });
}
