//! Compile benchmarks: condition text → executable condition.
//!
//! Measures the one-time cost paid per rule at load time: scanning, parsing,
//! checking, and matcher construction (especially regex).

use gatecond::prelude::*;

fn main() {
    divan::main();
}

#[derive(Debug)]
struct Ctx {
    value: String,
}

fn value_fetcher() -> Box<dyn Fetcher<Ctx>> {
    Box::new(FnFetcher::new("value", |ctx: &Ctx| Ok(Value::Str(ctx.value.clone()))))
}

fn table() -> PrimitiveTable<Ctx> {
    register_core_primitives(PrimitiveTableBuilder::<Ctx>::new())
        .primitive("value_in", &[ArgKind::Str, ArgKind::Bool], |args| {
            Ok(Condition::primitive(
                "value_in",
                value_fetcher(),
                Box::new(InMatcher::new(args.str(0)?, args.bool(1)?)),
            ))
        })
        .primitive("value_regmatch", &[ArgKind::Str], |args| {
            Ok(Condition::primitive(
                "value_regmatch",
                value_fetcher(),
                Box::new(RegMatcher::new(args.str(0)?)?),
            ))
        })
        .build()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Front end only
// ═══════════════════════════════════════════════════════════════════════════════

const TYPICAL: &str = r#"value_in("/api|/static", false) && !value_in("/admin", true)
    || value_regmatch("^/v[0-9]+/") && default_t()"#;

#[divan::bench]
fn tokenize_typical() -> usize {
    gatecond::scanner::tokenize(divan::black_box(TYPICAL)).0.len()
}

#[divan::bench]
fn parse_typical() -> bool {
    gatecond::parser::parse(divan::black_box(TYPICAL)).is_ok()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Full build
// ═══════════════════════════════════════════════════════════════════════════════

#[divan::bench]
fn build_typical(bencher: divan::Bencher) {
    let table = table();
    let compiler = Compiler::new(&table);
    bencher.bench_local(|| compiler.build(TYPICAL));
}

#[divan::bench]
fn build_regex_complex(bencher: divan::Bencher) {
    let table = table();
    let compiler = Compiler::new(&table);
    bencher.bench_local(|| {
        compiler.build(r#"value_regmatch("^/api/v[1-3]/(users|orders|products)/[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$")"#)
    });
}

#[divan::bench(args = [10, 100, 1000])]
fn build_in_list(bencher: divan::Bencher, n: usize) {
    let table = table();
    let compiler = Compiler::new(&table);
    let patterns = (0..n).map(|i| format!("/p{i}")).collect::<Vec<_>>().join("|");
    let text = format!("value_in(\"{patterns}\", true)");
    bencher.bench_local(|| compiler.build(&text));
}

#[divan::bench(args = [1, 10, 50, 100])]
fn build_or_chain(bencher: divan::Bencher, n: usize) {
    let table = table();
    let compiler = Compiler::new(&table);
    let text = (0..n)
        .map(|i| format!("value_in(\"/p{i}\", false)"))
        .collect::<Vec<_>>()
        .join(" || ");
    bencher.bench_local(|| compiler.build(&text));
}

#[divan::bench]
fn build_rejected_semantic(bencher: divan::Bencher) {
    let table = table();
    let compiler = Compiler::new(&table);
    bencher.bench_local(|| compiler.build(r#"value_in("/a") && unknown()"#));
}
