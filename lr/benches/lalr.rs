use criterion::{criterion_group, criterion_main, Criterion};
use lr::ParserKind;

static EARLE: &str = include_str!("../../src/earle.pg");

fn build(kind: ParserKind) {
  let grammar = grammar::build(EARLE).unwrap();
  let _table = lr::build(&grammar, kind).unwrap();
}

fn earle_benchmark(c: &mut Criterion) {
  c.bench_function("earle slr", |b| b.iter(|| build(ParserKind::Slr)));
  c.bench_function("earle lalr", |b| b.iter(|| build(ParserKind::Lalr)));
}

criterion_group!{
  name = benches;
  config = Criterion::default().significance_level(0.1).sample_size(10);
  targets = earle_benchmark
}
criterion_main!(benches);
