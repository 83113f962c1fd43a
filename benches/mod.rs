use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use impliedvol_rs::prelude::*;
use std::hint::black_box;

fn chain(size: usize) -> QuoteBatch {
    (0..size)
        .map(|i| {
            let strike = 80.0 + 40.0 * (i % 41) as f64 / 40.0;
            let time = 0.05 + (i % 7) as f64 * 0.15;
            let vol = 0.15 + (i % 5) as f64 * 0.1;
            let option_type = if i % 2 == 0 {
                OptionType::Call
            } else {
                OptionType::Put
            };
            let contract = OptionQuote::new(100.0, strike, time, 0.03, option_type, 0.0);
            contract.with_price(BlackScholes::price(&contract, vol))
        })
        .collect()
}

fn bench_solve_batch(c: &mut Criterion) {
    let solver = ImpliedVolSolver::default();
    let mut group = c.benchmark_group("solve_batch");
    for size in [1, 64, 1_024, 16_384] {
        let batch = chain(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &batch, |b, batch| {
            b.iter(|| solver.solve_batch(black_box(batch)))
        });
    }
    group.finish();
}

fn bench_single_quote(c: &mut Criterion) {
    let solver = ImpliedVolSolver::default();
    let quote = OptionQuote::call(100.0, 100.0, 0.25, 0.01, 5.0);
    c.bench_function("solve_single_atm", |b| b.iter(|| solver.solve(black_box(&quote))));
}

criterion_group!(benches, bench_solve_batch, bench_single_quote);
criterion_main!(benches);
