//! Performance benchmarks for the sweep evaluator.
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use sweepvm::common::config::InterpreterConfig;
use sweepvm::frontend::compiler;
use sweepvm::{Evaluator, Interpreter};

/// Benchmark compiling source text into a token vector.
fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    let source = "add 2 3";
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("compile_trivial", |b| {
        b.iter(|| compiler::compile(source));
    });

    group.finish();
}

/// Benchmark a single sweep over a small arithmetic expression.
fn bench_single_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");

    let tokens = compiler::compile("add 2 3").unwrap();
    group.bench_function("sweep_add", |b| {
        b.iter(|| {
            let mut eval = Evaluator::new(tokens.clone(), InterpreterConfig::default());
            let _ = eval.run();
        });
    });

    group.finish();
}

/// Benchmark a program that runs for several sweeps before converging.
fn bench_multi_sweep_nesting(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_reduction");
    group.throughput(Throughput::Elements(1));

    let tokens = compiler::compile(
        "mul add mul add 1 2 add 3 4 sub 10 5 sub add 6 7 add 8 9",
    )
    .unwrap();

    group.bench_function("nested_arithmetic", |b| {
        b.iter(|| {
            let mut eval = Evaluator::new(tokens.clone(), InterpreterConfig::default());
            let _ = eval.run();
        });
    });

    group.finish();
}

/// Benchmark end-to-end `compile` + `run` at a few program sizes.
fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");

    let programs = [
        ("trivial", "add 2 3"),
        ("conditional", "if 1 q 42 q 99"),
        ("print", "list print str 216 end"),
    ];

    for (name, source) in programs {
        group.bench_with_input(BenchmarkId::from_parameter(name), source, |b, source| {
            b.iter(|| {
                let mut interpreter = Interpreter::compile(source, InterpreterConfig::default()).unwrap();
                let _ = interpreter.run();
            });
        });
    }

    group.finish();
}

/// Benchmark configuration construction and serialization.
fn bench_configuration(c: &mut Criterion) {
    let mut group = c.benchmark_group("configuration");

    let config = InterpreterConfig::default();

    group.bench_function("create_default", |b| {
        b.iter(InterpreterConfig::default);
    });

    group.bench_function("serialize_toml", |b| {
        b.iter(|| toml::to_string(&config));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_compile,
    bench_single_sweep,
    bench_multi_sweep_nesting,
    bench_end_to_end,
    bench_configuration
);
criterion_main!(benches);
