//! Compile + execute benchmarks for the bytecode VM.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use marmoset::bytecode::{Compiler, Vm};

const FIB_RECURSIVE: &str = "
let fibonacci = fn(x) {
    if (x < 2) { x }
    else { fibonacci(x - 1) + fibonacci(x - 2) }
};
fibonacci(15);
";

const CLOSURE_CHAIN: &str = "
let newAdder = fn(a) { fn(b) { a + b } };
let build = fn(n, acc) {
    if (n == 0) { acc }
    else { build(n - 1, newAdder(n)(acc)) }
};
build(200, 0);
";

const ARRAY_BUILD: &str = "
let upTo = fn(n, acc) {
    if (n == 0) { acc }
    else { upTo(n - 1, push(acc, n)) }
};
len(upTo(100, []));
";

fn compile(source: &str) -> marmoset::bytecode::Bytecode {
    let program = marmoset::parse(source).expect("parse error");
    let mut compiler = Compiler::new();
    compiler.compile(&program).expect("compile error");
    compiler.bytecode()
}

fn run(source: &str) {
    let mut vm = Vm::new(compile(source));
    vm.run().expect("vm error");
}

fn vm_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("vm");

    group.bench_function("fib_recursive_15", |b| {
        b.iter(|| run(black_box(FIB_RECURSIVE)))
    });
    group.bench_function("closure_chain_200", |b| {
        b.iter(|| run(black_box(CLOSURE_CHAIN)))
    });
    group.bench_function("array_build_100", |b| {
        b.iter(|| run(black_box(ARRAY_BUILD)))
    });

    group.finish();
}

fn compile_benchmarks(c: &mut Criterion) {
    c.bench_function("compile_fib", |b| {
        b.iter(|| compile(black_box(FIB_RECURSIVE)))
    });
}

criterion_group!(benches, vm_benchmarks, compile_benchmarks);
criterion_main!(benches);
