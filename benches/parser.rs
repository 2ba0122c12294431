use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use corvus::Parser;

fn parse_simple_expr(c: &mut Criterion) {
    c.bench_function("parse_simple_expr", |b| {
        b.iter(|| {
            let mut parser = Parser::new(black_box("1 + 2 * 3"));
            parser.parse_program()
        });
    });
}

fn parse_function_with_default_params(c: &mut Criterion) {
    let input = "function fib(n, memo = {}) {
        if (n <= 1) return n;
        if (memo[n]) return memo[n];
        return memo[n] = fib(n - 1, memo) + fib(n - 2, memo);
    }";
    c.bench_function("parse_function_with_default_params", |b| {
        b.iter(|| {
            let mut parser = Parser::new(black_box(input));
            parser.parse_program()
        });
    });
}

fn parse_class_hierarchy(c: &mut Criterion) {
    let input = "class Animal { constructor(name) { this.name = name; } speak() { return this.name; } }
    class Dog extends Animal { speak() { return super.speak() + ' woof'; } }";
    c.bench_function("parse_class_hierarchy", |b| {
        b.iter(|| {
            let mut parser = Parser::new(black_box(input));
            parser.parse_program()
        });
    });
}

fn parse_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_scalability");
    for size in &[10, 100, 1000, 10000] {
        let input = generate_large_input(*size);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| {
                let mut parser = Parser::new(black_box(input));
                parser.parse_program()
            });
        });
    }
    group.finish();
}

fn parse_nested_expr(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_nesting");
    for depth in &[5, 10, 20, 50] {
        let input = generate_nested_expr(*depth);
        group.bench_with_input(BenchmarkId::from_parameter(depth), &input, |b, input| {
            b.iter(|| {
                let mut parser = Parser::new(black_box(input));
                parser.parse_program()
            });
        });
    }
    group.finish();
}

fn generate_large_input(num_statements: usize) -> String {
    use std::fmt::Write;
    let mut input = String::new();
    for i in 0..num_statements {
        let _ = writeln!(input, "let var_{i} = {i};");
    }
    input
}

fn generate_nested_expr(depth: usize) -> String {
    let mut expr = "42".to_string();
    for _ in 0..depth {
        expr = format!("({expr} + 1)");
    }
    expr
}

criterion_group!(
    benches,
    parse_simple_expr,
    parse_function_with_default_params,
    parse_class_hierarchy,
    parse_scalability,
    parse_nested_expr
);
criterion_main!(benches);
