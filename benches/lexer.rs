use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use corvus::Lexer;

fn lex_simple_arithmetic(c: &mut Criterion) {
    c.bench_function("lex_simple_arithmetic", |b| {
        b.iter(|| Lexer::tokenize(black_box("1 + 2 * 3 - 4 / 2")));
    });
}

fn lex_template_literal(c: &mut Criterion) {
    let input = "`hello ${name}, you are ${age + 1} years old`";
    c.bench_function("lex_template_literal", |b| {
        b.iter(|| Lexer::tokenize(black_box(input)));
    });
}

fn lex_regex_vs_divide(c: &mut Criterion) {
    let input = "a / b; /foo[bar]+/g.test(s); x = y / z";
    c.bench_function("lex_regex_vs_divide", |b| {
        b.iter(|| Lexer::tokenize(black_box(input)));
    });
}

fn lex_scalability(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer_scalability");
    for size in &[10, 100, 1000, 10000] {
        let input = generate_statements(*size);
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| Lexer::tokenize(black_box(input)));
        });
    }
    group.finish();
}

fn generate_statements(count: usize) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    for i in 0..count {
        let _ = writeln!(out, "var x{i} = {i} + {i};");
    }
    out
}

criterion_group!(benches, lex_simple_arithmetic, lex_template_literal, lex_regex_vs_divide, lex_scalability);
criterion_main!(benches);
