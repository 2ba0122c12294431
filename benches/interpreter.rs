use criterion::{black_box, criterion_group, criterion_main, Criterion};
use corvus::Engine;

fn eval_simple_arithmetic(c: &mut Criterion) {
    c.bench_function("eval_simple_arithmetic", |b| {
        b.iter(|| {
            let mut engine = Engine::new();
            engine.eval(black_box("1 + 2 * 3 - 4 / 2")).unwrap()
        });
    });
}

fn eval_fibonacci_recursive(c: &mut Criterion) {
    let input = "function fib(n) { return n <= 1 ? n : fib(n - 1) + fib(n - 2); } fib(15)";
    c.bench_function("eval_fibonacci_recursive", |b| {
        b.iter(|| {
            let mut engine = Engine::new();
            engine.eval(black_box(input)).unwrap()
        });
    });
}

fn eval_array_pipeline(c: &mut Criterion) {
    let input = "var xs = []; for (var i = 0; i < 1000; i++) xs.push(i);
        xs.map(x => x * 2).filter(x => x % 3 === 0).reduce((a, b) => a + b, 0)";
    c.bench_function("eval_array_pipeline", |b| {
        b.iter(|| {
            let mut engine = Engine::new();
            engine.eval(black_box(input)).unwrap()
        });
    });
}

fn eval_object_property_access(c: &mut Criterion) {
    let input = "var o = {a: 1, b: 2, c: 3};
        var sum = 0;
        for (var i = 0; i < 1000; i++) sum += o.a + o.b + o.c;
        sum";
    c.bench_function("eval_object_property_access", |b| {
        b.iter(|| {
            let mut engine = Engine::new();
            engine.eval(black_box(input)).unwrap()
        });
    });
}

fn eval_closures_in_loop(c: &mut Criterion) {
    let input = "var fns = [];
        for (let i = 0; i < 1000; i++) fns.push(() => i);
        fns.reduce((a, f) => a + f(), 0)";
    c.bench_function("eval_closures_in_loop", |b| {
        b.iter(|| {
            let mut engine = Engine::new();
            engine.eval(black_box(input)).unwrap()
        });
    });
}

criterion_group!(
    benches,
    eval_simple_arithmetic,
    eval_fibonacci_recursive,
    eval_array_pipeline,
    eval_object_property_access,
    eval_closures_in_loop
);
criterion_main!(benches);
