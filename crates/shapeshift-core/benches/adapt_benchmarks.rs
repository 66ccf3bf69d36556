//! Benchmarks for plan compilation and cached adaptation
//!
//! Compiling is expected to dominate the first call for a pair; every later
//! call should only pay for the rule loop.
//!
//! Copyright (c) 2025 Specado Team
//! Licensed under the Apache-2.0 license

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shapeshift_core::model::{ClassDescriptor, ScalarKind, TypeRef};
use shapeshift_core::{Mapper, Value};

fn register(mapper: &Mapper) {
    let registry = mapper.registry();
    for (name, line, id) in [("Order", "Line", ScalarKind::I32), ("OrderDto", "LineDto", ScalarKind::String)] {
        registry.register_class(
            ClassDescriptor::builder(line)
                .member("Sku", TypeRef::scalar(ScalarKind::String))
                .member("Quantity", TypeRef::scalar(ScalarKind::I32))
                .member("Price", TypeRef::scalar(ScalarKind::F64))
                .build(),
        );
        registry.register_class(
            ClassDescriptor::builder(name)
                .member("Id", TypeRef::scalar(id))
                .member("Customer", TypeRef::scalar(ScalarKind::String))
                .member("Lines", TypeRef::list(TypeRef::named(line)))
                .build(),
        );
    }
}

fn create_order(mapper: &Mapper, lines: usize) -> Value {
    let registry = mapper.registry();
    let lines = (0..lines)
        .map(|i| {
            let line = registry
                .create_instance("Line")
                .and_then(|l| l.with("Sku", format!("SKU-{}", i)))
                .and_then(|l| l.with("Quantity", i as i32))
                .and_then(|l| l.with("Price", i as f64 * 1.5));
            Value::Object(line.expect("fixture line"))
        })
        .collect();
    let order = registry
        .create_instance("Order")
        .and_then(|o| o.with("Id", 42i32))
        .and_then(|o| o.with("Customer", "ACME"))
        .and_then(|o| o.with("Lines", Value::List(lines)))
        .expect("fixture order");
    Value::Object(order)
}

fn bench_compile(c: &mut Criterion) {
    c.bench_function("compile_plan", |b| {
        b.iter(|| {
            let mapper = Mapper::new();
            register(&mapper);
            black_box(mapper.plan("Order", "OrderDto").expect("plan"))
        })
    });

    c.bench_function("compile_projection", |b| {
        b.iter(|| {
            let mapper = Mapper::new();
            register(&mapper);
            black_box(mapper.projection("Order", "OrderDto").expect("projection"))
        })
    });
}

fn bench_adapt(c: &mut Criterion) {
    let mapper = Mapper::new();
    register(&mapper);
    let mut group = c.benchmark_group("adapt");

    for lines in [1usize, 10, 100, 1000] {
        let order = create_order(&mapper, lines);
        mapper.adapt(&order, "OrderDto").expect("warm up");

        group.bench_with_input(BenchmarkId::new("eager", lines), &order, |b, order| {
            b.iter(|| black_box(mapper.adapt(black_box(order), "OrderDto").expect("adapt")))
        });

        group.bench_with_input(BenchmarkId::new("projection", lines), &order, |b, order| {
            b.iter(|| {
                let query = mapper.query("Order", vec![order.clone()]).expect("query");
                let projected: Vec<_> = mapper.project(query).to("OrderDto").expect("project").collect();
                black_box(projected)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_adapt);
criterion_main!(benches);
