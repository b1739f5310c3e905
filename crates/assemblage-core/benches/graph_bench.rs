//! # Graph Benchmarks
//!
//! Performance benchmarks for assemblage-core assembly operations.
//!
//! Run with: `cargo bench -p assemblage-core`

use assemblage_core::{
    Assembly, Entity, EntityHandle, Relationship, assembly_from_json, assembly_to_json,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn nodes(size: usize) -> Vec<EntityHandle> {
    (0..size)
        .map(|i| EntityHandle::new(Entity::with_descriptor(format!("e{i}"), "element")))
        .collect()
}

/// Create an assembly with relationships between consecutive entities.
fn create_chain(size: usize) -> Assembly {
    let nodes = nodes(size);
    let mut asm = Assembly::new();
    for pair in nodes.windows(2) {
        let rel = Relationship::new(pair[0].clone(), pair[1].clone(), "next").expect("rel");
        asm.add_relationship(rel);
    }
    asm
}

/// Create an assembly with a hub related to every other entity.
fn create_star(size: usize) -> Assembly {
    let nodes = nodes(size);
    let mut asm = Assembly::new();
    for spoke in nodes.iter().skip(1) {
        let rel = Relationship::new(nodes[0].clone(), spoke.clone(), "hosts").expect("rel");
        asm.add_relationship(rel);
    }
    asm
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_add_relationship(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_relationship");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(create_chain(size)));
        });
    }

    group.finish();
}

fn bench_get_entities(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_entities");

    for size in [100, 1000, 10000].iter() {
        let asm = create_star(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &asm, |b, asm| {
            b.iter(|| black_box(asm.get_entities(None)));
        });
    }

    group.finish();
}

fn bench_clone_deep(c: &mut Criterion) {
    let mut group = c.benchmark_group("clone_deep");

    for size in [100, 1000, 10000].iter() {
        let asm = create_chain(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &asm, |b, asm| {
            b.iter(|| black_box(asm.clone_deep()));
        });
    }

    group.finish();
}

fn bench_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_round_trip");

    for size in [100, 1000].iter() {
        let asm = create_chain(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &asm, |b, asm| {
            b.iter(|| {
                let json = assembly_to_json(asm).expect("ser");
                black_box(assembly_from_json(&json).expect("de"))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_add_relationship,
    bench_get_entities,
    bench_clone_deep,
    bench_round_trip
);
criterion_main!(benches);
