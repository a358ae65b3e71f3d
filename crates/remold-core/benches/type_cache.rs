use criterion::{Criterion, criterion_group, criterion_main};
use remold_core::{ClassType, Primitive, Type, TypeCache};
use std::hint::black_box;

fn class(i: usize) -> Type {
    Type::Class(
        ClassType::new(format!("bench.C{}", i % 64))
            .with_member("value", "int")
            .with_member("next", format!("bench.C{}", (i + 1) % 64)),
    )
}

/// Interning hits and misses, and assignability along a supertype chain
fn bench_type_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("type_cache");

    group.bench_function("intern_hit", |b| {
        let cache = TypeCache::new();
        for i in 0..64 {
            cache.intern(class(i));
        }
        let mut i = 0;
        b.iter(|| {
            i += 1;
            black_box(cache.intern(class(i)))
        });
    });

    group.bench_function("intern_miss", |b| {
        b.iter(|| {
            let cache = TypeCache::new();
            for i in 0..64 {
                black_box(cache.intern(class(i)));
            }
        });
    });

    group.bench_function("is_assignable_from", |b| {
        let cache = TypeCache::new();
        let mut chain = vec![cache.build_class("bench.Root")];
        for depth in 0..16 {
            let parent = chain[chain.len() - 1];
            chain.push(cache.intern(Type::Class(
                ClassType::new(format!("bench.D{depth}")).with_supertype(Some(parent)),
            )));
        }
        let (root, leaf) = (chain[0], chain[chain.len() - 1]);
        let int = cache.primitive(Primitive::Int);
        b.iter(|| {
            black_box(cache.is_assignable_from(root, leaf));
            black_box(cache.is_assignable_from(int, leaf));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_type_cache);
criterion_main!(benches);
