use authz_core::{has_access, intersection, union, AccessRuleSet};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn rules_fixture() -> AccessRuleSet {
    [
        ("/", false),
        ("/ca", true),
        ("/ca/issue", true),
        ("/ca/renew", false),
        ("/ra", true),
        ("/ra/approve", false),
        ("/audit", true),
    ]
    .into_iter()
    .collect()
}

fn bench_has_access(c: &mut Criterion) {
    let rules = rules_fixture();
    let resources = vec![
        "/ca",
        "/ca/issue/ee",
        "/ca/issue/ee/deeper/path",
        "/unmatched/resource/far/down/the/tree",
    ];

    let mut group = c.benchmark_group("has_access");
    for resource in resources {
        group.bench_with_input(
            BenchmarkId::from_parameter(resource),
            &resource,
            |b, &resource| {
                b.iter(|| has_access(black_box(&rules), black_box(resource)));
            },
        );
    }
    group.finish();
}

fn bench_combinators(c: &mut Criterion) {
    let a = rules_fixture();
    let b_set: AccessRuleSet = [("/", true), ("/ca", false), ("/ra/approve", true)]
        .into_iter()
        .collect();

    let mut group = c.benchmark_group("combine");
    group.bench_function("union", |bench| {
        bench.iter(|| union(black_box(&a), black_box(&b_set)));
    });
    group.bench_function("intersection", |bench| {
        bench.iter(|| intersection(black_box(&a), black_box(&b_set)));
    });
    group.finish();
}

criterion_group!(benches, bench_has_access, bench_combinators);
criterion_main!(benches);
