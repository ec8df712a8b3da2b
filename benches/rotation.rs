use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mabsim::Rotator;
use std::hint::black_box;

fn bench_rotation(c: &mut Criterion) {
    let three = (
        vec![10.0, 40.0, 70.0],
        vec![
            "no hint",
            "A previous player found {max} paid the most.",
            "{min} is worse than {mid}, and {max} is best.",
        ],
    );
    let five = (
        vec![10.0, 20.0, 40.0, 30.0, 70.0],
        vec![
            "no hint",
            "{max2} beats {max1}.",
            "{min2}, {min1}, {mid}, {max1}, {max2} from worst to best.",
        ],
    );

    let mut group = c.benchmark_group("rotator");
    for (arms, hints) in [three, five] {
        let k = arms.len();
        group.bench_with_input(BenchmarkId::new("parse", k), &k, |b, &_k| {
            b.iter(|| black_box(Rotator::new(black_box(arms.clone()), &hints).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("full_cycle", k), &k, |b, &_k| {
            let base = Rotator::new(arms.clone(), &hints).unwrap();
            b.iter(|| {
                let mut r = base.clone();
                black_box(r.remaining_cycle());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rotation);
criterion_main!(benches);
