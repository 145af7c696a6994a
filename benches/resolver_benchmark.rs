use criterion::{black_box, criterion_group, criterion_main, Criterion};

use biteguard::{resolve, KnowledgeBase, Prediction};

fn predictions(n: usize) -> Vec<Prediction> {
    (0..n)
        .map(|i| {
            let label = match i % 4 {
                0 => format!("Mosquito Bite {}", i),
                1 => format!("Tick {}", i),
                2 => format!("Unlabeled Marking {}", i),
                _ => format!("Spider {}", i),
            };
            Prediction::new(label, ((i % 100) as f32) / 100.0)
        })
        .collect()
}

fn bench_resolution(c: &mut Criterion) {
    let kb = KnowledgeBase::builtin();
    let mut group = c.benchmark_group("Resolution");
    group.sample_size(100);
    group.warm_up_time(std::time::Duration::from_secs(1));

    for &n in &[3usize, 10, 100, 1000] {
        let input = predictions(n);
        group.bench_function(format!("resolve_{}", n), |b| {
            b.iter(|| resolve(black_box(&input), kb))
        });
    }

    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let kb = KnowledgeBase::builtin();
    let mut group = c.benchmark_group("Matching");
    group.sample_size(100);

    let hit = [Prediction::new("Mosquito Bite", 0.9)];
    group.bench_function("label_hit", |b| b.iter(|| resolve(black_box(&hit), kb)));

    let miss = [Prediction::new("Completely Unrelated Marking", 0.9)];
    group.bench_function("label_miss", |b| b.iter(|| resolve(black_box(&miss), kb)));

    group.finish();
}

criterion_group!(benches, bench_resolution, bench_matching);
criterion_main!(benches);
