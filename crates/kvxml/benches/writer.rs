use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use kvxml::{Object, Value, WriteOptions, Writer};

fn leaves(count: i32) -> Object {
    let values: Vec<Value> = (0..count).map(|i| Value::from(format!("value-{i}"))).collect();
    Object::from([("leaf", values)])
}

fn bench_stream_to_memory(c: &mut Criterion) {
    let data = leaves(10_000);
    let mut group = c.benchmark_group("kvxml_writer_10k_leaves");

    for threshold in [0_usize, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(threshold), &threshold, |b, &t| {
            let mut writer = Writer::new("bench.xml")
                .with_options(WriteOptions::default().with_flush_threshold(t));
            b.iter(|| {
                let mut out = Vec::with_capacity(256 * 1024);
                writer.write_to(&mut out, "root", &Object::new(), black_box(&data))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_stream_to_memory);
criterion_main!(benches);
