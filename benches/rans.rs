use criterion::measurement::WallTime;
use criterion::{criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use rz::rans::{self, CodecOptions};

const SIZES: &[usize] = &[8192, 65536, 4_194_304];

fn cap(group: &mut BenchmarkGroup<'_, WallTime>) {
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(5));
    group.sample_size(10);
}

fn test_data(size: usize) -> Vec<u8> {
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    let full = pattern.repeat(size / pattern.len() + 1);
    full[..size].to_vec()
}

fn bench_rans(c: &mut Criterion) {
    let mut group = c.benchmark_group("rans");
    cap(&mut group);
    for &size in SIZES {
        let data = test_data(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("encode", size), &data, |b, data| {
            b.iter(|| rans::encode(data));
        });

        let encoded = rans::encode(&data);
        group.bench_with_input(BenchmarkId::new("decode", size), &encoded, |b, enc| {
            b.iter(|| rans::decode(enc).unwrap());
        });
    }
    group.finish();
}

fn bench_rans_interleave(c: &mut Criterion) {
    let mut group = c.benchmark_group("rans_interleave");
    cap(&mut group);
    let data = test_data(4_194_304);
    group.throughput(Throughput::Bytes(data.len() as u64));

    for k in [1usize, 2, 4] {
        let options = CodecOptions {
            interleave: k,
            ..Default::default()
        };

        group.bench_with_input(BenchmarkId::new("encode", k), &data, |b, data| {
            b.iter(|| rans::encode_with_options(data, &options).unwrap());
        });

        let encoded = rans::encode_with_options(&data, &options).unwrap();
        group.bench_with_input(BenchmarkId::new("decode", k), &encoded, |b, enc| {
            b.iter(|| rans::decode_with_options(enc, &options).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rans, bench_rans_interleave);
criterion_main!(benches);
