use std::{hint::black_box, io::Cursor};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geobin::codec::{
    text::{read_text, write_text},
    varint::{read_varint_u64, write_varint_i64, write_varint_u64},
};
use rand::{rngs::SmallRng, Rng, SeedableRng};

fn bench_varint_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("varint_write");
    for value in [0u64, 127, 16_384, u32::MAX as u64, u64::MAX] {
        group.bench_with_input(BenchmarkId::from_parameter(value), &value, |b, &v| {
            let mut buf = Vec::with_capacity(16);
            b.iter(|| {
                buf.clear();
                write_varint_u64(&mut buf, black_box(v)).unwrap();
            })
        });
    }
    group.finish();
}

fn bench_varint_read_mixed(c: &mut Criterion) {
    let mut rng = SmallRng::seed_from_u64(42);
    let mut buf = Vec::new();
    for _ in 0..1000 {
        let bits = rng.gen_range(0..64);
        write_varint_u64(&mut buf, rng.gen::<u64>() >> bits).unwrap();
    }

    c.bench_function("varint_read 1000 mixed", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(black_box(buf.as_slice()));
            for _ in 0..1000 {
                black_box(read_varint_u64(&mut cursor).unwrap());
            }
        })
    });
}

fn bench_zigzag_small_negative(c: &mut Criterion) {
    c.bench_function("varint_i64 -1..-1000", |b| {
        let mut buf = Vec::with_capacity(4096);
        b.iter(|| {
            buf.clear();
            for v in -1000i64..0 {
                write_varint_i64(&mut buf, black_box(v)).unwrap();
            }
        })
    });
}

fn bench_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_roundtrip");
    // 127 и 128 символов: вокруг границы блока в 255 байт
    for len in [8usize, 127, 128, 1024] {
        let text = "ж".repeat(len);
        group.throughput(Throughput::Bytes((len * 2) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &text, |b, t| {
            let mut buf = Vec::with_capacity(len * 2 + 8);
            let mut scratch = Vec::new();
            b.iter(|| {
                buf.clear();
                write_text(&mut buf, black_box(t)).unwrap();
                black_box(read_text(&mut buf.as_slice(), &mut scratch, "bench").unwrap());
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_varint_write,
    bench_varint_read_mixed,
    bench_zigzag_small_negative,
    bench_text
);
criterion_main!(benches);
