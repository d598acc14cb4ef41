use std::{hint::black_box, io::Cursor};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geobin::{
    open_reader, CompressedWriter, Compression, GeoRecord, KindFilter, Line, Metadata, Point,
    RecordReader, RecordWriter,
};
use geobin_error::GeoResult;
use rand::{rngs::SmallRng, Rng, SeedableRng};

const RECORDS: usize = 10_000;

fn random_records(count: usize) -> Vec<GeoRecord> {
    let mut rng = SmallRng::seed_from_u64(7);
    (0..count)
        .map(|i| {
            let meta = Metadata {
                id: Some(i as i64),
                version: rng.gen_bool(0.8).then(|| rng.gen_range(1..20)),
                ..Default::default()
            };
            if rng.gen_bool(0.7) {
                Point {
                    meta,
                    latitude: Some(rng.gen_range(-90.0..90.0)),
                    longitude: Some(rng.gen_range(-180.0..180.0)),
                }
                .into()
            } else {
                Line {
                    meta,
                    node_refs: (0..rng.gen_range(2..32)).map(|_| rng.gen()).collect(),
                }
                .into()
            }
        })
        .collect()
}

fn write_stream(
    records: &[GeoRecord],
    compression: Compression,
) -> GeoResult<Vec<u8>> {
    let mut writer = RecordWriter::new(CompressedWriter::new(Vec::new(), compression, 3)?);
    writer.initialize()?;
    for record in records {
        writer.add(record)?;
    }
    writer.into_inner()?.finish()
}

fn bench_write(c: &mut Criterion) {
    let records = random_records(RECORDS);
    let mut group = c.benchmark_group("stream_write");
    group.throughput(Throughput::Elements(RECORDS as u64));
    for compression in [Compression::None, Compression::Gzip, Compression::Zstd] {
        group.bench_with_input(
            BenchmarkId::from_parameter(compression),
            &compression,
            |b, &cmp| b.iter(|| black_box(write_stream(&records, cmp).unwrap())),
        );
    }
    group.finish();
}

fn bench_read(c: &mut Criterion) {
    let records = random_records(RECORDS);
    let mut group = c.benchmark_group("stream_read");
    group.throughput(Throughput::Elements(RECORDS as u64));
    for compression in [Compression::None, Compression::Gzip, Compression::Zstd] {
        let bytes = write_stream(&records, compression).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(compression), &bytes, |b, data| {
            b.iter(|| {
                let source = open_reader(Cursor::new(data.as_slice()), compression).unwrap();
                let mut reader = RecordReader::new(source);
                let mut n = 0usize;
                while reader.advance_filtered(KindFilter::NONE).unwrap() {
                    n += 1;
                }
                black_box(n)
            })
        });
    }
    group.finish();
}

fn bench_read_filtered(c: &mut Criterion) {
    let bytes = write_stream(&random_records(RECORDS), Compression::None).unwrap();
    let filter = KindFilter {
        skip_points: true,
        ..KindFilter::NONE
    };
    c.bench_function("stream_read skip points", |b| {
        b.iter(|| {
            let mut reader = RecordReader::new(Cursor::new(bytes.as_slice()));
            let mut n = 0usize;
            while reader.advance_filtered(filter).unwrap() {
                n += 1;
            }
            black_box(n)
        })
    });
}

criterion_group!(benches, bench_write, bench_read, bench_read_filtered);
criterion_main!(benches);
