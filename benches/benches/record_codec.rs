use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use geobin::{
    encoded_len, from_bytes, to_bytes, GeoRecord, Line, Member, Metadata, Point, RecordKind,
    Relation, Tags, Timestamp,
};

fn meta(id: i64) -> Metadata {
    Metadata {
        id: Some(id),
        changeset_id: Some(1_000 + id),
        timestamp: Some(Timestamp::from_ticks(633_568_522_650_000_000)),
        user_id: Some(12),
        user_name: Some("bench-user".to_string()),
        version: Some(3),
        visible: Some(true),
        tags: Tags::from_iter([("highway", "residential"), ("name", "Hauptstraße")]),
    }
}

fn sample_records() -> Vec<GeoRecord> {
    vec![
        Point {
            meta: meta(1),
            latitude: Some(52.52),
            longitude: Some(13.405),
        }
        .into(),
        Line {
            meta: meta(2),
            node_refs: (0..200).collect(),
        }
        .into(),
        Relation {
            meta: meta(3),
            members: (0..50)
                .map(|i| Member::new(i, "outer", RecordKind::Line))
                .collect(),
        }
        .into(),
    ]
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    for record in sample_records() {
        group.throughput(Throughput::Bytes(encoded_len(&record) as u64));
        group.bench_function(record.kind().as_str(), |b| {
            b.iter(|| black_box(to_bytes(black_box(&record)).unwrap()))
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for record in sample_records() {
        let bytes = to_bytes(&record).unwrap();
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_function(record.kind().as_str(), |b| {
            b.iter(|| black_box(from_bytes(black_box(&bytes)).unwrap()))
        });
    }
    group.finish();
}

fn bench_encoded_len(c: &mut Criterion) {
    let records = sample_records();
    c.bench_function("encoded_len 3 kinds", |b| {
        b.iter(|| {
            records
                .iter()
                .map(|r| encoded_len(black_box(r)))
                .sum::<usize>()
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_encoded_len);
criterion_main!(benches);
