#![no_main]

use std::io::Cursor;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use geobin::{open_reader, Compression, RecordReader};

#[derive(Debug, Arbitrary)]
enum FuzzCompression {
    Gzip,
    Zstd,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    data: Vec<u8>,
    compression: FuzzCompression,
}

fuzz_target!(|input: FuzzInput| {
    let compression = match input.compression {
        FuzzCompression::Gzip => Compression::Gzip,
        FuzzCompression::Zstd => Compression::Zstd,
    };

    // Повреждённый поток должен давать ошибку, а не панику
    let Ok(source) = open_reader(Cursor::new(&input.data), compression) else {
        return;
    };
    for result in RecordReader::new(source).take(10_000) {
        if result.is_err() {
            break;
        }
    }
});
