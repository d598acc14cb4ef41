#![no_main]

use std::io::Cursor;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use geobin::{to_bytes, RecordReader, WireFormat};

#[derive(Debug, Arbitrary)]
enum FuzzFormat {
    Current,
    Legacy,
}

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    data: Vec<u8>,
    format: FuzzFormat,
    skip_points: bool,
    skip_lines: bool,
    skip_relations: bool,
}

impl From<FuzzFormat> for WireFormat {
    fn from(f: FuzzFormat) -> Self {
        match f {
            FuzzFormat::Current => WireFormat::Current,
            FuzzFormat::Legacy => WireFormat::Legacy,
        }
    }
}

fuzz_target!(|input: FuzzInput| {
    let format = input.format.into();
    let mut reader = RecordReader::seekable(Cursor::new(&input.data)).with_format(format);

    // Декодер не должен паниковать ни на каких данных; после ошибки
    // читатель обязан отказываться читать дальше.
    let mut decoded = Vec::new();
    loop {
        match reader.advance(input.skip_points, input.skip_lines, input.skip_relations) {
            Ok(true) => {
                if let Some(record) = reader.current() {
                    decoded.push(record.clone());
                }
            }
            Ok(false) => break,
            Err(_) => {
                assert!(reader.is_poisoned());
                assert!(reader.advance(false, false, false).is_err());
                break;
            }
        }
    }

    // Всё, что прочитано, снова кодируется в текущем формате.
    for record in &decoded {
        let bytes = to_bytes(record).expect("decoded record must re-encode");
        assert!(!bytes.is_empty());
    }

    if reader.can_reset() {
        reader.reset().expect("reset of an in-memory source");
        assert!(reader.current().is_none());
    }
});
