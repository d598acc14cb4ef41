/// Binary record codec: primitives, current and legacy formats.
pub mod codec;
/// CLI settings loading.
pub mod config;
/// Subscriber setup (formatting, filters).
pub mod logging;
/// Record model: points, lines, relations, tags.
pub mod model;
/// Streaming reader/writer and source/sink capabilities.
pub mod stream;
/// Transparent gzip/zstd wrappers around byte sources and sinks.
pub mod transport;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Record encoding and decoding.
pub use codec::{
    decode_legacy_record, decode_record, decode_unflagged_record, encode_record, encoded_len,
    from_bytes, read_record, to_bytes, WireFormat,
};
/// config
pub use config::{Settings, SettingsError};
/// Operation errors and result types.
pub use geobin_error::{CodecError, GeoResult, StackError, StatusCode};
/// Data model.
pub use model::{
    GeoRecord, Line, Member, Metadata, Point, RecordKind, Relation, Tag, Tags, Timestamp,
};
/// Streaming API.
pub use stream::{
    copy_records, KindFilter, ReadStats, RecordReader, RecordSink, RecordSource, RecordWriter,
    WriteStats,
};
/// Compression wrappers.
pub use transport::{open_reader, CompressedWriter, Compression};
