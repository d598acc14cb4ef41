//! Бинарный кодек записей.
//!
//! Нижний уровень ([`primitives`], [`varint`], [`text`]) работает с байтами,
//! верхний ([`encode`], [`decode`], [`legacy`]) — с целыми записями.

pub mod decode;
pub mod encode;
pub mod format;
pub mod header;
pub mod legacy;
pub mod primitives;
pub mod text;
pub mod varint;

use std::io::Read;

pub use decode::{decode_record, from_bytes};
pub use encode::{encode_record, encoded_len, to_bytes};
pub use format::WireFormat;
use geobin_error::GeoResult;
pub use header::{AbsentFields, CoordFlags, Header};
pub use legacy::{decode_legacy_record, decode_unflagged_record};

use crate::model::GeoRecord;

/// Читает следующую запись в указанном формате.
pub fn read_record<R: Read + ?Sized>(
    r: &mut R,
    format: WireFormat,
    scratch: &mut Vec<u8>,
) -> GeoResult<Option<GeoRecord>> {
    match format {
        WireFormat::Current => decode_record(r, scratch),
        WireFormat::Legacy => decode_legacy_record(r, scratch),
        WireFormat::Unflagged => decode_unflagged_record(r, scratch),
    }
}
