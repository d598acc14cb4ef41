//! Чтение потоков старых форматов. Писать в них нельзя.
//!
//! [`decode_legacy_record`] читает поток с флагами отсутствия: заголовок
//! всегда несёт вид записи и флаги, в том числе заголовок `1`, `2` или `3`
//! у записи со всеми полями. Раскладка тела совпадает с текущей.
//!
//! [`decode_unflagged_record`] читает раскладку без флагов, которую нужно
//! выбирать явно (`WireFormat::Unflagged`):
//!
//! ```text
//! [kind: u8]  ровно 1, 2 или 3
//! [id: i64] [changeset_id: i64] [timestamp: i64] [user_id: i64]
//! [user_name: text] [version: i32] [visible: u8 (0 = нет, 1 = true, 2 = false)]
//! [tag_count: i32] ([key: text] [value: text])*
//! Point:    [latitude: f32] [longitude: f32]
//! Line:     [count: i32] [ref: i64]*
//! Relation: [count: i32] ([ref_id: i64] [role: text] [kind: u8])*
//! ```

use std::io::Read;

use geobin_error::{bail, ensure, CodecError, GeoResult};

use super::{
    decode::{decode_body, read_members, read_node_refs, read_tags},
    header::Header,
    primitives::{read_f32, read_i32, read_i64, read_u8, try_read_u8},
    text::read_opt_text,
};
use crate::model::{GeoRecord, Line, Metadata, Point, RecordKind, Relation, Timestamp};

/// Читает следующую запись потока с флагами. `Ok(None)` — чистый конец
/// данных.
///
/// Флаги разбираются одинаково для всех трёх видов записей, поэтому
/// заголовок без флагов означает только, что все поля присутствуют.
pub fn decode_legacy_record<R: Read + ?Sized>(
    r: &mut R,
    scratch: &mut Vec<u8>,
) -> GeoResult<Option<GeoRecord>> {
    let Some(byte) = try_read_u8(r, "header")? else {
        return Ok(None);
    };
    let header = Header::from_byte(byte)?;
    decode_body(r, header, scratch).map(Some)
}

/// Читает следующую запись раскладки без флагов.
pub fn decode_unflagged_record<R: Read + ?Sized>(
    r: &mut R,
    scratch: &mut Vec<u8>,
) -> GeoResult<Option<GeoRecord>> {
    let Some(byte) = try_read_u8(r, "header")? else {
        return Ok(None);
    };
    let header = Header::from_byte(byte)?;
    // флагов в этой раскладке нет, любой лишний бит — мусор
    ensure!(
        header.is_bare(),
        CodecError::MalformedField {
            field: "record kind".to_string(),
            value: byte,
            offset: None,
            valid: RecordKind::ALL.iter().map(|k| u8::from(*k)).collect(),
        }
    );
    decode_unflagged_body(r, header.kind, scratch).map(Some)
}

fn decode_unflagged_body<R: Read + ?Sized>(
    r: &mut R,
    kind: RecordKind,
    scratch: &mut Vec<u8>,
) -> GeoResult<GeoRecord> {
    let id = read_i64(r, "id")?;
    let changeset_id = read_i64(r, "changeset_id")?;
    let ticks = read_i64(r, "timestamp")?;
    let user_id = read_i64(r, "user_id")?;
    let user_name = read_opt_text(r, scratch, "user_name")?;
    let version = read_i32(r, "version")?;
    let visible = read_tristate(r)?;
    let tags = read_tags(r, scratch)?;

    let meta = Metadata {
        id: Some(id),
        changeset_id: Some(changeset_id),
        timestamp: Some(Timestamp::from_ticks(ticks)),
        user_id: Some(user_id),
        user_name,
        version: Some(version),
        visible,
        tags,
    };

    let record = match kind {
        RecordKind::Point => {
            let latitude = read_f32(r, "latitude")?;
            let longitude = read_f32(r, "longitude")?;
            GeoRecord::Point(Point {
                meta,
                latitude: Some(f64::from(latitude)),
                longitude: Some(f64::from(longitude)),
            })
        }
        RecordKind::Line => GeoRecord::Line(Line {
            meta,
            node_refs: read_node_refs(r)?,
        }),
        RecordKind::Relation => GeoRecord::Relation(Relation {
            meta,
            members: read_members(r, scratch)?,
        }),
    };

    Ok(record)
}

fn read_tristate<R: Read + ?Sized>(r: &mut R) -> GeoResult<Option<bool>> {
    match read_u8(r, "visible")? {
        0 => Ok(None),
        1 => Ok(Some(true)),
        2 => Ok(Some(false)),
        other => bail!(CodecError::MalformedField {
            field: "visible".to_string(),
            value: other,
            offset: None,
            valid: vec![0, 1, 2],
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use geobin_error::StatusCode;

    use super::*;
    use crate::codec::encode::to_bytes;

    fn unflagged_common(
        kind: u8,
        visible: u8,
    ) -> Vec<u8> {
        let mut bytes = vec![kind];
        bytes.extend_from_slice(&1i64.to_le_bytes());
        bytes.extend_from_slice(&2i64.to_le_bytes());
        bytes.extend_from_slice(&3i64.to_le_bytes());
        bytes.extend_from_slice(&12i64.to_le_bytes());
        bytes.extend_from_slice(&[6, b'B', 0, b'e', 0, b'n', 0]);
        bytes.extend_from_slice(&123i32.to_le_bytes());
        bytes.push(visible);
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes
    }

    /// Тест проверяет, что голый заголовок потока с флагами читается по
    /// текущей раскладке: visible 0/1, флаги и f64 координаты точки.
    #[test]
    fn test_bare_header_is_flagged_layout() {
        let mut bytes = unflagged_common(1, 0);
        bytes.push(0);
        bytes.extend_from_slice(&10.0f64.to_le_bytes());
        bytes.extend_from_slice(&11.0f64.to_le_bytes());

        let mut cursor = Cursor::new(&bytes);
        let mut scratch = Vec::new();
        let rec = decode_legacy_record(&mut cursor, &mut scratch)
            .unwrap()
            .unwrap();
        let GeoRecord::Point(p) = rec else {
            panic!("expected point");
        };
        assert_eq!(p.meta.visible, Some(false));
        assert_eq!(p.meta.user_name.as_deref(), Some("Ben"));
        assert_eq!(p.latitude, Some(10.0));
        assert_eq!(p.longitude, Some(11.0));
        assert_eq!(cursor.position(), bytes.len() as u64);
    }

    /// Тест проверяет, что запись с флагами читается как в текущем формате.
    #[test]
    fn test_flagged_record_matches_current() {
        let rec = GeoRecord::from(Line {
            meta: Metadata {
                id: Some(9),
                version: Some(0),
                ..Default::default()
            },
            node_refs: vec![1, 2, 3],
        });
        let bytes = to_bytes(&rec).unwrap();

        let mut scratch = Vec::new();
        let back = decode_legacy_record(&mut Cursor::new(&bytes), &mut scratch)
            .unwrap()
            .unwrap();
        assert_eq!(back, rec);
    }

    /// Тест проверяет раскладку без флагов: координаты f32 сразу после
    /// тегов.
    #[test]
    fn test_unflagged_point() {
        let mut bytes = unflagged_common(1, 1);
        bytes.extend_from_slice(&10.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-11.25f32).to_le_bytes());

        let mut scratch = Vec::new();
        let rec = decode_unflagged_record(&mut Cursor::new(&bytes), &mut scratch)
            .unwrap()
            .unwrap();
        let GeoRecord::Point(p) = rec else {
            panic!("expected point");
        };
        assert_eq!(p.meta.id, Some(1));
        assert_eq!(p.meta.timestamp, Some(Timestamp::from_ticks(3)));
        assert_eq!(p.meta.user_name.as_deref(), Some("Ben"));
        assert_eq!(p.meta.visible, Some(true));
        assert_eq!(p.latitude, Some(10.5));
        assert_eq!(p.longitude, Some(-11.25));
    }

    /// Тест проверяет три состояния visible.
    #[test]
    fn test_tristate_visible() {
        let mut scratch = Vec::new();
        for (byte, expected) in [(0u8, None), (1, Some(true)), (2, Some(false))] {
            let mut bytes = unflagged_common(2, byte);
            bytes.extend_from_slice(&0i32.to_le_bytes());
            let rec = decode_unflagged_record(&mut Cursor::new(&bytes), &mut scratch)
                .unwrap()
                .unwrap();
            assert_eq!(rec.meta().visible, expected);
        }

        let mut bytes = unflagged_common(2, 3);
        bytes.extend_from_slice(&0i32.to_le_bytes());
        let err = decode_unflagged_record(&mut Cursor::new(&bytes), &mut scratch).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidData);
    }

    /// Тест проверяет отказ на флагах в раскладке, где их нет.
    #[test]
    fn test_unflagged_rejects_flag_bits() {
        let mut bytes = unflagged_common(0x41, 1);
        bytes.extend_from_slice(&0f32.to_le_bytes());
        bytes.extend_from_slice(&0f32.to_le_bytes());

        let mut scratch = Vec::new();
        let err = decode_unflagged_record(&mut Cursor::new(&bytes), &mut scratch).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidData);
        assert!(matches!(
            err.downcast_ref::<CodecError>(),
            Some(CodecError::MalformedField { value: 0x41, .. })
        ));
    }

    /// Тест проверяет обрыв внутри записи без флагов.
    #[test]
    fn test_unflagged_truncated() {
        let bytes = unflagged_common(1, 1);
        let mut scratch = Vec::new();
        let err = decode_unflagged_record(&mut Cursor::new(&bytes), &mut scratch).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UnexpectedEof);
        assert!(err.to_string().contains("latitude"));
    }
}
