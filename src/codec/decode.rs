//! Чтение одной записи в текущем формате.
//!
//! Запись собирается только после того, как все её поля прочитаны; при
//! ошибке частично прочитанная запись отбрасывается.

use std::io::{Cursor, Read};

use geobin_error::{CodecError, GeoResult};

use super::{
    header::{AbsentFields, CoordFlags, Header},
    primitives::{read_count, read_f64, read_i32, read_i64, read_u8, try_read_u8},
    text::{read_opt_text, read_text},
};
use crate::model::{
    GeoRecord, Line, Member, Metadata, Point, RecordKind, Relation, Tags, Timestamp,
};

/// Верхняя граница предварительного резервирования по счётчику из потока.
pub(crate) const MAX_PREALLOC: usize = 1024;

/// Читает следующую запись. `Ok(None)` — поток закончился ровно на
/// границе записи.
pub fn decode_record<R: Read + ?Sized>(
    r: &mut R,
    scratch: &mut Vec<u8>,
) -> GeoResult<Option<GeoRecord>> {
    let Some(byte) = try_read_u8(r, "header")? else {
        return Ok(None);
    };
    let header = Header::from_byte(byte)?;
    decode_body(r, header, scratch).map(Some)
}

/// Читает тело записи после уже разобранного заголовка.
pub fn decode_body<R: Read + ?Sized>(
    r: &mut R,
    header: Header,
    scratch: &mut Vec<u8>,
) -> GeoResult<GeoRecord> {
    let mut meta = read_metadata(r, header.absent, scratch)?;
    meta.tags = read_tags(r, scratch)?;

    let record = match header.kind {
        RecordKind::Point => {
            let flags = CoordFlags::from_byte(read_u8(r, "coordinate flags")?)?;
            let latitude = if flags.contains(CoordFlags::LATITUDE_ABSENT) {
                None
            } else {
                Some(read_f64(r, "latitude")?)
            };
            let longitude = if flags.contains(CoordFlags::LONGITUDE_ABSENT) {
                None
            } else {
                Some(read_f64(r, "longitude")?)
            };
            GeoRecord::Point(Point {
                meta,
                latitude,
                longitude,
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

/// Декодирует ровно одну запись из среза.
pub fn from_bytes(bytes: &[u8]) -> GeoResult<GeoRecord> {
    let mut cursor = Cursor::new(bytes);
    let mut scratch = Vec::new();
    decode_record(&mut cursor, &mut scratch)?.ok_or_else(|| {
        CodecError::UnexpectedEof {
            context: "reading header".to_string(),
            offset: Some(0),
            expected_bytes: Some(1),
        }
        .into()
    })
}

fn read_metadata<R: Read + ?Sized>(
    r: &mut R,
    absent: AbsentFields,
    scratch: &mut Vec<u8>,
) -> GeoResult<Metadata> {
    let present = |flag: AbsentFields| !absent.contains(flag);

    let id = present(AbsentFields::ID)
        .then(|| read_i64(r, "id"))
        .transpose()?;
    let changeset_id = present(AbsentFields::CHANGESET_ID)
        .then(|| read_i64(r, "changeset_id"))
        .transpose()?;
    let timestamp = present(AbsentFields::TIMESTAMP)
        .then(|| read_i64(r, "timestamp").map(Timestamp::from_ticks))
        .transpose()?;
    let user_id = present(AbsentFields::USER_ID)
        .then(|| read_i64(r, "user_id"))
        .transpose()?;
    let user_name = read_opt_text(r, scratch, "user_name")?;
    let version = present(AbsentFields::VERSION)
        .then(|| read_i32(r, "version"))
        .transpose()?;
    let visible = if present(AbsentFields::VISIBLE) {
        Some(read_visible(r)?)
    } else {
        None
    };

    Ok(Metadata {
        id,
        changeset_id,
        timestamp,
        user_id,
        user_name,
        version,
        visible,
        tags: Tags::new(),
    })
}

fn read_visible<R: Read + ?Sized>(r: &mut R) -> GeoResult<bool> {
    match read_u8(r, "visible")? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(CodecError::MalformedField {
            field: "visible".to_string(),
            value: other,
            offset: None,
            valid: vec![0, 1],
        }
        .into()),
    }
}

/// Теги: счётчик и пары ключ/значение. Повторный ключ заменяет значение.
pub(crate) fn read_tags<R: Read + ?Sized>(
    r: &mut R,
    scratch: &mut Vec<u8>,
) -> GeoResult<Tags> {
    let count = read_count(r, "tag count")?;
    let mut tags = Tags::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        let key = read_text(r, scratch, "tag key")?;
        let value = read_text(r, scratch, "tag value")?;
        tags.insert(key, value);
    }
    Ok(tags)
}

pub(crate) fn read_node_refs<R: Read + ?Sized>(r: &mut R) -> GeoResult<Vec<i64>> {
    let count = read_count(r, "node ref count")?;
    let mut refs = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        refs.push(read_i64(r, "node ref")?);
    }
    Ok(refs)
}

pub(crate) fn read_members<R: Read + ?Sized>(
    r: &mut R,
    scratch: &mut Vec<u8>,
) -> GeoResult<Vec<Member>> {
    let count = read_count(r, "member count")?;
    let mut members = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        let ref_id = read_i64(r, "member ref")?;
        let role = read_text(r, scratch, "member role")?;
        let raw = read_u8(r, "member kind")?;
        let kind = RecordKind::try_from(raw).map_err(|_| CodecError::MalformedField {
            field: "member kind".to_string(),
            value: raw,
            offset: None,
            valid: RecordKind::ALL.iter().map(|k| u8::from(*k)).collect(),
        })?;
        members.push(Member { ref_id, role, kind });
    }
    Ok(members)
}
