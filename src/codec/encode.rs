//! Запись одной записи в текущем формате.
//!
//! # Раскладка
//! ```text
//! [header: u8]
//! [id: i64]? [changeset_id: i64]? [timestamp: i64]? [user_id: i64]?
//! [user_name: text] [version: i32]? [visible: u8]?
//! [tag_count: i32] ([key: text] [value: text])*
//! Point:    [coord_flags: u8] [latitude: f64]? [longitude: f64]?
//! Line:     [count: i32] [ref: i64]*
//! Relation: [count: i32] ([ref_id: i64] [role: text] [kind: u8])*
//! ```
//! `?` — поле записывается только если соответствующий флаг не установлен.

use std::io::Write;

use geobin_error::GeoResult;

use super::{
    header::{CoordFlags, Header},
    primitives::{write_count, write_f64, write_i32, write_i64, write_u8},
    text::{text_size, write_opt_text, write_text},
};
use crate::model::{GeoRecord, Member, Metadata, Tags};

/// Пишет запись в `w`.
///
/// Ошибка посреди записи может оставить в приёмнике часть байт; для
/// атомарной записи используйте [`to_bytes`] или `RecordWriter`.
pub fn encode_record<W: Write + ?Sized>(
    w: &mut W,
    record: &GeoRecord,
) -> GeoResult<()> {
    write_u8(w, Header::for_record(record).to_byte())?;
    write_metadata(w, record.meta())?;
    write_tags(w, &record.meta().tags)?;

    match record {
        GeoRecord::Point(p) => {
            write_u8(w, CoordFlags::for_coords(p.latitude, p.longitude).bits())?;
            if let Some(lat) = p.latitude {
                write_f64(w, lat)?;
            }
            if let Some(lon) = p.longitude {
                write_f64(w, lon)?;
            }
        }
        GeoRecord::Line(l) => {
            write_count(w, l.node_refs.len(), "node refs")?;
            for node in &l.node_refs {
                write_i64(w, *node)?;
            }
        }
        GeoRecord::Relation(r) => write_members(w, &r.members)?,
    }

    Ok(())
}

/// Кодирует запись в новый буфер.
pub fn to_bytes(record: &GeoRecord) -> GeoResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(encoded_len(record));
    encode_record(&mut buf, record)?;
    Ok(buf)
}

/// Размер записи в текущем формате без кодирования.
pub fn encoded_len(record: &GeoRecord) -> usize {
    let meta = record.meta();
    let mut len = 1;

    len += [meta.id, meta.changeset_id, meta.user_id]
        .iter()
        .flatten()
        .count()
        * 8;
    len += meta.timestamp.map_or(0, |_| 8);
    len += text_size(meta.user_name.as_deref().unwrap_or_default());
    len += meta.version.map_or(0, |_| 4);
    len += meta.visible.map_or(0, |_| 1);

    len += 4;
    for tag in &meta.tags {
        len += text_size(&tag.key) + text_size(&tag.value);
    }

    len += match record {
        GeoRecord::Point(p) => {
            1 + [p.latitude, p.longitude].iter().flatten().count() * 8
        }
        GeoRecord::Line(l) => 4 + l.node_refs.len() * 8,
        GeoRecord::Relation(r) => {
            4 + r
                .members
                .iter()
                .map(|m| 8 + text_size(&m.role) + 1)
                .sum::<usize>()
        }
    };

    len
}

fn write_metadata<W: Write + ?Sized>(
    w: &mut W,
    meta: &Metadata,
) -> GeoResult<()> {
    if let Some(id) = meta.id {
        write_i64(w, id)?;
    }
    if let Some(changeset) = meta.changeset_id {
        write_i64(w, changeset)?;
    }
    if let Some(ts) = meta.timestamp {
        write_i64(w, ts.ticks())?;
    }
    if let Some(uid) = meta.user_id {
        write_i64(w, uid)?;
    }
    write_opt_text(w, meta.user_name.as_deref())?;
    if let Some(version) = meta.version {
        write_i32(w, version)?;
    }
    if let Some(visible) = meta.visible {
        write_u8(w, u8::from(visible))?;
    }
    Ok(())
}

fn write_tags<W: Write + ?Sized>(
    w: &mut W,
    tags: &Tags,
) -> GeoResult<()> {
    write_count(w, tags.len(), "tags")?;
    for tag in tags {
        write_text(w, &tag.key)?;
        write_text(w, &tag.value)?;
    }
    Ok(())
}

fn write_members<W: Write + ?Sized>(
    w: &mut W,
    members: &[Member],
) -> GeoResult<()> {
    write_count(w, members.len(), "members")?;
    for member in members {
        write_i64(w, member.ref_id)?;
        write_text(w, &member.role)?;
        write_u8(w, u8::from(member.kind))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Line, Point, RecordKind, Relation, Timestamp};

    fn meta() -> Metadata {
        Metadata {
            id: Some(1),
            changeset_id: Some(2),
            timestamp: Some(Timestamp::from_ticks(3)),
            user_id: Some(12),
            user_name: Some("Ben".to_string()),
            version: Some(123),
            visible: Some(true),
            tags: [("name", "hu?")].into_iter().collect(),
        }
    }

    /// Тест проверяет побайтовую раскладку точки без отсутствующих полей.
    #[test]
    fn test_point_layout() {
        let rec = GeoRecord::from(Point {
            meta: meta(),
            latitude: Some(10.0),
            longitude: Some(11.0),
        });
        let bytes = to_bytes(&rec).unwrap();

        let mut expected = vec![0x01];
        expected.extend_from_slice(&1i64.to_le_bytes());
        expected.extend_from_slice(&2i64.to_le_bytes());
        expected.extend_from_slice(&3i64.to_le_bytes());
        expected.extend_from_slice(&12i64.to_le_bytes());
        expected.extend_from_slice(&[6, b'B', 0, b'e', 0, b'n', 0]);
        expected.extend_from_slice(&123i32.to_le_bytes());
        expected.push(1);
        expected.extend_from_slice(&1i32.to_le_bytes());
        expected.extend_from_slice(&[8, b'n', 0, b'a', 0, b'm', 0, b'e', 0]);
        expected.extend_from_slice(&[6, b'h', 0, b'u', 0, b'?', 0]);
        expected.push(0x00);
        expected.extend_from_slice(&10f64.to_le_bytes());
        expected.extend_from_slice(&11f64.to_le_bytes());

        assert_eq!(bytes, expected);
        assert_eq!(encoded_len(&rec), expected.len());
    }

    /// Тест проверяет запись без метаданных: только флаги и пустые поля.
    #[test]
    fn test_empty_records() {
        let point = to_bytes(&GeoRecord::from(Point::default())).unwrap();
        // header, user_name, tag count, coord flags
        assert_eq!(point, vec![0xFD, 0, 0, 0, 0, 0, 0x03]);

        let line = to_bytes(&GeoRecord::from(Line::default())).unwrap();
        assert_eq!(line, vec![0xFE, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    /// Тест проверяет раскладку участников отношения.
    #[test]
    fn test_relation_members() {
        let rec = GeoRecord::from(Relation {
            meta: Metadata::default(),
            members: vec![Member::new(-5, "", RecordKind::Line)],
        });
        let bytes = to_bytes(&rec).unwrap();
        let tail = &bytes[bytes.len() - 14..];

        let mut expected = 1i32.to_le_bytes().to_vec();
        expected.extend_from_slice(&(-5i64).to_le_bytes());
        expected.push(0);
        expected.push(2);
        assert_eq!(tail, expected.as_slice());
        assert_eq!(encoded_len(&rec), bytes.len());
    }

    /// Тест проверяет, что `visible = false` пишется как 0, а не как флаг.
    #[test]
    fn test_visible_false() {
        let rec = GeoRecord::from(Line {
            meta: Metadata {
                visible: Some(false),
                ..Default::default()
            },
            node_refs: vec![],
        });
        let bytes = to_bytes(&rec).unwrap();
        assert_eq!(bytes[0], 0x7E);
        // header, user_name, visible
        assert_eq!(bytes[1], 0);
        assert_eq!(bytes[2], 0);
    }
}
