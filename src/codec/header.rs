//! Байт-заголовок записи: вид записи в битах 0-1 и флаги отсутствия полей.

use bitflags::bitflags;
use geobin_error::{CodecError, GeoResult};

use crate::model::{GeoRecord, Metadata, RecordKind};

/// Маска вида записи в байте заголовка.
pub const KIND_MASK: u8 = 0x03;

bitflags! {
    /// Флаги отсутствия общих полей. Установленный флаг — поле не записано.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AbsentFields: u8 {
        const ID = 0x04;
        const CHANGESET_ID = 0x08;
        const TIMESTAMP = 0x10;
        const USER_ID = 0x20;
        const VERSION = 0x40;
        const VISIBLE = 0x80;
    }
}

bitflags! {
    /// Флаги отсутствия координат точки.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CoordFlags: u8 {
        const LATITUDE_ABSENT = 0x01;
        const LONGITUDE_ABSENT = 0x02;
    }
}

/// Разобранный заголовок.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub kind: RecordKind,
    pub absent: AbsentFields,
}

impl Header {
    pub fn for_record(record: &GeoRecord) -> Self {
        Self {
            kind: record.kind(),
            absent: AbsentFields::for_meta(record.meta()),
        }
    }

    pub fn to_byte(self) -> u8 {
        u8::from(self.kind) | self.absent.bits()
    }

    pub fn from_byte(byte: u8) -> GeoResult<Self> {
        let kind = RecordKind::try_from(byte & KIND_MASK).map_err(|_| CodecError::MalformedField {
            field: "record kind".to_string(),
            value: byte & KIND_MASK,
            offset: None,
            valid: RecordKind::ALL.iter().map(|k| u8::from(*k)).collect(),
        })?;

        Ok(Self {
            kind,
            absent: AbsentFields::from_bits_truncate(byte),
        })
    }

    /// Заголовок без флагов: только вид записи.
    pub fn is_bare(self) -> bool {
        self.absent.is_empty()
    }
}

impl AbsentFields {
    pub fn for_meta(meta: &Metadata) -> Self {
        let mut flags = AbsentFields::empty();
        flags.set(AbsentFields::ID, meta.id.is_none());
        flags.set(AbsentFields::CHANGESET_ID, meta.changeset_id.is_none());
        flags.set(AbsentFields::TIMESTAMP, meta.timestamp.is_none());
        flags.set(AbsentFields::USER_ID, meta.user_id.is_none());
        flags.set(AbsentFields::VERSION, meta.version.is_none());
        flags.set(AbsentFields::VISIBLE, meta.visible.is_none());
        flags
    }
}

impl CoordFlags {
    pub fn for_coords(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Self {
        let mut flags = CoordFlags::empty();
        flags.set(CoordFlags::LATITUDE_ABSENT, latitude.is_none());
        flags.set(CoordFlags::LONGITUDE_ABSENT, longitude.is_none());
        flags
    }

    /// Разбирает байт флагов координат; неизвестные биты — ошибка.
    pub fn from_byte(byte: u8) -> GeoResult<Self> {
        CoordFlags::from_bits(byte).ok_or_else(|| {
            CodecError::MalformedField {
                field: "coordinate flags".to_string(),
                value: byte,
                offset: None,
                valid: vec![0x00, 0x01, 0x02, 0x03],
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use geobin_error::StatusCode;

    use super::*;
    use crate::model::{Line, Point};

    /// Тест проверяет байт заголовка полностью заполненной и пустой записи.
    #[test]
    fn test_header_byte() {
        let full = GeoRecord::from(Line {
            meta: Metadata {
                id: Some(1),
                changeset_id: Some(1),
                timestamp: Some(crate::model::Timestamp::from_ticks(0)),
                user_id: Some(1),
                user_name: None,
                version: Some(1),
                visible: Some(true),
                tags: Default::default(),
            },
            node_refs: vec![],
        });
        assert_eq!(Header::for_record(&full).to_byte(), 0x02);

        let empty = GeoRecord::from(Point::default());
        assert_eq!(Header::for_record(&empty).to_byte(), 0xFD);
    }

    /// Тест проверяет разбор заголовка.
    #[test]
    fn test_from_byte() {
        let h = Header::from_byte(0x43).unwrap();
        assert_eq!(h.kind, RecordKind::Relation);
        assert_eq!(h.absent, AbsentFields::VERSION);
        assert!(!h.is_bare());
        assert!(Header::from_byte(0x01).unwrap().is_bare());
    }

    /// Тест проверяет, что нулевой вид записи отвергается.
    #[test]
    fn test_unknown_kind() {
        let err = Header::from_byte(0x04).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidData);
        assert!(err.to_string().contains("record kind"));
    }

    /// Тест проверяет разбор флагов координат.
    #[test]
    fn test_coord_flags() {
        assert_eq!(
            CoordFlags::for_coords(None, Some(1.0)),
            CoordFlags::LATITUDE_ABSENT
        );
        assert_eq!(CoordFlags::from_byte(0x03).unwrap(), CoordFlags::all());
        assert!(CoordFlags::from_byte(0x04).is_err());
    }
}
