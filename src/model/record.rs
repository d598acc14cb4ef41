use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::Serialize;

use super::{Tags, Timestamp};

/// Вид записи. Дискриминатор на проводе совпадает со значением варианта.
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, IntoPrimitive, TryFromPrimitive,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum RecordKind {
    Point = 1,
    Line = 2,
    Relation = 3,
}

/// Общие метаданные всех видов записей. `None` означает "поле отсутствует".
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub id: Option<i64>,
    pub changeset_id: Option<i64>,
    pub timestamp: Option<Timestamp>,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub version: Option<i32>,
    pub visible: Option<bool>,
    pub tags: Tags,
}

/// Точка с необязательными координатами.
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Point {
    #[serde(flatten)]
    pub meta: Metadata,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Линия, заданная ссылками на точки. Пустой список означает отсутствие.
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Line {
    #[serde(flatten)]
    pub meta: Metadata,
    pub node_refs: Vec<i64>,
}

/// Участник отношения.
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub ref_id: i64,
    pub role: String,
    pub kind: RecordKind,
}

/// Отношение, заданное списком участников.
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Relation {
    #[serde(flatten)]
    pub meta: Metadata,
    pub members: Vec<Member>,
}

/// Одна запись потока.
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GeoRecord {
    Point(Point),
    Line(Line),
    Relation(Relation),
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl RecordKind {
    pub const ALL: [RecordKind; 3] = [RecordKind::Point, RecordKind::Line, RecordKind::Relation];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Point => "point",
            RecordKind::Line => "line",
            RecordKind::Relation => "relation",
        }
    }
}

impl Member {
    pub fn new(
        ref_id: i64,
        role: impl Into<String>,
        kind: RecordKind,
    ) -> Self {
        Self {
            ref_id,
            role: role.into(),
            kind,
        }
    }
}

impl GeoRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            GeoRecord::Point(_) => RecordKind::Point,
            GeoRecord::Line(_) => RecordKind::Line,
            GeoRecord::Relation(_) => RecordKind::Relation,
        }
    }

    pub fn meta(&self) -> &Metadata {
        match self {
            GeoRecord::Point(p) => &p.meta,
            GeoRecord::Line(l) => &l.meta,
            GeoRecord::Relation(r) => &r.meta,
        }
    }

    pub fn meta_mut(&mut self) -> &mut Metadata {
        match self {
            GeoRecord::Point(p) => &mut p.meta,
            GeoRecord::Line(l) => &mut l.meta,
            GeoRecord::Relation(r) => &mut r.meta,
        }
    }

    pub fn id(&self) -> Option<i64> {
        self.meta().id
    }

    pub fn tags(&self) -> &Tags {
        &self.meta().tags
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl fmt::Display for RecordKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Point> for GeoRecord {
    fn from(p: Point) -> Self {
        GeoRecord::Point(p)
    }
}

impl From<Line> for GeoRecord {
    fn from(l: Line) -> Self {
        GeoRecord::Line(l)
    }
}

impl From<Relation> for GeoRecord {
    fn from(r: Relation) -> Self {
        GeoRecord::Relation(r)
    }
}

impl fmt::Display for GeoRecord {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{} {id}", self.kind())?,
            None => write!(f, "{} <no id>", self.kind())?,
        }
        match self {
            GeoRecord::Point(p) => {
                if let (Some(lat), Some(lon)) = (p.latitude, p.longitude) {
                    write!(f, " @ {lat},{lon}")?;
                }
            }
            GeoRecord::Line(l) => write!(f, " ({} refs)", l.node_refs.len())?,
            GeoRecord::Relation(r) => write!(f, " ({} members)", r.members.len())?,
        }
        if !self.tags().is_empty() {
            write!(f, " [{} tags]", self.tags().len())?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
