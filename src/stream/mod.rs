//! Потоковое чтение и запись записей.
//!
//! [`RecordSource`] и [`RecordSink`] описывают возможности источника и
//! приёмника; [`RecordReader`] и [`RecordWriter`] — их реализации поверх
//! `std::io`.

pub mod counting;
pub mod reader;
pub mod writer;

use geobin_error::{CodecError, GeoResult};
pub use reader::{ReadStats, RecordReader, DEFAULT_BUFFER_SIZE};
use tracing::debug;
pub use writer::{RecordWriter, WriteStats};

use crate::model::{GeoRecord, RecordKind};

/// Ленивая последовательность записей.
pub trait RecordSource {
    /// Переходит к следующей записи, пропуская отмеченные виды. `Ok(false)`
    /// означает конец данных.
    fn advance(
        &mut self,
        skip_points: bool,
        skip_lines: bool,
        skip_relations: bool,
    ) -> GeoResult<bool>;

    /// Текущая запись.
    fn current(&self) -> Option<&GeoRecord>;

    fn can_reset(&self) -> bool;

    /// Возвращает источник в начало.
    fn reset(&mut self) -> GeoResult<()>;
}

/// Приёмник записей.
pub trait RecordSink {
    fn initialize(&mut self) -> GeoResult<()>;

    fn add(
        &mut self,
        record: &GeoRecord,
    ) -> GeoResult<()>;

    fn flush(&mut self) -> GeoResult<()>;
}

/// Какие виды записей пропускать при чтении.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindFilter {
    pub skip_points: bool,
    pub skip_lines: bool,
    pub skip_relations: bool,
}

impl KindFilter {
    /// Ничего не пропускать.
    pub const NONE: KindFilter = KindFilter {
        skip_points: false,
        skip_lines: false,
        skip_relations: false,
    };

    pub fn skips(
        &self,
        kind: RecordKind,
    ) -> bool {
        match kind {
            RecordKind::Point => self.skip_points,
            RecordKind::Line => self.skip_lines,
            RecordKind::Relation => self.skip_relations,
        }
    }
}

/// Перекачивает все записи из источника в приёмник, возвращает их
/// количество.
///
/// Источник, сообщивший об успешном `advance` без текущей записи, нарушает
/// контракт: это ошибка [`CodecError::MissingRecord`].
pub fn copy_records<S, K>(
    source: &mut S,
    sink: &mut K,
    filter: KindFilter,
) -> GeoResult<u64>
where
    S: RecordSource + ?Sized,
    K: RecordSink + ?Sized,
{
    sink.initialize()?;

    let mut copied = 0u64;
    while source.advance(filter.skip_points, filter.skip_lines, filter.skip_relations)? {
        let record = source.current().ok_or_else(|| CodecError::MissingRecord {
            operation: "copy_records".to_string(),
        })?;
        sink.add(record)?;
        copied += 1;
    }

    sink.flush()?;
    debug!(copied, "Copied records");
    Ok(copied)
}
