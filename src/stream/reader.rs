//! Потоковый читатель записей.
//!
//! Читает поток по одной записи, не загружая его целиком в память.
//! Текущая запись живёт до следующего вызова [`RecordReader::advance`].

use std::io::{self, BufReader, Read, Seek, SeekFrom};

use geobin_error::{bail, context, ensure, CodecError, GeoResult, StackError};
use tracing::{debug, trace, warn};

use super::{counting::CountingRead, KindFilter, RecordSource};
use crate::{
    codec::{read_record, WireFormat},
    model::{GeoRecord, RecordKind},
};

/// Размер буфера чтения по умолчанию.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Перемотка источника в начало. Есть только у читателей поверх `Seek`.
type Rewind<R> = fn(&mut BufReader<R>) -> io::Result<u64>;

/// Статистика чтения потока.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Кол-во байт прочитано
    pub bytes_read: u64,
    /// Кол-во записей декодировано (включая пропущенные фильтром)
    pub records_decoded: u64,
    /// Пропущено точек
    pub skipped_points: u64,
    /// Пропущено линий
    pub skipped_lines: u64,
    /// Пропущено отношений
    pub skipped_relations: u64,
}

/// Потоковый читатель записей поверх любого `Read`.
///
/// Ошибка посреди записи "отравляет" читатель: позиция в потоке после неё
/// неизвестна, поэтому все следующие `advance` завершаются ошибкой до
/// вызова [`RecordReader::reset`].
pub struct RecordReader<R: Read> {
    reader: CountingRead<BufReader<R>>,
    rewind: Option<Rewind<R>>,
    format: WireFormat,
    scratch: Vec<u8>,
    current: Option<GeoRecord>,
    stats: ReadStats,
    poisoned: bool,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ReadStats {
    fn record_skipped(
        &mut self,
        kind: RecordKind,
    ) {
        match kind {
            RecordKind::Point => self.skipped_points += 1,
            RecordKind::Line => self.skipped_lines += 1,
            RecordKind::Relation => self.skipped_relations += 1,
        }
    }

    /// Всего пропущено фильтром.
    pub fn skipped(&self) -> u64 {
        self.skipped_points + self.skipped_lines + self.skipped_relations
    }
}

impl<R: Read> RecordReader<R> {
    /// Создаёт читатель без возможности перемотки.
    pub fn new(inner: R) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, inner)
    }

    /// Создаёт читатель с заданным размером буфера.
    pub fn with_capacity(
        capacity: usize,
        inner: R,
    ) -> Self {
        debug!(capacity, seekable = false, "Creating record reader");
        Self {
            reader: CountingRead::new(BufReader::with_capacity(capacity, inner)),
            rewind: None,
            format: WireFormat::default(),
            scratch: Vec::new(),
            current: None,
            stats: ReadStats::default(),
            poisoned: false,
        }
    }

    /// Задаёт формат потока.
    pub fn with_format(
        mut self,
        format: WireFormat,
    ) -> Self {
        self.format = format;
        self
    }

    /// Переходит к следующей записи, пропуская виды, отмеченные флагами.
    ///
    /// `Ok(false)` — поток закончился, текущей записи больше нет.
    pub fn advance(
        &mut self,
        skip_points: bool,
        skip_lines: bool,
        skip_relations: bool,
    ) -> GeoResult<bool> {
        let filter = KindFilter {
            skip_points,
            skip_lines,
            skip_relations,
        };
        self.advance_filtered(filter)
    }

    /// То же, что [`advance`](Self::advance), с фильтром одним значением.
    pub fn advance_filtered(
        &mut self,
        filter: KindFilter,
    ) -> GeoResult<bool> {
        ensure!(
            !self.poisoned,
            CodecError::Unsupported {
                operation: "advance".to_string(),
                reason: "a previous record failed to decode; reset the reader first".to_string(),
            }
        );

        loop {
            let offset = self.reader.bytes_read();

            match read_record(&mut self.reader, self.format, &mut self.scratch) {
                Ok(Some(record)) => {
                    let kind = record.kind();
                    self.stats.bytes_read = self.reader.bytes_read();
                    self.stats.records_decoded += 1;

                    if filter.skips(kind) {
                        self.stats.record_skipped(kind);
                        trace!(offset, %kind, "Skipped record");
                        continue;
                    }

                    trace!(offset, %kind, id = ?record.id(), "Decoded record");
                    self.current = Some(record);
                    return Ok(true);
                }
                Ok(None) => {
                    self.current = None;
                    self.stats.bytes_read = self.reader.bytes_read();
                    debug!(
                        records = self.stats.records_decoded,
                        bytes = self.stats.bytes_read,
                        "End of record stream"
                    );
                    return Ok(false);
                }
                Err(e) => {
                    self.current = None;
                    self.poisoned = true;
                    self.stats.bytes_read = self.reader.bytes_read();
                    let e = attach_offset(e, offset);
                    warn!(offset, error = %e, "Record decode failed, reader poisoned");
                    return Err(e);
                }
            }
        }
    }

    /// Текущая запись. `None` до первого `advance` и после конца потока.
    pub fn current(&self) -> Option<&GeoRecord> {
        self.current.as_ref()
    }

    /// Забирает текущую запись, оставляя `None`.
    pub fn take_current(&mut self) -> Option<GeoRecord> {
        self.current.take()
    }

    /// Поддерживает ли источник перемотку.
    pub fn can_reset(&self) -> bool {
        self.rewind.is_some()
    }

    /// Перематывает источник в начало и снимает "отравление".
    pub fn reset(&mut self) -> GeoResult<()> {
        let Some(rewind) = self.rewind else {
            bail!(CodecError::Unsupported {
                operation: "reset".to_string(),
                reason: "source is not seekable".to_string(),
            });
        };

        context!(rewind(self.reader.get_mut()), "Failed to rewind record source")?;
        self.reader.reset_count();
        self.current = None;
        self.poisoned = false;
        self.stats = ReadStats::default();
        debug!("Record reader reset to start");
        Ok(())
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }

    /// Отравлен ли читатель предыдущей ошибкой.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Потребляет читатель и возвращает исходный источник.
    ///
    /// Непрочитанные данные из внутреннего буфера теряются.
    pub fn into_inner(self) -> R {
        self.reader.into_inner().into_inner()
    }
}

impl<R: Read + Seek> RecordReader<R> {
    /// Создаёт читатель с поддержкой [`reset`](Self::reset).
    pub fn seekable(inner: R) -> Self {
        Self::seekable_with_capacity(DEFAULT_BUFFER_SIZE, inner)
    }

    pub fn seekable_with_capacity(
        capacity: usize,
        inner: R,
    ) -> Self {
        let mut reader = Self::with_capacity(capacity, inner);
        reader.rewind = Some(rewind_to_start::<R>);
        reader
    }
}

fn rewind_to_start<R: Read + Seek>(reader: &mut BufReader<R>) -> io::Result<u64> {
    reader.seek(SeekFrom::Start(0))
}

/// Приклеивает offset записи к ошибке кодека; прочие ошибки получают
/// offset в контексте.
fn attach_offset(
    err: StackError,
    offset: u64,
) -> StackError {
    match err.downcast_ref::<CodecError>() {
        Some(codec) if codec.offset().is_none() && err.contexts().is_empty() => {
            StackError::from(codec.clone().with_offset(offset))
        }
        _ => err.context(format!("Failed to decode record at offset {offset}")),
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для RecordReader
////////////////////////////////////////////////////////////////////////////////

impl<R: Read> RecordSource for RecordReader<R> {
    fn advance(
        &mut self,
        skip_points: bool,
        skip_lines: bool,
        skip_relations: bool,
    ) -> GeoResult<bool> {
        RecordReader::advance(self, skip_points, skip_lines, skip_relations)
    }

    fn current(&self) -> Option<&GeoRecord> {
        RecordReader::current(self)
    }

    fn can_reset(&self) -> bool {
        RecordReader::can_reset(self)
    }

    fn reset(&mut self) -> GeoResult<()> {
        RecordReader::reset(self)
    }
}

/// Итерация без фильтра. Запись забирается из читателя, поэтому после
/// `next()` [`RecordReader::current`] возвращает `None`. После первой
/// ошибки итератор заканчивается.
impl<R: Read> Iterator for RecordReader<R> {
    type Item = GeoResult<GeoRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned {
            return None;
        }
        match self.advance_filtered(KindFilter::NONE) {
            Ok(true) => self.current.take().map(Ok),
            Ok(false) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

impl<R: Read> std::fmt::Debug for RecordReader<R> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RecordReader")
            .field("format", &self.format)
            .field("seekable", &self.can_reset())
            .field("poisoned", &self.poisoned)
            .field("stats", &self.stats)
            .finish()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
