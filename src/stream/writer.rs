use std::io::Write;

use geobin_error::{ensure, CodecError, GeoResult, ResultExt};
use tracing::{debug, trace};

use super::RecordSink;
use crate::{codec::encode_record, model::GeoRecord};

/// Статистика записи.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub records_written: u64,
    pub bytes_written: u64,
}

/// Потоковый писатель записей в текущем формате.
///
/// Каждая запись сначала кодируется во внутренний буфер и уходит в приёмник
/// одним `write_all`: ошибка кодирования не оставляет в приёмнике
/// половину записи.
pub struct RecordWriter<W: Write> {
    inner: W,
    buf: Vec<u8>,
    initialized: bool,
    stats: WriteStats,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(256),
            initialized: false,
            stats: WriteStats::default(),
        }
    }

    /// Подготавливает приёмник. Потоку не нужна преамбула, поэтому в
    /// приёмник ничего не пишется; вызов обязателен перед [`add`](Self::add).
    pub fn initialize(&mut self) -> GeoResult<()> {
        if !self.initialized {
            debug!("Record writer initialized");
            self.initialized = true;
        }
        Ok(())
    }

    /// Дописывает запись в конец потока.
    pub fn add(
        &mut self,
        record: &GeoRecord,
    ) -> GeoResult<()> {
        ensure!(
            self.initialized,
            CodecError::Unsupported {
                operation: "add".to_string(),
                reason: "writer is not initialized".to_string(),
            }
        );

        self.buf.clear();
        encode_record(&mut self.buf, record)?;
        self.inner
            .write_all(&self.buf)
            .with_context(|| format!("Failed to write {} record", record.kind()))?;

        self.stats.records_written += 1;
        self.stats.bytes_written += self.buf.len() as u64;
        trace!(kind = %record.kind(), id = ?record.id(), len = self.buf.len(), "Wrote record");
        Ok(())
    }

    /// Сбрасывает приёмник.
    pub fn flush(&mut self) -> GeoResult<()> {
        self.inner
            .flush()
            .context("Failed to flush record sink")?;
        debug!(
            records = self.stats.records_written,
            bytes = self.stats.bytes_written,
            "Record writer flushed"
        );
        Ok(())
    }

    pub fn stats(&self) -> &WriteStats {
        &self.stats
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Сбрасывает и возвращает приёмник.
    pub fn into_inner(mut self) -> GeoResult<W> {
        self.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> RecordSink for RecordWriter<W> {
    fn initialize(&mut self) -> GeoResult<()> {
        RecordWriter::initialize(self)
    }

    fn add(
        &mut self,
        record: &GeoRecord,
    ) -> GeoResult<()> {
        RecordWriter::add(self, record)
    }

    fn flush(&mut self) -> GeoResult<()> {
        RecordWriter::flush(self)
    }
}

impl<W: Write> std::fmt::Debug for RecordWriter<W> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("RecordWriter")
            .field("initialized", &self.initialized)
            .field("stats", &self.stats)
            .finish()
    }
}
