//! Прозрачное сжатие потока записей.
//!
//! Кодек про сжатие ничего не знает: эти обёртки стоят между читателем или
//! писателем и файлом. Поддерживаются gzip (`flate2`) и zstd.

use std::{
    fmt,
    io::{self, BufReader, Read, Write},
    str::FromStr,
};

use flate2::{bufread::MultiGzDecoder, write::GzEncoder};
use geobin_error::{GenericError, GeoResult, ResultExt, StackError, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Уровень zstd по умолчанию: баланс между скоростью и размером.
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Вид сжатия потока.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Zstd,
}

/// Writer, сжимающий данные перед приёмником.
pub enum CompressedWriter<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
    Zstd(zstd::Encoder<'static, W>),
}

impl Compression {
    pub fn as_str(self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Zstd => "zstd",
        }
    }

    /// Угадывает сжатие по расширению файла.
    pub fn from_extension(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") => Compression::Gzip,
            Some("zst") | Some("zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }
}

/// Оборачивает источник в распаковщик.
pub fn open_reader<'a, R: Read + 'a>(
    inner: R,
    compression: Compression,
) -> GeoResult<Box<dyn Read + 'a>> {
    debug!(compression = %compression, "Opening record source");
    let reader: Box<dyn Read + 'a> = match compression {
        Compression::None => Box::new(inner),
        Compression::Gzip => Box::new(MultiGzDecoder::new(BufReader::new(inner))),
        Compression::Zstd => Box::new(
            zstd::Decoder::new(inner)
                .map_err(|e| compression_error("zstd decoder", e))?,
        ),
    };
    Ok(reader)
}

impl<W: Write> CompressedWriter<W> {
    pub fn new(
        inner: W,
        compression: Compression,
        zstd_level: i32,
    ) -> GeoResult<Self> {
        debug!(compression = %compression, zstd_level, "Opening record sink");
        Ok(match compression {
            Compression::None => CompressedWriter::Plain(inner),
            Compression::Gzip => {
                CompressedWriter::Gzip(GzEncoder::new(inner, flate2::Compression::default()))
            }
            Compression::Zstd => CompressedWriter::Zstd(
                zstd::Encoder::new(inner, zstd_level)
                    .map_err(|e| compression_error("zstd encoder", e))?,
            ),
        })
    }

    /// Дописывает завершающие блоки сжатия и возвращает приёмник.
    pub fn finish(self) -> GeoResult<W> {
        let mut inner = match self {
            CompressedWriter::Plain(w) => w,
            CompressedWriter::Gzip(enc) => enc
                .finish()
                .map_err(|e| compression_error("gzip stream", e))?,
            CompressedWriter::Zstd(enc) => enc
                .finish()
                .map_err(|e| compression_error("zstd stream", e))?,
        };
        inner.flush().context("Failed to flush compressed sink")?;
        Ok(inner)
    }
}

impl<W: Write> Write for CompressedWriter<W> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match self {
            CompressedWriter::Plain(w) => w.write(buf),
            CompressedWriter::Gzip(w) => w.write(buf),
            CompressedWriter::Zstd(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            CompressedWriter::Plain(w) => w.flush(),
            CompressedWriter::Gzip(w) => w.flush(),
            CompressedWriter::Zstd(w) => w.flush(),
        }
    }
}

fn compression_error(
    what: &str,
    err: io::Error,
) -> StackError {
    GenericError::new(
        StatusCode::CompressionFailed,
        format!("{what} failed: {err}"),
    )
    .into()
}

impl fmt::Display for Compression {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Compression::None),
            "gzip" | "gz" => Ok(Compression::Gzip),
            "zstd" | "zst" => Ok(Compression::Zstd),
            other => Err(GenericError::new(
                StatusCode::InvalidArgs,
                format!("unknown compression '{other}' (expected none, gzip or zstd)"),
            )
            .into()),
        }
    }
}
