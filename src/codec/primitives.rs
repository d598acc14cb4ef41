//! Примитивы фиксированной ширины (little-endian).
//!
//! Каждая функция чтения принимает имя поля: при обрыве потока оно попадает
//! в [`CodecError::UnexpectedEof`], остальные ошибки IO пробрасываются как
//! есть.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use geobin_error::{ensure, CodecError, GeoResult, ResultExt, StackError};

/// Превращает ошибку чтения в ошибку кодека: обрыв потока становится
/// `UnexpectedEof` с именем поля, прочее остаётся ошибкой IO.
pub fn read_error(
    err: io::Error,
    field: &str,
    expected: usize,
) -> StackError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        CodecError::UnexpectedEof {
            context: format!("reading {field}"),
            offset: None,
            expected_bytes: Some(expected as u64),
        }
        .into()
    } else {
        StackError::from(err).context(format!("Failed to read {field}"))
    }
}

macro_rules! fixed_width {
    ($read:ident, $write:ident, $ty:ty, $read_fn:ident, $write_fn:ident) => {
        #[doc = concat!("Читает `", stringify!($ty), "` в little-endian.")]
        pub fn $read<R: Read + ?Sized>(
            r: &mut R,
            field: &str,
        ) -> GeoResult<$ty> {
            r.$read_fn::<LittleEndian>()
                .map_err(|e| read_error(e, field, std::mem::size_of::<$ty>()))
        }

        #[doc = concat!("Пишет `", stringify!($ty), "` в little-endian.")]
        pub fn $write<W: Write + ?Sized>(
            w: &mut W,
            value: $ty,
        ) -> GeoResult<()> {
            w.$write_fn::<LittleEndian>(value)
                .context(concat!("Failed to write ", stringify!($ty)))
        }
    };
}

fixed_width!(read_i32, write_i32, i32, read_i32, write_i32);
fixed_width!(read_u32, write_u32, u32, read_u32, write_u32);
fixed_width!(read_i64, write_i64, i64, read_i64, write_i64);
fixed_width!(read_u64, write_u64, u64, read_u64, write_u64);
fixed_width!(read_f32, write_f32, f32, read_f32, write_f32);
fixed_width!(read_f64, write_f64, f64, read_f64, write_f64);

pub fn read_u8<R: Read + ?Sized>(
    r: &mut R,
    field: &str,
) -> GeoResult<u8> {
    r.read_u8().map_err(|e| read_error(e, field, 1))
}

pub fn write_u8<W: Write + ?Sized>(
    w: &mut W,
    value: u8,
) -> GeoResult<()> {
    w.write_u8(value).context("Failed to write u8")
}

/// Читает ровно `buf.len()` байт.
pub fn read_bytes<R: Read + ?Sized>(
    r: &mut R,
    buf: &mut [u8],
    field: &str,
) -> GeoResult<()> {
    r.read_exact(buf)
        .map_err(|e| read_error(e, field, buf.len()))
}

/// Читает байт, если поток не закончился. `None` означает чистый конец
/// данных ровно на границе.
pub fn try_read_u8<R: Read + ?Sized>(
    r: &mut R,
    field: &str,
) -> GeoResult<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match r.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_error(e, field, 1)),
        }
    }
}

/// Читает счётчик элементов (i32). Отрицательное значение — ошибка.
pub fn read_count<R: Read + ?Sized>(
    r: &mut R,
    field: &str,
) -> GeoResult<usize> {
    let raw = read_i32(r, field)?;
    ensure!(
        raw >= 0,
        CodecError::InvalidLength {
            field: field.to_string(),
            length: i64::from(raw),
            offset: None,
        }
    );
    Ok(raw as usize)
}

/// Пишет счётчик элементов (i32).
pub fn write_count<W: Write + ?Sized>(
    w: &mut W,
    count: usize,
    what: &str,
) -> GeoResult<()> {
    let raw = i32::try_from(count).map_err(|_| {
        StackError::from(CodecError::EncodingError {
            what: what.to_string(),
            reason: format!("{count} elements exceed i32::MAX"),
        })
    })?;
    write_i32(w, raw)
}
