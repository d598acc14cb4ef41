//! Variable-length integer encoding (LEB128-style) и zigzag.
//!
//! Экономит место для маленьких чисел:
//! - 0-127: 1 байт
//! - 128-16383: 2 байта
//! - 16384-2097151: 3 байта
//! - до u32::MAX: 5 байт, до u64::MAX: 10 байт

use std::io::{Read, Write};

use geobin_error::{CodecError, GeoResult, ResultExt};

use super::primitives::read_u8;

/// Максимальное кол-во байт для u32 в varint encoding.
pub const MAX_VARINT32_LEN: usize = 5;

/// Максимальное кол-во байт для u64 в varint encoding.
pub const MAX_VARINT64_LEN: usize = 10;

/// Записывает u64 в varint формате, возвращает кол-во записанных байт.
///
/// # Формат
/// - Каждый байт: 7 бит данных + 1 бит continuation
/// - MSB=1: есть ещё байты
/// - MSB=0: последний байт
///
/// # Examples
/// ```
/// use geobin::codec::varint::write_varint_u64;
///
/// let mut buf = Vec::new();
/// write_varint_u64(&mut buf, 300).unwrap();
/// assert_eq!(buf, vec![0xAC, 0x02]);
/// ```
pub fn write_varint_u64<W: Write + ?Sized>(
    w: &mut W,
    mut value: u64,
) -> GeoResult<usize> {
    let mut buf = [0u8; MAX_VARINT64_LEN];
    let mut len = 0;

    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if value != 0 {
            byte |= 0x80; // Continuation bit
        }

        buf[len] = byte;
        len += 1;

        if value == 0 {
            break;
        }
    }

    w.write_all(&buf[..len])
        .context("Failed to write varint")?;
    Ok(len)
}

/// Записывает u32 в varint формате (не более 5 байт).
pub fn write_varint_u32<W: Write + ?Sized>(
    w: &mut W,
    value: u32,
) -> GeoResult<usize> {
    write_varint_u64(w, u64::from(value))
}

/// Читает u64 из varint формата.
///
/// # Errors
/// - `UnexpectedEof` если поток кончился раньше времени
/// - `ParseError` если varint длиннее 10 байт или не влезает в 64 бита
pub fn read_varint_u64<R: Read + ?Sized>(r: &mut R) -> GeoResult<u64> {
    read_varint_raw(r, MAX_VARINT64_LEN)
}

/// Читает u32 из varint формата.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use geobin::codec::varint::read_varint_u32;
///
/// let mut cursor = Cursor::new(vec![0x80, 0x01]);
/// assert_eq!(read_varint_u32(&mut cursor).unwrap(), 128);
/// ```
pub fn read_varint_u32<R: Read + ?Sized>(r: &mut R) -> GeoResult<u32> {
    let value = read_varint_raw(r, MAX_VARINT32_LEN)?;
    u32::try_from(value).map_err(|_| too_long("varint32", "value overflows u32"))
}

fn read_varint_raw<R: Read + ?Sized>(
    r: &mut R,
    max_len: usize,
) -> GeoResult<u64> {
    let mut result: u64 = 0;

    for i in 0..max_len {
        let byte = read_u8(r, "varint")?;
        let payload = u64::from(byte & 0x7F);
        let shift = 7 * i as u32;

        // На 10-м байте в u64 остаётся место только под один бит.
        if shift == 63 && payload > 1 {
            return Err(too_long("varint64", "value overflows u64"));
        }
        result |= payload << shift;

        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }

    Err(too_long(
        if max_len == MAX_VARINT32_LEN {
            "varint32"
        } else {
            "varint64"
        },
        &format!("Varint too long (>{max_len} bytes), possible corruption"),
    ))
}

fn too_long(
    structure: &str,
    reason: &str,
) -> geobin_error::StackError {
    CodecError::ParseError {
        structure: structure.to_string(),
        reason: reason.to_string(),
        offset: None,
    }
    .into()
}

/// Вычисляет размер varint для числа (без записи).
pub fn varint_size_u64(mut value: u64) -> usize {
    let mut size = 1;
    while value >= 0x80 {
        value >>= 7;
        size += 1;
    }
    size
}

pub fn varint_size_u32(value: u32) -> usize {
    varint_size_u64(u64::from(value))
}

/// Zigzag: маленькие по модулю отрицательные числа становятся маленькими
/// беззнаковыми.
pub const fn zigzag_encode_32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

pub const fn zigzag_decode_32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

pub const fn zigzag_encode_64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

pub const fn zigzag_decode_64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Знаковый varint: zigzag + беззнаковый varint.
pub fn write_varint_i32<W: Write + ?Sized>(
    w: &mut W,
    value: i32,
) -> GeoResult<usize> {
    write_varint_u32(w, zigzag_encode_32(value))
}

pub fn read_varint_i32<R: Read + ?Sized>(r: &mut R) -> GeoResult<i32> {
    read_varint_u32(r).map(zigzag_decode_32)
}

pub fn write_varint_i64<W: Write + ?Sized>(
    w: &mut W,
    value: i64,
) -> GeoResult<usize> {
    write_varint_u64(w, zigzag_encode_64(value))
}

pub fn read_varint_i64<R: Read + ?Sized>(r: &mut R) -> GeoResult<i64> {
    read_varint_u64(r).map(zigzag_decode_64)
}
