//! Блоки байт с префиксом длины и текст UTF-16LE поверх них.
//!
//! Блок: пока осталось не меньше 255 байт, пишется sentinel `255` и 255
//! байт данных; затем остаток длиной 0..=254 с однобайтовым префиксом.
//! Полезная нагрузка ровно в 255 байт поэтому заканчивается нулевым
//! блоком-терминатором.

use std::io::{Read, Write};

use geobin_error::{ensure, CodecError, GeoResult, ResultExt};

use super::primitives::{read_bytes, read_u8, write_u8};

/// Префикс, означающий "полный блок, будет продолжение".
pub const BLOCK_SENTINEL: u8 = 255;

/// Размер полного блока.
pub const BLOCK_LEN: usize = BLOCK_SENTINEL as usize;

/// Пишет байты блоками, возвращает общее кол-во записанных байт.
pub fn write_length_prefixed<W: Write + ?Sized>(
    w: &mut W,
    payload: &[u8],
) -> GeoResult<usize> {
    let mut rest = payload;
    let mut written = 0;

    while rest.len() >= BLOCK_LEN {
        write_u8(w, BLOCK_SENTINEL)?;
        w.write_all(&rest[..BLOCK_LEN])
            .context("Failed to write text block")?;
        rest = &rest[BLOCK_LEN..];
        written += BLOCK_LEN + 1;
    }

    write_u8(w, rest.len() as u8)?;
    w.write_all(rest).context("Failed to write text block")?;

    Ok(written + rest.len() + 1)
}

/// Читает блоки в `buf` (буфер предварительно очищается).
pub fn read_length_prefixed<R: Read + ?Sized>(
    r: &mut R,
    buf: &mut Vec<u8>,
    field: &str,
) -> GeoResult<()> {
    buf.clear();
    loop {
        let len = read_u8(r, field)?;
        let start = buf.len();
        buf.resize(start + len as usize, 0);
        read_bytes(r, &mut buf[start..], field)?;

        if len != BLOCK_SENTINEL {
            return Ok(());
        }
    }
}

/// Размер закодированного блока для полезной нагрузки длиной `len`.
pub const fn length_prefixed_size(len: usize) -> usize {
    len / BLOCK_LEN + 1 + len
}

/// Текст, который пишется как пустой: пустая строка или только пробелы.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Пишет текст как UTF-16LE в блоках. Пустой текст даёт один байт `0`.
pub fn write_text<W: Write + ?Sized>(
    w: &mut W,
    text: &str,
) -> GeoResult<usize> {
    if is_blank(text) {
        write_u8(w, 0)?;
        return Ok(1);
    }

    let mut payload = Vec::with_capacity(text.len() * 2);
    for unit in text.encode_utf16() {
        payload.extend_from_slice(&unit.to_le_bytes());
    }
    write_length_prefixed(w, &payload)
}

pub fn write_opt_text<W: Write + ?Sized>(
    w: &mut W,
    text: Option<&str>,
) -> GeoResult<usize> {
    write_text(w, text.unwrap_or_default())
}

/// Читает текст. `scratch` переиспользуется между вызовами.
pub fn read_text<R: Read + ?Sized>(
    r: &mut R,
    scratch: &mut Vec<u8>,
    field: &str,
) -> GeoResult<String> {
    read_length_prefixed(r, scratch, field)?;
    decode_utf16le(scratch, field)
}

/// Как [`read_text`], но пустой текст означает отсутствие значения.
pub fn read_opt_text<R: Read + ?Sized>(
    r: &mut R,
    scratch: &mut Vec<u8>,
    field: &str,
) -> GeoResult<Option<String>> {
    let text = read_text(r, scratch, field)?;
    Ok((!text.is_empty()).then_some(text))
}

fn decode_utf16le(
    bytes: &[u8],
    field: &str,
) -> GeoResult<String> {
    ensure!(
        bytes.len() % 2 == 0,
        CodecError::InvalidText {
            field: field.to_string(),
            reason: format!("odd UTF-16 payload length {}", bytes.len()),
            offset: None,
        }
    );

    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| {
            CodecError::InvalidText {
                field: field.to_string(),
                reason: format!("unpaired surrogate 0x{:04X}", e.unpaired_surrogate()),
                offset: None,
            }
            .into()
        })
}

/// Размер закодированного текста.
pub fn text_size(text: &str) -> usize {
    if is_blank(text) {
        return 1;
    }
    length_prefixed_size(text.encode_utf16().count() * 2)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use geobin_error::StatusCode;

    use super::*;

    fn block_roundtrip(len: usize) -> Vec<u8> {
        let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let mut buf = Vec::new();
        let written = write_length_prefixed(&mut buf, &payload).unwrap();
        assert_eq!(written, buf.len());
        assert_eq!(written, length_prefixed_size(len));

        let mut out = Vec::new();
        read_length_prefixed(&mut Cursor::new(&buf), &mut out, "block").unwrap();
        assert_eq!(out, payload, "payload mismatch for {len}");
        buf
    }

    /// Тест проверяет границы блоков: 254, 255, 256, 510 байт.
    #[test]
    fn test_block_boundaries() {
        let buf = block_roundtrip(254);
        assert_eq!(buf[0], 254);
        assert_eq!(buf.len(), 255);

        // ровно 255: полный блок и нулевой терминатор
        let buf = block_roundtrip(255);
        assert_eq!(buf[0], BLOCK_SENTINEL);
        assert_eq!(buf.len(), 257);
        assert_eq!(buf[256], 0);

        let buf = block_roundtrip(256);
        assert_eq!(buf[256], 1);
        assert_eq!(buf.len(), 258);

        // 510: два полных блока и нулевой терминатор
        let buf = block_roundtrip(510);
        assert_eq!(buf[0], BLOCK_SENTINEL);
        assert_eq!(buf[256], BLOCK_SENTINEL);
        assert_eq!(buf[512], 0);
        assert_eq!(buf.len(), 513);
    }

    /// Тест проверяет, что пустой и пробельный текст пишутся одним нулём.
    #[test]
    fn test_blank_text() {
        for text in ["", "   ", "\t\n"] {
            let mut buf = Vec::new();
            assert_eq!(write_text(&mut buf, text).unwrap(), 1);
            assert_eq!(buf, vec![0]);
            assert_eq!(text_size(text), 1);

            let mut scratch = Vec::new();
            let read = read_opt_text(&mut Cursor::new(&buf), &mut scratch, "user_name").unwrap();
            assert_eq!(read, None);
        }
    }

    /// Тест проверяет кодирование не-ASCII текста и суррогатных пар.
    #[test]
    fn test_utf16_text() {
        let mut scratch = Vec::new();
        for text in ["Ben", "hu?", "Straße", "東京", "🗺 map"] {
            let mut buf = Vec::new();
            let written = write_text(&mut buf, text).unwrap();
            assert_eq!(written, text_size(text));

            let read = read_text(&mut Cursor::new(&buf), &mut scratch, "name").unwrap();
            assert_eq!(read, text);
        }

        let mut buf = Vec::new();
        write_text(&mut buf, "Ben").unwrap();
        assert_eq!(buf, vec![6, b'B', 0, b'e', 0, b'n', 0]);
    }

    /// Тест проверяет текст, пересекающий границу блока (128 символов =
    /// 256 байт).
    #[test]
    fn test_text_across_block() {
        let text: String = std::iter::repeat('x').take(128).collect();
        let mut buf = Vec::new();
        write_text(&mut buf, &text).unwrap();
        assert_eq!(buf[0], BLOCK_SENTINEL);
        assert_eq!(buf.len(), 258);

        let mut scratch = Vec::new();
        let read = read_text(&mut Cursor::new(&buf), &mut scratch, "value").unwrap();
        assert_eq!(read, text);
    }

    /// Тест проверяет текст ровно из 255 символов: 510 байт, два полных
    /// блока и нулевой терминатор, следом читается следующее поле.
    #[test]
    fn test_text_255_chars() {
        let text = "a".repeat(255);
        let mut buf = Vec::new();
        let written = write_text(&mut buf, &text).unwrap();
        assert_eq!(written, 513);
        assert_eq!(text_size(&text), 513);
        assert_eq!(buf[0], BLOCK_SENTINEL);
        assert_eq!(buf[256], BLOCK_SENTINEL);
        assert_eq!(buf[512], 0);
        write_text(&mut buf, "b").unwrap();

        let mut cursor = Cursor::new(&buf);
        let mut scratch = Vec::new();
        assert_eq!(read_text(&mut cursor, &mut scratch, "value").unwrap(), text);
        assert_eq!(read_text(&mut cursor, &mut scratch, "value").unwrap(), "b");
        assert_eq!(cursor.position(), buf.len() as u64);
    }

    /// Тест проверяет ошибку на нечётной длине.
    #[test]
    fn test_odd_length_is_invalid() {
        let data = vec![3, b'a', 0, b'b'];
        let mut scratch = Vec::new();
        let err = read_text(&mut Cursor::new(data), &mut scratch, "key").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidText);
        assert!(err.to_string().contains("odd"));
    }

    /// Тест проверяет ошибку на одиночном суррогате.
    #[test]
    fn test_unpaired_surrogate() {
        let data = vec![2, 0x00, 0xD8];
        let mut scratch = Vec::new();
        let err = read_text(&mut Cursor::new(data), &mut scratch, "role").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::InvalidText);
        assert!(err.to_string().contains("0xD800"), "got: {err}");
    }

    /// Тест проверяет обрыв внутри блока.
    #[test]
    fn test_truncated_block() {
        let data = vec![BLOCK_SENTINEL, 1, 2, 3];
        let mut out = Vec::new();
        let err = read_length_prefixed(&mut Cursor::new(data), &mut out, "value").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UnexpectedEof);
    }
}
