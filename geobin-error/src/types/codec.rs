use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Ошибка кодека записей с контекстом для диагностики.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Неизвестный байт-дискриминатор (вид записи, вид участника, bool,
    /// флаги координат)
    MalformedField {
        field: String,
        value: u8,
        offset: Option<u64>,
        valid: Vec<u8>,
    },

    /// Недопустимая длина или количество элементов
    InvalidLength {
        field: String,
        length: i64,
        offset: Option<u64>,
    },

    /// Текст не декодируется из UTF-16LE
    InvalidText {
        field: String,
        reason: String,
        offset: Option<u64>,
    },

    /// Поток закончился посреди поля
    UnexpectedEof {
        context: String,
        offset: Option<u64>,
        expected_bytes: Option<u64>,
    },

    /// Ошибка разбора примитива (например, слишком длинный varint)
    ParseError {
        structure: String,
        reason: String,
        offset: Option<u64>,
    },

    /// Значение не представимо в формате
    EncodingError { what: String, reason: String },

    /// Ожидалась запись, но её нет
    MissingRecord { operation: String },

    /// Операция не поддерживается источником или состоянием читателя
    Unsupported { operation: String, reason: String },
}

impl CodecError {
    /// Добавляет offset записи к ошибке.
    pub fn with_offset(
        mut self,
        offset: u64,
    ) -> Self {
        match &mut self {
            Self::MalformedField { offset: o, .. }
            | Self::InvalidLength { offset: o, .. }
            | Self::InvalidText { offset: o, .. }
            | Self::UnexpectedEof { offset: o, .. }
            | Self::ParseError { offset: o, .. } => {
                *o = Some(offset);
            }
            _ => {}
        }
        self
    }

    /// Уточняет имя поля, в котором произошла ошибка.
    pub fn with_field(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        match &mut self {
            Self::MalformedField { field, .. }
            | Self::InvalidLength { field, .. }
            | Self::InvalidText { field, .. } => {
                *field = name;
            }
            Self::UnexpectedEof { context, .. } => {
                *context = format!("reading {name}");
            }
            Self::ParseError { structure, .. } => {
                *structure = name;
            }
            _ => {}
        }
        self
    }

    /// Offset записи, если известен.
    pub fn offset(&self) -> Option<u64> {
        match self {
            Self::MalformedField { offset, .. }
            | Self::InvalidLength { offset, .. }
            | Self::InvalidText { offset, .. }
            | Self::UnexpectedEof { offset, .. }
            | Self::ParseError { offset, .. } => *offset,
            _ => None,
        }
    }

    /// Подсказка для пользователя.
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            Self::MalformedField { .. } | Self::InvalidLength { .. } => {
                Some("Check that the stream is read with the format it was written in")
            }
            Self::UnexpectedEof { .. } => Some("Input may be truncated. Check file integrity"),
            Self::Unsupported { .. } => {
                Some("Reset is only available for seekable sources; reopen the input instead")
            }
            Self::MissingRecord { .. } => Some("Advance the source before reading a record"),
            _ => None,
        }
    }

    /// Можно ли продолжать работу с читателем после этой ошибки.
    ///
    /// Ошибка посреди записи оставляет позицию потока в неизвестном
    /// состоянии, поэтому восстановимы только ошибки вызова.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MissingRecord { .. } | Self::Unsupported { .. } | Self::EncodingError { .. }
        )
    }
}

impl std::fmt::Display for CodecError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::MalformedField {
                field,
                value,
                offset,
                valid,
            } => {
                write!(f, "Malformed {field}: 0x{value:02X} (valid: {valid:?})")?;
                write_offset(f, *offset)
            }
            Self::InvalidLength {
                field,
                length,
                offset,
            } => {
                write!(f, "Invalid {field} length {length}")?;
                write_offset(f, *offset)
            }
            Self::InvalidText {
                field,
                reason,
                offset,
            } => {
                write!(f, "Invalid text in {field}: {reason}")?;
                write_offset(f, *offset)
            }
            Self::UnexpectedEof {
                context,
                offset,
                expected_bytes,
            } => {
                write!(f, "Unexpected EOF: {context}")?;
                if let Some(exp) = expected_bytes {
                    write!(f, " (expected {exp} bytes)")?;
                }
                write_offset(f, *offset)
            }
            Self::ParseError {
                structure,
                reason,
                offset,
            } => {
                write!(f, "Failed to parse {structure}: {reason}")?;
                write_offset(f, *offset)
            }
            Self::EncodingError { what, reason } => {
                write!(f, "Cannot encode {what}: {reason}")
            }
            Self::MissingRecord { operation } => {
                write!(f, "No record available for {operation}")
            }
            Self::Unsupported { operation, reason } => {
                write!(f, "Unsupported operation {operation}: {reason}")
            }
        }
    }
}

fn write_offset(
    f: &mut std::fmt::Formatter<'_>,
    offset: Option<u64>,
) -> std::fmt::Result {
    if let Some(o) = offset {
        write!(f, " [offset: 0x{o:X}]")?;
    }
    Ok(())
}

impl std::error::Error for CodecError {}

impl ErrorExt for CodecError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedField { .. } | Self::InvalidLength { .. } => StatusCode::InvalidData,
            Self::InvalidText { .. } => StatusCode::InvalidText,
            Self::UnexpectedEof { .. } => StatusCode::UnexpectedEof,
            Self::ParseError { .. } => StatusCode::ParseError,
            Self::EncodingError { .. } => StatusCode::EncodingError,
            Self::MissingRecord { .. } => StatusCode::InvalidArgs,
            Self::Unsupported { .. } => StatusCode::Unsupported,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::MalformedField { field, .. } => format!("Malformed record field: {field}"),
            Self::InvalidLength { field, .. } => format!("Invalid {field} length"),
            Self::InvalidText { field, .. } => format!("Invalid text in {field}"),
            Self::UnexpectedEof { .. } => "Input ends in the middle of a record".to_string(),
            Self::ParseError { structure, .. } => format!("Failed to parse {structure}"),
            Self::EncodingError { what, .. } => format!("Failed to encode {what}"),
            Self::MissingRecord { operation } => format!("No record available for {operation}"),
            Self::Unsupported { operation, .. } => format!("{operation} is not supported"),
        }
    }

    fn log_message(&self) -> String {
        let mut msg = format!("{:?}", self);
        if let Some(hint) = self.recovery_hint() {
            msg.push_str(&format!(" | Hint: {hint}"));
        }
        msg
    }

    fn metrics_tags(&self) -> Vec<(&'static str, String)> {
        let mut tags = vec![
            ("error_type", self.type_name()),
            ("status_code", self.status_code().to_string()),
            ("recoverable", self.is_recoverable().to_string()),
        ];

        match self {
            Self::MalformedField { field, value, .. } => {
                tags.push(("field", field.clone()));
                tags.push(("value", format!("0x{value:02X}")));
            }
            Self::InvalidLength { field, .. } | Self::InvalidText { field, .. } => {
                tags.push(("field", field.clone()));
            }
            _ => {}
        }
        if let Some(offset) = self.offset() {
            tags.push(("offset", offset.to_string()));
        }

        tags
    }
}

impl From<CodecError> for std::io::Error {
    fn from(e: CodecError) -> Self {
        let kind = match &e {
            CodecError::UnexpectedEof { .. } => std::io::ErrorKind::UnexpectedEof,
            CodecError::MalformedField { .. }
            | CodecError::InvalidLength { .. }
            | CodecError::InvalidText { .. }
            | CodecError::ParseError { .. }
            | CodecError::EncodingError { .. } => std::io::ErrorKind::InvalidData,
            CodecError::MissingRecord { .. } => std::io::ErrorKind::InvalidInput,
            CodecError::Unsupported { .. } => std::io::ErrorKind::Unsupported,
        };

        std::io::Error::new(kind, e.to_string())
    }
}
