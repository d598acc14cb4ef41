use std::{fmt, str::FromStr};

use geobin_error::{GenericError, StackError, StatusCode};
use serde::{Deserialize, Serialize};

/// Вариант формата, в котором читается поток.
///
/// В самом потоке нет ни магии, ни версии: формат выбирает вызывающий.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Заголовок с флагами отсутствия для всех видов записей.
    #[default]
    Current,
    /// Только чтение: старый поток с флагами, любой заголовок разбирается
    /// по раскладке с флагами.
    Legacy,
    /// Только чтение: раскладка без флагов (все поля, visible в трёх
    /// состояниях, координаты f32). Выбирается только явно.
    Unflagged,
}

impl WireFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            WireFormat::Current => "current",
            WireFormat::Legacy => "legacy",
            WireFormat::Unflagged => "unflagged",
        }
    }

    /// Можно ли писать в этом формате.
    pub fn is_writable(self) -> bool {
        matches!(self, WireFormat::Current)
    }
}

impl fmt::Display for WireFormat {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireFormat {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current" => Ok(WireFormat::Current),
            "legacy" => Ok(WireFormat::Legacy),
            "unflagged" => Ok(WireFormat::Unflagged),
            other => Err(GenericError::new(
                StatusCode::InvalidArgs,
                format!("unknown wire format '{other}' (expected current, legacy or unflagged)"),
            )
            .into()),
        }
    }
}
