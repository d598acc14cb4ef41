use std::{any::Any, path::Path};

use config::{Config, ConfigError, Environment, File};
use geobin_error::{ErrorExt, StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    codec::WireFormat,
    logging::{LoggingConfig, LoggingError},
    stream::DEFAULT_BUFFER_SIZE,
    transport::{Compression, DEFAULT_ZSTD_LEVEL},
};

/// Имя файла настроек, который ищется в текущем каталоге.
pub const DEFAULT_CONFIG_NAME: &str = "geobin";

/// Префикс переменных окружения.
pub const ENV_PREFIX: &str = "GEOBIN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Формат входного потока
    pub format: WireFormat,
    /// Сжатие входа и выхода
    pub compression: Compression,
    pub zstd_level: i32,
    pub read_buffer_size: usize,
    pub logging: LoggingConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error(transparent)]
    Logging(#[from] LoggingError),
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Settings {
    /// Загружает настройки: значения по умолчанию, затем файл (явный путь
    /// обязателен, `geobin.*` в текущем каталоге — нет), затем окружение.
    ///
    /// Вложенные ключи в окружении разделяются `__`:
    /// `GEOBIN_LOGGING__LEVEL=debug`.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(
        path: Option<&Path>,
        env: Environment,
    ) -> Result<Self, SettingsError> {
        let defaults = Settings::default();

        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let cfg = Config::builder()
            .set_default("format", defaults.format.as_str())?
            .set_default("compression", defaults.compression.as_str())?
            .set_default("zstd_level", i64::from(defaults.zstd_level))?
            .set_default("read_buffer_size", defaults.read_buffer_size as u64)?
            .set_default("logging.level", defaults.logging.level.as_str())?
            .add_source(file)
            .add_source(
                env.prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Проверяет значения, которые `serde` пропускает.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.read_buffer_size == 0 {
            return Err(SettingsError::Invalid {
                field: "read_buffer_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !(1..=22).contains(&self.zstd_level) {
            return Err(SettingsError::Invalid {
                field: "zstd_level",
                reason: format!("{} is outside 1..=22", self.zstd_level),
            });
        }
        self.logging.validate()?;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов
////////////////////////////////////////////////////////////////////////////////

impl Default for Settings {
    fn default() -> Self {
        Self {
            format: WireFormat::Current,
            compression: Compression::None,
            zstd_level: DEFAULT_ZSTD_LEVEL,
            read_buffer_size: DEFAULT_BUFFER_SIZE,
            logging: LoggingConfig::default(),
        }
    }
}

impl ErrorExt for SettingsError {
    fn status_code(&self) -> StatusCode {
        match self {
            SettingsError::Load(_) | SettingsError::Invalid { .. } => StatusCode::InvalidConfig,
            SettingsError::Logging(e) => e.status_code(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
