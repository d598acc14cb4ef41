//! Настройки CLI: значения по умолчанию, файл `geobin.toml` и переменные
//! окружения `GEOBIN_*`.

pub mod settings;

pub use settings::{Settings, SettingsError};
