//! Server settings.
//!
//! `config/default.toml` is embedded in the binary. An optional `consultalab.toml` in the
//! working directory and `CONSULTALAB__<SECTION>__<KEY>` environment variables are layered
//! on top of it.

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_TOML: &str = include_str!("../config/default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub reports: ReportSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    pub database_path: PathBuf,
}

/// Where genpdf loads the TTF family used by the reports from.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportSettings {
    pub fonts_dir: PathBuf,
    pub font_family: String,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml))
            .add_source(File::with_name("consultalab").format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix("CONSULTALAB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Defaults only, ignoring files and environment.
    #[cfg(test)]
    pub fn defaults() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
