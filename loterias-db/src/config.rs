use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::models::GameKind;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Preferencias de la sesión, persistidas entre ejecuciones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub theme: Theme,
    pub last_game: GameKind,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            last_game: GameKind::Baloto,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub max_combinations: usize,
    pub default_count: usize,
    pub max_history: usize,
    pub backup_batches: usize,
    pub storage_quota_bytes: usize,
    pub generation_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_combinations: 100,
            default_count: 5,
            max_history: 1000,
            backup_batches: 50,
            storage_quota_bytes: 5 * 1024 * 1024,
            generation_delay_ms: 800,
        }
    }
}

pub fn save_settings(settings: &Settings, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)
        .with_context(|| format!("No se pudo escribir {:?}", path))?;
    Ok(())
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("No se pudo leer {:?}", path))?;
    let settings: Settings = serde_json::from_str(&json)
        .with_context(|| format!("Configuración inválida en {:?}", path))?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.max_combinations, 100);
        assert_eq!(settings.max_history, 1000);
        assert_eq!(settings.default_count, 5);
    }

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"maxHistory": 10}"#).unwrap();
        assert_eq!(settings.max_history, 10);
        assert_eq!(settings.max_combinations, 100);
    }

    #[test]
    fn test_settings_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loterias.json");
        let settings = Settings {
            generation_delay_ms: 0,
            ..Settings::default()
        };
        save_settings(&settings, &path).unwrap();
        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn test_session_config_json_shape() {
        let config = SessionConfig {
            theme: Theme::Dark,
            last_game: GameKind::ColorLoto,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"theme":"dark","lastGame":"color-loto"}"#);
    }
}
