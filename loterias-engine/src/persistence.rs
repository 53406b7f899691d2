use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use loterias_db::config::SessionConfig;
use loterias_db::db::KeyValueStore;
use loterias_db::models::Batch;

use crate::error::LotoResult;
use crate::stats::{self, StatsSource};
use crate::transfer;

pub const HISTORY_KEY: &str = "generador_combinaciones_historial";
pub const STATISTICS_KEY: &str = "generador_combinaciones_estadisticas";
pub const CONFIG_KEY: &str = "generador_combinaciones_config";
pub const BACKUP_KEY: &str = "backup_automatico";

pub const ALL_KEYS: [&str; 4] = [HISTORY_KEY, STATISTICS_KEY, CONFIG_KEY, BACKUP_KEY];

const BACKUP_VERSION: &str = "1.0";

/// Copia automática de los lotes más recientes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub version: String,
    pub backed_up_at: DateTime<Utc>,
    pub history: Vec<Batch>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub history: Vec<Batch>,
    pub config: SessionConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadWarning {
    /// Valor ilegible; la clave fue borrada y se usan valores por defecto.
    CorruptKey { key: String, reason: String },
    /// Lote legible pero con jugadas inválidas; se descarta.
    InvalidBatch { key: String, index: usize, reason: String },
    /// El almacén no respondió para esta clave.
    Unreadable { key: String, reason: String },
    RestoredFromBackup { batches: usize },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::CorruptKey { key, reason } => {
                write!(f, "Datos corruptos en '{}' ({}), se restablecen", key, reason)
            }
            LoadWarning::Unreadable { key, reason } => {
                write!(f, "No se pudo leer '{}': {}", key, reason)
            }
            LoadWarning::InvalidBatch { key, index, reason } => {
                write!(f, "Lote {} de '{}' descartado: {}", index + 1, key, reason)
            }
            LoadWarning::RestoredFromBackup { batches } => {
                write!(f, "Histórico restaurado desde la copia automática ({} lotes)", batches)
            }
        }
    }
}

fn load_key<S, T>(store: &mut S, key: &str, warnings: &mut Vec<LoadWarning>) -> Option<T>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "lectura fallida");
            warnings.push(LoadWarning::Unreadable {
                key: key.to_string(),
                reason: e.to_string(),
            });
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "clave corrupta, se borra");
            if let Err(remove_err) = store.remove(key) {
                warn!(key, error = %remove_err, "no se pudo borrar la clave corrupta");
            }
            warnings.push(LoadWarning::CorruptKey {
                key: key.to_string(),
                reason: e.to_string(),
            });
            None
        }
    }
}

/// Descarta los lotes que no pasan las mismas reglas que la importación.
fn keep_valid(batches: Vec<Batch>, key: &str, warnings: &mut Vec<LoadWarning>) -> Vec<Batch> {
    batches
        .into_iter()
        .enumerate()
        .filter_map(|(index, batch)| match transfer::check_batch(&batch) {
            Ok(()) => Some(batch),
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(key, index, %reason, "lote inválido descartado");
                warnings.push(LoadWarning::InvalidBatch {
                    key: key.to_string(),
                    index,
                    reason,
                });
                None
            }
        })
        .collect()
}

/// Carga histórico y configuración; cada clave se lee por separado.
///
/// Las estadísticas guardadas no se leen: se recalculan a partir del histórico.
pub fn load_all<S: KeyValueStore + ?Sized>(store: &mut S) -> (Snapshot, Vec<LoadWarning>) {
    let mut warnings = Vec::new();

    let stored: Vec<Batch> = load_key(store, HISTORY_KEY, &mut warnings).unwrap_or_default();
    let mut history = keep_valid(stored, HISTORY_KEY, &mut warnings);
    let config: SessionConfig = load_key(store, CONFIG_KEY, &mut warnings).unwrap_or_default();

    if history.is_empty() {
        let backup: Option<Backup> = load_key(store, BACKUP_KEY, &mut warnings);
        let restored = backup
            .map(|b| keep_valid(b.history, BACKUP_KEY, &mut warnings))
            .unwrap_or_default();
        if !restored.is_empty() {
            info!(batches = restored.len(), "histórico restaurado desde la copia");
            warnings.push(LoadWarning::RestoredFromBackup {
                batches: restored.len(),
            });
            history = restored;
        }
    }

    (Snapshot { history, config }, warnings)
}

/// Escribe histórico, estadísticas, configuración y copia automática.
pub fn save_all<S: KeyValueStore + ?Sized>(
    store: &mut S,
    history: &[Batch],
    config: &SessionConfig,
    backup_batches: usize,
) -> LotoResult<()> {
    let statistics = stats::recompute(StatsSource::History(history));
    let start = history.len().saturating_sub(backup_batches);
    let backup = Backup {
        version: BACKUP_VERSION.to_string(),
        backed_up_at: Utc::now(),
        history: history[start..].to_vec(),
    };

    store.set(HISTORY_KEY, &serde_json::to_string(history)?)?;
    store.set(STATISTICS_KEY, &serde_json::to_string(&statistics)?)?;
    store.set(CONFIG_KEY, &serde_json::to_string(config)?)?;
    store.set(BACKUP_KEY, &serde_json::to_string(&backup)?)?;
    info!(batches = history.len(), "estado guardado");
    Ok(())
}

pub fn clear_all<S: KeyValueStore + ?Sized>(store: &mut S) -> LotoResult<()> {
    for key in ALL_KEYS {
        store.remove(key)?;
    }
    Ok(())
}
