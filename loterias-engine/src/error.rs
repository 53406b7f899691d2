use loterias_db::db::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LotoError {
    #[error("Configuración inválida: {0}")]
    InvalidConfiguration(String),

    #[error("Cantidad inválida: {requested} (debe estar entre 1 y {max})")]
    InvalidCount { requested: i64, max: usize },

    #[error("No hay combinaciones para guardar")]
    EmptyBatch,

    #[error("Archivo de importación inválido: {0}")]
    MalformedImport(String),

    #[error("Almacenamiento lleno al escribir '{key}' ({size} bytes, límite {limit})")]
    StorageQuota {
        key: String,
        size: usize,
        limit: usize,
    },

    #[error("Error de almacenamiento: {0}")]
    Storage(StoreError),

    #[error("Error JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for LotoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::QuotaExceeded { key, size, limit } => {
                LotoError::StorageQuota { key, size, limit }
            }
            other => LotoError::Storage(other),
        }
    }
}

pub type LotoResult<T> = Result<T, LotoError>;
