use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use loterias_db::models::{Batch, Combination, GameKind};

use crate::error::{LotoError, LotoResult};

/// Histórico acotado de lotes guardados, del más antiguo al más reciente.
#[derive(Debug, Clone)]
pub struct BatchStore {
    batches: Vec<Batch>,
    max_batches: usize,
}

impl BatchStore {
    pub fn new(max_batches: usize) -> Self {
        Self {
            batches: Vec::new(),
            max_batches: max_batches.max(1),
        }
    }

    /// Recarga un histórico persistido, recortando al límite.
    pub fn restore(batches: Vec<Batch>, max_batches: usize) -> Self {
        let mut store = Self::new(max_batches);
        store.batches = batches;
        store.evict();
        store
    }

    pub fn save(&mut self, current: &[Combination], game: GameKind) -> LotoResult<&Batch> {
        if current.is_empty() {
            return Err(LotoError::EmptyBatch);
        }
        if let Some(other) = current.iter().find(|c| c.game() != game) {
            return Err(LotoError::InvalidConfiguration(format!(
                "Lote de {} con una jugada de {}",
                game.name(),
                other.game().name()
            )));
        }

        let batch = Batch {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            game,
            combinations: current.to_vec(),
        };
        info!(batch = %batch.id, game = %game, count = current.len(), "lote guardado");
        self.batches.push(batch);
        self.evict();
        self.batches.last().ok_or(LotoError::EmptyBatch)
    }

    /// Añade lotes ya validados y devuelve cuántos antiguos se descartaron.
    pub fn extend(&mut self, batches: Vec<Batch>) -> usize {
        self.batches.extend(batches);
        self.evict()
    }

    pub fn clear(&mut self) -> usize {
        let removed = self.batches.len();
        self.batches.clear();
        removed
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn max_batches(&self) -> usize {
        self.max_batches
    }

    /// Los `n` lotes más recientes, del más nuevo al más antiguo.
    pub fn latest(&self, n: usize) -> impl Iterator<Item = &Batch> {
        self.batches.iter().rev().take(n)
    }

    fn evict(&mut self) -> usize {
        let excess = self.batches.len().saturating_sub(self.max_batches);
        if excess > 0 {
            self.batches.drain(..excess);
        }
        excess
    }
}
