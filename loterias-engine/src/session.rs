use chrono::Utc;
use rand::rngs::StdRng;
use tracing::{info, warn};

use loterias_db::config::{SessionConfig, Settings, Theme};
use loterias_db::db::KeyValueStore;
use loterias_db::models::{Batch, Combination, GameConfig, GameKind, Statistics};

use crate::batch::BatchStore;
use crate::dedup;
use crate::error::LotoResult;
use crate::generator::{self, DrawStrategy};
use crate::persistence::{self, LoadWarning};
use crate::selection;
use crate::stats::{self, StatsSource};
use crate::transfer::{self, ExportFile, ImportReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsScope {
    Current,
    History,
}

/// Estado completo de una sesión de juego, respaldado por un almacén clave-valor.
pub struct Session<S: KeyValueStore> {
    store: S,
    rng: StdRng,
    settings: Settings,
    config: SessionConfig,
    current: Vec<Combination>,
    current_game: GameKind,
    history: BatchStore,
}

impl<S: KeyValueStore> Session<S> {
    pub fn open(mut store: S, settings: Settings, seed: Option<u64>) -> (Self, Vec<LoadWarning>) {
        let (snapshot, warnings) = persistence::load_all(&mut store);
        for w in &warnings {
            warn!("{}", w);
        }
        let session = Self {
            rng: generator::make_rng(seed),
            history: BatchStore::restore(snapshot.history, settings.max_history),
            current_game: snapshot.config.last_game,
            config: snapshot.config,
            current: Vec::new(),
            settings,
            store,
        };
        (session, warnings)
    }

    pub fn generate(&mut self, game: GameKind, count: i64) -> LotoResult<&[Combination]> {
        self.generate_with(game, count, false)
    }

    /// Como `generate`, pero sesgado hacia los números frecuentes del histórico.
    pub fn generate_hot(&mut self, game: GameKind, count: i64) -> LotoResult<&[Combination]> {
        self.generate_with(game, count, true)
    }

    fn generate_with(&mut self, game: GameKind, count: i64, hot: bool) -> LotoResult<&[Combination]> {
        let config = GameConfig::for_game(game);
        let frequency;
        let strategy = if hot {
            frequency = stats::number_frequency(self.history.batches(), game);
            DrawStrategy::Hot(&frequency)
        } else {
            DrawStrategy::Uniform
        };
        let combinations = generator::generate_many(
            config,
            count,
            self.settings.max_combinations,
            strategy,
            &mut self.rng,
        )?;
        self.current = combinations;
        self.current_game = game;
        self.config.last_game = game;
        Ok(&self.current)
    }

    /// Elimina jugadas repetidas de la lista actual y devuelve cuántas se quitaron.
    pub fn dedupe_current(&mut self) -> usize {
        let before = self.current.len();
        self.current = dedup::dedupe(std::mem::take(&mut self.current));
        before - self.current.len()
    }

    pub fn select_best(&mut self) -> usize {
        selection::select_best(&mut self.current)
    }

    /// Invierte la selección de la jugada `index`; `None` si no existe.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let combination = self.current.get_mut(index)?;
        combination.selected = !combination.selected;
        Some(combination.selected)
    }

    pub fn set_all_selected(&mut self, selected: bool) {
        for c in &mut self.current {
            c.selected = selected;
        }
    }

    pub fn delete_selected(&mut self) -> usize {
        let before = self.current.len();
        self.current.retain(|c| !c.selected);
        before - self.current.len()
    }

    pub fn clear_current(&mut self) -> usize {
        let removed = self.current.len();
        self.current.clear();
        removed
    }

    pub fn save_current(&mut self) -> LotoResult<&Batch> {
        self.history.save(&self.current, self.current_game)
    }

    pub fn clear_history(&mut self) -> usize {
        let removed = self.history.clear();
        info!(removed, "histórico borrado");
        removed
    }

    pub fn statistics(&self, scope: StatsScope) -> Statistics {
        match scope {
            StatsScope::Current => stats::recompute(StatsSource::Current(&self.current)),
            StatsScope::History => stats::recompute(StatsSource::History(self.history.batches())),
        }
    }

    pub fn export(&self) -> LotoResult<ExportFile> {
        transfer::export_history(self.history.batches(), Utc::now())
    }

    /// Añade los lotes válidos del archivo; el histórico no cambia si el archivo se rechaza.
    pub fn import(&mut self, json: &str) -> LotoResult<ImportReport> {
        let parsed = transfer::parse_import(json)?;
        let imported = parsed.batches.len();
        let evicted = self.history.extend(parsed.batches);
        info!(imported, skipped = parsed.skipped.len(), evicted, "importación terminada");
        Ok(ImportReport {
            imported,
            skipped: parsed.skipped,
            evicted,
        })
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.config.theme = theme;
    }

    pub fn set_last_game(&mut self, game: GameKind) {
        self.config.last_game = game;
    }

    /// Escribe el estado en el almacén. Un fallo no altera la memoria.
    pub fn persist(&mut self) -> LotoResult<()> {
        persistence::save_all(
            &mut self.store,
            self.history.batches(),
            &self.config,
            self.settings.backup_batches,
        )
        .inspect_err(|e| warn!(error = %e, "no se pudo guardar el estado"))
    }

    /// Vuelve al estado inicial y borra todas las claves persistidas.
    pub fn reset(&mut self) -> LotoResult<()> {
        self.current.clear();
        self.history.clear();
        self.config = SessionConfig::default();
        self.current_game = self.config.last_game;
        persistence::clear_all(&mut self.store)
    }

    pub fn current(&self) -> &[Combination] {
        &self.current
    }

    pub fn current_game(&self) -> GameKind {
        self.current_game
    }

    pub fn history(&self) -> &BatchStore {
        &self.history
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
