mod display;
mod interactive;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use loterias_db::config::{load_settings, Settings, Theme};
use loterias_db::db::{db_path, SqliteStore};
use loterias_db::models::GameKind;
use loterias_engine::generator::validate_count;
use loterias_engine::transfer;
use loterias_engine::{Session, StatsScope};

use crate::display::{
    display_combinations, display_config, display_history, display_import_report,
    display_load_warnings, display_stats,
};

pub type AppSession = Session<SqliteStore>;

#[derive(Parser)]
#[command(name = "loterias", about = "Generador de combinaciones para Baloto, Mi Loto y Color Loto")]
struct Cli {
    /// Ruta de la base de datos (por defecto ./data/loterias.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Archivo JSON de ajustes
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Seed para la reproducibilidad
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generar combinaciones
    Generate {
        /// Juego (por defecto el último usado)
        #[arg(short, long)]
        game: Option<GameKind>,

        /// Número de combinaciones
        #[arg(short, long, allow_negative_numbers = true)]
        count: Option<i64>,

        /// Favorecer los números más frecuentes del histórico
        #[arg(long)]
        hot: bool,

        /// Eliminar combinaciones repetidas
        #[arg(long)]
        dedupe: bool,

        /// Marcar las mejores combinaciones
        #[arg(long)]
        best: bool,

        /// Guardar el lote en el histórico
        #[arg(short, long)]
        save: bool,

        /// Sin animación de espera
        #[arg(long)]
        no_delay: bool,
    },

    /// Mostrar los últimos lotes guardados
    History {
        /// Número de lotes a mostrar
        #[arg(short, long, default_value = "10")]
        last: usize,
    },

    /// Estadísticas del histórico
    Stats {
        /// Limitar a un juego
        #[arg(short, long)]
        game: Option<GameKind>,
    },

    /// Exportar el histórico a JSON
    Export {
        /// Archivo de salida (por defecto historico_combinaciones_AAAA-MM-DD.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Importar lotes desde un archivo JSON exportado
    Import {
        /// Archivo a importar
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Borrar todo el histórico
    ClearHistory {
        /// No pedir confirmación
        #[arg(short, long)]
        yes: bool,
    },

    /// Ver o cambiar la configuración de la sesión
    Config {
        #[arg(long)]
        theme: Option<Theme>,

        #[arg(long)]
        game: Option<GameKind>,
    },

    /// Mostrar la ruta de la base de datos
    DbPath,

    /// Modo interactivo
    Interactive,
}

pub struct GenerateOptions {
    pub game: Option<GameKind>,
    pub count: Option<i64>,
    pub hot: bool,
    pub dedupe: bool,
    pub best: bool,
    pub save: bool,
    pub no_delay: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let path = cli.db.clone().unwrap_or_else(db_path);

    if let Command::DbPath = cli.command {
        println!("{}", path.display());
        return Ok(());
    }

    let settings = match &cli.settings {
        Some(file) => load_settings(file)?,
        None => Settings::default(),
    };
    let store = SqliteStore::open(&path)?.with_quota(settings.storage_quota_bytes);
    debug!(path = %path.display(), "sesión abierta");
    let (mut session, warnings) = Session::open(store, settings, cli.seed);
    display_load_warnings(&warnings);

    match cli.command {
        Command::Generate {
            game,
            count,
            hot,
            dedupe,
            best,
            save,
            no_delay,
        } => {
            let opts = GenerateOptions {
                game,
                count,
                hot,
                dedupe,
                best,
                save,
                no_delay,
            };
            cmd_generate(&mut session, &opts)
        }
        Command::History { last } => cmd_history(&session, last),
        Command::Stats { game } => cmd_stats(&session, game),
        Command::Export { output } => cmd_export(&session, output.as_deref()),
        Command::Import { file } => cmd_import(&mut session, &file),
        Command::ClearHistory { yes } => cmd_clear_history(&mut session, yes),
        Command::Config { theme, game } => cmd_config(&mut session, theme, game),
        Command::DbPath => Ok(()),
        Command::Interactive => interactive::run_interactive(&mut session),
    }
}

/// Persiste el estado; un fallo solo se informa.
pub fn persist_or_warn(session: &mut AppSession) {
    if let Err(e) = session.persist() {
        eprintln!("Aviso: no se guardaron los cambios ({e})");
    }
}

fn wait_with_spinner(delay_ms: u64, game: GameKind) -> Result<()> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Plantilla de progreso inválida")?,
    );
    pb.set_message(format!("Generando combinaciones de {}...", game.name()));
    pb.enable_steady_tick(Duration::from_millis(80));
    std::thread::sleep(Duration::from_millis(delay_ms));
    pb.finish_and_clear();
    Ok(())
}

pub fn cmd_generate(session: &mut AppSession, opts: &GenerateOptions) -> Result<()> {
    let game = opts.game.unwrap_or(session.config().last_game);
    let count = opts
        .count
        .unwrap_or(session.settings().default_count as i64);
    validate_count(count, session.settings().max_combinations)?;

    let delay = session.settings().generation_delay_ms;
    if !opts.no_delay && delay > 0 {
        wait_with_spinner(delay, game)?;
    }

    if opts.hot {
        session.generate_hot(game, count)?;
    } else {
        session.generate(game, count)?;
    }

    if opts.dedupe {
        let removed = session.dedupe_current();
        if removed > 0 {
            println!("{} combinación(es) repetida(s) eliminada(s).", removed);
        }
    }
    if opts.best {
        session.select_best();
    }

    display_combinations(session.current(), session.config().theme);

    if opts.save {
        let batch = session.save_current()?;
        println!(
            "Lote guardado en el histórico ({} combinaciones).",
            batch.combinations.len()
        );
    }
    persist_or_warn(session);
    Ok(())
}

pub fn cmd_history(session: &AppSession, last: usize) -> Result<()> {
    if session.history().is_empty() {
        println!("Histórico vacío. Genere y guarde primero: loterias generate --save");
        return Ok(());
    }
    let batches: Vec<_> = session.history().latest(last).collect();
    display_history(&batches, session.config().theme);
    Ok(())
}

pub fn cmd_stats(session: &AppSession, game: Option<GameKind>) -> Result<()> {
    let stats = session.statistics(StatsScope::History);
    if stats.total_generated == 0 {
        println!("Histórico vacío, no hay estadísticas.");
        return Ok(());
    }
    display_stats(&stats, game);
    Ok(())
}

pub fn cmd_export(session: &AppSession, output: Option<&Path>) -> Result<()> {
    let file = session.export()?;
    let json = transfer::to_json(&file)?;
    let path = match output {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(transfer::export_file_name(Utc::now())),
    };
    std::fs::write(&path, json).with_context(|| format!("No se pudo escribir {:?}", path))?;
    println!("{} lotes exportados a {}", file.batch_count, path.display());
    Ok(())
}

pub fn cmd_import(session: &mut AppSession, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("No se pudo leer {:?}", file))?;
    let report = session.import(&json)?;
    display_import_report(&report);
    persist_or_warn(session);
    Ok(())
}

pub fn cmd_clear_history(session: &mut AppSession, yes: bool) -> Result<()> {
    if session.history().is_empty() {
        println!("El histórico ya está vacío.");
        return Ok(());
    }
    if !yes {
        let confirm = prompt(&format!(
            "¿Borrar {} lotes del histórico? (s/n): ",
            session.history().len()
        ))?;
        if confirm.to_lowercase() != "s" {
            println!("Operación cancelada.");
            return Ok(());
        }
    }
    let removed = session.clear_history();
    println!("{} lotes eliminados.", removed);
    persist_or_warn(session);
    Ok(())
}

pub fn cmd_config(
    session: &mut AppSession,
    theme: Option<Theme>,
    game: Option<GameKind>,
) -> Result<()> {
    if let Some(theme) = theme {
        session.set_theme(theme);
    }
    if let Some(game) = game {
        session.set_last_game(game);
    }
    if theme.is_some() || game.is_some() {
        persist_or_warn(session);
    }
    display_config(session.config(), session.settings());
    Ok(())
}

pub fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    let read = io::stdin()
        .read_line(&mut input)
        .context("Error de lectura")?;
    if read == 0 {
        anyhow::bail!("Fin de la entrada");
    }
    Ok(input.trim().to_string())
}
