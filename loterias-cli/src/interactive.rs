use std::path::PathBuf;

use anyhow::{Context, Result};

use loterias_db::config::Theme;
use loterias_db::models::GameKind;
use loterias_engine::StatsScope;

use crate::display::{display_combinations, display_stats};
use crate::{persist_or_warn, prompt, AppSession, GenerateOptions};

#[derive(Debug, PartialEq)]
enum InteractiveCommand {
    Generate,
    Best,
    Toggle,
    SelectAll,
    DeleteSelected,
    Dedupe,
    Save,
    ClearCurrent,
    History,
    Stats,
    Export,
    Import,
    Theme,
    Reset,
    Quit,
}

fn parse_command(input: &str) -> Option<InteractiveCommand> {
    match input.trim().to_lowercase().as_str() {
        "1" | "generar" | "gen" => Some(InteractiveCommand::Generate),
        "2" | "mejores" | "best" => Some(InteractiveCommand::Best),
        "3" | "marcar" | "toggle" => Some(InteractiveCommand::Toggle),
        "4" | "todas" | "all" => Some(InteractiveCommand::SelectAll),
        "5" | "borrar" | "eliminar" => Some(InteractiveCommand::DeleteSelected),
        "6" | "repetidas" | "dedupe" => Some(InteractiveCommand::Dedupe),
        "7" | "guardar" | "save" => Some(InteractiveCommand::Save),
        "8" | "limpiar" | "clear" => Some(InteractiveCommand::ClearCurrent),
        "9" | "historico" | "histórico" | "hist" => Some(InteractiveCommand::History),
        "10" | "estadisticas" | "estadísticas" | "stats" => Some(InteractiveCommand::Stats),
        "11" | "exportar" | "export" => Some(InteractiveCommand::Export),
        "12" | "importar" | "import" => Some(InteractiveCommand::Import),
        "13" | "tema" | "theme" => Some(InteractiveCommand::Theme),
        "14" | "reiniciar" | "reset" => Some(InteractiveCommand::Reset),
        "0" | "salir" | "quit" | "q" | "exit" => Some(InteractiveCommand::Quit),
        _ => None,
    }
}

fn display_menu(session: &AppSession) {
    println!();
    println!(
        "── Modo interactivo ({}, {} en pantalla) ──",
        session.current_game().name(),
        session.current().len()
    );
    println!("   1. generar       Generar combinaciones");
    println!("   2. mejores       Marcar las mejores");
    println!("   3. marcar        Marcar / desmarcar una combinación");
    println!("   4. todas         Marcar o desmarcar todas");
    println!("   5. borrar        Eliminar las marcadas");
    println!("   6. repetidas     Eliminar repetidas");
    println!("   7. guardar       Guardar en el histórico");
    println!("   8. limpiar       Limpiar la lista actual");
    println!("   9. historico     Últimos lotes");
    println!("  10. estadisticas  Estadísticas");
    println!("  11. exportar      Exportar el histórico");
    println!("  12. importar      Importar un archivo");
    println!("  13. tema          Cambiar el tema");
    println!("  14. reiniciar     Borrar todos los datos");
    println!("   0. salir         Salir");
    println!();
}

fn prompt_with_default(msg: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", msg, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

fn parse_game(input: &str) -> Option<GameKind> {
    match input.trim().to_lowercase().as_str() {
        "1" | "baloto" => Some(GameKind::Baloto),
        "2" | "mi-loto" | "miloto" | "mi loto" => Some(GameKind::MiLoto),
        "3" | "color-loto" | "colorloto" | "color loto" => Some(GameKind::ColorLoto),
        _ => None,
    }
}

fn show_current(session: &AppSession) {
    display_combinations(session.current(), session.config().theme);
}

fn cmd_generate_interactive(session: &mut AppSession) -> Result<()> {
    let default_game = session.config().last_game;
    let input = prompt_with_default("Juego (1 Baloto, 2 Mi Loto, 3 Color Loto)", default_game.id())?;
    let game = parse_game(&input).with_context(|| format!("Juego desconocido: '{}'", input))?;

    let default_count = session.settings().default_count.to_string();
    let count_str = prompt_with_default("Número de combinaciones", &default_count)?;
    let count: i64 = count_str.parse().context("Número inválido")?;

    let hot = prompt_with_default("¿Favorecer números frecuentes? (s/n)", "n")?;
    let opts = GenerateOptions {
        game: Some(game),
        count: Some(count),
        hot: hot.to_lowercase() == "s",
        dedupe: false,
        best: false,
        save: false,
        no_delay: false,
    };
    crate::cmd_generate(session, &opts)
}

fn cmd_toggle_interactive(session: &mut AppSession) -> Result<()> {
    let input = prompt("Número de la combinación: ")?;
    let index: usize = input.parse().context("Número inválido")?;
    match index.checked_sub(1).and_then(|i| session.toggle(i)) {
        Some(true) => println!("Combinación {} marcada.", index),
        Some(false) => println!("Combinación {} desmarcada.", index),
        None => println!("No existe la combinación {}.", index),
    }
    Ok(())
}

fn cmd_save_interactive(session: &mut AppSession) -> Result<()> {
    let batch = session.save_current()?;
    println!(
        "Lote de {} guardado ({} combinaciones).",
        batch.game.name(),
        batch.combinations.len()
    );
    persist_or_warn(session);
    Ok(())
}

fn cmd_stats_interactive(session: &AppSession) -> Result<()> {
    let scope = prompt_with_default("Estadísticas de (1 histórico, 2 lista actual)", "1")?;
    let stats = match scope.as_str() {
        "2" => session.statistics(StatsScope::Current),
        _ => session.statistics(StatsScope::History),
    };
    if stats.total_generated == 0 {
        println!("No hay combinaciones para analizar.");
        return Ok(());
    }
    display_stats(&stats, None);
    Ok(())
}

fn cmd_export_interactive(session: &AppSession) -> Result<()> {
    let default = loterias_engine::transfer::export_file_name(chrono::Utc::now());
    let output = prompt_with_default("Archivo de salida", &default)?;
    crate::cmd_export(session, Some(&PathBuf::from(output)))
}

fn cmd_import_interactive(session: &mut AppSession) -> Result<()> {
    let input = prompt("Archivo a importar: ")?;
    crate::cmd_import(session, &PathBuf::from(input))
}

fn cmd_theme_interactive(session: &mut AppSession) -> Result<()> {
    let theme = match session.config().theme {
        Theme::Light => Theme::Dark,
        Theme::Dark => Theme::Light,
    };
    session.set_theme(theme);
    persist_or_warn(session);
    match theme {
        Theme::Light => println!("Tema claro activado."),
        Theme::Dark => println!("Tema oscuro activado."),
    }
    Ok(())
}

fn cmd_reset_interactive(session: &mut AppSession) -> Result<()> {
    let confirm = prompt("¿Borrar histórico, estadísticas y configuración? (s/n): ")?;
    if confirm.to_lowercase() == "s" {
        session.reset()?;
        println!("Datos borrados.");
    } else {
        println!("Operación cancelada.");
    }
    Ok(())
}

fn run_command(session: &mut AppSession, command: InteractiveCommand) -> Result<()> {
    match command {
        InteractiveCommand::Generate => cmd_generate_interactive(session),
        InteractiveCommand::Best => {
            let n = session.select_best();
            println!("{} combinaciones marcadas como mejores.", n);
            show_current(session);
            Ok(())
        }
        InteractiveCommand::Toggle => cmd_toggle_interactive(session),
        InteractiveCommand::SelectAll => {
            let all = session.current().iter().all(|c| c.selected);
            session.set_all_selected(!all);
            show_current(session);
            Ok(())
        }
        InteractiveCommand::DeleteSelected => {
            let n = session.delete_selected();
            println!("{} combinaciones eliminadas.", n);
            Ok(())
        }
        InteractiveCommand::Dedupe => {
            let n = session.dedupe_current();
            println!("{} combinaciones repetidas eliminadas.", n);
            Ok(())
        }
        InteractiveCommand::Save => cmd_save_interactive(session),
        InteractiveCommand::ClearCurrent => {
            let n = session.clear_current();
            println!("{} combinaciones descartadas.", n);
            Ok(())
        }
        InteractiveCommand::History => {
            let n_str = prompt_with_default("Número de lotes", "5")?;
            let n: usize = n_str.parse().context("Número inválido")?;
            crate::cmd_history(session, n)
        }
        InteractiveCommand::Stats => cmd_stats_interactive(session),
        InteractiveCommand::Export => cmd_export_interactive(session),
        InteractiveCommand::Import => cmd_import_interactive(session),
        InteractiveCommand::Theme => cmd_theme_interactive(session),
        InteractiveCommand::Reset => cmd_reset_interactive(session),
        InteractiveCommand::Quit => Ok(()),
    }
}

pub fn run_interactive(session: &mut AppSession) -> Result<()> {
    println!("¡Bienvenido al generador de combinaciones!");

    loop {
        display_menu(session);
        let input = match prompt("> ") {
            Ok(s) => s,
            Err(_) => break, // EOF / Ctrl+D
        };

        if input.is_empty() {
            continue;
        }

        match parse_command(&input) {
            Some(InteractiveCommand::Quit) => {
                println!("¡Hasta luego!");
                break;
            }
            Some(command) => {
                if let Err(e) = run_command(session, command) {
                    println!("Error: {e:#}");
                }
            }
            None => {
                println!("Comando desconocido: '{}'. Escriba un número (0-14) o un nombre de comando.", input);
            }
        }
    }

    persist_or_warn(session);
    Ok(())
}
