use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use loterias_db::config::{SessionConfig, Settings, Theme};
use loterias_db::models::{Batch, Combination, GameFrequency, GameKind, Play, Statistics};
use loterias_engine::persistence::LoadWarning;
use loterias_engine::transfer::ImportReport;

struct Palette {
    numbers: Color,
    best: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            numbers: Color::Blue,
            best: Color::DarkGreen,
        },
        Theme::Dark => Palette {
            numbers: Color::Cyan,
            best: Color::Yellow,
        },
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

/// Texto de los números principales y de la columna extra (Super Balota o vacío).
pub fn format_play(play: &Play) -> (String, String) {
    match play {
        Play::Baloto {
            numbers,
            super_number,
        } => (join_numbers(numbers), format!("{:2}", super_number)),
        Play::MiLoto { numbers } => (join_numbers(numbers), "—".to_string()),
        Play::ColorLoto { pairs } => {
            let text = pairs
                .iter()
                .map(|p| format!("{} {}", p.color.emoji(), p.number))
                .collect::<Vec<_>>()
                .join("  ");
            (text, "—".to_string())
        }
    }
}

fn extra_header(game: GameKind) -> &'static str {
    match game {
        GameKind::Baloto => "Super Balota",
        GameKind::MiLoto | GameKind::ColorLoto => "Extra",
    }
}

pub fn display_combinations(combinations: &[Combination], theme: Theme) {
    let Some(first) = combinations.first() else {
        println!("No hay combinaciones para mostrar.");
        return;
    };
    let colors = palette(theme);
    let game = first.game();

    println!("\n🎲 {}: {} combinaciones\n", game.name(), combinations.len());
    let mut table = new_table(vec![
        "#",
        "Números",
        extra_header(game),
        "Puntuación",
        "Valor visual*",
        "Mejor",
    ]);

    for (i, c) in combinations.iter().enumerate() {
        let (numbers, extra) = format_play(&c.play);
        let mark = if c.selected {
            Cell::new("★").fg(colors.best)
        } else {
            Cell::new("")
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(numbers).fg(colors.numbers),
            Cell::new(extra),
            Cell::new(c.score),
            Cell::new(format!("{:.4}", c.probability_display)),
            mark,
        ]);
    }
    println!("{table}");
    println!("* Valor de visualización, no es la probabilidad real de ganar.");
}

pub fn display_history(batches: &[&Batch], theme: Theme) {
    let colors = palette(theme);
    for batch in batches {
        println!(
            "\n📅 {}  {}  ({} combinaciones)",
            batch.timestamp.format("%Y-%m-%d %H:%M"),
            batch.game.name(),
            batch.combinations.len()
        );
        let mut table = new_table(vec!["#", "Números", extra_header(batch.game), "Puntuación"]);
        for (i, c) in batch.combinations.iter().enumerate() {
            let (numbers, extra) = format_play(&c.play);
            table.add_row(vec![
                Cell::new(i + 1),
                Cell::new(numbers).fg(colors.numbers),
                Cell::new(extra),
                Cell::new(c.score),
            ]);
        }
        println!("{table}");
    }
}

fn frequency_table(title: &str, frequency: &std::collections::BTreeMap<u8, u32>) {
    println!("── {} ──", title);
    let mut table = new_table(vec!["Número", "Frecuencia"]);
    let mut sorted: Vec<(&u8, &u32)> = frequency.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
    for (number, count) in sorted {
        table.add_row(vec![format!("{:2}", number), count.to_string()]);
    }
    println!("{table}");
}

fn display_game_frequency(freq: &GameFrequency) {
    println!("\n📊 {} ({} combinaciones)\n", freq.game.name(), freq.combinations);
    if let Some(top) = freq.most_frequent_number {
        println!("  Número más frecuente: {} ({} veces)", top.number, top.count);
    }
    if let Some(top) = freq.most_frequent_super_number {
        println!("  Super Balota más frecuente: {} ({} veces)", top.number, top.count);
    }
    frequency_table("Números", &freq.number_frequency);
    if !freq.super_number_frequency.is_empty() {
        frequency_table("Super Balota", &freq.super_number_frequency);
    }
    if !freq.color_frequency.is_empty() {
        println!("── Colores ──");
        let mut table = new_table(vec!["Color", "Apariciones", "Números"]);
        for color in &freq.color_frequency {
            let total: u32 = color.number_frequency.values().sum();
            let numbers = color
                .number_frequency
                .iter()
                .map(|(n, c)| format!("{}×{}", n, c))
                .collect::<Vec<_>>()
                .join(" ");
            table.add_row(vec![
                format!("{} {}", color.color.emoji(), color.color.name()),
                total.to_string(),
                numbers,
            ]);
        }
        println!("{table}");
    }
}

pub fn display_stats(stats: &Statistics, game: Option<GameKind>) {
    println!("Total de combinaciones: {}", stats.total_generated);
    println!("Lotes guardados:        {}", stats.total_batches);
    if let Some(avg) = stats.average_probability {
        println!("Valor visual promedio:  {:.4}", avg);
    }

    let games: Vec<&GameFrequency> = match game {
        Some(g) => stats.for_game(g).into_iter().collect(),
        None => stats.games.iter().collect(),
    };
    if games.is_empty() {
        println!("\nSin combinaciones guardadas para este juego.");
    }
    for freq in games {
        display_game_frequency(freq);
    }
}

pub fn display_import_report(report: &ImportReport) {
    println!("Importación terminada:");
    println!("  Lotes importados:  {}", report.imported);
    println!("  Lotes descartados: {}", report.skipped.len());
    if report.evicted > 0 {
        println!("  Lotes antiguos eliminados por el límite: {}", report.evicted);
    }
    for skipped in &report.skipped {
        println!("    - lote {}: {}", skipped.index + 1, skipped.reason);
    }
}

pub fn display_load_warnings(warnings: &[LoadWarning]) {
    for warning in warnings {
        eprintln!("Aviso: {}", warning);
    }
}

pub fn display_config(config: &SessionConfig, settings: &Settings) {
    let theme = match config.theme {
        Theme::Light => "claro",
        Theme::Dark => "oscuro",
    };
    let mut table = new_table(vec!["Ajuste", "Valor"]);
    table.add_row(vec!["Tema".to_string(), theme.to_string()]);
    table.add_row(vec!["Último juego".to_string(), config.last_game.name().to_string()]);
    table.add_row(vec![
        "Máx. combinaciones".to_string(),
        settings.max_combinations.to_string(),
    ]);
    table.add_row(vec!["Cantidad por defecto".to_string(), settings.default_count.to_string()]);
    table.add_row(vec!["Máx. lotes en histórico".to_string(), settings.max_history.to_string()]);
    table.add_row(vec!["Lotes en copia automática".to_string(), settings.backup_batches.to_string()]);
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use loterias_db::models::{Color as Ball, ColorPair};

    #[test]
    fn test_format_baloto() {
        let play = Play::Baloto {
            numbers: vec![3, 11, 20, 28, 41],
            super_number: 7,
        };
        assert_eq!(
            format_play(&play),
            (" 3 - 11 - 20 - 28 - 41".to_string(), " 7".to_string())
        );
    }

    #[test]
    fn test_format_color_pairs() {
        let play = Play::ColorLoto {
            pairs: vec![
                ColorPair {
                    color: Ball::Rojo,
                    number: 4,
                },
                ColorPair {
                    color: Ball::Azul,
                    number: 1,
                },
            ],
        };
        let (text, extra) = format_play(&play);
        assert_eq!(text, "🔴 4  🔵 1");
        assert_eq!(extra, "—");
    }
}
