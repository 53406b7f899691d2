//! Puntuación heurística de jugadas y valor de "probabilidad" para mostrar.
//!
//! Ni la puntuación ni la probabilidad mostrada dicen nada sobre las
//! posibilidades reales de ganar: todas las jugadas de un mismo juego tienen
//! exactamente la misma probabilidad. Ambos valores son un adorno de la
//! interfaz.

use std::collections::BTreeSet;

use loterias_db::models::{ColorPair, Combination, GameConfig, GameKind, Play};

const PARITY_POINTS: f64 = 35.0;
const SPREAD_POINTS: f64 = 35.0;
const RUN_POINTS: f64 = 30.0;
const RUN_PENALTY: f64 = 10.0;
const SUPER_NUMBER_BONUS: f64 = 10.0;

const DIVERSITY_POINTS: f64 = 40.0;
const BAND_POINTS: f64 = 40.0;
const PARTIAL_DIVERSITY_BONUS: f64 = 20.0;

/// Porcentaje × 10⁶, para que los valores sean legibles en pantalla.
pub const PROBABILITY_DISPLAY_SCALE: f64 = 100.0 * 1_000_000.0;

pub fn score(play: &Play, config: &GameConfig) -> u8 {
    let raw = match play {
        Play::Baloto {
            numbers,
            super_number,
        } => number_score(numbers, config) + super_number_bonus(numbers, *super_number),
        Play::MiLoto { numbers } => number_score(numbers, config),
        Play::ColorLoto { pairs } => color_score(pairs, config),
    };
    raw.round().clamp(0.0, 100.0) as u8
}

fn number_score(numbers: &[u8], config: &GameConfig) -> f64 {
    if numbers.is_empty() {
        return 0.0;
    }
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();

    parity_points(&sorted) + spread_points(&sorted, config) + run_points(&sorted)
}

fn parity_counts(numbers: &[u8]) -> (usize, usize) {
    let evens = numbers.iter().filter(|&&n| n % 2 == 0).count();
    (evens, numbers.len() - evens)
}

fn parity_points(numbers: &[u8]) -> f64 {
    let (evens, odds) = parity_counts(numbers);
    let imbalance = evens.abs_diff(odds);
    // Con una cantidad impar de números el mejor reparto deja una diferencia de 1
    let best = numbers.len() % 2;
    let worst = numbers.len();
    if worst == best {
        return PARITY_POINTS;
    }
    PARITY_POINTS * (1.0 - (imbalance - best) as f64 / (worst - best) as f64)
}

/// Desviación de los saltos respecto al salto ideal `rango / cantidad`.
fn spread_points(sorted: &[u8], config: &GameConfig) -> f64 {
    if sorted.len() < 2 {
        return SPREAD_POINTS;
    }
    let ideal_gap = config.range_size() as f64 / sorted.len() as f64;
    let gaps: Vec<f64> = sorted.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    let mean_sq = gaps.iter().map(|g| (g - ideal_gap).powi(2)).sum::<f64>() / gaps.len() as f64;
    let normalized = mean_sq.sqrt() / ideal_gap;
    SPREAD_POINTS * (1.0 - normalized).max(0.0)
}

fn run_points(sorted: &[u8]) -> f64 {
    let consecutive = sorted.windows(2).filter(|w| w[1] - w[0] == 1).count();
    (RUN_POINTS - RUN_PENALTY * consecutive as f64).max(0.0)
}

/// Bono de Baloto: Super Balota fuera de la jugada y de paridad contraria a la mayoría.
fn super_number_bonus(numbers: &[u8], super_number: u8) -> f64 {
    if numbers.contains(&super_number) {
        return 0.0;
    }
    let (evens, odds) = parity_counts(numbers);
    let majority_even = match evens.cmp(&odds) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => return 0.0,
    };
    if (super_number % 2 == 0) != majority_even {
        SUPER_NUMBER_BONUS
    } else {
        0.0
    }
}

/// Franja baja 1-3, media 4-5, alta 6-7.
fn band(number: u8) -> usize {
    match number {
        0..=3 => 0,
        4..=5 => 1,
        _ => 2,
    }
}

fn color_score(pairs: &[ColorPair], config: &GameConfig) -> f64 {
    if pairs.is_empty() {
        return 0.0;
    }
    let n = pairs.len();
    let distinct = pairs.iter().map(|p| p.number).collect::<BTreeSet<_>>().len();
    let max_distinct = n.min(config.range_size()).max(1);
    let diversity = DIVERSITY_POINTS * distinct as f64 / max_distinct as f64;

    let mut bands = [0usize; 3];
    for pair in pairs {
        bands[band(pair.number)] += 1;
    }
    let spread = bands.iter().max().unwrap_or(&0) - bands.iter().min().unwrap_or(&0);
    let balance = BAND_POINTS * (1.0 - spread as f64 / n as f64);

    let partial = if distinct > 1 && distinct < n {
        PARTIAL_DIVERSITY_BONUS
    } else {
        0.0
    };

    diversity + balance + partial
}

fn binomial(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    (0..k).fold(1u128, |acc, i| acc * (n - i) as u128 / (i + 1) as u128)
}

fn falling_factorial(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    (0..k).fold(1u128, |acc, i| acc * (n - i) as u128)
}

/// Número exacto de jugadas posibles del juego.
pub fn combination_space(config: &GameConfig) -> u128 {
    match config.game {
        GameKind::Baloto | GameKind::MiLoto => {
            let main = binomial(config.range_size(), config.count_main);
            main * config.super_range_size().unwrap_or(1) as u128
        }
        // Parejas ordenadas y sin repetir
        GameKind::ColorLoto => falling_factorial(config.value_space(), config.count_main),
    }
}

/// Valor de visualización: 1/total escalado e inflado por la puntuación.
pub fn display_probability(score: u8, config: &GameConfig) -> f64 {
    let total = combination_space(config);
    if total == 0 {
        return 0.0;
    }
    let base = 1.0 / total as f64;
    base * PROBABILITY_DISPLAY_SCALE * (1.0 + score as f64 / 100.0)
}

pub fn estimate_probability(combination: &Combination, config: &GameConfig) -> f64 {
    display_probability(combination.score, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loterias_db::models::{Color, BALOTO, COLOR_LOTO, MI_LOTO};

    fn color_play(numbers: [u8; 6]) -> Play {
        let pairs = numbers
            .iter()
            .zip(loterias_db::models::PALETTE.iter())
            .map(|(&number, &color)| ColorPair { color, number })
            .collect();
        Play::ColorLoto { pairs }
    }

    #[test]
    fn test_combination_space() {
        assert_eq!(combination_space(&BALOTO), 15_401_568);
        assert_eq!(combination_space(&MI_LOTO), 575_757);
        assert_eq!(combination_space(&COLOR_LOTO), 3_776_965_920);
    }

    #[test]
    fn test_binomial_edges() {
        assert_eq!(binomial(5, 0), 1);
        assert_eq!(binomial(5, 5), 1);
        assert_eq!(binomial(3, 4), 0);
        assert_eq!(falling_factorial(4, 2), 12);
    }

    #[test]
    fn test_spread_beats_run() {
        let run = Play::MiLoto {
            numbers: vec![1, 2, 3, 4, 5],
        };
        let spread = Play::MiLoto {
            numbers: vec![4, 11, 19, 26, 34],
        };
        let run_score = score(&run, &MI_LOTO);
        let spread_score = score(&spread, &MI_LOTO);
        assert!(spread_score > 90, "spread = {spread_score}");
        assert!(run_score < spread_score, "{run_score} >= {spread_score}");
    }

    #[test]
    fn test_parity_imbalance_penalized() {
        let balanced = Play::MiLoto {
            numbers: vec![4, 11, 19, 26, 34],
        };
        let all_even = Play::MiLoto {
            numbers: vec![4, 12, 20, 26, 34],
        };
        assert!(score(&balanced, &MI_LOTO) > score(&all_even, &MI_LOTO));
    }

    #[test]
    fn test_super_number_bonus() {
        // Mayoría impar: la Super Balota par fuera de la jugada suma el bono
        let numbers = vec![1, 2, 3, 4, 5];
        let with_bonus = Play::Baloto {
            numbers: numbers.clone(),
            super_number: 8,
        };
        let same_parity = Play::Baloto {
            numbers: numbers.clone(),
            super_number: 9,
        };
        let inside = Play::Baloto {
            numbers,
            super_number: 4,
        };
        let base = score(&same_parity, &BALOTO);
        assert_eq!(score(&with_bonus, &BALOTO), base + 10);
        assert_eq!(score(&inside, &BALOTO), base);
    }

    #[test]
    fn test_score_clamped() {
        // Mayoría par y Super Balota impar: 35 + ~31 + 30 + 10 > 100
        let play = Play::Baloto {
            numbers: vec![5, 12, 20, 29, 38],
            super_number: 3,
        };
        assert_eq!(score(&play, &BALOTO), 100);
    }

    #[test]
    fn test_color_scores() {
        assert_eq!(score(&color_play([1, 2, 4, 5, 6, 7]), &COLOR_LOTO), 80);
        assert_eq!(score(&color_play([1, 1, 4, 4, 6, 6]), &COLOR_LOTO), 80);
        assert_eq!(score(&color_play([1, 2, 4, 5, 6, 6]), &COLOR_LOTO), 93);
        assert_eq!(score(&color_play([1, 1, 1, 1, 1, 1]), &COLOR_LOTO), 7);
    }

    #[test]
    fn test_color_repeated_colors_do_not_matter() {
        let pairs = (1..=6)
            .map(|number| ColorPair {
                color: Color::Rojo,
                number,
            })
            .collect();
        let same_color = Play::ColorLoto { pairs };
        assert_eq!(
            score(&same_color, &COLOR_LOTO),
            score(&color_play([1, 2, 3, 4, 5, 6]), &COLOR_LOTO)
        );
    }

    #[test]
    fn test_display_probability_grows_with_score() {
        let low = display_probability(0, &MI_LOTO);
        let high = display_probability(100, &MI_LOTO);
        assert!((high / low - 2.0).abs() < 1e-12);
        let expected = PROBABILITY_DISPLAY_SCALE / 575_757.0;
        assert!((low - expected).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_uses_stored_score() {
        let combination = Combination {
            id: "x".to_string(),
            play: Play::MiLoto {
                numbers: vec![1, 2, 3, 4, 5],
            },
            score: 50,
            probability_display: 0.0,
            selected: false,
        };
        let estimate = estimate_probability(&combination, &MI_LOTO);
        assert!((estimate - display_probability(50, &MI_LOTO)).abs() < 1e-12);
    }
}
