use std::collections::BTreeMap;

use loterias_db::models::{
    Batch, Color, ColorFrequency, Combination, GameFrequency, GameKind, NumberCount, Play,
    Statistics,
};

#[derive(Debug, Clone, Copy)]
pub enum StatsSource<'a> {
    Current(&'a [Combination]),
    History(&'a [Batch]),
}

#[derive(Default)]
struct GameTally {
    combinations: usize,
    numbers: BTreeMap<u8, u32>,
    supers: BTreeMap<u8, u32>,
    colors: BTreeMap<Color, BTreeMap<u8, u32>>,
}

impl GameTally {
    fn add(&mut self, play: &Play) {
        self.combinations += 1;
        match play {
            Play::Baloto {
                numbers,
                super_number,
            } => {
                count_all(&mut self.numbers, numbers);
                *self.supers.entry(*super_number).or_insert(0) += 1;
            }
            Play::MiLoto { numbers } => count_all(&mut self.numbers, numbers),
            Play::ColorLoto { pairs } => {
                for pair in pairs {
                    *self.numbers.entry(pair.number).or_insert(0) += 1;
                    *self
                        .colors
                        .entry(pair.color)
                        .or_default()
                        .entry(pair.number)
                        .or_insert(0) += 1;
                }
            }
        }
    }

    fn into_frequency(self, game: GameKind) -> GameFrequency {
        GameFrequency {
            game,
            combinations: self.combinations,
            most_frequent_number: most_frequent(&self.numbers),
            most_frequent_super_number: most_frequent(&self.supers),
            number_frequency: self.numbers,
            super_number_frequency: self.supers,
            color_frequency: self
                .colors
                .into_iter()
                .map(|(color, number_frequency)| ColorFrequency {
                    color,
                    number_frequency,
                })
                .collect(),
        }
    }
}

fn count_all(table: &mut BTreeMap<u8, u32>, numbers: &[u8]) {
    for &n in numbers {
        *table.entry(n).or_insert(0) += 1;
    }
}

/// Número más frecuente; en caso de empate gana el menor.
pub fn most_frequent(table: &BTreeMap<u8, u32>) -> Option<NumberCount> {
    table
        .iter()
        .fold(None, |best: Option<NumberCount>, (&number, &count)| match best {
            Some(b) if b.count >= count => Some(b),
            _ => Some(NumberCount { number, count }),
        })
}

/// Recalcula las estadísticas completas desde cero.
pub fn recompute(source: StatsSource<'_>) -> Statistics {
    let (combinations, total_batches): (Vec<&Combination>, usize) = match source {
        StatsSource::Current(list) => (list.iter().collect(), 0),
        StatsSource::History(batches) => (
            batches.iter().flat_map(|b| b.combinations.iter()).collect(),
            batches.len(),
        ),
    };

    let mut tallies: BTreeMap<GameKind, GameTally> = BTreeMap::new();
    for combination in &combinations {
        tallies.entry(combination.game()).or_default().add(&combination.play);
    }

    let average_probability = if combinations.is_empty() {
        None
    } else {
        let sum: f64 = combinations.iter().map(|c| c.probability_display).sum();
        Some(sum / combinations.len() as f64)
    };

    Statistics {
        total_generated: combinations.len(),
        total_batches,
        games: tallies
            .into_iter()
            .map(|(game, tally)| tally.into_frequency(game))
            .collect(),
        average_probability,
    }
}

/// Frecuencias de números principales de un juego en el histórico.
pub fn number_frequency(history: &[Batch], game: GameKind) -> BTreeMap<u8, u32> {
    recompute(StatsSource::History(history))
        .for_game(game)
        .map(|g| g.number_frequency.clone())
        .unwrap_or_default()
}
