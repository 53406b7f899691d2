use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum GameKind {
    Baloto,
    MiLoto,
    ColorLoto,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [GameKind::Baloto, GameKind::MiLoto, GameKind::ColorLoto];

    pub fn id(&self) -> &'static str {
        match self {
            GameKind::Baloto => "baloto",
            GameKind::MiLoto => "mi-loto",
            GameKind::ColorLoto => "color-loto",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GameKind::Baloto => "Baloto",
            GameKind::MiLoto => "Mi Loto",
            GameKind::ColorLoto => "Color Loto",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl FromStr for GameKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        GameKind::ALL
            .into_iter()
            .find(|g| g.id() == s.trim())
            .ok_or_else(|| anyhow!("Juego desconocido: '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Amarillo,
    Azul,
    Rojo,
    Verde,
    Blanco,
    Negro,
}

/// Paleta de Color Loto, en el orden oficial del tiquete.
pub const PALETTE: [Color; 6] = [
    Color::Amarillo,
    Color::Azul,
    Color::Rojo,
    Color::Verde,
    Color::Blanco,
    Color::Negro,
];

impl Color {
    pub fn name(&self) -> &'static str {
        match self {
            Color::Amarillo => "amarillo",
            Color::Azul => "azul",
            Color::Rojo => "rojo",
            Color::Verde => "verde",
            Color::Blanco => "blanco",
            Color::Negro => "negro",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Color::Amarillo => "🟡",
            Color::Azul => "🔵",
            Color::Rojo => "🔴",
            Color::Verde => "🟢",
            Color::Blanco => "⚪",
            Color::Negro => "⚫",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Pareja (color, número) de Color Loto. El orden derivado es (paleta, número).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColorPair {
    pub color: Color,
    pub number: u8,
}

/// Reglas fijas de un juego.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub game: GameKind,
    pub count_main: usize,
    pub number_range: (u8, u8),
    pub super_number_range: Option<(u8, u8)>,
    pub colors: &'static [Color],
}

pub const BALOTO: GameConfig = GameConfig {
    game: GameKind::Baloto,
    count_main: 5,
    number_range: (1, 43),
    super_number_range: Some((1, 16)),
    colors: &[],
};

pub const MI_LOTO: GameConfig = GameConfig {
    game: GameKind::MiLoto,
    count_main: 5,
    number_range: (1, 39),
    super_number_range: None,
    colors: &[],
};

pub const COLOR_LOTO: GameConfig = GameConfig {
    game: GameKind::ColorLoto,
    count_main: 6,
    number_range: (1, 7),
    super_number_range: None,
    colors: &PALETTE,
};

impl GameConfig {
    pub fn for_game(game: GameKind) -> &'static GameConfig {
        match game {
            GameKind::Baloto => &BALOTO,
            GameKind::MiLoto => &MI_LOTO,
            GameKind::ColorLoto => &COLOR_LOTO,
        }
    }

    pub fn has_super_number(&self) -> bool {
        self.super_number_range.is_some()
    }

    pub fn range_size(&self) -> usize {
        range_len(self.number_range)
    }

    pub fn super_range_size(&self) -> Option<usize> {
        self.super_number_range.map(range_len)
    }

    /// Cantidad de valores distintos que puede tomar una posición principal.
    pub fn value_space(&self) -> usize {
        match self.game {
            GameKind::Baloto | GameKind::MiLoto => self.range_size(),
            GameKind::ColorLoto => {
                let distinct: HashSet<&Color> = self.colors.iter().collect();
                distinct.len() * self.range_size()
            }
        }
    }

    pub fn check(&self) -> Result<()> {
        let (min, max) = self.number_range;
        if min == 0 || min > max {
            bail!("Rango de números inválido: {}-{}", min, max);
        }
        if let Some((smin, smax)) = self.super_number_range {
            if smin == 0 || smin > smax {
                bail!("Rango de Super Balota inválido: {}-{}", smin, smax);
            }
        }
        match self.game {
            GameKind::Baloto if !self.has_super_number() => {
                bail!("Baloto requiere un rango de Super Balota");
            }
            GameKind::MiLoto if self.has_super_number() => {
                bail!("Mi Loto no lleva Super Balota");
            }
            GameKind::ColorLoto if self.colors.is_empty() => {
                bail!("Color Loto requiere al menos un color");
            }
            _ => {}
        }
        let mut seen = HashSet::new();
        if let Some(color) = self.colors.iter().find(|c| !seen.insert(*c)) {
            bail!("Color repetido en la paleta: {}", color);
        }
        if self.count_main == 0 {
            bail!("Se debe pedir al menos un valor");
        }
        let space = self.value_space();
        if self.count_main > space {
            bail!(
                "Se piden {} valores únicos pero solo existen {} para {}",
                self.count_main,
                space,
                self.game.name()
            );
        }
        Ok(())
    }
}

fn range_len((min, max): (u8, u8)) -> usize {
    if min > max {
        0
    } else {
        (max - min) as usize + 1
    }
}

/// Jugada concreta, etiquetada por juego.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Play {
    Baloto { numbers: Vec<u8>, super_number: u8 },
    MiLoto { numbers: Vec<u8> },
    ColorLoto { pairs: Vec<ColorPair> },
}

impl Play {
    pub fn game(&self) -> GameKind {
        match self {
            Play::Baloto { .. } => GameKind::Baloto,
            Play::MiLoto { .. } => GameKind::MiLoto,
            Play::ColorLoto { .. } => GameKind::ColorLoto,
        }
    }

    /// Números principales (o números de cada pareja en Color Loto).
    pub fn main_numbers(&self) -> Vec<u8> {
        match self {
            Play::Baloto { numbers, .. } | Play::MiLoto { numbers } => numbers.clone(),
            Play::ColorLoto { pairs } => pairs.iter().map(|p| p.number).collect(),
        }
    }

    pub fn super_number(&self) -> Option<u8> {
        match self {
            Play::Baloto { super_number, .. } => Some(*super_number),
            Play::MiLoto { .. } | Play::ColorLoto { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Combination {
    pub id: String,
    #[serde(flatten)]
    pub play: Play,
    pub score: u8,
    /// Valor cosmético de visualización, no una probabilidad real de ganar.
    pub probability_display: f64,
    #[serde(default)]
    pub selected: bool,
}

impl Combination {
    pub fn game(&self) -> GameKind {
        self.play.game()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub game: GameKind,
    pub combinations: Vec<Combination>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberCount {
    pub number: u8,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorFrequency {
    pub color: Color,
    pub number_frequency: BTreeMap<u8, u32>,
}

/// Tabla de frecuencias de un solo juego.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFrequency {
    pub game: GameKind,
    pub combinations: usize,
    pub number_frequency: BTreeMap<u8, u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub super_number_frequency: BTreeMap<u8, u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub color_frequency: Vec<ColorFrequency>,
    pub most_frequent_number: Option<NumberCount>,
    #[serde(default)]
    pub most_frequent_super_number: Option<NumberCount>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_generated: usize,
    pub total_batches: usize,
    pub games: Vec<GameFrequency>,
    pub average_probability: Option<f64>,
}

impl Statistics {
    pub fn for_game(&self, game: GameKind) -> Option<&GameFrequency> {
        self.games.iter().find(|g| g.game == game)
    }
}

pub fn validate_play(play: &Play, config: &GameConfig) -> Result<()> {
    if play.game() != config.game {
        bail!(
            "Jugada de {} validada con las reglas de {}",
            play.game().name(),
            config.game.name()
        );
    }
    let (min, max) = config.number_range;
    match play {
        Play::Baloto { numbers, .. } | Play::MiLoto { numbers } => {
            if numbers.len() != config.count_main {
                bail!(
                    "Se esperaban {} números, se recibieron {}",
                    config.count_main,
                    numbers.len()
                );
            }
            for &n in numbers {
                if n < min || n > max {
                    bail!("Número {} fuera de rango ({}-{})", n, min, max);
                }
            }
            for w in numbers.windows(2) {
                if w[0] == w[1] {
                    bail!("Número en doble: {}", w[0]);
                }
                if w[0] > w[1] {
                    bail!("Números no ordenados: {} antes de {}", w[0], w[1]);
                }
            }
            match (play.super_number(), config.super_number_range) {
                (Some(s), Some((smin, smax))) if s < smin || s > smax => {
                    bail!("Super Balota {} fuera de rango ({}-{})", s, smin, smax);
                }
                (Some(_), None) => bail!("{} no lleva Super Balota", config.game.name()),
                _ => {}
            }
        }
        Play::ColorLoto { pairs } => {
            if pairs.len() != config.count_main {
                bail!(
                    "Se esperaban {} parejas, se recibieron {}",
                    config.count_main,
                    pairs.len()
                );
            }
            let mut seen = HashSet::with_capacity(pairs.len());
            for pair in pairs {
                if !config.colors.contains(&pair.color) {
                    bail!("Color {} no permitido", pair.color);
                }
                if pair.number < min || pair.number > max {
                    bail!("Número {} fuera de rango ({}-{})", pair.number, min, max);
                }
                if !seen.insert(*pair) {
                    bail!("Pareja en doble: {} {}", pair.color, pair.number);
                }
            }
        }
    }
    Ok(())
}
