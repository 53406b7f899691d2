use std::collections::{BTreeMap, BTreeSet, HashSet};

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use loterias_db::models::{ColorPair, Combination, GameConfig, GameKind, Play};

use crate::error::{LotoError, LotoResult};
use crate::scoring;

/// Sorteos aleatorios permitidos antes de completar desde los valores restantes.
const MAX_RANDOM_DRAWS: usize = 1_000;

/// Parejas repetidas seguidas antes de pasar al relleno determinista.
pub const MAX_STALLED_DRAWS: usize = 64;

/// Tamaño del grupo de números calientes, en múltiplos de `count_main`.
const HOT_POOL_FACTOR: usize = 2;

#[derive(Debug, Clone, Copy)]
pub enum DrawStrategy<'a> {
    Uniform,
    /// Sesgo hacia los números más frecuentes del histórico.
    Hot(&'a BTreeMap<u8, u32>),
}

pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Valida la cantidad pedida antes de cualquier sorteo.
pub fn validate_count(requested: i64, max: usize) -> LotoResult<usize> {
    if requested < 1 || requested as u64 > max as u64 {
        return Err(LotoError::InvalidCount { requested, max });
    }
    Ok(requested as usize)
}

fn check_config(config: &GameConfig) -> LotoResult<()> {
    config
        .check()
        .map_err(|e| LotoError::InvalidConfiguration(e.to_string()))
}

pub fn generate<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> LotoResult<Combination> {
    generate_with(config, DrawStrategy::Uniform, rng)
}

pub fn generate_hot<R: Rng + ?Sized>(
    config: &GameConfig,
    frequency: &BTreeMap<u8, u32>,
    rng: &mut R,
) -> LotoResult<Combination> {
    generate_with(config, DrawStrategy::Hot(frequency), rng)
}

pub fn generate_with<R: Rng + ?Sized>(
    config: &GameConfig,
    strategy: DrawStrategy<'_>,
    rng: &mut R,
) -> LotoResult<Combination> {
    check_config(config)?;
    let play = draw_play(config, strategy, rng)?;
    Ok(build_combination(play, config, rng))
}

pub fn generate_many<R: Rng + ?Sized>(
    config: &GameConfig,
    count: i64,
    max: usize,
    strategy: DrawStrategy<'_>,
    rng: &mut R,
) -> LotoResult<Vec<Combination>> {
    let count = validate_count(count, max)?;
    check_config(config)?;

    let mut combinations = Vec::with_capacity(count);
    for _ in 0..count {
        let play = draw_play(config, strategy, rng)?;
        combinations.push(build_combination(play, config, rng));
    }
    debug!(game = %config.game, count, "combinaciones generadas");
    Ok(combinations)
}

fn build_combination<R: Rng + ?Sized>(play: Play, config: &GameConfig, rng: &mut R) -> Combination {
    let score = scoring::score(&play, config);
    Combination {
        id: new_id(rng),
        play,
        score,
        probability_display: scoring::display_probability(score, config),
        selected: false,
    }
}

fn new_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let bytes: [u8; 16] = rng.random();
    uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
}

fn draw_play<R: Rng + ?Sized>(
    config: &GameConfig,
    strategy: DrawStrategy<'_>,
    rng: &mut R,
) -> LotoResult<Play> {
    let main_numbers = |rng: &mut R| match strategy {
        DrawStrategy::Uniform => draw_unique_numbers(rng, config.count_main, config.number_range),
        DrawStrategy::Hot(frequency) => draw_hot_numbers(rng, config, frequency),
    };

    let play = match config.game {
        GameKind::Baloto => {
            let (smin, smax) = config.super_number_range.ok_or_else(|| {
                LotoError::InvalidConfiguration("Baloto sin rango de Super Balota".to_string())
            })?;
            let numbers = main_numbers(rng);
            // Sin exclusión cruzada: puede coincidir con un número principal
            let super_number = rng.random_range(smin..=smax);
            Play::Baloto {
                numbers,
                super_number,
            }
        }
        GameKind::MiLoto => Play::MiLoto {
            numbers: main_numbers(rng),
        },
        GameKind::ColorLoto => Play::ColorLoto {
            pairs: draw_color_pairs(rng, config)?,
        },
    };
    Ok(play)
}

fn draw_unique_numbers<R: Rng + ?Sized>(rng: &mut R, count: usize, (min, max): (u8, u8)) -> Vec<u8> {
    let mut picked = BTreeSet::new();
    let mut draws = 0;
    while picked.len() < count && draws < MAX_RANDOM_DRAWS {
        picked.insert(rng.random_range(min..=max));
        draws += 1;
    }

    if picked.len() < count {
        let missing = count - picked.len();
        let remaining: Vec<u8> = (min..=max).filter(|n| !picked.contains(n)).collect();
        picked.extend(remaining.choose_multiple(rng, missing).copied());
    }

    picked.into_iter().collect()
}

fn draw_hot_numbers<R: Rng + ?Sized>(
    rng: &mut R,
    config: &GameConfig,
    frequency: &BTreeMap<u8, u32>,
) -> Vec<u8> {
    let (min, max) = config.number_range;
    let pool_size = (config.count_main * HOT_POOL_FACTOR).min(config.range_size());

    let mut ranked: Vec<(u8, u32)> = frequency
        .iter()
        .filter(|&(&n, &count)| n >= min && n <= max && count > 0)
        .map(|(&n, &count)| (n, count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut pool: Vec<u8> = ranked.iter().take(pool_size).map(|(n, _)| *n).collect();

    // Histórico escaso: completar el grupo con números al azar del rango
    if pool.len() < pool_size {
        let missing = pool_size - pool.len();
        let rest: Vec<u8> = (min..=max).filter(|n| !pool.contains(n)).collect();
        pool.extend(rest.choose_multiple(rng, missing).copied());
    }

    let mut numbers: Vec<u8> = pool.choose_multiple(rng, config.count_main).copied().collect();
    numbers.sort_unstable();
    numbers
}

fn draw_color_pairs<R: Rng + ?Sized>(rng: &mut R, config: &GameConfig) -> LotoResult<Vec<ColorPair>> {
    let count = config.count_main;
    let (min, max) = config.number_range;
    let mut pairs = Vec::with_capacity(count);
    let mut seen = HashSet::with_capacity(count);
    let mut stalled = 0;

    while pairs.len() < count && stalled < MAX_STALLED_DRAWS {
        let Some(&color) = config.colors.choose(rng) else {
            break;
        };
        let pair = ColorPair {
            color,
            number: rng.random_range(min..=max),
        };
        if seen.insert(pair) {
            pairs.push(pair);
            stalled = 0;
        } else {
            stalled += 1;
        }
    }

    if pairs.len() < count {
        debug!(accepted = pairs.len(), count, "relleno determinista de parejas");
        let missing = count - pairs.len();
        let fill: Vec<ColorPair> = config
            .colors
            .iter()
            .flat_map(|&color| (min..=max).map(move |number| ColorPair { color, number }))
            .filter(|pair| seen.insert(*pair))
            .take(missing)
            .collect();
        pairs.extend(fill);
    }

    if pairs.len() < count {
        return Err(LotoError::InvalidConfiguration(format!(
            "Solo existen {} parejas distintas, se piden {}",
            pairs.len(),
            count
        )));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loterias_db::models::{validate_play, Color, BALOTO, COLOR_LOTO, MI_LOTO, PALETTE};

    /// RNG que siempre devuelve ceros: fuerza el relleno determinista.
    struct ZeroRng;

    impl rand::RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    static TWO_COLORS: [Color; 2] = [Color::Rojo, Color::Azul];

    fn tiny_color_config(count_main: usize) -> GameConfig {
        GameConfig {
            game: GameKind::ColorLoto,
            count_main,
            number_range: (1, 2),
            super_number_range: None,
            colors: &TWO_COLORS,
        }
    }

    #[test]
    fn test_baloto_invariants() {
        let mut rng = make_rng(Some(7));
        for _ in 0..500 {
            let c = generate(&BALOTO, &mut rng).unwrap();
            let Play::Baloto {
                numbers,
                super_number,
            } = &c.play
            else {
                panic!("jugada inesperada: {:?}", c.play);
            };
            assert_eq!(numbers.len(), 5);
            assert!(numbers.windows(2).all(|w| w[0] < w[1]));
            assert!(numbers.iter().all(|&n| (1..=43).contains(&n)));
            assert!((1..=16).contains(super_number));
            assert!(c.score <= 100);
            assert!(!c.selected);
        }
    }

    #[test]
    fn test_mi_loto_invariants() {
        let mut rng = make_rng(Some(11));
        for _ in 0..500 {
            let c = generate(&MI_LOTO, &mut rng).unwrap();
            assert_eq!(c.game(), GameKind::MiLoto);
            assert!(validate_play(&c.play, &MI_LOTO).is_ok());
            assert_eq!(c.play.super_number(), None);
        }
    }

    #[test]
    fn test_color_loto_invariants() {
        let mut rng = make_rng(Some(13));
        for _ in 0..500 {
            let c = generate(&COLOR_LOTO, &mut rng).unwrap();
            let Play::ColorLoto { pairs } = &c.play else {
                panic!("jugada inesperada: {:?}", c.play);
            };
            assert_eq!(pairs.len(), 6);
            let unique: HashSet<_> = pairs.iter().collect();
            assert_eq!(unique.len(), 6);
            assert!(pairs.iter().all(|p| (1..=7).contains(&p.number)));
            assert!(pairs.iter().all(|p| PALETTE.contains(&p.color)));
        }
    }

    #[test]
    fn test_color_loto_allows_repeated_colors_and_numbers() {
        let mut rng = make_rng(Some(21));
        let mut repeated_color = false;
        let mut repeated_number = false;
        for _ in 0..200 {
            let c = generate(&COLOR_LOTO, &mut rng).unwrap();
            let Play::ColorLoto { pairs } = &c.play else {
                unreachable!();
            };
            let colors: HashSet<_> = pairs.iter().map(|p| p.color).collect();
            let numbers: HashSet<_> = pairs.iter().map(|p| p.number).collect();
            repeated_color |= colors.len() < 6;
            repeated_number |= numbers.len() < 6;
        }
        assert!(repeated_color);
        assert!(repeated_number);
    }

    #[test]
    fn test_seed_determinism() {
        let a = generate_many(&BALOTO, 10, 100, DrawStrategy::Uniform, &mut make_rng(Some(42))).unwrap();
        let b = generate_many(&BALOTO, 10, 100, DrawStrategy::Uniform, &mut make_rng(Some(42))).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_count_rejected_before_generation() {
        let mut rng = make_rng(Some(1));
        for bad in [0, -3, 101] {
            let err = generate_many(&MI_LOTO, bad, 100, DrawStrategy::Uniform, &mut rng).unwrap_err();
            assert!(matches!(err, LotoError::InvalidCount { requested, max: 100 } if requested == bad));
        }
        assert_eq!(
            generate_many(&MI_LOTO, 100, 100, DrawStrategy::Uniform, &mut rng).unwrap().len(),
            100
        );
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = GameConfig {
            count_main: 40,
            ..MI_LOTO
        };
        let err = generate(&config, &mut make_rng(Some(1))).unwrap_err();
        assert!(matches!(err, LotoError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_tiny_pair_space_terminates() {
        let mut rng = make_rng(Some(3));
        let full = generate(&tiny_color_config(4), &mut rng).unwrap();
        let Play::ColorLoto { pairs } = &full.play else {
            unreachable!();
        };
        let unique: HashSet<_> = pairs.iter().collect();
        assert_eq!(unique.len(), 4);

        let err = generate(&tiny_color_config(5), &mut rng).unwrap_err();
        assert!(matches!(err, LotoError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_repeated_palette_colors_rejected() {
        static REPEATED: [Color; 2] = [Color::Rojo, Color::Rojo];
        let config = GameConfig {
            colors: &REPEATED,
            ..tiny_color_config(4)
        };
        let err = generate(&config, &mut make_rng(Some(3))).unwrap_err();
        assert!(matches!(err, LotoError::InvalidConfiguration(_)));

        // Sin la validación previa, el sorteo tampoco entrega una jugada corta
        let err = draw_color_pairs(&mut make_rng(Some(3)), &config).unwrap_err();
        assert!(matches!(err, LotoError::InvalidConfiguration(_)));
        let err = draw_color_pairs(&mut ZeroRng, &config).unwrap_err();
        assert!(matches!(err, LotoError::InvalidConfiguration(_)));

        // El relleno no repite parejas aunque la paleta repita colores
        let three = GameConfig {
            count_main: 3,
            ..config
        };
        assert!(draw_color_pairs(&mut ZeroRng, &three).is_err());
        let two = draw_color_pairs(&mut ZeroRng, &GameConfig { count_main: 2, ..config }).unwrap();
        let unique: HashSet<_> = two.iter().collect();
        assert_eq!(unique.len(), 2);
    }

    #[test]
    fn test_deterministic_fallback_walks_palette() {
        let c = generate(&COLOR_LOTO, &mut ZeroRng).unwrap();
        let Play::ColorLoto { pairs } = &c.play else {
            unreachable!();
        };
        let expected: Vec<ColorPair> = (1..=6)
            .map(|number| ColorPair {
                color: Color::Amarillo,
                number,
            })
            .collect();
        assert_eq!(pairs, &expected);
    }

    #[test]
    fn test_number_fallback_completes() {
        let c = generate(&MI_LOTO, &mut ZeroRng).unwrap();
        assert!(validate_play(&c.play, &MI_LOTO).is_ok());
    }

    #[test]
    fn test_hot_numbers_prefer_frequent() {
        let frequency: BTreeMap<u8, u32> = (1..=10).map(|n| (n, 100)).chain([(39, 1)]).collect();
        let mut rng = make_rng(Some(5));
        for _ in 0..100 {
            let c = generate_hot(&MI_LOTO, &frequency, &mut rng).unwrap();
            let numbers = c.play.main_numbers();
            assert!(numbers.iter().all(|&n| n <= 10), "{numbers:?}");
            assert!(validate_play(&c.play, &MI_LOTO).is_ok());
        }
    }

    #[test]
    fn test_hot_numbers_with_empty_history() {
        let frequency = BTreeMap::new();
        let mut rng = make_rng(Some(6));
        let c = generate_hot(&BALOTO, &frequency, &mut rng).unwrap();
        assert!(validate_play(&c.play, &BALOTO).is_ok());
    }
}
