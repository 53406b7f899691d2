use std::collections::HashSet;

use loterias_db::models::{Combination, Play};

/// Clave canónica de una jugada, independiente del orden de sus valores.
pub fn canonical_key(combination: &Combination) -> String {
    let game = combination.game().id();
    match &combination.play {
        Play::Baloto {
            numbers,
            super_number,
        } => format!("{}:{}+{}", game, join_sorted(numbers), super_number),
        Play::MiLoto { numbers } => format!("{}:{}", game, join_sorted(numbers)),
        Play::ColorLoto { pairs } => {
            let mut sorted = pairs.clone();
            sorted.sort();
            let body: Vec<String> = sorted
                .iter()
                .map(|p| format!("{}-{}", p.color.name(), p.number))
                .collect();
            format!("{}:{}", game, body.join("|"))
        }
    }
}

fn join_sorted(numbers: &[u8]) -> String {
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Conserva la primera aparición de cada jugada.
pub fn dedupe(combinations: Vec<Combination>) -> Vec<Combination> {
    let mut seen = HashSet::with_capacity(combinations.len());
    combinations
        .into_iter()
        .filter(|c| seen.insert(canonical_key(c)))
        .collect()
}

pub fn count_duplicates(combinations: &[Combination]) -> usize {
    let unique: HashSet<String> = combinations.iter().map(canonical_key).collect();
    combinations.len() - unique.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use loterias_db::models::{Color, ColorPair};

    fn combination(id: &str, play: Play) -> Combination {
        Combination {
            id: id.to_string(),
            play,
            score: 50,
            probability_display: 0.0,
            selected: false,
        }
    }

    fn baloto(id: &str, numbers: [u8; 5], super_number: u8) -> Combination {
        combination(
            id,
            Play::Baloto {
                numbers: numbers.to_vec(),
                super_number,
            },
        )
    }

    #[test]
    fn test_key_ignores_order() {
        let a = baloto("a", [1, 2, 3, 4, 5], 7);
        let b = baloto("b", [5, 4, 3, 2, 1], 7);
        assert_eq!(canonical_key(&a), canonical_key(&b));
        assert_eq!(canonical_key(&a), "baloto:1,2,3,4,5+7");
    }

    #[test]
    fn test_super_number_and_game_distinguish() {
        let a = baloto("a", [1, 2, 3, 4, 5], 7);
        let b = baloto("b", [1, 2, 3, 4, 5], 8);
        let c = combination(
            "c",
            Play::MiLoto {
                numbers: vec![1, 2, 3, 4, 5],
            },
        );
        assert_ne!(canonical_key(&a), canonical_key(&b));
        assert_ne!(canonical_key(&a), canonical_key(&c));
    }

    #[test]
    fn test_color_key_sorted_by_palette() {
        let pairs = vec![
            ColorPair {
                color: Color::Negro,
                number: 2,
            },
            ColorPair {
                color: Color::Amarillo,
                number: 5,
            },
        ];
        let mut reversed = pairs.clone();
        reversed.reverse();
        let a = combination("a", Play::ColorLoto { pairs });
        let b = combination("b", Play::ColorLoto { pairs: reversed });
        assert_eq!(canonical_key(&a), "color-loto:amarillo-5|negro-2");
        assert_eq!(canonical_key(&a), canonical_key(&b));
    }

    #[test]
    fn test_dedupe_keeps_first_seen() {
        let list = vec![
            baloto("a", [1, 2, 3, 4, 5], 7),
            baloto("b", [9, 10, 11, 12, 13], 1),
            baloto("c", [5, 4, 3, 2, 1], 7),
        ];
        assert_eq!(count_duplicates(&list), 1);
        let unique = dedupe(list);
        let ids: Vec<&str> = unique.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(dedupe(unique.clone()), unique);
    }

    #[test]
    fn test_dedupe_empty() {
        assert!(dedupe(Vec::new()).is_empty());
    }
}
