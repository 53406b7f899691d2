use loterias_db::models::Combination;

/// Cuántas jugadas marcar como "mejores" según el tamaño de la lista.
pub fn best_selection_size(total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let percent = match total {
        0..=5 => 60,
        6..=10 => 50,
        11..=20 => 35,
        21..=50 => 20,
        _ => 15,
    };
    let size = (total * percent).div_ceil(100);
    if total > 50 {
        size.clamp(5, 20)
    } else {
        size.max(1)
    }
}

/// Marca las jugadas de mayor puntuación y desmarca el resto.
pub fn select_best(combinations: &mut [Combination]) -> usize {
    let size = best_selection_size(combinations.len());
    let mut order: Vec<usize> = (0..combinations.len()).collect();
    order.sort_by(|&a, &b| combinations[b].score.cmp(&combinations[a].score));

    for c in combinations.iter_mut() {
        c.selected = false;
    }
    for &i in order.iter().take(size) {
        combinations[i].selected = true;
    }
    size
}
