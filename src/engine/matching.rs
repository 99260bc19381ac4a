use ndarray::{ArrayView1, ArrayView2};

/// Lowe ratio applied by the engine's nearest-neighbour matcher.
pub const MATCH_RATIO: f32 = 0.8;

/// For each query descriptor, the index of its nearest train descriptor.
///
/// A query row is left unmatched when its best distance is not below
/// `ratio` times the second best.
pub fn reverse_map(query: ArrayView2<'_, f32>, train: ArrayView2<'_, f32>, ratio: f32) -> Vec<Option<usize>> {
    query
        .rows()
        .into_iter()
        .map(|row| nearest_with_ratio(row, train, ratio))
        .collect()
}

fn nearest_with_ratio(row: ArrayView1<'_, f32>, train: ArrayView2<'_, f32>, ratio: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    let mut second = f32::INFINITY;

    for (index, candidate) in train.rows().into_iter().enumerate() {
        let distance = l2_distance(row, candidate);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {
                second = second.min(distance);
            }
            Some((_, best_distance)) => {
                second = best_distance;
                best = Some((index, distance));
            }
            None => best = Some((index, distance)),
        }
    }

    let (index, distance) = best?;
    if second.is_infinite() || distance < ratio * second {
        Some(index)
    } else {
        None
    }
}

fn l2_distance(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
