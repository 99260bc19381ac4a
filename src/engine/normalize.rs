use super::NormMode;
use ndarray::{Array2, ArrayViewMut1};

const CLASSIC_CLAMP: f32 = 0.2;

/// Normalizes every descriptor row in place, then scales it by `2^multiplier`.
pub fn normalize_descriptors(descriptors: &mut Array2<f32>, mode: NormMode, multiplier: u32) {
    let scale = 2f32.powi(multiplier as i32);
    for row in descriptors.rows_mut() {
        match mode {
            NormMode::RootSift => root_sift(row, scale),
            NormMode::Classic => classic(row, scale),
        }
    }
}

fn root_sift(mut row: ArrayViewMut1<'_, f32>, scale: f32) {
    let l1: f32 = row.iter().map(|v| v.abs()).sum();
    if l1 <= f32::EPSILON {
        row.fill(0.0);
        return;
    }
    row.mapv_inplace(|v| (v.abs() / l1).sqrt() * scale);
}

fn classic(mut row: ArrayViewMut1<'_, f32>, scale: f32) {
    let l2 = row.iter().map(|v| v * v).sum::<f32>().sqrt();
    if l2 <= f32::EPSILON {
        row.fill(0.0);
        return;
    }
    row.mapv_inplace(|v| (v / l2).min(CLASSIC_CLAMP));

    let l2 = row.iter().map(|v| v * v).sum::<f32>().sqrt();
    if l2 <= f32::EPSILON {
        return;
    }
    row.mapv_inplace(|v| v / l2 * scale);
}
