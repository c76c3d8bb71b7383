use anyhow::{ensure, Result};
use ndarray::{Array2, ArrayView2};
use rayon::prelude::*;
use std::collections::BTreeMap;

use crate::core::math::ops::l2_normalize_rows;

/// 코사인 거리 행렬 1 - cos(x_i, x_j), [0, 2]로 자름
///
/// 0 벡터는 모든 점과 거리 1 (자기 자신과는 0)
pub fn cosine_distance_matrix(features: ArrayView2<f32>) -> Array2<f64> {
    let n = features.nrows();
    let unit = l2_normalize_rows(features);

    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let xi = unit.row(i);
            (0..n)
                .map(|j| {
                    if i == j {
                        0.0
                    } else {
                        (1.0 - xi.dot(&unit.row(j)) as f64).clamp(0.0, 2.0)
                    }
                })
                .collect()
        })
        .collect();

    let mut out = Array2::zeros((n, n));
    for (i, row) in rows.into_iter().enumerate() {
        for (j, d) in row.into_iter().enumerate() {
            out[[i, j]] = d;
        }
    }
    out
}

/// 코사인 거리 기반 실루엣 점수 [-1, 1]
///
/// 서로 다른 레이블이 2개 미만이면 0을 반환한다.
pub fn silhouette_score(features: ArrayView2<f32>, labels: &[usize]) -> Result<f64> {
    ensure!(
        features.nrows() == labels.len(),
        "특징 수 {} != 레이블 수 {}",
        features.nrows(),
        labels.len()
    );

    let mut sizes: BTreeMap<usize, usize> = BTreeMap::new();
    for &label in labels {
        *sizes.entry(label).or_insert(0) += 1;
    }
    if sizes.len() < 2 {
        return Ok(0.0);
    }

    let distances = cosine_distance_matrix(features);
    let n = labels.len();

    let per_sample: Vec<f64> = (0..n)
        .into_par_iter()
        .map(|i| {
            let own = labels[i];
            let own_size = sizes[&own];
            if own_size <= 1 {
                return 0.0;
            }

            let mut sums: BTreeMap<usize, f64> = BTreeMap::new();
            for j in 0..n {
                *sums.entry(labels[j]).or_insert(0.0) += distances[[i, j]];
            }

            let a = sums[&own] / (own_size - 1) as f64;
            let b = sums
                .iter()
                .filter(|(label, _)| **label != own)
                .map(|(label, &sum)| sum / sizes[label] as f64)
                .fold(f64::INFINITY, f64::min);

            let denom = a.max(b);
            if denom > 0.0 {
                (b - a) / denom
            } else {
                0.0
            }
        })
        .collect();

    // 순서 고정 합산 (재평가 시 동일한 값)
    Ok(per_sample.iter().sum::<f64>() / n as f64)
}
