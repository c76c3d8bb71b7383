use anyhow::{ensure, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// 마지막 차원에 대한 레이어 정규화 (가중치 1, 편향 0으로 초기화)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerNorm {
    pub weight: Array1<f32>,
    pub bias: Array1<f32>,
    pub epsilon: f32,
}

impl LayerNorm {
    pub fn new(size: usize) -> Self {
        Self {
            weight: Array1::ones(size),
            bias: Array1::zeros(size),
            epsilon: 1e-5,
        }
    }

    pub fn size(&self) -> usize {
        self.weight.len()
    }

    pub fn forward(&self, input: ArrayView2<f32>) -> Result<Array2<f32>> {
        ensure!(
            input.ncols() == self.size(),
            "LayerNorm 입력 차원 {} != {}",
            input.ncols(),
            self.size()
        );
        let mut out = input.to_owned();
        for mut row in out.axis_iter_mut(Axis(0)) {
            let n = row.len() as f32;
            let mean = row.sum() / n;
            // 편향 분산 (모집단 분산)
            let var = row.iter().map(|&x| (x - mean) * (x - mean)).sum::<f32>() / n;
            let inv_std = 1.0 / (var + self.epsilon).sqrt();
            for ((x, &w), &b) in row.iter_mut().zip(self.weight.iter()).zip(self.bias.iter()) {
                *x = (*x - mean) * inv_std * w + b;
            }
        }
        Ok(out)
    }
}
