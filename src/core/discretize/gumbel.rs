//! Gumbel 기반 이산화기 - 연속 할당 행렬을 원-핫 할당으로 변환

use anyhow::{bail, Result};
use log::warn;
use ndarray::{Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp1};

use crate::core::math::ops::{row_argmax, row_softmax};

/// 직통 추정기(straight-through) 출력
///
/// 순전파 값은 `hard` (정확한 원-핫), 역전파 대리값은 `soft` (완화된 표본)
#[derive(Debug, Clone, PartialEq)]
pub struct StraightThrough {
    /// 원-핫 할당 [행, 열]
    pub hard: Array2<f32>,
    /// 완화된 범주 표본 (행 합 1)
    pub soft: Array2<f32>,
}

impl StraightThrough {
    /// 결정적 할당: 순전파와 대리값이 모두 원-핫
    pub fn deterministic(indices: &[usize], width: usize) -> Self {
        let hard = one_hot(indices, width);
        Self { soft: hard.clone(), hard }
    }

    /// 순전파 값
    pub fn forward(&self) -> &Array2<f32> {
        &self.hard
    }

    /// 역전파에서 기울기가 흐르는 대리값
    pub fn surrogate(&self) -> &Array2<f32> {
        &self.soft
    }

    /// 행별 선택 인덱스
    pub fn indices(&self) -> Vec<usize> {
        row_argmax(self.hard.view())
    }
}

/// 인덱스 목록을 원-핫 행렬로 변환
pub fn one_hot(indices: &[usize], width: usize) -> Array2<f32> {
    let mut out = Array2::zeros((indices.len(), width));
    for (row, &idx) in indices.iter().enumerate() {
        if idx < width {
            out[[row, idx]] = 1.0;
        }
    }
    out
}

/// 온도 조절 Gumbel-Softmax 이산화기
#[derive(Debug, Clone)]
pub struct GumbelDiscretizer {
    tau: f64,
    rng: StdRng,
}

impl GumbelDiscretizer {
    pub fn new(tau: f64, seed: u64) -> Result<Self> {
        if !(tau > 0.0) || !tau.is_finite() {
            bail!("Gumbel 온도는 양수여야 함: {}", tau);
        }
        Ok(Self {
            tau,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Gumbel(0, 1) 잡음. 유한하지 않은 값이 섞이면 전체를 다시 뽑는다
    fn gumbel_noise(&mut self, rows: usize, cols: usize) -> Array2<f64> {
        loop {
            let noise = Array2::from_shape_simple_fn((rows, cols), || {
                let e: f64 = Exp1.sample(&mut self.rng);
                -e.ln()
            });
            if noise.iter().all(|g| g.is_finite()) {
                return noise;
            }
            warn!("Gumbel 잡음에 유한하지 않은 값 발생, 다시 추출");
        }
    }

    /// 완화된 범주 표본: softmax((ln p + g) / tau)
    pub fn relaxed_sample(&mut self, soft: ArrayView2<f64>) -> Array2<f64> {
        let (rows, cols) = soft.dim();
        let noise = self.gumbel_noise(rows, cols);
        let mut logits = soft.mapv(|p| p.max(f64::MIN_POSITIVE).ln());
        logits += &noise;
        logits.mapv_inplace(|x| x / self.tau);
        row_softmax(logits.view())
    }

    /// 행 합이 1인 연속 할당을 직통 원-핫 할당으로 이산화
    pub fn discretize(&mut self, soft: ArrayView2<f64>) -> StraightThrough {
        let y_soft = self.relaxed_sample(soft);
        let indices = row_argmax(y_soft.view());
        let hard = one_hot(&indices, soft.len_of(Axis(1)));
        StraightThrough {
            hard,
            soft: y_soft.mapv(|x| x as f32),
        }
    }
}
