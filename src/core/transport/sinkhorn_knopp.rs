//! Sinkhorn-Knopp 반복 비례 맞춤
//!
//! 1. exp(유사도 / epsilon) (행렬 전체 최댓값 이동 후)
//! 2. 대상 열을 1/K, 점 행을 1/N 으로 번갈아 정규화
//! 3. 점 행의 합이 1이 되도록 N배
//! 4. 행별 argmax의 원-핫이 하드 할당

use anyhow::Result;
use log::warn;
use ndarray::{Array2, ArrayView2, Axis};

use super::{ensure_solvable, finalize_rows, Assignment, TransportPlan, TransportSolver};
use crate::core::discretize::StraightThrough;
use crate::core::math::ops::{all_finite, row_argmax};

#[derive(Debug, Clone)]
pub struct SinkhornKnopp {
    pub iterations: usize,
    pub epsilon: f64,
}

impl SinkhornKnopp {
    pub fn new(iterations: usize, epsilon: f64) -> Self {
        Self { iterations, epsilon }
    }

    /// 결합 행렬 계산. (결합, 반복 횟수, 복구 여부)
    pub fn couple(&self, similarity: ArrayView2<f32>) -> Result<(Array2<f64>, usize, bool)> {
        ensure_solvable(&similarity)?;
        let (points, targets) = similarity.dim();
        let logits = similarity.mapv(|s| s as f64 / self.epsilon);

        // 전체 상수배는 아래 총합 정규화가 상쇄한다. 질량이 소실된 행은 finalize_rows가 재구성
        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mut q = logits.mapv(|x| (x - max).exp());
        let total = q.sum();
        q.mapv_inplace(|x| x / total);

        let mut recovered = false;
        let mut done = 0;
        for _ in 0..self.iterations {
            let previous = q.clone();

            // 대상 정규화: 대상별 총 가중치 1/K
            let target_mass = q.sum_axis(Axis(0));
            for (mut column, &mass) in q.axis_iter_mut(Axis(1)).zip(target_mass.iter()) {
                column.mapv_inplace(|x| x / mass / targets as f64);
            }

            // 점 정규화: 점별 총 가중치 1/N
            let point_mass = q.sum_axis(Axis(1));
            for (mut row, &mass) in q.axis_iter_mut(Axis(0)).zip(point_mass.iter()) {
                row.mapv_inplace(|x| x / mass / points as f64);
            }

            if !all_finite(q.iter()) {
                warn!("Sinkhorn-Knopp 반복 {}에서 비유한 값 발생, 직전 반복값으로 복귀", done + 1);
                q = previous;
                recovered = true;
                break;
            }
            done += 1;
        }

        // 점 행의 합을 1로 (할당 분포)
        q.mapv_inplace(|x| x * points as f64);
        finalize_rows(&mut q, logits.view());
        Ok((q, done, recovered))
    }
}

impl TransportSolver for SinkhornKnopp {
    fn name(&self) -> &'static str {
        "sinkhorn_knopp"
    }

    fn solve(&mut self, similarity: ArrayView2<f32>) -> Result<TransportPlan> {
        let (coupling, iterations, recovered) = self.couple(similarity)?;
        let indices = row_argmax(coupling.view());
        let one_hot = StraightThrough::deterministic(&indices, coupling.ncols());
        Ok(TransportPlan {
            coupling,
            assignment: Assignment { indices, one_hot },
            iterations,
            recovered,
        })
    }
}
