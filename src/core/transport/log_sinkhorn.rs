//! 로그 영역 쌍대 포텐셜 Sinkhorn + 직통 이산화
//!
//! 비용 C = -유사도, 커널 K = exp(-C / reg). 포텐셜 u, v를 번갈아 갱신하며
//! B = diag(e^u) K diag(e^v) 가 주변분포 (a, b)에 맞춰지도록 한다.

use anyhow::Result;
use log::warn;
use ndarray::{Array1, Array2, ArrayView2, Axis};

use super::marginals::{resolve_marginal, uniform};
use super::{ensure_solvable, finalize_rows, Assignment, TransportPlan, TransportSolver};
use crate::core::discretize::GumbelDiscretizer;
use crate::core::math::ops::{all_finite, row_argmax};

/// 로그 스케일 갱신의 분모 안정화 상수
const MASS_FLOOR: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct LogSinkhorn {
    pub iterations: usize,
    pub regularization: f64,
    discretizer: GumbelDiscretizer,
}

impl LogSinkhorn {
    pub fn new(iterations: usize, regularization: f64, discretizer: GumbelDiscretizer) -> Self {
        Self {
            iterations,
            regularization,
            discretizer,
        }
    }

    /// 명시적 주변분포로 결합 계산. 빈 주변분포는 균등 분포로 대체
    pub fn couple(
        &self,
        similarity: ArrayView2<f32>,
        row_marginal: &[f64],
        column_marginal: &[f64],
    ) -> Result<(Array2<f64>, usize, bool)> {
        ensure_solvable(&similarity)?;
        let (points, targets) = similarity.dim();
        let a = resolve_marginal(row_marginal, points, "행")?;
        let b = resolve_marginal(column_marginal, targets, "열")?;
        let log_a = Array1::from_iter(a.iter().map(|w| w.ln()));
        let log_b = Array1::from_iter(b.iter().map(|w| w.ln()));

        let logits = similarity.mapv(|s| s as f64 / self.regularization);
        // 행별 최댓값 이동: 상수배는 포텐셜 u에 흡수된다
        let mut kernel = logits.clone();
        for mut row in kernel.axis_iter_mut(Axis(0)) {
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            row.mapv_inplace(|x| (x - max).exp());
        }

        let mut u = Array1::<f64>::zeros(points);
        let mut v = Array1::<f64>::zeros(targets);
        let mut plan = scale(&u, &kernel, &v);
        let mut recovered = false;
        let mut done = 0;

        for step in 0..self.iterations {
            let (u_prev, v_prev) = (u.clone(), v.clone());
            if step % 2 == 0 {
                let row_mass = plan.sum_axis(Axis(1));
                u = &u_prev + &log_a - &row_mass.mapv(|m| (m + MASS_FLOOR).ln());
            } else {
                let column_mass = plan.sum_axis(Axis(0));
                v = &v_prev + &log_b - &column_mass.mapv(|m| (m + MASS_FLOOR).ln());
            }
            plan = scale(&u, &kernel, &v);

            if !(all_finite(u.iter()) && all_finite(v.iter()) && all_finite(plan.iter())) {
                warn!("로그 Sinkhorn 반복 {}에서 기계 정밀도 한계 도달, 직전 포텐셜로 복귀", step + 1);
                u = u_prev;
                v = v_prev;
                plan = scale(&u, &kernel, &v);
                recovered = true;
                break;
            }
            done += 1;
        }

        finalize_rows(&mut plan, logits.view());
        Ok((plan, done, recovered))
    }
}

/// diag(e^u) K diag(e^v)
fn scale(u: &Array1<f64>, kernel: &Array2<f64>, v: &Array1<f64>) -> Array2<f64> {
    let eu = u.mapv(f64::exp);
    let ev = v.mapv(f64::exp);
    let mut out = kernel.clone();
    for ((i, j), value) in out.indexed_iter_mut() {
        *value *= eu[i] * ev[j];
    }
    out
}

impl TransportSolver for LogSinkhorn {
    fn name(&self) -> &'static str {
        "log_sinkhorn"
    }

    fn solve(&mut self, similarity: ArrayView2<f32>) -> Result<TransportPlan> {
        let (points, targets) = similarity.dim();
        let (coupling, iterations, recovered) =
            self.couple(similarity, &uniform(points), &uniform(targets))?;
        let indices = row_argmax(coupling.view());
        let one_hot = self.discretizer.discretize(coupling.view());
        Ok(TransportPlan {
            coupling,
            assignment: Assignment { indices, one_hot },
            iterations,
            recovered,
        })
    }
}
