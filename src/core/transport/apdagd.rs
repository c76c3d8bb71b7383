//! APDAGD - 가속 원-쌍대 적응 경사 하강 (엔트로피 정규화 최적 수송)
//!
//! 쌍대 목적함수
//!   φ(λ, μ) = γ·ln Σ_ij exp(-(C_ij + λ_i + μ_j)/γ) + <λ, a> + <μ, b>
//! 를 가속 경사법으로 최소화하고, 각 반복의 원변수
//!   X(λ, μ)_ij ∝ exp(-(C_ij + λ_i + μ_j)/γ)
//! 를 가중 누적 평균한다. 립시츠 상수는 두 배씩 키우는 선 탐색으로 추정.

use anyhow::Result;
use log::warn;
use ndarray::{Array1, Array2, ArrayView2, Axis};

use super::marginals::{resolve_marginal, uniform};
use super::{ensure_solvable, finalize_rows, Assignment, TransportPlan, TransportSolver};
use crate::core::discretize::GumbelDiscretizer;
use crate::core::math::ops::{all_finite, log_sum_exp, row_argmax};

/// 선 탐색 최대 배가 횟수
const MAX_LINE_SEARCH: usize = 60;

#[derive(Debug, Clone)]
pub struct Apdagd {
    pub iterations: usize,
    pub epsilon: f64,
    discretizer: GumbelDiscretizer,
}

/// 쌍대 변수 한 점에서의 평가 결과
struct DualPoint {
    objective: f64,
    primal: Array2<f64>,
    grad_rows: Array1<f64>,
    grad_columns: Array1<f64>,
}

impl Apdagd {
    pub fn new(iterations: usize, epsilon: f64, discretizer: GumbelDiscretizer) -> Self {
        Self {
            iterations,
            epsilon,
            discretizer,
        }
    }

    /// 엔트로피 계수 γ = ε / (3 ln n), n은 대상 수 (최소 2로 취급)
    pub fn entropic_gamma(&self, targets: usize) -> f64 {
        self.epsilon / (3.0 * (targets.max(2) as f64).ln())
    }

    pub fn couple(
        &self,
        similarity: ArrayView2<f32>,
        row_marginal: &[f64],
        column_marginal: &[f64],
    ) -> Result<(Array2<f64>, usize, bool)> {
        ensure_solvable(&similarity)?;
        let (points, targets) = similarity.dim();
        let a = Array1::from(resolve_marginal(row_marginal, points, "행")?);
        let b = Array1::from(resolve_marginal(column_marginal, targets, "열")?);
        let gamma = self.entropic_gamma(targets);
        let cost = similarity.mapv(|s| -(s as f64));

        let evaluate = |lambda: &Array1<f64>, mu: &Array1<f64>| -> DualPoint {
            let mut scores = cost.clone();
            for ((i, j), value) in scores.indexed_iter_mut() {
                *value = -(*value + lambda[i] + mu[j]) / gamma;
            }
            let lse = log_sum_exp(scores.iter().cloned());
            let primal = scores.mapv(|s| (s - lse).exp());
            let grad_rows = &a - &primal.sum_axis(Axis(1));
            let grad_columns = &b - &primal.sum_axis(Axis(0));
            DualPoint {
                objective: gamma * lse + lambda.dot(&a) + mu.dot(&b),
                primal,
                grad_rows,
                grad_columns,
            }
        };

        // η: 수렴 분석 대상 수열, ζ: 거울 하강 수열
        let mut eta = (Array1::<f64>::zeros(points), Array1::<f64>::zeros(targets));
        let mut zeta = eta.clone();
        let mut big_a = 0.0f64;
        let mut lipschitz = 1.0f64;
        let mut averaged = evaluate(&eta.0, &eta.1).primal;
        let mut recovered = false;
        let mut done = 0;

        for step in 0..self.iterations {
            let mut trial = lipschitz / 2.0;
            let mut accepted = None;

            for _ in 0..MAX_LINE_SEARCH {
                trial *= 2.0;
                let alpha = (1.0 + (1.0 + 4.0 * trial * big_a).sqrt()) / (2.0 * trial);
                let a_next = big_a + alpha;
                let tau = alpha / a_next;

                let lambda = &zeta.0 * tau + &eta.0 * (1.0 - tau);
                let mu = &zeta.1 * tau + &eta.1 * (1.0 - tau);
                let at_lambda = evaluate(&lambda, &mu);

                let zeta_next = (
                    &zeta.0 - &(&at_lambda.grad_rows * alpha),
                    &zeta.1 - &(&at_lambda.grad_columns * alpha),
                );
                let eta_next = (
                    &zeta_next.0 * tau + &eta.0 * (1.0 - tau),
                    &zeta_next.1 * tau + &eta.1 * (1.0 - tau),
                );
                let objective_next = evaluate(&eta_next.0, &eta_next.1).objective;

                let d_rows = &eta_next.0 - &lambda;
                let d_columns = &eta_next.1 - &mu;
                let linear = at_lambda.grad_rows.dot(&d_rows) + at_lambda.grad_columns.dot(&d_columns);
                let quadratic = d_rows.dot(&d_rows) + d_columns.dot(&d_columns);
                let bound = at_lambda.objective + linear + trial / 2.0 * quadratic;

                let finished = objective_next <= bound + 1e-12 || !objective_next.is_finite();
                accepted = Some((a_next, tau, at_lambda.primal, zeta_next, eta_next));
                if finished {
                    break;
                }
            }

            let Some((a_next, tau, primal, zeta_next, eta_next)) = accepted else {
                break;
            };
            let next_average = &primal * tau + &averaged * (1.0 - tau);

            let finite = all_finite(zeta_next.0.iter())
                && all_finite(zeta_next.1.iter())
                && all_finite(eta_next.0.iter())
                && all_finite(eta_next.1.iter())
                && all_finite(next_average.iter());
            if !finite {
                warn!("APDAGD 반복 {}에서 비유한 쌍대/원변수 발생, 직전 반복값으로 복귀", step + 1);
                recovered = true;
                break;
            }

            averaged = next_average;
            zeta = zeta_next;
            eta = eta_next;
            big_a = a_next;
            lipschitz = trial / 2.0;
            done += 1;
        }

        let fallback_logits = similarity.mapv(|s| s as f64 / gamma);
        finalize_rows(&mut averaged, fallback_logits.view());
        Ok((averaged, done, recovered))
    }
}

impl TransportSolver for Apdagd {
    fn name(&self) -> &'static str {
        "apdagd"
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
