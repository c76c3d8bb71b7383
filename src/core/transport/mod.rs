//! # 엔트로피 최적 수송 모듈
//!
//! 점-프로토타입 유사도 행렬을 주변분포 제약을 만족하는 결합(coupling)과
//! 하드 할당으로 바꾸는 교체 가능한 솔버들

pub mod apdagd;
pub mod log_sinkhorn;
pub mod marginals;
pub mod sinkhorn_knopp;

pub use apdagd::Apdagd;
pub use log_sinkhorn::LogSinkhorn;
pub use marginals::resolve_marginal;
pub use sinkhorn_knopp::SinkhornKnopp;

use anyhow::{ensure, Result};
use log::warn;
use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::core::discretize::{GumbelDiscretizer, StraightThrough};
use crate::core::math::ops::row_softmax;

/// 점별 하드 할당
#[derive(Debug, Clone)]
pub struct Assignment {
    /// 결합 행렬의 행별 argmax (동률은 앞 인덱스)
    pub indices: Vec<usize>,
    /// 원-핫 할당과 역전파 대리값
    pub one_hot: StraightThrough,
}

/// 솔버 한 번 호출의 결과. 저장되지 않는 일회성 값
#[derive(Debug, Clone)]
pub struct TransportPlan {
    /// [점, 대상] 결합 행렬, 각 행의 합은 1
    pub coupling: Array2<f64>,
    pub assignment: Assignment,
    /// 실제 수행한 반복 횟수
    pub iterations: usize,
    /// 비유한 반복값을 되돌리고 조기 종료했는지 여부
    pub recovered: bool,
}

/// 수송 솔버 전략
pub trait TransportSolver: Send {
    fn name(&self) -> &'static str;

    /// [점, 대상] 유사도 행렬을 풀어 결합과 하드 할당을 반환
    fn solve(&mut self, similarity: ArrayView2<f32>) -> Result<TransportPlan>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// 반복 비례 맞춤 (Sinkhorn-Knopp)
    SinkhornKnopp,
    /// 로그 영역 쌍대 스케일링 + 직통 이산화
    LogSinkhorn,
    /// 가속 원-쌍대 적응 경사 하강
    Apdagd,
}

/// 솔버 구성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub kind: SolverKind,
    /// Sinkhorn-Knopp 반복 횟수
    pub sinkhorn_iterations: usize,
    /// Sinkhorn-Knopp 지수 스케일
    pub sinkhorn_epsilon: f64,
    pub log_sinkhorn_iterations: usize,
    pub log_sinkhorn_regularization: f64,
    pub apdagd_iterations: usize,
    /// APDAGD 정확도 파라미터 (엔트로피 계수 = eps / (3 ln 대상수))
    pub apdagd_epsilon: f64,
    /// 이산화 Gumbel 온도
    pub gumbel_tau: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: SolverKind::Apdagd,
            sinkhorn_iterations: 3,
            sinkhorn_epsilon: 0.05,
            log_sinkhorn_iterations: 10,
            log_sinkhorn_regularization: 0.05,
            apdagd_iterations: 20,
            apdagd_epsilon: 0.05,
            gumbel_tau: 0.5,
        }
    }
}

impl SolverConfig {
    pub fn with_kind(mut self, kind: SolverKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.sinkhorn_iterations > 0, "sinkhorn_iterations는 1 이상이어야 함");
        ensure!(self.log_sinkhorn_iterations > 0, "log_sinkhorn_iterations는 1 이상이어야 함");
        ensure!(self.apdagd_iterations > 0, "apdagd_iterations는 1 이상이어야 함");
        ensure!(self.sinkhorn_epsilon > 0.0, "sinkhorn_epsilon은 양수여야 함");
        ensure!(
            self.log_sinkhorn_regularization > 0.0,
            "log_sinkhorn_regularization은 양수여야 함"
        );
        ensure!(self.apdagd_epsilon > 0.0, "apdagd_epsilon은 양수여야 함");
        ensure!(self.gumbel_tau > 0.0, "gumbel_tau는 양수여야 함");
        Ok(())
    }
}

/// 구성에 따라 솔버 생성
pub fn build_solver(config: &SolverConfig, seed: u64) -> Result<Box<dyn TransportSolver>> {
    config.validate()?;
    let solver: Box<dyn TransportSolver> = match config.kind {
        SolverKind::SinkhornKnopp => Box::new(SinkhornKnopp::new(
            config.sinkhorn_iterations,
            config.sinkhorn_epsilon,
        )),
        SolverKind::LogSinkhorn => Box::new(LogSinkhorn::new(
            config.log_sinkhorn_iterations,
            config.log_sinkhorn_regularization,
            GumbelDiscretizer::new(config.gumbel_tau, seed)?,
        )),
        SolverKind::Apdagd => Box::new(Apdagd::new(
            config.apdagd_iterations,
            config.apdagd_epsilon,
            GumbelDiscretizer::new(config.gumbel_tau, seed)?,
        )),
    };
    Ok(solver)
}

pub(crate) fn ensure_solvable(similarity: &ArrayView2<f32>) -> Result<()> {
    let (points, targets) = similarity.dim();
    ensure!(points > 0, "수송 문제에 점이 없음");
    ensure!(targets > 0, "수송 문제에 대상이 없음");
    Ok(())
}

/// 결합 행렬의 각 행을 합 1로 맞춘다
///
/// 질량이 0으로 언더플로되었거나 비유한 행은 `fallback_logits`의 행별
/// 소프트맥스로 다시 구성한다. 다시 구성한 행 수를 반환.
pub(crate) fn finalize_rows(coupling: &mut Array2<f64>, fallback_logits: ArrayView2<f64>) -> usize {
    let mut rebuilt = 0;
    for (i, mut row) in coupling.axis_iter_mut(Axis(0)).enumerate() {
        let sum = row.sum();
        if sum > 0.0 && sum.is_finite() && row.iter().all(|v| v.is_finite()) {
            row.mapv_inplace(|v| v / sum);
        } else {
            let replacement = row_softmax(fallback_logits.slice(ndarray::s![i..i + 1, ..]));
            row.assign(&replacement.row(0));
            rebuilt += 1;
        }
    }
    if rebuilt > 0 {
        warn!("결합 행렬 {}개 행의 질량이 소실되어 소프트맥스로 재구성", rebuilt);
    }
    rebuilt
}

#[cfg(test)]
pub mod __tests__;
