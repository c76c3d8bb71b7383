//! 적응적 서브센트로이드 수 선택기
//!
//! 후보 k마다 클래스 특징과 앞쪽 k개 프로토타입의 유사도로 수송 문제를 풀고,
//! 하드 할당의 실루엣 점수가 가장 높은 k를 고른다.

use anyhow::{ensure, Result};
use ndarray::{s, ArrayView2};

use super::cardinality::CardinalityTable;
use crate::core::quality::silhouette_score;
use crate::core::transport::TransportSolver;

/// 한 번의 모델 선택 결과
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// 이번 라운드 최고 k
    pub slots: usize,
    /// 이번 라운드 최고 점수
    pub score: f64,
    /// 테이블에 반영되었는지
    pub committed: bool,
    /// 후보별 (k, 점수)
    pub scores: Vec<(usize, f64)>,
}

#[derive(Debug, Clone)]
pub struct AdaptiveSelector {
    candidates: Vec<usize>,
}

impl AdaptiveSelector {
    pub fn new(candidates: Vec<usize>) -> Result<Self> {
        ensure!(!candidates.is_empty(), "후보 서브센트로이드 수가 비어 있음");
        ensure!(candidates.iter().all(|&k| k > 0), "후보 서브센트로이드 수는 양수여야 함");
        Ok(Self { candidates })
    }

    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    pub fn largest(&self) -> usize {
        self.candidates.iter().copied().max().unwrap_or(0)
    }

    /// 클래스 하나에 대해 모델 선택 수행
    ///
    /// 표본 수가 가장 큰 후보 이하이면 건너뛰고 `None`을 반환한다.
    /// `class_prototypes`는 해당 클래스의 [max_slots, D] 프로토타입.
    pub fn select(
        &self,
        class: usize,
        features: ArrayView2<f32>,
        class_prototypes: ArrayView2<f32>,
        solver: &mut dyn TransportSolver,
        table: &mut CardinalityTable,
    ) -> Result<Option<Selection>> {
        if features.nrows() <= self.largest() {
            return Ok(None);
        }
        ensure!(
            features.ncols() == class_prototypes.ncols(),
            "특징 차원 {} != 프로토타입 차원 {}",
            features.ncols(),
            class_prototypes.ncols()
        );
        ensure!(
            self.largest() <= class_prototypes.nrows(),
            "후보 {}개가 프로토타입 슬롯 {}개보다 많음",
            self.largest(),
            class_prototypes.nrows()
        );

        let mut best: Option<(usize, f64)> = None;
        let mut scores = Vec::with_capacity(self.candidates.len());

        for &k in &self.candidates {
            let similarity = features.dot(&class_prototypes.slice(s![..k, ..]).t());
            let plan = solver.solve(similarity.view())?;
            let score = silhouette_score(features, &plan.assignment.indices)?;
            scores.push((k, score));

            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((k, score));
            }
        }

        let Some((slots, score)) = best else {
            return Ok(None);
        };
        let committed = table.offer(class, slots, score)?;
        Ok(Some(Selection {
            slots,
            score,
            committed,
            scores,
        }))
    }
}
