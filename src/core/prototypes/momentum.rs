//! 모멘텀(EMA) 프로토타입 갱신
//!
//! new = gamma * old + (1 - gamma) * normalize(aggregate), 할당 수가 0인 슬롯은 그대로

use anyhow::{ensure, Result};
use log::trace;
use ndarray::{s, Array2, Array3, ArrayView2, Axis};

use crate::core::math::ops::{l2_normalize_in_place, l2_normalize_rows};

/// 클래스 하나의 갱신 재료
#[derive(Debug, Clone, PartialEq)]
pub struct ClassUpdate {
    pub class: usize,
    /// 활성 슬롯별 할당 특징 합 [활성 슬롯, D]
    pub aggregate: Array2<f32>,
    /// 활성 슬롯별 할당 수
    pub counts: Vec<f32>,
}

impl ClassUpdate {
    /// 하드 할당과 정답 필터로 슬롯별 특징 합과 할당 수를 모은다
    ///
    /// `assignment`는 [표본, 활성 슬롯] 원-핫, `correct[i]`가 false인 표본은 기여하지 않는다.
    pub fn from_assignments(
        class: usize,
        features: ArrayView2<f32>,
        assignment: ArrayView2<f32>,
        correct: &[bool],
    ) -> Result<Self> {
        ensure!(
            features.nrows() == assignment.nrows() && features.nrows() == correct.len(),
            "표본 수 불일치: 특징 {}, 할당 {}, 필터 {}",
            features.nrows(),
            assignment.nrows(),
            correct.len()
        );
        let mut masked = assignment.to_owned();
        for (mut row, &keep) in masked.axis_iter_mut(Axis(0)).zip(correct) {
            if !keep {
                row.fill(0.0);
            }
        }
        let aggregate = masked.t().dot(&features);
        let counts = masked.sum_axis(Axis(0)).to_vec();
        Ok(Self {
            class,
            aggregate,
            counts,
        })
    }

    pub fn has_mass(&self) -> bool {
        self.counts.iter().sum::<f32>() > 0.0
    }
}

/// 순수 모멘텀 혼합 (재정규화 전)
///
/// `aggregate`는 이미 정규화된 새 평균 방향. 할당 수가 0인 행은 `old` 그대로 복사한다.
pub fn momentum_blend(
    old: ArrayView2<f32>,
    aggregate: ArrayView2<f32>,
    counts: &[f32],
    gamma: f32,
) -> Result<Array2<f32>> {
    ensure!(
        old.dim() == aggregate.dim(),
        "기존 프로토타입 {:?}와 집계 {:?} 형태 불일치",
        old.dim(),
        aggregate.dim()
    );
    ensure!(counts.len() == old.nrows(), "할당 수 길이 {} != 슬롯 수 {}", counts.len(), old.nrows());

    let mut out = old.to_owned();
    for (slot, &count) in counts.iter().enumerate() {
        if count == 0.0 {
            continue;
        }
        let blended = &old.row(slot) * gamma + &aggregate.row(slot) * (1.0 - gamma);
        out.row_mut(slot).assign(&blended);
    }
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct MomentumUpdater {
    gamma: f32,
}

impl MomentumUpdater {
    pub fn new(gamma: f32) -> Result<Self> {
        ensure!((0.0..=1.0).contains(&gamma), "모멘텀 gamma는 [0, 1] 범위여야 함: {}", gamma);
        Ok(Self { gamma })
    }

    pub fn gamma(&self) -> f32 {
        self.gamma
    }

    /// 현재 테이블과 클래스별 갱신으로 새 테이블 계산 (저장소는 건드리지 않음)
    ///
    /// 갱신된 슬롯은 단위 길이로 다시 정규화된다.
    pub fn apply(&self, current: &Array3<f32>, updates: &[ClassUpdate]) -> Result<Array3<f32>> {
        let (classes, max_slots, _) = current.dim();
        let mut next = current.clone();

        for update in updates {
            let active = update.counts.len();
            ensure!(update.class < classes, "클래스 인덱스 {} 범위 초과", update.class);
            ensure!(active <= max_slots, "활성 슬롯 {}개가 최대 {}개를 초과", active, max_slots);
            if !update.has_mass() {
                continue;
            }

            let direction = l2_normalize_rows(update.aggregate.view());
            let old: ArrayView2<f32> = current.slice(s![update.class, ..active, ..]);
            let blended = momentum_blend(old, direction.view(), &update.counts, self.gamma)?;

            for (slot, &count) in update.counts.iter().enumerate() {
                if count == 0.0 {
                    continue;
                }
                let mut row = blended.row(slot).to_owned();
                trace!(
                    "클래스 {} 슬롯 {}: {:.3} x |{:.3}| + {:.3} x |{:.3}| = |{:.3}|",
                    update.class,
                    slot,
                    self.gamma,
                    old.row(slot).dot(&old.row(slot)).sqrt(),
                    1.0 - self.gamma,
                    direction.row(slot).dot(&direction.row(slot)).sqrt(),
                    row.dot(&row).sqrt()
                );
                l2_normalize_in_place(row.view_mut());
                next.slice_mut(s![update.class, slot, ..]).assign(&row);
            }
        }
        Ok(next)
    }
}
