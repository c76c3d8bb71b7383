use anyhow::{ensure, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// 최고 점수 초깃값 (실루엣 하한)
pub const INITIAL_BEST_SCORE: f64 = -1.0;

/// 클래스별 활성 슬롯 수와 지금까지의 최고 품질 점수
///
/// 활성 슬롯 수는 항상 `max_slots` 이하이며, 엄격히 더 높은 점수가
/// 관측될 때만 바뀐다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardinalityTable {
    slots: Vec<usize>,
    best_scores: Vec<f64>,
    max_slots: usize,
}

impl CardinalityTable {
    pub fn new(num_classes: usize, initial_slots: usize, max_slots: usize) -> Result<Self> {
        ensure!(num_classes > 0, "클래스 수는 양수여야 함: {}", num_classes);
        ensure!(
            initial_slots > 0 && initial_slots <= max_slots,
            "초기 슬롯 수 {}는 1..={} 범위여야 함",
            initial_slots,
            max_slots
        );
        Ok(Self {
            slots: vec![initial_slots; num_classes],
            best_scores: vec![INITIAL_BEST_SCORE; num_classes],
            max_slots,
        })
    }

    /// 체크포인트 복원용 생성자 (불변식 검증 포함)
    pub fn from_parts(slots: Vec<usize>, best_scores: Vec<f64>, max_slots: usize) -> Result<Self> {
        let table = Self {
            slots,
            best_scores,
            max_slots,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.slots.is_empty(), "카디널리티 테이블이 비어 있음");
        ensure!(
            self.slots.len() == self.best_scores.len(),
            "슬롯 테이블 길이 {} != 점수 테이블 길이 {}",
            self.slots.len(),
            self.best_scores.len()
        );
        for (class, &k) in self.slots.iter().enumerate() {
            ensure!(
                k > 0 && k <= self.max_slots,
                "클래스 {}의 슬롯 수 {}가 1..={} 범위를 벗어남",
                class,
                k,
                self.max_slots
            );
        }
        Ok(())
    }

    pub fn num_classes(&self) -> usize {
        self.slots.len()
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    pub fn slots(&self, class: usize) -> usize {
        self.slots[class]
    }

    pub fn best_score(&self, class: usize) -> f64 {
        self.best_scores[class]
    }

    pub fn active_slots(&self) -> &[usize] {
        &self.slots
    }

    pub fn best_scores(&self) -> &[f64] {
        &self.best_scores
    }

    pub fn is_active(&self, class: usize, slot: usize) -> bool {
        slot < self.slots[class]
    }

    /// 후보 (k, 점수) 제안. 기존 최고 점수보다 엄격히 높을 때만 반영하고 true 반환
    pub fn offer(&mut self, class: usize, slots: usize, score: f64) -> Result<bool> {
        ensure!(class < self.slots.len(), "클래스 인덱스 {} 범위 초과", class);
        ensure!(
            slots > 0 && slots <= self.max_slots,
            "슬롯 수 {}가 1..={} 범위를 벗어남",
            slots,
            self.max_slots
        );
        if score > self.best_scores[class] {
            debug!(
                "클래스 {} 서브센트로이드 수 {} -> {} (실루엣 {:.4} -> {:.4})",
                class, self.slots[class], slots, self.best_scores[class], score
            );
            self.slots[class] = slots;
            self.best_scores[class] = score;
            return Ok(true);
        }
        Ok(false)
    }
}
