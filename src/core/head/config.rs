//! # 서브센트로이드 헤드 구성
//!
//! 생성 시점에 고정되는 하이퍼파라미터들. JSON 파일에서 읽을 수 있으며
//! 누락된 필드는 기본값을 사용한다.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::transport::{SolverConfig, SolverKind};

/// 헤드 전체 구성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadConfig {
    /// 임베딩 차원 (resnet18 기준 512)
    pub embedding_dim: usize,
    /// 클래스 수
    pub num_classes: usize,
    /// 클래스당 최대 서브센트로이드 슬롯 수
    pub max_slots: usize,
    /// 후보 서브센트로이드 수 집합
    pub candidate_slots: Vec<usize>,
    /// 초기 활성 슬롯 수
    pub initial_slots: usize,
    /// 모멘텀 계수
    pub gamma: f32,
    /// 대조 로짓 온도
    pub temperature: f32,
    /// 군집 갱신을 발동하는 누적 표본 수
    pub flush_threshold: usize,
    /// 서브센트로이드 대조 손실 사용 여부
    pub contrast_loss: bool,
    /// 대조 손실 가중치
    pub contrast_loss_weight: f32,
    /// 대조 손실에서 무시할 타깃 값
    pub ignore_index: usize,
    /// 프로토타입 모멘텀 갱신 여부
    pub update_prototypes: bool,
    /// 프로토타입 절단 정규분포 표준편차
    pub init_std: f32,
    /// 초기화와 이산화 난수 시드
    pub seed: u64,
    /// 수송 솔버 구성
    pub solver: SolverConfig,
}

impl Default for HeadConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 512,
            num_classes: 100,
            max_slots: 10,
            candidate_slots: vec![2, 4, 6, 8, 10],
            initial_slots: 4,
            gamma: 0.999,
            temperature: 0.1,
            flush_threshold: 1000,
            contrast_loss: false,
            contrast_loss_weight: 0.005,
            ignore_index: 255,
            update_prototypes: true,
            init_std: 0.02,
            seed: 0,
            solver: SolverConfig::default(),
        }
    }
}

impl HeadConfig {
    pub fn new(embedding_dim: usize, num_classes: usize) -> Self {
        Self {
            embedding_dim,
            num_classes,
            ..Self::default()
        }
    }

    /// JSON 파일에서 구성 로드 후 검증
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("구성 파일을 읽을 수 없음: {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("구성 파일 파싱 실패: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_slots(mut self, max_slots: usize, candidates: Vec<usize>, initial: usize) -> Self {
        self.max_slots = max_slots;
        self.candidate_slots = candidates;
        self.initial_slots = initial;
        self
    }

    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_flush_threshold(mut self, threshold: usize) -> Self {
        self.flush_threshold = threshold;
        self
    }

    pub fn with_contrast_loss(mut self, enabled: bool, weight: f32) -> Self {
        self.contrast_loss = enabled;
        self.contrast_loss_weight = weight;
        self
    }

    pub fn with_ignore_index(mut self, ignore_index: usize) -> Self {
        self.ignore_index = ignore_index;
        self
    }

    pub fn with_update_prototypes(mut self, enabled: bool) -> Self {
        self.update_prototypes = enabled;
        self
    }

    pub fn with_solver(mut self, kind: SolverKind) -> Self {
        self.solver.kind = kind;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// 잘못된 구성은 생성 시점에 거부
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.num_classes > 0,
            "num_classes={} must be a positive integer",
            self.num_classes
        );
        ensure!(self.embedding_dim > 0, "embedding_dim은 양수여야 함");
        ensure!(self.max_slots > 0, "max_slots는 양수여야 함");
        ensure!(!self.candidate_slots.is_empty(), "candidate_slots가 비어 있음");
        for &k in &self.candidate_slots {
            ensure!(
                k > 0 && k <= self.max_slots,
                "후보 슬롯 수 {}는 1..={} 범위여야 함",
                k,
                self.max_slots
            );
        }
        ensure!(
            self.initial_slots > 0 && self.initial_slots <= self.max_slots,
            "initial_slots {}는 1..={} 범위여야 함",
            self.initial_slots,
            self.max_slots
        );
        ensure!((0.0..=1.0).contains(&self.gamma), "gamma는 [0, 1] 범위여야 함");
        ensure!(self.temperature > 0.0, "temperature는 양수여야 함");
        ensure!(self.flush_threshold > 0, "flush_threshold는 양수여야 함");
        ensure!(self.contrast_loss_weight >= 0.0, "contrast_loss_weight는 음수일 수 없음");
        ensure!(self.init_std > 0.0, "init_std는 양수여야 함");
        // 대조 타깃은 class * max_slots + slot 이므로 무시 값과 겹치면 안 된다
        if self.contrast_loss {
            let targets = self.num_classes * self.max_slots;
            ensure!(
                self.ignore_index >= targets,
                "ignore_index={}가 대조 타깃 범위 0..{} 안에 있음",
                self.ignore_index,
                targets
            );
        }
        self.solver.validate()
    }
}
