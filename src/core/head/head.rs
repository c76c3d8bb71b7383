//! # 서브센트로이드 분류 헤드
//!
//! 클래스별 서브센트로이드(프로토타입) 집합을 교차 엔트로피 분류기와 함께 학습한다.
//!
//! 스텝 흐름:
//! 1. 배치를 모든 워커에서 모아 표본 버퍼에 누적
//! 2. 누적 수가 임계값 미만이면 분류 손실만 계산 (누적 모드)
//! 3. 임계값 이상이면 한 스텝 동안 군집 모드: 버퍼 전체로 순전파, 클래스별
//!    카디널리티 선택 + 수송 할당 + 모멘텀 갱신, 워커 간 평균, 버퍼 비우기

use anyhow::{ensure, Result};
use log::{debug, info};
use ndarray::{s, Array2, Array3, ArrayView2, Axis};

use super::checkpoint::HeadState;
use super::config::HeadConfig;
use super::layer_norm::LayerNorm;
use super::loss::{cross_entropy, LossMap, LOSS_CENTROID_CONTRAST, LOSS_CLS};
use crate::core::buffer::SampleBuffer;
use crate::core::math::ops::{l2_normalize_rows, row_argmax, row_softmax};
use crate::core::prototypes::{ClassUpdate, MomentumUpdater, PrototypeStore};
use crate::core::selection::{AdaptiveSelector, CardinalityTable};
use crate::core::sync::Synchronizer;
use crate::core::transport::{build_solver, TransportSolver};

/// 학습 스텝 모드 (두 상태 순환)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadMode {
    /// 누적만: 분류 손실만 계산
    Accumulating,
    /// 임계값 도달: 같은 스텝 안에서 군집 갱신 후 버퍼를 비우고 누적으로 복귀
    ClusterAndReset,
}

/// 대조 로짓 [N, 클래스 * 최대 슬롯]과 정수 타깃 [N]
#[derive(Debug, Clone)]
pub struct ContrastOutput {
    pub logits: Array2<f32>,
    pub targets: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct ForwardOutput {
    /// 클래스 로짓 [N, 클래스]
    pub logits: Array2<f32>,
    pub contrast: Option<ContrastOutput>,
}

#[derive(Debug, Clone)]
pub struct StepOutput {
    pub losses: LossMap,
    /// 이번 스텝에서 군집 갱신이 실행되었는지
    pub clustered: bool,
    /// 스텝 종료 시 버퍼에 남은 표본 수
    pub buffered: usize,
}

pub struct SubCentroidHead {
    config: HeadConfig,
    feat_norm: LayerNorm,
    mask_norm: LayerNorm,
    store: PrototypeStore,
    cardinality: CardinalityTable,
    selector: AdaptiveSelector,
    solver: Box<dyn TransportSolver>,
    updater: MomentumUpdater,
    buffer: SampleBuffer,
    sync: Box<dyn Synchronizer>,
    mode: HeadMode,
}

impl SubCentroidHead {
    pub fn new(config: HeadConfig, sync: Box<dyn Synchronizer>) -> Result<Self> {
        config.validate()?;
        let store = PrototypeStore::new(
            config.num_classes,
            config.max_slots,
            config.embedding_dim,
            config.init_std,
            config.seed,
        )?;
        let cardinality = CardinalityTable::new(config.num_classes, config.initial_slots, config.max_slots)?;
        let selector = AdaptiveSelector::new(config.candidate_slots.clone())?;
        let solver = build_solver(&config.solver, config.seed.wrapping_add(1))?;
        let updater = MomentumUpdater::new(config.gamma)?;
        let buffer = SampleBuffer::new(config.embedding_dim, config.flush_threshold)?;
        info!(
            "서브센트로이드 헤드 생성: 클래스 {}, 슬롯 {}, 버퍼 임계값 {}, 솔버 {}",
            config.num_classes,
            config.max_slots,
            config.flush_threshold,
            solver.name()
        );

        Ok(Self {
            feat_norm: LayerNorm::new(config.embedding_dim),
            mask_norm: LayerNorm::new(config.num_classes),
            store,
            cardinality,
            selector,
            solver,
            updater,
            buffer,
            sync,
            mode: HeadMode::Accumulating,
            config,
        })
    }

    pub fn config(&self) -> &HeadConfig {
        &self.config
    }

    pub fn mode(&self) -> HeadMode {
        self.mode
    }

    pub fn buffered_samples(&self) -> usize {
        self.buffer.len()
    }

    pub fn cardinality(&self) -> &CardinalityTable {
        &self.cardinality
    }

    pub fn prototypes(&self) -> &PrototypeStore {
        &self.store
    }

    /// 특징 정규화: LayerNorm 후 L2 정규화
    fn embed(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        ensure!(
            x.ncols() == self.config.embedding_dim,
            "입력 차원 {} != 임베딩 차원 {}",
            x.ncols(),
            self.config.embedding_dim
        );
        let normed = self.feat_norm.forward(x)?;
        Ok(l2_normalize_rows(normed.view()))
    }

    /// 마스크된 프로토타입과의 유사도 [N, 클래스, 최대 슬롯]
    fn masked_similarities(&self, x: ArrayView2<f32>) -> Result<Array3<f32>> {
        let masked = self.store.masked(&self.cardinality)?;
        let (classes, slots, dim) = masked.dim();
        let flat = masked.into_shape((classes * slots, dim))?;
        let sims = x.dot(&flat.t());
        Ok(sims.into_shape((x.nrows(), classes, slots))?)
    }

    /// 클래스별 활성 슬롯 최대 유사도 후 LayerNorm
    fn class_logits(&self, sims: &Array3<f32>) -> Result<Array2<f32>> {
        let (n, classes, _) = sims.dim();
        let mut scores = Array2::<f32>::zeros((n, classes));
        for i in 0..n {
            for class in 0..classes {
                let active = self.cardinality.slots(class);
                scores[[i, class]] = sims
                    .slice(s![i, class, ..active])
                    .iter()
                    .cloned()
                    .fold(f32::NEG_INFINITY, f32::max);
            }
        }
        self.mask_norm.forward(scores.view())
    }

    fn check_labels(&self, x: ArrayView2<f32>, labels: &[usize]) -> Result<()> {
        ensure!(
            x.nrows() == labels.len(),
            "특징 {}행과 레이블 {}개 불일치",
            x.nrows(),
            labels.len()
        );
        if let Some(&bad) = labels.iter().find(|&&l| l >= self.config.num_classes) {
            anyhow::bail!("레이블 {}가 클래스 수 {} 범위를 벗어남", bad, self.config.num_classes);
        }
        Ok(())
    }

    /// 추론 순전파: 클래스 로짓 [N, 클래스]
    pub fn forward(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let embedded = self.embed(x)?;
        self.store.normalize();
        let sims = self.masked_similarities(embedded.view())?;
        self.class_logits(&sims)
    }

    /// 클래스 확률 (행별 소프트맥스)
    pub fn predict(&self, x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let logits = self.forward(x)?;
        Ok(row_softmax(logits.mapv(|v| v as f64).view()).mapv(|p| p as f32))
    }

    /// 군집 순전파: 클래스 로짓 + 대조 로짓/타깃, 그리고 프로토타입 갱신
    pub fn forward_train(&mut self, x: ArrayView2<f32>, labels: &[usize]) -> Result<ForwardOutput> {
        self.check_labels(x, labels)?;
        let embedded = self.embed(x)?;
        self.store.normalize();
        let sims = self.masked_similarities(embedded.view())?;
        let logits = self.class_logits(&sims)?;
        let contrast = self.learn_subcentroids(embedded.view(), logits.view(), labels)?;
        Ok(ForwardOutput {
            logits,
            contrast: Some(contrast),
        })
    }

    fn learn_subcentroids(
        &mut self,
        x: ArrayView2<f32>,
        class_logits: ArrayView2<f32>,
        labels: &[usize],
    ) -> Result<ContrastOutput> {
        let predictions = row_argmax(class_logits);
        let correct: Vec<bool> = predictions.iter().zip(labels).map(|(p, l)| p == l).collect();

        let snapshot = self.store.snapshot();
        let (classes, max_slots, dim) = snapshot.dim();
        let flat = snapshot.view().into_shape((classes * max_slots, dim))?;
        let contrast_logits = x.dot(&flat.t()) / self.config.temperature;
        let mut targets = labels.to_vec();
        let mut updates = Vec::new();

        for class in 0..classes {
            let members: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
            if members.is_empty() {
                continue;
            }
            let features = x.select(Axis(0), &members);

            if let Some(selection) = self.selector.select(
                class,
                features.view(),
                snapshot.slice(s![class, .., ..]),
                self.solver.as_mut(),
                &mut self.cardinality,
            )? {
                debug!(
                    "클래스 {} 모델 선택: k={} 실루엣={:.4} 반영={}",
                    class, selection.slots, selection.score, selection.committed
                );
            }

            // 방금 활성화된 슬롯도 실제 유사도로 시작하도록 현재 카디널리티로 다시 계산
            let active = self.cardinality.slots(class);
            let initial = features.dot(&snapshot.slice(s![class, ..active, ..]).t());
            let plan = self.solver.solve(initial.view())?;

            let member_correct: Vec<bool> = members.iter().map(|&i| correct[i]).collect();
            let update = ClassUpdate::from_assignments(
                class,
                features.view(),
                plan.assignment.one_hot.forward().view(),
                &member_correct,
            )?;
            if update.has_mass() && self.config.update_prototypes {
                updates.push(update);
            }

            for (row, &i) in members.iter().enumerate() {
                targets[i] = class * max_slots + plan.assignment.indices[row];
            }
        }

        let next = self.updater.apply(&snapshot, &updates)?;
        self.store.commit(next)?;

        if self.sync.world_size() > 1 {
            let averaged = self.sync.average_reduce(self.store.snapshot().view())?;
            self.store.commit(averaged)?;
        }
        info!("서브센트로이드 갱신 완료: 표본 {}, 갱신 클래스 {}", labels.len(), updates.len());

        Ok(ContrastOutput {
            logits: contrast_logits,
            targets,
        })
    }

    /// 학습 스텝: 이름 붙은 손실 반환
    pub fn train_step(&mut self, x: ArrayView2<f32>, labels: &[usize]) -> Result<StepOutput> {
        self.check_labels(x, labels)?;
        let gathered = self.sync.gather(x)?;
        let gathered_labels = self.sync.gather_labels(labels)?;
        let buffered = self.buffer.push(gathered, gathered_labels)?;

        if self.mode == HeadMode::Accumulating {
            if self.buffer.is_ready() {
                info!("표본 버퍼 {}개 >= 임계값 {}, 군집 모드 전환", buffered, self.buffer.threshold());
                self.mode = HeadMode::ClusterAndReset;
            } else {
                let logits = self.forward(x)?;
                let mut losses = LossMap::new();
                losses.insert(LOSS_CLS.to_string(), cross_entropy(logits.view(), labels, None)?);
                return Ok(StepOutput {
                    losses,
                    clustered: false,
                    buffered,
                });
            }
        }

        let (inputs, all_labels) = self.buffer.drain()?;
        let output = self.forward_train(inputs.view(), &all_labels)?;
        let mut losses = LossMap::new();
        losses.insert(
            LOSS_CLS.to_string(),
            cross_entropy(output.logits.view(), &all_labels, None)?,
        );
        if self.config.contrast_loss {
            if let Some(contrast) = &output.contrast {
                let loss = cross_entropy(
                    contrast.logits.view(),
                    &contrast.targets,
                    Some(self.config.ignore_index),
                )?;
                losses.insert(
                    LOSS_CENTROID_CONTRAST.to_string(),
                    loss * self.config.contrast_loss_weight,
                );
            }
        }

        self.mode = HeadMode::Accumulating;
        Ok(StepOutput {
            losses,
            clustered: true,
            buffered: self.buffer.len(),
        })
    }

    /// 체크포인트용 상태
    pub fn state(&self) -> HeadState {
        HeadState {
            prototypes: self.store.snapshot().as_ref().clone(),
            cardinality: self.cardinality.clone(),
            feat_norm: self.feat_norm.clone(),
            mask_norm: self.mask_norm.clone(),
        }
    }

    /// 체크포인트 복원. 형태가 구성과 다르면 거부
    pub fn load_state(&mut self, state: HeadState) -> Result<()> {
        state.validate()?;
        let expected = (self.config.num_classes, self.config.max_slots, self.config.embedding_dim);
        ensure!(
            state.prototypes.dim() == expected,
            "체크포인트 프로토타입 형태 {:?} != 구성 {:?}",
            state.prototypes.dim(),
            expected
        );
        self.store.commit(state.prototypes)?;
        self.cardinality = state.cardinality;
        self.feat_norm = state.feat_norm;
        self.mask_norm = state.mask_norm;
        Ok(())
    }
}
