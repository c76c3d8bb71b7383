//! 프로토타입 저장소 [클래스, 슬롯, 임베딩]
//!
//! 읽기는 `snapshot()`으로 얻은 불변 스냅샷을, 쓰기는 `commit()`으로 테이블
//! 전체를 원자적으로 교체한다. 독자는 갱신 전 또는 갱신 후 테이블만 본다.

use anyhow::{ensure, Result};
use ndarray::{s, Array3, Axis};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::sync::Arc;

use crate::core::math::ops::l2_normalize_in_place;
use crate::core::selection::CardinalityTable;

/// 절단 정규분포 경계 (절댓값)
pub const TRUNC_BOUND: f32 = 2.0;

#[derive(Debug)]
pub struct PrototypeStore {
    table: RwLock<Arc<Array3<f32>>>,
}

/// 평균 0, 표준편차 `std`, [-bound, bound] 밖은 다시 뽑는 절단 정규분포
pub fn truncated_normal(
    shape: (usize, usize, usize),
    std: f32,
    bound: f32,
    seed: u64,
) -> Result<Array3<f32>> {
    ensure!(std > 0.0 && std.is_finite(), "초기화 표준편차는 양수여야 함: {}", std);
    ensure!(bound > 0.0, "절단 경계는 양수여야 함: {}", bound);
    let normal = Normal::new(0.0f32, std)?;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(Array3::from_shape_simple_fn(shape, || loop {
        let x = normal.sample(&mut rng);
        if x.abs() <= bound {
            break x;
        }
    }))
}

impl PrototypeStore {
    /// 절단 정규분포로 초기화 후 단위 정규화
    pub fn new(num_classes: usize, max_slots: usize, dim: usize, init_std: f32, seed: u64) -> Result<Self> {
        ensure!(
            num_classes > 0 && max_slots > 0 && dim > 0,
            "프로토타입 형태가 잘못됨: [{}, {}, {}]",
            num_classes,
            max_slots,
            dim
        );
        let table = truncated_normal((num_classes, max_slots, dim), init_std, TRUNC_BOUND, seed)?;
        Ok(Self::from_table(normalized(&table)))
    }

    pub fn from_table(table: Array3<f32>) -> Self {
        Self {
            table: RwLock::new(Arc::new(table)),
        }
    }

    /// (클래스 수, 최대 슬롯 수, 임베딩 차원)
    pub fn shape(&self) -> (usize, usize, usize) {
        self.table.read().dim()
    }

    pub fn snapshot(&self) -> Arc<Array3<f32>> {
        Arc::clone(&self.table.read())
    }

    /// 테이블 전체 교체. 형태가 다르면 거부
    pub fn commit(&self, table: Array3<f32>) -> Result<()> {
        let expected = self.shape();
        ensure!(
            table.dim() == expected,
            "프로토타입 형태 {:?} != 기대 형태 {:?}",
            table.dim(),
            expected
        );
        *self.table.write() = Arc::new(table);
        Ok(())
    }

    /// 모든 슬롯을 단위 길이로 맞춘 테이블로 교체
    pub fn normalize(&self) {
        let current = self.snapshot();
        let next = normalized(&current);
        *self.table.write() = Arc::new(next);
    }

    /// 활성 슬롯만 남기고 나머지를 0으로 둔 읽기 전용 사본
    pub fn masked(&self, cardinality: &CardinalityTable) -> Result<Array3<f32>> {
        let mut view = self.snapshot().as_ref().clone();
        let (classes, max_slots, _) = view.dim();
        ensure!(
            cardinality.num_classes() == classes,
            "카디널리티 클래스 수 {} != 프로토타입 클래스 수 {}",
            cardinality.num_classes(),
            classes
        );
        for class in 0..classes {
            let active = cardinality.slots(class).min(max_slots);
            view.slice_mut(s![class, active.., ..]).fill(0.0);
        }
        Ok(view)
    }
}

/// 모든 [클래스, 슬롯] 벡터를 단위 길이로 정규화한 사본
pub fn normalized(table: &Array3<f32>) -> Array3<f32> {
    let mut out = table.clone();
    for mut class in out.axis_iter_mut(Axis(0)) {
        for slot in class.axis_iter_mut(Axis(0)) {
            l2_normalize_in_place(slot);
        }
    }
    out
}
