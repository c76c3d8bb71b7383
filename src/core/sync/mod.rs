//! # 분산 동기화
//!
//! 워커 간 집합 통신(all-gather, 평균 all-reduce)을 주입 가능한 능력으로 표현.
//! 모든 호출은 동기화 장벽이므로 모든 워커가 같은 스텝에서 같은 순서로 호출해야 한다.

pub mod local;
pub mod thread_group;

pub use local::LocalSynchronizer;
pub use thread_group::ThreadGroup;

use anyhow::Result;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3};

pub trait Synchronizer: Send + Sync {
    fn world_size(&self) -> usize;

    fn rank(&self) -> usize;

    /// 모든 워커의 [N, D] 배치를 랭크 순서로 행 방향 연결
    fn gather(&self, tensor: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// 모든 워커의 레이블을 랭크 순서로 연결
    fn gather_labels(&self, labels: &[usize]) -> Result<Vec<usize>>;

    /// 모든 워커 텐서의 원소별 평균
    fn average_reduce(&self, tensor: ArrayView3<f32>) -> Result<Array3<f32>>;
}
