//! 프로세스 내 워커 그룹
//!
//! 각 워커 스레드가 자기 랭크의 `ThreadGroup` 핸들을 갖는다. 집합 통신은
//! 공유 슬롯에 값을 쓰고 장벽에서 만난 뒤 전체를 읽고, 다시 장벽에서 만나
//! 다음 라운드가 슬롯을 덮어쓰기 전에 모두 읽었음을 보장한다.

use anyhow::{anyhow, ensure, Context, Result};
use ndarray::{concatenate, Array2, Array3, ArrayView2, ArrayView3, Axis};
use parking_lot::Mutex;
use std::sync::{Arc, Barrier};

use super::Synchronizer;

struct GroupState {
    world_size: usize,
    barrier: Barrier,
    features: Mutex<Vec<Option<Array2<f32>>>>,
    labels: Mutex<Vec<Option<Vec<usize>>>>,
    tables: Mutex<Vec<Option<Array3<f32>>>>,
}

pub struct ThreadGroup {
    state: Arc<GroupState>,
    rank: usize,
}

impl ThreadGroup {
    /// 랭크 0..world_size 핸들 생성
    pub fn create(world_size: usize) -> Result<Vec<ThreadGroup>> {
        ensure!(world_size > 0, "워커 수는 양수여야 함");
        let state = Arc::new(GroupState {
            world_size,
            barrier: Barrier::new(world_size),
            features: Mutex::new(vec![None; world_size]),
            labels: Mutex::new(vec![None; world_size]),
            tables: Mutex::new(vec![None; world_size]),
        });
        Ok((0..world_size)
            .map(|rank| ThreadGroup {
                state: Arc::clone(&state),
                rank,
            })
            .collect())
    }

    fn exchange<T: Clone>(&self, slots: &Mutex<Vec<Option<T>>>, value: T) -> Result<Vec<T>> {
        slots.lock()[self.rank] = Some(value);
        self.state.barrier.wait();
        let gathered = slots
            .lock()
            .iter()
            .enumerate()
            .map(|(rank, slot)| slot.clone().ok_or_else(|| anyhow!("랭크 {}의 값이 없음", rank)))
            .collect::<Result<Vec<T>>>();
        self.state.barrier.wait();
        gathered
    }
}

impl Synchronizer for ThreadGroup {
    fn world_size(&self) -> usize {
        self.state.world_size
    }

    fn rank(&self) -> usize {
        self.rank
    }

    fn gather(&self, tensor: ArrayView2<f32>) -> Result<Array2<f32>> {
        let parts = self.exchange(&self.state.features, tensor.to_owned())?;
        let views: Vec<ArrayView2<f32>> = parts.iter().map(|p| p.view()).collect();
        concatenate(Axis(0), &views).context("워커 배치 연결 실패 (차원 불일치)")
    }

    fn gather_labels(&self, labels: &[usize]) -> Result<Vec<usize>> {
        Ok(self.exchange(&self.state.labels, labels.to_vec())?.concat())
    }

    fn average_reduce(&self, tensor: ArrayView3<f32>) -> Result<Array3<f32>> {
        let parts = self.exchange(&self.state.tables, tensor.to_owned())?;
        let mut sum = Array3::<f32>::zeros(tensor.dim());
        for part in &parts {
            ensure!(part.dim() == sum.dim(), "워커 텐서 형태 불일치: {:?} != {:?}", part.dim(), sum.dim());
            sum += part;
        }
        Ok(sum / self.state.world_size as f32)
    }
}
