use anyhow::Result;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3};

use super::Synchronizer;

/// 단일 워커: 모든 집합 통신이 항등 연산
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSynchronizer;

impl Synchronizer for LocalSynchronizer {
    fn world_size(&self) -> usize {
        1
    }

    fn rank(&self) -> usize {
        0
    }

    fn gather(&self, tensor: ArrayView2<f32>) -> Result<Array2<f32>> {
        Ok(tensor.to_owned())
    }

    fn gather_labels(&self, labels: &[usize]) -> Result<Vec<usize>> {
        Ok(labels.to_vec())
    }

    fn average_reduce(&self, tensor: ArrayView3<f32>) -> Result<Array3<f32>> {
        Ok(tensor.to_owned())
    }
}
