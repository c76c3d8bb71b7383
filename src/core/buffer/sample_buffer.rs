use anyhow::{ensure, Context, Result};
use ndarray::{concatenate, Array2, ArrayView2, Axis};

/// 스텝 간 (특징, 레이블) 배치 누적기
///
/// 누적 표본 수는 한 주기 안에서 단조 증가하고 `drain()`에서 정확히 0으로 돌아간다.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    dim: usize,
    threshold: usize,
    features: Vec<Array2<f32>>,
    labels: Vec<Vec<usize>>,
    len: usize,
}

impl SampleBuffer {
    pub fn new(dim: usize, threshold: usize) -> Result<Self> {
        ensure!(dim > 0, "임베딩 차원은 양수여야 함");
        ensure!(threshold > 0, "버퍼 임계값은 양수여야 함");
        Ok(Self {
            dim,
            threshold,
            features: Vec::new(),
            labels: Vec::new(),
            len: 0,
        })
    }

    /// 배치 추가 후 누적 표본 수 반환
    pub fn push(&mut self, features: Array2<f32>, labels: Vec<usize>) -> Result<usize> {
        ensure!(
            features.ncols() == self.dim,
            "특징 차원 {} != 버퍼 차원 {}",
            features.ncols(),
            self.dim
        );
        ensure!(
            features.nrows() == labels.len(),
            "특징 {}행과 레이블 {}개 불일치",
            features.nrows(),
            labels.len()
        );
        self.len += labels.len();
        self.features.push(features);
        self.labels.push(labels);
        Ok(self.len)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// 누적된 배치 개수
    pub fn batch_count(&self) -> usize {
        self.features.len()
    }

    /// 누적 표본 수가 임계값 이상인지
    pub fn is_ready(&self) -> bool {
        self.len >= self.threshold
    }

    /// 누적된 전체를 이어 붙여 반환하고 비운다
    pub fn drain(&mut self) -> Result<(Array2<f32>, Vec<usize>)> {
        let features = if self.features.is_empty() {
            Array2::zeros((0, self.dim))
        } else {
            let views: Vec<ArrayView2<f32>> = self.features.iter().map(|f| f.view()).collect();
            concatenate(Axis(0), &views).context("버퍼 배치 연결 실패")?
        };
        let labels = self.labels.concat();
        self.clear();
        Ok((features, labels))
    }

    pub fn clear(&mut self) {
        self.features.clear();
        self.labels.clear();
        self.len = 0;
    }
}
