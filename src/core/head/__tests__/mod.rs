pub mod checkpoint_test;
pub mod config_test;

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// 클래스마다 다른 평균을 갖는 가우시안 혼합 배치
pub fn 혼합_배치(rows: usize, dim: usize, classes: usize, seed: u64) -> (Array2<f32>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0f32, 0.3).unwrap();
    let labels: Vec<usize> = (0..rows).map(|i| i % classes).collect();
    let features = Array2::from_shape_fn((rows, dim), |(i, j)| {
        let center = if j % classes == labels[i] { 2.0 } else { 0.0 };
        center + noise.sample(&mut rng)
    });
    (features, labels)
}
