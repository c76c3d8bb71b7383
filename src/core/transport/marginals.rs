use anyhow::{ensure, Result};
use log::warn;

/// 균등 주변분포
pub fn uniform(len: usize) -> Vec<f64> {
    vec![1.0 / len as f64; len]
}

/// 주변분포 확정
///
/// 비어 있으면 해당 차원에 대한 균등 분포로 대체하고 경고를 남긴다.
/// 길이가 맞지 않거나 음수/비유한 값이 있으면 호출자 오류.
pub fn resolve_marginal(given: &[f64], len: usize, axis: &str) -> Result<Vec<f64>> {
    if given.is_empty() {
        warn!("{} 주변분포가 비어 있음, 균등 분포(1/{})로 대체", axis, len);
        return Ok(uniform(len));
    }
    ensure!(
        given.len() == len,
        "{} 주변분포 길이 {} != 행렬 차원 {}",
        axis,
        given.len(),
        len
    );
    ensure!(
        given.iter().all(|&w| w.is_finite() && w >= 0.0),
        "{} 주변분포에 음수 또는 비유한 값이 있음",
        axis
    );
    Ok(given.to_vec())
}
