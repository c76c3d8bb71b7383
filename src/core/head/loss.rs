use anyhow::{ensure, Result};
use ndarray::{ArrayView2, Axis};
use std::collections::BTreeMap;

/// 이름 붙은 스칼라 손실 모음
pub type LossMap = BTreeMap<String, f32>;

pub const LOSS_CLS: &str = "loss_cls";
pub const LOSS_CENTROID_CONTRAST: &str = "loss_centroid_contrast";

/// 평균 교차 엔트로피 (log-softmax, 최댓값 이동)
///
/// `ignore_index`와 같은 타깃은 평균에서 제외한다. 모두 제외되면 0.
pub fn cross_entropy(logits: ArrayView2<f32>, targets: &[usize], ignore_index: Option<usize>) -> Result<f32> {
    ensure!(
        logits.nrows() == targets.len(),
        "로짓 {}행과 타깃 {}개 불일치",
        logits.nrows(),
        targets.len()
    );
    let classes = logits.ncols();
    let mut total = 0.0f64;
    let mut counted = 0usize;

    for (row, &target) in logits.axis_iter(Axis(0)).zip(targets) {
        if Some(target) == ignore_index {
            continue;
        }
        ensure!(target < classes, "타깃 {}가 클래스 수 {} 범위를 벗어남", target, classes);
        let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max) as f64;
        let log_sum: f64 = row.iter().map(|&x| (x as f64 - max).exp()).sum::<f64>().ln() + max;
        total += log_sum - row[target] as f64;
        counted += 1;
    }

    if counted == 0 {
        return Ok(0.0);
    }
    Ok((total / counted as f64) as f32)
}
