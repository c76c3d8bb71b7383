//! # 행렬 보조 연산
//!
//! 군집 헤드 전반에서 공유하는 정규화, argmax, 소프트맥스 연산들

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, Axis};

/// L2 정규화 분모 하한 (0 벡터는 0 벡터로 남는다)
pub const NORM_EPSILON: f32 = 1e-12;

/// 단일 벡터 L2 정규화
pub fn l2_normalize(v: ArrayView1<f32>) -> Array1<f32> {
    let norm = v.dot(&v).sqrt().max(NORM_EPSILON);
    v.mapv(|x| x / norm)
}

/// 벡터를 제자리에서 단위 길이로 맞춤
pub fn l2_normalize_in_place(mut v: ArrayViewMut1<f32>) {
    let norm = v.dot(&v).sqrt().max(NORM_EPSILON);
    v.mapv_inplace(|x| x / norm);
}

/// 행 단위 L2 정규화
pub fn l2_normalize_rows(m: ArrayView2<f32>) -> Array2<f32> {
    let mut out = m.to_owned();
    for row in out.axis_iter_mut(Axis(0)) {
        l2_normalize_in_place(row);
    }
    out
}

/// 최댓값 인덱스. 동률이면 앞선 인덱스가 이긴다
pub fn argmax_first<T: PartialOrd + Copy>(row: ArrayView1<T>) -> usize {
    let mut best = 0;
    for (idx, &value) in row.iter().enumerate().skip(1) {
        if value > row[best] {
            best = idx;
        }
    }
    best
}

/// 행별 argmax
pub fn row_argmax<T: PartialOrd + Copy>(m: ArrayView2<T>) -> Vec<usize> {
    m.axis_iter(Axis(0)).map(argmax_first).collect()
}

/// 수치적으로 안정한 log-sum-exp
pub fn log_sum_exp<I: IntoIterator<Item = f64> + Clone>(values: I) -> f64 {
    let max = values.clone().into_iter().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = values.into_iter().map(|v| (v - max).exp()).sum();
    max + sum.ln()
}

/// 행별 소프트맥스 (최댓값 이동으로 오버플로 방지)
pub fn row_softmax(logits: ArrayView2<f64>) -> Array2<f64> {
    let mut out = logits.to_owned();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            let width = row.len() as f64;
            row.fill(1.0 / width);
            continue;
        }
        row.mapv_inplace(|x| (x - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|x| x / sum);
    }
    out
}

/// 모든 원소가 유한한지 확인
pub fn all_finite<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> bool {
    values.into_iter().all(|v| v.is_finite())
}
