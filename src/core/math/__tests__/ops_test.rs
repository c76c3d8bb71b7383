use crate::core::math::ops::*;
use approx::assert_relative_eq;
use ndarray::{array, Array2};

#[test]
fn argmax_동률_앞선인덱스_테스트() {
    let row = array![0.25f64, 0.25, 0.25, 0.25];
    assert_eq!(argmax_first(row.view()), 0, "동률이면 첫 인덱스");

    let row = array![0.1f64, 0.7, 0.7, 0.2];
    assert_eq!(argmax_first(row.view()), 1, "앞선 최댓값 인덱스");

    let m = array![[1.0f32, 3.0, 2.0], [5.0, 5.0, 0.0]];
    assert_eq!(row_argmax(m.view()), vec![1, 0]);
}

#[test]
fn L2정규화_테스트() {
    let m = array![[3.0f32, 4.0], [0.0, 0.0], [1.0, 0.0]];
    let n = l2_normalize_rows(m.view());

    assert_relative_eq!(n[[0, 0]], 0.6, epsilon = 1e-6);
    assert_relative_eq!(n[[0, 1]], 0.8, epsilon = 1e-6);
    assert_eq!(n[[1, 0]], 0.0, "0 벡터는 0 벡터로 남아야 함");
    assert_eq!(n[[1, 1]], 0.0);
    assert_relative_eq!(n[[2, 0]], 1.0, epsilon = 1e-6);

    let v = l2_normalize(array![2.0f32, 0.0, 0.0].view());
    assert_relative_eq!(v.dot(&v), 1.0, epsilon = 1e-6);
}

#[test]
fn 소프트맥스_행합_및_극단값_테스트() {
    let logits = array![[1.0f64, 2.0, 3.0], [1e6, 0.0, -1e6]];
    let p = row_softmax(logits.view());

    for row in p.rows() {
        assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-12);
        assert!(row.iter().all(|v| v.is_finite()), "큰 로짓에서도 유한해야 함");
    }
    assert_relative_eq!(p[[1, 0]], 1.0, epsilon = 1e-12);

    // 최댓값이 비유한하면 균등 분포
    let bad = Array2::from_elem((1, 4), f64::NEG_INFINITY);
    let p = row_softmax(bad.view());
    assert_relative_eq!(p[[0, 2]], 0.25, epsilon = 1e-12);
}

#[test]
fn log_sum_exp_안정성_테스트() {
    let values = vec![1000.0f64, 1000.0];
    let lse = log_sum_exp(values.iter().copied());
    assert_relative_eq!(lse, 1000.0 + 2f64.ln(), epsilon = 1e-9);

    let small = vec![0.0f64, 0.0, 0.0];
    assert_relative_eq!(log_sum_exp(small.iter().copied()), 3f64.ln(), epsilon = 1e-12);

    assert!(all_finite([1.0f64, 2.0].iter()));
    assert!(!all_finite([1.0f64, f64::NAN].iter()));
    println!("✅ log-sum-exp: {:.6}", lse);
}
