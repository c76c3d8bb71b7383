use crate::core::prototypes::{momentum_blend, ClassUpdate, MomentumUpdater};
use approx::assert_relative_eq;
use ndarray::{array, s, Array3};

#[test]
fn 모멘텀_혼합_정확성_테스트() {
    let old = array![[1.0f32, 0.0], [0.0, 1.0]];
    let aggregate = array![[0.0f32, 1.0], [1.0, 0.0]];
    let gamma = 0.9;

    let blended = momentum_blend(old.view(), aggregate.view(), &[3.0, 0.0], gamma).unwrap();
    assert_eq!(blended[[0, 0]], 1.0 * gamma + 0.0 * (1.0 - gamma));
    assert_eq!(blended[[0, 1]], 0.0 * gamma + 1.0 * (1.0 - gamma));
    assert_eq!(blended.row(1), old.row(1), "할당 0인 슬롯은 그대로");

    assert!(momentum_blend(old.view(), aggregate.view(), &[1.0], gamma).is_err());
}

#[test]
fn 할당집계_정답필터_테스트() {
    let features = array![[1.0f32, 0.0], [0.0, 2.0], [3.0, 3.0]];
    let assignment = array![[1.0f32, 0.0], [0.0, 1.0], [1.0, 0.0]];
    let update = ClassUpdate::from_assignments(0, features.view(), assignment.view(), &[true, true, false]).unwrap();

    assert_eq!(update.counts, vec![1.0, 1.0], "틀린 표본은 집계에서 제외");
    assert_eq!(update.aggregate, array![[1.0f32, 0.0], [0.0, 2.0]]);
    assert!(update.has_mass());

    let none = ClassUpdate::from_assignments(0, features.view(), assignment.view(), &[false; 3]).unwrap();
    assert!(!none.has_mass());
}

#[test]
fn 갱신기_미할당슬롯_비트보존_테스트() {
    let mut current = Array3::<f32>::zeros((2, 3, 2));
    current.slice_mut(s![0, 0, ..]).assign(&array![0.6f32, 0.8]);
    current.slice_mut(s![0, 1, ..]).assign(&array![0.28f32, 0.96]);
    current.slice_mut(s![0, 2, ..]).assign(&array![1.0f32, 0.0]);
    current.slice_mut(s![1, 0, ..]).assign(&array![0.0f32, 1.0]);

    let update = ClassUpdate {
        class: 0,
        aggregate: array![[0.0f32, 4.0], [0.0, 0.0]],
        counts: vec![2.0, 0.0],
    };
    let updater = MomentumUpdater::new(0.5).unwrap();
    let next = updater.apply(&current, &[update]).unwrap();

    // 슬롯 0: 0.5 * (0.6, 0.8) + 0.5 * (0, 1) = (0.3, 0.9) 후 정규화
    let norm = (0.3f32 * 0.3 + 0.9 * 0.9).sqrt();
    assert_relative_eq!(next[[0, 0, 0]], 0.3 / norm, epsilon = 1e-6);
    assert_relative_eq!(next[[0, 0, 1]], 0.9 / norm, epsilon = 1e-6);

    // 할당 0인 슬롯, 활성 범위 밖 슬롯, 다른 클래스는 비트 단위로 그대로
    for (c, k) in [(0, 1), (0, 2), (1, 0), (1, 1)] {
        for d in 0..2 {
            assert_eq!(next[[c, k, d]].to_bits(), current[[c, k, d]].to_bits(), "[{}, {}] 보존", c, k);
        }
    }
}

#[test]
fn 감마_경계_테스트() {
    assert!(MomentumUpdater::new(1.5).is_err());
    assert!(MomentumUpdater::new(-0.1).is_err());

    // gamma = 1이면 방향은 바뀌지 않는다
    let mut current = Array3::<f32>::zeros((1, 1, 2));
    current[[0, 0, 0]] = 1.0;
    let update = ClassUpdate {
        class: 0,
        aggregate: array![[0.0f32, 1.0]],
        counts: vec![1.0],
    };
    let next = MomentumUpdater::new(1.0).unwrap().apply(&current, &[update]).unwrap();
    assert_eq!(next, current);
}
