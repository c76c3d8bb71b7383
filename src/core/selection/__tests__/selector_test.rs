use crate::core::selection::{AdaptiveSelector, CardinalityTable};
use crate::core::transport::SinkhornKnopp;
use ndarray::{Array2, Axis};

/// e0, e1 방향의 두 군집 (각 6점)
fn 두방향_특징() -> Array2<f32> {
    let mut features = Array2::zeros((12, 4));
    for i in 0..6 {
        features[[i, 0]] = 1.0;
        features[[i, 1]] = 0.05 * i as f32;
        features[[6 + i, 1]] = 1.0;
        features[[6 + i, 0]] = 0.05 * i as f32;
    }
    features
}

fn 단위_프로토타입() -> Array2<f32> {
    Array2::eye(4)
}

#[test]
fn 두군집_k2_선택_테스트() {
    let selector = AdaptiveSelector::new(vec![2, 4]).unwrap();
    let mut solver = SinkhornKnopp::new(3, 0.05);
    let mut table = CardinalityTable::new(1, 4, 4).unwrap();
    let features = 두방향_특징();
    let prototypes = 단위_프로토타입();

    let selection = selector
        .select(0, features.view(), prototypes.view(), &mut solver, &mut table)
        .unwrap()
        .expect("표본이 충분하면 선택 수행");

    assert_eq!(selection.slots, 2, "두 군집에는 k=2");
    assert!(selection.score > 0.5, "점수: {}", selection.score);
    assert!(selection.committed);
    assert_eq!(selection.scores.len(), 2);
    assert_eq!(table.slots(0), 2);
    assert_eq!(table.best_score(0), selection.score);
}

#[test]
fn 재선택_비개선_미반영_테스트() {
    let selector = AdaptiveSelector::new(vec![2, 4]).unwrap();
    let mut solver = SinkhornKnopp::new(3, 0.05);
    let mut table = CardinalityTable::new(1, 4, 4).unwrap();
    let features = 두방향_특징();
    let prototypes = 단위_프로토타입();

    selector
        .select(0, features.view(), prototypes.view(), &mut solver, &mut table)
        .unwrap();
    let best = table.best_score(0);

    // 같은 데이터로 다시 선택하면 같은 점수이므로 반영되지 않는다
    let again = selector
        .select(0, features.view(), prototypes.view(), &mut solver, &mut table)
        .unwrap()
        .unwrap();
    assert!(!again.committed);
    assert_eq!(table.best_score(0), best);
}

#[test]
fn 표본부족_건너뛰기_테스트() {
    let selector = AdaptiveSelector::new(vec![2, 4]).unwrap();
    assert_eq!(selector.largest(), 4);
    let mut solver = SinkhornKnopp::new(3, 0.05);
    let mut table = CardinalityTable::new(1, 4, 4).unwrap();
    let features = 두방향_특징().select(Axis(0), &[0, 1, 6, 7]);

    let result = selector
        .select(0, features.view(), 단위_프로토타입().view(), &mut solver, &mut table)
        .unwrap();
    assert!(result.is_none(), "표본 수 <= 최대 후보면 건너뜀");
    assert_eq!(table.slots(0), 4, "테이블 변화 없음");
    assert_eq!(table.best_score(0), -1.0);
}

#[test]
fn 빈후보_거부_테스트() {
    assert!(AdaptiveSelector::new(vec![]).is_err());
    assert!(AdaptiveSelector::new(vec![0, 2]).is_err());
}
