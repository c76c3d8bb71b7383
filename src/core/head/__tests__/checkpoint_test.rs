use super::혼합_배치;
use crate::core::head::{HeadConfig, HeadState, SubCentroidHead};
use crate::core::sync::LocalSynchronizer;

fn 학습된_헤드() -> SubCentroidHead {
    let config = HeadConfig::new(6, 2).with_slots(4, vec![2, 4], 2).with_flush_threshold(100);
    let mut head = SubCentroidHead::new(config, Box::new(LocalSynchronizer)).unwrap();
    let (x, y) = 혼합_배치(100, 6, 2, 5);
    head.train_step(x.view(), &y).unwrap();
    head
}

#[test]
fn bincode_저장_복원_테스트() {
    let head = 학습된_헤드();
    let state = head.state();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("head.bin");

    state.save_bincode(&path).unwrap();
    let loaded = HeadState::load_bincode(&path).unwrap();
    assert_eq!(loaded, state, "저장한 상태 그대로 복원");

    let config = head.config().clone();
    let mut fresh = SubCentroidHead::new(config, Box::new(LocalSynchronizer)).unwrap();
    fresh.load_state(loaded).unwrap();
    assert_eq!(fresh.cardinality(), head.cardinality());

    let (x, _) = 혼합_배치(10, 6, 2, 9);
    assert_eq!(fresh.forward(x.view()).unwrap(), head.forward(x.view()).unwrap(), "복원 후 같은 예측");
}

#[test]
fn JSON_저장_복원_테스트() {
    let state = 학습된_헤드().state();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("head.json");

    state.save_json(&path).unwrap();
    let loaded = HeadState::load_json(&path).unwrap();
    assert_eq!(loaded.cardinality, state.cardinality, "최고 점수 비트 단위 보존");
    assert_eq!(loaded.prototypes, state.prototypes);
    assert_eq!(loaded, state);
}

#[test]
fn JSON_최고점수_엄격비교_보존_테스트() {
    let state = 학습된_헤드().state();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("head.json");
    state.save_json(&path).unwrap();
    let mut loaded = HeadState::load_json(&path).unwrap();

    // 복원된 최고 점수와 같은 점수는 엄격 개선이 아니므로 커밋되지 않아야 한다
    for (class, &best) in state.cardinality.best_scores().iter().enumerate() {
        assert_eq!(loaded.cardinality.best_scores()[class].to_bits(), best.to_bits());
        assert!(!loaded.cardinality.offer(class, 2, best).unwrap(), "클래스 {} 동점 커밋", class);
    }
}

#[test]
fn 형태불일치_복원거부_테스트() {
    let state = 학습된_헤드().state();
    let other = HeadConfig::new(6, 3).with_slots(4, vec![2, 4], 2);
    let mut head = SubCentroidHead::new(other, Box::new(LocalSynchronizer)).unwrap();
    assert!(head.load_state(state).is_err(), "클래스 수가 다른 체크포인트 거부");

    let dir = tempfile::tempdir().unwrap();
    assert!(HeadState::load_bincode(dir.path().join("missing.bin")).is_err());
}
