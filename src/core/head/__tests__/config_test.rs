use crate::core::head::HeadConfig;
use crate::core::transport::SolverKind;
use std::io::Write;

#[test]
fn 기본값_테스트() {
    let config = HeadConfig::default();
    assert_eq!(config.embedding_dim, 512);
    assert_eq!(config.num_classes, 100);
    assert_eq!(config.max_slots, 10);
    assert_eq!(config.candidate_slots, vec![2, 4, 6, 8, 10]);
    assert_eq!(config.initial_slots, 4);
    assert_eq!(config.gamma, 0.999);
    assert_eq!(config.temperature, 0.1);
    assert_eq!(config.flush_threshold, 1000);
    assert!(!config.contrast_loss);
    assert_eq!(config.contrast_loss_weight, 0.005);
    assert_eq!(config.ignore_index, 255);
    assert!(config.validate().is_ok());
}

#[test]
fn 클래스수0_거부_테스트() {
    let err = HeadConfig::new(16, 0).validate().unwrap_err();
    assert!(err.to_string().contains("num_classes=0"), "오류 메시지: {}", err);
}

#[test]
fn 잘못된구성_거부_테스트() {
    let base = HeadConfig::new(16, 4).with_slots(4, vec![2, 4], 2);
    assert!(base.clone().validate().is_ok());
    assert!(base.clone().with_slots(4, vec![2, 6], 2).validate().is_err(), "후보가 최대 슬롯 초과");
    assert!(base.clone().with_slots(4, vec![], 2).validate().is_err(), "빈 후보");
    assert!(base.clone().with_slots(4, vec![2], 5).validate().is_err(), "초기 슬롯 초과");
    assert!(base.clone().with_gamma(1.2).validate().is_err());
    assert!(base.clone().with_temperature(0.0).validate().is_err());
    assert!(base.clone().with_flush_threshold(0).validate().is_err());
    assert!(base.with_contrast_loss(true, -1.0).validate().is_err());
}

#[test]
fn 대조타깃_무시값_충돌_거부_테스트() {
    // 100 클래스 x 10 슬롯이면 클래스 25 슬롯 5의 타깃이 255
    let config = HeadConfig::default().with_contrast_loss(true, 0.005);
    let err = config.clone().validate().unwrap_err();
    assert!(err.to_string().contains("ignore_index=255"), "오류 메시지: {}", err);

    assert!(config.with_ignore_index(1000).validate().is_ok(), "범위 밖 무시 값은 허용");
    assert!(HeadConfig::default().validate().is_ok(), "대조 손실이 꺼져 있으면 검사하지 않음");
}

#[test]
fn JSON파일_로드_테스트() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"embedding_dim": 32, "num_classes": 5, "flush_threshold": 64, "solver": {{"kind": "sinkhorn_knopp"}}}}"#
    )
    .unwrap();

    let config = HeadConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.embedding_dim, 32);
    assert_eq!(config.num_classes, 5);
    assert_eq!(config.flush_threshold, 64);
    assert_eq!(config.solver.kind, SolverKind::SinkhornKnopp);
    assert_eq!(config.max_slots, 10, "누락 필드는 기본값");

    let mut bad = tempfile::NamedTempFile::new().unwrap();
    write!(bad, r#"{{"num_classes": 0}}"#).unwrap();
    assert!(HeadConfig::from_json_file(bad.path()).is_err(), "로드 시에도 검증");
}
