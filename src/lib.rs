//! 서브센트로이드 분류 헤드 라이브러리
//!
//! 클래스별 서브센트로이드를 엔트로피 최적 수송 할당과 모멘텀 갱신으로 학습하고,
//! 실루엣 점수로 클래스마다 서브센트로이드 수를 적응적으로 고른다.

pub mod core;

// 핵심 모듈들 재수출
pub use core::{
    // 헤드와 학습 스텝
    HeadConfig, HeadMode, HeadState, StepOutput, SubCentroidHead,
    // 할당 엔진
    build_solver, GumbelDiscretizer, SolverConfig, SolverKind, StraightThrough, TransportPlan, TransportSolver,
    // 선택과 갱신
    silhouette_score, AdaptiveSelector, CardinalityTable, ClassUpdate, MomentumUpdater, PrototypeStore, Selection,
    // 버퍼와 동기화
    LocalSynchronizer, SampleBuffer, Synchronizer, ThreadGroup,
};
