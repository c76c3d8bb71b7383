//! # 서브센트로이드 핵심 모듈
//!
//! 최적 수송 할당, 이산화, 군집 품질 평가, 카디널리티 선택,
//! 프로토타입 저장/갱신, 표본 버퍼, 분산 동기화, 분류 헤드

pub mod buffer;
pub mod discretize;
pub mod head;
pub mod math;
pub mod prototypes;
pub mod quality;
pub mod selection;
pub mod sync;
pub mod transport;

// 주요 타입들 재수출
pub use buffer::SampleBuffer;
pub use discretize::{GumbelDiscretizer, StraightThrough};
pub use head::{HeadConfig, HeadMode, HeadState, StepOutput, SubCentroidHead};
pub use prototypes::{ClassUpdate, MomentumUpdater, PrototypeStore};
pub use quality::silhouette_score;
pub use selection::{AdaptiveSelector, CardinalityTable, Selection};
pub use sync::{LocalSynchronizer, Synchronizer, ThreadGroup};
pub use transport::{build_solver, SolverConfig, SolverKind, TransportPlan, TransportSolver};
