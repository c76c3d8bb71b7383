//! # 서브센트로이드 헤드 모듈
//!
//! 구성, 정규화, 손실, 학습 스텝 순환, 체크포인트

pub mod checkpoint;
pub mod config;
pub mod head;
pub mod layer_norm;
pub mod loss;

pub use checkpoint::HeadState;
pub use config::HeadConfig;
pub use head::{ContrastOutput, ForwardOutput, HeadMode, StepOutput, SubCentroidHead};
pub use layer_norm::LayerNorm;
pub use loss::{cross_entropy, LossMap, LOSS_CENTROID_CONTRAST, LOSS_CLS};

#[cfg(test)]
pub mod __tests__;
