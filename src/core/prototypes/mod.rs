//! # 프로토타입 저장소와 모멘텀 갱신
//!
//! 클래스별 서브센트로이드 테이블, 활성 슬롯 마스크 뷰, EMA 갱신

pub mod momentum;
pub mod store;

pub use momentum::{momentum_blend, ClassUpdate, MomentumUpdater};
pub use store::{normalized, truncated_normal, PrototypeStore};

#[cfg(test)]
pub mod __tests__;
