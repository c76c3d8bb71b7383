//! # 적응적 카디널리티 선택
//!
//! 클래스별 서브센트로이드 수 테이블과 실루엣 기반 모델 선택

pub mod cardinality;
pub mod selector;

pub use cardinality::{CardinalityTable, INITIAL_BEST_SCORE};
pub use selector::{AdaptiveSelector, Selection};

#[cfg(test)]
pub mod __tests__;
