//! # 이산화 모듈
//!
//! 수송 계획(연속 할당)을 원-핫 할당으로 바꾸는 직통 추정기

pub mod gumbel;

pub use gumbel::{one_hot, GumbelDiscretizer, StraightThrough};
