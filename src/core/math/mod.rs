//! # 수치 보조 연산

pub mod ops;

pub use ops::{argmax_first, l2_normalize, l2_normalize_rows, log_sum_exp, row_argmax, row_softmax};

#[cfg(test)]
pub mod __tests__;
