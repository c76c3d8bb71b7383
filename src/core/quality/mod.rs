//! # 군집 품질 평가
//!
//! 후보 할당의 군집 내 응집도와 군집 간 분리도를 비교하는 실루엣 점수

pub mod silhouette;

pub use silhouette::{cosine_distance_matrix, silhouette_score};
