//! # 표본 버퍼
//!
//! 학습 배치 크기와 군집 갱신 배치 크기를 분리하는 누적기

pub mod sample_buffer;

pub use sample_buffer::SampleBuffer;
