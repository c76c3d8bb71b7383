//! 헤드 체크포인트 상태
//!
//! 프로토타입, 카디널리티/최고 점수 테이블, 레이어 정규화 파라미터를
//! bincode 또는 JSON으로 저장하고 그대로 복원한다.

use anyhow::{ensure, Context, Result};
use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::layer_norm::LayerNorm;
use crate::core::selection::CardinalityTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadState {
    /// [클래스, 최대 슬롯, 임베딩]
    pub prototypes: Array3<f32>,
    pub cardinality: CardinalityTable,
    pub feat_norm: LayerNorm,
    pub mask_norm: LayerNorm,
}

impl HeadState {
    /// 내부 형태 일관성 검사
    pub fn validate(&self) -> Result<()> {
        let (classes, max_slots, dim) = self.prototypes.dim();
        self.cardinality.validate()?;
        ensure!(
            self.cardinality.num_classes() == classes,
            "카디널리티 클래스 수 {} != 프로토타입 클래스 수 {}",
            self.cardinality.num_classes(),
            classes
        );
        ensure!(
            self.cardinality.max_slots() == max_slots,
            "카디널리티 최대 슬롯 {} != 프로토타입 슬롯 {}",
            self.cardinality.max_slots(),
            max_slots
        );
        ensure!(self.feat_norm.size() == dim, "feat_norm 차원 {} != {}", self.feat_norm.size(), dim);
        ensure!(
            self.mask_norm.size() == classes,
            "mask_norm 차원 {} != {}",
            self.mask_norm.size(),
            classes
        );
        Ok(())
    }

    pub fn save_bincode<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("체크포인트 생성 실패: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self).context("체크포인트 직렬화 실패")?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_bincode<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("체크포인트 열기 실패: {}", path.display()))?;
        let state: Self = bincode::deserialize_from(BufReader::new(file)).context("체크포인트 역직렬화 실패")?;
        state.validate()?;
        Ok(state)
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("체크포인트 생성 실패: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self).context("체크포인트 JSON 직렬화 실패")?;
        writer.flush()?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("체크포인트 열기 실패: {}", path.display()))?;
        let state: Self = serde_json::from_reader(BufReader::new(file)).context("체크포인트 JSON 파싱 실패")?;
        state.validate()?;
        Ok(state)
    }
}
