//! ErrorMetric - 逐轴误差与精度
//!
//! - 非周期轴：绝对差
//! - 周期轴：`|atan2(sin Δ, cos Δ)|`，即圆周上的最短角距离，范围 `[0°, 180°]`
//!
//! 例如参考值 `179°` 与观测值 `-179°` 的误差为 `2°` 而不是 `358°`。
//!
//! 精度：误差**严格小于**阈值才计为正确；`overall` 为所有目标轴的逻辑与。

use crate::error::CodecError;
use crate::label::{LabelSpec, PerLabel};
use crate::units::Deg;
use serde::Serialize;
use std::sync::Arc;

/// 单个样本的精度结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyRow {
    /// 每个目标轴是否正确
    pub per_label: PerLabel<bool>,
    /// 所有目标轴均正确
    pub overall: bool,
}

/// 误差表（每行一个样本，列为目标标签）
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ErrorTable {
    rows: Vec<PerLabel<f64>>,
}

impl ErrorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: PerLabel<f64>) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[PerLabel<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 取出某一列
    pub fn column(&self, name: &str) -> Vec<f64> {
        self.rows
            .iter()
            .filter_map(|row| row.get(name).copied())
            .collect()
    }

    /// 列名（取自第一行）
    pub fn label_names(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.names().to_vec())
            .unwrap_or_default()
    }
}

/// 精度表
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AccuracyTable {
    rows: Vec<AccuracyRow>,
}

impl AccuracyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: AccuracyRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[AccuracyRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 某一列的正确率（0..=1），空表返回 `None`
    pub fn rate(&self, name: &str) -> Option<f64> {
        let hits: Vec<bool> = self
            .rows
            .iter()
            .filter_map(|row| row.per_label.get(name).copied())
            .collect();
        ratio(&hits)
    }

    /// 整体正确率
    pub fn overall_rate(&self) -> Option<f64> {
        let hits: Vec<bool> = self.rows.iter().map(|row| row.overall).collect();
        ratio(&hits)
    }
}

fn ratio(hits: &[bool]) -> Option<f64> {
    if hits.is_empty() {
        return None;
    }
    let correct = hits.iter().filter(|&&h| h).count();
    Some(correct as f64 / hits.len() as f64)
}

/// 圆周最短角距离（度），范围 `[0, 180]`
pub fn angular_distance(reference_deg: f64, observed_deg: f64) -> f64 {
    Deg(reference_deg).distance(Deg(observed_deg))
}

/// 误差度量
#[derive(Debug, Clone)]
pub struct ErrorMetric {
    spec: Arc<LabelSpec>,
}

impl ErrorMetric {
    pub fn new(spec: Arc<LabelSpec>) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &LabelSpec {
        &self.spec
    }

    /// 逐目标轴的绝对误差
    ///
    /// `reference` 与 `prediction` 均以全部 `label_names` 为键（同一 `LabelSpec` 构造）。
    pub fn error(&self, reference: &PerLabel<f64>, prediction: &PerLabel<f64>) -> PerLabel<f64> {
        let mut row = self.spec.target_table(0.0);
        for (i, target) in self.spec.targets().iter().enumerate() {
            let r = reference.at(target.label_index).copied().unwrap_or(0.0);
            let p = prediction.at(target.label_index).copied().unwrap_or(0.0);
            let err = if target.periodic {
                angular_distance(r, p)
            } else {
                (r - p).abs()
            };
            row.set_at(i, err);
        }
        row
    }

    /// 按阈值判定精度（严格小于）
    pub fn accuracy(&self, error: &PerLabel<f64>) -> AccuracyRow {
        let mut per_label = self.spec.target_table(false);
        let mut overall = true;
        for (i, target) in self.spec.targets().iter().enumerate() {
            let correct = error
                .at(i)
                .is_some_and(|&err| err < target.tolerance);
            overall &= correct;
            per_label.set_at(i, correct);
        }
        AccuracyRow { per_label, overall }
    }

    /// 批量指标：误差表 + 精度表
    pub fn batch_metrics(
        &self,
        labels: &[PerLabel<f64>],
        predictions: &[PerLabel<f64>],
    ) -> Result<(ErrorTable, AccuracyTable), CodecError> {
        if labels.len() != predictions.len() {
            return Err(CodecError::BatchLength {
                labels: labels.len(),
                predictions: predictions.len(),
            });
        }

        let mut errors = ErrorTable::new();
        let mut accuracy = AccuracyTable::new();
        for (label, prediction) in labels.iter().zip(predictions) {
            let err = self.error(label, prediction);
            accuracy.push(self.accuracy(&err));
            errors.push(err);
        }
        Ok((errors, accuracy))
    }
}
