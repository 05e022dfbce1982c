//! # Episode 统计
//!
//! 逐目标轴的误差均值 / 标准差 / 最大值与正确率（可选模块）。
//!
//! 需要启用 `statistics` feature：
//! ```toml
//! tactile-tools = { workspace = true, features = ["statistics"] }
//! ```

use crate::recording::EpisodeRecording;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;
use tactile_codec::{AccuracyTable, ErrorTable};

/// 单个目标标签的统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStatistics {
    pub name: String,
    pub mean_error: f64,
    /// 总体标准差
    pub std_error: f64,
    pub max_error: f64,
    /// 正确率（0..=1）
    pub accuracy: f64,
}

impl LabelStatistics {
    fn calculate(name: &str, errors: &[f64], correct: &[bool]) -> Self {
        let (mean_error, std_error, max_error) = if errors.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            (
                errors.mean(),
                errors.population_std_dev(),
                errors.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            )
        };

        Self {
            name: name.to_string(),
            mean_error,
            std_error,
            max_error,
            accuracy: rate(correct),
        }
    }
}

/// Episode 统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeStatistics {
    pub steps: usize,
    pub labels: Vec<LabelStatistics>,
    /// 所有目标同时正确的比例
    pub overall_accuracy: f64,
}

impl EpisodeStatistics {
    /// 由误差表与精度表计算
    pub fn from_tables(errors: &ErrorTable, accuracy: &AccuracyTable) -> Self {
        let labels = errors
            .label_names()
            .iter()
            .map(|name| {
                let correct: Vec<bool> = accuracy
                    .rows()
                    .iter()
                    .filter_map(|row| row.per_label.get(name).copied())
                    .collect();
                LabelStatistics::calculate(name, &errors.column(name), &correct)
            })
            .collect();

        Self {
            steps: errors.len(),
            labels,
            overall_accuracy: accuracy.overall_rate().unwrap_or(0.0),
        }
    }

    /// 由录制文件计算
    pub fn from_recording(recording: &EpisodeRecording) -> Self {
        let labels = recording
            .metadata
            .target_label_names
            .iter()
            .map(|name| {
                let errors = recording.target_error_column(name).unwrap_or_default();
                let correct = recording.target_correct_column(name).unwrap_or_default();
                LabelStatistics::calculate(name, &errors, &correct)
            })
            .collect();
        let overall: Vec<bool> = recording.steps.iter().map(|s| s.overall_correct).collect();

        Self {
            steps: recording.step_count(),
            labels,
            overall_accuracy: rate(&overall),
        }
    }

    pub fn label(&self, name: &str) -> Option<&LabelStatistics> {
        self.labels.iter().find(|l| l.name == name)
    }
}

impl fmt::Display for EpisodeStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "steps: {}", self.steps)?;
        writeln!(
            f,
            "{:<6} {:>10} {:>10} {:>10} {:>9}",
            "label", "mean", "std", "max", "accuracy"
        )?;
        for label in &self.labels {
            writeln!(
                f,
                "{:<6} {:>10.4} {:>10.4} {:>10.4} {:>8.1}%",
                label.name,
                label.mean_error,
                label.std_error,
                label.max_error,
                label.accuracy * 100.0
            )?;
        }
        write!(f, "overall accuracy: {:.1}%", self.overall_accuracy * 100.0)
    }
}

fn rate(hits: &[bool]) -> f64 {
    if hits.is_empty() {
        return 0.0;
    }
    hits.iter().filter(|&&h| h).count() as f64 / hits.len() as f64
}
