//! # Episode 录制格式
//!
//! 伺服 episode 的逐步记录，供离线分析与绘图：
//!
//! ```text
//! [MAGIC: 8 bytes]
//! [Version: 1 byte]
//! [Data: bincode serialized EpisodeRecording]
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tactile_codec::{LabelSpec, PoseVector};
use tactile_control::{ControlParams, EpisodeOutcome, EpisodeReport, Se3ErrorKind, StepRecord, Task};

/// 录制文件魔数
pub const MAGIC: &[u8; 8] = b"TSERVO1\0";

/// 当前格式版本
pub const FORMAT_VERSION: u8 = 1;

/// 录制元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    /// 录制开始时间（Unix 时间戳，秒）
    pub start_time: u64,
    pub task: Task,
    pub error_kind: Se3ErrorKind,
    pub ref_pose: PoseVector,
    /// 预测向量的列名（全部标签）
    pub label_names: Vec<String>,
    /// 误差 / 精度的列名（目标标签）
    pub target_label_names: Vec<String>,
    /// 备注
    pub notes: String,
}

impl RecordingMetadata {
    pub fn new(task: Task, spec: &LabelSpec, params: &ControlParams) -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};

        Self {
            start_time: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            task,
            error_kind: params.error_kind(),
            ref_pose: *params.ref_pose(),
            label_names: spec.label_names().to_vec(),
            target_label_names: spec.target_label_names().to_vec(),
            notes: String::new(),
        }
    }
}

/// 录制的 episode 结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RecordedOutcome {
    Completed,
    Succeeded { step: u64 },
    Aborted { step: u64, reason: String },
}

impl From<&EpisodeOutcome> for RecordedOutcome {
    fn from(outcome: &EpisodeOutcome) -> Self {
        match outcome {
            EpisodeOutcome::Completed => RecordedOutcome::Completed,
            EpisodeOutcome::Succeeded { step } => RecordedOutcome::Succeeded { step: *step as u64 },
            EpisodeOutcome::Aborted { step, reason } => RecordedOutcome::Aborted {
                step: *step as u64,
                reason: reason.to_string(),
            },
        }
    }
}

/// 单步记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedStep {
    pub step: u64,
    /// 解码后的预测（按 `label_names` 排列）
    pub prediction: Vec<f64>,
    pub error: PoseVector,
    pub control_output: PoseVector,
    pub integral: PoseVector,
    pub tcp_pose: PoseVector,
    /// 目标标签误差（按 `target_label_names` 排列）
    pub target_errors: Vec<f64>,
    /// 目标标签是否在阈值内
    pub target_correct: Vec<bool>,
    pub overall_correct: bool,
}

/// Episode 录制文件 v1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecording {
    pub version: u8,
    pub metadata: RecordingMetadata,
    pub outcome: RecordedOutcome,
    pub steps: Vec<RecordedStep>,
    /// 饱和告警（文本）
    pub warnings: Vec<String>,
}

impl EpisodeRecording {
    pub fn new(metadata: RecordingMetadata, outcome: RecordedOutcome) -> Self {
        Self {
            version: FORMAT_VERSION,
            metadata,
            outcome,
            steps: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// 由 episode 报告构造
    pub fn from_report(metadata: RecordingMetadata, report: &EpisodeReport) -> Self {
        let mut recording = Self::new(metadata, RecordedOutcome::from(&report.outcome));

        let rows = report.errors.rows().iter().zip(report.accuracy.rows());
        for (record, (errors, accuracy)) in report.steps.iter().zip(rows) {
            recording.add_step(RecordedStep {
                target_errors: errors.values().to_vec(),
                target_correct: accuracy.per_label.values().to_vec(),
                overall_correct: accuracy.overall,
                ..RecordedStep::from(record)
            });
        }
        recording.warnings = report.warnings.iter().map(ToString::to_string).collect();
        recording
    }

    pub fn add_step(&mut self, step: RecordedStep) {
        self.steps.push(step);
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// 某个目标标签的误差序列
    pub fn target_error_column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self
            .metadata
            .target_label_names
            .iter()
            .position(|n| n == name)?;
        Some(
            self.steps
                .iter()
                .filter_map(|step| step.target_errors.get(index).copied())
                .collect(),
        )
    }

    /// 某个目标标签的正确性序列
    pub fn target_correct_column(&self, name: &str) -> Option<Vec<bool>> {
        let index = self
            .metadata
            .target_label_names
            .iter()
            .position(|n| n == name)?;
        Some(
            self.steps
                .iter()
                .filter_map(|step| step.target_correct.get(index).copied())
                .collect(),
        )
    }

    /// 保存到文件
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create recording {}", path.display()))?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC).context("Failed to write magic")?;
        writer.write_all(&[self.version]).context("Failed to write version")?;

        let data = bincode::serialize(self).context("Failed to serialize recording")?;
        writer.write_all(&data).context("Failed to write recording data")?;
        writer.flush().context("Failed to flush recording")?;

        Ok(())
    }

    /// 从文件加载
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open recording {}", path.display()))?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 8];
        reader.read_exact(&mut magic).context("Failed to read magic")?;
        if &magic != MAGIC {
            anyhow::bail!("Not an episode recording (magic mismatch)");
        }

        let mut version = [0u8; 1];
        reader.read_exact(&mut version).context("Failed to read version")?;
        if version[0] != FORMAT_VERSION {
            anyhow::bail!("Unsupported recording version: {}", version[0]);
        }

        let mut data = Vec::new();
        reader.read_to_end(&mut data).context("Failed to read recording data")?;
        let recording: EpisodeRecording =
            bincode::deserialize(&data).context("Failed to deserialize recording")?;

        Ok(recording)
    }
}

impl From<&StepRecord> for RecordedStep {
    fn from(record: &StepRecord) -> Self {
        Self {
            step: record.step as u64,
            prediction: record.prediction.values().to_vec(),
            error: record.error,
            control_output: record.control_output,
            integral: record.integral,
            tcp_pose: record.tcp_pose,
            target_errors: Vec::new(),
            target_correct: Vec::new(),
            overall_correct: false,
        }
    }
}
