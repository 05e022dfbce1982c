//! 统计命令
//!
//! 读取 episode 录制文件并打印逐目标统计

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tactile_tools::{EpisodeRecording, EpisodeStatistics, RecordedOutcome};

/// 统计命令参数
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// 录制文件路径
    pub recording: PathBuf,

    /// 以 JSON 输出
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    /// 执行统计
    pub fn execute(&self) -> Result<()> {
        let recording = EpisodeRecording::load(&self.recording)?;
        let stats = EpisodeStatistics::from_recording(&recording);

        if self.json {
            let text = serde_json::to_string_pretty(&stats).context("Failed to serialize statistics")?;
            println!("{}", text);
            return Ok(());
        }

        let metadata = &recording.metadata;
        println!("📼 录制: {}", self.recording.display());
        println!(
            "   任务: {}, error={}, ref_pose={}",
            metadata.task, metadata.error_kind, metadata.ref_pose
        );
        match &recording.outcome {
            RecordedOutcome::Completed => println!("   结果: 完成"),
            RecordedOutcome::Succeeded { step } => println!("   结果: 第 {} 步成功", step),
            RecordedOutcome::Aborted { step, reason } => {
                println!("   结果: 第 {} 步中止 ({})", step, reason)
            },
        }
        for warning in &recording.warnings {
            println!("   ⚠️  {}", warning);
        }
        println!("{}", stats);

        Ok(())
    }
}
