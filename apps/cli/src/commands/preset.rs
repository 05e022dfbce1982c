//! 预设命令
//!
//! 导出任务的标签配置与控制参数预设

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tactile_servo::{ControlDocument, LabelSpec, Task};
use tactile_tools::{ArtifactFormat, save_control_document, save_label_spec};

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Toml,
}

impl OutputFormat {
    fn artifact(self) -> ArtifactFormat {
        match self {
            OutputFormat::Json => ArtifactFormat::Json,
            OutputFormat::Toml => ArtifactFormat::Toml,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Toml => "toml",
        }
    }
}

/// 预设命令参数
#[derive(Args, Debug)]
pub struct PresetCommand {
    /// 任务名（surface_3d / edge_2d / edge_3d / edge_5d）
    #[arg(short, long)]
    pub task: Task,

    /// 输出格式
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// 输出目录；省略时打印到标准输出
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// 打印到标准输出时的合并文档
#[derive(Serialize)]
struct PresetBundle<'a> {
    labels: &'a LabelSpec,
    control: &'a ControlDocument,
}

impl PresetCommand {
    /// 执行导出
    pub fn execute(&self) -> Result<()> {
        let spec = self.task.label_spec();
        let mut document = ControlDocument::new();
        document.insert(self.task, self.task.control_params());

        let Some(dir) = &self.out else {
            let bundle = PresetBundle {
                labels: &spec,
                control: &document,
            };
            println!("{}", self.format.artifact().to_string(&bundle)?);
            return Ok(());
        };

        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        let labels_path = dir.join(format!("model_label_params.{}", self.format.extension()));
        save_label_spec(&spec, &labels_path)?;
        println!("💾 标签配置: {}", labels_path.display());

        let control_path = dir.join(format!("control_params.{}", self.format.extension()));
        save_control_document(&document, &control_path)?;
        println!("💾 控制参数: {}", control_path.display());

        Ok(())
    }
}
