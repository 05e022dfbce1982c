//! 校验命令
//!
//! 加载训练产物并执行全部加载期校验，任何错误都以非零状态退出

use anyhow::{Context, Result, bail};
use clap::Args;
use std::path::PathBuf;
use tactile_servo::Task;
use tactile_tools::{load_control_document, load_label_spec, load_servo_config};

/// 校验命令参数
#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// 标签配置文件（model_label_params.json / .toml）
    #[arg(short, long)]
    pub labels: PathBuf,

    /// 控制参数文件（control_params.json / .toml）
    #[arg(short, long)]
    pub control: PathBuf,

    /// 要求控制参数中包含该任务
    #[arg(short, long)]
    pub task: Option<Task>,

    /// 伺服循环配置文件
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl ValidateCommand {
    /// 执行校验
    pub fn execute(&self) -> Result<()> {
        let spec = load_label_spec(&self.labels)?;
        println!(
            "✅ 标签配置: {} 个标签, 目标 [{}], 周期 [{}]",
            spec.label_names().len(),
            spec.target_label_names().join(", "),
            spec.periodic_label_names().join(", ")
        );

        let document = load_control_document(&self.control)?;
        if document.is_empty() {
            bail!("Control document {} defines no tasks", self.control.display());
        }
        for (task, params) in &document {
            println!(
                "✅ {}: ep_len={}, error={}, ref_pose={}",
                task,
                params.ep_len(),
                params.error_kind(),
                params.ref_pose()
            );
        }

        if let Some(task) = self.task {
            if !document.contains_key(&task) {
                bail!("Control document {} has no entry for task {}", self.control.display(), task);
            }
        }

        if let Some(path) = &self.config {
            let config = load_servo_config(path)?;
            config
                .validate()
                .with_context(|| format!("Invalid servo config {}", path.display()))?;
            println!("✅ 伺服配置: dt={}, retract={}mm", config.dt, config.retract_height_mm);
        }

        Ok(())
    }
}
