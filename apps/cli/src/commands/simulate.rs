//! 仿真命令
//!
//! 用仿真传感器 / 估计器 / 机器人运行一个伺服 episode，打印统计并可选录制

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use tactile_servo::control::{
    AbortReason, SimEstimator, SimRobot, SimSensor, SimWorld, Stimulus,
};
use tactile_servo::{EpisodeOutcome, PoseLabelCodec, PoseVector, ServoConfig, ServoLoop, Task};
use tactile_tools::{
    EpisodeRecording, EpisodeStatistics, RecordingMetadata, load_control_document,
    load_label_spec, load_servo_config,
};
use tracing::{info, warn};

/// 仿真刺激物类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StimulusKind {
    Edge,
    Circle,
    Surface,
}

/// 仿真命令参数
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// 任务名
    #[arg(short, long, default_value = "edge_2d")]
    pub task: Task,

    /// 刺激物
    #[arg(long, value_enum, default_value_t = StimulusKind::Edge)]
    pub stimulus: StimulusKind,

    /// 直边方向（度）
    #[arg(long, default_value_t = 90.0)]
    pub angle: f64,

    /// 圆半径（毫米）
    #[arg(long, default_value_t = 40.0)]
    pub radius: f64,

    /// 估计器噪声幅度（毫米 / 度）
    #[arg(short, long, default_value_t = 0.0)]
    pub noise: f64,

    /// 噪声随机种子
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// 覆盖 episode 长度
    #[arg(long)]
    pub steps: Option<usize>,

    /// 起始位姿 `x,y,z,Rx,Ry,Rz`（毫米 / 度）
    #[arg(long, allow_hyphen_values = true)]
    pub start: Option<String>,

    /// 标签配置文件（默认使用任务预设）
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// 控制参数文件（默认使用任务预设）
    #[arg(long)]
    pub control: Option<PathBuf>,

    /// 伺服循环配置文件
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 录制输出文件
    #[arg(short, long)]
    pub record: Option<PathBuf>,
}

impl SimulateCommand {
    /// 解析起始位姿
    pub fn parse_start(&self) -> Result<Option<PoseVector>> {
        let Some(text) = &self.start else {
            return Ok(None);
        };

        let values = text
            .split(',')
            .map(|s| s.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Invalid start pose: '{}'", text))?;

        let array: [f64; 6] = values
            .try_into()
            .map_err(|v: Vec<f64>| anyhow::anyhow!("Start pose needs 6 values, got {}", v.len()))?;
        Ok(Some(PoseVector::new(array)))
    }

    fn stimulus(&self) -> Stimulus {
        match self.stimulus {
            StimulusKind::Edge => Stimulus::Edge {
                angle_deg: self.angle,
            },
            StimulusKind::Circle => Stimulus::Circle {
                radius_mm: self.radius,
            },
            StimulusKind::Surface => Stimulus::Surface,
        }
    }

    /// 各刺激物的默认起始位姿：偏离特征 2mm、偏转 20°
    fn default_start(&self) -> PoseVector {
        match self.stimulus {
            StimulusKind::Edge => {
                let angle = self.angle.to_radians();
                PoseVector::from_parts(
                    2.0 * angle.sin(),
                    -2.0 * angle.cos(),
                    0.0,
                    0.0,
                    0.0,
                    self.angle - 70.0,
                )
            },
            StimulusKind::Circle => PoseVector::from_parts(self.radius + 2.0, 0.0, 0.0, 0.0, 0.0, 20.0),
            StimulusKind::Surface => PoseVector::from_parts(0.0, 0.0, 2.0, 4.0, -3.0, 0.0),
        }
    }

    /// 执行仿真
    pub fn execute(&self) -> Result<()> {
        let spec = match &self.labels {
            Some(path) => load_label_spec(path)?,
            None => self.task.label_spec(),
        };

        let mut params = match &self.control {
            Some(path) => {
                let document = load_control_document(path)?;
                *document.get(&self.task).with_context(|| {
                    format!("Control document {} has no entry for task {}", path.display(), self.task)
                })?
            },
            None => self.task.control_params(),
        };
        if let Some(steps) = self.steps {
            params = params.with_ep_len(steps)?;
        }

        let mut config = match &self.config {
            Some(path) => load_servo_config(path)?,
            None => ServoConfig::default(),
        };
        config.start_pose = match self.parse_start()? {
            Some(pose) => pose,
            None => self.default_start(),
        };

        let world = SimWorld::shared(self.stimulus());
        let mut estimator = SimEstimator::new(PoseLabelCodec::new(spec.clone()));
        if self.noise > 0.0 {
            estimator = estimator.with_noise(self.noise, self.seed);
        }

        let mut servo = ServoLoop::new(
            SimSensor::new(world.clone()),
            estimator,
            SimRobot::new(world),
            spec.clone(),
            params,
            config,
        )?;

        // Ctrl-C 在步边界中止
        let abort = servo.abort_handle();
        ctrlc::set_handler(move || abort.request()).context("Failed to install Ctrl-C handler")?;

        println!(
            "⏳ 仿真 {}: {:?}, ep_len={}, start={}",
            self.task,
            self.stimulus(),
            params.ep_len(),
            config.start_pose
        );
        let report = servo.run_episode();

        for warning in &report.warnings {
            warn!("{}", warning);
        }
        if let Some(err) = &report.retract_error {
            warn!("Retract failed: {}", err);
        }

        let recording =
            EpisodeRecording::from_report(RecordingMetadata::new(self.task, &spec, &params), &report);
        println!("{}", EpisodeStatistics::from_recording(&recording));

        if let Some(path) = &self.record {
            recording.save(path)?;
            println!("💾 录制已保存: {}", path.display());
        }

        match &report.outcome {
            EpisodeOutcome::Completed => {
                println!("✅ episode 完成: {} 步", report.steps.len());
            },
            EpisodeOutcome::Succeeded { step } => {
                println!("✅ episode 在第 {} 步成功结束", step);
            },
            EpisodeOutcome::Aborted {
                step,
                reason: AbortReason::External,
            } => {
                info!("Episode interrupted at step {}", step);
                println!("⚠️  episode 在第 {} 步被中断", step);
            },
            EpisodeOutcome::Aborted { step, reason } => {
                bail!("Episode aborted at step {}: {}", step, reason);
            },
        }

        Ok(())
    }
}
