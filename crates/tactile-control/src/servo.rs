//! 伺服循环（ServoLoop）
//!
//! 每个 episode 的流程：
//!
//! 1. 移动到起始位姿，创建并重置 PID
//! 2. 最多 `ep_len` 步，每步严格按顺序执行：
//!    采集 → 推理 → 解码 → SE(3) 误差 → PID → 发送相对运动 → 读取机器人状态
//! 3. 结束（步数耗尽 / 外部成功信号 / 中止）后回撤，丢弃 PID 状态
//!
//! 循环是单线程、同步的：下一步的传感器读数依赖上一步的物理结果。
//! 中止只在步边界生效，不会打断正在执行的一步。
//!
//! # 外部协作者
//!
//! - [`TactileSensor`]：`capture_frame() → frame`
//! - [`PoseEstimator`]：`infer(frame) → raw output`
//! - [`RobotDriver`]：`send_motion(command)` / `read_state() → pose`

use crate::diagnostics::{DEFAULT_SATURATION_WINDOW, SaturationMonitor, SaturationWarning};
use crate::error::{CollaboratorError, ParamsError, ServoError};
use crate::params::ControlParams;
use crate::pid::{PidController, Running};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tactile_codec::{
    AccuracyTable, DecodeError, DecodedPrediction, ErrorMetric, ErrorTable, LabelSpec, PoseLabelCodec,
    PoseVector,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// 触觉传感器
pub trait TactileSensor {
    /// 一帧传感器数据（图像等）
    type Frame;

    fn capture_frame(&mut self) -> Result<Self::Frame, CollaboratorError>;
}

/// 位姿估计器（训练好的模型）
///
/// 输出为编码空间中的原始向量，长度应等于 `LabelSpec::encoded_len()`。
pub trait PoseEstimator<F> {
    fn infer(&mut self, frame: &F) -> Result<Vec<f64>, CollaboratorError>;
}

/// 机器人驱动
pub trait RobotDriver {
    fn send_motion(&mut self, command: &MotionCommand) -> Result<(), CollaboratorError>;

    /// 当前 TCP 位姿（毫米 / 度）
    fn read_state(&mut self) -> Result<PoseVector, CollaboratorError>;
}

/// 运动指令
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionCommand {
    /// 绝对位姿（基座坐标系）
    MoveTo(PoseVector),
    /// 相对运动（工具坐标系）
    MoveRelative(PoseVector),
}

/// 伺服循环配置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    /// 名义步长，直接传给 PID（不测量实际耗时）
    pub dt: f64,
    /// episode 起始位姿
    pub start_pose: PoseVector,
    /// 结束时沿工具 z 轴回撤的距离（毫米）
    pub retract_height_mm: f64,
    /// 控制频率（Hz）；`None` 表示不节拍，逐步尽快执行
    pub control_rate_hz: Option<f64>,
    /// 积分饱和告警窗口（连续步数）
    pub saturation_window: usize,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            dt: 1.0,
            start_pose: PoseVector::ZERO,
            retract_height_mm: 50.0,
            control_rate_hz: None,
            saturation_window: DEFAULT_SATURATION_WINDOW,
        }
    }
}

impl ServoConfig {
    /// 校验步长、控制频率与起始位姿
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ParamsError::InvalidDt(self.dt));
        }
        if let Some(rate) = self.control_rate_hz {
            let period = Duration::try_from_secs_f64(1.0 / rate);
            if !(rate.is_finite() && rate > 0.0) || period.is_err() {
                return Err(ParamsError::InvalidRate(rate));
            }
        }
        if !self.start_pose.is_finite() {
            return Err(ParamsError::NonFinite {
                field: "start_pose",
                axis: first_non_finite(&self.start_pose),
            });
        }
        Ok(())
    }
}

fn first_non_finite(pose: &PoseVector) -> tactile_codec::Axis {
    tactile_codec::Axis::ALL
        .into_iter()
        .find(|&axis| !pose[axis].is_finite())
        .unwrap_or(tactile_codec::Axis::X)
}

/// 单步记录：`(decoded_prediction, error, control_output)` 以及上下文
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub step: usize,
    /// 解码后的预测（全部标签）
    pub prediction: DecodedPrediction,
    /// 预测打包为位姿向量
    pub pose: PoseVector,
    /// SE(3) 误差
    pub error: PoseVector,
    /// PID 输出
    pub control_output: PoseVector,
    /// 本步之后的积分状态
    pub integral: PoseVector,
    /// 运动之后的 TCP 位姿
    pub tcp_pose: PoseVector,
}

/// 观察者的决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepDecision {
    #[default]
    Continue,
    /// 外部成功信号，正常结束
    Succeed,
    /// 外部中止
    Abort,
}

/// 中止原因
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbortReason {
    #[error("aborted by request")]
    External,

    #[error("sensing failed: {0}")]
    Sensing(CollaboratorError),

    #[error("decode failed: {0}")]
    Decode(DecodeError),

    #[error("actuation failed: {0}")]
    Actuation(CollaboratorError),
}

/// episode 结果
#[derive(Debug, Clone, PartialEq)]
pub enum EpisodeOutcome {
    /// 执行完 `ep_len` 步
    Completed,
    /// 外部成功信号（含该步）
    Succeeded { step: usize },
    /// 在 `step` 处中止
    Aborted { step: usize, reason: AbortReason },
}

/// episode 报告
///
/// 中止的 episode 同样返回报告，其中包含中止前已执行的各步。
#[derive(Debug, Clone)]
pub struct EpisodeReport {
    pub outcome: EpisodeOutcome,
    pub steps: Vec<StepRecord>,
    /// 每步预测相对 `ref_pose` 的误差（目标标签）
    pub errors: ErrorTable,
    pub accuracy: AccuracyTable,
    pub warnings: Vec<SaturationWarning>,
    /// 回撤失败时的错误
    pub retract_error: Option<CollaboratorError>,
}

impl EpisodeReport {
    pub fn is_aborted(&self) -> bool {
        matches!(self.outcome, EpisodeOutcome::Aborted { .. })
    }

    pub fn last_step(&self) -> Option<&StepRecord> {
        self.steps.last()
    }
}

/// 中止句柄
///
/// 可克隆、跨线程；请求在下一个步边界生效，被消费后自动清除。
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }
}

/// 伺服循环
///
/// 持有三个协作者与只读的标签配置 / 控制参数。PID 状态只在单个 episode 内存在。
pub struct ServoLoop<S, E, R> {
    sensor: S,
    estimator: E,
    robot: R,
    codec: PoseLabelCodec,
    metric: ErrorMetric,
    params: ControlParams,
    config: ServoConfig,
    abort: AbortHandle,
}

impl<S, E, R> ServoLoop<S, E, R>
where
    S: TactileSensor,
    E: PoseEstimator<S::Frame>,
    R: RobotDriver,
{
    pub fn new(
        sensor: S,
        estimator: E,
        robot: R,
        spec: LabelSpec,
        params: ControlParams,
        config: ServoConfig,
    ) -> Result<Self, ServoError> {
        config.validate()?;
        let codec = PoseLabelCodec::new(spec);
        let metric = codec.metric();

        Ok(Self {
            sensor,
            estimator,
            robot,
            codec,
            metric,
            params,
            config,
            abort: AbortHandle::new(),
        })
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn codec(&self) -> &PoseLabelCodec {
        &self.codec
    }

    pub fn params(&self) -> &ControlParams {
        &self.params
    }

    pub fn config(&self) -> &ServoConfig {
        &self.config
    }

    pub fn robot(&self) -> &R {
        &self.robot
    }

    pub fn robot_mut(&mut self) -> &mut R {
        &mut self.robot
    }

    /// 取回协作者
    pub fn into_parts(self) -> (S, E, R) {
        (self.sensor, self.estimator, self.robot)
    }

    /// 运行一个完整 episode
    pub fn run_episode(&mut self) -> EpisodeReport {
        self.run_episode_with(|_| StepDecision::Continue)
    }

    /// 运行一个 episode，每步之后调用 `observer`
    ///
    /// 观察者可以返回 [`StepDecision::Succeed`] 提前正常结束，或 [`StepDecision::Abort`] 中止。
    pub fn run_episode_with<F>(&mut self, mut observer: F) -> EpisodeReport
    where
        F: FnMut(&StepRecord) -> StepDecision,
    {
        let ep_len = self.params.ep_len();
        info!(
            "Starting episode: ep_len={}, error={}, ref_pose={}",
            ep_len,
            self.params.error_kind(),
            self.params.ref_pose()
        );

        let mut log = EpisodeLog::default();
        let outcome = match self
            .robot
            .send_motion(&MotionCommand::MoveTo(self.config.start_pose))
        {
            Ok(()) => {
                let pid = PidController::new(self.params.pid_params()).reset();
                self.run_steps(pid, &mut log, &mut observer)
            },
            Err(e) => {
                warn!("Failed to move to start pose: {}", e);
                EpisodeOutcome::Aborted {
                    step: 0,
                    reason: AbortReason::Actuation(e),
                }
            },
        };

        let retract_error = self.retract();
        // 请求只作用于当前 episode
        self.abort.take();

        match &outcome {
            EpisodeOutcome::Aborted { step, reason } => {
                warn!("Episode aborted at step {}: {}", step, reason)
            },
            EpisodeOutcome::Succeeded { step } => info!("Episode succeeded at step {}", step),
            EpisodeOutcome::Completed => info!("Episode completed ({} steps)", log.steps.len()),
        }

        EpisodeReport {
            outcome,
            steps: log.steps,
            errors: log.errors,
            accuracy: log.accuracy,
            warnings: log.warnings,
            retract_error,
        }
    }

    fn run_steps<F>(
        &mut self,
        mut pid: PidController<Running>,
        log: &mut EpisodeLog,
        observer: &mut F,
    ) -> EpisodeOutcome
    where
        F: FnMut(&StepRecord) -> StepDecision,
    {
        let mut monitor =
            SaturationMonitor::new(self.params.pid_params().ei_clip, self.config.saturation_window);
        let reference = self.codec.spec().labels_from_pose(self.params.ref_pose());

        let period = self
            .config
            .control_rate_hz
            .and_then(|hz| Duration::try_from_secs_f64(1.0 / hz).ok());
        let mut next_tick = Instant::now();

        for step in 0..self.params.ep_len() {
            if self.abort.take() {
                return EpisodeOutcome::Aborted {
                    step,
                    reason: AbortReason::External,
                };
            }

            let record = match self.step(step, &mut pid) {
                Ok(record) => record,
                Err(reason) => return EpisodeOutcome::Aborted { step, reason },
            };

            log.warnings.extend(monitor.observe(step, pid.integral()));
            let err = self.metric.error(&reference, &record.prediction);
            log.accuracy.push(self.metric.accuracy(&err));
            log.errors.push(err);

            let decision = observer(&record);
            log.steps.push(record);
            match decision {
                StepDecision::Continue => {},
                StepDecision::Succeed => return EpisodeOutcome::Succeeded { step },
                StepDecision::Abort => {
                    return EpisodeOutcome::Aborted {
                        step,
                        reason: AbortReason::External,
                    };
                },
            }

            if let Some(period) = period {
                next_tick += period;
                let now = Instant::now();
                if next_tick > now {
                    spin_sleep::sleep(next_tick - now);
                } else {
                    warn!(
                        "Servo loop overrun at step {}: behind schedule by {:?}",
                        step,
                        now - next_tick
                    );
                    next_tick = now;
                }
            }
        }

        EpisodeOutcome::Completed
    }

    /// 感知 → 推理 → 解码 → 误差 → 控制 → 执行
    fn step(
        &mut self,
        step: usize,
        pid: &mut PidController<Running>,
    ) -> Result<StepRecord, AbortReason> {
        let frame = self.sensor.capture_frame().map_err(AbortReason::Sensing)?;
        let raw = self.estimator.infer(&frame).map_err(AbortReason::Sensing)?;
        let prediction = self.codec.decode_label(&raw).map_err(AbortReason::Decode)?;
        let pose = prediction.to_pose();

        let kind = self.params.error_kind();
        let error = kind.error(self.params.ref_pose(), &pose);
        let control_output = pid.step(&error, self.config.dt);

        let motion = MotionCommand::MoveRelative(kind.correction(&control_output));
        self.robot.send_motion(&motion).map_err(AbortReason::Actuation)?;
        let tcp_pose = self.robot.read_state().map_err(AbortReason::Actuation)?;

        debug!(
            "step {}: pose={} error={} output={} tcp={}",
            step, pose, error, control_output, tcp_pose
        );

        Ok(StepRecord {
            step,
            prediction,
            pose,
            error,
            control_output,
            integral: *pid.integral(),
            tcp_pose,
        })
    }

    fn retract(&mut self) -> Option<CollaboratorError> {
        let lift = PoseVector::from_parts(0.0, 0.0, -self.config.retract_height_mm, 0.0, 0.0, 0.0);
        match self.robot.send_motion(&MotionCommand::MoveRelative(lift)) {
            Ok(()) => None,
            Err(e) => {
                error!("Retract failed: {}", e);
                Some(e)
            },
        }
    }
}

#[derive(Default)]
struct EpisodeLog {
    steps: Vec<StepRecord>,
    errors: ErrorTable,
    accuracy: AccuracyTable,
    warnings: Vec<SaturationWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = ServoConfig::default();
        assert_eq!(config.dt, 1.0);
        assert_eq!(config.retract_height_mm, 50.0);
        assert!(config.control_rate_hz.is_none());
        assert_eq!(config.saturation_window, DEFAULT_SATURATION_WINDOW);
    }

    #[test]
    fn test_config_validation() {
        let config = ServoConfig {
            dt: 0.0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ParamsError::InvalidDt(0.0)));

        let config = ServoConfig {
            control_rate_hz: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ParamsError::InvalidRate(-1.0)));

        // 周期超出 Duration 的表示范围
        let config = ServoConfig {
            control_rate_hz: Some(1e-20),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ParamsError::InvalidRate(1e-20)));

        let config = ServoConfig {
            control_rate_hz: Some(200.0),
            ..Default::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_abort_handle_is_consumed() {
        let handle = AbortHandle::new();
        let clone = handle.clone();
        clone.request();
        assert!(handle.is_requested());
        assert!(handle.take());
        assert!(!clone.is_requested());
    }

    #[test]
    fn test_config_partial_deserialize() {
        let config: ServoConfig = serde_json::from_str(r#"{ "dt": 0.5 }"#).unwrap();
        assert_eq!(config.dt, 0.5);
        assert_eq!(config.retract_height_mm, 50.0);
    }
}
