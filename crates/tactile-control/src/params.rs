//! 控制参数（ControlParams）与任务预设
//!
//! 配置文档结构（每个任务一项）：
//!
//! ```toml
//! [edge_2d]
//! ep_len = 50
//! ref_pose = [0.0, 1.0, 0.0, 0.0, 0.0, 0.0]
//!
//! [edge_2d.pid_params]
//! kp = [0.5, 1.0, 0.0, 0.0, 0.0, 0.5]
//! ki = [0.3, 0.0, 0.0, 0.0, 0.0, 0.1]
//! ei_clip = [[-5.0, 0.0, 0.0, 0.0, 0.0, -45.0], [5.0, 0.0, 0.0, 0.0, 0.0, 45.0]]
//! error = "reference_in_observed"
//! ```
//!
//! 任务名在加载时解析为 [`Task`] 枚举，误差策略解析为 [`Se3ErrorKind`]，
//! 之后不再有任何基于字符串的分支。

use crate::error::ParamsError;
use crate::se3::Se3ErrorKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tactile_codec::{Axis, LabelSpec, PoseVector, RawLabelSpec};

/// 积分钳位区间（逐轴）
///
/// 序列化为 `[[lower × 6], [upper × 6]]`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[PoseVector; 2]", into = "[PoseVector; 2]")]
pub struct IntegralClip {
    pub lower: PoseVector,
    pub upper: PoseVector,
}

impl IntegralClip {
    pub const fn new(lower: PoseVector, upper: PoseVector) -> Self {
        Self { lower, upper }
    }

    /// 逐轴钳位
    pub fn clip(&self, value: &PoseVector) -> PoseVector {
        value.map_with_axis(|axis, v| v.clamp(self.lower[axis], self.upper[axis]))
    }

    /// 某轴的区间是否退化（`lower == upper`，即该轴不允许积分）
    pub fn is_degenerate(&self, axis: Axis) -> bool {
        self.lower[axis] == self.upper[axis]
    }

    fn validate(&self) -> Result<(), ParamsError> {
        for axis in Axis::ALL {
            let (lower, upper) = (self.lower[axis], self.upper[axis]);
            if !lower.is_finite() || !upper.is_finite() {
                return Err(ParamsError::NonFinite {
                    field: "ei_clip",
                    axis,
                });
            }
            if lower > upper {
                return Err(ParamsError::InvalidClipBounds { axis, lower, upper });
            }
        }
        Ok(())
    }
}

impl From<[PoseVector; 2]> for IntegralClip {
    fn from([lower, upper]: [PoseVector; 2]) -> Self {
        Self { lower, upper }
    }
}

impl From<IntegralClip> for [PoseVector; 2] {
    fn from(clip: IntegralClip) -> Self {
        [clip.lower, clip.upper]
    }
}

/// PID 参数
///
/// 虽然沿用 PID 的名字，实际只有比例与积分两项。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidParams {
    /// 比例增益
    pub kp: PoseVector,
    /// 积分增益
    pub ki: PoseVector,
    /// 积分项钳位（抗饱和）
    pub ei_clip: IntegralClip,
    /// SE(3) 误差策略
    #[serde(default)]
    pub error: Se3ErrorKind,
}

/// 配置文件中的原始控制参数（未校验）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawControlParams {
    pub ep_len: usize,
    pub pid_params: PidParams,
    pub ref_pose: PoseVector,
}

/// 校验后的控制参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawControlParams", into = "RawControlParams")]
pub struct ControlParams {
    ep_len: usize,
    pid_params: PidParams,
    ref_pose: PoseVector,
}

impl ControlParams {
    pub fn new(
        ep_len: usize,
        pid_params: PidParams,
        ref_pose: PoseVector,
    ) -> Result<Self, ParamsError> {
        if ep_len == 0 {
            return Err(ParamsError::InvalidEpisodeLength(ep_len));
        }
        check_finite("kp", &pid_params.kp)?;
        check_finite("ki", &pid_params.ki)?;
        check_finite("ref_pose", &ref_pose)?;
        pid_params.ei_clip.validate()?;

        Ok(Self {
            ep_len,
            pid_params,
            ref_pose,
        })
    }

    pub fn ep_len(&self) -> usize {
        self.ep_len
    }

    pub fn pid_params(&self) -> &PidParams {
        &self.pid_params
    }

    pub fn ref_pose(&self) -> &PoseVector {
        &self.ref_pose
    }

    pub fn error_kind(&self) -> Se3ErrorKind {
        self.pid_params.error
    }

    /// 以新的 episode 长度重建
    pub fn with_ep_len(self, ep_len: usize) -> Result<Self, ParamsError> {
        Self::new(ep_len, self.pid_params, self.ref_pose)
    }
}

impl TryFrom<RawControlParams> for ControlParams {
    type Error = ParamsError;

    fn try_from(raw: RawControlParams) -> Result<Self, Self::Error> {
        ControlParams::new(raw.ep_len, raw.pid_params, raw.ref_pose)
    }
}

impl From<ControlParams> for RawControlParams {
    fn from(params: ControlParams) -> Self {
        RawControlParams {
            ep_len: params.ep_len,
            pid_params: params.pid_params,
            ref_pose: params.ref_pose,
        }
    }
}

fn check_finite(field: &'static str, pose: &PoseVector) -> Result<(), ParamsError> {
    for axis in Axis::ALL {
        if !pose[axis].is_finite() {
            return Err(ParamsError::NonFinite { field, axis });
        }
    }
    Ok(())
}

/// 伺服任务
///
/// 以字符串形式序列化（同时用作配置文档中的键）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Task {
    /// 曲面跟踪（z / roll / pitch）
    Surface3d,
    /// 平面边缘跟踪（x / yaw）
    Edge2d,
    /// 边缘跟踪 + 接触深度（x / z / yaw）
    Edge3d,
    /// 三维边缘跟踪（y / z / roll / pitch / yaw）
    Edge5d,
}

/// 标准标签名（与训练产物一致）
pub const LABEL_NAMES: [&str; 6] = ["x", "y", "z", "Rx", "Ry", "Rz"];

impl Task {
    pub const ALL: [Task; 4] = [Task::Surface3d, Task::Edge2d, Task::Edge3d, Task::Edge5d];

    pub const fn as_str(self) -> &'static str {
        match self {
            Task::Surface3d => "surface_3d",
            Task::Edge2d => "edge_2d",
            Task::Edge3d => "edge_3d",
            Task::Edge5d => "edge_5d",
        }
    }

    /// 任务的预设控制参数
    pub fn control_params(self) -> ControlParams {
        let (ep_len, kp, ki, lower, upper, ref_pose) = match self {
            Task::Surface3d => (
                500,
                [1.0, 1.0, 0.5, 0.5, 0.5, 1.0],
                [0.0, 0.0, 0.3, 0.1, 0.1, 0.0],
                [0.0, 0.0, 0.0, -30.0, -30.0, 0.0],
                [0.0, 0.0, 5.0, 30.0, 30.0, 0.0],
                [0.0, -1.0, 3.0, 0.0, 0.0, 0.0],
            ),
            Task::Edge2d => (
                50,
                [0.5, 1.0, 0.0, 0.0, 0.0, 0.5],
                [0.3, 0.0, 0.0, 0.0, 0.0, 0.1],
                [-5.0, 0.0, 0.0, 0.0, 0.0, -45.0],
                [5.0, 0.0, 0.0, 0.0, 0.0, 45.0],
                [0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
            ),
            Task::Edge3d => (
                400,
                [0.5, 1.0, 0.5, 0.0, 0.0, 0.5],
                [0.3, 0.0, 0.3, 0.0, 0.0, 0.1],
                [0.0, -5.0, 0.0, 0.0, 0.0, -45.0],
                [0.0, 5.0, 5.0, 0.0, 0.0, 45.0],
                [0.0, 1.0, 3.0, 0.0, 0.0, 0.0],
            ),
            Task::Edge5d => (
                250,
                [1.0, 0.5, 0.5, 0.5, 0.5, 0.5],
                [0.0, 0.3, 0.3, 0.1, 0.1, 0.1],
                [0.0, -5.0, 0.0, -30.0, -30.0, -45.0],
                [0.0, 5.0, 5.0, 30.0, 30.0, 45.0],
                [1.0, 0.0, 3.0, 0.0, 0.0, 0.0],
            ),
        };

        ControlParams {
            ep_len,
            pid_params: PidParams {
                kp: kp.into(),
                ki: ki.into(),
                ei_clip: IntegralClip::new(lower.into(), upper.into()),
                error: Se3ErrorKind::ReferenceInObserved,
            },
            ref_pose: ref_pose.into(),
        }
    }

    /// 任务的默认标签配置
    pub fn raw_label_spec(self) -> RawLabelSpec {
        let (targets, periodic): (&[&str], &[&str]) = match self {
            Task::Surface3d => (&["z", "Rx", "Ry"], &[]),
            Task::Edge2d => (&["x", "Rz"], &["Rz"]),
            Task::Edge3d => (&["x", "z", "Rz"], &["Rz"]),
            Task::Edge5d => (&["y", "z", "Rx", "Ry", "Rz"], &["Rz"]),
        };
        let to_owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        RawLabelSpec {
            label_names: to_owned(&LABEL_NAMES),
            target_label_names: to_owned(targets),
            periodic_label_names: to_owned(periodic),
            target_weights: None,
            tolerances: None,
            llims: vec![-5.0, -5.0, 1.0, -45.0, -45.0, -180.0],
            ulims: vec![5.0, 5.0, 5.0, 45.0, 45.0, 180.0],
        }
    }

    pub fn label_spec(self) -> LabelSpec {
        // 预设在测试中逐一校验
        LabelSpec::new(self.raw_label_spec())
            .unwrap_or_else(|e| unreachable!("preset label spec for {} is invalid: {}", self, e))
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Task {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Task> for String {
    fn from(task: Task) -> Self {
        task.as_str().to_string()
    }
}

impl FromStr for Task {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Task::ALL
            .into_iter()
            .find(|task| task.as_str() == s)
            .ok_or_else(|| format!("Unknown task: '{}'", s))
    }
}

/// 控制参数文档：任务 → 参数
///
/// 未知任务名在反序列化时即报错。
pub type ControlDocument = BTreeMap<Task, ControlParams>;

/// 所有任务的预设文档
pub fn preset_document() -> ControlDocument {
    Task::ALL
        .into_iter()
        .map(|task| (task, task.control_params()))
        .collect()
}
