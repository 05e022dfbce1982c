//! 控制层错误类型定义

use tactile_codec::{Axis, ConfigError, DecodeError};
use thiserror::Error;

/// 控制参数配置错误
///
/// 加载时检测，致命：不得带着无效参数进入控制循环，也不会重试。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamsError {
    /// episode 长度必须为正
    #[error("Invalid ep_len: {0} (must be > 0)")]
    InvalidEpisodeLength(usize),

    /// 积分钳位下界大于上界
    #[error("Invalid ei_clip on {axis}: lower {lower} > upper {upper}")]
    InvalidClipBounds { axis: Axis, lower: f64, upper: f64 },

    /// 参数中出现 NaN / Inf
    #[error("Non-finite {field} on {axis}")]
    NonFinite { field: &'static str, axis: Axis },

    /// 步长无效
    #[error("Invalid dt: {0} (must be finite and > 0)")]
    InvalidDt(f64),

    /// 控制频率无效
    #[error("Invalid control rate: {0} Hz (must be finite and > 0)")]
    InvalidRate(f64),
}

/// 外部协作者（传感器 / 估计器 / 机器人驱动）错误
///
/// 视为瞬态错误：伺服循环干净地中止当前 episode（回撤、丢弃 PID 状态），而不是让进程崩溃。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    /// 传感器采集失败
    #[error("Sensor I/O failure: {0}")]
    Sensor(String),

    /// 估计器推理失败
    #[error("Estimator failure: {0}")]
    Estimator(String),

    /// 机器人驱动失败
    #[error("Robot driver failure: {0}")]
    Robot(String),
}

/// 伺服循环构造错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServoError {
    /// 标签配置错误
    #[error("Label configuration error: {0}")]
    LabelConfig(#[from] ConfigError),

    /// 控制参数错误
    #[error("Control parameter error: {0}")]
    Params(#[from] ParamsError),

    /// 估计器输出维度与标签配置不一致
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}
