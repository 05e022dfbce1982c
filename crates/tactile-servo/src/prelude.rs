//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use tactile_servo::prelude::*;
//! ```

pub use crate::codec::{Axis, LabelSpec, PoseLabelCodec, PoseVector};
pub use crate::control::{
    AbortHandle, ControlParams, EpisodeOutcome, EpisodeReport, MotionCommand, PoseEstimator,
    RobotDriver, Se3ErrorKind, ServoConfig, ServoLoop, StepDecision, StepRecord, TactileSensor,
    Task,
};

// 仿真协作者
#[cfg(feature = "sim")]
pub use crate::control::{SimEstimator, SimRobot, SimSensor, SimWorld, Stimulus};

// 错误类型
pub use crate::codec::{ConfigError, DecodeError};
pub use crate::control::{CollaboratorError, ParamsError, ServoError};
