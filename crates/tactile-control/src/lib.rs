//! # Tactile Control - 触觉位姿伺服控制
//!
//! 在 [`tactile_codec`] 之上实现闭环伺服：
//!
//! - `se3` - 位姿变换与 SE(3) 误差策略
//! - `params` - 控制参数（加载时校验）与任务预设
//! - `pid` - Type State 的逐轴 PI 控制器
//! - `diagnostics` - 积分饱和诊断
//! - `servo` - 协作者 trait 与逐步伺服循环
//! - `sim` - 仿真协作者（`sim` feature）
//!
//! # 快速开始
//!
//! ```rust
//! use tactile_control::prelude::*;
//!
//! let task = Task::Edge2d;
//! let world = SimWorld::shared(Stimulus::Edge { angle_deg: 90.0 });
//! let codec = PoseLabelCodec::new(task.label_spec());
//!
//! let mut servo = ServoLoop::new(
//!     SimSensor::new(world.clone()),
//!     SimEstimator::new(codec),
//!     SimRobot::new(world),
//!     task.label_spec(),
//!     task.control_params(),
//!     ServoConfig {
//!         start_pose: PoseVector::from_parts(2.0, 0.0, 0.0, 0.0, 0.0, 20.0),
//!         ..Default::default()
//!     },
//! )?;
//!
//! let report = servo.run_episode();
//! assert_eq!(report.outcome, EpisodeOutcome::Completed);
//! # Ok::<(), tactile_control::ServoError>(())
//! ```

pub mod diagnostics;
pub mod error;
pub mod params;
pub mod pid;
pub mod se3;
pub mod servo;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use diagnostics::{ClipBound, DEFAULT_SATURATION_WINDOW, SaturationMonitor, SaturationWarning};
pub use error::{CollaboratorError, ParamsError, ServoError};
pub use params::{
    ControlDocument, ControlParams, IntegralClip, LABEL_NAMES, PidParams, RawControlParams, Task,
    preset_document,
};
pub use pid::{PidController, Running, Uninitialized};
pub use se3::Se3ErrorKind;
pub use servo::{
    AbortHandle, AbortReason, EpisodeOutcome, EpisodeReport, MotionCommand, PoseEstimator,
    RobotDriver, ServoConfig, ServoLoop, StepDecision, StepRecord, TactileSensor,
};

#[cfg(any(test, feature = "sim"))]
pub use sim::{SharedWorld, SimEstimator, SimFrame, SimRobot, SimSensor, SimWorld, Stimulus};

/// 常用类型
pub mod prelude {
    pub use crate::{
        AbortHandle, ControlParams, EpisodeOutcome, EpisodeReport, MotionCommand, PidController,
        PoseEstimator, RobotDriver, Se3ErrorKind, ServoConfig, ServoLoop, StepDecision,
        StepRecord, TactileSensor, Task,
    };
    pub use tactile_codec::{Axis, LabelSpec, PoseLabelCodec, PoseVector};

    #[cfg(any(test, feature = "sim"))]
    pub use crate::{SimEstimator, SimRobot, SimSensor, SimWorld, Stimulus};
}
