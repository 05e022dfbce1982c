//! Tactile Servo - 触觉位姿伺服控制
//!
//! 用学习型触觉位姿估计器闭环控制机械臂，使传感器相对接触特征（边缘、曲面）
//! 保持在参考位姿上。
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **编解码层** (`codec`): 位姿向量、标签配置、物理位姿 ↔ 网络标签、误差与精度
//! - **控制层** (`control`): SE(3) 误差、PI 控制器、伺服循环与外部协作者 trait
//! - **工具层** (`tools`): 产物文件、位姿区间、episode 录制与统计
//!
//! # 快速开始
//!
//! ```rust
//! use tactile_servo::prelude::*;
//!
//! let task = Task::Edge2d;
//! let world = SimWorld::shared(Stimulus::Edge { angle_deg: 90.0 });
//! let mut servo = ServoLoop::new(
//!     SimSensor::new(world.clone()),
//!     SimEstimator::new(PoseLabelCodec::new(task.label_spec())),
//!     SimRobot::new(world),
//!     task.label_spec(),
//!     task.control_params(),
//!     ServoConfig::default(),
//! )?;
//! let report = servo.run_episode();
//! assert_eq!(report.steps.len(), task.control_params().ep_len());
//! # Ok::<(), ServoError>(())
//! ```
//!
//! 接入真实硬件时实现 [`TactileSensor`]、[`PoseEstimator`] 与 [`RobotDriver`] 即可。

pub use tactile_codec as codec;
pub use tactile_control as control;
pub use tactile_tools as tools;

pub mod logging;
pub mod prelude;

// 编解码层常用类型
pub use codec::{
    Axis, ConfigError, DecodeError, DecodedPrediction, LabelSpec, PoseLabelCodec, PoseVector,
    RawLabelSpec,
};

// 控制层（推荐入口）
pub use control::{
    AbortHandle, CollaboratorError, ControlDocument, ControlParams, EpisodeOutcome,
    EpisodeReport, MotionCommand, ParamsError, PidController, PoseEstimator, RobotDriver,
    Se3ErrorKind, ServoConfig, ServoError, ServoLoop, StepDecision, StepRecord, TactileSensor,
    Task,
};

pub use logging::{LoggingError, init_logging};
