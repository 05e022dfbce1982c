//! # Tactile Tools - 产物文件与离线分析
//!
//! **依赖原则**: 只依赖 `tactile-codec` 与 `tactile-control`，不依赖任何硬件接口
//!
//! ## 包含模块
//!
//! - `artifacts` - 标签配置 / 控制参数文件（JSON 或 TOML）
//! - `pose_limits` - 由训练位姿推导归一化区间
//! - `recording` - episode 录制格式
//! - `statistics` - episode 统计（可选）
//!
//! ## Feature Flags
//!
//! - `default` - 无默认 features
//! - `full` - 启用所有功能（包含 statistics）
//! - `statistics` - 启用统计模块
//!
//! ## 使用示例
//!
//! ```toml
//! # apps/cli/Cargo.toml - 需要统计
//! [dependencies]
//! tactile-tools = { workspace = true, features = ["full"] }
//! ```

pub mod artifacts;
pub mod pose_limits;
pub mod recording;

// 可选模块（通过 feature flags 控制）
#[cfg(feature = "statistics")]
pub mod statistics;

// 重新导出常用类型
pub use artifacts::{
    ArtifactFormat, load_control_document, load_label_spec, load_servo_config,
    save_control_document, save_label_spec,
};
pub use pose_limits::PoseLimits;
pub use recording::{EpisodeRecording, RecordedOutcome, RecordedStep, RecordingMetadata};

#[cfg(feature = "statistics")]
pub use statistics::{EpisodeStatistics, LabelStatistics};
