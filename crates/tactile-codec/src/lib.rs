//! # Tactile Codec - 位姿标签编解码
//!
//! 学习型触觉位姿估计器的输出层约定：
//!
//! - `pose` - 6 自由度位姿向量（毫米 / 度）
//! - `units` - 角度单位与周期归一化
//! - `label` - 标签配置（加载时校验）
//! - `codec` - 物理位姿 ↔ 网络标签
//! - `metrics` - 逐轴误差（角度感知）与精度
//!
//! **依赖原则**: 纯数值层，不依赖控制器或任何硬件接口。

pub mod codec;
pub mod error;
pub mod label;
pub mod metrics;
pub mod pose;
pub mod units;

pub use codec::{DecodedPrediction, EncodedLabel, PoseLabelCodec};
pub use error::{CodecError, ConfigError, DecodeError};
pub use label::{LabelSpec, PerLabel, RawLabelSpec, TargetLabel};
pub use metrics::{AccuracyRow, AccuracyTable, ErrorMetric, ErrorTable, angular_distance};
pub use pose::{Axis, POSE_DOF, PoseVector};
pub use units::{Deg, Rad};
