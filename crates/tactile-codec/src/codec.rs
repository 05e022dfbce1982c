//! PoseLabelCodec - 位姿标签编解码器
//!
//! 将物理位姿分量编码为网络友好的标签向量，并将网络输出解码回物理单位。
//!
//! # 编码规则
//!
//! ```text
//! 非周期标签: norm = w * (((v - llim) / (ulim - llim)) * 2 - 1)     → [-w, +w]
//! 周期标签:   (w * sin θ, w * cos θ)                                  θ 为弧度
//! ```
//!
//! 周期标签使用 sin/cos 编码，避免 ±180° 处的不连续。
//!
//! # 顺序约定
//!
//! `encode_label` 按 `target_label_names` 顺序逐个追加 1 或 2 个分量，
//! `decode_label` 以完全相同的顺序消费。两者必须严格对应。

use crate::error::{CodecError, ConfigError, DecodeError};
use crate::label::{LabelSpec, PerLabel};
use crate::metrics::ErrorMetric;
use crate::pose::PoseVector;
use crate::units::Deg;
use std::sync::Arc;

/// 解码后的预测：以全部 `label_names` 为键，非目标标签为 0
pub type DecodedPrediction = PerLabel<f64>;

/// 编码后的标签向量
///
/// 长度为 `len(target_label_names) + count(periodic_label_names)`。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EncodedLabel(Vec<f64>);

impl EncodedLabel {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

impl From<Vec<f64>> for EncodedLabel {
    fn from(values: Vec<f64>) -> Self {
        EncodedLabel(values)
    }
}

/// 位姿标签编解码器
///
/// 持有只读的 `LabelSpec`，可在多个 episode / 线程间共享。
#[derive(Debug, Clone)]
pub struct PoseLabelCodec {
    spec: Arc<LabelSpec>,
}

impl PoseLabelCodec {
    pub fn new(spec: LabelSpec) -> Self {
        Self {
            spec: Arc::new(spec),
        }
    }

    pub fn from_shared(spec: Arc<LabelSpec>) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &LabelSpec {
        &self.spec
    }

    /// 网络输出维度
    pub fn out_dim(&self) -> usize {
        self.spec.encoded_len()
    }

    /// 基于同一配置的误差度量
    pub fn metric(&self) -> ErrorMetric {
        ErrorMetric::new(self.spec.clone())
    }

    fn normalized_limits(&self, label_name: &str) -> Result<(f64, f64), CodecError> {
        let (llim, ulim) = self
            .spec
            .limits(label_name)
            .ok_or_else(|| CodecError::UnknownLabel {
                name: label_name.to_string(),
            })?;
        if llim >= ulim {
            return Err(ConfigError::DegenerateLimits {
                name: label_name.to_string(),
                llim,
                ulim,
            }
            .into());
        }
        Ok((llim, ulim))
    }

    fn check_weight(label_name: &str, weight: f64) -> Result<(), ConfigError> {
        if weight == 0.0 || !weight.is_finite() {
            return Err(ConfigError::InvalidWeight {
                name: label_name.to_string(),
                weight,
            });
        }
        Ok(())
    }

    /// 线性归一化：`[llim, ulim]` → `weight * [-1, +1]`
    pub fn encode(&self, value: f64, label_name: &str, weight: f64) -> Result<f64, CodecError> {
        Self::check_weight(label_name, weight)?;
        let (llim, ulim) = self.normalized_limits(label_name)?;
        Ok(weight * (((value - llim) / (ulim - llim)) * 2.0 - 1.0))
    }

    /// `encode` 的代数逆
    pub fn decode(&self, norm: f64, label_name: &str, weight: f64) -> Result<f64, CodecError> {
        Self::check_weight(label_name, weight)?;
        let (llim, ulim) = self.normalized_limits(label_name)?;
        Ok(((norm / weight + 1.0) / 2.0) * (ulim - llim) + llim)
    }

    /// 角度（度）→ `(sin θ, cos θ)`
    pub fn encode_periodic(angle_degrees: f64) -> (f64, f64) {
        let rad = Deg(angle_degrees).to_rad();
        (rad.sin(), rad.cos())
    }

    /// `(sin, cos)` → 角度（度），结果位于 `(-180, 180]`
    ///
    /// 输入不要求在单位圆上：网络输出略偏离单位圆时仍可得到确定的角度。
    pub fn decode_periodic(sin_component: f64, cos_component: f64) -> f64 {
        Deg::from_sin_cos(sin_component, cos_component).0
    }

    /// 物理标签 → 网络标签
    ///
    /// `raw` 以 `label_names` 为键（通常由 [`LabelSpec::labels_from_pose`] 构造）。
    pub fn encode_label(&self, raw: &PerLabel<f64>) -> Result<EncodedLabel, CodecError> {
        let mut encoded = Vec::with_capacity(self.out_dim());
        for target in self.spec.targets() {
            let value = *raw
                .at(target.label_index)
                .ok_or_else(|| CodecError::UnknownLabel {
                    name: target.name.clone(),
                })?;

            if target.periodic {
                let (s, c) = Self::encode_periodic(value);
                encoded.push(target.weight * s);
                encoded.push(target.weight * c);
            } else {
                encoded.push(self.encode(value, &target.name, target.weight)?);
            }
        }
        Ok(EncodedLabel(encoded))
    }

    /// 位姿向量 → 网络标签
    pub fn encode_pose(&self, pose: &PoseVector) -> Result<EncodedLabel, CodecError> {
        self.encode_label(&self.spec.labels_from_pose(pose))
    }

    /// 网络输出 → 物理标签（`encode_label` 的逆）
    ///
    /// 维度不匹配或含非有限值时返回 `DecodeError`，不做任何补零。
    pub fn decode_label(&self, outputs: &[f64]) -> Result<DecodedPrediction, DecodeError> {
        let expected = self.out_dim();
        if outputs.len() != expected {
            return Err(DecodeError::DimensionMismatch {
                expected,
                actual: outputs.len(),
            });
        }
        if let Some(index) = outputs.iter().position(|v| !v.is_finite()) {
            return Err(DecodeError::NonFinite { index });
        }

        let mut decoded = self.spec.zero_labels();
        let mut ind = 0;
        for target in self.spec.targets() {
            let value = if target.periodic {
                let s = outputs[ind] / target.weight;
                let c = outputs[ind + 1] / target.weight;
                Self::decode_periodic(s, c)
            } else {
                let llim = self.spec.llims()[target.label_index];
                let ulim = self.spec.ulims()[target.label_index];
                ((outputs[ind] / target.weight + 1.0) / 2.0) * (ulim - llim) + llim
            };
            decoded.set_at(target.label_index, value);
            ind += target.encoded_dims();
        }
        Ok(decoded)
    }

    /// 解码并打包为位姿向量
    pub fn predict(&self, outputs: &[f64]) -> Result<PoseVector, DecodeError> {
        let decoded = self.decode_label(outputs)?;
        tracing::trace!(?decoded, "decoded prediction");
        Ok(decoded.to_pose())
    }
}
