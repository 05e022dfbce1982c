//! 标签配置（LabelSpec）
//!
//! 每个任务加载一次、此后只读的标签配置：
//!
//! - `label_names`: 全部位姿分量名（前 6 个按 `[x, y, z, roll, pitch, yaw]` 顺序对应位姿向量）
//! - `target_label_names`: 实际回归的子集
//! - `periodic_label_names`: 目标中按角度处理（sin/cos 编码）的子集
//! - `target_weights` / `tolerances`: 每个目标的权重与精度阈值（缺省为 1）
//! - `llims` / `ulims`: 每个标签的归一化物理区间
//!
//! 配置文件与训练产物一同保存，推理/伺服时必须逐位一致地重新加载：
//! `llims`/`ulims`/权重直接参与编解码运算，任何不一致都会静默产生错误的物理位姿。
//!
//! 反序列化经过 [`RawLabelSpec`] + `TryFrom` 校验，无效配置在加载时即被拒绝。

use crate::error::ConfigError;
use crate::pose::{POSE_DOF, PoseVector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// 配置文件中的原始标签文档（未校验）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLabelSpec {
    pub label_names: Vec<String>,
    pub target_label_names: Vec<String>,
    #[serde(default)]
    pub periodic_label_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_weights: Option<Vec<f64>>,
    // 兼容旧产物中的拼写
    #[serde(default, alias = "tolerences", skip_serializing_if = "Option::is_none")]
    pub tolerances: Option<Vec<f64>>,
    pub llims: Vec<f64>,
    pub ulims: Vec<f64>,
}

/// 单个回归目标（校验后的派生信息）
#[derive(Debug, Clone, PartialEq)]
pub struct TargetLabel {
    /// 标签名
    pub name: String,
    /// 在 `label_names` 中的下标
    pub label_index: usize,
    /// 编码权重
    pub weight: f64,
    /// 精度阈值（严格小于视为正确）
    pub tolerance: f64,
    /// 是否为周期（角度）标签
    pub periodic: bool,
}

impl TargetLabel {
    /// 编码后占用的维度数
    #[inline]
    pub fn encoded_dims(&self) -> usize {
        if self.periodic { 2 } else { 1 }
    }
}

/// 校验后的标签配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLabelSpec", into = "RawLabelSpec")]
pub struct LabelSpec {
    label_names: Arc<[String]>,
    target_names: Arc<[String]>,
    periodic_label_names: Vec<String>,
    llims: Vec<f64>,
    ulims: Vec<f64>,
    targets: Vec<TargetLabel>,
}

impl LabelSpec {
    /// 校验并构造标签配置
    pub fn new(raw: RawLabelSpec) -> Result<Self, ConfigError> {
        let n_labels = raw.label_names.len();
        if n_labels < POSE_DOF {
            return Err(ConfigError::TooFewLabels {
                min: POSE_DOF,
                actual: n_labels,
            });
        }
        check_unique(&raw.label_names)?;
        check_unique(&raw.target_label_names)?;

        check_len("llims", n_labels, raw.llims.len())?;
        check_len("ulims", n_labels, raw.ulims.len())?;
        check_finite("llims", &raw.llims)?;
        check_finite("ulims", &raw.ulims)?;

        let n_targets = raw.target_label_names.len();
        let weights = raw.target_weights.unwrap_or_else(|| vec![1.0; n_targets]);
        let tolerances = raw.tolerances.unwrap_or_else(|| vec![1.0; n_targets]);
        check_len("target_weights", n_targets, weights.len())?;
        check_len("tolerances", n_targets, tolerances.len())?;
        check_finite("tolerances", &tolerances)?;

        for name in &raw.periodic_label_names {
            if !raw.target_label_names.contains(name) {
                return Err(ConfigError::PeriodicNotTarget { name: name.clone() });
            }
        }

        let mut targets = Vec::with_capacity(n_targets);
        for ((name, &weight), &tolerance) in raw
            .target_label_names
            .iter()
            .zip(&weights)
            .zip(&tolerances)
        {
            let label_index = raw
                .label_names
                .iter()
                .position(|l| l == name)
                .ok_or_else(|| ConfigError::UnknownTargetLabel { name: name.clone() })?;

            if weight == 0.0 || !weight.is_finite() {
                return Err(ConfigError::InvalidWeight {
                    name: name.clone(),
                    weight,
                });
            }

            let periodic = raw.periodic_label_names.contains(name);
            // 只有线性归一化的目标需要非退化区间；非目标标签的区间可能是训练数据中的常量
            if !periodic {
                let (llim, ulim) = (raw.llims[label_index], raw.ulims[label_index]);
                if llim >= ulim {
                    return Err(ConfigError::DegenerateLimits {
                        name: name.clone(),
                        llim,
                        ulim,
                    });
                }
            }

            targets.push(TargetLabel {
                name: name.clone(),
                label_index,
                weight,
                tolerance,
                periodic,
            });
        }

        Ok(Self {
            label_names: raw.label_names.into(),
            target_names: raw.target_label_names.into(),
            periodic_label_names: raw.periodic_label_names,
            llims: raw.llims,
            ulims: raw.ulims,
            targets,
        })
    }

    /// 以新的物理区间重建配置（其余字段不变）
    pub fn with_limits(&self, llims: Vec<f64>, ulims: Vec<f64>) -> Result<Self, ConfigError> {
        let mut raw = self.to_raw();
        raw.llims = llims;
        raw.ulims = ulims;
        Self::new(raw)
    }

    /// 转换回原始文档（用于保存）
    pub fn to_raw(&self) -> RawLabelSpec {
        RawLabelSpec {
            label_names: self.label_names.to_vec(),
            target_label_names: self.target_names.to_vec(),
            periodic_label_names: self.periodic_label_names.clone(),
            target_weights: Some(self.targets.iter().map(|t| t.weight).collect()),
            tolerances: Some(self.targets.iter().map(|t| t.tolerance).collect()),
            llims: self.llims.clone(),
            ulims: self.ulims.clone(),
        }
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    pub fn target_label_names(&self) -> &[String] {
        &self.target_names
    }

    pub fn periodic_label_names(&self) -> &[String] {
        &self.periodic_label_names
    }

    pub fn targets(&self) -> &[TargetLabel] {
        &self.targets
    }

    pub fn llims(&self) -> &[f64] {
        &self.llims
    }

    pub fn ulims(&self) -> &[f64] {
        &self.ulims
    }

    /// 标签在 `label_names` 中的下标
    pub fn label_index(&self, name: &str) -> Option<usize> {
        self.label_names.iter().position(|l| l == name)
    }

    /// 标签的物理区间 `(llim, ulim)`
    pub fn limits(&self, name: &str) -> Option<(f64, f64)> {
        self.label_index(name)
            .map(|i| (self.llims[i], self.ulims[i]))
    }

    pub fn is_periodic(&self, name: &str) -> bool {
        self.periodic_label_names.iter().any(|p| p == name)
    }

    /// 编码后向量长度：目标数 + 周期目标数
    pub fn encoded_len(&self) -> usize {
        self.targets.iter().map(TargetLabel::encoded_dims).sum()
    }

    /// 以全部标签为键的零值容器
    pub fn zero_labels(&self) -> PerLabel<f64> {
        PerLabel::filled(self.label_names.clone(), 0.0)
    }

    /// 以目标标签为键的容器
    pub fn target_table<T: Clone>(&self, value: T) -> PerLabel<T> {
        PerLabel::filled(self.target_names.clone(), value)
    }

    /// 位姿向量 → 标签值（前 6 个标签，多余标签为 0）
    pub fn labels_from_pose(&self, pose: &PoseVector) -> PerLabel<f64> {
        let mut labels = self.zero_labels();
        for (i, v) in pose.iter().enumerate() {
            labels.values[i] = *v;
        }
        labels
    }
}

impl TryFrom<RawLabelSpec> for LabelSpec {
    type Error = ConfigError;

    fn try_from(raw: RawLabelSpec) -> Result<Self, Self::Error> {
        LabelSpec::new(raw)
    }
}

impl From<LabelSpec> for RawLabelSpec {
    fn from(spec: LabelSpec) -> Self {
        spec.to_raw()
    }
}

fn check_len(field: &'static str, expected: usize, actual: usize) -> Result<(), ConfigError> {
    if expected != actual {
        return Err(ConfigError::LengthMismatch {
            field,
            expected,
            actual,
        });
    }
    Ok(())
}

fn check_finite(field: &'static str, values: &[f64]) -> Result<(), ConfigError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ConfigError::NonFinite { field, index }),
        None => Ok(()),
    }
}

fn check_unique(names: &[String]) -> Result<(), ConfigError> {
    let mut seen = HashSet::with_capacity(names.len());
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ConfigError::DuplicateLabel { name: name.clone() });
        }
    }
    Ok(())
}

/// 以标签名为键的定长容器
///
/// 形状在构造时由 `LabelSpec` 固定，不会动态增加列。
/// 序列化为 `{ name: value }` 映射（保持标签顺序）。
#[derive(Debug, Clone, PartialEq)]
pub struct PerLabel<T> {
    names: Arc<[String]>,
    values: Vec<T>,
}

impl<T: Clone> PerLabel<T> {
    fn filled(names: Arc<[String]>, value: T) -> Self {
        let values = vec![value; names.len()];
        Self { names, values }
    }
}

impl<T> PerLabel<T> {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.values[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut T> {
        let index = self.names.iter().position(|n| n == name)?;
        Some(&mut self.values[index])
    }

    /// 按位置访问
    pub fn at(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    pub(crate) fn set_at(&mut self, index: usize, value: T) {
        self.values[index] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }
}

impl PerLabel<f64> {
    /// 打包为位姿向量（前 6 个标签）
    pub fn to_pose(&self) -> PoseVector {
        let mut pose = PoseVector::ZERO;
        for (i, v) in self.values.iter().take(POSE_DOF).enumerate() {
            pose[i] = *v;
        }
        pose
    }
}

impl<T: Serialize> Serialize for PerLabel<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
