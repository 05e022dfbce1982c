//! 6 自由度位姿向量
//!
//! 分量顺序固定为 `[x, y, z, roll, pitch, yaw]`，线性分量单位为毫米，角度分量单位为度。
//! 角度分量始终按模 360° 解释。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// 位姿自由度数
pub const POSE_DOF: usize = 6;

/// 位姿轴
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
    Z,
    Roll,
    Pitch,
    Yaw,
}

impl Axis {
    /// 所有轴（按位姿向量顺序）
    pub const ALL: [Axis; POSE_DOF] = [
        Axis::X,
        Axis::Y,
        Axis::Z,
        Axis::Roll,
        Axis::Pitch,
        Axis::Yaw,
    ];

    /// 在位姿向量中的下标
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 从下标构造
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Axis::X),
            1 => Some(Axis::Y),
            2 => Some(Axis::Z),
            3 => Some(Axis::Roll),
            4 => Some(Axis::Pitch),
            5 => Some(Axis::Yaw),
            _ => None,
        }
    }

    /// 是否为角度轴（周期 360°）
    #[inline]
    pub const fn is_angular(self) -> bool {
        matches!(self, Axis::Roll | Axis::Pitch | Axis::Yaw)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
            Axis::Roll => "roll",
            Axis::Pitch => "pitch",
            Axis::Yaw => "yaw",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 6 自由度位姿（或同维度的误差/控制量）
///
/// 序列化为长度 6 的数组，与配置文件中的 `ref_pose` / `kp` 等字段格式一致。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoseVector([f64; POSE_DOF]);

impl PoseVector {
    /// 零位姿
    pub const ZERO: Self = PoseVector([0.0; POSE_DOF]);

    pub const fn new(data: [f64; POSE_DOF]) -> Self {
        PoseVector(data)
    }

    /// 由线性分量（毫米）与角度分量（度）构造
    pub const fn from_parts(x: f64, y: f64, z: f64, roll: f64, pitch: f64, yaw: f64) -> Self {
        PoseVector([x, y, z, roll, pitch, yaw])
    }

    #[inline]
    pub const fn as_array(&self) -> &[f64; POSE_DOF] {
        &self.0
    }

    #[inline]
    pub fn into_array(self) -> [f64; POSE_DOF] {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &f64> {
        self.0.iter()
    }

    /// 逐分量映射
    pub fn map<F>(self, f: F) -> PoseVector
    where
        F: FnMut(f64) -> f64,
    {
        PoseVector(self.0.map(f))
    }

    /// 带轴信息的逐分量映射
    pub fn map_with_axis<F>(self, mut f: F) -> PoseVector
    where
        F: FnMut(Axis, f64) -> f64,
    {
        let mut out = self.0;
        for axis in Axis::ALL {
            out[axis.index()] = f(axis, self.0[axis.index()]);
        }
        PoseVector(out)
    }

    /// 与另一个位姿逐分量组合
    pub fn map_with<F>(self, other: PoseVector, mut f: F) -> PoseVector
    where
        F: FnMut(f64, f64) -> f64,
    {
        let mut out = [0.0; POSE_DOF];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = f(self.0[i], other.0[i]);
        }
        PoseVector(out)
    }

    /// 所有分量是否为有限值
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

impl From<[f64; POSE_DOF]> for PoseVector {
    fn from(data: [f64; POSE_DOF]) -> Self {
        PoseVector(data)
    }
}

impl From<PoseVector> for [f64; POSE_DOF] {
    fn from(pose: PoseVector) -> Self {
        pose.0
    }
}

impl Index<Axis> for PoseVector {
    type Output = f64;

    #[inline]
    fn index(&self, axis: Axis) -> &f64 {
        &self.0[axis.index()]
    }
}

impl IndexMut<Axis> for PoseVector {
    #[inline]
    fn index_mut(&mut self, axis: Axis) -> &mut f64 {
        &mut self.0[axis.index()]
    }
}

impl Index<usize> for PoseVector {
    type Output = f64;

    #[inline]
    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl IndexMut<usize> for PoseVector {
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.0[index]
    }
}

impl fmt::Display for PoseVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z, roll, pitch, yaw] = self.0;
        write!(
            f,
            "[{:.2}, {:.2}, {:.2} mm | {:.2}, {:.2}, {:.2} deg]",
            x, y, z, roll, pitch, yaw
        )
    }
}
