//! SE(3) 误差策略
//!
//! 位姿向量 `[x, y, z, roll, pitch, yaw]`（毫米 / 度）与 `Isometry3` 之间的转换，
//! 以及一组**静态注册**的误差策略。策略由配置中的标识符选择，
//! 不存在任何运行时求值的表达式。
//!
//! # 欧拉角约定
//!
//! 静态轴 xyz：先绕 x 转 roll，再绕 y 转 pitch，最后绕 z 转 yaw，
//! 即 `R = Rz(yaw) · Ry(pitch) · Rx(roll)`（`nalgebra::UnitQuaternion::from_euler_angles`）。

use nalgebra::{Isometry3, Translation3, UnitQuaternion};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tactile_codec::{Deg, PoseVector};

/// 位姿向量 → 刚体变换
pub fn pose_to_isometry(pose: &PoseVector) -> Isometry3<f64> {
    let [x, y, z, roll, pitch, yaw] = pose.into_array();
    Isometry3::from_parts(
        Translation3::new(x, y, z),
        UnitQuaternion::from_euler_angles(roll.to_radians(), pitch.to_radians(), yaw.to_radians()),
    )
}

/// 刚体变换 → 位姿向量（角度归一化到 `(-180, 180]`）
pub fn isometry_to_pose(iso: &Isometry3<f64>) -> PoseVector {
    let t = iso.translation.vector;
    let (roll, pitch, yaw) = iso.rotation.euler_angles();
    PoseVector::from_parts(
        t.x,
        t.y,
        t.z,
        Deg(roll.to_degrees()).normalize().0,
        Deg(pitch.to_degrees()).normalize().0,
        Deg(yaw.to_degrees()).normalize().0,
    )
}

/// 位姿复合：`a ∘ b`（`b` 表达在 `a` 的坐标系中）
pub fn compose(a: &PoseVector, b: &PoseVector) -> PoseVector {
    isometry_to_pose(&(pose_to_isometry(a) * pose_to_isometry(b)))
}

/// 位姿求逆
pub fn inverse(pose: &PoseVector) -> PoseVector {
    isometry_to_pose(&pose_to_isometry(pose).inverse())
}

/// `pose` 表达在 `frame` 坐标系中：`frame⁻¹ ∘ pose`
pub fn relative_to(pose: &PoseVector, frame: &PoseVector) -> PoseVector {
    isometry_to_pose(&(pose_to_isometry(frame).inverse() * pose_to_isometry(pose)))
}

/// SE(3) 误差策略（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Se3ErrorKind {
    /// `ref⁻¹ ∘ obs`：观测位姿表达在参考坐标系中
    #[default]
    ObservedInReference,

    /// `obs⁻¹ ∘ ref`：参考位姿表达在观测坐标系中
    ///
    /// 即把传感器从当前位姿带到参考位姿所需的相对运动。
    ReferenceInObserved,

    /// 逐轴 `ref - obs`，角度轴回绕到 `(-180, 180]`
    PerAxis,
}

impl Se3ErrorKind {
    /// 所有策略
    pub const ALL: [Se3ErrorKind; 3] = [
        Se3ErrorKind::ObservedInReference,
        Se3ErrorKind::ReferenceInObserved,
        Se3ErrorKind::PerAxis,
    ];

    /// 配置标识符
    pub const fn as_str(self) -> &'static str {
        match self {
            Se3ErrorKind::ObservedInReference => "observed_in_reference",
            Se3ErrorKind::ReferenceInObserved => "reference_in_observed",
            Se3ErrorKind::PerAxis => "per_axis",
        }
    }

    /// 计算 `reference` 与 `observed` 之间的误差
    pub fn error(self, reference: &PoseVector, observed: &PoseVector) -> PoseVector {
        match self {
            Se3ErrorKind::ObservedInReference => relative_to(observed, reference),
            Se3ErrorKind::ReferenceInObserved => relative_to(reference, observed),
            Se3ErrorKind::PerAxis => reference.map_with_axis(|axis, r| {
                let diff = r - observed[axis];
                if axis.is_angular() {
                    Deg(diff).normalize().0
                } else {
                    diff
                }
            }),
        }
    }

    /// 控制输出 → 工具坐标系下的相对运动
    ///
    /// `ReferenceInObserved` 与 `PerAxis` 的误差方向即运动方向；
    /// `ObservedInReference` 的误差描述的是“偏离了多少”，运动取其逆。
    pub fn correction(self, control_output: &PoseVector) -> PoseVector {
        match self {
            Se3ErrorKind::ObservedInReference => inverse(control_output),
            Se3ErrorKind::ReferenceInObserved | Se3ErrorKind::PerAxis => *control_output,
        }
    }
}

impl fmt::Display for Se3ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Se3ErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Se3ErrorKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown SE3 error strategy: '{}'", s))
    }
}

/// 逐轴比较位姿（角度轴按回绕后的差值）
#[cfg(test)]
pub(crate) fn assert_pose_near(actual: &PoseVector, expected: &PoseVector, eps: f64) {
    for axis in tactile_codec::Axis::ALL {
        let diff = if axis.is_angular() {
            Deg(actual[axis] - expected[axis]).normalize().0
        } else {
            actual[axis] - expected[axis]
        };
        assert!(
            diff.abs() < eps,
            "{} differs: actual {} expected {}",
            axis,
            actual,
            expected
        );
    }
}
