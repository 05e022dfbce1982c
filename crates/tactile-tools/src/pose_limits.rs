//! # 位姿区间
//!
//! 由训练集位姿逐轴取最小 / 最大值，得到标签归一化区间。

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tactile_codec::{Axis, LabelSpec, POSE_DOF, PoseVector};

/// 逐轴物理区间
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseLimits {
    pub llims: PoseVector,
    pub ulims: PoseVector,
}

impl PoseLimits {
    /// 某轴的区间
    pub fn axis(&self, axis: Axis) -> (f64, f64) {
        (self.llims[axis], self.ulims[axis])
    }

    /// 用本区间替换标签配置的前 6 个标签区间（其余标签不变）
    pub fn apply(&self, spec: &LabelSpec) -> Result<LabelSpec> {
        let mut llims = spec.llims().to_vec();
        let mut ulims = spec.ulims().to_vec();
        for i in 0..POSE_DOF {
            llims[i] = self.llims[i];
            ulims[i] = self.ulims[i];
        }
        spec.with_limits(llims, ulims)
            .context("Derived pose limits are not valid for the label spec")
    }
}

/// 训练位姿 → 逐轴 min / max
pub fn from_poses<'a, I>(poses: I) -> Result<PoseLimits>
where
    I: IntoIterator<Item = &'a PoseVector>,
{
    let mut llims = PoseVector::new([f64::INFINITY; POSE_DOF]);
    let mut ulims = PoseVector::new([f64::NEG_INFINITY; POSE_DOF]);
    let mut count = 0usize;

    for pose in poses {
        if !pose.is_finite() {
            bail!("Non-finite training pose #{}: {}", count, pose);
        }
        llims = llims.map_with(*pose, f64::min);
        ulims = ulims.map_with(*pose, f64::max);
        count += 1;
    }

    if count == 0 {
        bail!("Cannot derive pose limits from an empty pose set");
    }
    Ok(PoseLimits { llims, ulims })
}
