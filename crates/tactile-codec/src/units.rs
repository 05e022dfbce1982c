//! 角度单位
//!
//! 位姿的角度分量以度为单位存储；三角运算前转换为弧度。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};

/// 弧度
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rad(pub f64);

impl Rad {
    /// 转换为角度
    #[inline]
    pub fn to_deg(self) -> Deg {
        Deg(self.0.to_degrees())
    }

    #[inline]
    pub fn sin(self) -> f64 {
        self.0.sin()
    }

    #[inline]
    pub fn cos(self) -> f64 {
        self.0.cos()
    }
}

/// 角度
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deg(pub f64);

impl Deg {
    /// 转换为弧度
    #[inline]
    pub fn to_rad(self) -> Rad {
        Rad(self.0.to_radians())
    }

    /// 归一化到 `(-180, 180]`
    ///
    /// 注意区间左开右闭：`-180` 映射为 `180`，与 `atan2` 解码结果保持一致。
    pub fn normalize(self) -> Self {
        let mut angle = self.0 % 360.0;
        if angle > 180.0 {
            angle -= 360.0;
        } else if angle <= -180.0 {
            angle += 360.0;
        }
        Deg(angle)
    }

    /// 由 `(sin, cos)` 分量恢复角度
    ///
    /// 基于 `atan2`，输入不必位于单位圆上。结果位于 `(-180, 180]`。
    pub fn from_sin_cos(sin: f64, cos: f64) -> Self {
        Rad(sin.atan2(cos)).to_deg().normalize()
    }

    /// 圆周上的最短角距离，范围 `[0, 180]`
    pub fn distance(self, other: Deg) -> f64 {
        let delta = (self - other).to_rad();
        Rad(delta.sin().atan2(delta.cos())).to_deg().0.abs()
    }
}

impl Add for Deg {
    type Output = Deg;
    fn add(self, rhs: Deg) -> Deg {
        Deg(self.0 + rhs.0)
    }
}

impl Sub for Deg {
    type Output = Deg;
    fn sub(self, rhs: Deg) -> Deg {
        Deg(self.0 - rhs.0)
    }
}

impl Neg for Deg {
    type Output = Deg;
    fn neg(self) -> Deg {
        Deg(-self.0)
    }
}

impl fmt::Display for Deg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}°", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_range() {
        assert_eq!(Deg(190.0).normalize(), Deg(-170.0));
        assert_eq!(Deg(-190.0).normalize(), Deg(170.0));
        assert_eq!(Deg(180.0).normalize(), Deg(180.0));
        assert_eq!(Deg(-180.0).normalize(), Deg(180.0));
        assert_eq!(Deg(720.0).normalize(), Deg(0.0));
    }

    #[test]
    fn test_from_sin_cos_negative_zero() {
        // atan2(-0.0, -1.0) = -π，必须折叠到 180
        let angle = Deg::from_sin_cos(-0.0, -1.0).0;
        assert!(angle > 0.0 && (angle - 180.0).abs() < 1e-9, "angle = {}", angle);
    }

    #[test]
    fn test_distance_across_wrap() {
        let d = Deg(179.0).distance(Deg(-179.0));
        assert!((d - 2.0).abs() < 1e-9, "distance = {}", d);
        assert!((Deg(10.0).distance(Deg(370.0))).abs() < 1e-9);
    }
}
