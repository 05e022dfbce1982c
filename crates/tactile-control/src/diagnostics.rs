//! 积分饱和诊断
//!
//! 积分项连续多步停在钳位边界上，说明存在控制器无法消除的持续扰动。
//! 这只是可观测性信号，不会中止 episode。

use crate::params::IntegralClip;
use serde::Serialize;
use std::fmt;
use tactile_codec::{Axis, POSE_DOF, PoseVector};
use tracing::warn;

/// 默认窗口（连续饱和步数）
pub const DEFAULT_SATURATION_WINDOW: usize = 20;

/// 饱和的边界
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipBound {
    Lower,
    Upper,
}

impl fmt::Display for ClipBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipBound::Lower => f.write_str("lower"),
            ClipBound::Upper => f.write_str("upper"),
        }
    }
}

/// 饱和告警
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SaturationWarning {
    pub axis: Axis,
    /// 本轮饱和开始的步号
    pub since_step: usize,
    pub bound: ClipBound,
}

impl fmt::Display for SaturationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "integral on {} saturated at {} bound since step {}",
            self.axis, self.bound, self.since_step
        )
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct AxisRun {
    bound: Option<ClipBound>,
    since_step: usize,
    length: usize,
    reported: bool,
}

/// 饱和监视器
///
/// 每轴独立计数；钳位区间退化（`lower == upper`）的轴不参与监视。
/// 同一轮饱和只告警一次，离开边界后重新计数。
#[derive(Debug, Clone)]
pub struct SaturationMonitor {
    clip: IntegralClip,
    window: usize,
    runs: [AxisRun; POSE_DOF],
}

impl SaturationMonitor {
    pub fn new(clip: IntegralClip, window: usize) -> Self {
        Self {
            clip,
            window: window.max(1),
            runs: [AxisRun::default(); POSE_DOF],
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// 观察一步后的积分状态，返回本步新产生的告警
    pub fn observe(&mut self, step: usize, integral: &PoseVector) -> Vec<SaturationWarning> {
        let mut warnings = Vec::new();

        for axis in Axis::ALL {
            if self.clip.is_degenerate(axis) {
                continue;
            }
            let value = integral[axis];
            let bound = if value <= self.clip.lower[axis] {
                Some(ClipBound::Lower)
            } else if value >= self.clip.upper[axis] {
                Some(ClipBound::Upper)
            } else {
                None
            };

            let run = &mut self.runs[axis.index()];
            match bound {
                None => *run = AxisRun::default(),
                Some(b) if run.bound == Some(b) => run.length += 1,
                Some(b) => {
                    *run = AxisRun {
                        bound: Some(b),
                        since_step: step,
                        length: 1,
                        reported: false,
                    };
                }
            }

            let Some(bound) = run.bound else {
                continue;
            };
            if run.length >= self.window && !run.reported {
                run.reported = true;
                let warning = SaturationWarning {
                    axis,
                    since_step: run.since_step,
                    bound,
                };
                warn!("PID {}", warning);
                warnings.push(warning);
            }
        }

        warnings
    }

    /// 清空计数（新 episode）
    pub fn reset(&mut self) {
        self.runs = [AxisRun::default(); POSE_DOF];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> IntegralClip {
        IntegralClip::new(
            PoseVector::from_parts(-5.0, 0.0, 0.0, 0.0, 0.0, -45.0),
            PoseVector::from_parts(5.0, 0.0, 0.0, 0.0, 0.0, 45.0),
        )
    }

    fn at_x(x: f64) -> PoseVector {
        PoseVector::from_parts(x, 0.0, 0.0, 0.0, 0.0, 0.0)
    }

    #[test]
    fn test_warns_once_after_window() {
        let mut monitor = SaturationMonitor::new(clip(), 3);
        assert!(monitor.observe(0, &at_x(1.0)).is_empty());
        assert!(monitor.observe(1, &at_x(5.0)).is_empty());
        assert!(monitor.observe(2, &at_x(5.0)).is_empty());

        let warnings = monitor.observe(3, &at_x(5.0));
        assert_eq!(
            warnings,
            vec![SaturationWarning {
                axis: Axis::X,
                since_step: 1,
                bound: ClipBound::Upper
            }]
        );

        // 同一轮饱和不重复告警
        assert!(monitor.observe(4, &at_x(5.0)).is_empty());
    }

    #[test]
    fn test_run_restarts_after_leaving_bound() {
        let mut monitor = SaturationMonitor::new(clip(), 2);
        monitor.observe(0, &at_x(-5.0));
        assert_eq!(monitor.observe(1, &at_x(-5.0)).len(), 1);
        monitor.observe(2, &at_x(0.0));
        monitor.observe(3, &at_x(-5.0));
        let warnings = monitor.observe(4, &at_x(-5.0));
        assert_eq!(warnings[0].since_step, 3);
        assert_eq!(warnings[0].bound, ClipBound::Lower);
    }

    #[test]
    fn test_switching_bound_starts_new_run() {
        let mut monitor = SaturationMonitor::new(clip(), 2);
        monitor.observe(0, &at_x(5.0));
        assert!(monitor.observe(1, &at_x(-5.0)).is_empty());
    }

    #[test]
    fn test_degenerate_axes_ignored() {
        // y 轴区间为 [0, 0]，积分恒为 0，不应视为饱和
        let mut monitor = SaturationMonitor::new(clip(), 1);
        assert!(monitor.observe(0, &PoseVector::ZERO).is_empty());
    }
}
