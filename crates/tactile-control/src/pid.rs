//! 逐轴 PI 控制器
//!
//! 积分项先累加再钳位（抗饱和），输出为 `kp ⊙ e + integral`。
//! 比例项不做钳位。
//!
//! # Type State
//!
//! 控制器必须经过 `reset()` 才能运行，因此每个 episode 都从干净的积分状态开始：
//!
//! ```rust
//! use tactile_control::{PidController, Task};
//! use tactile_codec::PoseVector;
//!
//! let params = *Task::Edge2d.control_params().pid_params();
//! let mut pid = PidController::new(&params).reset();
//! let output = pid.step(&PoseVector::from_parts(2.0, 0.0, 0.0, 0.0, 0.0, 0.0), 1.0);
//! assert!(output[tactile_codec::Axis::X] > 0.0);
//! ```

use crate::params::{IntegralClip, PidParams};
use tactile_codec::PoseVector;
use tracing::warn;

/// 未初始化（积分状态未定义）
#[derive(Debug, Clone, Copy)]
pub struct Uninitialized;

/// 运行中
#[derive(Debug, Clone, Copy)]
pub struct Running;

/// PI 控制器
#[derive(Debug, Clone)]
pub struct PidController<State = Uninitialized> {
    kp: PoseVector,
    ki: PoseVector,
    clip: IntegralClip,
    integral: PoseVector,
    steps: u64,
    _state: State,
}

impl PidController<Uninitialized> {
    pub fn new(params: &PidParams) -> Self {
        Self {
            kp: params.kp,
            ki: params.ki,
            clip: params.ei_clip,
            integral: PoseVector::ZERO,
            steps: 0,
            _state: Uninitialized,
        }
    }

    /// 清零积分状态并进入运行态
    pub fn reset(self) -> PidController<Running> {
        PidController {
            kp: self.kp,
            ki: self.ki,
            clip: self.clip,
            integral: PoseVector::ZERO,
            steps: 0,
            _state: Running,
        }
    }
}

impl PidController<Running> {
    /// 执行一步控制
    ///
    /// `dt <= 0`（或非有限）时跳过积分更新，只输出比例项加上当前积分。
    pub fn step(&mut self, error: &PoseVector, dt: f64) -> PoseVector {
        if dt > 0.0 && dt.is_finite() {
            let increment = self.ki.map_with(*error, |ki, e| ki * e * dt);
            let accumulated = self.integral.map_with(increment, |i, d| i + d);
            self.integral = self.clip.clip(&accumulated);
        } else {
            warn!("Non-positive dt {}, skipping integral update", dt);
        }
        self.steps += 1;

        self.kp
            .map_with(*error, |kp, e| kp * e)
            .map_with(self.integral, |p, i| p + i)
    }

    /// 清零积分（episode 之间调用）
    pub fn reset(&mut self) {
        self.integral = PoseVector::ZERO;
        self.steps = 0;
    }

    /// 当前积分状态
    pub fn integral(&self) -> &PoseVector {
        &self.integral
    }

    /// 自上次重置以来的步数
    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl<State> PidController<State> {
    /// 积分钳位区间
    pub fn clip(&self) -> &IntegralClip {
        &self.clip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::se3::Se3ErrorKind;
    use proptest::prelude::*;
    use tactile_codec::Axis;

    fn single_axis_params() -> PidParams {
        PidParams {
            kp: PoseVector::from_parts(0.5, 0.0, 0.0, 0.0, 0.0, 0.0),
            ki: PoseVector::from_parts(0.3, 0.0, 0.0, 0.0, 0.0, 0.0),
            ei_clip: IntegralClip::new(
                PoseVector::from_parts(-5.0, 0.0, 0.0, 0.0, 0.0, 0.0),
                PoseVector::from_parts(5.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            ),
            error: Se3ErrorKind::default(),
        }
    }

    #[test]
    fn test_integral_accumulates() {
        let mut pid = PidController::new(&single_axis_params()).reset();
        let error = PoseVector::from_parts(2.0, 0.0, 0.0, 0.0, 0.0, 0.0);

        let mut output = PoseVector::ZERO;
        for _ in 0..3 {
            output = pid.step(&error, 1.0);
        }

        // 积分 3 × 0.3 × 2 = 1.8，输出 0.5 × 2 + 1.8 = 2.8
        assert!((pid.integral()[Axis::X] - 1.8).abs() < 1e-12);
        assert!((output[Axis::X] - 2.8).abs() < 1e-12);
        assert_eq!(pid.steps(), 3);
    }

    #[test]
    fn test_integral_is_clipped() {
        let mut pid = PidController::new(&single_axis_params()).reset();
        let error = PoseVector::from_parts(100.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let output = pid.step(&error, 1.0);

        assert_eq!(pid.integral()[Axis::X], 5.0);
        // 比例项不钳位
        assert_eq!(output[Axis::X], 55.0);
    }

    #[test]
    fn test_zero_clip_disables_integral_axis() {
        let mut pid = PidController::new(&single_axis_params()).reset();
        let error = PoseVector::from_parts(0.0, 3.0, 0.0, 0.0, 0.0, 0.0);
        pid.step(&error, 1.0);
        assert_eq!(pid.integral()[Axis::Y], 0.0);
    }

    #[test]
    fn test_non_positive_dt_skips_integral() {
        let mut pid = PidController::new(&single_axis_params()).reset();
        let error = PoseVector::from_parts(2.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let output = pid.step(&error, 0.0);
        assert_eq!(pid.integral()[Axis::X], 0.0);
        assert_eq!(output[Axis::X], 1.0);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut pid = PidController::new(&single_axis_params()).reset();
        pid.step(&PoseVector::from_parts(2.0, 0.0, 0.0, 0.0, 0.0, 0.0), 1.0);
        pid.reset();
        assert_eq!(*pid.integral(), PoseVector::ZERO);
        assert_eq!(pid.steps(), 0);
    }

    fn pose_strategy(range: f64) -> impl Strategy<Value = PoseVector> {
        proptest::array::uniform6(-range..range).prop_map(PoseVector::new)
    }

    proptest! {
        #[test]
        fn integral_stays_within_clip(
            errors in proptest::collection::vec(pose_strategy(50.0), 1..40),
            dt in 0.01..2.0f64,
        ) {
            let params = *crate::params::Task::Edge5d.control_params().pid_params();
            let mut pid = PidController::new(&params).reset();
            for error in &errors {
                pid.step(error, dt);
                for axis in Axis::ALL {
                    let value = pid.integral()[axis];
                    prop_assert!(value >= params.ei_clip.lower[axis]);
                    prop_assert!(value <= params.ei_clip.upper[axis]);
                }
            }
        }

        #[test]
        fn step_is_deterministic(
            errors in proptest::collection::vec(pose_strategy(10.0), 1..20),
        ) {
            let params = *crate::params::Task::Edge3d.control_params().pid_params();
            let mut a = PidController::new(&params).reset();
            let mut b = PidController::new(&params).reset();
            for error in &errors {
                prop_assert_eq!(a.step(error, 1.0), b.step(error, 1.0));
            }
        }
    }
}
