//! 伺服循环集成测试（仿真协作者）

use tactile_codec::{Axis, DecodeError, PoseLabelCodec, PoseVector};
use tactile_control::prelude::*;
use tactile_control::{AbortReason, CollaboratorError, SimFrame};

fn edge_loop(
    stimulus: Stimulus,
    start_pose: PoseVector,
    sensor_fail_at: Option<usize>,
) -> ServoLoop<SimSensor, SimEstimator, SimRobot> {
    let task = Task::Edge2d;
    let world = SimWorld::shared(stimulus);
    let mut sensor = SimSensor::new(world.clone());
    if let Some(index) = sensor_fail_at {
        sensor = sensor.fail_at(index);
    }

    ServoLoop::new(
        sensor,
        SimEstimator::new(PoseLabelCodec::new(task.label_spec())),
        SimRobot::new(world),
        task.label_spec(),
        task.control_params(),
        ServoConfig {
            start_pose,
            ..Default::default()
        },
    )
    .unwrap()
}

fn offset_start() -> PoseVector {
    PoseVector::from_parts(2.0, 0.0, 0.0, 0.0, 0.0, 20.0)
}

#[test]
fn test_edge_2d_converges_on_straight_edge() {
    let mut servo = edge_loop(Stimulus::Edge { angle_deg: 90.0 }, offset_start(), None);
    let report = servo.run_episode();

    assert_eq!(report.outcome, EpisodeOutcome::Completed);
    assert_eq!(report.steps.len(), 50);
    assert_eq!(report.errors.len(), 50);
    assert!(report.retract_error.is_none());

    // 第一步看到初始偏移
    let first = &report.steps[0];
    assert!((first.pose[Axis::X] - 2.0).abs() < 1e-6);
    assert!((first.pose[Axis::Yaw] - 20.0).abs() < 1e-6);

    // 最后收敛到边缘上、方向对齐
    let last = report.last_step().unwrap();
    assert!(last.pose[Axis::X].abs() < 1e-2, "x = {}", last.pose[Axis::X]);
    assert!(last.pose[Axis::Yaw].abs() < 1e-1, "yaw = {}", last.pose[Axis::Yaw]);

    // 沿边缘前进（每步约 1mm）
    assert!(last.tcp_pose[Axis::Y] > 30.0, "tcp = {}", last.tcp_pose);

    // 收敛后的误差与精度（默认阈值 1）
    let errors = report.errors.column("x");
    assert!(errors.last().copied().unwrap() < 1e-2);
    assert_eq!(report.accuracy.rows().last().map(|r| r.overall), Some(true));
    assert!(report.accuracy.overall_rate().unwrap() > 0.7);
}

#[test]
fn test_edge_2d_follows_circle() {
    let mut servo = edge_loop(
        Stimulus::Circle { radius_mm: 40.0 },
        PoseVector::from_parts(42.0, 0.0, 0.0, 0.0, 0.0, 20.0),
        None,
    );
    let report = servo.run_episode();

    assert_eq!(report.outcome, EpisodeOutcome::Completed);
    let last = report.last_step().unwrap();
    assert!(last.pose[Axis::X].abs() < 0.5, "x = {}", last.pose[Axis::X]);
    assert!(last.pose[Axis::Yaw].abs() < 5.0, "yaw = {}", last.pose[Axis::Yaw]);

    // TCP 仍在圆附近
    let radius = last.tcp_pose[Axis::X].hypot(last.tcp_pose[Axis::Y]);
    assert!((radius - 40.0).abs() < 1.0, "radius = {}", radius);
}

#[test]
fn test_sensing_failure_returns_partial_report() {
    let mut servo = edge_loop(Stimulus::Edge { angle_deg: 90.0 }, offset_start(), Some(5));
    let report = servo.run_episode();

    assert!(report.is_aborted());
    assert!(matches!(
        report.outcome,
        EpisodeOutcome::Aborted {
            step: 5,
            reason: AbortReason::Sensing(CollaboratorError::Sensor(_))
        }
    ));
    assert_eq!(report.steps.len(), 5);
    assert_eq!(report.errors.len(), 5);

    // 中止后仍然回撤
    let robot = servo.robot();
    assert_eq!(
        robot.commands().last(),
        Some(&MotionCommand::MoveRelative(PoseVector::from_parts(
            0.0, 0.0, -50.0, 0.0, 0.0, 0.0
        )))
    );
}

#[test]
fn test_next_episode_starts_fresh_after_abort() {
    let mut servo = edge_loop(Stimulus::Edge { angle_deg: 90.0 }, offset_start(), Some(3));
    let aborted = servo.run_episode();
    assert!(aborted.is_aborted());

    // 新 episode 的第一步积分只包含一步的累加
    let report = servo.run_episode();
    assert_eq!(report.outcome, EpisodeOutcome::Completed);
    let first = &report.steps[0];
    let expected = first.error[Axis::X] * 0.3;
    assert!((first.integral[Axis::X] - expected).abs() < 1e-9);
}

/// 输出维度错误的估计器
struct TruncatingEstimator;

impl PoseEstimator<SimFrame> for TruncatingEstimator {
    fn infer(&mut self, _frame: &SimFrame) -> Result<Vec<f64>, CollaboratorError> {
        Ok(vec![0.0; 2])
    }
}

#[test]
fn test_decode_dimension_mismatch_aborts() {
    let task = Task::Edge2d;
    let world = SimWorld::shared(Stimulus::Edge { angle_deg: 90.0 });
    let mut servo = ServoLoop::new(
        SimSensor::new(world.clone()),
        TruncatingEstimator,
        SimRobot::new(world),
        task.label_spec(),
        task.control_params(),
        ServoConfig::default(),
    )
    .unwrap();

    let report = servo.run_episode();
    assert_eq!(
        report.outcome,
        EpisodeOutcome::Aborted {
            step: 0,
            reason: AbortReason::Decode(DecodeError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        }
    );
    assert!(report.steps.is_empty());
}

#[test]
fn test_external_abort_at_step_boundary() {
    let mut servo = edge_loop(Stimulus::Edge { angle_deg: 90.0 }, offset_start(), None);
    let handle = servo.abort_handle();

    let report = servo.run_episode_with(|record| {
        if record.step == 9 {
            handle.request();
        }
        StepDecision::Continue
    });

    assert_eq!(
        report.outcome,
        EpisodeOutcome::Aborted {
            step: 10,
            reason: AbortReason::External
        }
    );
    assert_eq!(report.steps.len(), 10);

    // 请求已被消费，下一次 episode 正常运行
    assert!(!servo.abort_handle().is_requested());
    assert_eq!(servo.run_episode().outcome, EpisodeOutcome::Completed);
}

#[test]
fn test_observer_success_signal() {
    let mut servo = edge_loop(Stimulus::Edge { angle_deg: 90.0 }, offset_start(), None);
    let report = servo.run_episode_with(|record| {
        if record.pose[Axis::X].abs() < 0.05 && record.step > 0 {
            StepDecision::Succeed
        } else {
            StepDecision::Continue
        }
    });

    match report.outcome {
        EpisodeOutcome::Succeeded { step } => {
            assert_eq!(report.steps.len(), step + 1);
            assert!(step < 50);
        },
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn test_saturation_warning_reported() {
    // 刺激物远离 TCP 可达范围：x 误差恒定，积分一直顶在边界
    let task = Task::Edge2d;
    let world = SimWorld::shared(Stimulus::Edge { angle_deg: 90.0 });
    let params = task.control_params();
    let spec = task.label_spec();
    let mut servo = ServoLoop::new(
        SimSensor::new(world.clone()),
        ConstantEstimator(
            PoseLabelCodec::new(spec.clone())
                .encode_pose(&PoseVector::from_parts(4.0, 0.0, 0.0, 0.0, 0.0, 0.0))
                .unwrap()
                .into_vec(),
        ),
        SimRobot::new(world),
        spec,
        params,
        ServoConfig {
            saturation_window: 5,
            ..Default::default()
        },
    )
    .unwrap();

    let report = servo.run_episode();
    assert_eq!(report.outcome, EpisodeOutcome::Completed);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].axis, Axis::X);
}

struct ConstantEstimator(Vec<f64>);

impl PoseEstimator<SimFrame> for ConstantEstimator {
    fn infer(&mut self, _frame: &SimFrame) -> Result<Vec<f64>, CollaboratorError> {
        Ok(self.0.clone())
    }
}

#[test]
fn test_invalid_dt_rejected() {
    let task = Task::Edge2d;
    let world = SimWorld::shared(Stimulus::Surface);
    let result = ServoLoop::new(
        SimSensor::new(world.clone()),
        SimEstimator::new(PoseLabelCodec::new(task.label_spec())),
        SimRobot::new(world),
        task.label_spec(),
        task.control_params(),
        ServoConfig {
            dt: -1.0,
            ..Default::default()
        },
    );
    assert!(result.is_err());
}

fn edge_loop_with_robot<F>(ep_len: usize, configure: F) -> ServoLoop<SimSensor, SimEstimator, SimRobot>
where
    F: FnOnce(SimRobot) -> SimRobot,
{
    let task = Task::Edge2d;
    let world = SimWorld::shared(Stimulus::Edge { angle_deg: 90.0 });
    ServoLoop::new(
        SimSensor::new(world.clone()),
        SimEstimator::new(PoseLabelCodec::new(task.label_spec())),
        configure(SimRobot::new(world)),
        task.label_spec(),
        task.control_params().with_ep_len(ep_len).unwrap(),
        ServoConfig {
            start_pose: offset_start(),
            ..Default::default()
        },
    )
    .unwrap()
}

fn retract_command() -> MotionCommand {
    MotionCommand::MoveRelative(PoseVector::from_parts(0.0, 0.0, -50.0, 0.0, 0.0, 0.0))
}

#[test]
fn test_abort_requested_during_last_step_does_not_leak() {
    let mut servo = edge_loop_with_robot(3, |robot| robot);
    let handle = servo.abort_handle();

    let first = servo.run_episode_with(|record| {
        if record.step == 2 {
            handle.request();
        }
        StepDecision::Continue
    });
    assert_eq!(first.outcome, EpisodeOutcome::Completed);
    assert!(!handle.is_requested());

    let second = servo.run_episode();
    assert_eq!(second.outcome, EpisodeOutcome::Completed);
    assert_eq!(second.steps.len(), 3);
}

#[test]
fn test_abort_requested_with_observer_abort_does_not_leak() {
    let mut servo = edge_loop_with_robot(5, |robot| robot);
    let handle = servo.abort_handle();

    let first = servo.run_episode_with(|record| {
        if record.step == 1 {
            handle.request();
            StepDecision::Abort
        } else {
            StepDecision::Continue
        }
    });
    assert_eq!(
        first.outcome,
        EpisodeOutcome::Aborted {
            step: 1,
            reason: AbortReason::External
        }
    );

    assert_eq!(servo.run_episode().outcome, EpisodeOutcome::Completed);
}

#[test]
fn test_motion_failure_aborts_with_actuation() {
    // 指令 0 为移动到起始位姿，指令 k + 1 属于第 k 步
    let mut servo = edge_loop_with_robot(10, |robot| robot.fail_motion_at(4));
    let report = servo.run_episode();

    assert!(matches!(
        report.outcome,
        EpisodeOutcome::Aborted {
            step: 3,
            reason: AbortReason::Actuation(CollaboratorError::Robot(_))
        }
    ));
    assert_eq!(report.steps.len(), 3);
    assert_eq!(report.errors.len(), 3);
    assert!(report.retract_error.is_none());
    assert_eq!(servo.robot().commands().last(), Some(&retract_command()));
}

#[test]
fn test_state_read_failure_aborts_with_actuation() {
    let mut servo = edge_loop_with_robot(10, |robot| robot.fail_read_at(2));
    let report = servo.run_episode();

    assert!(matches!(
        report.outcome,
        EpisodeOutcome::Aborted {
            step: 2,
            reason: AbortReason::Actuation(CollaboratorError::Robot(_))
        }
    ));
    assert_eq!(report.steps.len(), 2);
    assert_eq!(servo.robot().commands().last(), Some(&retract_command()));
}

#[test]
fn test_start_pose_failure_aborts_before_first_step() {
    let mut servo = edge_loop_with_robot(10, |robot| robot.fail_motion_at(0));
    let report = servo.run_episode();

    assert!(matches!(
        report.outcome,
        EpisodeOutcome::Aborted {
            step: 0,
            reason: AbortReason::Actuation(CollaboratorError::Robot(_))
        }
    ));
    assert!(report.steps.is_empty());
    assert!(report.errors.is_empty());

    // 仍然尝试回撤
    assert_eq!(servo.robot().commands(), &[retract_command()]);
}

#[test]
fn test_retract_failure_keeps_outcome() {
    // 10 步之后的第 11 条指令是回撤
    let mut servo = edge_loop_with_robot(10, |robot| robot.fail_motion_at(11));
    let report = servo.run_episode();

    assert_eq!(report.outcome, EpisodeOutcome::Completed);
    assert_eq!(report.steps.len(), 10);
    assert!(matches!(
        report.retract_error,
        Some(CollaboratorError::Robot(_))
    ));
    assert_ne!(servo.robot().commands().last(), Some(&retract_command()));
}
