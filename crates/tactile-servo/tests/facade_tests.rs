//! Facade 导出测试

use tactile_servo::prelude::*;
use tactile_servo::tools::{load_control_document, save_control_document};
use tempfile::TempDir;

#[test]
fn test_preset_from_file_runs_episode() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("control_params.json");
    save_control_document(&tactile_servo::control::preset_document(), &path).unwrap();

    let document = load_control_document(&path).unwrap();
    let task = Task::Surface3d;
    let params = document[&task].with_ep_len(20).unwrap();

    let world = SimWorld::shared(Stimulus::Surface);
    let mut servo = ServoLoop::new(
        SimSensor::new(world.clone()),
        SimEstimator::new(PoseLabelCodec::new(task.label_spec())),
        SimRobot::new(world),
        task.label_spec(),
        params,
        ServoConfig {
            start_pose: PoseVector::from_parts(0.0, 0.0, 2.0, 4.0, -3.0, 0.0),
            ..Default::default()
        },
    )
    .unwrap();

    let report = servo.run_episode();
    assert_eq!(report.outcome, EpisodeOutcome::Completed);
    assert_eq!(report.steps.len(), 20);

    // 接触深度趋向参考值 3mm，姿态趋于水平
    let last = report.steps.last().unwrap();
    assert!((last.pose[Axis::Z] - 3.0).abs() < 0.5, "pose = {}", last.pose);
    assert!(last.pose[Axis::Roll].abs() < 1.0, "pose = {}", last.pose);
    assert!(last.pose[Axis::Pitch].abs() < 1.0, "pose = {}", last.pose);
}
