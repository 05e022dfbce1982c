//! 仿真协作者
//!
//! 无硬件地运行伺服循环：机器人、传感器与估计器共享一个 [`SimWorld`]。
//! 传感器帧直接携带接触点处的真实位姿，估计器把它编码成模型输出（可加均匀噪声）。
//!
//! 接触位姿定义为 TCP 在刺激物局部坐标系中的位姿：
//!
//! - 直边：局部 y 轴沿边缘方向，x 轴垂直于边缘，原点为 TCP 在边缘上的投影
//! - 圆：x 轴沿径向向外，原点为 TCP 在圆周上的投影
//! - 平面（z = 0）：原点在 TCP 正下方，与基座坐标系同向

use crate::error::CollaboratorError;
use crate::se3::{compose, relative_to};
use crate::servo::{MotionCommand, PoseEstimator, RobotDriver, TactileSensor};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tactile_codec::{Axis, PoseLabelCodec, PoseVector};
use tracing::trace;

/// 仿真刺激物
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stimulus {
    /// 过原点的直边，`angle_deg` 为边缘方向与基座 x 轴的夹角
    Edge { angle_deg: f64 },
    /// 圆心在原点的圆
    Circle { radius_mm: f64 },
    /// z = 0 平面
    Surface,
}

impl Stimulus {
    /// 刺激物在 `tcp` 附近的局部坐标系
    pub fn local_frame(&self, tcp: &PoseVector) -> PoseVector {
        let (x, y) = (tcp[Axis::X], tcp[Axis::Y]);
        match *self {
            Stimulus::Edge { angle_deg } => {
                let (sin, cos) = angle_deg.to_radians().sin_cos();
                let along = x * cos + y * sin;
                PoseVector::from_parts(along * cos, along * sin, 0.0, 0.0, 0.0, angle_deg - 90.0)
            },
            Stimulus::Circle { radius_mm } => {
                let phi = y.atan2(x);
                PoseVector::from_parts(
                    radius_mm * phi.cos(),
                    radius_mm * phi.sin(),
                    0.0,
                    0.0,
                    0.0,
                    phi.to_degrees(),
                )
            },
            Stimulus::Surface => PoseVector::from_parts(x, y, 0.0, 0.0, 0.0, 0.0),
        }
    }

    /// TCP 相对刺激物的接触位姿
    pub fn contact_pose(&self, tcp: &PoseVector) -> PoseVector {
        relative_to(tcp, &self.local_frame(tcp))
    }
}

/// 仿真世界
#[derive(Debug, Clone, PartialEq)]
pub struct SimWorld {
    pub tcp: PoseVector,
    pub stimulus: Stimulus,
}

/// 共享世界状态
pub type SharedWorld = Arc<Mutex<SimWorld>>;

impl SimWorld {
    pub fn shared(stimulus: Stimulus) -> SharedWorld {
        Arc::new(Mutex::new(SimWorld {
            tcp: PoseVector::ZERO,
            stimulus,
        }))
    }
}

/// 仿真机器人：理想执行，立即到位
#[derive(Debug, Clone)]
pub struct SimRobot {
    world: SharedWorld,
    commands: Vec<MotionCommand>,
    motions: usize,
    reads: usize,
    fail_motion_at: Option<usize>,
    fail_read_at: Option<usize>,
}

impl SimRobot {
    pub fn new(world: SharedWorld) -> Self {
        Self {
            world,
            commands: Vec::new(),
            motions: 0,
            reads: 0,
            fail_motion_at: None,
            fail_read_at: None,
        }
    }

    /// 第 `motion` 条运动指令（从 0 计，第 0 条为移动到起始位姿）失败
    pub fn fail_motion_at(mut self, motion: usize) -> Self {
        self.fail_motion_at = Some(motion);
        self
    }

    /// 第 `read` 次状态读取（从 0 计）失败
    pub fn fail_read_at(mut self, read: usize) -> Self {
        self.fail_read_at = Some(read);
        self
    }

    /// 已执行的全部指令（不含失败的指令）
    pub fn commands(&self) -> &[MotionCommand] {
        &self.commands
    }
}

impl RobotDriver for SimRobot {
    fn send_motion(&mut self, command: &MotionCommand) -> Result<(), CollaboratorError> {
        let index = self.motions;
        self.motions += 1;
        if self.fail_motion_at == Some(index) {
            return Err(CollaboratorError::Robot(format!(
                "simulated motion failure at command {}",
                index
            )));
        }

        let mut world = self.world.lock();
        world.tcp = match command {
            MotionCommand::MoveTo(pose) => *pose,
            MotionCommand::MoveRelative(delta) => compose(&world.tcp, delta),
        };
        self.commands.push(*command);
        Ok(())
    }

    fn read_state(&mut self) -> Result<PoseVector, CollaboratorError> {
        let index = self.reads;
        self.reads += 1;
        if self.fail_read_at == Some(index) {
            return Err(CollaboratorError::Robot(format!(
                "simulated state read failure at read {}",
                index
            )));
        }
        Ok(self.world.lock().tcp)
    }
}

/// 仿真帧
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimFrame {
    pub contact_pose: PoseVector,
}

/// 仿真传感器
#[derive(Debug, Clone)]
pub struct SimSensor {
    world: SharedWorld,
    captured: usize,
    fail_at: Option<usize>,
}

impl SimSensor {
    pub fn new(world: SharedWorld) -> Self {
        Self {
            world,
            captured: 0,
            fail_at: None,
        }
    }

    /// 第 `capture` 次采集（从 0 计）失败
    pub fn fail_at(mut self, capture: usize) -> Self {
        self.fail_at = Some(capture);
        self
    }

    pub fn captured(&self) -> usize {
        self.captured
    }
}

impl TactileSensor for SimSensor {
    type Frame = SimFrame;

    fn capture_frame(&mut self) -> Result<SimFrame, CollaboratorError> {
        let index = self.captured;
        self.captured += 1;
        if self.fail_at == Some(index) {
            return Err(CollaboratorError::Sensor(format!(
                "simulated capture failure at frame {}",
                index
            )));
        }

        let world = self.world.lock();
        Ok(SimFrame {
            contact_pose: world.stimulus.contact_pose(&world.tcp),
        })
    }
}

/// 仿真估计器：把真实接触位姿编码为模型输出
#[derive(Debug, Clone)]
pub struct SimEstimator {
    codec: PoseLabelCodec,
    noise: f64,
    rng: StdRng,
}

impl SimEstimator {
    pub fn new(codec: PoseLabelCodec) -> Self {
        Self {
            codec,
            noise: 0.0,
            rng: StdRng::seed_from_u64(0),
        }
    }

    /// 每个分量加 `[-noise, noise]` 均匀噪声（毫米 / 度）
    pub fn with_noise(mut self, noise: f64, seed: u64) -> Self {
        self.noise = noise.abs();
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl PoseEstimator<SimFrame> for SimEstimator {
    fn infer(&mut self, frame: &SimFrame) -> Result<Vec<f64>, CollaboratorError> {
        let pose = if self.noise > 0.0 {
            let noise = self.noise;
            let rng = &mut self.rng;
            frame.contact_pose.map(|v| v + rng.gen_range(-noise..=noise))
        } else {
            frame.contact_pose
        };
        trace!("sim contact pose {}", pose);

        self.codec
            .encode_pose(&pose)
            .map(|encoded| encoded.into_vec())
            .map_err(|e| CollaboratorError::Estimator(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::Task;
    use crate::se3::assert_pose_near;

    #[test]
    fn test_edge_contact_pose() {
        // 沿 y 轴的边缘，TCP 在其右侧 2mm，偏转 20°
        let edge = Stimulus::Edge { angle_deg: 90.0 };
        let tcp = PoseVector::from_parts(2.0, 7.0, 0.0, 0.0, 0.0, 20.0);
        assert_pose_near(
            &edge.contact_pose(&tcp),
            &PoseVector::from_parts(2.0, 0.0, 0.0, 0.0, 0.0, 20.0),
            1e-9,
        );
    }

    #[test]
    fn test_circle_contact_pose() {
        let circle = Stimulus::Circle { radius_mm: 40.0 };
        let tcp = PoseVector::from_parts(0.0, 43.0, 0.0, 0.0, 0.0, 100.0);
        assert_pose_near(
            &circle.contact_pose(&tcp),
            &PoseVector::from_parts(3.0, 0.0, 0.0, 0.0, 0.0, 10.0),
            1e-9,
        );
    }

    #[test]
    fn test_surface_contact_pose() {
        let tcp = PoseVector::from_parts(10.0, -4.0, 2.5, 5.0, -3.0, 0.0);
        assert_pose_near(
            &Stimulus::Surface.contact_pose(&tcp),
            &PoseVector::from_parts(0.0, 0.0, 2.5, 5.0, -3.0, 0.0),
            1e-9,
        );
    }

    #[test]
    fn test_robot_applies_relative_motion_in_tool_frame() {
        let world = SimWorld::shared(Stimulus::Surface);
        let mut robot = SimRobot::new(world.clone());
        robot
            .send_motion(&MotionCommand::MoveTo(PoseVector::from_parts(
                0.0, 0.0, 0.0, 0.0, 0.0, 90.0,
            )))
            .unwrap();
        robot
            .send_motion(&MotionCommand::MoveRelative(PoseVector::from_parts(
                1.0, 0.0, 0.0, 0.0, 0.0, 0.0,
            )))
            .unwrap();
        assert_pose_near(
            &robot.read_state().unwrap(),
            &PoseVector::from_parts(0.0, 1.0, 0.0, 0.0, 0.0, 90.0),
            1e-9,
        );
        assert_eq!(robot.commands().len(), 2);
    }

    #[test]
    fn test_robot_fault_injection() {
        let world = SimWorld::shared(Stimulus::Surface);
        let mut robot = SimRobot::new(world).fail_motion_at(1).fail_read_at(0);
        let step = MotionCommand::MoveRelative(PoseVector::from_parts(1.0, 0.0, 0.0, 0.0, 0.0, 0.0));

        assert!(robot.send_motion(&step).is_ok());
        assert!(matches!(robot.send_motion(&step), Err(CollaboratorError::Robot(_))));
        assert!(robot.send_motion(&step).is_ok());
        // 失败的指令不生效
        assert_eq!(robot.commands().len(), 2);

        assert!(matches!(robot.read_state(), Err(CollaboratorError::Robot(_))));
        assert_pose_near(
            &robot.read_state().unwrap(),
            &PoseVector::from_parts(2.0, 0.0, 0.0, 0.0, 0.0, 0.0),
            1e-9,
        );
    }

    #[test]
    fn test_sensor_fault_injection() {
        let world = SimWorld::shared(Stimulus::Surface);
        let mut sensor = SimSensor::new(world).fail_at(1);
        assert!(sensor.capture_frame().is_ok());
        assert!(matches!(
            sensor.capture_frame(),
            Err(CollaboratorError::Sensor(_))
        ));
        assert!(sensor.capture_frame().is_ok());
        assert_eq!(sensor.captured(), 3);
    }

    #[test]
    fn test_estimator_output_decodes_to_contact() {
        let codec = PoseLabelCodec::new(Task::Edge2d.label_spec());
        let mut estimator = SimEstimator::new(codec.clone());
        let frame = SimFrame {
            contact_pose: PoseVector::from_parts(1.5, 0.0, 0.0, 0.0, 0.0, -12.0),
        };
        let raw = estimator.infer(&frame).unwrap();
        assert_eq!(raw.len(), codec.out_dim());
        let pose = codec.predict(&raw).unwrap();
        assert!((pose[Axis::X] - 1.5).abs() < 1e-9);
        assert!((pose[Axis::Yaw] + 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_noise_is_seeded() {
        let codec = PoseLabelCodec::new(Task::Edge2d.label_spec());
        let frame = SimFrame {
            contact_pose: PoseVector::ZERO,
        };
        let mut a = SimEstimator::new(codec.clone()).with_noise(0.5, 7);
        let mut b = SimEstimator::new(codec).with_noise(0.5, 7);
        assert_eq!(a.infer(&frame).unwrap(), b.infer(&frame).unwrap());
    }
}
