#![allow(dead_code)]

use fourwheel_control::{
    pose::PoseParameter, suspension::WheelIndex, Attachment, BodyHandle, ControlState,
    OperatingParams, PhysicsSolver, PoseHost, PoseParameterId, SolverError, VehicleController,
    VehicleControllerInit, VehicleDescriptor, VehicleHandle, VehicleParameters,
    VehicleTuningConfig, WheelHandle,
};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion};
use std::collections::HashMap;

pub const BODY: BodyHandle = BodyHandle(7);
pub const BASE_HEIGHT: f64 = 10.0;
pub const TRAVEL: f64 = 4.0;

/// Scriptable stand-in for a rigid-body solver. Tests set the post-step
/// state directly.
#[derive(Debug)]
pub struct MockSolver {
    pub online: bool,
    pub fail_create: bool,
    pub wheel_count: usize,
    pub body: Isometry3<f64>,
    pub wheels: [Isometry3<f64>; 4],
    pub contacts: [Point3<f64>; 4],
    pub operating: OperatingParams,
    pub engine_disabled: bool,
    pub carried: bool,
    pub motion: [bool; 4],
    pub booster_left: f64,
    pub steps: Vec<ControlState>,
    pub created: Vec<VehicleHandle>,
    pub destroyed: Vec<VehicleHandle>,
}

impl Default for MockSolver {
    fn default() -> Self {
        Self {
            online: true,
            fail_create: false,
            wheel_count: 4,
            body: Isometry3::identity(),
            wheels: WheelIndex::ALL.map(|wheel| wheel_at(wheel, BASE_HEIGHT, 0.0)),
            contacts: WheelIndex::ALL.map(|wheel| {
                let (x, y) = wheel_xy(wheel);
                Point3::new(x, y, 0.0)
            }),
            operating: OperatingParams::default(),
            engine_disabled: false,
            carried: false,
            motion: [true; 4],
            booster_left: 0.0,
            steps: vec![],
            created: vec![],
            destroyed: vec![],
        }
    }
}

pub fn wheel_xy(wheel: WheelIndex) -> (f64, f64) {
    let x = if wheel.axle() == 0 { 30.0 } else { -30.0 };
    let y = if wheel.index() % 2 == 0 { -20.0 } else { 20.0 };
    (x, y)
}

/// Wheel transform at body-space height `z`, rolled by `roll_degrees`.
pub fn wheel_at(wheel: WheelIndex, z: f64, roll_degrees: f64) -> Isometry3<f64> {
    let (x, y) = wheel_xy(wheel);
    Isometry3::from_parts(
        Translation3::new(x, y, z),
        UnitQuaternion::from_euler_angles(roll_degrees.to_radians(), 0.0, 0.0),
    )
}

impl MockSolver {
    pub fn set_speed(&mut self, speed: f64) {
        self.operating.speed = speed;
    }
}

impl PhysicsSolver for MockSolver {
    fn create_vehicle(
        &mut self,
        _body: BodyHandle,
        _params: &VehicleParameters,
    ) -> Result<VehicleHandle, SolverError> {
        if self.fail_create {
            return Err(SolverError::CreateFailed("no constraint slots".into()));
        }
        let handle = VehicleHandle(self.created.len() as u64 + 1);
        self.created.push(handle);
        Ok(handle)
    }

    fn destroy_vehicle(&mut self, vehicle: VehicleHandle) {
        self.destroyed.push(vehicle);
    }

    fn wheel_handles(&self, _vehicle: VehicleHandle) -> Vec<WheelHandle> {
        (0..self.wheel_count as u64).map(WheelHandle).collect()
    }

    fn step(&mut self, _vehicle: VehicleHandle, controls: &ControlState, _time_delta_sec: f64) {
        self.steps.push(*controls);
    }

    fn body_transform(&self, _body: BodyHandle) -> Option<Isometry3<f64>> {
        self.online.then_some(self.body)
    }

    fn wheel_transform(&self, wheel: WheelHandle) -> Option<Isometry3<f64>> {
        if !self.online {
            return None;
        }
        self.wheels.get(wheel.0 as usize).copied()
    }

    fn set_wheel_transform(&mut self, wheel: WheelHandle, transform: &Isometry3<f64>) {
        if let Some(slot) = self.wheels.get_mut(wheel.0 as usize) {
            *slot = *transform;
        }
    }

    fn operating_params(&self, _vehicle: VehicleHandle) -> Option<OperatingParams> {
        self.online.then_some(self.operating)
    }

    fn wheel_contact_point(
        &self,
        _vehicle: VehicleHandle,
        wheel: WheelIndex,
    ) -> Option<Point3<f64>> {
        self.online.then(|| self.contacts[wheel.index()])
    }

    fn set_engine_disabled(&mut self, _vehicle: VehicleHandle, disabled: bool) {
        self.engine_disabled = disabled;
    }

    fn is_engine_disabled(&self, _vehicle: VehicleHandle) -> bool {
        self.engine_disabled
    }

    fn update_booster(&mut self, _vehicle: VehicleHandle, time_delta_sec: f64) -> f64 {
        self.booster_left = (self.booster_left - time_delta_sec).max(0.0);
        self.booster_left
    }

    fn is_carried(&self, _body: BodyHandle) -> bool {
        self.carried
    }

    fn set_wheel_motion(&mut self, wheel: WheelHandle, enabled: bool) {
        if let Some(slot) = self.motion.get_mut(wheel.0 as usize) {
            *slot = enabled;
        }
    }
}

/// Model whose wheel attachments drop by [`TRAVEL`] as the height pose goes
/// from 0 to 1.
#[derive(Debug, Default)]
pub struct MockHost {
    pub values: HashMap<usize, f64>,
    pub missing: Vec<&'static str>,
    pub invalidations: usize,
}

impl MockHost {
    pub fn value(&self, param: PoseParameter) -> Option<f64> {
        let id = self.lookup_pose_parameter(param.name())?;
        self.values.get(&id.0).copied()
    }
}

impl PoseHost for MockHost {
    fn lookup_pose_parameter(&self, name: &str) -> Option<PoseParameterId> {
        PoseParameter::ALL
            .iter()
            .position(|param| param.name() == name)
            .map(PoseParameterId)
    }

    fn pose_parameter(&self, id: PoseParameterId) -> f64 {
        self.values.get(&id.0).copied().unwrap_or_default()
    }

    fn set_pose_parameter(&mut self, id: PoseParameterId, value: f64) -> f64 {
        self.values.insert(id.0, value);
        value
    }

    fn attachment(&self, name: &str) -> Option<Attachment> {
        if self.missing.contains(&name) {
            return None;
        }
        let wheel = WheelIndex::ALL
            .into_iter()
            .find(|wheel| wheel.attachment_name() == name)?;
        let pose = self.values.get(&wheel.index()).copied().unwrap_or_default();
        let (x, y) = wheel_xy(wheel);
        Some(Attachment::at(Point3::new(x, y, BASE_HEIGHT - pose * TRAVEL)))
    }

    fn invalidate_bone_cache(&mut self) {
        self.invalidations += 1;
    }
}

pub const JEEP: &str = r#"
    [[axles]]
    offset = [30.0, 0.0, 10.0]
    wheel_offset = [0.0, 20.0, 0.0]
    wheel_radius = 18.0

    [[axles]]
    offset = [-30.0, 0.0, 10.0]
    wheel_offset = [0.0, 20.0, 0.0]
    wheel_radius = 18.0

    [engine]
    max_speed = 30.0
    boost_max_speed = 45.0
    throttle_time = 0.0
    boost_delay = 15.0
    boost_duration = 1.0
"#;

pub fn jeep() -> VehicleDescriptor {
    VehicleDescriptor::from_toml_str(JEEP).expect("jeep descriptor parses")
}

pub fn init() -> VehicleControllerInit {
    VehicleControllerInit {
        descriptor: jeep(),
        tuning: VehicleTuningConfig::default(),
        body: BODY,
    }
}

pub fn spawn() -> (VehicleController, MockSolver, MockHost) {
    let mut solver = MockSolver::default();
    let mut host = MockHost::default();
    let controller = init()
        .build(&mut solver, &mut host)
        .expect("controller builds");
    (controller, solver, host)
}

pub fn body_offset(x: f64) -> Isometry3<f64> {
    Isometry3::translation(x, 0.0, 0.0)
}
