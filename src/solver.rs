use crate::{
    control::ControlState, error::SolverError, params::VehicleParameters, suspension::WheelIndex,
};
use nalgebra::{Isometry3, Point3};

/// Rigid body owned by the host entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub u64);

/// Vehicle constraint created by the solver on top of a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VehicleHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WheelHandle(pub u64);

/// Post-step vehicle state reported by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OperatingParams {
    /// Signed forward speed; negative while reversing.
    pub speed: f64,
    pub engine_rpm: f64,
    pub gear: i32,
    /// Current boost delay. Exceeds the configured delay while boosting.
    pub boost_delay: f64,
    /// Remaining boost as a percentage.
    pub boost_time_left: i32,
    /// Lateral slip speed.
    pub skid_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelRaycast {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
}

/// Capability interface of the external rigid-body solver.
///
/// Queries return `None` when the solver no longer knows a handle; callers
/// treat that as "keep the last known value".
pub trait PhysicsSolver {
    fn create_vehicle(
        &mut self,
        body: BodyHandle,
        params: &VehicleParameters,
    ) -> Result<VehicleHandle, SolverError>;

    fn destroy_vehicle(&mut self, vehicle: VehicleHandle);

    fn wheel_handles(&self, vehicle: VehicleHandle) -> Vec<WheelHandle>;

    fn step(&mut self, vehicle: VehicleHandle, controls: &ControlState, time_delta_sec: f64);

    fn body_transform(&self, body: BodyHandle) -> Option<Isometry3<f64>>;

    fn wheel_transform(&self, wheel: WheelHandle) -> Option<Isometry3<f64>>;

    fn set_wheel_transform(&mut self, wheel: WheelHandle, transform: &Isometry3<f64>);

    fn operating_params(&self, vehicle: VehicleHandle) -> Option<OperatingParams>;

    fn wheel_contact_point(&self, vehicle: VehicleHandle, wheel: WheelIndex)
        -> Option<Point3<f64>>;

    fn wheel_raycast(&self, _vehicle: VehicleHandle, _wheel: WheelIndex) -> Option<WheelRaycast> {
        None
    }

    fn set_engine_disabled(&mut self, vehicle: VehicleHandle, disabled: bool);

    fn is_engine_disabled(&self, vehicle: VehicleHandle) -> bool;

    /// Advances the booster timer and returns the time it still has to run.
    fn update_booster(&mut self, vehicle: VehicleHandle, time_delta_sec: f64) -> f64;

    /// Whether the body is currently driven by something else, such as a
    /// carrier that holds it kinematically.
    fn is_carried(&self, _body: BodyHandle) -> bool {
        false
    }

    fn set_wheel_motion(&mut self, wheel: WheelHandle, enabled: bool);
}
