use crate::{constants::WHEEL_COUNT, suspension::WheelIndex};
use nalgebra::{Point3, UnitQuaternion};
use tracing::debug;

/// Named attachment point of the host model, in body space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attachment {
    pub origin: Point3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl Attachment {
    pub fn at(origin: Point3<f64>) -> Self {
        Self {
            origin,
            rotation: UnitQuaternion::identity(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoseParameterId(pub usize);

/// Capability interface of the entity that owns the animated model.
pub trait PoseHost {
    fn lookup_pose_parameter(&self, name: &str) -> Option<PoseParameterId>;

    fn pose_parameter(&self, id: PoseParameterId) -> f64;

    /// Returns the value actually stored, after any range clamping the host does.
    fn set_pose_parameter(&mut self, id: PoseParameterId, value: f64) -> f64;

    fn attachment(&self, name: &str) -> Option<Attachment>;

    /// Called after pose changes that attachment queries must observe.
    fn invalidate_bone_cache(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoseParameter {
    WheelHeight(WheelIndex),
    WheelSpin(WheelIndex),
    Steer,
    Action,
    Speedometer,
}

const POSE_PARAMETER_COUNT: usize = 2 * WHEEL_COUNT + 3;

impl PoseParameter {
    pub const ALL: [PoseParameter; POSE_PARAMETER_COUNT] = [
        Self::WheelHeight(WheelIndex::FrontLeft),
        Self::WheelHeight(WheelIndex::FrontRight),
        Self::WheelHeight(WheelIndex::RearLeft),
        Self::WheelHeight(WheelIndex::RearRight),
        Self::WheelSpin(WheelIndex::FrontLeft),
        Self::WheelSpin(WheelIndex::FrontRight),
        Self::WheelSpin(WheelIndex::RearLeft),
        Self::WheelSpin(WheelIndex::RearRight),
        Self::Steer,
        Self::Action,
        Self::Speedometer,
    ];

    pub fn name(self) -> &'static str {
        use WheelIndex::*;

        match self {
            Self::WheelHeight(FrontLeft) => "vehicle_wheel_fl_height",
            Self::WheelHeight(FrontRight) => "vehicle_wheel_fr_height",
            Self::WheelHeight(RearLeft) => "vehicle_wheel_rl_height",
            Self::WheelHeight(RearRight) => "vehicle_wheel_rr_height",
            Self::WheelSpin(FrontLeft) => "vehicle_wheel_fl_spin",
            Self::WheelSpin(FrontRight) => "vehicle_wheel_fr_spin",
            Self::WheelSpin(RearLeft) => "vehicle_wheel_rl_spin",
            Self::WheelSpin(RearRight) => "vehicle_wheel_rr_spin",
            Self::Steer => "vehicle_steer",
            Self::Action => "vehicle_action",
            // the model asset spells it this way
            Self::Speedometer => "vehicle_guage",
        }
    }

    fn slot(self) -> usize {
        match self {
            Self::WheelHeight(wheel) => wheel.index(),
            Self::WheelSpin(wheel) => WHEEL_COUNT + wheel.index(),
            Self::Steer => 2 * WHEEL_COUNT,
            Self::Action => 2 * WHEEL_COUNT + 1,
            Self::Speedometer => 2 * WHEEL_COUNT + 2,
        }
    }
}

/// Pose parameter ids resolved once at spawn. Parameters the model lacks stay
/// unbound and writes to them are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseBindings {
    ids: [Option<PoseParameterId>; POSE_PARAMETER_COUNT],
}

impl PoseBindings {
    pub fn resolve<H>(host: &H) -> Self
    where
        H: PoseHost + ?Sized,
    {
        let mut ids = [None; POSE_PARAMETER_COUNT];
        for param in PoseParameter::ALL {
            let id = host.lookup_pose_parameter(param.name());
            if id.is_none() {
                debug!(name = param.name(), "model has no pose parameter");
            }
            ids[param.slot()] = id;
        }
        Self { ids }
    }

    pub fn get(&self, param: PoseParameter) -> Option<PoseParameterId> {
        self.ids[param.slot()]
    }

    pub fn set<H>(&self, host: &mut H, param: PoseParameter, value: f64)
    where
        H: PoseHost + ?Sized,
    {
        if let Some(id) = self.get(param) {
            host.set_pose_parameter(id, value);
        }
    }

    /// Sets all four wheel heights and refreshes the host's bone cache.
    pub fn set_wheel_heights<H>(&self, host: &mut H, value: f64)
    where
        H: PoseHost + ?Sized,
    {
        for wheel in WheelIndex::ALL {
            self.set(host, PoseParameter::WheelHeight(wheel), value);
        }
        host.invalidate_bone_cache();
    }

    /// Spawn-time neutral pose.
    pub fn neutralize<H>(&self, host: &mut H)
    where
        H: PoseHost + ?Sized,
    {
        self.set(host, PoseParameter::Speedometer, 0.0);
        self.set(host, PoseParameter::Steer, 0.0);
        self.set_wheel_heights(host, 0.0);
    }

    pub fn apply<H>(&self, host: &mut H, pose: &VehiclePose)
    where
        H: PoseHost + ?Sized,
    {
        for wheel in WheelIndex::ALL {
            self.set(
                host,
                PoseParameter::WheelHeight(wheel),
                pose.wheel_height[wheel.index()],
            );
            self.set(
                host,
                PoseParameter::WheelSpin(wheel),
                pose.wheel_spin[wheel.index()],
            );
        }
        self.set(host, PoseParameter::Steer, pose.steer);
        self.set(host, PoseParameter::Action, pose.action);
        if let Some(speedometer) = pose.speedometer {
            self.set(host, PoseParameter::Speedometer, speedometer);
        }
    }
}

/// Animation-ready values for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehiclePose {
    /// Normalized suspension compression in `[0, 1]`.
    pub wheel_height: [f64; WHEEL_COUNT],
    /// Wheel spin in degrees.
    pub wheel_spin: [f64; WHEEL_COUNT],
    pub steer: f64,
    /// Steer angle of the wheels in degrees.
    pub steer_angle_degrees: f64,
    pub action: f64,
    /// Only written while the vehicle is powered on.
    pub speedometer: Option<f64>,
}
