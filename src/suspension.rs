use crate::{
    constants::{AXLE_COUNT, DEFAULT_WHEEL_TRAVEL, WHEEL_COUNT},
    error::CalibrationError,
    pose::{PoseBindings, PoseHost},
    solver::{BodyHandle, PhysicsSolver, VehicleHandle, WheelHandle, WheelRaycast},
};
use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WheelIndex {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
}

impl WheelIndex {
    pub const ALL: [WheelIndex; WHEEL_COUNT] = [
        Self::FrontLeft,
        Self::FrontRight,
        Self::RearLeft,
        Self::RearRight,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn axle(self) -> usize {
        self.index() / 2
    }

    pub fn attachment_name(self) -> &'static str {
        match self {
            Self::FrontLeft => "wheel_fl",
            Self::FrontRight => "wheel_fr",
            Self::RearLeft => "wheel_rl",
            Self::RearRight => "wheel_rr",
        }
    }

    pub fn raytrace_name(self) -> &'static str {
        match self {
            Self::FrontLeft => "raytrace_fl",
            Self::FrontRight => "raytrace_fr",
            Self::RearLeft => "raytrace_rl",
            Self::RearRight => "raytrace_rr",
        }
    }

    /// Left and right wheel of an axle.
    fn pair(axle: usize) -> (Self, Self) {
        if axle == 0 {
            (Self::FrontLeft, Self::FrontRight)
        } else {
            (Self::RearLeft, Self::RearRight)
        }
    }
}

/// Body-space ride height of a wheel with the suspension fully relaxed, and
/// how far it moves when fully compressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelCalibration {
    pub base_height: f64,
    pub travel: f64,
}

impl Default for WheelCalibration {
    fn default() -> Self {
        Self {
            base_height: 0.0,
            travel: DEFAULT_WHEEL_TRAVEL,
        }
    }
}

impl WheelCalibration {
    /// Suspension compression for a body-space wheel height, in `[0, 1]`.
    pub fn normalized_height(&self, height: f64) -> f64 {
        let travel = if self.travel == 0.0 || !self.travel.is_finite() {
            DEFAULT_WHEEL_TRAVEL
        } else {
            self.travel
        };
        let value = (self.base_height - height) / travel;
        if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        }
    }
}

/// Measured axle centre, right-wheel offset and spring travel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxleGeometry {
    pub offset: Vector3<f64>,
    pub wheel_offset: Vector3<f64>,
    pub travel: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaytraceGeometry {
    pub offset: Vector3<f64>,
    pub wheel_offset: Vector3<f64>,
}

/// Outcome of measuring the model at spawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SuspensionCalibration {
    wheels: [WheelCalibration; WHEEL_COUNT],
    axles: [Option<AxleGeometry>; AXLE_COUNT],
    raytraces: [Option<RaytraceGeometry>; AXLE_COUNT],
    errors: Vec<CalibrationError>,
}

impl Default for SuspensionCalibration {
    fn default() -> Self {
        Self {
            wheels: [WheelCalibration::default(); WHEEL_COUNT],
            axles: [None; AXLE_COUNT],
            raytraces: [None; AXLE_COUNT],
            errors: vec![],
        }
    }
}

impl SuspensionCalibration {
    /// Poses the wheels fully relaxed and then fully compressed, reading the
    /// wheel attachments each time. Axles with missing attachments keep the
    /// default calibration and are reported in [`errors`](Self::errors).
    pub fn measure<H>(host: &mut H, bindings: &PoseBindings) -> Self
    where
        H: PoseHost + ?Sized,
    {
        let mut calibration = Self::default();

        bindings.set_wheel_heights(host, 0.0);
        let relaxed: Vec<_> = (0..AXLE_COUNT)
            .map(|axle| calibration.read_axle(&*host, axle))
            .collect();

        bindings.set_wheel_heights(host, 1.0);
        let compressed: Vec<_> = (0..AXLE_COUNT)
            .map(|axle| relaxed[axle].and_then(|_| calibration.read_axle(&*host, axle)))
            .collect();

        bindings.set_wheel_heights(host, 0.0);

        for axle in 0..AXLE_COUNT {
            let (Some((left, right)), Some((left_low, right_low))) =
                (relaxed[axle], compressed[axle])
            else {
                continue;
            };
            let (left_wheel, right_wheel) = WheelIndex::pair(axle);

            let left_cal = WheelCalibration {
                base_height: left.z,
                travel: left.z - left_low.z,
            };
            let right_cal = WheelCalibration {
                base_height: right.z,
                travel: right.z - right_low.z,
            };
            calibration.wheels[left_wheel.index()] = left_cal;
            calibration.wheels[right_wheel.index()] = right_cal;

            let center = nalgebra::center(&left, &right);
            calibration.axles[axle] = Some(AxleGeometry {
                offset: center.coords,
                wheel_offset: right - center,
                travel: left_cal.travel,
            });
            debug!(
                axle,
                base_height = left_cal.base_height,
                travel = left_cal.travel,
                "calibrated axle"
            );
        }

        for axle in 0..AXLE_COUNT {
            let (left_wheel, right_wheel) = WheelIndex::pair(axle);
            let left = host.attachment(left_wheel.raytrace_name());
            let right = host.attachment(right_wheel.raytrace_name());
            if let (Some(left), Some(right)) = (left, right) {
                let center = nalgebra::center(&left.origin, &right.origin);
                calibration.raytraces[axle] = Some(RaytraceGeometry {
                    offset: center.coords,
                    wheel_offset: right.origin - center,
                });
            }
        }

        calibration
    }

    fn read_axle<H>(&mut self, host: &H, axle: usize) -> Option<(Point3<f64>, Point3<f64>)>
    where
        H: PoseHost + ?Sized,
    {
        let (left_wheel, right_wheel) = WheelIndex::pair(axle);
        let left = self.read_attachment(host, left_wheel.attachment_name());
        let right = self.read_attachment(host, right_wheel.attachment_name());
        Some((left?, right?))
    }

    fn read_attachment<H>(&mut self, host: &H, name: &'static str) -> Option<Point3<f64>>
    where
        H: PoseHost + ?Sized,
    {
        let attachment = host.attachment(name);
        if attachment.is_none() {
            warn!(name, "wheel attachment missing, keeping default suspension");
            self.errors.push(CalibrationError::MissingAttachment { name });
        }
        attachment.map(|attachment| attachment.origin)
    }

    pub fn wheel(&self, wheel: WheelIndex) -> &WheelCalibration {
        &self.wheels[wheel.index()]
    }

    pub fn axle(&self, index: usize) -> Option<&AxleGeometry> {
        self.axles.get(index)?.as_ref()
    }

    pub fn raytrace(&self, index: usize) -> Option<&RaytraceGeometry> {
        self.raytraces.get(index)?.as_ref()
    }

    pub fn errors(&self) -> &[CalibrationError] {
        &self.errors
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Per-wheel state sampled after each solver step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelState {
    pub position: Point3<f64>,
    pub contact_point: Point3<f64>,
    /// Normalized suspension compression in `[0, 1]`.
    pub height: f64,
    /// Spin in degrees.
    pub spin: f64,
    pub raycast: Option<WheelRaycast>,
}

impl Default for WheelState {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            contact_point: Point3::origin(),
            height: 0.0,
            spin: 0.0,
            raycast: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WheelSuspensionSampler {
    calibration: SuspensionCalibration,
    wheels: [WheelState; WHEEL_COUNT],
}

impl WheelSuspensionSampler {
    pub fn new(calibration: SuspensionCalibration) -> Self {
        Self {
            calibration,
            wheels: [WheelState::default(); WHEEL_COUNT],
        }
    }

    pub fn calibration(&self) -> &SuspensionCalibration {
        &self.calibration
    }

    pub fn wheels(&self) -> &[WheelState; WHEEL_COUNT] {
        &self.wheels
    }

    pub fn wheel(&self, wheel: WheelIndex) -> &WheelState {
        &self.wheels[wheel.index()]
    }

    /// Reads wheel transforms in body space. Anything the solver cannot answer
    /// keeps its previous value.
    pub fn sample<S>(
        &mut self,
        solver: &S,
        body: BodyHandle,
        vehicle: VehicleHandle,
        wheel_handles: &[WheelHandle; WHEEL_COUNT],
    ) -> &[WheelState; WHEEL_COUNT]
    where
        S: PhysicsSolver + ?Sized,
    {
        let Some(body_transform) = solver.body_transform(body) else {
            return &self.wheels;
        };
        let body_inverse = body_transform.inverse();

        for wheel in WheelIndex::ALL {
            let state = &mut self.wheels[wheel.index()];
            let calibration = self.calibration.wheels[wheel.index()];

            if let Some(transform) = solver.wheel_transform(wheel_handles[wheel.index()]) {
                let local = body_inverse * transform;
                let (roll, _pitch, _yaw) = local.rotation.euler_angles();

                state.position = Point3::from(transform.translation.vector);
                state.height = calibration.normalized_height(local.translation.vector.z);
                state.spin = -roll.to_degrees();
            }
            if let Some(contact) = solver.wheel_contact_point(vehicle, wheel) {
                state.contact_point = contact;
            }
            state.raycast = solver.wheel_raycast(vehicle, wheel);
        }

        &self.wheels
    }
}
