use anyhow::{Context, Result};
use clap::Parser;
use fourwheel_control::{
    params::AxleParams, pose::PoseParameter, Attachment, BodyHandle, Buttons, ControlState,
    EffectIntent, OperatingParams, PhysicsSolver, PoseHost, PoseParameterId, RawCommand,
    SolverError, VehicleControllerInit, VehicleDescriptor, VehicleHandle, VehicleParameters,
    VehicleTuningConfig, WheelHandle, WheelIndex,
};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use rand::prelude::*;
use std::{collections::HashMap, fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_DESCRIPTOR: &str = include_str!("jeep.toml");

/// Suspension travel of the toy model's wheel bones.
const MODEL_TRAVEL: f64 = 6.0;

#[derive(Parser)]
struct Opts {
    /// Number of ticks to simulate.
    #[clap(long, default_value = "600")]
    pub ticks: usize,
    /// Tick length in seconds.
    #[clap(long, default_value = "0.016666")]
    pub dt: f64,
    #[clap(long, default_value = "7")]
    pub seed: u64,
    /// Vehicle descriptor in TOML. Defaults to the bundled jeep.
    #[clap(long)]
    pub descriptor: Option<PathBuf>,
    /// Tuning overrides in TOML.
    #[clap(long)]
    pub tuning: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let Opts {
        ticks,
        dt,
        seed,
        descriptor,
        tuning,
    } = Opts::parse();

    let descriptor = match descriptor {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("unable to read {}", path.display()))?;
            VehicleDescriptor::from_toml_str(&text)?
        }
        None => VehicleDescriptor::from_toml_str(DEFAULT_DESCRIPTOR)?,
    };
    let tuning = match tuning {
        Some(path) => {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("unable to read {}", path.display()))?;
            VehicleTuningConfig::from_toml_str(&text)?
        }
        None => VehicleTuningConfig::default(),
    };

    let mut rng = StdRng::seed_from_u64(seed);
    let mut solver = ToySolver::new(StdRng::seed_from_u64(rng.gen()));
    let mut host = ToyHost::new(&descriptor);

    let mut controller = VehicleControllerInit {
        descriptor,
        tuning,
        body: BodyHandle(1),
    }
    .build(&mut solver, &mut host)?;
    controller.turn_on(&solver);

    let mut buttons = Buttons::ACCELERATE;
    let mut skids = 0;

    for tick in 0..ticks {
        // the driver changes their mind about twice a second
        if tick % 30 == 0 {
            buttons = random_buttons(&mut rng);
        }
        let command = RawCommand::new(buttons, dt);

        let output = controller.tick(&mut solver, &mut host, &command);
        skids += output
            .effects
            .iter()
            .filter(|effect| matches!(effect, EffectIntent::SkidStart))
            .count();

        if tick % 60 == 0 {
            let [speed, engine] = output.telemetry.debug_lines();
            info!(tick, ?buttons, "{speed} | {engine}");
        }
    }

    info!(skids, telemetry = %controller.telemetry(), "done");
    controller.release(&mut solver);
    Ok(())
}

fn random_buttons(rng: &mut impl Rng) -> Buttons {
    let mut buttons = match rng.gen_range(0..10) {
        0..=5 => Buttons::ACCELERATE,
        6..=7 => Buttons::REVERSE,
        _ => Buttons::empty(),
    };
    match rng.gen_range(0..3) {
        0 => buttons |= Buttons::TURN_LEFT,
        1 => buttons |= Buttons::TURN_RIGHT,
        _ => {}
    }
    if rng.gen_bool(0.1) {
        buttons |= Buttons::BOOST;
    }
    if rng.gen_bool(0.05) {
        buttons |= Buttons::HANDBRAKE;
    }
    buttons
}

/// Point-mass stand-in for a real vehicle solver.
struct ToySolver {
    rng: StdRng,
    vehicle: Option<VehicleHandle>,
    axles: Vec<AxleParams>,
    max_speed: f64,
    boost_max_speed: f64,
    boost_delay: f64,
    boost_duration: f64,
    position: Vector3<f64>,
    heading: f64,
    speed: f64,
    skid_speed: f64,
    boost_left: f64,
    bounce: [f64; 4],
    roll: [f64; 4],
    engine_disabled: bool,
}

impl ToySolver {
    fn new(rng: StdRng) -> Self {
        Self {
            rng,
            vehicle: None,
            axles: vec![],
            max_speed: 0.0,
            boost_max_speed: 0.0,
            boost_delay: 0.0,
            boost_duration: 0.0,
            position: Vector3::zeros(),
            heading: 0.0,
            speed: 0.0,
            skid_speed: 0.0,
            boost_left: 0.0,
            bounce: [0.0; 4],
            roll: [0.0; 4],
            engine_disabled: false,
        }
    }

    fn body(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::from(self.position),
            UnitQuaternion::from_euler_angles(0.0, 0.0, self.heading),
        )
    }

    fn wheel_local(&self, wheel: WheelIndex) -> Option<Isometry3<f64>> {
        let axle = self.axles.get(wheel.axle())?;
        let side = if wheel.index() % 2 == 0 { -1.0 } else { 1.0 };
        let mut offset = axle.offset + axle.wheel_offset * side;
        offset.z -= self.bounce[wheel.index()];
        Some(Isometry3::from_parts(
            Translation3::from(offset),
            UnitQuaternion::from_euler_angles(self.roll[wheel.index()], 0.0, 0.0),
        ))
    }
}

impl PhysicsSolver for ToySolver {
    fn create_vehicle(
        &mut self,
        _body: BodyHandle,
        params: &VehicleParameters,
    ) -> Result<VehicleHandle, SolverError> {
        if self.vehicle.is_some() {
            return Err(SolverError::CreateFailed("body already has a vehicle".into()));
        }
        let engine = params.engine();
        self.axles = params.axles().to_vec();
        self.max_speed = engine.max_speed;
        self.boost_max_speed = engine.boost_max_speed;
        self.boost_delay = engine.boost_delay;
        self.boost_duration = engine.boost_duration;

        let vehicle = VehicleHandle(1);
        self.vehicle = Some(vehicle);
        Ok(vehicle)
    }

    fn destroy_vehicle(&mut self, vehicle: VehicleHandle) {
        if self.vehicle == Some(vehicle) {
            self.vehicle = None;
        }
    }

    fn wheel_handles(&self, _vehicle: VehicleHandle) -> Vec<WheelHandle> {
        (0..4).map(WheelHandle).collect()
    }

    fn step(&mut self, _vehicle: VehicleHandle, controls: &ControlState, time_delta_sec: f64) {
        if controls.boost && self.boost_left <= 0.0 && self.boost_duration > 0.0 {
            self.boost_left = self.boost_duration;
        }
        let boosting = self.boost_left > 0.0;
        self.boost_left = (self.boost_left - time_delta_sec).max(0.0);

        let limit = if boosting {
            self.boost_max_speed
        } else {
            self.max_speed
        };
        let mut accel = controls.throttle * if boosting { 40.0 } else { 20.0 };
        if controls.handbrake {
            accel = -self.speed.signum() * 30.0;
        }
        let braking = controls.brake * 40.0;
        self.speed += accel * time_delta_sec;
        self.speed -= self.speed.signum() * (braking * time_delta_sec).min(self.speed.abs());
        self.speed = self.speed.clamp(-limit, limit);

        self.heading += controls.steering * self.speed * 0.02 * time_delta_sec;
        let forward = UnitQuaternion::from_euler_angles(0.0, 0.0, self.heading) * Vector3::x();
        self.position += forward * self.speed * time_delta_sec;

        let radius = self.axles.first().map_or(1.0, |axle| axle.wheel_radius.max(1.0));
        for i in 0..4 {
            self.roll[i] += self.speed / radius * time_delta_sec;
            let kick: f64 = self.rng.gen_range(-0.5..0.5);
            self.bounce[i] = (self.bounce[i] + kick).clamp(0.0, MODEL_TRAVEL);
        }
        let noise: f64 = self.rng.gen_range(0.0..2.0);
        self.skid_speed = controls.steering.abs() * self.speed.abs() * 0.5 + noise;
    }

    fn body_transform(&self, _body: BodyHandle) -> Option<Isometry3<f64>> {
        Some(self.body())
    }

    fn wheel_transform(&self, wheel: WheelHandle) -> Option<Isometry3<f64>> {
        let wheel = WheelIndex::from_index(wheel.0 as usize)?;
        Some(self.body() * self.wheel_local(wheel)?)
    }

    fn set_wheel_transform(&mut self, _wheel: WheelHandle, _transform: &Isometry3<f64>) {}

    fn operating_params(&self, vehicle: VehicleHandle) -> Option<OperatingParams> {
        (self.vehicle == Some(vehicle)).then(|| OperatingParams {
            speed: self.speed,
            engine_rpm: 800.0 + self.speed.abs() * 90.0,
            gear: if self.speed < 0.0 { -1 } else { 1 + (self.speed / 10.0) as i32 },
            boost_delay: self.boost_delay + self.boost_left,
            boost_time_left: if self.boost_duration > 0.0 {
                (100.0 * (1.0 - self.boost_left / self.boost_duration)) as i32
            } else {
                0
            },
            skid_speed: self.skid_speed,
        })
    }

    fn wheel_contact_point(
        &self,
        _vehicle: VehicleHandle,
        wheel: WheelIndex,
    ) -> Option<Point3<f64>> {
        let transform = self.body() * self.wheel_local(wheel)?;
        let radius = self.axles.get(wheel.axle())?.wheel_radius;
        Some(Point3::from(transform.translation.vector) - Vector3::z() * radius)
    }

    fn set_engine_disabled(&mut self, _vehicle: VehicleHandle, disabled: bool) {
        self.engine_disabled = disabled;
    }

    fn is_engine_disabled(&self, _vehicle: VehicleHandle) -> bool {
        self.engine_disabled
    }

    fn update_booster(&mut self, _vehicle: VehicleHandle, time_delta_sec: f64) -> f64 {
        self.boost_left = (self.boost_left - time_delta_sec).max(0.0);
        self.boost_left
    }

    fn set_wheel_motion(&mut self, _wheel: WheelHandle, _enabled: bool) {}
}

/// Model with wheel bones placed from the descriptor's axles.
struct ToyHost {
    axles: Vec<AxleParams>,
    poses: HashMap<usize, f64>,
}

impl ToyHost {
    fn new(descriptor: &VehicleDescriptor) -> Self {
        Self {
            axles: descriptor.axles.clone(),
            poses: HashMap::new(),
        }
    }
}

impl PoseHost for ToyHost {
    fn lookup_pose_parameter(&self, name: &str) -> Option<PoseParameterId> {
        PoseParameter::ALL
            .iter()
            .position(|param| param.name() == name)
            .map(PoseParameterId)
    }

    fn pose_parameter(&self, id: PoseParameterId) -> f64 {
        self.poses.get(&id.0).copied().unwrap_or_default()
    }

    fn set_pose_parameter(&mut self, id: PoseParameterId, value: f64) -> f64 {
        self.poses.insert(id.0, value);
        value
    }

    fn attachment(&self, name: &str) -> Option<Attachment> {
        let wheel = WheelIndex::ALL
            .into_iter()
            .find(|wheel| wheel.attachment_name() == name)?;
        let axle = self.axles.get(wheel.axle())?;
        let side = if wheel.index() % 2 == 0 { -1.0 } else { 1.0 };
        let height = self.pose_parameter(PoseParameterId(wheel.index()));
        let mut origin = axle.offset + axle.wheel_offset * side;
        origin.z -= height * MODEL_TRAVEL;
        Some(Attachment::at(Point3::from(origin)))
    }
}
