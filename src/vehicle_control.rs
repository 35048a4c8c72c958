use crate::{
    boost::{self, BoostManager, BoostStatus},
    command::{Buttons, RawCommand},
    constants::{MAX_GAUGE_SPEED, WHEEL_COUNT},
    control::{ControlState, DirectionKind},
    effects::EffectIntent,
    error::{ControllerError, SolverError},
    params::{VehicleDescriptor, VehicleParameters},
    pose::{PoseBindings, PoseHost, VehiclePose},
    skid::{self, SkidDetector},
    solver::{BodyHandle, OperatingParams, PhysicsSolver, VehicleHandle, WheelHandle},
    steer_control::{SteeringController, SteeringMode},
    suspension::{SuspensionCalibration, WheelState, WheelSuspensionSampler},
    telemetry::{TelemetryFacts, TelemetryReporter, VehicleTelemetry},
    throttle_control::{
        ThrottleActivity, ThrottleController, ThrottleControllerInit, ThrottleRequest,
    },
    tuning::VehicleTuningConfig,
};
use nalgebra::Isometry3;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone)]
pub struct VehicleControllerInit {
    pub descriptor: VehicleDescriptor,
    pub tuning: VehicleTuningConfig,
    pub body: BodyHandle,
}

impl VehicleControllerInit {
    /// Calibrates the model, creates the solver vehicle and binds its wheels.
    pub fn build<S, H>(
        &self,
        solver: &mut S,
        host: &mut H,
    ) -> Result<VehicleController, ControllerError>
    where
        S: PhysicsSolver + ?Sized,
        H: PoseHost + ?Sized,
    {
        let Self {
            ref descriptor,
            ref tuning,
            body,
        } = *self;

        tuning.validate()?;
        let params = VehicleParameters::from_descriptor(descriptor)?;

        let pose_bindings = PoseBindings::resolve(&*host);
        pose_bindings.neutralize(host);
        let calibration = SuspensionCalibration::measure(host, &pose_bindings);
        if !calibration.is_complete() {
            warn!(
                missing = calibration.errors().len(),
                "suspension calibration incomplete"
            );
        }
        let params = params.with_calibration(&calibration);

        let vehicle = solver.create_vehicle(body, &params)?;
        let handles = solver.wheel_handles(vehicle);
        let wheels: [WheelHandle; WHEEL_COUNT] = match handles.as_slice().try_into() {
            Ok(wheels) => wheels,
            Err(_) => {
                solver.destroy_vehicle(vehicle);
                return Err(SolverError::WheelCount(handles.len()).into());
            }
        };
        info!(?body, ?vehicle, "vehicle created");

        let mut controls = ControlState::default();
        controls.reset();

        Ok(VehicleController {
            controls,
            steering: SteeringController::from_tuning(tuning),
            throttle: ThrottleControllerInit::from_params(&params, tuning).build(),
            boost: BoostManager::new(tuning.boost_cue_duration),
            suspension: WheelSuspensionSampler::new(calibration),
            skid: SkidDetector::new(tuning.skid_threshold),
            telemetry: TelemetryReporter::default(),
            binding: Some(SolverBinding {
                body,
                vehicle,
                wheels,
            }),
            pose_bindings,
            phase: TickPhase::Sampled,
            is_on: false,
            throttle_down: false,
            action: 0.0,
            action_speed: 0.0,
            tick_delta_sec: 0.0,
            last_output: TickOutput::default(),
            params,
            tuning: tuning.clone(),
        })
    }
}

/// Solver objects exclusively owned by one controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SolverBinding {
    body: BodyHandle,
    vehicle: VehicleHandle,
    wheels: [WheelHandle; WHEEL_COUNT],
}

/// Where the controller is within the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickPhase {
    /// Ready for the next command.
    Sampled,
    /// Controls are shaped and waiting for the solver step.
    Shaped,
    /// The solver has stepped; sampling may run.
    Stepped,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutput {
    pub controls: ControlState,
    pub pose: VehiclePose,
    pub telemetry: VehicleTelemetry,
    pub effects: Vec<EffectIntent>,
}

#[derive(Debug)]
pub struct VehicleController {
    params: VehicleParameters,
    tuning: VehicleTuningConfig,
    controls: ControlState,
    steering: SteeringController,
    throttle: ThrottleController,
    boost: BoostManager,
    suspension: WheelSuspensionSampler,
    skid: SkidDetector,
    telemetry: TelemetryReporter,
    binding: Option<SolverBinding>,
    pose_bindings: PoseBindings,
    phase: TickPhase,
    is_on: bool,
    throttle_down: bool,
    action: f64,
    action_speed: f64,
    tick_delta_sec: f64,
    last_output: TickOutput,
}

impl VehicleController {
    /// Shapes this tick's command into the controls handed to the solver.
    pub fn shape_controls<S>(&mut self, solver: &S, command: &RawCommand) -> ControlState
    where
        S: PhysicsSolver + ?Sized,
    {
        if self.phase == TickPhase::Shaped {
            debug!("controls shaped twice without a solver step");
        }
        let time_delta_sec = command.frame_time;
        let operating = self.operating_params(solver);
        let speed = operating.map_or(self.telemetry.latest().speed, |op| op.speed);
        let engine_disabled = self.is_engine_disabled(solver);

        self.telemetry.observe_speed(speed);
        self.controls.clear_tick_flags();

        let side_move = self.tuning.shape_side_move(command.side_move);
        self.controls.steering = self.steering.step(
            command.turn(),
            side_move,
            speed,
            self.params.steering(),
            time_delta_sec,
        );

        let request = ThrottleRequest {
            drive: command.drive(),
            handbrake: command.buttons.contains(Buttons::HANDBRAKE),
            turn: command.turn(),
            direction: DirectionKind::from_speed(speed),
            engine_disabled,
            speed_drop: self.telemetry.speed_drop(),
        };
        self.throttle_down = self
            .throttle
            .step(&mut self.controls, &request, time_delta_sec);

        self.controls.boost = command.buttons.contains(Buttons::BOOST) && !engine_disabled;

        trace!(
            throttle = self.controls.throttle,
            steering = self.controls.steering,
            brake = self.controls.brake,
            handbrake = self.controls.handbrake,
            "controls shaped"
        );

        self.tick_delta_sec = time_delta_sec;
        self.phase = TickPhase::Shaped;
        self.controls
    }

    /// Steps the solver with the shaped controls.
    pub fn step_solver<S>(&mut self, solver: &mut S)
    where
        S: PhysicsSolver + ?Sized,
    {
        if self.phase != TickPhase::Shaped {
            debug!(phase = ?self.phase, "solver step skipped, controls not shaped");
            return;
        }
        if let Some(binding) = self.binding {
            solver.step(binding.vehicle, &self.controls, self.tick_delta_sec);
        }
        self.phase = TickPhase::Stepped;
    }

    /// Records that the caller stepped the solver itself.
    pub fn mark_stepped(&mut self) {
        if self.phase == TickPhase::Shaped {
            self.phase = TickPhase::Stepped;
        }
    }

    /// Reads the post-step solver state into pose, telemetry and effect
    /// intents. Before the solver has stepped this tick the previous pose is
    /// returned unchanged.
    pub fn sample<S, H>(&mut self, solver: &S, host: &mut H) -> TickOutput
    where
        S: PhysicsSolver + ?Sized,
        H: PoseHost + ?Sized,
    {
        if self.phase != TickPhase::Stepped {
            debug!(phase = ?self.phase, "sampled before solver step, pose frozen");
            return self.frozen_output();
        }
        self.phase = TickPhase::Sampled;

        let Some(binding) = self.binding else {
            return self.frozen_output();
        };
        let time_delta_sec = self.tick_delta_sec;
        let operating = solver.operating_params(binding.vehicle);
        let speed = operating.map_or(self.telemetry.latest().speed, |op| op.speed);
        let mut effects = vec![];

        let wheels = *self
            .suspension
            .sample(solver, binding.body, binding.vehicle, &binding.wheels);

        let boost = self.boost.update(
            self.controls.boost,
            operating.as_ref(),
            self.params.engine(),
            time_delta_sec,
        );
        if boost.started {
            effects.push(EffectIntent::BoostStart);
        }

        if !solver.is_carried(binding.body) {
            if let Some(op) = &operating {
                let transition = self.skid.update(op.skid_speed, op.speed, self.is_on);
                transition.emit(&wheels, self.params.effects(), &mut effects);
            }
            skid::speed_dust(
                self.telemetry.display_speed(),
                self.params.max_speed(),
                self.is_on,
                self.params.effects(),
                &wheels,
                &mut effects,
            );
        }

        self.action += self.action_speed * self.params.action_scale() * time_delta_sec;
        let pose = self.pose(&wheels, speed);
        self.pose_bindings.apply(host, &pose);

        let telemetry = self.report(operating.as_ref(), &boost);

        let output = TickOutput {
            controls: self.controls,
            pose,
            telemetry,
            effects,
        };
        self.last_output = TickOutput {
            effects: vec![],
            ..output.clone()
        };
        output
    }

    /// One full tick: shape, step and sample.
    pub fn tick<S, H>(&mut self, solver: &mut S, host: &mut H, command: &RawCommand) -> TickOutput
    where
        S: PhysicsSolver + ?Sized,
        H: PoseHost + ?Sized,
    {
        self.shape_controls(&*solver, command);
        self.step_solver(solver);
        self.sample(&*solver, host)
    }

    fn pose(&self, wheels: &[WheelState; WHEEL_COUNT], speed: f64) -> VehiclePose {
        let steering_params = self.params.steering();
        let analog = self.steering.mode() == SteeringMode::Analog;

        VehiclePose {
            wheel_height: std::array::from_fn(|i| wheels[i].height),
            wheel_spin: std::array::from_fn(|i| wheels[i].spin),
            steer: self.controls.steering,
            steer_angle_degrees: steering_params.steer_angle_degrees(
                self.controls.steering,
                speed,
                self.params.engine(),
                analog,
            ),
            action: self.action,
            speedometer: self
                .is_on
                .then(|| f64::from(self.telemetry.display_speed()) / MAX_GAUGE_SPEED),
        }
    }

    fn report(
        &mut self,
        operating: Option<&OperatingParams>,
        boost: &BoostStatus,
    ) -> VehicleTelemetry {
        let facts = TelemetryFacts {
            skidding: self.skid.is_skidding(),
            has_boost: self.params.engine().has_boost(),
            boost_time_left: self.boost.boost_time_left(),
            powered_on: self.is_on,
            throttle_down: self.throttle_down,
        };
        self.telemetry.report(operating, &self.controls, boost, facts)
    }

    fn frozen_output(&self) -> TickOutput {
        self.last_output.clone()
    }

    fn operating_params<S>(&self, solver: &S) -> Option<OperatingParams>
    where
        S: PhysicsSolver + ?Sized,
    {
        solver.operating_params(self.binding?.vehicle)
    }

    pub fn turn_on<S>(&mut self, solver: &S) -> bool
    where
        S: PhysicsSolver + ?Sized,
    {
        if self.is_engine_disabled(solver) {
            debug!("engine disabled, refusing to turn on");
            return false;
        }
        if !self.is_on {
            info!("vehicle turned on");
            self.is_on = true;
        }
        true
    }

    /// Parks the vehicle and drops any running skid, boost cue or throttle
    /// activity.
    pub fn turn_off(&mut self) {
        self.controls.reset();
        self.steering.reset();
        self.throttle.reset();
        self.skid.reset();
        self.boost.reset();
        if self.is_on {
            info!("vehicle turned off");
            self.is_on = false;
        }
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    pub fn set_has_brake_pedal(&mut self, has_brake_pedal: bool) {
        self.controls.has_brake_pedal = has_brake_pedal;
    }

    pub fn set_max_throttle(&mut self, max_throttle: f64) {
        self.throttle.set_max_throttle(max_throttle);
    }

    pub fn set_max_reverse_throttle(&mut self, max_reverse_throttle: f64) {
        self.throttle.set_max_reverse_throttle(max_reverse_throttle);
    }

    pub fn add_throttle_reduction(&mut self, fraction: f64) {
        self.throttle.add_throttle_reduction(fraction);
    }

    pub fn remove_throttle_reduction(&mut self, fraction: f64) {
        self.throttle.remove_throttle_reduction(fraction);
    }

    /// Scripted steering. A zero rate snaps to `steering`.
    pub fn set_steering(&mut self, steering: f64, rate: f64) {
        self.controls.steering = self.steering.set_steering(steering, rate);
    }

    pub fn set_handbrake(&mut self, handbrake: bool) {
        self.controls.handbrake = handbrake;
    }

    /// Speed of the "action" pose parameter, such as a turret spin.
    pub fn set_action(&mut self, action_speed: f64) {
        self.action_speed = action_speed;
    }

    pub fn set_engine_disabled<S>(&mut self, solver: &mut S, disabled: bool)
    where
        S: PhysicsSolver + ?Sized,
    {
        if let Some(binding) = self.binding {
            info!(disabled, "engine state changed");
            solver.set_engine_disabled(binding.vehicle, disabled);
        }
    }

    pub fn is_engine_disabled<S>(&self, solver: &S) -> bool
    where
        S: PhysicsSolver + ?Sized,
    {
        self.binding
            .map_or(false, |binding| solver.is_engine_disabled(binding.vehicle))
    }

    /// Moves the wheels along with a teleported body.
    pub fn teleport<S>(&mut self, solver: &mut S, relative: &Isometry3<f64>)
    where
        S: PhysicsSolver + ?Sized,
    {
        let Some(binding) = self.binding else {
            return;
        };
        for wheel in binding.wheels {
            if let Some(transform) = solver.wheel_transform(wheel) {
                solver.set_wheel_transform(wheel, &(relative * transform));
            }
        }
    }

    pub fn enable_motion<S>(&mut self, solver: &mut S)
    where
        S: PhysicsSolver + ?Sized,
    {
        self.set_wheel_motion(solver, true);
    }

    pub fn disable_motion<S>(&mut self, solver: &mut S)
    where
        S: PhysicsSolver + ?Sized,
    {
        self.set_wheel_motion(solver, false);
    }

    fn set_wheel_motion<S>(&mut self, solver: &mut S, enabled: bool)
    where
        S: PhysicsSolver + ?Sized,
    {
        if let Some(binding) = self.binding {
            for wheel in binding.wheels {
                solver.set_wheel_motion(wheel, enabled);
            }
        }
    }

    /// Advances the solver's booster timer. Returns whether it still runs.
    pub fn update_booster<S>(&mut self, solver: &mut S, time_delta_sec: f64) -> bool
    where
        S: PhysicsSolver + ?Sized,
    {
        self.binding.map_or(false, |binding| {
            boost::update_booster(solver, binding.vehicle, time_delta_sec)
        })
    }

    /// Destroys the solver vehicle. Must run before the body itself is
    /// destroyed. Later calls are no-ops.
    pub fn release<S>(&mut self, solver: &mut S)
    where
        S: PhysicsSolver + ?Sized,
    {
        if let Some(binding) = self.binding.take() {
            info!(vehicle = ?binding.vehicle, "vehicle released");
            solver.destroy_vehicle(binding.vehicle);
        }
    }

    pub fn is_released(&self) -> bool {
        self.binding.is_none()
    }

    pub fn vehicle_handle(&self) -> Option<VehicleHandle> {
        self.binding.map(|binding| binding.vehicle)
    }

    pub fn phase(&self) -> TickPhase {
        self.phase
    }

    pub fn controls(&self) -> &ControlState {
        &self.controls
    }

    pub fn telemetry(&self) -> &VehicleTelemetry {
        self.telemetry.latest()
    }

    pub fn wheels(&self) -> &[WheelState; WHEEL_COUNT] {
        self.suspension.wheels()
    }

    pub fn wheel(&self, index: usize) -> Option<&WheelState> {
        debug_assert!(index < WHEEL_COUNT, "wheel index {index} out of range");
        self.suspension.wheels().get(index)
    }

    pub fn calibration(&self) -> &SuspensionCalibration {
        self.suspension.calibration()
    }

    pub fn parameters(&self) -> &VehicleParameters {
        &self.params
    }

    pub fn tuning(&self) -> &VehicleTuningConfig {
        &self.tuning
    }

    pub fn steering(&self) -> &SteeringController {
        &self.steering
    }

    pub fn throttle_activity(&self) -> &ThrottleActivity {
        self.throttle.activity()
    }

    pub fn is_boost_cue_active(&self) -> bool {
        self.boost.is_cue_active()
    }

    pub fn is_skidding(&self) -> bool {
        self.skid.is_skidding()
    }
}

impl Drop for VehicleController {
    fn drop(&mut self) {
        if let Some(binding) = self.binding {
            warn!(
                vehicle = ?binding.vehicle,
                "vehicle controller dropped without release, solver still holds the vehicle"
            );
        }
    }
}
