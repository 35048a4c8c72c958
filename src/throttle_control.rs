use crate::{
    command::{DriveIntent, TurnDirection},
    constants::{
        BRAKE_BACK_FORWARD_SCALAR, BRAKE_MAX_VALUE, DEFAULT_MAX_REVERSE_THROTTLE,
        DEFAULT_MAX_THROTTLE, MIN_THROTTLE_MAGNITUDE, THROTTLE_RESTART_SPEED_DROP,
    },
    control::{ControlState, DirectionKind},
    math::approach,
    params::VehicleParameters,
    tuning::VehicleTuningConfig,
};
use tracing::trace;

#[derive(Debug, Clone)]
pub struct ThrottleControllerInit {
    pub max_throttle: f64,
    pub max_reverse_throttle: f64,
    /// Throttle units per second.
    pub throttle_rate: f64,
    /// Brake units per second.
    pub brake_rate: f64,
}

impl ThrottleControllerInit {
    pub fn from_params(params: &VehicleParameters, tuning: &VehicleTuningConfig) -> Self {
        Self {
            max_throttle: DEFAULT_MAX_THROTTLE,
            max_reverse_throttle: DEFAULT_MAX_REVERSE_THROTTLE,
            throttle_rate: params.throttle_rate(),
            brake_rate: tuning.brake_rate,
        }
    }

    pub fn build(&self) -> ThrottleController {
        let Self {
            max_throttle,
            max_reverse_throttle,
            throttle_rate,
            brake_rate,
        } = *self;

        ThrottleController {
            max_throttle,
            max_reverse_throttle,
            throttle_rate,
            brake_rate,
            reduction: 0.0,
            activity: ThrottleActivity::default(),
        }
    }
}

/// Everything the throttle law needs to know about the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThrottleRequest {
    pub drive: DriveIntent,
    pub handbrake: bool,
    pub turn: Option<TurnDirection>,
    pub direction: DirectionKind,
    pub engine_disabled: bool,
    /// Display speed drop since the previous tick.
    pub speed_drop: i32,
}

impl ThrottleRequest {
    pub fn release(direction: DirectionKind) -> Self {
        Self {
            drive: DriveIntent::Release,
            handbrake: false,
            turn: None,
            direction,
            engine_disabled: false,
            speed_drop: 0,
        }
    }
}

#[derive(Debug)]
pub struct ThrottleController {
    max_throttle: f64,
    max_reverse_throttle: f64,
    throttle_rate: f64,
    brake_rate: f64,
    reduction: f64,
    activity: ThrottleActivity,
}

impl ThrottleController {
    pub fn max_throttle(&self) -> f64 {
        self.max_throttle
    }

    pub fn set_max_throttle(&mut self, max_throttle: f64) {
        self.max_throttle = max_throttle;
    }

    pub fn max_reverse_throttle(&self) -> f64 {
        self.max_reverse_throttle
    }

    pub fn set_max_reverse_throttle(&mut self, max_reverse_throttle: f64) {
        self.max_reverse_throttle = max_reverse_throttle;
    }

    pub fn reduction(&self) -> f64 {
        self.reduction
    }

    /// Adds a fractional throttle reduction. Accumulates without an upper cap;
    /// anything past 1.0 already pins the target to the minimum throttle.
    pub fn add_throttle_reduction(&mut self, fraction: f64) {
        self.reduction += fraction;
        trace!(reduction = self.reduction, "throttle reduction added");
    }

    pub fn remove_throttle_reduction(&mut self, fraction: f64) {
        self.reduction = (self.reduction - fraction).max(0.0);
        trace!(reduction = self.reduction, "throttle reduction removed");
    }

    pub fn activity(&self) -> &ThrottleActivity {
        &self.activity
    }

    pub fn forward_target(&self) -> f64 {
        let max = self.max_throttle * (1.0 - self.reduction);
        max.max(MIN_THROTTLE_MAGNITUDE)
    }

    pub fn reverse_target(&self) -> f64 {
        let max = self.max_reverse_throttle * (1.0 - self.reduction);
        max.min(-MIN_THROTTLE_MAGNITUDE)
    }

    /// Writes this tick's throttle, brake and handbrake into `controls`.
    /// Returns whether the throttle counts as held down.
    pub fn step(
        &mut self,
        controls: &mut ControlState,
        request: &ThrottleRequest,
        time_delta_sec: f64,
    ) -> bool {
        let ThrottleRequest {
            drive,
            handbrake,
            turn,
            direction,
            engine_disabled,
            speed_drop,
        } = *request;
        let throttle_step = time_delta_sec * self.throttle_rate;

        let mut throttle_down = match drive {
            DriveIntent::Accelerate => {
                if controls.throttle < 0.0 {
                    controls.throttle = 0.0;
                }
                controls.throttle =
                    approach(self.forward_target(), controls.throttle, throttle_step);

                if direction == DirectionKind::Reverse && controls.has_brake_pedal {
                    let rate = time_delta_sec * self.brake_rate * BRAKE_BACK_FORWARD_SCALAR;
                    self.apply_brake(controls, rate)
                } else {
                    controls.brake = 0.0;
                    true
                }
            }
            DriveIntent::Reverse => {
                if controls.throttle > 0.0 {
                    controls.throttle = 0.0;
                }
                controls.throttle =
                    approach(self.reverse_target(), controls.throttle, throttle_step);

                if direction == DirectionKind::Forward && controls.has_brake_pedal {
                    let rate = time_delta_sec * self.brake_rate;
                    self.apply_brake(controls, rate)
                } else {
                    controls.brake = 0.0;
                    true
                }
            }
            DriveIntent::Release => {
                controls.throttle = 0.0;
                controls.brake = 0.0;
                false
            }
        };

        if handbrake && controls.has_brake_pedal {
            controls.handbrake = true;
            match turn {
                Some(TurnDirection::Left) => controls.handbrake_left = true,
                Some(TurnDirection::Right) => controls.handbrake_right = true,
                None => {}
            }
            controls.throttle = 0.0;
            throttle_down = false;
        }

        if engine_disabled {
            controls.throttle = 0.0;
            controls.handbrake = true;
            throttle_down = false;
        }

        self.activity.update(
            throttle_down,
            controls,
            engine_disabled,
            speed_drop,
            time_delta_sec,
        );
        throttle_down
    }

    pub fn reset(&mut self) {
        self.activity = ThrottleActivity::default();
    }

    fn apply_brake(&self, controls: &mut ControlState, rate: f64) -> bool {
        controls.brake = approach(BRAKE_MAX_VALUE, controls.brake, rate);
        controls.brake_pedal = true;
        controls.throttle = 0.0;
        false
    }
}

/// Throttle bookkeeping consumed by engine audio and animation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThrottleActivity {
    down: bool,
    clock: f64,
    start_time: f64,
    active_time: f64,
}

impl ThrottleActivity {
    pub fn is_down(&self) -> bool {
        self.down
    }

    /// Controller time at which the throttle last went down.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// How long the throttle was held the last time it was released.
    pub fn active_time(&self) -> f64 {
        self.active_time
    }

    fn update(
        &mut self,
        throttle_down: bool,
        controls: &ControlState,
        engine_disabled: bool,
        speed_drop: i32,
        time_delta_sec: f64,
    ) {
        self.clock += time_delta_sec;

        // a sudden loss of speed (a crash) restarts the rev-up
        if throttle_down && speed_drop > THROTTLE_RESTART_SPEED_DROP {
            self.down = false;
        }

        if !controls.handbrake && !controls.brake_pedal && throttle_down && !self.down {
            self.start_time = self.clock;
            self.down = true;
        } else if !throttle_down && self.down && !engine_disabled {
            self.active_time = self.clock - self.start_time;
            self.down = false;
        }
    }
}
