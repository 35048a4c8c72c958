use crate::{
    command::TurnDirection,
    constants::{TURN_COUNT_MAX, TURN_COUNT_MIN},
    math::approach,
    params::SteeringParams,
    tuning::VehicleTuningConfig,
};

/// Per-direction hold counters. The longer a direction key is held, the
/// faster steering ramps toward lock in that direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteeringMomentum {
    left: u32,
    right: u32,
}

impl Default for SteeringMomentum {
    fn default() -> Self {
        Self {
            left: TURN_COUNT_MIN,
            right: TURN_COUNT_MIN,
        }
    }
}

impl SteeringMomentum {
    pub fn left(&self) -> u32 {
        self.left
    }

    pub fn right(&self) -> u32 {
        self.right
    }

    /// Registers one held frame in `direction`. Returns the counter value to
    /// use for this frame's rate; the counter then advances and the opposite
    /// one drops back to the slow end.
    pub fn hold(&mut self, direction: TurnDirection) -> u32 {
        let (held, other) = match direction {
            TurnDirection::Left => (&mut self.left, &mut self.right),
            TurnDirection::Right => (&mut self.right, &mut self.left),
        };
        let count = (*held).clamp(TURN_COUNT_MIN, TURN_COUNT_MAX);
        *held = (count + 1).min(TURN_COUNT_MAX);
        *other = TURN_COUNT_MIN;
        count
    }

    pub fn neutralize(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SteeringMode {
    Digital,
    Analog,
    Rest,
}

#[derive(Debug)]
pub struct SteeringController {
    steering: f64,
    momentum: SteeringMomentum,
    mode: SteeringMode,
    base_rate: f64,
    analog_range: f64,
}

impl SteeringController {
    pub fn new(base_rate: f64, analog_range: f64) -> Self {
        Self {
            steering: 0.0,
            momentum: SteeringMomentum::default(),
            mode: SteeringMode::Rest,
            base_rate,
            analog_range,
        }
    }

    pub fn from_tuning(tuning: &VehicleTuningConfig) -> Self {
        Self::new(tuning.steering_base_rate, tuning.analog_steering_range)
    }

    pub fn steering(&self) -> f64 {
        self.steering
    }

    pub fn momentum(&self) -> SteeringMomentum {
        self.momentum
    }

    pub fn mode(&self) -> SteeringMode {
        self.mode
    }

    /// Digital keys take priority, then non-zero analog input, otherwise the
    /// wheel relaxes toward centre.
    pub fn step(
        &mut self,
        turn: Option<TurnDirection>,
        side_move: f64,
        speed: f64,
        params: &SteeringParams,
        time_delta_sec: f64,
    ) -> f64 {
        match turn {
            Some(direction) => self.turn(direction, time_delta_sec),
            None if side_move != 0.0 => self.analog(side_move),
            None => self.rest(speed, params, time_delta_sec),
        }
    }

    pub fn turn(&mut self, direction: TurnDirection, time_delta_sec: f64) -> f64 {
        let count = self.momentum.hold(direction);
        let rate = self.base_rate * f64::from(count).ln() * time_delta_sec;
        self.mode = SteeringMode::Digital;
        self.steering = approach(direction.target(), self.steering, rate);
        self.steering
    }

    pub fn analog(&mut self, side_move: f64) -> f64 {
        let steering = (side_move / self.analog_range).clamp(-1.0, 1.0);
        self.momentum.neutralize();
        self.mode = SteeringMode::Analog;
        self.set_steering(steering, 0.0)
    }

    pub fn rest(&mut self, speed: f64, params: &SteeringParams, time_delta_sec: f64) -> f64 {
        let rate = params.rest_rate(speed.abs()) * time_delta_sec;
        self.mode = SteeringMode::Rest;
        self.steering = approach(0.0, self.steering, rate);
        self.steering
    }

    /// A zero rate snaps straight to `target`.
    pub fn set_steering(&mut self, target: f64, rate: f64) -> f64 {
        let target = target.clamp(-1.0, 1.0);
        self.steering = if rate == 0.0 {
            target
        } else {
            approach(target, self.steering, rate)
        };
        self.steering
    }

    pub fn reset(&mut self) {
        self.steering = 0.0;
        self.momentum.neutralize();
        self.mode = SteeringMode::Rest;
    }
}
