use crate::constants::FULL_STOP_SPEED;

/// Shaped controls handed to the physics solver each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    pub throttle: f64,
    pub steering: f64,
    pub brake: f64,
    pub boost: bool,
    pub handbrake: bool,
    pub handbrake_left: bool,
    pub handbrake_right: bool,
    /// The brake is on because the driver asked to go against the current
    /// direction of travel.
    pub brake_pedal: bool,
    pub has_brake_pedal: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            throttle: 0.0,
            steering: 0.0,
            brake: 0.0,
            boost: false,
            handbrake: false,
            handbrake_left: false,
            handbrake_right: false,
            brake_pedal: false,
            has_brake_pedal: true,
        }
    }
}

impl ControlState {
    /// Parked: handbrake on, everything else neutral.
    pub fn reset(&mut self) {
        *self = Self {
            handbrake: true,
            has_brake_pedal: self.has_brake_pedal,
            ..Self::default()
        };
    }

    /// Clears the per-tick flags before a new command is applied.
    pub(crate) fn clear_tick_flags(&mut self) {
        self.boost = false;
        self.handbrake = false;
        self.handbrake_left = false;
        self.handbrake_right = false;
        self.brake_pedal = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionKind {
    Forward,
    Reverse,
    Stationary,
}

impl DirectionKind {
    pub fn from_speed(speed: f64) -> Self {
        if speed.abs() < FULL_STOP_SPEED {
            Self::Stationary
        } else if speed > 0.0 {
            Self::Forward
        } else {
            Self::Reverse
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_parks_the_vehicle() {
        let mut controls = ControlState {
            throttle: 0.7,
            steering: -0.3,
            brake: 0.2,
            boost: true,
            has_brake_pedal: false,
            ..Default::default()
        };
        controls.reset();

        assert!(controls.handbrake);
        assert_eq!(controls.throttle, 0.0);
        assert_eq!(controls.steering, 0.0);
        assert_eq!(controls.brake, 0.0);
        assert!(!controls.boost);
        assert!(!controls.has_brake_pedal);
    }

    #[test]
    fn direction_has_a_dead_zone() {
        assert_eq!(DirectionKind::from_speed(0.0), DirectionKind::Stationary);
        assert_eq!(DirectionKind::from_speed(-0.05), DirectionKind::Stationary);
        assert_eq!(DirectionKind::from_speed(3.0), DirectionKind::Forward);
        assert_eq!(DirectionKind::from_speed(-3.0), DirectionKind::Reverse);
    }
}
