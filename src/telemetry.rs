use crate::{boost::BoostStatus, control::ControlState, solver::OperatingParams};
use std::fmt;

/// Snapshot of the vehicle for HUD and debug overlays.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VehicleTelemetry {
    /// Signed forward speed.
    pub speed: f64,
    pub display_speed: i32,
    pub rpm: i32,
    pub gear: i32,
    pub skidding: bool,
    pub boost_cue_active: bool,
    pub physically_boosting: bool,
    pub has_boost: bool,
    /// Percentage of boost left.
    pub boost_time_left: i32,
    pub throttle: f64,
    pub steering: f64,
    pub brake: f64,
    pub powered_on: bool,
    pub throttle_down: bool,
}

impl VehicleTelemetry {
    /// The two debug overlay lines.
    pub fn debug_lines(&self) -> [String; 2] {
        [
            format!(
                "Speed {:.1}  T/S/B ({:.2}/{:.2}/{:.2})",
                self.speed, self.throttle, self.steering, self.brake
            ),
            format!("Gear: {}, RPM {}", self.gear, self.rpm),
        ]
    }
}

impl fmt::Display for VehicleTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [speed, engine] = self.debug_lines();
        write!(f, "{speed}; {engine}")?;
        if self.skidding {
            write!(f, "; skidding")?;
        }
        if self.boost_cue_active {
            write!(f, "; boost {}%", self.boost_time_left)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TelemetryReporter {
    display_speed: i32,
    last_display_speed: i32,
    latest: VehicleTelemetry,
}

impl TelemetryReporter {
    pub fn display_speed(&self) -> i32 {
        self.display_speed
    }

    pub fn last_display_speed(&self) -> i32 {
        self.last_display_speed
    }

    /// How much display speed was lost since the previous sample.
    pub fn speed_drop(&self) -> i32 {
        self.last_display_speed - self.display_speed
    }

    /// Latches the solver's speed. Called once per tick before controls are
    /// shaped so the throttle sees the drop between consecutive ticks.
    pub fn observe_speed(&mut self, speed: f64) {
        self.last_display_speed = self.display_speed;
        self.display_speed = speed.abs() as i32;
    }

    pub fn report(
        &mut self,
        operating: Option<&OperatingParams>,
        controls: &ControlState,
        boost: &BoostStatus,
        facts: TelemetryFacts,
    ) -> VehicleTelemetry {
        let TelemetryFacts {
            skidding,
            has_boost,
            boost_time_left,
            powered_on,
            throttle_down,
        } = facts;

        let mut telemetry = VehicleTelemetry {
            skidding,
            boost_cue_active: boost.cue_active,
            physically_boosting: boost.physically_active,
            has_boost,
            boost_time_left,
            throttle: controls.throttle,
            steering: controls.steering,
            brake: controls.brake,
            powered_on,
            throttle_down,
            ..self.latest
        };
        if let Some(op) = operating {
            telemetry.speed = op.speed;
            telemetry.rpm = op.engine_rpm as i32;
            telemetry.gear = op.gear;
        }
        telemetry.display_speed = self.display_speed;

        self.latest = telemetry;
        telemetry
    }

    pub fn latest(&self) -> &VehicleTelemetry {
        &self.latest
    }
}

/// Controller-side facts folded into a telemetry report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TelemetryFacts {
    pub skidding: bool,
    pub has_boost: bool,
    pub boost_time_left: i32,
    pub powered_on: bool,
    pub throttle_down: bool,
}
