//! Stick response curves used to shape analog movement input.
//!
//! Every curve is a pure function of the input value, the axis it is applied
//! to and a sensitivity multiplier. Modes are numbered 0-9 so tuning files
//! can keep referring to them by index.

use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

/// Which movement axis a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Forward / back, drives throttle.
    Forward,
    /// Left / right, drives steering.
    Side,
}

/// Thresholds shared by the stepped and vehicle curves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveShape {
    /// Below this stick deflection the vehicle curve uses its gentle slope.
    pub vehicle_turn_lowend: f64,
    /// Output reached by the vehicle curve at `vehicle_turn_lowend`.
    pub vehicle_turn_lowmap: f64,
    pub step0: f64,
    pub step1: f64,
    pub step2: f64,
    /// Fraction of full speed produced inside the walk zone.
    pub walk_fraction: f64,
}

impl Default for CurveShape {
    fn default() -> Self {
        Self {
            vehicle_turn_lowend: 0.7,
            vehicle_turn_lowmap: 0.4,
            step0: 0.1,
            step1: 0.4,
            step2: 0.9,
            walk_fraction: 85.0 / 450.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCurve {
    #[default]
    Linear,
    Quadratic,
    Cubic,
    /// Quadratic with a 1.5x kick at the edge of the stick.
    QuadraticExtreme,
    /// `|x|^(1/sensitivity)`, output clamped to unit magnitude.
    Power,
    /// Halves everything inside 60% deflection.
    TwoStage,
    /// Gentle low-end turning on the side axis; linear on the forward axis.
    VehicleTurn,
    /// Dead zone, fixed walk speed, then full speed.
    WalkRunStepped,
    /// Dead zone, ramp to walk speed, ramp to full speed.
    WalkRunSmooth,
    /// Dead zone, ramp to walk speed, hold, then full speed.
    WalkSmoothRunHard,
}

impl ResponseCurve {
    pub const ALL: [ResponseCurve; 10] = [
        Self::Linear,
        Self::Quadratic,
        Self::Cubic,
        Self::QuadraticExtreme,
        Self::Power,
        Self::TwoStage,
        Self::VehicleTurn,
        Self::WalkRunStepped,
        Self::WalkRunSmooth,
        Self::WalkSmoothRunHard,
    ];

    pub fn from_mode(mode: u8) -> Option<Self> {
        Self::ALL.get(mode as usize).copied()
    }

    pub fn mode(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Quadratic => "quadratic",
            Self::Cubic => "cubic",
            Self::QuadraticExtreme => "quadratic_extreme",
            Self::Power => "power",
            Self::TwoStage => "two_stage",
            Self::VehicleTurn => "vehicle_turn",
            Self::WalkRunStepped => "walk_run_stepped",
            Self::WalkRunSmooth => "walk_run_smooth",
            Self::WalkSmoothRunHard => "walk_smooth_run_hard",
        }
    }

    pub fn apply(self, x: f64, axis: Axis, sensitivity: f64, shape: &CurveShape) -> f64 {
        match self {
            Self::Linear => linear(x, sensitivity),
            Self::Quadratic => quadratic(x, sensitivity),
            Self::Cubic => x * x * x * sensitivity,
            Self::QuadraticExtreme => {
                let extreme = if x.abs() >= 0.95 { 1.5 } else { 1.0 };
                extreme * quadratic(x, sensitivity)
            }
            Self::Power => power(x, sensitivity),
            Self::TwoStage => {
                let out = if x.abs() <= 0.6 { x * 0.5 } else { x };
                out * sensitivity
            }
            Self::VehicleTurn => match axis {
                Axis::Side => vehicle_turn(x, sensitivity, shape),
                // the forward axis is the throttle and falls through to the
                // stepped walk/run curve
                Axis::Forward => walk_run_stepped(x, shape),
            },
            Self::WalkRunStepped => walk_run_stepped(x, shape),
            Self::WalkRunSmooth => walk_run_smooth(x, shape),
            Self::WalkSmoothRunHard => walk_smooth_run_hard(x, shape),
        }
    }
}

/// Reads a curve either by name or by its numeric mode.
pub fn deserialize_curve<'de, D>(deserializer: D) -> Result<ResponseCurve, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Mode(u8),
        Name(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Mode(mode) => ResponseCurve::from_mode(mode)
            .ok_or_else(|| D::Error::custom(format!("unknown response curve mode {mode}"))),
        Repr::Name(name) => ResponseCurve::ALL
            .into_iter()
            .find(|curve| curve.name() == name)
            .ok_or_else(|| D::Error::custom(format!("unknown response curve `{name}`"))),
    }
}

fn signum(x: f64) -> f64 {
    if x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

fn linear(x: f64, sensitivity: f64) -> f64 {
    x * sensitivity
}

fn quadratic(x: f64, sensitivity: f64) -> f64 {
    signum(x) * x * x * sensitivity
}

fn power(x: f64, sensitivity: f64) -> f64 {
    let scale = signum(sensitivity) * signum(x);
    let sensitivity = sensitivity.abs().clamp(1.0e-8, 1000.0);
    let out = x.abs().powf(1.0 / sensitivity).clamp(0.0, 1.0);
    out * scale
}

fn vehicle_turn(x: f64, sensitivity: f64, shape: &CurveShape) -> f64 {
    let CurveShape {
        vehicle_turn_lowend: lowend,
        vehicle_turn_lowmap: lowmap,
        ..
    } = *shape;
    let sign = signum(x);
    let x = x.abs();

    let mapped = if x <= lowend {
        if lowend > 0.0 {
            x / lowend * lowmap
        } else {
            lowmap
        }
    } else if lowend < 1.0 {
        lowmap + (1.0 - lowmap) * (x - lowend) / (1.0 - lowend)
    } else {
        1.0
    };

    mapped * sensitivity * sign
}

fn walk_run_stepped(x: f64, shape: &CurveShape) -> f64 {
    let abs = x.abs();
    if abs < shape.step0 {
        0.0
    } else if abs < shape.step2 {
        shape.walk_fraction * signum(x)
    } else {
        signum(x)
    }
}

fn walk_run_smooth(x: f64, shape: &CurveShape) -> f64 {
    let CurveShape {
        step0,
        step2,
        walk_fraction,
        ..
    } = *shape;
    let abs = x.abs();

    let speed = if abs < step0 {
        0.0
    } else if abs < step2 {
        let t = (abs - step0) / (step2 - step0);
        t * walk_fraction
    } else if step2 < 1.0 {
        let t = (abs - step2) / (1.0 - step2);
        t * (1.0 - walk_fraction) + walk_fraction
    } else {
        1.0
    };

    speed.min(1.0) * signum(x)
}

fn walk_smooth_run_hard(x: f64, shape: &CurveShape) -> f64 {
    let CurveShape {
        step0,
        step1,
        step2,
        walk_fraction,
        ..
    } = *shape;
    let abs = x.abs();

    let speed = if abs < step0 {
        0.0
    } else if abs < step1 {
        let t = (abs - step0) / (step1 - step0);
        t * walk_fraction
    } else if abs < step2 {
        walk_fraction
    } else {
        1.0
    };

    speed * signum(x)
}
