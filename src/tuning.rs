use crate::{
    constants::{
        ANALOG_STEERING_RANGE, BOOST_CUE_MIN_DURATION_SEC, DEFAULT_BRAKE_RATE,
        DEFAULT_SKID_THRESHOLD, STEERING_BASE_RATE,
    },
    curves::{deserialize_curve, Axis, CurveShape, ResponseCurve},
    error::ParameterError,
    params::{check_non_negative, check_positive},
};
use serde::{Deserialize, Serialize};

/// Per-instance tunables. Every vehicle carries its own copy, so vehicles
/// with different tuning can share a world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleTuningConfig {
    /// Curve name or mode index 0-9.
    #[serde(deserialize_with = "deserialize_curve")]
    pub response_curve: ResponseCurve,
    pub side_sensitivity: f64,
    pub curve_shape: CurveShape,
    pub steering_base_rate: f64,
    /// Side-move magnitude that maps to full analog lock.
    pub analog_steering_range: f64,
    pub brake_rate: f64,
    pub skid_threshold: f64,
    pub boost_cue_duration: f64,
}

impl Default for VehicleTuningConfig {
    fn default() -> Self {
        Self {
            response_curve: ResponseCurve::Linear,
            side_sensitivity: 1.0,
            curve_shape: CurveShape::default(),
            steering_base_rate: STEERING_BASE_RATE,
            analog_steering_range: ANALOG_STEERING_RANGE,
            brake_rate: DEFAULT_BRAKE_RATE,
            skid_threshold: DEFAULT_SKID_THRESHOLD,
            boost_cue_duration: BOOST_CUE_MIN_DURATION_SEC,
        }
    }
}

impl VehicleTuningConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ParameterError> {
        let tuning: Self = toml::from_str(text)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        let Self {
            side_sensitivity,
            steering_base_rate,
            analog_steering_range,
            brake_rate,
            skid_threshold,
            boost_cue_duration,
            ..
        } = *self;

        if !side_sensitivity.is_finite() {
            return Err(ParameterError::NonFinite {
                field: "side_sensitivity",
            });
        }
        for (field, value) in [
            ("steering_base_rate", steering_base_rate),
            ("brake_rate", brake_rate),
            ("skid_threshold", skid_threshold),
            ("boost_cue_duration", boost_cue_duration),
        ] {
            check_non_negative(field, value)?;
        }
        check_positive("analog_steering_range", analog_steering_range)
    }

    /// Runs raw analog side-move through the configured response curve.
    /// The result stays in side-move units.
    pub fn shape_side_move(&self, side_move: f64) -> f64 {
        if side_move == 0.0 {
            return 0.0;
        }
        let range = self.analog_steering_range;
        let normalized = (side_move / range).clamp(-1.0, 1.0);
        let shaped = self.response_curve.apply(
            normalized,
            Axis::Side,
            self.side_sensitivity,
            &self.curve_shape,
        );
        shaped * range
    }
}
