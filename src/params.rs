use crate::{
    constants::{ANALOG_STEERING_EXPONENT, AXLE_COUNT, DEFAULT_MAX_SPEED, INSTANT_THROTTLE_RATE},
    error::ParameterError,
    math::remap_val_clamped,
    suspension::SuspensionCalibration,
};
use nalgebra::Vector3;
use noisy_float::types::r64;
use serde::{Deserialize, Serialize};

fn zero_vector() -> Vector3<f64> {
    Vector3::zeros()
}

fn one() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringTravel {
    pub rest_length: f64,
    /// Extra travel below the rest position. Overwritten by calibration.
    pub additional_length: f64,
}

impl Default for SpringTravel {
    fn default() -> Self {
        Self {
            rest_length: 0.0,
            additional_length: 0.0,
        }
    }
}

/// Geometry of one axle in body space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxleParams {
    /// Axle centre.
    #[serde(default = "zero_vector")]
    pub offset: Vector3<f64>,
    /// Right wheel relative to the axle centre; the left wheel is mirrored.
    #[serde(default = "zero_vector")]
    pub wheel_offset: Vector3<f64>,
    #[serde(default)]
    pub raytrace_center_offset: Option<Vector3<f64>>,
    #[serde(default)]
    pub raytrace_offset: Option<Vector3<f64>>,
    #[serde(default = "one")]
    pub wheel_radius: f64,
    #[serde(default)]
    pub spring: SpringTravel,
}

impl Default for AxleParams {
    fn default() -> Self {
        Self {
            offset: zero_vector(),
            wheel_offset: zero_vector(),
            raytrace_center_offset: None,
            raytrace_offset: None,
            wheel_radius: 1.0,
            spring: SpringTravel::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineParams {
    pub max_speed: f64,
    pub boost_max_speed: f64,
    /// Seconds from zero to full throttle. Zero means instant.
    pub throttle_time: f64,
    pub boost_delay: f64,
    pub boost_duration: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            max_speed: DEFAULT_MAX_SPEED,
            boost_max_speed: DEFAULT_MAX_SPEED,
            throttle_time: 0.0,
            boost_delay: 0.0,
            boost_duration: 0.0,
        }
    }
}

impl EngineParams {
    pub fn throttle_rate(&self) -> f64 {
        if self.throttle_time > 0.0 {
            1.0 / self.throttle_time
        } else {
            INSTANT_THROTTLE_RATE
        }
    }

    pub fn has_boost(&self) -> bool {
        self.boost_delay > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringParams {
    pub speed_slow: f64,
    pub speed_fast: f64,
    pub degrees_slow: f64,
    pub degrees_fast: f64,
    pub degrees_boost: f64,
    pub rest_rate_slow: f64,
    pub rest_rate_fast: f64,
    /// Zero disables the exponent and maps steering linearly onto the cone.
    pub steering_exponent: f64,
}

impl Default for SteeringParams {
    fn default() -> Self {
        Self {
            speed_slow: 10.0,
            speed_fast: 50.0,
            degrees_slow: 50.0,
            degrees_fast: 18.0,
            degrees_boost: 10.0,
            rest_rate_slow: 4.0,
            rest_rate_fast: 2.0,
            steering_exponent: 0.0,
        }
    }
}

impl SteeringParams {
    /// Rate (per second) at which released steering returns to centre.
    pub fn rest_rate(&self, speed: f64) -> f64 {
        remap_val_clamped(
            speed,
            self.speed_slow,
            self.speed_fast,
            self.rest_rate_slow,
            self.rest_rate_fast,
        )
    }

    /// Half-width of the steering cone at `speed`, in degrees.
    pub fn degrees_for_speed(&self, speed: f64, engine: &EngineParams) -> f64 {
        let speed = speed.abs();
        if speed > engine.max_speed && engine.boost_max_speed > engine.max_speed {
            return remap_val_clamped(
                speed,
                engine.max_speed,
                engine.boost_max_speed,
                self.degrees_fast,
                self.degrees_boost,
            );
        }
        remap_val_clamped(
            speed,
            self.speed_slow,
            self.speed_fast,
            self.degrees_slow,
            self.degrees_fast,
        )
    }

    /// Wheel steer angle in degrees for a steering value in `[-1, 1]`. Never
    /// wider than [`max_degrees`](Self::max_degrees).
    pub fn steer_angle_degrees(
        &self,
        steering: f64,
        speed: f64,
        engine: &EngineParams,
        analog: bool,
    ) -> f64 {
        let degrees = self.degrees_for_speed(speed, engine);
        let sign = if steering < 0.0 { -1.0 } else { 1.0 };
        let magnitude = steering.abs();

        let angle = if self.steering_exponent == 0.0 {
            steering * degrees
        } else if analog {
            // analog input is mapped directly, so shape the full range and
            // clamp to the cone
            let output = magnitude.powf(ANALOG_STEERING_EXPONENT) * sign * self.degrees_slow;
            output.clamp(-degrees, degrees)
        } else {
            magnitude.powf(self.steering_exponent) * sign * degrees
        };

        let max = self.max_degrees();
        angle.clamp(-max, max)
    }

    pub fn max_degrees(&self) -> f64 {
        [self.degrees_slow, self.degrees_fast, self.degrees_boost]
            .into_iter()
            .map(r64)
            .max()
            .map(|val| val.raw())
            .unwrap_or(self.degrees_slow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectToggles {
    pub dust_cloud: bool,
    pub skid_effects: bool,
}

impl Default for EffectToggles {
    fn default() -> Self {
        Self {
            dust_cloud: true,
            skid_effects: true,
        }
    }
}

/// Script-like vehicle description as handed over by the asset system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDescriptor {
    pub axles: Vec<AxleParams>,
    #[serde(default)]
    pub engine: EngineParams,
    #[serde(default)]
    pub steering: SteeringParams,
    #[serde(default)]
    pub effects: EffectToggles,
    #[serde(default = "one")]
    pub action_scale: f64,
}

impl Default for VehicleDescriptor {
    fn default() -> Self {
        Self {
            axles: vec![AxleParams::default(); AXLE_COUNT],
            engine: EngineParams::default(),
            steering: SteeringParams::default(),
            effects: EffectToggles::default(),
            action_scale: 1.0,
        }
    }
}

impl VehicleDescriptor {
    pub fn from_toml_str(text: &str) -> Result<Self, ParameterError> {
        Ok(toml::from_str(text)?)
    }
}

/// Per-model tuning. Built once at spawn and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleParameters {
    axles: [AxleParams; AXLE_COUNT],
    engine: EngineParams,
    steering: SteeringParams,
    effects: EffectToggles,
    action_scale: f64,
}

impl VehicleParameters {
    pub fn from_descriptor(descriptor: &VehicleDescriptor) -> Result<Self, ParameterError> {
        let VehicleDescriptor {
            ref axles,
            engine,
            steering,
            effects,
            action_scale,
        } = *descriptor;

        let axles: [AxleParams; AXLE_COUNT] = axles
            .as_slice()
            .try_into()
            .map_err(|_| ParameterError::AxleCount(axles.len()))?;

        for axle in &axles {
            check_vector("axles.offset", &axle.offset)?;
            check_vector("axles.wheel_offset", &axle.wheel_offset)?;
            if let Some(offset) = &axle.raytrace_center_offset {
                check_vector("axles.raytrace_center_offset", offset)?;
            }
            if let Some(offset) = &axle.raytrace_offset {
                check_vector("axles.raytrace_offset", offset)?;
            }
            check_non_negative("axles.wheel_radius", axle.wheel_radius)?;
            check_non_negative("axles.spring.rest_length", axle.spring.rest_length)?;
            check_non_negative(
                "axles.spring.additional_length",
                axle.spring.additional_length,
            )?;
        }

        check_non_negative("engine.max_speed", engine.max_speed)?;
        check_non_negative("engine.boost_max_speed", engine.boost_max_speed)?;
        check_non_negative("engine.throttle_time", engine.throttle_time)?;
        check_non_negative("engine.boost_delay", engine.boost_delay)?;
        check_non_negative("engine.boost_duration", engine.boost_duration)?;

        check_non_negative("steering.speed_slow", steering.speed_slow)?;
        check_non_negative("steering.speed_fast", steering.speed_fast)?;
        check_band(
            ("steering.speed_slow", steering.speed_slow),
            ("steering.speed_fast", steering.speed_fast),
        )?;
        check_non_negative("steering.degrees_slow", steering.degrees_slow)?;
        check_non_negative("steering.degrees_fast", steering.degrees_fast)?;
        check_non_negative("steering.degrees_boost", steering.degrees_boost)?;
        check_non_negative("steering.rest_rate_slow", steering.rest_rate_slow)?;
        check_non_negative("steering.rest_rate_fast", steering.rest_rate_fast)?;
        check_non_negative("steering.steering_exponent", steering.steering_exponent)?;

        check_finite("action_scale", action_scale)?;

        Ok(Self {
            axles,
            engine,
            steering,
            effects,
            action_scale,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ParameterError> {
        Self::from_descriptor(&VehicleDescriptor::from_toml_str(text)?)
    }

    /// Folds measured axle geometry and wheel travel into the parameters.
    /// Axles whose attachments were missing keep their scripted geometry.
    pub fn with_calibration(mut self, calibration: &SuspensionCalibration) -> Self {
        for (index, axle) in self.axles.iter_mut().enumerate() {
            if let Some(geometry) = calibration.axle(index) {
                axle.offset = geometry.offset;
                axle.wheel_offset = geometry.wheel_offset;
                axle.spring.additional_length = geometry.travel;
            }
            if let Some(raytrace) = calibration.raytrace(index) {
                axle.raytrace_center_offset = Some(raytrace.offset);
                axle.raytrace_offset = Some(raytrace.wheel_offset);
            }
        }
        self
    }

    pub fn axles(&self) -> &[AxleParams; AXLE_COUNT] {
        &self.axles
    }

    pub fn engine(&self) -> &EngineParams {
        &self.engine
    }

    pub fn steering(&self) -> &SteeringParams {
        &self.steering
    }

    pub fn effects(&self) -> &EffectToggles {
        &self.effects
    }

    pub fn action_scale(&self) -> f64 {
        self.action_scale
    }

    pub fn max_speed(&self) -> f64 {
        self.engine.max_speed
    }

    pub fn throttle_rate(&self) -> f64 {
        self.engine.throttle_rate()
    }
}

pub(crate) fn check_finite(field: &'static str, value: f64) -> Result<(), ParameterError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParameterError::NonFinite { field })
    }
}

pub(crate) fn check_non_negative(field: &'static str, value: f64) -> Result<(), ParameterError> {
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(ParameterError::Negative { field, value });
    }
    Ok(())
}

pub(crate) fn check_positive(field: &'static str, value: f64) -> Result<(), ParameterError> {
    check_finite(field, value)?;
    if value <= 0.0 {
        return Err(ParameterError::NotPositive { field, value });
    }
    Ok(())
}

fn check_vector(field: &'static str, value: &Vector3<f64>) -> Result<(), ParameterError> {
    if value.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ParameterError::NonFinite { field })
    }
}

fn check_band(
    (low_field, low): (&'static str, f64),
    (high_field, high): (&'static str, f64),
) -> Result<(), ParameterError> {
    if low > high {
        return Err(ParameterError::InvertedBand {
            low_field,
            low,
            high_field,
            high,
        });
    }
    Ok(())
}
