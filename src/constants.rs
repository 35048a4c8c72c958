pub const AXLE_COUNT: usize = 2;
pub const WHEEL_COUNT: usize = AXLE_COUNT * 2;

/// Below this speed the vehicle is treated as standing still when deciding
/// whether a throttle request opposes the direction of travel.
pub const FULL_STOP_SPEED: f64 = 0.1;

// Steering
pub const STEERING_BASE_RATE: f64 = 2.0;
pub const TURN_COUNT_MIN: u32 = 2;
pub const TURN_COUNT_MAX: u32 = 30;
pub const ANALOG_STEERING_RANGE: f64 = 400.0;
pub const ANALOG_STEERING_EXPONENT: f64 = 2.0;

// Throttle and brake
/// Needs to be greater than any sane frame rate so that a zero throttle
/// time still reaches the target in one tick.
pub const INSTANT_THROTTLE_RATE: f64 = 10_000.0;
pub const MIN_THROTTLE_MAGNITUDE: f64 = 0.1;
pub const DEFAULT_MAX_THROTTLE: f64 = 1.0;
pub const DEFAULT_MAX_REVERSE_THROTTLE: f64 = -1.0;
pub const BRAKE_MAX_VALUE: f64 = 1.0;
pub const BRAKE_BACK_FORWARD_SCALAR: f64 = 2.0;
pub const DEFAULT_BRAKE_RATE: f64 = 1.5;
pub const THROTTLE_RESTART_SPEED_DROP: i32 = 10;

// Skid
/// Lateral sliding speed (units/s) at which the tires count as skidding.
pub const DEFAULT_SKID_THRESHOLD: f64 = 10.0;
pub const SKID_SPEED_FACTOR: f64 = 0.15;
pub const SKID_LOW_SPEED_MULTIPLIER: f64 = 8.0;

// Boost
pub const BOOST_CUE_MIN_DURATION_SEC: f64 = 2.75;

// Effects and presentation
pub const DUST_SPEED: f64 = 5.0;
pub const MAX_GAUGE_SPEED: f64 = 100.0;
pub const DEFAULT_WHEEL_TRAVEL: f64 = 1.0;
pub const DEFAULT_MAX_SPEED: f64 = 30.0;
