use thiserror::Error;

/// A vehicle descriptor that cannot become
/// [`VehicleParameters`](crate::params::VehicleParameters).
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("failed to parse vehicle descriptor: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("`{field}` must be finite")]
    NonFinite { field: &'static str },
    #[error("`{field}` must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("`{field}` must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("`{low_field}` ({low}) must not exceed `{high_field}` ({high})")]
    InvertedBand {
        low_field: &'static str,
        low: f64,
        high_field: &'static str,
        high: f64,
    },
    #[error("a four-wheel vehicle needs exactly 2 axles, got {0}")]
    AxleCount(usize),
}

/// Reported by [`PhysicsSolver`](crate::solver::PhysicsSolver) implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverError {
    #[error("solver refused to create a vehicle: {0}")]
    CreateFailed(String),
    #[error("solver vehicle exposes {0} wheels, expected 4")]
    WheelCount(usize),
}

/// Calibration problems. These are recovered locally and only reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalibrationError {
    #[error("attachment `{name}` is missing from the model")]
    MissingAttachment { name: &'static str },
}

/// Spawn-time failure of
/// [`VehicleControllerInit::build`](crate::vehicle_control::VehicleControllerInit::build).
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Parameters(#[from] ParameterError),
    #[error(transparent)]
    Solver(#[from] SolverError),
}
