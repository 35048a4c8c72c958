//! Four-wheel vehicle controller.
//!
//! Shapes raw driver commands into throttle, steering and brake, hands them
//! to an external [`PhysicsSolver`], and turns the solver's post-step state
//! into suspension poses, telemetry and effect intents.

pub mod boost;
pub mod command;
pub mod constants;
pub mod control;
pub mod curves;
pub mod effects;
pub mod error;
pub mod math;
pub mod params;
pub mod pose;
pub mod skid;
pub mod solver;
pub mod steer_control;
pub mod suspension;
pub mod telemetry;
pub mod throttle_control;
pub mod tuning;
pub mod vehicle_control;

pub use command::{Buttons, RawCommand};
pub use control::ControlState;
pub use effects::EffectIntent;
pub use error::{CalibrationError, ControllerError, ParameterError, SolverError};
pub use params::{VehicleDescriptor, VehicleParameters};
pub use pose::{Attachment, PoseHost, PoseParameterId, VehiclePose};
pub use solver::{BodyHandle, OperatingParams, PhysicsSolver, VehicleHandle, WheelHandle};
pub use suspension::WheelIndex;
pub use telemetry::VehicleTelemetry;
pub use tuning::VehicleTuningConfig;
pub use vehicle_control::{TickOutput, TickPhase, VehicleController, VehicleControllerInit};
