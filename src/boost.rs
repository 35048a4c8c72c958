use crate::{
    params::EngineParams,
    solver::{OperatingParams, PhysicsSolver, VehicleHandle},
};
use tracing::debug;

/// Keeps the boost cue alive for a minimum duration regardless of how
/// quickly the solver's physical boost runs out.
#[derive(Debug, Clone)]
pub struct BoostManager {
    cue_duration: f64,
    /// Time since the cue last started; `None` once it has ended.
    cue_elapsed: Option<f64>,
    last_requested: bool,
    physically_active: bool,
    boost_time_left: i32,
}

/// Result of one [`BoostManager::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoostStatus {
    pub cue_active: bool,
    pub physically_active: bool,
    /// The cue started this tick.
    pub started: bool,
}

impl BoostManager {
    pub fn new(cue_duration: f64) -> Self {
        Self {
            cue_duration,
            cue_elapsed: None,
            last_requested: false,
            physically_active: false,
            boost_time_left: 0,
        }
    }

    /// Physical boost: the solver's running delay exceeds the configured one.
    pub fn physically_boosting(op: &OperatingParams, engine: &EngineParams) -> bool {
        op.boost_delay - engine.boost_delay > 0.0
    }

    pub fn update(
        &mut self,
        requested: bool,
        operating: Option<&OperatingParams>,
        engine: &EngineParams,
        time_delta_sec: f64,
    ) -> BoostStatus {
        if let Some(op) = operating {
            self.physically_active = Self::physically_boosting(op, engine);
            self.boost_time_left = op.boost_time_left;
        }

        // vehicles without a booster never cue
        let requested = requested && engine.has_boost();
        let started = requested && !self.last_requested;
        self.last_requested = requested;

        self.cue_elapsed = if started {
            debug!(duration = self.cue_duration, "boost cue started");
            Some(0.0)
        } else {
            self.cue_elapsed
                .map(|elapsed| elapsed + time_delta_sec)
                .filter(|&elapsed| elapsed <= self.cue_duration || self.physically_active)
        };

        BoostStatus {
            cue_active: self.is_cue_active(),
            physically_active: self.physically_active,
            started,
        }
    }

    pub fn is_cue_active(&self) -> bool {
        self.cue_elapsed.is_some()
    }

    pub fn is_physically_active(&self) -> bool {
        self.physically_active
    }

    pub fn boost_time_left(&self) -> i32 {
        self.boost_time_left
    }

    pub fn reset(&mut self) {
        self.cue_elapsed = None;
        self.last_requested = false;
        self.physically_active = false;
    }
}

/// Advances the solver-side booster timer. Returns whether it is still running.
pub fn update_booster<S>(solver: &mut S, vehicle: VehicleHandle, time_delta_sec: f64) -> bool
where
    S: PhysicsSolver + ?Sized,
{
    solver.update_booster(vehicle, time_delta_sec) > 0.0
}
