use crate::suspension::WheelIndex;
use nalgebra::Point3;

/// Presentation requests produced during sampling. The controller only
/// describes what should happen; a dispatcher plays it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectIntent {
    SkidStart,
    SkidStop,
    WheelDust {
        wheel: WheelIndex,
        position: Point3<f64>,
        /// Cloud size in `(0, 1]`.
        scale: f64,
    },
    BoostStart,
}

impl EffectIntent {
    pub fn is_dust(&self) -> bool {
        matches!(self, Self::WheelDust { .. })
    }
}
