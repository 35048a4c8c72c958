use crate::{
    constants::{DUST_SPEED, SKID_LOW_SPEED_MULTIPLIER, SKID_SPEED_FACTOR, WHEEL_COUNT},
    effects::EffectIntent,
    math::remap_val_clamped,
    params::EffectToggles,
    suspension::{WheelIndex, WheelState},
};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkidTransition {
    Idle,
    Started,
    Continuing,
    Stopped,
}

impl SkidTransition {
    pub fn is_skidding(self) -> bool {
        matches!(self, Self::Started | Self::Continuing)
    }

    /// Effect intents for this transition. Dust is placed at every contact
    /// point while skidding.
    pub fn emit(
        self,
        wheels: &[WheelState; WHEEL_COUNT],
        toggles: &EffectToggles,
        out: &mut Vec<EffectIntent>,
    ) {
        if !toggles.skid_effects {
            return;
        }
        match self {
            Self::Idle => return,
            Self::Stopped => {
                out.push(EffectIntent::SkidStop);
                return;
            }
            Self::Started => out.push(EffectIntent::SkidStart),
            Self::Continuing => {}
        }
        out.extend(WheelIndex::ALL.into_iter().map(|wheel| EffectIntent::WheelDust {
            wheel,
            position: wheels[wheel.index()].contact_point,
            scale: 1.0,
        }));
    }
}

/// Flags the vehicle as skidding when lateral slip exceeds a speed-scaled
/// threshold.
#[derive(Debug, Clone)]
pub struct SkidDetector {
    threshold: f64,
    skidding: bool,
}

impl SkidDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            skidding: false,
        }
    }

    pub fn is_skidding(&self) -> bool {
        self.skidding
    }

    /// Once skidding, the plain threshold holds until slip falls under it.
    /// Otherwise the vehicle must slide at 15% of its forward speed, ramped
    /// up at low speed so crawling never registers.
    pub fn effective_threshold(&self, speed: f64) -> f64 {
        if self.skidding {
            return self.threshold;
        }
        // forward speed only; reversing always takes the ramp
        let relaxed = speed * SKID_SPEED_FACTOR;
        if relaxed >= self.threshold {
            return relaxed;
        }
        remap_val_clamped(
            speed.abs(),
            0.0,
            self.threshold / SKID_SPEED_FACTOR,
            self.threshold * SKID_LOW_SPEED_MULTIPLIER,
            self.threshold,
        )
    }

    pub fn update(&mut self, skid_speed: f64, speed: f64, powered_on: bool) -> SkidTransition {
        let threshold = self.effective_threshold(speed);
        let skidding = skid_speed > threshold && powered_on;

        let transition = match (self.skidding, skidding) {
            (false, true) => SkidTransition::Started,
            (true, true) => SkidTransition::Continuing,
            (true, false) => SkidTransition::Stopped,
            (false, false) => SkidTransition::Idle,
        };
        if matches!(transition, SkidTransition::Started | SkidTransition::Stopped) {
            debug!(skid_speed, threshold, ?transition, "skid state changed");
        }
        self.skidding = skidding;
        transition
    }

    pub fn reset(&mut self) {
        self.skidding = false;
    }
}

/// Kicks up dust behind a fast vehicle, sized by how close it is to top speed.
pub fn speed_dust(
    display_speed: i32,
    max_speed: f64,
    powered_on: bool,
    toggles: &EffectToggles,
    wheels: &[WheelState; WHEEL_COUNT],
    out: &mut Vec<EffectIntent>,
) {
    let speed = f64::from(display_speed);
    if speed < DUST_SPEED || !toggles.dust_cloud || !powered_on {
        return;
    }
    let scale = remap_val_clamped(speed, DUST_SPEED, max_speed, 0.0, 1.0);
    if scale <= 0.0 {
        return;
    }
    out.extend(WheelIndex::ALL.into_iter().map(|wheel| EffectIntent::WheelDust {
        wheel,
        position: wheels[wheel.index()].contact_point,
        scale,
    }));
}
