/// Moves `value` toward `target` by at most `|speed|`, never overshooting.
pub fn approach(target: f64, value: f64, speed: f64) -> f64 {
    let speed = speed.abs();
    let delta = target - value;

    if delta > speed {
        value + speed
    } else if delta < -speed {
        value - speed
    } else {
        target
    }
}

/// Linearly remaps `value` from `[a, b]` onto `[c, d]`, clamping the
/// interpolant to `[0, 1]`.
pub fn remap_val_clamped(value: f64, a: f64, b: f64, c: f64, d: f64) -> f64 {
    if a == b {
        return if value >= b { d } else { c };
    }
    let t = ((value - a) / (b - a)).clamp(0.0, 1.0);
    c + (d - c) * t
}
