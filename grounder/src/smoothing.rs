//! Critically damped follower for a single scalar.
//!
//! Drives a tracked value (the grounded object's height) toward a moving target
//! without overshoot. The velocity is part of the object's state: callers keep
//! the returned velocity and pass it back on the next tick.
//!
//! The discrete step integrates a critically damped spring with angular
//! frequency `omega = 2 / response_time`, using a cubic rational approximation
//! of `exp(-omega * dt)`. A final clamp removes any crossing of the target that
//! the approximation would otherwise produce. Near the target, once a step is
//! too small to change an `f32`, the value moves by one representable step
//! instead, so the gap to a constant target shrinks every tick until it is zero.

use crate::settings::{EXP_APPROX_C2, EXP_APPROX_C3, MIN_SMOOTH_TIME};

/// Value and velocity of one smoothed scalar.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FollowerState {
    pub value: f32,
    pub velocity: f32,
}

impl FollowerState {
    /// State at rest at `value`.
    #[inline]
    pub fn at(value: f32) -> Self {
        Self {
            value,
            velocity: 0.0,
        }
    }
}

/// Advance `current` toward `target` by `dt` seconds.
///
/// Returns `(new_value, new_velocity)`. `response_time <= 0` snaps: the result
/// is exactly `(target, 0.0)`. Negative `dt` is treated as zero.
#[inline]
pub fn advance(current: f32, velocity: f32, target: f32, response_time: f32, dt: f32) -> (f32, f32) {
    advance_with_max_speed(current, velocity, target, response_time, dt, f32::INFINITY)
}

/// [`advance`] with the rate of change limited to `max_speed` units per second.
pub fn advance_with_max_speed(
    current: f32,
    velocity: f32,
    target: f32,
    response_time: f32,
    dt: f32,
    max_speed: f32,
) -> (f32, f32) {
    // NaN response time falls through to the snap as well.
    if !(response_time > 0.0) {
        return (target, 0.0);
    }

    let response_time = response_time.max(MIN_SMOOTH_TIME);
    let dt = dt.max(0.0);
    let omega = 2.0 / response_time;

    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + EXP_APPROX_C2 * x * x + EXP_APPROX_C3 * x * x * x);

    let max_change = max_speed.max(0.0) * response_time;
    let change = (current - target).clamp(-max_change, max_change);
    let clamped_target = current - change;

    let temp = (velocity + omega * change) * dt;
    let mut new_velocity = (velocity - omega * temp) * decay;
    let mut new_value = clamped_target + (change + temp) * decay;

    // Never pass the real target.
    let approaching_from_below = target - current > 0.0;
    if approaching_from_below == (new_value > target) {
        new_value = target;
        new_velocity = 0.0;
    } else if dt > 0.0 && new_value == current {
        new_value = step_toward(current, target);
    }

    (new_value, new_velocity)
}

/// The `f32` adjacent to `value` in the direction of `target`. Never passes `target`.
fn step_toward(value: f32, target: f32) -> f32 {
    if value == target || !value.is_finite() || target.is_nan() {
        return target;
    }
    if value == 0.0 {
        return f32::from_bits(1).copysign(target);
    }
    let bits = value.to_bits();
    // Away from zero is one bit up in magnitude.
    if (target > value) == (value > 0.0) {
        f32::from_bits(bits + 1)
    } else {
        f32::from_bits(bits - 1)
    }
}

/// A [`FollowerState`] bundled with its response time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Follower {
    state: FollowerState,
    response_time: f32,
}

impl Follower {
    pub fn new(value: f32, response_time: f32) -> Self {
        Self {
            state: FollowerState::at(value),
            response_time,
        }
    }

    #[inline]
    pub fn state(&self) -> FollowerState {
        self.state
    }

    #[inline]
    pub fn value(&self) -> f32 {
        self.state.value
    }

    #[inline]
    pub fn response_time(&self) -> f32 {
        self.response_time
    }

    /// Advance one tick toward `target` and return the new value.
    pub fn advance(&mut self, target: f32, dt: f32) -> f32 {
        let (value, velocity) = advance(
            self.state.value,
            self.state.velocity,
            target,
            self.response_time,
            dt,
        );
        self.state = FollowerState { value, velocity };
        value
    }

    /// Reinitialize at rest at `value` (e.g., after a teleport).
    pub fn snap(&mut self, value: f32) {
        self.state = FollowerState::at(value);
    }
}
