//! Velocity profile planner.
//!
//! Turns a position command stream (one sample per host cycle) into a
//! per-axis DDS velocity. The planner matches the command velocity as fast
//! as the acceleration limit allows and then trims the remaining position
//! error, using the unwrapped feedback position as ground truth.
//!
//! Units inside the planner are steps and steps/s. The output is in DDS
//! counter units per step-interrupt tick ([`VEL_SCALE`]).

use steplink_common::consts::{NUM_AXES, VEL_SCALE};

use crate::feedback::PositionAccumulator;

/// Position error [steps] below which the planner stops correcting.
pub const POSITION_TOLERANCE: f64 = 0.0001;

/// Feedback delay the position estimate compensates for [cycles].
pub const FEEDBACK_DELAY_CYCLES: f64 = 1.5;

/// Planner and feedback memory of one axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisState {
    old_position: f64,
    old_velocity: f64,
    feedback: PositionAccumulator,
}

impl AxisState {
    /// Fresh state for axis `index`.
    pub const fn new(index: usize) -> Self {
        Self {
            old_position: 0.0,
            old_velocity: 0.0,
            feedback: PositionAccumulator::new(index),
        }
    }

    /// Last planned velocity [steps/s].
    pub fn velocity(&self) -> f64 {
        self.old_velocity
    }

    /// Last position command [steps].
    pub fn commanded_steps(&self) -> f64 {
        self.old_position
    }

    /// Feedback accumulator.
    pub fn feedback(&self) -> &PositionAccumulator {
        &self.feedback
    }

    /// Mutable feedback accumulator.
    pub fn feedback_mut(&mut self) -> &mut PositionAccumulator {
        &mut self.feedback
    }

    /// Forget planner memory and feedback, matching a board whose counters
    /// were just zeroed.
    pub fn reset(&mut self) {
        self.old_position = 0.0;
        self.old_velocity = 0.0;
        self.feedback.reset();
    }
}

/// Plan one cycle for one axis and return the new velocity [steps/s].
///
/// `max_accel` is corrected in place: negative values become zero (no user
/// limit) and values beyond the one-cycle limit are lowered to it.
pub fn plan_axis(
    state: &mut AxisState,
    command: f64,
    scale: f64,
    max_accel: &mut f64,
    dt: f64,
    max_velocity: f64,
) -> f64 {
    // Absolute limit: zero to full speed in one cycle.
    let mut accel_limit = max_velocity / dt;
    let user_limit = *max_accel * scale.abs();
    if *max_accel <= 0.0 {
        *max_accel = 0.0;
    } else if user_limit > accel_limit {
        *max_accel = accel_limit / scale.abs();
    } else if user_limit > 0.0 {
        accel_limit = user_limit;
    }

    let pos_cmd = command * scale;
    let vel_cmd = ((pos_cmd - state.old_position) / dt).clamp(-max_velocity, max_velocity);
    state.old_position = pos_cmd;

    let old_vel = state.old_velocity;
    let mut match_accel = if vel_cmd > old_vel {
        accel_limit
    } else {
        -accel_limit
    };
    let match_time = (vel_cmd - old_vel) / match_accel;

    // Where the output ends up after the match, and where the command will be.
    let avg_v = (vel_cmd + old_vel) * 0.5;
    let est_out = state.feedback.steps() + avg_v * match_time;
    let est_cmd = pos_cmd + vel_cmd * (match_time - FEEDBACK_DELAY_CYCLES * dt);
    let est_err = est_out - est_cmd;

    let mut new_vel = if match_time < dt {
        if est_err.abs() < POSITION_TOLERANCE {
            vel_cmd
        } else {
            let corrected = vel_cmd - 0.5 * est_err / dt;
            let max_step = accel_limit * dt;
            if corrected > old_vel + max_step {
                old_vel + max_step
            } else if corrected < old_vel - max_step {
                old_vel - max_step
            } else {
                corrected
            }
        }
    } else {
        // Would ramping the other way for one cycle shrink the error?
        let dv = -2.0 * match_accel * dt;
        let dp = dv * match_time;
        if (est_err + dp * 2.0).abs() < est_err.abs() {
            match_accel = -match_accel;
        }
        old_vel + match_accel * dt
    };

    new_vel = new_vel.clamp(-max_velocity, max_velocity);
    state.old_velocity = new_vel;
    new_vel
}

/// Per-cycle DDS word for a velocity in steps/s.
#[inline]
pub fn velocity_word(steps_per_second: f64) -> i32 {
    (steps_per_second * VEL_SCALE) as i32
}

/// Planner container for all axes of one board.
#[derive(Debug, Clone)]
pub struct Axes {
    states: [AxisState; NUM_AXES],
    count: usize,
}

impl Axes {
    /// `count` active axes (capped at [`NUM_AXES`]); the rest stay at rest.
    pub fn new(count: usize) -> Self {
        Self {
            states: std::array::from_fn(AxisState::new),
            count: count.min(NUM_AXES),
        }
    }

    /// Number of active axes.
    pub fn count(&self) -> usize {
        self.count
    }

    /// State of axis `i`.
    pub fn state(&self, i: usize) -> &AxisState {
        &self.states[i]
    }

    /// Mutable state of axis `i`.
    pub fn state_mut(&mut self, i: usize) -> &mut AxisState {
        &mut self.states[i]
    }

    /// Reset every axis after a board reset.
    pub fn reset(&mut self) {
        self.states.iter_mut().for_each(AxisState::reset);
    }

    /// Plan every active axis and return the velocity words for `CM1`.
    pub fn plan(
        &mut self,
        position_cmd: &[f64; NUM_AXES],
        scale: &[f64; NUM_AXES],
        max_accel: &mut [f64; NUM_AXES],
        dt: f64,
        max_velocity: f64,
    ) -> [i32; NUM_AXES] {
        let mut words = [0i32; NUM_AXES];
        for i in 0..self.count {
            let v = plan_axis(
                &mut self.states[i],
                position_cmd[i],
                scale[i],
                &mut max_accel[i],
                dt,
                max_velocity,
            );
            words[i] = velocity_word(v);
        }
        words
    }
}
