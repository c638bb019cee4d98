//! DDS step pulse generator.
//!
//! Each axis owns a free-running 32-bit position counter. Every interrupt
//! tick adds the commanded velocity to it; a step pulse is emitted whenever
//! bit [`STEP_BIT`] of the counter changes. One step therefore corresponds to
//! [`STEP_MASK`] counter units.
//!
//! The generator is split in two halves:
//!
//! - [`StepgenShared`] holds the mailboxes crossing the interrupt boundary.
//!   The main loop writes velocities and reads positions; the interrupt does
//!   the opposite. Every mailbox is a single atomic word, so neither side
//!   ever observes a torn value.
//! - [`StepGenerator`] is owned by the interrupt handler and keeps the pulse
//!   timing state that nothing else needs to see.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};

use steplink_common::consts::{DEFAULT_STEP_WIDTH, NUM_AXES, STEP_BIT, STEP_MASK};
use steplink_common::hal::StepOutputs;

/// Largest per-tick velocity the generator accepts for a given pulse width.
///
/// At this rate bit [`STEP_BIT`] toggles once every `2 * step_width` ticks,
/// which leaves room for a full high and low phase of every pulse.
#[inline]
pub const fn max_tick_velocity(step_width: u32) -> i32 {
    let width = if step_width == 0 { 1 } else { step_width };
    let limit = STEP_MASK as u32 / (2 * width);
    limit as i32
}

/// Mailboxes shared between the main loop and the step interrupt.
#[derive(Debug)]
pub struct StepgenShared {
    velocity: [AtomicI32; NUM_AXES],
    position: [AtomicI32; NUM_AXES],
    step_width: AtomicU32,
    reset_request: AtomicBool,
}

impl Default for StepgenShared {
    fn default() -> Self {
        Self::new()
    }
}

impl StepgenShared {
    /// All velocities and positions zero, default pulse width.
    pub fn new() -> Self {
        Self {
            velocity: std::array::from_fn(|_| AtomicI32::new(0)),
            position: std::array::from_fn(|_| AtomicI32::new(0)),
            step_width: AtomicU32::new(DEFAULT_STEP_WIDTH),
            reset_request: AtomicBool::new(false),
        }
    }

    /// Publish new per-axis velocities (counter units per tick).
    pub fn update_velocities(&self, velocities: &[i32; NUM_AXES]) {
        for (slot, v) in self.velocity.iter().zip(velocities) {
            slot.store(*v, Ordering::Release);
        }
    }

    /// Velocities as last published by the main loop.
    pub fn velocities(&self) -> [i32; NUM_AXES] {
        std::array::from_fn(|i| self.velocity[i].load(Ordering::Acquire))
    }

    /// Current position counters.
    ///
    /// While a reset is pending the counters read as zero, so a report taken
    /// between the request and the next tick is already consistent with it.
    pub fn positions(&self) -> [i32; NUM_AXES] {
        if self.reset_request.load(Ordering::Acquire) {
            return [0; NUM_AXES];
        }
        std::array::from_fn(|i| self.position[i].load(Ordering::Acquire))
    }

    /// Step pulse width in ticks, applied from the next pulse on.
    pub fn set_step_width(&self, ticks: u32) {
        self.step_width.store(ticks.max(1), Ordering::Release);
    }

    /// Current pulse width in ticks.
    pub fn step_width(&self) -> u32 {
        self.step_width.load(Ordering::Acquire)
    }

    /// Stop all axes and clear the counters at the next tick.
    pub fn request_reset(&self) {
        for slot in &self.velocity {
            slot.store(0, Ordering::Release);
        }
        self.reset_request.store(true, Ordering::Release);
    }

    /// Whether a reset has been requested but not yet applied.
    pub fn reset_pending(&self) -> bool {
        self.reset_request.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct AxisPulse {
    position: i32,
    /// Counter value at the last emitted step.
    last_step: i32,
    /// Ticks left in the high phase of the current pulse.
    high_ticks: u32,
    positive: bool,
}

/// Interrupt-side state of the step generator.
#[derive(Debug)]
pub struct StepGenerator {
    shared: Arc<StepgenShared>,
    axes: [AxisPulse; NUM_AXES],
    ticks: u64,
}

impl StepGenerator {
    /// Generator bound to the given mailboxes.
    pub fn new(shared: Arc<StepgenShared>) -> Self {
        let mut axes = [AxisPulse::default(); NUM_AXES];
        for axis in &mut axes {
            axis.positive = true;
        }
        Self {
            shared,
            axes,
            ticks: 0,
        }
    }

    /// Mailboxes this generator serves.
    pub fn shared(&self) -> &Arc<StepgenShared> {
        &self.shared
    }

    /// Ticks executed since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// One interrupt period.
    pub fn tick<O: StepOutputs + ?Sized>(&mut self, pins: &mut O) {
        self.ticks += 1;

        if self.shared.reset_request.swap(false, Ordering::AcqRel) {
            for (i, axis) in self.axes.iter_mut().enumerate() {
                if axis.high_ticks > 0 {
                    pins.set_step(i, false);
                }
                *axis = AxisPulse {
                    positive: axis.positive,
                    ..AxisPulse::default()
                };
                self.shared.position[i].store(0, Ordering::Release);
            }
        }

        let width = self.shared.step_width.load(Ordering::Acquire).max(1);
        let limit = max_tick_velocity(width);

        for (i, axis) in self.axes.iter_mut().enumerate() {
            if axis.high_ticks > 0 {
                axis.high_ticks -= 1;
                if axis.high_ticks == 0 {
                    pins.set_step(i, false);
                }
            } else if (axis.position ^ axis.last_step) & (1 << STEP_BIT) != 0 {
                axis.last_step = axis.position;
                axis.high_ticks = width;
                pins.set_step(i, true);
            }

            let velocity = self.shared.velocity[i]
                .load(Ordering::Acquire)
                .clamp(-limit, limit);
            let positive = velocity >= 0;
            if positive != axis.positive {
                axis.positive = positive;
                pins.set_direction(i, positive);
            }

            axis.position = axis.position.wrapping_add(velocity);
            self.shared.position[i].store(axis.position, Ordering::Release);
        }
    }
}
