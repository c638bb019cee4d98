//! Digital I/O bit assignments.

use bitflags::bitflags;

bitflags! {
    /// Device inputs, bit-packed into one word (reply to `CM1`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InputBits: u32 {
        /// Abort button.
        const ABORT   = 1 << 0;
        /// Feed hold button.
        const HOLD    = 1 << 1;
        /// Cycle resume button.
        const RESUME  = 1 << 2;
        /// X axis limit switch.
        const LIMIT_X = 1 << 3;
        /// Y axis limit switch.
        const LIMIT_Y = 1 << 4;
        /// Z axis limit switch.
        const LIMIT_Z = 1 << 5;
    }
}

bitflags! {
    /// Device outputs, bit-packed into `CM2` word 1.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OutputBits: u32 {
        /// Stepper driver enable.
        const MOTOR_ENABLE   = 1 << 0;
        /// Spindle enable.
        const SPINDLE_ENABLE = 1 << 1;
        /// Coolant enable.
        const COOLANT_ENABLE = 1 << 2;
    }
}

impl OutputBits {
    /// Build the output word from the three enable signals.
    pub fn from_enables(motor: bool, spindle: bool, coolant: bool) -> Self {
        let mut bits = Self::empty();
        bits.set(Self::MOTOR_ENABLE, motor);
        bits.set(Self::SPINDLE_ENABLE, spindle);
        bits.set(Self::COOLANT_ENABLE, coolant);
        bits
    }
}
