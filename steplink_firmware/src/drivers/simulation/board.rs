use steplink_common::consts::{DEFAULT_PWM_FREQ_HZ, NUM_AXES, pwm_period};
use steplink_common::hal::{BoardHal, StepOutputs};
use steplink_common::protocol::{InputBits, OutputBits};
use tracing::trace;

/// In-memory board with observable pins and registers.
#[derive(Debug, Clone)]
pub struct SimBoard {
    inputs: InputBits,
    outputs: OutputBits,
    pwm_duty: u32,
    pwm_period: u32,

    step_high: [bool; NUM_AXES],
    positive: [bool; NUM_AXES],
    /// Rising step edges, signed by the direction pin at the time.
    steps: [i64; NUM_AXES],

    led_on: bool,
    led_toggles: u64,
    watchdog_kicks: u64,
    transfer_aborts: u32,
    transport_reinits: u32,
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBoard {
    /// Board in its power-on state: outputs off, PWM at the default carrier.
    pub fn new() -> Self {
        Self {
            inputs: InputBits::empty(),
            outputs: OutputBits::empty(),
            pwm_duty: 0,
            pwm_period: pwm_period(DEFAULT_PWM_FREQ_HZ),
            step_high: [false; NUM_AXES],
            positive: [true; NUM_AXES],
            steps: [0; NUM_AXES],
            led_on: false,
            led_toggles: 0,
            watchdog_kicks: 0,
            transfer_aborts: 0,
            transport_reinits: 0,
        }
    }

    /// Drive the input pins.
    pub fn set_inputs(&mut self, inputs: InputBits) {
        self.inputs = inputs;
    }

    /// Currently driven enable outputs.
    pub fn outputs(&self) -> OutputBits {
        self.outputs
    }

    /// PWM duty register.
    pub fn pwm_duty(&self) -> u32 {
        self.pwm_duty
    }

    /// PWM period register.
    pub fn pwm_period(&self) -> u32 {
        self.pwm_period
    }

    /// Net steps emitted per axis.
    pub fn steps(&self) -> [i64; NUM_AXES] {
        self.steps
    }

    /// Direction pin levels (`true` = positive).
    pub fn directions(&self) -> [bool; NUM_AXES] {
        self.positive
    }

    /// Heartbeat LED level.
    pub fn led_on(&self) -> bool {
        self.led_on
    }

    /// Number of LED toggles.
    pub fn led_toggles(&self) -> u64 {
        self.led_toggles
    }

    /// Number of watchdog services.
    pub fn watchdog_kicks(&self) -> u64 {
        self.watchdog_kicks
    }

    /// Number of DMA aborts.
    pub fn transfer_aborts(&self) -> u32 {
        self.transfer_aborts
    }

    /// Number of transport reinitializations.
    pub fn transport_reinits(&self) -> u32 {
        self.transport_reinits
    }
}

impl BoardHal for SimBoard {
    fn read_inputs(&mut self) -> InputBits {
        self.inputs
    }

    fn write_outputs(&mut self, outputs: OutputBits) {
        // Only the three enable pins exist on the board.
        self.outputs = outputs & OutputBits::all();
    }

    fn set_pwm_duty(&mut self, duty: u32) {
        self.pwm_duty = duty;
    }

    fn set_pwm_period(&mut self, period: u32) {
        self.pwm_period = period;
    }

    fn abort_transfers(&mut self) {
        self.transfer_aborts += 1;
    }

    fn reinit_transport(&mut self) {
        self.transport_reinits += 1;
        trace!(count = self.transport_reinits, "transport reinitialized");
    }

    fn toggle_led(&mut self) {
        self.led_on = !self.led_on;
        self.led_toggles += 1;
    }

    fn kick_watchdog(&mut self) {
        self.watchdog_kicks += 1;
    }
}

impl StepOutputs for SimBoard {
    fn set_direction(&mut self, axis: usize, positive: bool) {
        self.positive[axis] = positive;
    }

    fn set_step(&mut self, axis: usize, high: bool) {
        if high && !self.step_high[axis] {
            self.steps[axis] += if self.positive[axis] { 1 } else { -1 };
        }
        self.step_high[axis] = high;
    }
}
