//! Host driver: the three functions the periodic scheduler calls.
//!
//! Each cycle runs `read → update → write`:
//!
//! 1. [`HostDriver::read`] collects the reply to last cycle's velocity frame
//!    (inputs and elapsed-cycles report), exchanges the `Io` frame, checks
//!    the link canary and folds the reported counters into the feedback.
//! 2. [`HostDriver::update`] plans the next velocities.
//! 3. [`HostDriver::write`] starts the velocity exchange, which completes
//!    during the next `read`.

use steplink_common::config::Validate;
use steplink_common::consts::{NUM_AXES, SCALE_EPSILON, STEP_MASK};
use steplink_common::hal::LinkTransport;
use steplink_common::protocol::{Command, CommandTag, Frame, InputBits, idx};
use tracing::{debug, error, info};

use crate::config::HostConfig;
use crate::debounce::DebounceState;
use crate::error::HostError;
use crate::pins::HostPins;
use crate::planner::Axes;
use crate::supervisor::LinkSupervisor;

/// Host side of one board.
pub struct HostDriver<T: LinkTransport> {
    transport: T,
    axes: Axes,
    debounce: DebounceState,
    supervisor: LinkSupervisor,

    pwm_period: u32,
    max_velocity: f64,

    period_ns: i64,
    dt: f64,
    old_scale: [f64; NUM_AXES],
    scale_inv: [f64; NUM_AXES],

    staged: Frame,
    in_flight: bool,
    cycles: u64,
}

impl<T: LinkTransport> HostDriver<T> {
    /// Take over `transport` and send the startup configuration frame.
    ///
    /// # Errors
    /// `HostError::Config` if `config` fails validation; nothing is sent.
    pub fn new(config: &HostConfig, mut transport: T) -> Result<Self, HostError> {
        config.validate()?;
        let link = config.link;
        let cfg = Command::Config {
            step_width: link.step_width,
            pwm_period: link.pwm_period(),
        };
        transport.start_exchange(&cfg.encode())?;
        info!(
            transport = transport.name(),
            step_width = link.step_width,
            pwm_period = link.pwm_period(),
            max_velocity = link.max_velocity(),
            active_axes = link.active_axes,
            "host driver started"
        );

        let period_ns = link.cycle_time_ns();
        Ok(Self {
            transport,
            axes: Axes::new(link.active_axes),
            debounce: DebounceState::new(),
            supervisor: LinkSupervisor::new(),
            pwm_period: link.pwm_period(),
            max_velocity: link.max_velocity(),
            period_ns,
            dt: period_ns as f64 / 1e9,
            old_scale: [f64::NAN; NUM_AXES],
            scale_inv: [1.0 / f64::from(STEP_MASK); NUM_AXES],
            staged: Command::Velocity([0; NUM_AXES]).encode(),
            in_flight: true,
            cycles: 0,
        })
    }

    /// Input half of the cycle. `period_ns` is the scheduler period; a
    /// non-positive value keeps the previous one.
    pub fn read(&mut self, pins: &mut HostPins, period_ns: i64) -> Result<(), HostError> {
        if std::mem::take(&mut self.in_flight) {
            let rx = self.transport.finish_exchange()?;
            let inputs = self.debounce.update(rx.word(idx::INPUTS));
            pins.apply_inputs(InputBits::from_bits_truncate(inputs));
            pins.report_cycles = rx.word(idx::REPORT_CYCLES);
        }

        let io = Command::Io {
            outputs: pins.output_bits(),
            pwm_duty: pins.duty_word(self.pwm_period),
        };
        self.transport.start_exchange(&io.encode())?;

        if period_ns > 0 && period_ns != self.period_ns {
            self.period_ns = period_ns;
            self.dt = period_ns as f64 / 1e9;
            debug!(period_ns, "scheduler period changed");
        }
        self.refresh_scales(&mut pins.scale);

        let rx = self.transport.finish_exchange()?;
        if !pins.spi_fault {
            self.supervisor.clear_fault();
        }
        self.supervisor.check(rx.tag_word(), CommandTag::Velocity);
        pins.ready = self.supervisor.ready();

        let counts = rx.axis_words();
        for (i, count) in counts.into_iter().enumerate() {
            let feedback = self.axes.state_mut(i).feedback_mut();
            if let Err(e) = feedback.update(count) {
                error!(error = %e, "feedback lost");
                self.supervisor.set_fault();
            }
            pins.position_fb[i] = feedback.position(self.scale_inv[i]);
        }
        pins.spi_fault = self.supervisor.fault();
        Ok(())
    }

    /// Plan velocities for the next cycle and stage the velocity frame.
    pub fn update(&mut self, pins: &mut HostPins) {
        let words = self.axes.plan(
            &pins.position_cmd,
            &pins.scale,
            &mut pins.max_accel,
            self.dt,
            self.max_velocity,
        );
        self.staged = Command::Velocity(words).encode();
    }

    /// Start the velocity exchange.
    pub fn write(&mut self) -> Result<(), HostError> {
        self.transport.start_exchange(&self.staged)?;
        self.in_flight = true;
        self.cycles += 1;
        Ok(())
    }

    /// Drain the link, reset the device and release the transport.
    pub fn shutdown(&mut self) -> Result<(), HostError> {
        if std::mem::take(&mut self.in_flight) {
            self.transport.finish_exchange()?;
        }
        self.transport.start_exchange(&Command::Reset.encode())?;
        self.transport.finish_exchange()?;
        self.axes.reset();
        self.transport.shutdown()?;
        info!(cycles = self.cycles, "host driver stopped");
        Ok(())
    }

    // The first call always computes: `old_scale` starts as NaN.
    fn refresh_scales(&mut self, scale: &mut [f64; NUM_AXES]) {
        for (i, s) in scale.iter_mut().enumerate() {
            if *s != self.old_scale[i] {
                self.old_scale[i] = *s;
                if s.abs() < SCALE_EPSILON {
                    *s = 1.0;
                }
                self.scale_inv[i] = (1.0 / f64::from(STEP_MASK)) / *s;
            }
        }
    }

    /// Planner state.
    pub fn axes(&self) -> &Axes {
        &self.axes
    }

    /// Link state.
    pub fn supervisor(&self) -> &LinkSupervisor {
        &self.supervisor
    }

    /// Transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutable transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Current cycle period [s].
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Velocity limit [steps/s].
    pub fn max_velocity(&self) -> f64 {
        self.max_velocity
    }

    /// Cached feedback factor of axis `i`.
    pub fn scale_inv(&self, i: usize) -> f64 {
        self.scale_inv[i]
    }

    /// Velocity frame staged for the next write.
    pub fn staged(&self) -> &Frame {
        &self.staged
    }

    /// Completed cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{SimTiming, SimulatedLink};
    use steplink_common::protocol::OutputBits;

    fn driver() -> (HostDriver<SimulatedLink>, HostPins) {
        let config = HostConfig::default();
        let link = SimulatedLink::new(SimTiming::default());
        let pins = HostPins::from_config(&config);
        (HostDriver::new(&config, link).unwrap(), pins)
    }

    fn cycle(d: &mut HostDriver<SimulatedLink>, pins: &mut HostPins) {
        d.read(pins, 1_000_000).unwrap();
        d.update(pins);
        d.write().unwrap();
    }

    #[test]
    fn startup_mismatch_is_forgiven() {
        let (mut d, mut pins) = driver();
        cycle(&mut d, &mut pins);
        assert!(!pins.ready);
        assert!(!pins.spi_fault);
        cycle(&mut d, &mut pins);
        assert!(pins.ready);
        assert!(!pins.spi_fault);
    }

    #[test]
    fn config_frame_reaches_device() {
        let (mut d, mut pins) = driver();
        cycle(&mut d, &mut pins);
        let board = d.transport().device().board();
        assert_eq!(board.pwm_period(), 39_999);
        assert_eq!(d.transport().device().stepgen().step_width(), 1);
    }

    #[test]
    fn outputs_and_duty_applied() {
        let (mut d, mut pins) = driver();
        pins.motor_enable = true;
        pins.coolant_enable = true;
        pins.pwm_duty = 25.0;
        cycle(&mut d, &mut pins);
        cycle(&mut d, &mut pins);
        let board = d.transport().device().board();
        assert_eq!(board.outputs(), OutputBits::MOTOR_ENABLE | OutputBits::COOLANT_ENABLE);
        assert_eq!(board.pwm_duty(), 10_000);
    }

    #[test]
    fn inputs_need_three_samples() {
        let (mut d, mut pins) = driver();
        d.transport_mut()
            .device_mut()
            .board_mut()
            .set_inputs(InputBits::HOLD);
        let mut seen = Vec::new();
        for _ in 0..6 {
            cycle(&mut d, &mut pins);
            seen.push(pins.hold);
        }
        // Staged by the first Io frame, reported with the next velocity reply.
        assert!(!seen[0] && !seen[1]);
        assert!(seen[5]);
    }

    #[test]
    fn zero_scale_is_replaced() {
        let (mut d, mut pins) = driver();
        pins.scale[2] = 0.0;
        cycle(&mut d, &mut pins);
        assert_eq!(pins.scale[2], 1.0);
        assert_eq!(d.scale_inv(2), 1.0 / f64::from(STEP_MASK));
    }

    #[test]
    fn period_change_updates_dt() {
        let (mut d, mut pins) = driver();
        assert_eq!(d.dt(), 0.001);
        d.read(&mut pins, 2_000_000).unwrap();
        assert_eq!(d.dt(), 0.002);
        d.update(&mut pins);
        d.write().unwrap();
        d.read(&mut pins, 0).unwrap();
        assert_eq!(d.dt(), 0.002);
    }

    #[test]
    fn cut_wire_latches_fault_until_cleared() {
        let (mut d, mut pins) = driver();
        for _ in 0..3 {
            cycle(&mut d, &mut pins);
        }
        assert!(pins.ready);

        d.transport_mut().set_connected(false);
        cycle(&mut d, &mut pins);
        assert!(!pins.ready);
        assert!(pins.spi_fault);

        d.transport_mut().set_connected(true);
        cycle(&mut d, &mut pins);
        cycle(&mut d, &mut pins);
        assert!(pins.spi_fault);

        pins.spi_fault = false;
        cycle(&mut d, &mut pins);
        assert!(pins.ready);
        assert!(!pins.spi_fault);
    }

    #[test]
    fn shutdown_resets_device() {
        let (mut d, mut pins) = driver();
        pins.spindle_enable = true;
        cycle(&mut d, &mut pins);
        cycle(&mut d, &mut pins);
        d.shutdown().unwrap();
        d.transport_mut().advance(4);
        assert_eq!(d.transport().device().board().outputs(), OutputBits::empty());
    }

    #[test]
    fn shutdown_zeroes_feedback() {
        let (mut d, mut pins) = driver();
        pins.position_cmd[0] = 1.0;
        pins.max_accel[0] = 100.0;
        for _ in 0..50 {
            cycle(&mut d, &mut pins);
        }
        assert_ne!(d.axes().state(0).feedback().counts(), 0);

        d.shutdown().unwrap();
        assert_eq!(d.axes().state(0).feedback().counts(), 0);
        assert_eq!(d.axes().state(0).velocity(), 0.0);
    }

    #[test]
    fn invalid_config_is_refused() {
        let mut config = HostConfig::default();
        config.link.step_width = 0;
        let link = SimulatedLink::new(SimTiming::default());
        assert!(matches!(
            HostDriver::new(&config, link),
            Err(HostError::Config(_))
        ));
    }

    #[test]
    fn inactive_axes_never_move() {
        let mut config = HostConfig::default();
        config.link.active_axes = 1;
        let link = SimulatedLink::new(SimTiming::default());
        let mut d = HostDriver::new(&config, link).unwrap();
        let mut pins = HostPins::from_config(&config);
        pins.position_cmd = [1.0; NUM_AXES];
        pins.max_accel = [100.0; NUM_AXES];
        for _ in 0..50 {
            cycle(&mut d, &mut pins);
        }
        assert_eq!(d.axes().count(), 1);
        assert_ne!(d.axes().state(0).feedback().counts(), 0);
        for i in 1..NUM_AXES {
            assert_eq!(d.axes().state(i).feedback().counts(), 0);
            assert_eq!(d.staged().axis_words()[i], 0);
        }
    }
}
