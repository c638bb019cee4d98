//! Periodic cycle: read → update → write.
//!
//! Drives a [`HostDriver`] at the configured period with
//! `clock_nanosleep(TIMER_ABSTIME)` under the `rt` feature and
//! `std::thread::sleep` otherwise.
//!
//! ## RT Setup Sequence
//! 1. `mlockall(MCL_CURRENT | MCL_FUTURE)`
//! 2. Prefault stack pages.
//! 3. `sched_setaffinity` to the configured core.
//! 4. `sched_setscheduler(SCHED_FIFO, priority)`

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use steplink_common::hal::LinkTransport;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::driver::HostDriver;
use crate::error::HostError;
use crate::pins::HostPins;

/// Cycles between periodic statistics lines.
pub const STATS_INTERVAL: u64 = 1000;
/// Overrun warnings after the first are emitted once per this many overruns.
pub const OVERRUN_LOG_INTERVAL: u64 = 1000;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Number of overruns detected.
    pub overruns: u64,
    /// Maximum wake-up latency [ns].
    pub max_latency_ns: i64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    /// Zeroed statistics.
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record a cycle duration.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns = self.sum_cycle_ns.saturating_add(duration_ns);
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns], 0 before the first cycle.
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }

    /// Count an overrun. Returns whether it should be logged.
    #[inline]
    pub fn record_overrun(&mut self) -> bool {
        self.overruns += 1;
        self.overruns == 1 || self.overruns % OVERRUN_LOG_INTERVAL == 0
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Errors during RT setup or cycle execution.
#[derive(Debug, Error)]
pub enum CycleError {
    /// RT system call failed.
    #[error("RT setup error: {0}")]
    RtSetup(String),

    /// Driver failure inside the cycle.
    #[error("cycle aborted: {0}")]
    Host(#[from] HostError),
}

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch 512 KiB of stack so the loop does not fault on it later.
fn prefault_stack() {
    let mut buf = [0u8; 512 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` outlives the call; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Full RT setup. Without the `rt` feature only the stack is prefaulted.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    debug!(cpu_core, rt_priority, "RT setup done");
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Runs the driver at a fixed period until stopped.
pub struct CycleRunner<T: LinkTransport> {
    driver: HostDriver<T>,
    pins: HostPins,
    stats: CycleStats,
    cycle_time_ns: i64,
    running: Arc<AtomicBool>,
    max_cycles: Option<u64>,
}

impl<T: LinkTransport> CycleRunner<T> {
    /// Runner for `driver` with `pins` as the boundary state.
    pub fn new(driver: HostDriver<T>, pins: HostPins, cycle_time_ns: i64) -> Self {
        Self {
            driver,
            pins,
            stats: CycleStats::new(),
            cycle_time_ns,
            running: Arc::new(AtomicBool::new(true)),
            max_cycles: None,
        }
    }

    /// Stop after `cycles` cycles.
    pub fn with_max_cycles(mut self, cycles: u64) -> Self {
        self.max_cycles = Some(cycles);
        self
    }

    /// Flag that keeps the loop alive. Clearing it stops the runner at the
    /// next cycle boundary.
    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// One cycle with `command` filling the inputs first.
    pub fn step<F>(&mut self, command: &mut F) -> Result<(), CycleError>
    where
        F: FnMut(&mut HostPins, u64),
    {
        command(&mut self.pins, self.stats.cycle_count);
        self.driver.read(&mut self.pins, self.cycle_time_ns)?;
        self.driver.update(&mut self.pins);
        self.driver.write()?;
        Ok(())
    }

    /// Run until the running flag clears or the cycle limit is reached.
    ///
    /// `command` is called at the start of every cycle with the pins and the
    /// cycle index; it plays the part of the automation framework.
    pub fn run<F>(&mut self, mut command: F) -> Result<(), CycleError>
    where
        F: FnMut(&mut HostPins, u64),
    {
        info!(
            cycle_time_ns = self.cycle_time_ns,
            max_cycles = ?self.max_cycles,
            "cycle loop started"
        );

        #[cfg(feature = "rt")]
        let result = self.run_rt_loop(&mut command);
        #[cfg(not(feature = "rt"))]
        let result = self.run_sim_loop(&mut command);

        info!(
            cycles = self.stats.cycle_count,
            overruns = self.stats.overruns,
            avg_ns = self.stats.avg_cycle_ns(),
            max_ns = self.stats.max_cycle_ns,
            "cycle loop stopped"
        );
        result
    }

    fn keep_going(&self) -> bool {
        self.running.load(Ordering::Relaxed)
            && self.max_cycles.is_none_or(|max| self.stats.cycle_count < max)
    }

    fn account(&mut self, duration_ns: i64, latency_ns: i64) {
        self.stats.record(duration_ns, latency_ns);
        if duration_ns > self.cycle_time_ns && self.stats.record_overrun() {
            warn!(
                actual_ns = duration_ns,
                budget_ns = self.cycle_time_ns,
                overruns = self.stats.overruns,
                "cycle overrun"
            );
        }
        if self.stats.cycle_count % STATS_INTERVAL == 0 {
            debug!(
                cycles = self.stats.cycle_count,
                avg_ns = self.stats.avg_cycle_ns(),
                max_ns = self.stats.max_cycle_ns,
                max_latency_ns = self.stats.max_latency_ns,
                ready = self.pins.ready,
                spi_fault = self.pins.spi_fault,
                "cycle stats"
            );
        }
    }

    /// RT loop with absolute-time sleeps on `CLOCK_MONOTONIC`.
    #[cfg(feature = "rt")]
    fn run_rt_loop<F>(&mut self, command: &mut F) -> Result<(), CycleError>
    where
        F: FnMut(&mut HostPins, u64),
    {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let now = || {
            clock_gettime(clock).map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))
        };
        let mut next_wake = now()?;

        while self.keep_going() {
            let cycle_start = now()?;
            let latency_ns = timespec_diff_ns(&cycle_start, &next_wake).abs();

            self.step(command)?;

            let duration_ns = timespec_diff_ns(&now()?, &cycle_start);
            self.account(duration_ns, latency_ns);

            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);
            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }

    /// Approximate pacing with `std::thread::sleep`.
    #[cfg(not(feature = "rt"))]
    fn run_sim_loop<F>(&mut self, command: &mut F) -> Result<(), CycleError>
    where
        F: FnMut(&mut HostPins, u64),
    {
        use std::time::{Duration, Instant};

        let period = Duration::from_nanos(self.cycle_time_ns.max(0) as u64);
        while self.keep_going() {
            let cycle_start = Instant::now();
            self.step(command)?;
            let elapsed = cycle_start.elapsed();
            self.account(elapsed.as_nanos() as i64, 0);
            if let Some(remaining) = period.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }

    /// Send the device a reset and release the link.
    pub fn shutdown(mut self) -> Result<(HostPins, CycleStats), CycleError> {
        self.driver.shutdown()?;
        Ok((self.pins, self.stats))
    }

    /// Driver.
    pub fn driver(&self) -> &HostDriver<T> {
        &self.driver
    }

    /// Mutable driver.
    pub fn driver_mut(&mut self) -> &mut HostDriver<T> {
        &mut self.driver
    }

    /// Boundary state.
    pub fn pins(&self) -> &HostPins {
        &self.pins
    }

    /// Timing statistics.
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
