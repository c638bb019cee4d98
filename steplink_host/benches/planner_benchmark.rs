//! Planner and host-cycle micro-benchmark.
//!
//! - `plan_axis` alone, cruising and ramping
//! - `Axes::plan` for all axes
//! - One full read → update → write cycle against the simulated device

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use steplink_common::consts::NUM_AXES;
use steplink_host::HostDriver;
use steplink_host::config::HostConfig;
use steplink_host::pins::HostPins;
use steplink_host::planner::{Axes, AxisState, plan_axis};
use steplink_host::transport::{SimTiming, SimulatedLink};

const DT: f64 = 0.001; // 1 kHz
const VMAX: f64 = 20_000.0;

fn bench_plan_axis(c: &mut Criterion) {
    let mut group = c.benchmark_group("planner");

    group.bench_function("plan_axis_cruise", |b| {
        let mut state = AxisState::new(0);
        let mut accel = 0.0;
        let mut cmd = 0.0;
        b.iter(|| {
            cmd += 0.01;
            black_box(plan_axis(&mut state, black_box(cmd), 100.0, &mut accel, DT, VMAX))
        });
    });

    group.bench_function("plan_axis_ramp", |b| {
        let mut state = AxisState::new(0);
        let mut accel = 5.0;
        let mut n = 0u64;
        b.iter(|| {
            n += 1;
            let cmd = if (n / 5000) % 2 == 0 { 100.0 } else { -100.0 };
            black_box(plan_axis(&mut state, black_box(cmd), 100.0, &mut accel, DT, VMAX))
        });
    });

    group.bench_function("axes_plan_4", |b| {
        let mut axes = Axes::new(NUM_AXES);
        let scale = [100.0, -80.0, 200.0, 1.0];
        let mut accel = [50.0; NUM_AXES];
        let mut t = 0.0f64;
        b.iter(|| {
            t += DT;
            let cmd = [t.sin(), t.cos(), -t.sin(), 0.5 * t];
            black_box(axes.plan(&cmd, &scale, &mut accel, DT, VMAX))
        });
    });

    group.finish();
}

fn bench_host_cycle(c: &mut Criterion) {
    // Includes simulating one device cycle (400 passes, 80 step ticks).
    c.bench_function("host_cycle_loopback", |b| {
        let config = HostConfig::default();
        let link = SimulatedLink::new(SimTiming::default());
        let mut driver = HostDriver::new(&config, link).expect("driver");
        let mut pins = HostPins::from_config(&config);
        let mut t = 0.0f64;
        b.iter(|| {
            t += DT;
            pins.position_cmd = [t.sin(); NUM_AXES];
            driver.read(&mut pins, 1_000_000).expect("read");
            driver.update(&mut pins);
            driver.write().expect("write");
        });
    });
}

criterion_group!(benches, bench_plan_axis, bench_host_cycle);
criterion_main!(benches);
