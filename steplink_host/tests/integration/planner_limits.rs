//! Planner bounds over arbitrary command streams.

use proptest::prelude::*;
use steplink_common::consts::max_velocity;
use steplink_host::planner::{AxisState, plan_axis};

const DT: f64 = 0.001;

fn scale() -> impl Strategy<Value = f64> {
    prop_oneof![-500.0f64..-0.5, 0.5f64..500.0]
}

proptest! {
    #[test]
    fn velocity_and_acceleration_stay_bounded(
        commands in prop::collection::vec(-1000.0f64..1000.0, 1..300),
        scale in scale(),
        accel in 0.0f64..1000.0,
        step_width in 1u32..8,
    ) {
        let vmax = max_velocity(step_width);
        let absolute = vmax / DT;
        let user = accel * scale.abs();
        let limit = if accel > 0.0 && user < absolute { user } else { absolute };

        let mut state = AxisState::new(0);
        let mut max_accel = accel;
        let mut prev = 0.0f64;
        for cmd in commands {
            let v = plan_axis(&mut state, cmd, scale, &mut max_accel, DT, vmax);
            prop_assert!(v.is_finite());
            prop_assert!(v.abs() <= vmax);
            prop_assert!((v - prev).abs() <= limit * DT * (1.0 + 1e-9) + 1e-9,
                "{} -> {} exceeds {}", prev, v, limit * DT);
            prev = v;
        }
        prop_assert!(max_accel * scale.abs() <= absolute * (1.0 + 1e-12));
    }

    #[test]
    fn constant_command_from_rest_ramps_monotonically(
        target in 1.0f64..50.0,
        accel in 1.0f64..100.0,
    ) {
        let vmax = max_velocity(1);
        let mut state = AxisState::new(0);
        let mut max_accel = accel;
        // Feedback never moves, so the planner keeps accelerating.
        let v0 = plan_axis(&mut state, target, 1.0, &mut max_accel, DT, vmax);
        prop_assert!((v0 - accel * DT).abs() < 1e-9);
        let mut prev = v0;
        for _ in 0..20 {
            let v = plan_axis(&mut state, target, 1.0, &mut max_accel, DT, vmax);
            prop_assert!(v >= prev - 1e-12);
            prop_assert!(v <= vmax);
            prev = v;
        }
    }
}
