//! Counter unwrapping over long random walks.

use proptest::prelude::*;
use steplink_host::feedback::PositionAccumulator;

proptest! {
    #[test]
    fn accumulator_tracks_true_position(
        start in any::<i32>(),
        steps in prop::collection::vec(-(i32::MAX as i64)..=(i32::MAX as i64), 1..200),
    ) {
        let mut acc = PositionAccumulator::new(0);
        let mut truth = i64::from(start);
        acc.update(start).unwrap();
        prop_assert_eq!(acc.counts(), truth);

        for step in steps {
            truth += step;
            acc.update(truth as i32).unwrap();
            prop_assert_eq!(acc.counts(), truth);
        }
    }
}

#[test]
fn wrap_across_sign_boundary() {
    let mut acc = PositionAccumulator::new(3);
    acc.update(0x7FFF_FFFE).unwrap();
    acc.update(0x8000_0005u32 as i32).unwrap();
    assert_eq!(acc.counts(), 0x8000_0005);
}
