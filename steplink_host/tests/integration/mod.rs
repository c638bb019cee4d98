mod end_to_end;
mod feedback_props;
mod link_fault;
mod planner_limits;

use steplink_common::config::Validate;
use steplink_host::HostDriver;
use steplink_host::config::{AxisConfig, HostConfig};
use steplink_host::pins::HostPins;
use steplink_host::transport::{SimTiming, SimulatedLink};

/// Host driver wired to a fresh simulated board.
pub fn rig(axes: &[AxisConfig]) -> (HostDriver<SimulatedLink>, HostPins) {
    let mut config = HostConfig::default();
    for axis in axes {
        config.axis.push(*axis).expect("at most NUM_AXES axes");
    }
    config.validate().expect("valid config");
    let link = SimulatedLink::new(SimTiming::for_cycle(config.link.cycle_time_us));
    let pins = HostPins::from_config(&config);
    (HostDriver::new(&config, link).expect("driver"), pins)
}

/// One read → update → write cycle at 1 ms.
pub fn cycle(driver: &mut HostDriver<SimulatedLink>, pins: &mut HostPins) {
    driver.read(pins, 1_000_000).expect("read");
    driver.update(pins);
    driver.write().expect("write");
}
