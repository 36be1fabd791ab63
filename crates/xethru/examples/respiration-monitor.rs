//! Configure a module for respiration and print records until it goes quiet.
//!
//! Run with:
//!   cargo run --example respiration-monitor -- /dev/ttyACM0

use std::time::Duration;

use xethru::module::{LedMode, Module, ModuleConfig, PollExit, Respiration};
use xethru::transport::SerialDevice;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port = std::env::args()
        .nth(1)
        .ok_or("usage: respiration-monitor <PORT>")?;

    let config = ModuleConfig::default()
        .with_led_mode(LedMode::Full)
        .with_detection_zone(0.5, 2.5)
        .with_idle_timeout(Duration::from_secs(2));
    let mut module = Module::open(&SerialDevice::new(port), config)?;
    module.configure()?;
    eprintln!("Module configured, waiting for telemetry");

    let (session, _writer) = module.start_polling::<Respiration>()?;
    for record in session.iter() {
        println!(
            "#{:<6} {:<13} rpm={:<3} distance={:.2}m quality={:.1}",
            record.counter, record.state, record.rpm, record.distance, record.signal_quality
        );
    }

    match session.join()? {
        PollExit::TimedOut => eprintln!("No telemetry for 2s, stopping"),
        PollExit::TransportFailed(err) => eprintln!("Transport failed: {err}"),
        other => eprintln!("Session ended: {other:?}"),
    }
    Ok(())
}
