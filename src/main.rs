use std::time::Duration;

use headset_battery::config;
use headset_battery::hid::{BatteryClient, HidApiBackend};
use headset_battery::monitor::Monitor;
use headset_battery::sink::{Deduplicated, LogSink};
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    headset_battery::init_tracing();
    info!("headset-battery - wireless headset battery monitor");

    let config = config::load_config()?;
    info!(
        "Watching {} device id(s), protocol variant {:?}",
        config.devices.len(),
        config.variant
    );

    let backend = match HidApiBackend::new() {
        Ok(backend) => backend,
        Err(e) => {
            error!("Could not initialise HID: {}", e);
            return Err(e.into());
        }
    };

    let client = BatteryClient::from_config(backend, &config);
    let monitor = Monitor::new(
        client,
        Deduplicated::new(LogSink),
        Duration::from_secs(config.poll_interval),
    );

    monitor
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Could not listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}
