//! Headset battery diagnostic tool
//!
//! Lists every allow-listed HID interface, sends the battery request to each
//! one and prints the raw answer next to both decoding tables. Useful for
//! finding out which interface answers and which protocol variant a headset
//! speaks.
//!
//! Usage: cargo run --bin diagnostic

use headset_battery::config::{self, AppConfig};
use headset_battery::hid::status::{decode_raw_b, format_report, percentage_a};
use headset_battery::hid::status::{CHARGE_STATE_OFFSET, MAGNITUDE_OFFSET};
use headset_battery::hid::{decode, BatteryClient, HidApiBackend, HidBackend, ProtocolVariant};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    headset_battery::init_tracing();

    println!("========================================");
    println!("HEADSET BATTERY DIAGNOSTIC TOOL");
    println!("========================================\n");

    let config = config::load_config().unwrap_or_else(|e| {
        eprintln!("Could not load config ({}), using defaults", e);
        AppConfig::default()
    });

    println!("[STEP 1] Scanning HID devices...");
    let mut backend = HidApiBackend::new()?;
    let all = backend.enumerate()?;
    println!("  {} HID interface(s) attached", all.len());

    let vendors: Vec<u16> = config.devices.iter().map(|d| d.vendor_id).collect();
    for device in all.iter().filter(|d| vendors.contains(&d.identity.vendor_id)) {
        let listed = config.devices.contains(&device.identity);
        println!(
            "  {} {}  product={:?} usage={:04X}:{:04X} iface={}",
            if listed { "✓" } else { "✗" },
            device.identity,
            device.product,
            device.usage_page,
            device.usage,
            device.interface_number
        );
    }

    let mut client = BatteryClient::from_config(backend, &config);
    let candidates = client.candidates();

    println!("\n[STEP 2] Probing {} candidate(s)...", candidates.len());
    if candidates.is_empty() {
        println!("  ✗ No allow-listed headset found");
        return Ok(());
    }

    for candidate in &candidates {
        println!("\n  {}", candidate);
        match client.raw_exchange(candidate) {
            Ok(Some(report)) => {
                let state = report[CHARGE_STATE_OFFSET];
                let value = report[MAGNITUDE_OFFSET];
                println!("    response:  {}", format_report(&report));
                println!(
                    "    variant A: {}% ({:?})",
                    percentage_a(state, value),
                    decode(&report, ProtocolVariant::A)
                );
                println!(
                    "    variant B: raw {} ({:?})",
                    decode_raw_b(state, value),
                    decode(&report, ProtocolVariant::B)
                );
            }
            Ok(None) => println!("    no battery data"),
            Err(e) => println!("    ✗ {}", e),
        }
    }

    println!("\n[STEP 3] Full poll with configured variant {:?}...", config.variant);
    let status = client.poll_once(&candidates);
    println!("  {}", status.to_string().replace('\n', " | "));

    Ok(())
}
