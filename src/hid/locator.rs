use std::collections::HashSet;
use std::ffi::CString;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::backend::HidBackend;

/// HyperX vendor ID
pub const HYPERX_VENDOR_ID: u16 = 0x0951;
/// Product IDs known to answer the battery request
pub const HYPERX_PRODUCT_IDS: [u16; 2] = [0x1723, 0x16c4];

/// One allow-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceIdentity {
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}:0x{:04X}", self.vendor_id, self.product_id)
    }
}

pub fn default_allow_list() -> Vec<DeviceIdentity> {
    HYPERX_PRODUCT_IDS
        .iter()
        .map(|&pid| DeviceIdentity::new(HYPERX_VENDOR_ID, pid))
        .collect()
}

/// An attached HID interface as reported by enumeration.
///
/// A multi-interface headset shows up once per interface, all with the same
/// identity but different paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub identity: DeviceIdentity,
    pub path: CString,
    pub interface_number: i32,
    pub usage_page: u16,
    pub usage: u16,
    pub product: Option<String>,
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} iface={} ({})",
            self.identity,
            self.interface_number,
            self.path.to_string_lossy()
        )
    }
}

/// Lists attached interfaces whose VID:PID is in `allow_list`, in the order
/// the platform reports them.
///
/// Enumeration failure yields an empty list.
pub fn list_candidates<B: HidBackend + ?Sized>(
    backend: &mut B,
    allow_list: &[DeviceIdentity],
) -> Vec<DeviceDescriptor> {
    let allowed: HashSet<DeviceIdentity> = allow_list.iter().copied().collect();

    let devices = match backend.enumerate() {
        Ok(devices) => devices,
        Err(e) => {
            warn!("HID enumeration failed: {}", e);
            return Vec::new();
        }
    };

    let candidates: Vec<DeviceDescriptor> = devices
        .into_iter()
        .filter(|d| allowed.contains(&d.identity))
        .collect();

    debug!("{} candidate interface(s) matched the allow-list", candidates.len());
    candidates
}
