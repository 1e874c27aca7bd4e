//! Headset battery protocol over USB HID.
//!
//! [`locator`] picks allow-listed interfaces, [`client`] exchanges the status
//! report with them and [`status`] turns the report into a [`BatteryStatus`].

pub mod backend;
pub mod client;
pub mod locator;
pub mod status;

pub use backend::{HidApiBackend, HidBackend, HidSession};
pub use client::{BatteryClient, CancelToken};
pub use locator::{list_candidates, DeviceDescriptor, DeviceIdentity};
pub use status::{decode, BatteryStatus, Level, ProtocolVariant};
