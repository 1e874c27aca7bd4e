#![allow(dead_code)]

use std::ffi::CString;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use headset_battery::hid::{DeviceDescriptor, DeviceIdentity, HidBackend, HidSession};
use headset_battery::{Error, Result};

#[derive(Clone, Debug)]
pub enum Behavior {
    Report(Vec<u8>),
    /// Never answers; each read waits out its slice
    Silent,
    FailOpen,
    FailWrite,
    ShortWrite,
    FailRead,
}

/// Calls seen by the mock, by interface number.
#[derive(Default, Debug)]
pub struct Calls {
    pub opened: Vec<i32>,
    pub written: Vec<i32>,
    pub read: Vec<i32>,
    pub closed: Vec<i32>,
}

pub struct MockBackend {
    devices: Vec<(DeviceDescriptor, Behavior)>,
    enumerate_fails: bool,
    pub calls: Arc<Mutex<Calls>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            enumerate_fails: false,
            calls: Arc::new(Mutex::new(Calls::default())),
        }
    }

    pub fn failing() -> Self {
        Self {
            enumerate_fails: true,
            ..Self::new()
        }
    }

    pub fn with_device(mut self, vid: u16, pid: u16, iface: i32, behavior: Behavior) -> Self {
        self.devices.push((descriptor(vid, pid, iface), behavior));
        self
    }

    pub fn calls(&self) -> Arc<Mutex<Calls>> {
        Arc::clone(&self.calls)
    }
}

pub fn descriptor(vid: u16, pid: u16, iface: i32) -> DeviceDescriptor {
    DeviceDescriptor {
        identity: DeviceIdentity::new(vid, pid),
        path: CString::new(format!("mock/{:04x}/{:04x}/{}", vid, pid, iface)).unwrap(),
        interface_number: iface,
        usage_page: 0xFF00,
        usage: 0x0001,
        product: Some("Mock Headset".to_string()),
    }
}

pub fn hid_error(message: &str) -> hidapi::HidError {
    hidapi::HidError::HidApiError {
        message: message.to_string(),
    }
}

/// Report with the charge state in byte 3 and magnitude in byte 4.
pub fn report(state: u8, value: u8) -> Vec<u8> {
    vec![0x21, 0, 0, state, value, 0, 0, 0]
}

pub struct MockSession {
    iface: i32,
    behavior: Behavior,
    calls: Arc<Mutex<Calls>>,
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.calls.lock().unwrap().closed.push(self.iface);
    }
}

impl HidSession for MockSession {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.calls.lock().unwrap().written.push(self.iface);
        match self.behavior {
            Behavior::FailWrite => Err(Error::Io {
                device: self.iface.to_string(),
                source: hid_error("write failed"),
            }),
            Behavior::ShortWrite => Ok(data.len() / 2),
            _ => Ok(data.len()),
        }
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize> {
        self.calls.lock().unwrap().read.push(self.iface);
        match &self.behavior {
            Behavior::Report(bytes) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Behavior::FailRead => Err(Error::Io {
                device: self.iface.to_string(),
                source: hid_error("read failed"),
            }),
            _ => {
                std::thread::sleep(Duration::from_millis(timeout_ms.max(0) as u64));
                Ok(0)
            }
        }
    }
}

impl HidBackend for MockBackend {
    type Session = MockSession;

    fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>> {
        if self.enumerate_fails {
            return Err(Error::Enumeration(hid_error("HID subsystem unavailable")));
        }
        Ok(self.devices.iter().map(|(d, _)| d.clone()).collect())
    }

    fn open(&self, device: &DeviceDescriptor) -> Result<MockSession> {
        let iface = device.interface_number;
        self.calls.lock().unwrap().opened.push(iface);

        let behavior = self
            .devices
            .iter()
            .find(|(d, _)| d == device)
            .map(|(_, b)| b.clone())
            .unwrap_or(Behavior::FailOpen);

        if let Behavior::FailOpen = behavior {
            return Err(Error::Open {
                device: device.to_string(),
                source: hid_error("access denied"),
            });
        }

        Ok(MockSession {
            iface,
            behavior,
            calls: Arc::clone(&self.calls),
        })
    }
}
