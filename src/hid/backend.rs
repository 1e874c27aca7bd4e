use hidapi::{HidApi, HidDevice};

use super::locator::{DeviceDescriptor, DeviceIdentity};
use crate::error::{Error, Result};

/// Host HID enumeration and open.
pub trait HidBackend {
    type Session: HidSession;

    /// Every attached HID interface, in platform order.
    fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>>;

    /// Opens one interface. The session is closed when dropped.
    fn open(&self, device: &DeviceDescriptor) -> Result<Self::Session>;
}

/// An open HID interface.
pub trait HidSession {
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Returns 0 when nothing arrived within `timeout_ms`.
    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize>;
}

/// Backend over the system HID library.
pub struct HidApiBackend {
    api: HidApi,
}

impl HidApiBackend {
    pub fn new() -> Result<Self> {
        let api = HidApi::new().map_err(Error::Enumeration)?;
        Ok(Self { api })
    }
}

impl HidBackend for HidApiBackend {
    type Session = HidApiSession;

    fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>> {
        self.api.refresh_devices().map_err(Error::Enumeration)?;

        Ok(self
            .api
            .device_list()
            .map(|info| DeviceDescriptor {
                identity: DeviceIdentity::new(info.vendor_id(), info.product_id()),
                path: info.path().to_owned(),
                interface_number: info.interface_number(),
                usage_page: info.usage_page(),
                usage: info.usage(),
                product: info.product_string().map(str::to_owned),
            })
            .collect())
    }

    fn open(&self, device: &DeviceDescriptor) -> Result<HidApiSession> {
        let hid_device = self.api.open_path(&device.path).map_err(|source| Error::Open {
            device: device.to_string(),
            source,
        })?;

        Ok(HidApiSession {
            name: device.to_string(),
            hid_device,
        })
    }
}

pub struct HidApiSession {
    name: String,
    hid_device: HidDevice,
}

impl HidApiSession {
    fn io_error(&self, source: hidapi::HidError) -> Error {
        Error::Io {
            device: self.name.clone(),
            source,
        }
    }
}

impl HidSession for HidApiSession {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.hid_device.write(data).map_err(|e| self.io_error(e))
    }

    fn read_timeout(&mut self, buf: &mut [u8], timeout_ms: i32) -> Result<usize> {
        self.hid_device
            .read_timeout(buf, timeout_ms)
            .map_err(|e| self.io_error(e))
    }
}
