use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::backend::{HidBackend, HidSession};
use super::locator::{list_candidates, DeviceDescriptor, DeviceIdentity};
use super::status::{
    decode, format_report, BatteryStatus, ProtocolVariant, BATTERY_REQUEST, MAGNITUDE_OFFSET,
    RESPONSE_LEN,
};
use crate::config::AppConfig;
use crate::error::{Error, Result};

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(2000);
/// Budget for a whole poll across all candidates
pub const DEFAULT_CYCLE_TIMEOUT: Duration = Duration::from_millis(8000);

/// Longest single blocking read; cancellation is checked between slices
const READ_SLICE: Duration = Duration::from_millis(100);

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

enum Attempt {
    Reading(BatteryStatus),
    /// Interface stayed silent or answered with zeros
    NoData,
    /// Answered, but with a value meaning "wrong sub-device"
    Sentinel,
}

/// Queries allow-listed headsets for their battery state.
pub struct BatteryClient<B: HidBackend> {
    backend: B,
    allow_list: Vec<DeviceIdentity>,
    request: Vec<u8>,
    variant: ProtocolVariant,
    read_timeout: Duration,
    cycle_timeout: Duration,
    cancel: CancelToken,
}

impl<B: HidBackend> BatteryClient<B> {
    pub fn new(backend: B, allow_list: Vec<DeviceIdentity>, variant: ProtocolVariant) -> Self {
        Self {
            backend,
            allow_list,
            request: BATTERY_REQUEST.to_vec(),
            variant,
            read_timeout: DEFAULT_READ_TIMEOUT,
            cycle_timeout: DEFAULT_CYCLE_TIMEOUT,
            cancel: CancelToken::new(),
        }
    }

    pub fn from_config(backend: B, config: &AppConfig) -> Self {
        Self::new(backend, config.devices.clone(), config.variant)
            .with_request(config.request_packet.clone())
            .with_read_timeout(Duration::from_millis(config.read_timeout_ms))
            .with_cycle_timeout(Duration::from_millis(config.cycle_timeout_ms))
    }

    pub fn with_request(mut self, request: Vec<u8>) -> Self {
        self.request = request;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_cycle_timeout(mut self, timeout: Duration) -> Self {
        self.cycle_timeout = timeout;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Allow-listed interfaces currently attached.
    pub fn candidates(&mut self) -> Vec<DeviceDescriptor> {
        list_candidates(&mut self.backend, &self.allow_list)
    }

    /// One full poll cycle: locate, then query.
    pub fn poll(&mut self) -> BatteryStatus {
        let candidates = self.candidates();
        self.poll_once(&candidates)
    }

    /// Tries each candidate in order and returns the first valid reading.
    ///
    /// Per-candidate failures are logged and skipped. Returns the inactive
    /// status when no candidate produced a reading. Each read waits at most
    /// the read timeout and the whole scan stops at the cycle timeout.
    pub fn poll_once(&self, candidates: &[DeviceDescriptor]) -> BatteryStatus {
        let cycle_deadline = Instant::now() + self.cycle_timeout;

        for candidate in candidates {
            if self.cancel.is_cancelled() {
                debug!("Poll cancelled before {}", candidate);
                break;
            }
            if Instant::now() >= cycle_deadline {
                debug!("Poll cycle out of time before {}", candidate);
                break;
            }

            let read_deadline = (Instant::now() + self.read_timeout).min(cycle_deadline);
            match self.try_candidate(candidate, read_deadline) {
                Ok(Attempt::Reading(status)) => {
                    debug!("{} answered: {:?}", candidate, status);
                    return status;
                }
                Ok(Attempt::NoData) => {
                    debug!("{} returned no battery data", candidate);
                }
                Ok(Attempt::Sentinel) => {
                    debug!("{} answered with an unknown reading", candidate);
                }
                Err(Error::Cancelled) => {
                    debug!("Poll cancelled while reading {}", candidate);
                    break;
                }
                Err(e @ (Error::Open { .. } | Error::Timeout { .. })) => {
                    debug!("Skipping {}: {}", candidate, e);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", candidate, e);
                }
            }
        }

        BatteryStatus::inactive()
    }

    fn try_candidate(&self, candidate: &DeviceDescriptor, deadline: Instant) -> Result<Attempt> {
        let Some(report) = self.exchange(candidate, deadline)? else {
            return Ok(Attempt::NoData);
        };

        let status = decode(&report, self.variant);
        if status.is_valid() {
            Ok(Attempt::Reading(status))
        } else {
            Ok(Attempt::Sentinel)
        }
    }

    /// Single request/response exchange with one interface.
    ///
    /// Returns the raw report, or `None` when the interface gave no usable
    /// data. The session is closed before this returns.
    pub fn raw_exchange(&self, candidate: &DeviceDescriptor) -> Result<Option<[u8; RESPONSE_LEN]>> {
        self.exchange(candidate, Instant::now() + self.read_timeout)
    }

    fn exchange(
        &self,
        candidate: &DeviceDescriptor,
        deadline: Instant,
    ) -> Result<Option<[u8; RESPONSE_LEN]>> {
        let mut session = self.backend.open(candidate)?;

        let written = session.write(&self.request)?;
        if written < self.request.len() {
            return Err(Error::ShortWrite {
                device: candidate.to_string(),
                written,
                expected: self.request.len(),
            });
        }

        let mut buffer = [0u8; RESPONSE_LEN];
        let bytes_read = self.read_response(&mut session, candidate, &mut buffer, deadline)?;
        debug!(
            "Response from {}: {}",
            candidate,
            format_report(&buffer[..bytes_read])
        );

        if bytes_read <= MAGNITUDE_OFFSET || buffer.iter().all(|&b| b == 0) {
            return Ok(None);
        }
        Ok(Some(buffer))
    }

    fn read_response(
        &self,
        session: &mut B::Session,
        candidate: &DeviceDescriptor,
        buffer: &mut [u8],
        deadline: Instant,
    ) -> Result<usize> {
        let started = Instant::now();

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout {
                    device: candidate.to_string(),
                    timeout_ms: started.elapsed().as_millis() as u64,
                });
            }

            let slice = remaining.min(READ_SLICE).as_millis().max(1) as i32;
            let bytes_read = session.read_timeout(buffer, slice)?;
            if bytes_read > 0 {
                return Ok(bytes_read);
            }
        }
    }
}
