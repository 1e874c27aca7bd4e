//! Where poll results go.
//!
//! The monitor hands every cycle's [`BatteryStatus`] to a [`StatusSink`]. A
//! tray icon, a status bar module or a log line all fit behind it.

use tracing::info;

use crate::hid::status::BatteryStatus;

pub trait StatusSink {
    fn update(&mut self, status: &BatteryStatus);
}

/// Writes each status as an `info` event.
#[derive(Debug, Default)]
pub struct LogSink;

impl StatusSink for LogSink {
    fn update(&mut self, status: &BatteryStatus) {
        info!(
            present = status.present,
            charging = status.charging,
            percentage = ?status.percentage(),
            "{}",
            status.to_string().replace('\n', " | ")
        );
    }
}

/// Forwards a status only when its rendered text differs from the last one.
pub struct Deduplicated<S> {
    inner: S,
    last_text: Option<String>,
}

impl<S: StatusSink> Deduplicated<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            last_text: None,
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: StatusSink> StatusSink for Deduplicated<S> {
    fn update(&mut self, status: &BatteryStatus) {
        let text = status.to_string();
        if self.last_text.as_deref() == Some(text.as_str()) {
            return;
        }
        self.inner.update(status);
        self.last_text = Some(text);
    }
}
