pub mod config;
pub mod error;
pub mod hid;
pub mod monitor;
pub mod sink;

pub use error::{Error, Result};

/// Installs the fmt subscriber, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
