//! Verbose diagnostics switch and subscriber setup.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tracing target attached to every diagnostic line the component emits.
pub const LOG_TAG: &str = "ImageCompressor";

/// Shared on/off switch for component diagnostics.
#[derive(Debug, Clone, Default)]
pub struct LogSwitch(Arc<AtomicBool>);

impl LogSwitch {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn set(&self, enabled: bool) {
        self.0.store(enabled, Ordering::Relaxed);
    }

    pub fn enabled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks between debug and info
/// for this crate and the component tag.
pub fn init(verbose: bool) {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if verbose {
            format!("image_compressor=debug,{}=debug", LOG_TAG)
        } else {
            format!("image_compressor=info,{}=info", LOG_TAG)
        }
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter.as_str())
        .try_init();
}
