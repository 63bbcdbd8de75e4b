//! Ctrl+C handling for sync runs
//!
//! A sync only looks at the flag between instruments, so a request never
//! interrupts a phase halfway through its ledger write.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Shared handle to a [`ShutdownFlag`]
pub type SharedShutdown = Arc<ShutdownFlag>;

/// Set once a stop has been requested
#[derive(Debug, Default)]
pub struct ShutdownFlag {
    requested: AtomicBool,
}

impl ShutdownFlag {
    /// Unset flag wrapped in [`Arc`]
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::default())
    }

    /// Request a stop; returns `true` only for the first request
    pub fn request(&self) -> bool {
        !self.requested.swap(true, Ordering::SeqCst)
    }

    /// Whether a stop has been requested
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Spawn a task that sets `flag` on the first Ctrl+C
pub fn listen_for_ctrl_c(flag: SharedShutdown) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() && flag.request() {
            warn!("Ctrl+C received, finishing current instrument");
        }
    });
}
