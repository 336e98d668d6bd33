//! Shared test helpers

use std::sync::{Mutex, MutexGuard};

static BACKEND_RNG: Mutex<()> = Mutex::new(());

/// Serialises tests that seed or draw from the global backend RNG
pub(crate) fn rng_guard() -> MutexGuard<'static, ()> {
    BACKEND_RNG.lock().unwrap_or_else(|e| e.into_inner())
}
