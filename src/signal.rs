//! Cancellation and Ctrl+C handling.
//!
//! A [`CancelToken`] wraps a shared `AtomicBool`. The background cache sweep
//! and the image worker pool poll it between units of work, and the Ctrl+C
//! handler installed by [`install_handler`] trips it.
//!
//! ```rust,no_run
//! use bingoboard::signal::install_handler;
//!
//! let token = install_handler().expect("Failed to install signal handler");
//! let sweep_token = token.clone();
//! std::thread::spawn(move || {
//!     while !sweep_token.is_cancelled() {
//!         // one unit of work
//!         # break;
//!     }
//! });
//! ```
//!
//! When interrupted the application exits with code 130 (128 + SIGINT).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for SIGINT (Ctrl+C) interruption.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared cancellation flag.
///
/// Clones observe the same flag. `CancelToken` is `Send + Sync`.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clear the flag so the token can be reused.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// The underlying flag, for code that polls an `AtomicBool` directly.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_TOKEN: OnceLock<CancelToken> = OnceLock::new();

/// Install a Ctrl+C handler that cancels the returned token.
///
/// The process-wide handler is registered once. Later calls (for example from
/// tests running `run_app` in parallel) get the same token back, reset to
/// "not cancelled". If another component already owns the Ctrl+C hook an
/// unhooked token is returned instead, which still honours [`CancelToken::cancel`].
pub fn install_handler() -> Result<CancelToken, SignalError> {
    if let Some(token) = GLOBAL_TOKEN.get() {
        token.reset();
        return Ok(token.clone());
    }

    let token = CancelToken::new();
    let hooked = token.clone();

    match ctrlc::set_handler(move || {
        hooked.cancel();
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Cleaning up...");
        let _ = std::io::stderr().flush();
        log::info!("Cancellation requested by Ctrl+C");
    }) {
        Ok(()) => {
            let _ = GLOBAL_TOKEN.set(token.clone());
            Ok(token)
        }
        Err(ctrlc::Error::MultipleHandlers) => {
            if let Some(token) = GLOBAL_TOKEN.get() {
                token.reset();
                return Ok(token.clone());
            }
            log::debug!("Ctrl+C handler already registered, using unhooked token");
            let fallback = CancelToken::new();
            let _ = GLOBAL_TOKEN.set(fallback.clone());
            Ok(fallback)
        }
        Err(err) => Err(SignalError::InstallFailed(err)),
    }
}
