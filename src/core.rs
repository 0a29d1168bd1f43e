//! Process-wide serve state: shutdown flag and server handle.
//!
//! Two pieces of state:
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received)
//! - `SERVER`: HTTP server reference, unblocked on shutdown so the
//!   accept loop can drain and exit

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

/// Register the bound server so Ctrl+C can unblock its accept loop.
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

/// Install the global Ctrl+C handler.
///
/// Must be called once, before the serve loop blocks on accept. The second
/// signal aborts immediately for the case where draining hangs.
pub fn setup_shutdown_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        if is_shutdown() {
            std::process::exit(130);
        }
        SHUTDOWN.store(true, Ordering::SeqCst);
        if let Some(server) = SERVER.get() {
            server.unblock();
        }
    })?;
    Ok(())
}
