//! Global read-only config handle.
//!
//! Uses `arc-swap` for lock-free reads from concurrent request handlers.
//! The config is stored once during process initialization and never
//! mutated afterwards; a future hot-reload would swap the whole `Arc`.

use crate::config::ServiceConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
static CONFIG: LazyLock<ArcSwap<ServiceConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(ServiceConfig::default()));

#[inline]
pub fn cfg() -> Arc<ServiceConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: ServiceConfig) -> Arc<ServiceConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_read() {
        let mut config = ServiceConfig::default();
        config.serve.port = 9999;
        init_config(config);
        assert_eq!(cfg().serve.port, 9999);
    }
}
