//! Console configuration from environment variables.

use std::time::Duration;

use socketdeck_core::ConsoleConfig;

/// Build the console configuration.
///
/// Environment variables (desktop only):
/// - `SOCKETDECK_DEFAULT_URL`: URL for new connections, `{id}` is substituted
///   (default: "ws://localhost:8090/websocket/conn{id}")
/// - `SOCKETDECK_RECONNECT_SECS`: reconnect period in seconds (default: 5)
/// - `SOCKETDECK_MAX_LOG_BYTES`: cap per connection log (default: unbounded)
#[cfg(not(target_arch = "wasm32"))]
pub fn from_env() -> ConsoleConfig {
    from_lookup(|name| std::env::var(name).ok())
}

/// The browser has no environment; the defaults apply.
#[cfg(target_arch = "wasm32")]
pub fn from_env() -> ConsoleConfig {
    ConsoleConfig::default()
}

pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConsoleConfig {
    let mut config = ConsoleConfig::default();

    if let Some(template) = lookup("SOCKETDECK_DEFAULT_URL").filter(|v| !v.trim().is_empty()) {
        config.default_url_template = template;
    }

    if let Some(raw) = lookup("SOCKETDECK_RECONNECT_SECS") {
        match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => config.reconnect_interval = Duration::from_secs(secs),
            _ => crate::log_warn!("ignoring invalid SOCKETDECK_RECONNECT_SECS={}", raw),
        }
    }

    if let Some(raw) = lookup("SOCKETDECK_MAX_LOG_BYTES") {
        match raw.trim().parse::<usize>() {
            Ok(bytes) => config.max_log_bytes = Some(bytes),
            Err(_) => crate::log_warn!("ignoring invalid SOCKETDECK_MAX_LOG_BYTES={}", raw),
        }
    }

    config
}
