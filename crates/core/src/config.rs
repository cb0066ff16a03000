//! Tunables of the connection console.

use std::time::Duration;

use crate::record::ConnectionId;

/// Placeholder replaced by the connection identifier in
/// [`ConsoleConfig::default_url_template`].
pub const ID_PLACEHOLDER: &str = "{id}";

/// Console configuration.
///
/// The defaults reproduce the behavior operators are used to: a 5 second
/// reconnect cadence, a short grace delay before resuming connections on
/// startup, and ten remembered messages per connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Period of the reconnect timer started after an unexpected close.
    pub reconnect_interval: Duration,
    /// Delay before resuming a connection that was live at the last shutdown.
    pub resume_delay: Duration,
    /// Maximum number of distinct messages kept per connection.
    pub history_capacity: usize,
    /// URL given to new connections. `{id}` is replaced by the identifier.
    pub default_url_template: String,
    /// Optional cap on a connection log, in bytes. `None` keeps logs unbounded.
    pub max_log_bytes: Option<usize>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            reconnect_interval: Duration::from_secs(5),
            resume_delay: Duration::from_millis(500),
            history_capacity: 10,
            default_url_template: "ws://localhost:8090/websocket/conn{id}".to_string(),
            max_log_bytes: None,
        }
    }
}

impl ConsoleConfig {
    /// Default URL for a freshly added connection.
    pub fn default_url(&self, id: ConnectionId) -> String {
        self.default_url_template.replace(ID_PLACEHOLDER, &id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url_embeds_identifier() {
        let config = ConsoleConfig::default();
        assert_eq!(
            config.default_url(ConnectionId(7)),
            "ws://localhost:8090/websocket/conn7"
        );
    }

    #[test]
    fn template_without_placeholder_is_used_verbatim() {
        let config = ConsoleConfig {
            default_url_template: "wss://echo.example.org".to_string(),
            ..ConsoleConfig::default()
        };
        assert_eq!(config.default_url(ConnectionId(2)), "wss://echo.example.org");
    }
}
