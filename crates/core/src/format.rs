//! Outbound framing, inbound rendering and target address resolution.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::CoreError;

/// Query parameter carrying the shared credential.
pub const TOKEN_PARAM: &str = "token";

/// How an outbound message is framed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    #[default]
    Text,
    Json,
}

impl MessageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFormat::Text => "text",
            MessageFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for MessageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(MessageFormat::Text),
            "json" => Ok(MessageFormat::Json),
            other => Err(format!("unknown message format: {}", other)),
        }
    }
}

impl std::fmt::Display for MessageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Produce the frame to send for `text`.
///
/// In JSON mode, text that already parses as JSON goes out verbatim and
/// anything else is wrapped as `{"message": text}`.
pub fn format_outbound(text: &str, format: MessageFormat) -> Result<String, CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::BlankMessage);
    }
    match format {
        MessageFormat::Text => Ok(text.to_string()),
        MessageFormat::Json => {
            if serde_json::from_str::<serde_json::Value>(text).is_ok() {
                return Ok(text.to_string());
            }
            serde_json::to_string(&serde_json::json!({ "message": text }))
                .map_err(CoreError::JsonFormat)
        }
    }
}

/// Render an inbound frame for the log: pretty JSON when it parses, raw
/// text otherwise.
pub fn render_inbound(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| text.to_string())
}

/// Combine a user URL with the shared token.
///
/// The URL must parse and use `ws` or `wss`. An existing `token` parameter
/// is replaced; other parameters keep their order.
pub fn resolve_target(url: &str, token: Option<&str>) -> Result<Url, CoreError> {
    let mut target = Url::parse(url.trim())?;
    match target.scheme() {
        "ws" | "wss" => {}
        other => return Err(CoreError::UnsupportedScheme(other.to_string())),
    }

    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return Ok(target);
    };

    let retained: Vec<(String, String)> = target
        .query_pairs()
        .filter(|(name, _)| name != TOKEN_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    target
        .query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(TOKEN_PARAM, token);

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_goes_out_verbatim() {
        assert_eq!(format_outbound("hello", MessageFormat::Text).unwrap(), "hello");
    }

    #[test]
    fn json_wraps_plain_text() {
        assert_eq!(
            format_outbound("hello", MessageFormat::Json).unwrap(),
            r#"{"message":"hello"}"#
        );
    }

    #[test]
    fn json_passes_valid_documents_through() {
        let doc = r#"{ "op": "sub", "ch": 1 }"#;
        assert_eq!(format_outbound(doc, MessageFormat::Json).unwrap(), doc);
        assert_eq!(format_outbound("42", MessageFormat::Json).unwrap(), "42");
    }

    #[test]
    fn json_wrapping_escapes_quotes() {
        assert_eq!(
            format_outbound(r#"say "hi""#, MessageFormat::Json).unwrap(),
            r#"{"message":"say \"hi\""}"#
        );
    }

    #[test]
    fn blank_messages_are_rejected() {
        assert!(matches!(
            format_outbound("   \n\t", MessageFormat::Text),
            Err(CoreError::BlankMessage)
        ));
        assert!(matches!(
            format_outbound("", MessageFormat::Json),
            Err(CoreError::BlankMessage)
        ));
    }

    #[test]
    fn inbound_json_is_pretty_printed() {
        assert_eq!(render_inbound(r#"{"a":1}"#), "{\n  \"a\": 1\n}");
        assert_eq!(render_inbound("plain words"), "plain words");
    }

    #[test]
    fn token_is_appended_as_query_parameter() {
        let url = resolve_target("ws://localhost:8090/websocket/conn1", Some("s3cret")).unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8090/websocket/conn1?token=s3cret");
    }

    #[test]
    fn existing_token_is_replaced() {
        let url = resolve_target("wss://host/ws?room=a&token=old", Some("new")).unwrap();
        assert_eq!(url.as_str(), "wss://host/ws?room=a&token=new");
    }

    #[test]
    fn missing_token_leaves_url_untouched() {
        let url = resolve_target("ws://host/ws?room=a", None).unwrap();
        assert_eq!(url.as_str(), "ws://host/ws?room=a");
        let url = resolve_target("ws://host/ws", Some("")).unwrap();
        assert_eq!(url.as_str(), "ws://host/ws");
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        assert!(matches!(
            resolve_target("not a url", None),
            Err(CoreError::InvalidAddress(_))
        ));
        assert!(matches!(
            resolve_target("http://host/ws", None),
            Err(CoreError::UnsupportedScheme(s)) if s == "http"
        ));
    }

    #[test]
    fn format_parses_from_selector_values() {
        assert_eq!("json".parse::<MessageFormat>().unwrap(), MessageFormat::Json);
        assert_eq!("text".parse::<MessageFormat>().unwrap(), MessageFormat::Text);
        assert!("xml".parse::<MessageFormat>().is_err());
    }
}
