//! HTTP notification transport.
//!
//! Each payload is wrapped in `{"notify":true,"message":"..","message_format":"text"}`
//! and POSTed to `<scheme>://<api host>/v2/room/<room>/notification` with a
//! bearer token. The payload is escaped again when nested in the envelope's
//! `message` string; the receiving API expects this double escaping. Only
//! `204 No Content` counts as delivered.

use std::{fmt, io, time::Duration};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use ureq::{Agent, AgentBuilder};

use super::{Ack, Transport};
use crate::encoder::escape_into;
use crate::error::DeliveryError;

/// Default notification API host.
pub const DEFAULT_API_HOST: &str = "api.hipchat.com";
/// Default connection timeout applied when establishing HTTP connections.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default timeout for a whole request.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);
/// The only status accepted as successful delivery.
pub const EXPECTED_STATUS: u16 = 204;

/// Unreserved characters per RFC 3986 stay as-is in the room path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Configuration for an [`HttpTransport`].
#[derive(Clone)]
pub struct HttpConfig {
    /// `https` in production; tests point this at a plain-HTTP listener.
    pub scheme: String,
    /// Host (and optional port) of the notification API.
    pub api_host: String,
    /// Room identifier or name the notification is posted to.
    pub room: String,
    /// Bearer token.
    pub token: String,
    pub connect_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            scheme: "https".into(),
            api_host: DEFAULT_API_HOST.into(),
            room: String::new(),
            token: String::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

impl HttpConfig {
    pub fn new(room: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            token: token.into(),
            ..Self::default()
        }
    }

    /// URL notifications are POSTed to.
    pub fn notification_url(&self) -> String {
        format!(
            "{}://{}/v2/room/{}/notification",
            self.scheme,
            self.api_host,
            utf8_percent_encode(&self.room, PATH_SEGMENT)
        )
    }
}

impl fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConfig")
            .field("scheme", &self.scheme)
            .field("api_host", &self.api_host)
            .field("room", &self.room)
            .field("token", &"<redacted>")
            .field("connect_timeout", &self.connect_timeout)
            .field("write_timeout", &self.write_timeout)
            .finish()
    }
}

/// Build the JSON notification envelope around `payload`.
pub fn envelope(payload: &str) -> String {
    let mut body = String::with_capacity(payload.len() + 64);
    body.push_str(r#"{"notify":true,"message":""#);
    escape_into(&mut body, payload);
    body.push_str(r#"","message_format":"text"}"#);
    body
}

/// Transport POSTing each payload as a room notification.
///
/// Stateless apart from immutable configuration; safe to share between
/// threads.
pub struct HttpTransport {
    config: HttpConfig,
    url: String,
    authorization: String,
    agent: Agent,
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Self {
        let agent = AgentBuilder::new()
            .timeout_connect(config.connect_timeout)
            .timeout(config.write_timeout)
            .redirects(0)
            .build();
        Self {
            url: config.notification_url(),
            authorization: format!("Bearer {}", config.token),
            config,
            agent,
        }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn post(&self, body: &str) -> Result<u16, DeliveryError> {
        let result = self
            .agent
            .post(&self.url)
            .set("Content-Type", "application/json")
            .set("Authorization", &self.authorization)
            .set("Host", &self.config.api_host)
            .send_string(body);
        match result {
            Ok(response) if response.status() == EXPECTED_STATUS => Ok(response.status()),
            Ok(response) | Err(ureq::Error::Status(_, response)) => Err(unexpected(response)),
            Err(ureq::Error::Transport(err)) => {
                Err(DeliveryError::Transport(io::Error::other(err.to_string())))
            }
        }
    }
}

fn unexpected(response: ureq::Response) -> DeliveryError {
    let status = response.status();
    let body = response.into_string().unwrap_or_default();
    DeliveryError::UnexpectedStatus { status, body }
}

impl Transport for HttpTransport {
    fn send(&self, payload: &[u8]) -> Result<Ack, DeliveryError> {
        let text = String::from_utf8_lossy(payload);
        self.post(&envelope(&text)).map(Ack::Status)
    }

    fn endpoint(&self) -> String {
        self.url.clone()
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn envelope_escapes_payload_again() {
        let payload = "{\"message\":\"hi\\n\"}\r\n";
        assert_eq!(
            envelope(payload),
            r#"{"notify":true,"message":"{\"message\":\"hi\\n\"}\r\n","message_format":"text"}"#
        );
    }

    #[rstest]
    #[case("42", "https://api.hipchat.com/v2/room/42/notification")]
    #[case("ops alerts", "https://api.hipchat.com/v2/room/ops%20alerts/notification")]
    #[case("a/b", "https://api.hipchat.com/v2/room/a%2Fb/notification")]
    fn builds_notification_url(#[case] room: &str, #[case] expected: &str) {
        assert_eq!(HttpConfig::new(room, "t").notification_url(), expected);
    }

    #[test]
    fn debug_output_redacts_token() {
        let transport = HttpTransport::new(HttpConfig::new("1", "secret-token"));
        assert!(!format!("{:?}", transport.config()).contains("secret-token"));
        assert!(!format!("{transport:?}").contains("secret-token"));
    }
}
