//! Error types for probing and configuration

use crate::proxy::models::FailureKind;
use std::error::Error as StdError;
use std::io;
use std::time::Duration;

/// Error produced by a single probe round trip
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection refused: {0}")]
    ConnectionRefused(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("dns failure: {0}")]
    Dns(String),
    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    /// Coarse classification of this error
    pub fn kind(&self) -> FailureKind {
        match self {
            ProbeError::Timeout(_) => FailureKind::Timeout,
            ProbeError::ConnectionRefused(_) => FailureKind::ConnectionRefused,
            ProbeError::Protocol(_) => FailureKind::Protocol,
            ProbeError::Dns(_) => FailureKind::Dns,
            ProbeError::Other(_) => FailureKind::Other,
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        let message = error_chain(&err);

        if err.is_timeout() {
            return ProbeError::Timeout(Duration::ZERO);
        }
        if let Some(kind) = io_error_kind(&err) {
            match kind {
                io::ErrorKind::ConnectionRefused
                | io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted => {
                    return ProbeError::ConnectionRefused(message)
                }
                io::ErrorKind::TimedOut => return ProbeError::Timeout(Duration::ZERO),
                _ => {}
            }
        }
        if is_dns_message(&message) {
            return ProbeError::Dns(message);
        }
        if err.is_connect() || err.is_request() || err.is_body() || err.is_decode() {
            // Proxy handshakes (CONNECT, SOCKS) surface as connect errors
            return ProbeError::Protocol(message);
        }
        ProbeError::Other(message)
    }
}

/// Configuration errors detected before any network activity
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported protocol: {0} (use http, https, socks4 or socks5)")]
    UnsupportedProtocol(String),
    #[error("invalid target url {0}: {1}")]
    InvalidTargetUrl(String, String),
    #[error("user agent pool is empty")]
    EmptyUserAgentPool,
}

fn io_error_kind(err: &(dyn StdError + 'static)) -> Option<io::ErrorKind> {
    let mut source = Some(err);
    while let Some(e) = source {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = e.source();
    }
    None
}

fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(e) = source {
        let text = e.to_string();
        if !parts.contains(&text) {
            parts.push(text);
        }
        source = e.source();
    }
    parts.join(": ")
}

fn is_dns_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("dns error") || lower.contains("failed to lookup address")
}
