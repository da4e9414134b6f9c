//! Proxy data models

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Proxy type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProxyType {
    #[default]
    Http,
    Https,
    Socks4,
    Socks5,
}

impl ProxyType {
    /// Scheme used when handing this proxy to the HTTP client.
    ///
    /// HTTPS proxies are spoken to in plain HTTP and tunnel with CONNECT.
    /// SOCKS5 resolves the target on the proxy side.
    fn client_scheme(&self) -> &'static str {
        match self {
            ProxyType::Http | ProxyType::Https => "http",
            ProxyType::Socks4 => "socks4",
            ProxyType::Socks5 => "socks5h",
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyType::Http => write!(f, "http"),
            ProxyType::Https => write!(f, "https"),
            ProxyType::Socks4 => write!(f, "socks4"),
            ProxyType::Socks5 => write!(f, "socks5"),
        }
    }
}

impl FromStr for ProxyType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(ProxyType::Http),
            "https" => Ok(ProxyType::Https),
            "socks4" => Ok(ProxyType::Socks4),
            "socks5" => Ok(ProxyType::Socks5),
            _ => Err(ConfigError::UnsupportedProtocol(s.to_string())),
        }
    }
}

/// One proxy endpoint under a specific protocol
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    raw_address: String,
    host: String,
    port: u16,
    proxy_type: ProxyType,
}

impl Candidate {
    /// Build a candidate from an `IP:PORT` string.
    ///
    /// Returns `None` when the string has no port separator or the port
    /// does not fit in `1..=65535`. The host is kept as written.
    pub fn parse(raw: &str, proxy_type: ProxyType) -> Option<Self> {
        let raw = raw.trim();
        let (host, port) = raw.rsplit_once(':')?;
        let port: u16 = port.parse().ok()?;
        if host.is_empty() || port == 0 {
            return None;
        }

        Some(Self {
            raw_address: raw.to_string(),
            host: host.to_string(),
            port,
            proxy_type,
        })
    }

    pub fn raw_address(&self) -> &str {
        &self.raw_address
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn proxy_type(&self) -> ProxyType {
        self.proxy_type
    }

    /// Get the proxy URL string
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.proxy_type, self.host, self.port)
    }

    /// Proxy URL as understood by the HTTP client for this protocol
    pub fn client_url(&self) -> String {
        format!(
            "{}://{}:{}",
            self.proxy_type.client_scheme(),
            self.host,
            self.port
        )
    }

    /// Get the proxy string in IP:PORT format
    pub fn to_simple_string(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// Classified reason for a failed probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    Timeout,
    ConnectionRefused,
    Protocol,
    Dns,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::ConnectionRefused => "connection refused",
            FailureKind::Protocol => "protocol error",
            FailureKind::Dns => "dns failure",
            FailureKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Result of probing a single candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub candidate: Candidate,
    pub success: bool,
    pub elapsed: Duration,
    pub failure: Option<FailureKind>,
    pub message: Option<String>,
}

impl ProbeOutcome {
    pub fn working(candidate: Candidate, elapsed: Duration) -> Self {
        Self {
            candidate,
            success: true,
            elapsed,
            failure: None,
            message: None,
        }
    }

    pub fn failed(candidate: Candidate, kind: FailureKind, message: String) -> Self {
        Self {
            candidate,
            success: false,
            elapsed: Duration::ZERO,
            failure: Some(kind),
            message: Some(message),
        }
    }

    pub fn is_working(&self) -> bool {
        self.success
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_parse() {
        let candidate = Candidate::parse("127.0.0.1:8080", ProxyType::Http).unwrap();
        assert_eq!(candidate.host(), "127.0.0.1");
        assert_eq!(candidate.port(), 8080);
        assert_eq!(candidate.proxy_type(), ProxyType::Http);
        assert_eq!(candidate.raw_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_candidate_parse_rejects_out_of_range_port() {
        assert!(Candidate::parse("1.2.3.4:99999", ProxyType::Http).is_none());
        assert!(Candidate::parse("1.2.3.4:0", ProxyType::Http).is_none());
        assert!(Candidate::parse("1.2.3.4", ProxyType::Http).is_none());
    }

    #[test]
    fn test_candidate_keeps_lax_host() {
        let candidate = Candidate::parse("999.999.999.999:80", ProxyType::Socks4).unwrap();
        assert_eq!(candidate.host(), "999.999.999.999");
    }

    #[test]
    fn test_candidate_urls() {
        let http = Candidate::parse("10.0.0.1:3128", ProxyType::Https).unwrap();
        assert_eq!(http.url(), "https://10.0.0.1:3128");
        assert_eq!(http.client_url(), "http://10.0.0.1:3128");

        let socks5 = Candidate::parse("10.0.0.1:1080", ProxyType::Socks5).unwrap();
        assert_eq!(socks5.client_url(), "socks5h://10.0.0.1:1080");

        let socks4 = Candidate::parse("10.0.0.1:1080", ProxyType::Socks4).unwrap();
        assert_eq!(socks4.client_url(), "socks4://10.0.0.1:1080");
        assert_eq!(socks4.to_simple_string(), "10.0.0.1:1080");
    }

    #[test]
    fn test_proxy_type_from_str() {
        assert_eq!("HTTP".parse::<ProxyType>().unwrap(), ProxyType::Http);
        assert_eq!("socks5".parse::<ProxyType>().unwrap(), ProxyType::Socks5);
        assert!("ftp".parse::<ProxyType>().is_err());
    }

    #[test]
    fn test_probe_outcome() {
        let candidate = Candidate::parse("127.0.0.1:8080", ProxyType::Http).unwrap();

        let outcome = ProbeOutcome::working(candidate.clone(), Duration::from_millis(1500));
        assert!(outcome.is_working());
        assert_eq!(outcome.elapsed_secs(), 1.5);
        assert!(outcome.failure.is_none());

        let outcome = ProbeOutcome::failed(
            candidate,
            FailureKind::ConnectionRefused,
            "Connection refused".to_string(),
        );
        assert!(!outcome.is_working());
        assert_eq!(outcome.failure, Some(FailureKind::ConnectionRefused));
    }
}
