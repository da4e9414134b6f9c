//! Single-candidate probing

use crate::error::ProbeError;
use crate::proxy::models::{Candidate, ProbeOutcome};
use async_trait::async_trait;
use reqwest::{header, Client, Proxy as ReqwestProxy};
use std::time::{Duration, Instant};
use tracing::debug;

/// Performs one request to a target through one candidate.
///
/// Implementations must route through `candidate` only, never through
/// state shared with other calls.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn round_trip(
        &self,
        candidate: &Candidate,
        target_url: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<(), ProbeError>;
}

/// Transport that builds a dedicated `reqwest::Client` per call, bound to
/// the candidate as its only proxy.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    pub fn new() -> Self {
        Self
    }

    /// Create a reqwest client with the proxy
    fn create_client(
        &self,
        candidate: &Candidate,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<Client, ProbeError> {
        let proxy_url = candidate.client_url();
        let proxy = ReqwestProxy::all(&proxy_url)
            .map_err(|e| ProbeError::Other(format!("invalid proxy url {proxy_url}: {e}")))?;

        Client::builder()
            .proxy(proxy)
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(user_agent)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ProbeError::Other(e.to_string()))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn round_trip(
        &self,
        candidate: &Candidate,
        target_url: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> Result<(), ProbeError> {
        let client = self.create_client(candidate, timeout, user_agent)?;
        let response = client
            .get(target_url)
            .header(header::USER_AGENT, user_agent)
            .send()
            .await?;

        // Any completed exchange counts, whatever the status
        debug!(proxy = %candidate, status = %response.status(), "proxy answered");
        Ok(())
    }
}

/// Runs one bounded probe per call on top of a [`Transport`]
#[derive(Debug, Clone)]
pub struct ProbeClient<T = ReqwestTransport> {
    transport: T,
}

impl ProbeClient<ReqwestTransport> {
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }
}

impl Default for ProbeClient<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> ProbeClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Probe a single candidate.
    ///
    /// Never fails: every error is folded into a failed [`ProbeOutcome`].
    /// A single attempt is made.
    pub async fn check(
        &self,
        candidate: &Candidate,
        target_url: &str,
        timeout: Duration,
        user_agent: &str,
    ) -> ProbeOutcome {
        let start = Instant::now();

        let result = match tokio::time::timeout(
            timeout,
            self.transport
                .round_trip(candidate, target_url, timeout, user_agent),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(timeout)),
        };

        match result {
            Ok(()) => {
                let elapsed = start.elapsed();
                debug!(
                    "Proxy {} is valid, time taken: {:.3}s",
                    candidate.to_simple_string(),
                    elapsed.as_secs_f64()
                );
                ProbeOutcome::working(candidate.clone(), elapsed)
            }
            Err(err) => {
                let err = match err {
                    ProbeError::Timeout(_) => ProbeError::Timeout(timeout),
                    other => other,
                };
                debug!(
                    "Proxy {} is not valid, error: {}",
                    candidate.to_simple_string(),
                    err
                );
                ProbeOutcome::failed(candidate.clone(), err.kind(), err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::models::{FailureKind, ProxyType};

    struct FixedTransport(Result<(), ProbeError>);

    #[async_trait]
    impl Transport for FixedTransport {
        async fn round_trip(
            &self,
            _candidate: &Candidate,
            _target_url: &str,
            _timeout: Duration,
            _user_agent: &str,
        ) -> Result<(), ProbeError> {
            self.0.clone()
        }
    }

    struct StallingTransport;

    #[async_trait]
    impl Transport for StallingTransport {
        async fn round_trip(
            &self,
            _candidate: &Candidate,
            _target_url: &str,
            _timeout: Duration,
            _user_agent: &str,
        ) -> Result<(), ProbeError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    fn candidate() -> Candidate {
        Candidate::parse("10.1.2.3:8080", ProxyType::Http).unwrap()
    }

    #[tokio::test]
    async fn test_check_success() {
        let client = ProbeClient::with_transport(FixedTransport(Ok(())));
        let outcome = client
            .check(&candidate(), "http://example.com/", Duration::from_secs(1), "ua")
            .await;
        assert!(outcome.is_working());
        assert!(outcome.elapsed_secs() >= 0.0);
        assert!(outcome.failure.is_none());
    }

    #[tokio::test]
    async fn test_check_failure_is_classified() {
        let client = ProbeClient::with_transport(FixedTransport(Err(
            ProbeError::ConnectionRefused("refused".into()),
        )));
        let outcome = client
            .check(&candidate(), "http://example.com/", Duration::from_secs(1), "ua")
            .await;
        assert!(!outcome.is_working());
        assert_eq!(outcome.failure, Some(FailureKind::ConnectionRefused));
        assert_eq!(outcome.elapsed, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_check_enforces_deadline() {
        let client = ProbeClient::with_transport(StallingTransport);
        let start = Instant::now();
        let outcome = client
            .check(&candidate(), "http://example.com/", Duration::from_millis(100), "ua")
            .await;
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(outcome.failure, Some(FailureKind::Timeout));
    }

    #[test]
    fn test_create_client_for_each_protocol() {
        let transport = ReqwestTransport::new();
        for proxy_type in [
            ProxyType::Http,
            ProxyType::Https,
            ProxyType::Socks4,
            ProxyType::Socks5,
        ] {
            let candidate = Candidate::parse("127.0.0.1:1080", proxy_type).unwrap();
            assert!(transport
                .create_client(&candidate, Duration::from_secs(1), "ua")
                .is_ok());
        }
    }
}
