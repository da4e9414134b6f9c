//! Concurrent validation of candidate lists

use crate::error::ConfigError;
use crate::proxy::checker::{ProbeClient, ReqwestTransport, Transport};
use crate::proxy::models::{Candidate, FailureKind, ProbeOutcome, ProxyType};
use crate::proxy::parser::AddressValidator;
use crate::proxy::user_agent::{UserAgent, DEFAULT_USER_AGENT};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::AbortHandle;
use tracing::info;

/// Default timeout for proxy checks in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Default number of concurrent checks
const DEFAULT_CONCURRENCY: usize = 100;

/// Default URL to test proxies against
const DEFAULT_TEST_URL: &str = "https://google.com/";

/// Configuration for a validation run
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for each proxy check
    pub timeout: Duration,
    /// Number of concurrent checks
    pub concurrency: usize,
    /// URL to test proxies against
    pub test_url: String,
    /// User agent selection for each probe
    pub user_agent: UserAgent,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            test_url: DEFAULT_TEST_URL.to_string(),
            user_agent: UserAgent::Fixed(DEFAULT_USER_AGENT.to_string()),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_test_url(mut self, url: String) -> Self {
        self.test_url = url;
        self
    }

    pub fn with_user_agent(mut self, user_agent: UserAgent) -> Self {
        self.user_agent = user_agent;
        self
    }

    /// Build a request for `addresses` under this configuration
    pub fn request(&self, addresses: Vec<String>, proxy_type: ProxyType) -> ValidationRequest {
        ValidationRequest {
            addresses,
            proxy_type,
            target_url: self.test_url.clone(),
            timeout: self.timeout,
            user_agent: self.user_agent.clone(),
        }
    }
}

/// Everything a single validation run needs. Read-only while it runs.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    /// Raw `IP:PORT` strings in input order; duplicates are probed independently
    pub addresses: Vec<String>,
    pub proxy_type: ProxyType,
    pub target_url: String,
    pub timeout: Duration,
    pub user_agent: UserAgent,
}

impl ValidationRequest {
    /// Reject unusable targets before any network activity
    pub fn verify(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.target_url).map_err(|e| {
            ConfigError::InvalidTargetUrl(self.target_url.clone(), e.to_string())
        })?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::InvalidTargetUrl(
                self.target_url.clone(),
                format!("unsupported scheme {other}"),
            )),
        }
    }

    /// Candidates that pass address validation, in input order
    pub fn candidates(&self) -> Vec<Candidate> {
        self.addresses
            .iter()
            .filter_map(|raw| AddressValidator::parse_line(raw, self.proxy_type))
            .collect()
    }
}

/// Aborts a spawned probe when its pending future is dropped
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Fans probes out over a bounded pool and gathers their outcomes
pub struct ValidationEngine<T = ReqwestTransport> {
    client: Arc<ProbeClient<T>>,
    concurrency: usize,
}

impl ValidationEngine<ReqwestTransport> {
    /// Engine using the real network
    pub fn new(concurrency: usize) -> Self {
        Self::with_client(ProbeClient::new(), concurrency)
    }
}

impl<T: Transport + 'static> ValidationEngine<T> {
    pub fn with_client(client: ProbeClient<T>, concurrency: usize) -> Self {
        Self {
            client: Arc::new(client),
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Probe every valid candidate of `request`, yielding outcomes as they complete.
    ///
    /// At most `concurrency` probes are in flight. Each probe runs on its own
    /// task, so a panicking probe becomes a failed outcome instead of ending
    /// the run. Dropping the stream aborts the probes still in flight.
    pub fn probe_all(&self, request: &ValidationRequest) -> BoxStream<'static, ProbeOutcome> {
        let candidates = request.candidates();
        let target_url: Arc<str> = Arc::from(request.target_url.as_str());
        let timeout = request.timeout;
        let user_agent = request.user_agent.clone();
        let client = Arc::clone(&self.client);

        stream::iter(candidates)
            .map(move |candidate| {
                let client = Arc::clone(&client);
                let target_url = Arc::clone(&target_url);
                let agent = user_agent.select();
                let fallback = candidate.clone();
                async move {
                    let handle = tokio::spawn(async move {
                        client.check(&candidate, &target_url, timeout, &agent).await
                    });
                    let _abort = AbortOnDrop(handle.abort_handle());
                    match handle.await {
                        Ok(outcome) => outcome,
                        Err(e) => ProbeOutcome::failed(
                            fallback,
                            FailureKind::Other,
                            format!("probe task failed: {e}"),
                        ),
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .boxed()
    }

    /// Run a full validation and return the surviving outcomes.
    ///
    /// Every dispatched probe is awaited. Order of the result is unspecified.
    pub async fn validate(&self, request: &ValidationRequest) -> Vec<ProbeOutcome> {
        let mut outcomes = self.probe_all(request);
        let mut survivors = Vec::new();
        let mut failed = 0usize;

        while let Some(outcome) = outcomes.next().await {
            if outcome.is_working() {
                survivors.push(outcome);
            } else {
                failed += 1;
            }
        }

        info!(
            valid = survivors.len(),
            failed,
            "validation finished for {} proxies",
            request.proxy_type
        );
        survivors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checker_config_default() {
        let config = CheckerConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.test_url, DEFAULT_TEST_URL);
        assert!(matches!(config.user_agent, UserAgent::Fixed(_)));
    }

    #[test]
    fn test_checker_config_builder() {
        let config = CheckerConfig::new()
            .with_timeout(Duration::from_secs(30))
            .with_concurrency(0)
            .with_test_url("http://example.com".to_string());

        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.test_url, "http://example.com");
    }

    #[test]
    fn test_request_candidates_drop_malformed() {
        let request = CheckerConfig::new().request(
            vec![
                "1.2.3.4:80".to_string(),
                "1.2.3:80".to_string(),
                "1.2.3.4".to_string(),
                "5.6.7.8:99999".to_string(),
                "1.2.3.4:80".to_string(),
            ],
            ProxyType::Socks4,
        );
        let candidates = request.candidates();
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.raw_address() == "1.2.3.4:80"));
    }

    #[test]
    fn test_request_candidates_ignore_surrounding_whitespace() {
        let request = CheckerConfig::new().request(
            vec![" 10.0.0.1:8080\r".to_string(), "\t10.0.0.2:1080 ".to_string()],
            ProxyType::Socks5,
        );
        let addresses: Vec<_> = request
            .candidates()
            .iter()
            .map(|c| c.to_simple_string())
            .collect();
        assert_eq!(addresses, vec!["10.0.0.1:8080", "10.0.0.2:1080"]);
    }

    #[test]
    fn test_request_verify() {
        let config = CheckerConfig::new();
        assert!(config.request(Vec::new(), ProxyType::Http).verify().is_ok());

        let bad = config
            .clone()
            .with_test_url("not a url".to_string())
            .request(Vec::new(), ProxyType::Http);
        assert!(bad.verify().is_err());

        let ftp = config
            .with_test_url("ftp://example.com/".to_string())
            .request(Vec::new(), ProxyType::Http);
        assert!(ftp.verify().is_err());
    }

    #[test]
    fn test_engine_concurrency_floor() {
        let engine = ValidationEngine::new(0);
        assert_eq!(engine.concurrency(), 1);
    }
}
