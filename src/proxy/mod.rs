//! Proxy module for discovering and validating proxies
//!
//! This module provides functionality for:
//! - Filtering candidate addresses by syntax
//! - Probing each candidate through its own per-call client
//! - Validating whole lists over a bounded worker pool
//! - Crawling public proxy sources for candidate lists
//! - Persisting the surviving candidates

pub mod checker;
pub mod crawler;
pub mod engine;
pub mod models;
pub mod parser;
pub mod sink;
pub mod user_agent;

pub use checker::{ProbeClient, ReqwestTransport, Transport};
pub use crawler::{CrawlResult, CrawlerConfig, Extraction, ProxyCrawler, ProxyFamily, ProxySource};
pub use engine::{CheckerConfig, ValidationEngine, ValidationRequest};
pub use models::{Candidate, FailureKind, ProbeOutcome, ProxyType};
pub use parser::AddressValidator;
pub use sink::{FileSink, ResultSink};
pub use user_agent::{UserAgent, UserAgentPool};
