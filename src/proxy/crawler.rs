//! Proxy crawler module for fetching candidate lists from public sources
//!
//! Each [`ProxySource`] is one adapter: a URL plus an extraction strategy.
//! Adapters run concurrently and a failing adapter never aborts its siblings.

use crate::error::ConfigError;
use crate::proxy::models::ProxyType;
use crate::proxy::user_agent::DEFAULT_USER_AGENT;
use crate::Result;
use futures::future;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for HTTP requests in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Regex pattern to match IP:PORT patterns in text
static IP_PORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{1,3}(?:\.\d{1,3}){3}:\d{1,5}").expect("Invalid IP:PORT regex")
});

const TABLE_ROW_SELECTOR: &str = "table.table.table-striped.table-bordered tr";

/// Protocol family a source serves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyFamily {
    Http,
    Https,
    Socks4,
    Socks5,
    /// Mixed SOCKS list without a version
    Socks,
}

impl ProxyFamily {
    /// Families to include when the user asks for `self`.
    ///
    /// `socks` also pulls in the versioned SOCKS sources.
    pub fn expand(self) -> Vec<ProxyFamily> {
        match self {
            ProxyFamily::Socks => vec![ProxyFamily::Socks, ProxyFamily::Socks4, ProxyFamily::Socks5],
            other => vec![other],
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ProxyFamily::Http => "http",
            ProxyFamily::Https => "https",
            ProxyFamily::Socks4 => "socks4",
            ProxyFamily::Socks5 => "socks5",
            ProxyFamily::Socks => "socks",
        }
    }
}

impl fmt::Display for ProxyFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProxyFamily {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "socks" => Ok(ProxyFamily::Socks),
            other => other.parse::<ProxyType>().map(ProxyFamily::from),
        }
    }
}

impl From<ProxyType> for ProxyFamily {
    fn from(proxy_type: ProxyType) -> Self {
        match proxy_type {
            ProxyType::Http => ProxyFamily::Http,
            ProxyType::Https => ProxyFamily::Https,
            ProxyType::Socks4 => ProxyFamily::Socks4,
            ProxyType::Socks5 => ProxyFamily::Socks5,
        }
    }
}

/// How addresses are pulled out of a fetched page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// Scan the whole body for `IP:PORT`
    Regex,
    /// Join the first two cells of each row of a bordered table, then scan
    Table,
}

impl Extraction {
    /// Extract `IP:PORT` strings from a response body
    pub fn extract(&self, body: &str) -> Vec<String> {
        match self {
            Extraction::Regex => scan_addresses(body),
            Extraction::Table => scan_addresses(&table_rows(body).join("\n")),
        }
    }
}

/// Find every `IP:PORT` substring in `text`, in order of appearance
pub fn scan_addresses(text: &str) -> Vec<String> {
    IP_PORT_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn table_rows(html: &str) -> Vec<String> {
    let (Ok(row_selector), Ok(cell_selector)) =
        (Selector::parse(TABLE_ROW_SELECTOR), Selector::parse("td"))
    else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for row in document.select(&row_selector) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .take(2)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();
        if let [host, port] = cells.as_slice() {
            let entry = format!("{host}:{port}");
            if seen.insert(entry.clone()) {
                rows.push(entry);
            }
        }
    }

    rows
}

/// Proxy source representing a website that provides proxy lists
#[derive(Debug, Clone)]
pub struct ProxySource {
    /// Name of the proxy source
    pub name: String,
    /// URL to fetch proxies from
    pub url: String,
    /// Family of proxies served
    pub family: ProxyFamily,
    /// Extraction strategy for the response body
    pub extraction: Extraction,
}

impl ProxySource {
    pub fn new(name: &str, url: &str, family: ProxyFamily, extraction: Extraction) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            family,
            extraction,
        }
    }

    /// Plain-text source scanned with the address regex
    pub fn text(name: &str, url: &str, family: ProxyFamily) -> Self {
        Self::new(name, url, family, Extraction::Regex)
    }

    /// HTML page with a bordered proxy table
    pub fn table(name: &str, url: &str, family: ProxyFamily) -> Self {
        Self::new(name, url, family, Extraction::Table)
    }

    fn spys_me(family: ProxyFamily) -> Self {
        let mode = if family == ProxyFamily::Http { "proxy" } else { "socks" };
        Self::text("spys.me", &format!("https://spys.me/{mode}.txt"), family)
    }

    fn proxyscrape(family: ProxyFamily) -> Self {
        Self::text(
            "proxyscrape",
            &format!(
                "https://api.proxyscrape.com/?request=getproxies&proxytype={family}&timeout=1000&country=All"
            ),
            family,
        )
    }

    fn geonode(family: ProxyFamily) -> Self {
        Self::text(
            "geonode",
            "https://proxylist.geonode.com/api/proxy-list?limit=500&page=1&sort_by=lastChecked&sort_type=desc",
            family,
        )
    }

    fn proxy_list_download(family: ProxyFamily, anon: &str) -> Self {
        Self::text(
            "proxy-list.download",
            &format!("https://www.proxy-list.download/api/v1/get?type={family}&anon={anon}"),
            family,
        )
    }
}

/// Result of crawling a single source
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// The source that was crawled
    pub source: String,
    /// Addresses extracted from the source
    pub addresses: Vec<String>,
    /// Error message if crawling failed
    pub error: Option<String>,
}

impl CrawlResult {
    /// Create a successful crawl result
    pub fn success(source: String, addresses: Vec<String>) -> Self {
        Self {
            source,
            addresses,
            error: None,
        }
    }

    /// Create a failed crawl result
    pub fn failure(source: String, error: String) -> Self {
        Self {
            source,
            addresses: Vec::new(),
            error: Some(error),
        }
    }

    /// Check if the crawl was successful
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Configuration for proxy crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Timeout for HTTP requests
    pub timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl CrawlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Fetches candidate strings from a set of sources
pub struct ProxyCrawler {
    client: Client,
    sources: Vec<ProxySource>,
}

impl ProxyCrawler {
    /// Create a new proxy crawler over the built-in sources
    pub fn new() -> Result<Self> {
        Self::with_config(CrawlerConfig::default())
    }

    /// Create a new proxy crawler with custom configuration
    pub fn with_config(config: CrawlerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            sources: Self::get_common_sources(),
        })
    }

    /// Replace the configured sources
    pub fn with_sources(mut self, sources: Vec<ProxySource>) -> Self {
        self.sources = sources;
        self
    }

    /// Sources serving `family`, expanded as in [`ProxyFamily::expand`]
    pub fn sources_for(&self, family: ProxyFamily) -> Result<Vec<&ProxySource>> {
        let families = family.expand();
        let selected: Vec<_> = self
            .sources
            .iter()
            .filter(|source| families.contains(&source.family))
            .collect();

        if selected.is_empty() {
            return Err(ConfigError::UnsupportedProtocol(family.to_string()).into());
        }
        Ok(selected)
    }

    /// Fetch one source and extract its addresses
    pub async fn crawl_source(&self, source: &ProxySource) -> Result<Vec<String>> {
        let response = self.client.get(&source.url).send().await?.error_for_status()?;
        let body = response.text().await?;
        Ok(source.extraction.extract(&body))
    }

    /// Crawl the given sources concurrently, keeping each one's result
    pub async fn crawl_sources_with_results(&self, sources: &[&ProxySource]) -> Vec<CrawlResult> {
        let tasks = sources.iter().map(|source| async move {
            match self.crawl_source(source).await {
                Ok(addresses) => {
                    debug!("Found {} proxies from {}", addresses.len(), source.url);
                    CrawlResult::success(source.name.clone(), addresses)
                }
                Err(e) => {
                    warn!("Error crawling {}: {}", source.url, e);
                    CrawlResult::failure(source.name.clone(), e.to_string())
                }
            }
        });

        future::join_all(tasks).await
    }

    /// Collect raw candidate strings for `family` from every matching source.
    ///
    /// Fails only when no source serves the family; individual source
    /// failures are logged and skipped.
    pub async fn fetch_candidate_strings(&self, family: ProxyFamily) -> Result<Vec<String>> {
        let sources = self.sources_for(family)?;
        let results = self.crawl_sources_with_results(&sources).await;

        Ok(results
            .into_iter()
            .filter(CrawlResult::is_success)
            .flat_map(|result| result.addresses)
            .collect())
    }

    /// Get a list of common free proxy sources
    pub fn get_common_sources() -> Vec<ProxySource> {
        vec![
            ProxySource::spys_me(ProxyFamily::Http),
            ProxySource::spys_me(ProxyFamily::Socks),
            ProxySource::proxyscrape(ProxyFamily::Http),
            ProxySource::proxyscrape(ProxyFamily::Socks4),
            ProxySource::proxyscrape(ProxyFamily::Socks5),
            ProxySource::geonode(ProxyFamily::Socks),
            ProxySource::proxy_list_download(ProxyFamily::Https, "elite"),
            ProxySource::proxy_list_download(ProxyFamily::Http, "elite"),
            ProxySource::proxy_list_download(ProxyFamily::Http, "transparent"),
            ProxySource::proxy_list_download(ProxyFamily::Http, "anonymous"),
            ProxySource::table("sslproxies", "https://www.sslproxies.org/", ProxyFamily::Https),
            ProxySource::table(
                "free-proxy-list.net",
                "https://free-proxy-list.net/",
                ProxyFamily::Http,
            ),
        ]
    }
}
