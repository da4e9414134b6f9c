//! User agent selection for probes

use crate::error::ConfigError;
use crate::Result;
use rand::seq::IndexedRandom;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Default user agent for HTTP requests
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const BUILTIN_USER_AGENTS: &[&str] = &[
    DEFAULT_USER_AGENT,
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:128.0) Gecko/20100101 Firefox/128.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36 Edg/126.0.0.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_5 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Mobile Safari/537.36",
];

/// Non-empty, cheaply clonable list of user agents
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Arc<[String]>,
}

impl UserAgentPool {
    /// Build a pool from the given agents; errors if none are given
    pub fn new(agents: Vec<String>) -> std::result::Result<Self, ConfigError> {
        if agents.is_empty() {
            return Err(ConfigError::EmptyUserAgentPool);
        }
        Ok(Self {
            agents: agents.into(),
        })
    }

    /// Load one user agent per line, skipping blank lines
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let agents = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self::new(agents)?)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Pick one agent uniformly at random
    pub fn choose(&self) -> &str {
        self.agents
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENT)
    }
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self {
            agents: BUILTIN_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// How each probe picks its User-Agent header
#[derive(Debug, Clone)]
pub enum UserAgent {
    /// Same agent for every probe
    Fixed(String),
    /// Independent random pick per probe
    Random(UserAgentPool),
}

impl UserAgent {
    /// Agent to use for the next probe
    pub fn select(&self) -> String {
        match self {
            UserAgent::Fixed(agent) => agent.clone(),
            UserAgent::Random(pool) => pool.choose().to_string(),
        }
    }
}

impl Default for UserAgent {
    fn default() -> Self {
        UserAgent::Fixed(DEFAULT_USER_AGENT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_rejected() {
        assert!(matches!(
            UserAgentPool::new(Vec::new()),
            Err(ConfigError::EmptyUserAgentPool)
        ));
    }

    #[test]
    fn test_default_pool_not_empty() {
        let pool = UserAgentPool::default();
        assert!(!pool.is_empty());
        assert!(BUILTIN_USER_AGENTS.contains(&pool.choose()));
    }

    #[test]
    fn test_random_selection_stays_in_pool() {
        let pool = UserAgentPool::new(vec!["a".to_string(), "b".to_string()]).unwrap();
        let selector = UserAgent::Random(pool);
        for _ in 0..50 {
            let agent = selector.select();
            assert!(agent == "a" || agent == "b");
        }
    }

    #[test]
    fn test_fixed_selection() {
        let selector = UserAgent::Fixed("probe/1.0".to_string());
        assert_eq!(selector.select(), "probe/1.0");
        assert_eq!(UserAgent::default().select(), DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_pool_from_file() {
        let path = std::env::temp_dir().join(format!("open-proxy-ua-{}.txt", std::process::id()));
        fs::write(&path, "agent-one\n\n  agent-two  \n").unwrap();
        let pool = UserAgentPool::from_file(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(pool.len(), 2);
    }
}
