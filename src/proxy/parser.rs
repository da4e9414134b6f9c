//! Address validation and proxy list parsing

use crate::proxy::models::{Candidate, ProxyType};
use crate::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Anchored `IPv4:PORT` pattern. Octets and port are not range checked.
static ADDRESS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{1,3}(?:\.\d{1,3}){3}:\d{1,5}$").expect("Invalid address regex")
});

/// Syntactic filter for candidate addresses
pub struct AddressValidator;

impl AddressValidator {
    /// Check whether `raw` has the exact form `d.d.d.d:p`.
    ///
    /// Each octet is 1-3 digits and the port 1-5 digits; values like
    /// `999.999.999.999:99999` are accepted.
    pub fn is_valid(raw: &str) -> bool {
        ADDRESS_REGEX.is_match(raw)
    }

    /// Parse a single list line into a candidate.
    ///
    /// Surrounding whitespace is ignored. Lines that pass the syntax check
    /// but carry a port outside `1..=65535` are dropped as well.
    pub fn parse_line(line: &str, proxy_type: ProxyType) -> Option<Candidate> {
        let line = line.trim();
        if !Self::is_valid(line) {
            return None;
        }
        let candidate = Candidate::parse(line, proxy_type);
        if candidate.is_none() {
            debug!("Skipping {}: port out of range", line);
        }
        candidate
    }
}

/// Read a line-oriented list, trimming lines and skipping blanks
pub fn read_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
