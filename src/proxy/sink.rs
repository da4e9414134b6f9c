//! Persistence of surviving candidates

use crate::proxy::models::ProbeOutcome;
use crate::Result;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Receives the surviving set of a validation run
pub trait ResultSink {
    fn persist(&self, survivors: &[ProbeOutcome]) -> Result<()>;
}

/// Writes survivors as a `host:port` list, one per line
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    input_order: Vec<String>,
}

impl FileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            input_order: Vec::new(),
        }
    }

    /// Restore this input order when writing; unknown entries go last
    pub fn with_input_order(mut self, addresses: &[String]) -> Self {
        self.input_order = addresses.to_vec();
        self
    }

    fn ordered_lines(&self, survivors: &[ProbeOutcome]) -> Vec<String> {
        let mut rank: HashMap<&str, usize> = HashMap::new();
        for (index, address) in self.input_order.iter().enumerate() {
            rank.entry(address.as_str()).or_insert(index);
        }

        let mut lines: Vec<String> = survivors
            .iter()
            .map(|outcome| outcome.candidate.to_simple_string())
            .collect();
        lines.sort_by_key(|line| rank.get(line.as_str()).copied().unwrap_or(usize::MAX));
        lines
    }
}

impl ResultSink for FileSink {
    fn persist(&self, survivors: &[ProbeOutcome]) -> Result<()> {
        let lines = self.ordered_lines(survivors);
        write_list(&self.path, &lines)?;
        debug!("Saved {} proxies to {:?}", lines.len(), self.path);
        Ok(())
    }
}

/// Replace `path` with `lines`, one per line.
///
/// The content goes to a sibling temp file first and is renamed over the
/// target, so a failed write leaves the old file intact.
pub fn write_list<P: AsRef<Path>>(path: P, lines: &[String]) -> Result<()> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "proxies".to_string());
    let tmp = path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));

    {
        let mut file = fs::File::create(&tmp)?;
        for line in lines {
            writeln!(file, "{line}")?;
        }
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&tmp, path) {
        fs::remove_file(&tmp).ok();
        return Err(e.into());
    }
    Ok(())
}
