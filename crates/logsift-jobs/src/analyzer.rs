//! Two-pass streaming log analyzer.
//!
//! Pass 1 counts lines so progress has a denominator; pass 2 streams the
//! file again, line by line, accumulating error counts, keyword counts,
//! and the set of originating IPs. Neither pass holds more than one line
//! in memory, so file size is bounded only by disk.

use crate::error::PipelineError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Lines containing this exact substring count as errors.
const ERROR_MARKER: &str = "ERROR";

/// IPv4-shaped token. Octets are not range-checked; dedup is by exact
/// string value.
static IPV4_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b")
        .unwrap_or_else(|e| panic!("invalid ipv4 pattern: {}", e))
});

/// Raw counters produced by a single analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawStats {
    pub error_count: u64,
    pub keyword_counts: BTreeMap<String, u64>,
    pub unique_ips: Vec<String>,
}

/// Analyze the file at `path`, reporting progress through `on_progress`.
///
/// Progress is reported every `max(10, round(total / 10))` lines as
/// `round(processed / total * 100)`, which works out to roughly ten
/// updates per file with a floor that keeps small files from flooding
/// observers. An empty file reports 100 immediately.
///
/// A line may count as an error, match several keywords, and contribute
/// an IP all at once; the three checks are independent.
pub fn analyze_file(
    path: &Path,
    keywords: &[String],
    mut on_progress: impl FnMut(u8),
) -> Result<RawStats, PipelineError> {
    let total = count_lines(path)?;
    if total == 0 {
        on_progress(100);
        return Ok(RawStats::default());
    }
    let cadence = (total as f64 / 10.0).round().max(10.0) as u64;

    let file = open(path)?;
    let mut stats = RawStats::default();
    let mut ips: BTreeSet<String> = BTreeSet::new();
    let mut processed = 0u64;

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| PipelineError::Analysis(format!("read line: {}", e)))?;

        if line.contains(ERROR_MARKER) {
            stats.error_count += 1;
        }
        for keyword in keywords {
            if line.contains(keyword.as_str()) {
                *stats.keyword_counts.entry(keyword.clone()).or_insert(0) += 1;
            }
        }
        if let Some(m) = IPV4_PATTERN.find(&line) {
            ips.insert(m.as_str().to_string());
        }

        processed += 1;
        if processed % cadence == 0 {
            // The pass-1 count is only an approximation denominator; if
            // the file grew mid-read, clamp rather than exceed 100.
            let percent = (processed as f64 / total as f64 * 100.0).round() as u64;
            on_progress(percent.min(100) as u8);
        }
    }

    stats.unique_ips = ips.into_iter().collect();
    Ok(stats)
}

fn count_lines(path: &Path) -> Result<u64, PipelineError> {
    let file = open(path)?;
    let mut total = 0u64;
    for line in BufReader::new(file).lines() {
        line.map_err(|e| PipelineError::Analysis(format!("count lines: {}", e)))?;
        total += 1;
    }
    Ok(total)
}

fn open(path: &Path) -> Result<File, PipelineError> {
    File::open(path)
        .map_err(|e| PipelineError::Analysis(format!("open {}: {}", path.display(), e)))
}
