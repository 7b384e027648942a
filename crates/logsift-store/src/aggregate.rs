//! Cross-file aggregation for the stats overview endpoint.

use logsift_commons::LogStats;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// How many keywords the overview reports.
const TOP_KEYWORDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
}

/// Rollup across every stored result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_errors: u64,
    pub top_keywords: Vec<KeywordCount>,
    #[serde(rename = "uniqueIPCount")]
    pub unique_ip_count: usize,
    pub files_analyzed: usize,
}

/// Merge every record into one overview: summed error counts, the top
/// five keywords by total count, and the size of the union of unique IPs.
pub fn aggregate(records: &[LogStats]) -> AggregateStats {
    let mut total_errors = 0u64;
    let mut keywords: BTreeMap<&str, u64> = BTreeMap::new();
    let mut ips: BTreeSet<&str> = BTreeSet::new();

    for record in records {
        total_errors += record.error_count;
        for (keyword, count) in &record.keyword_counts {
            *keywords.entry(keyword).or_insert(0) += count;
        }
        for ip in &record.unique_ips {
            ips.insert(ip);
        }
    }

    let mut ranked: Vec<KeywordCount> = keywords
        .into_iter()
        .map(|(keyword, count)| KeywordCount {
            keyword: keyword.to_string(),
            count,
        })
        .collect();
    // Highest count first; ties break alphabetically (BTreeMap order is
    // already alphabetical, and the sort is stable).
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(TOP_KEYWORDS);

    AggregateStats {
        total_errors,
        top_keywords: ranked,
        unique_ip_count: ips.len(),
        files_analyzed: records.len(),
    }
}
