//! Data models for the complaint report.
//!
//! This module contains the input record view, the grouped count
//! structures built by the aggregator, and the rows produced by the
//! report generator.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single complaint row as read from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplaintRecord {
    /// Product name, raw text.
    pub product: String,
    /// Date the complaint was received, expected to begin with a 4-digit year.
    pub date_received: String,
    /// Company name, raw text.
    pub company: String,
}

impl ComplaintRecord {
    pub fn new(
        product: impl Into<String>,
        date_received: impl Into<String>,
        company: impl Into<String>,
    ) -> Self {
        Self {
            product: product.into(),
            date_received: date_received.into(),
            company: company.into(),
        }
    }
}

/// Grouping key: lowercased product and year prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub product: String,
    pub year: String,
}

impl GroupKey {
    pub fn new(product: impl Into<String>, year: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            year: year.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.product, self.year)
    }
}

/// Complaint counts per (lowercased) company within one group.
///
/// Companies are kept in the order they were first seen, which makes
/// [`CompanyCounts::top`] deterministic on ties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyCounts(IndexMap<String, u64>);

impl CompanyCounts {
    /// Record one more complaint against `company`.
    pub fn increment(&mut self, company: String) {
        *self.0.entry(company).or_insert(0) += 1;
    }

    /// Total complaints in the group.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Number of distinct companies in the group.
    pub fn distinct(&self) -> usize {
        self.0.len()
    }

    /// Company with the most complaints; the first one seen wins a tie.
    pub fn top(&self) -> Option<(&str, u64)> {
        let mut best: Option<(&str, u64)> = None;
        for (company, &count) in &self.0 {
            match best {
                Some((_, max)) if count <= max => {}
                _ => best = Some((company.as_str(), count)),
            }
        }
        best
    }

    #[allow(dead_code)] // Lookup utility
    pub fn get(&self, company: &str) -> Option<u64> {
        self.0.get(company).copied()
    }
}

/// Every group found in the input, in first-seen order of the sorted records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateResult {
    groups: IndexMap<GroupKey, CompanyCounts>,
}

impl AggregateResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one complaint for `company` under `key`.
    pub fn record(&mut self, key: GroupKey, company: String) {
        self.groups.entry(key).or_default().increment(company);
    }

    #[allow(dead_code)] // Lookup utility
    pub fn get(&self, key: &GroupKey) -> Option<&CompanyCounts> {
        self.groups.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &CompanyCounts)> {
        self.groups.iter()
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of records counted across all groups.
    pub fn total_records(&self) -> u64 {
        self.groups.values().map(CompanyCounts::total).sum()
    }
}

/// One line of the output report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub product: String,
    pub year: String,
    pub num_complaint: u64,
    pub num_company: usize,
    /// Company with the most complaints; only set when that column is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_complaints: Option<String>,
    /// Highest share of the group's complaints against one company, 0-100.
    pub highest_percent: u8,
}

/// Metadata attached to the JSON report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Input file the report was built from.
    pub input: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Number of complaint records counted.
    pub records: u64,
    /// Number of (product, year) groups.
    pub groups: usize,
}

/// The complete report, as serialized in JSON mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub rows: Vec<ReportRow>,
}
