//! Complaint aggregation.
//!
//! Reads complaint records from CSV, orders them, and counts complaints
//! per (product, year) group and company.

use crate::analysis::validate::{check_header, normalize_name, parse_year};
use crate::errors::{Field, Result};
use crate::models::{AggregateResult, ComplaintRecord, GroupKey};
use std::io::Read;
use tracing::debug;

/// Options for reading the input table.
#[derive(Debug, Clone)]
pub struct InputOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
}

impl Default for InputOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl From<&crate::config::InputConfig> for InputOptions {
    fn from(config: &crate::config::InputConfig) -> Self {
        Self {
            delimiter: config.delimiter as u8,
        }
    }
}

/// Read every complaint record from a CSV source.
///
/// The header is checked before any row is read. Rows shorter than the
/// header yield empty strings for the absent cells, which the field rules
/// then reject.
pub fn read_records<R: Read>(input: R, options: &InputOptions) -> Result<Vec<ComplaintRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .from_reader(input);

    let columns = check_header(reader.headers()?)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let cell = |i: usize| row.get(i).unwrap_or_default();
        records.push(ComplaintRecord::new(
            cell(columns.product),
            cell(columns.date_received),
            cell(columns.company),
        ));
    }

    debug!("Read {} complaint records", records.len());
    Ok(records)
}

/// Sort records by raw product, then raw date, comparing bytes.
///
/// The sort is stable so equal keys keep their input order.
pub fn sort_records(records: &mut [ComplaintRecord]) {
    records.sort_by(|a, b| {
        a.product
            .cmp(&b.product)
            .then_with(|| a.date_received.cmp(&b.date_received))
    });
}

/// Group complaint records by lowercased product and year.
///
/// The records are sorted first; groups and the companies inside them keep
/// the order in which they first appear in the sorted sequence. The first
/// invalid record aborts the whole aggregation.
pub fn aggregate(mut records: Vec<ComplaintRecord>) -> Result<AggregateResult> {
    sort_records(&mut records);

    let mut result = AggregateResult::new();
    for record in &records {
        let product = normalize_name(Field::Product, &record.product)?;
        let company = normalize_name(Field::Company, &record.company)?;
        let year = parse_year(&record.date_received)?;

        result.record(GroupKey::new(product, year), company);
    }

    debug!(
        "Aggregated {} records into {} groups",
        records.len(),
        result.len()
    );
    Ok(result)
}

/// Read and aggregate a CSV source in one step.
pub fn aggregate_csv<R: Read>(input: R, options: &InputOptions) -> Result<AggregateResult> {
    let records = read_records(input, options)?;
    aggregate(records)
}
