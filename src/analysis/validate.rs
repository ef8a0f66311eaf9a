//! Input validation.
//!
//! Header checks and the per-field rules applied to every complaint
//! record before it is counted.

use crate::errors::{ComplaintError, Field, Result};
use csv::StringRecord;

pub const PRODUCT_COLUMN: &str = "Product";
pub const DATE_RECEIVED_COLUMN: &str = "Date received";
pub const COMPANY_COLUMN: &str = "Company";

/// Required header names, in the order they are reported when missing.
pub const REQUIRED_COLUMNS: [&str; 3] = [PRODUCT_COLUMN, DATE_RECEIVED_COLUMN, COMPANY_COLUMN];

/// Lowercased values treated as "no value".
const NULL_TOKENS: [&str; 3] = ["n/a", "none", "nan"];

/// Number of leading characters of the date that hold the year.
const YEAR_LEN: usize = 4;

/// Positions of the required columns within a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub product: usize,
    pub date_received: usize,
    pub company: usize,
}

/// Locate the required columns, failing with every missing name at once.
///
/// Header names are matched exactly (case-sensitive). A UTF-8 byte-order
/// mark on the first cell is ignored. When a name repeats, the last column
/// with that name is used.
pub fn check_header(headers: &StringRecord) -> Result<ColumnIndex> {
    let position = |name: &str| {
        headers
            .iter()
            .enumerate()
            .filter(|&(i, h)| {
                let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
                h == name
            })
            .map(|(i, _)| i)
            .last()
    };

    let product = position(PRODUCT_COLUMN);
    let date_received = position(DATE_RECEIVED_COLUMN);
    let company = position(COMPANY_COLUMN);

    match (product, date_received, company) {
        (Some(product), Some(date_received), Some(company)) => Ok(ColumnIndex {
            product,
            date_received,
            company,
        }),
        found => {
            let missing = [found.0, found.1, found.2]
                .iter()
                .zip(REQUIRED_COLUMNS)
                .filter(|(idx, _)| idx.is_none())
                .map(|(_, name)| name.to_string())
                .collect();
            Err(ComplaintError::MissingColumns(missing))
        }
    }
}

/// True if a lowercased value carries no usable name.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty() || NULL_TOKENS.contains(&value)
}

/// Lowercase a product or company name and reject blanks and null tokens.
pub fn normalize_name(field: Field, raw: &str) -> Result<String> {
    let value = raw.to_lowercase();
    if is_blank(&value) {
        return Err(ComplaintError::InvalidField { field, value });
    }
    Ok(value)
}

/// Take the year prefix of a date and check that it is an integer.
///
/// Returns the prefix exactly as written so the report shows the year the
/// way the input did.
pub fn parse_year(date_received: &str) -> Result<String> {
    let year: String = date_received.chars().take(YEAR_LEN).collect();
    if year.chars().count() < YEAR_LEN || year.parse::<i32>().is_err() {
        return Err(ComplaintError::InvalidYear { value: year });
    }
    Ok(year)
}
