//! Report generation.
//!
//! This module turns an [`AggregateResult`] into report rows and writes
//! them out as CSV or JSON.

use crate::errors::Result;
use crate::models::{AggregateResult, Report, ReportMetadata, ReportRow};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Whether a header row is written when neither config nor flags say otherwise.
pub const DEFAULT_INCLUDE_HEADER: bool = true;

const HEADER: [&str; 5] = [
    "product",
    "year",
    "num_complaint",
    "num_company",
    "highest_percent",
];

const MOST_COMPLAINTS_COLUMN: &str = "most_complaints";

/// Report serialization format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated rows (default)
    #[default]
    Csv,
    /// Pretty-printed JSON document
    Json,
}

/// Record terminator for CSV output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    #[default]
    Lf,
    Crlf,
}

impl From<LineTerminator> for csv::Terminator {
    fn from(t: LineTerminator) -> Self {
        match t {
            LineTerminator::Lf => csv::Terminator::Any(b'\n'),
            LineTerminator::Crlf => csv::Terminator::CRLF,
        }
    }
}

/// Options controlling the shape of the report.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub include_header: bool,
    /// Add the `most_complaints` column before `highest_percent`.
    pub most_complaints: bool,
    pub delimiter: u8,
    pub terminator: LineTerminator,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_header: DEFAULT_INCLUDE_HEADER,
            most_complaints: false,
            delimiter: b',',
            terminator: LineTerminator::Lf,
        }
    }
}

impl From<&crate::config::ReportConfig> for ReportOptions {
    fn from(config: &crate::config::ReportConfig) -> Self {
        Self {
            include_header: config.include_header,
            most_complaints: config.most_complaints,
            delimiter: config.delimiter as u8,
            terminator: config.line_terminator,
        }
    }
}

/// Percentage of `total` that `top` represents, rounded half up.
///
/// Computed in integers: `round(100 * top / total)` with halves rounded
/// away from zero equals `(200 * top + total) / (2 * total)`.
pub fn highest_percent(top: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let top = u128::from(top.min(total));
    let total = u128::from(total);
    // Bounded by 100 since top <= total.
    ((200 * top + total) / (2 * total)) as u8
}

/// Build one report row per group, in group order.
pub fn render(result: &AggregateResult, options: &ReportOptions) -> Vec<ReportRow> {
    result
        .iter()
        .map(|(key, counts)| {
            let num_complaint = counts.total();
            let (top_company, top_count) = counts.top().unwrap_or(("", 0));

            ReportRow {
                product: key.product.clone(),
                year: key.year.clone(),
                num_complaint,
                num_company: counts.distinct(),
                most_complaints: options.most_complaints.then(|| top_company.to_string()),
                highest_percent: highest_percent(top_count, num_complaint),
            }
        })
        .collect()
}

fn header(options: &ReportOptions) -> Vec<&'static str> {
    let mut fields = HEADER[..4].to_vec();
    if options.most_complaints {
        fields.push(MOST_COMPLAINTS_COLUMN);
    }
    fields.push(HEADER[4]);
    fields
}

fn row_fields(row: &ReportRow) -> Vec<String> {
    let mut fields = vec![
        row.product.clone(),
        row.year.clone(),
        row.num_complaint.to_string(),
        row.num_company.to_string(),
    ];
    if let Some(ref company) = row.most_complaints {
        fields.push(company.clone());
    }
    fields.push(row.highest_percent.to_string());
    fields
}

/// Write report rows as CSV.
pub fn write_csv_report<W: Write>(rows: &[ReportRow], out: W, options: &ReportOptions) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .terminator(options.terminator.into())
        .from_writer(out);

    if options.include_header {
        writer.write_record(header(options))?;
    }
    for row in rows {
        writer.write_record(row_fields(row))?;
    }

    writer.flush()?;
    Ok(())
}

/// Generate a CSV report in memory.
#[allow(dead_code)] // In-memory counterpart of write_csv_report
pub fn generate_csv_report(rows: &[ReportRow], options: &ReportOptions) -> Result<String> {
    let mut buf = Vec::new();
    write_csv_report(rows, &mut buf, options)?;
    // The csv writer only emits the UTF-8 text it was given.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Assemble the JSON report document.
pub fn build_report(input: &str, result: &AggregateResult, rows: Vec<ReportRow>) -> Report {
    Report {
        metadata: ReportMetadata {
            input: input.to_string(),
            generated_at: Utc::now(),
            records: result.total_records(),
            groups: result.len(),
        },
        rows,
    }
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> anyhow::Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write the report to a file in the requested format.
///
/// The report is written to a temporary file next to `path` and renamed
/// over it once complete, so a failed write never leaves a partial report.
pub fn write_report(
    path: &Path,
    format: OutputFormat,
    input: &str,
    result: &AggregateResult,
    options: &ReportOptions,
) -> anyhow::Result<usize> {
    let rows = render(result, options);
    let count = rows.len();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;

    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        match format {
            OutputFormat::Csv => write_csv_report(&rows, &mut out, options)?,
            OutputFormat::Json => {
                let report = build_report(input, result, rows);
                out.write_all(generate_json_report(&report)?.as_bytes())?;
                out.write_all(b"\n")?;
            }
        }
        out.flush()?;
    }

    // Dropping the returned temp file on failure removes it.
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{aggregate, aggregate_csv, InputOptions};
    use crate::models::{ComplaintRecord, GroupKey};
    use tempfile::TempDir;

    fn add(result: &mut AggregateResult, product: &str, year: &str, companies: &[(&str, u64)]) {
        for (company, n) in companies {
            for _ in 0..*n {
                result.record(GroupKey::new(product, year), company.to_string());
            }
        }
    }

    fn single_group(product: &str, year: &str, companies: &[(&str, u64)]) -> AggregateResult {
        let mut result = AggregateResult::new();
        add(&mut result, product, year, companies);
        result
    }

    #[test]
    fn test_highest_percent_rounds_half_up() {
        assert_eq!(highest_percent(1, 2), 50);
        assert_eq!(highest_percent(1, 8), 13); // 12.5
        assert_eq!(highest_percent(3, 8), 38); // 37.5
        assert_eq!(highest_percent(2, 3), 67); // 66.67
        assert_eq!(highest_percent(1, 3), 33); // 33.33
        assert_eq!(highest_percent(1, 200), 1); // 0.5
        assert_eq!(highest_percent(1, 201), 0); // 0.4975
    }

    #[test]
    fn test_highest_percent_bounds() {
        assert_eq!(highest_percent(5, 5), 100);
        assert_eq!(highest_percent(0, 0), 0);
        for total in 1..=60u64 {
            for top in 1..=total {
                assert!(highest_percent(top, total) <= 100);
            }
        }
    }

    #[test]
    fn test_render_end_to_end_example() {
        let result = aggregate(vec![
            ComplaintRecord::new("Mortgage", "20190304", "BankA"),
            ComplaintRecord::new("Mortgage", "20190512", "BankA"),
            ComplaintRecord::new("Mortgage", "20190812", "BankB"),
        ])
        .unwrap();

        let rows = render(&result, &ReportOptions::default());
        assert_eq!(
            rows,
            vec![ReportRow {
                product: "mortgage".to_string(),
                year: "2019".to_string(),
                num_complaint: 3,
                num_company: 2,
                most_complaints: None,
                highest_percent: 67,
            }]
        );
    }

    #[test]
    fn test_render_most_complaints_tie_picks_first_seen() {
        let result = single_group("loans", "2020", &[("y", 1), ("x", 1)]);
        let options = ReportOptions {
            most_complaints: true,
            ..ReportOptions::default()
        };

        let rows = render(&result, &options);
        assert_eq!(rows[0].most_complaints.as_deref(), Some("y"));
        assert_eq!(rows[0].highest_percent, 50);
    }

    #[test]
    fn test_csv_report_with_header() {
        let mut result = AggregateResult::new();
        add(
            &mut result,
            "credit reporting, credit repair services",
            "2019",
            &[("equifax", 3), ("experian", 1)],
        );
        add(&mut result, "mortgage", "2020", &[("banka", 1)]);
        let options = ReportOptions::default();
        let csv = generate_csv_report(&render(&result, &options), &options).unwrap();

        assert_eq!(
            csv,
            "product,year,num_complaint,num_company,highest_percent\n\
             \"credit reporting, credit repair services\",2019,4,2,75\n\
             mortgage,2020,1,1,100\n"
        );
    }

    #[test]
    fn test_csv_report_without_header() {
        let result = single_group("mortgage", "2020", &[("banka", 1)]);
        let options = ReportOptions {
            include_header: false,
            ..ReportOptions::default()
        };
        let csv = generate_csv_report(&render(&result, &options), &options).unwrap();
        assert_eq!(csv, "mortgage,2020,1,1,100\n");
    }

    #[test]
    fn test_csv_report_most_complaints_column() {
        let result = single_group("mortgage", "2019", &[("banka", 2), ("bankb", 1)]);
        let options = ReportOptions {
            most_complaints: true,
            terminator: LineTerminator::Crlf,
            ..ReportOptions::default()
        };
        let csv = generate_csv_report(&render(&result, &options), &options).unwrap();
        assert_eq!(
            csv,
            "product,year,num_complaint,num_company,most_complaints,highest_percent\r\n\
             mortgage,2019,3,2,banka,67\r\n"
        );
    }

    #[test]
    fn test_csv_report_empty_result() {
        let options = ReportOptions::default();
        let csv = generate_csv_report(&[], &options).unwrap();
        assert_eq!(csv, "product,year,num_complaint,num_company,highest_percent\n");
    }

    #[test]
    fn test_report_is_deterministic() {
        let input = "Product,Date received,Company\n\
                     Mortgage,2019-01-01,B\n\
                     Debt collection,2019-01-01,A\n\
                     Mortgage,2018-01-01,C\n\
                     Debt collection,2019-02-01,B\n";
        let options = ReportOptions::default();
        let run = || {
            let result = aggregate_csv(input.as_bytes(), &InputOptions::default()).unwrap();
            generate_csv_report(&render(&result, &options), &options).unwrap()
        };

        let first = run();
        assert_eq!(first, run());
        assert_eq!(
            first,
            "product,year,num_complaint,num_company,highest_percent\n\
             debt collection,2019,2,2,50\n\
             mortgage,2018,1,1,100\n\
             mortgage,2019,1,1,100\n"
        );
    }

    #[test]
    fn test_fixture_report() {
        let input = include_str!("../../fixtures/complaints.csv");
        let expected = include_str!("../../fixtures/report.csv");

        let result = aggregate_csv(input.as_bytes(), &InputOptions::default()).unwrap();
        let options = ReportOptions::default();
        let csv = generate_csv_report(&render(&result, &options), &options).unwrap();
        assert_eq!(csv, expected);
    }

    #[test]
    fn test_generate_json_report() {
        let result = single_group("mortgage", "2019", &[("banka", 2), ("bankb", 1)]);
        let options = ReportOptions {
            most_complaints: true,
            ..ReportOptions::default()
        };
        let report = build_report("complaints.csv", &result, render(&result, &options));
        let json = generate_json_report(&report).unwrap();

        assert!(json.contains("\"input\": \"complaints.csv\""));
        assert!(json.contains("\"records\": 3"));
        assert!(json.contains("\"most_complaints\": \"banka\""));
        assert!(json.contains("\"highest_percent\": 67"));
    }

    #[test]
    fn test_write_report_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.csv");
        let result = single_group("mortgage", "2019", &[("banka", 1)]);

        let rows = write_report(
            &path,
            OutputFormat::Csv,
            "complaints.csv",
            &result,
            &ReportOptions::default(),
        )
        .unwrap();

        assert_eq!(rows, 1);
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "product,year,num_complaint,num_company,highest_percent\nmortgage,2019,1,1,100\n"
        );
    }

    #[test]
    fn test_write_report_replaces_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.csv");
        std::fs::write(&path, "stale content that is longer than the new report\n".repeat(10))
            .unwrap();
        let result = single_group("mortgage", "2019", &[("banka", 1)]);

        let options = ReportOptions {
            include_header: false,
            ..ReportOptions::default()
        };
        write_report(&path, OutputFormat::Csv, "complaints.csv", &result, &options).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "mortgage,2019,1,1,100\n");
        let entries = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_write_report_failure_leaves_no_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("out");
        std::fs::create_dir(&target).unwrap();
        let result = single_group("mortgage", "2019", &[("banka", 1)]);

        let written = write_report(
            &target,
            OutputFormat::Csv,
            "complaints.csv",
            &result,
            &ReportOptions::default(),
        );

        assert!(written.is_err());
        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("out")]);
        assert!(target.is_dir());
    }

    #[test]
    fn test_write_json_report_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("report.json");
        let result = single_group("mortgage", "2019", &[("banka", 1)]);

        write_report(
            &path,
            OutputFormat::Json,
            "complaints.csv",
            &result,
            &ReportOptions::default(),
        )
        .unwrap();

        let report: Report =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(report.metadata.groups, 1);
        assert_eq!(report.rows[0].highest_percent, 100);
        assert!(report.rows[0].most_complaints.is_none());
    }
}
