//! Tabular ingestion into validated [`ShipmentRecord`]s.
//!
//! Headers are matched loosely (case and whitespace are ignored, and both the
//! spreadsheet labels and the camelCase field names are accepted). Cells are
//! coerced rather than rejected; the report says how often that happened.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{ShipmentRecord, UNKNOWN_CAPTAIN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Id,
    Company,
    Package,
    Date,
    Shipments,
    Fare,
    Delivered,
    Failed,
    Captain,
}

impl Column {
    const ALL: [Column; 9] = [
        Column::Id,
        Column::Company,
        Column::Package,
        Column::Date,
        Column::Shipments,
        Column::Fare,
        Column::Delivered,
        Column::Failed,
        Column::Captain,
    ];

    fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Id => &["id"],
            Column::Company => &["companyname", "company"],
            Column::Package => &["packagecode", "package"],
            Column::Date => &["date"],
            Column::Shipments => &["#shipments", "shipments"],
            Column::Fare => &["packagefare", "fare"],
            Column::Delivered => &["#deliveredshipments", "deliveredshipments", "delivered"],
            Column::Failed => &["#failedshipments", "failedshipments", "failed"],
            Column::Captain => &["captain"],
        }
    }

    fn from_header(header: &str) -> Option<Self> {
        let normalized: String = header
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Column::ALL
            .into_iter()
            .find(|column| column.aliases().contains(&normalized.as_str()))
    }
}

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub records: Vec<ShipmentRecord>,
    /// Rows without a company name
    pub dropped_rows: usize,
    /// Rows whose date could not be parsed and were set to `today`
    pub defaulted_dates: usize,
    /// Rows without a captain, recorded as [`UNKNOWN_CAPTAIN`]
    pub defaulted_captains: usize,
    /// Negative numeric cells raised to 0
    pub clamped_values: usize,
}

pub fn read_csv_path(path: &Path, today: NaiveDate) -> Result<IngestReport> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let report = read_csv(file, today)?;
    info!(
        path = %path.display(),
        records = report.records.len(),
        dropped = report.dropped_rows,
        "Imported shipment records"
    );
    Ok(report)
}

/// Reads a header row followed by data rows.
///
/// Returns [`Error::EmptyDataset`] when no row survives validation.
pub fn read_csv<R: Read>(source: R, today: NaiveDate) -> Result<IngestReport> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut columns: HashMap<Column, usize> = HashMap::new();
    for (index, header) in reader.headers()?.iter().enumerate() {
        if let Some(column) = Column::from_header(header) {
            columns.entry(column).or_insert(index);
        }
    }

    let mut report = IngestReport::default();

    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let cell = |column: Column| columns.get(&column).and_then(|&i| row.get(i)).unwrap_or("");

        let company = cell(Column::Company);
        if company.is_empty() {
            report.dropped_rows += 1;
            continue;
        }

        let captain = match cell(Column::Captain) {
            "" => {
                report.defaulted_captains += 1;
                UNKNOWN_CAPTAIN.to_string()
            }
            name => name.to_string(),
        };

        let date = match parse_date(cell(Column::Date)) {
            Some(date) => date,
            None => {
                report.defaulted_dates += 1;
                today
            }
        };

        let mut clamp = |value: f64, column: Column| -> f64 {
            if value < 0.0 {
                warn!(row = index + 1, ?column, value, "Negative value clamped to 0");
                report.clamped_values += 1;
                0.0
            } else {
                value
            }
        };

        let shipments = clamp(parse_number(cell(Column::Shipments)), Column::Shipments);
        let delivered = clamp(parse_number(cell(Column::Delivered)), Column::Delivered);
        let failed = clamp(parse_number(cell(Column::Failed)), Column::Failed);
        let package_fare = clamp(parse_number(cell(Column::Fare)), Column::Fare);

        let id = match cell(Column::Id) {
            "" => format!("import-{index}"),
            id => id.to_string(),
        };

        report.records.push(ShipmentRecord {
            id,
            company_name: company.to_string(),
            package_code: cell(Column::Package).to_string(),
            date,
            shipments: shipments.round() as u64,
            package_fare,
            delivered_shipments: delivered.round() as u64,
            failed_shipments: failed.round() as u64,
            captain,
        });
    }

    if report.records.is_empty() {
        return Err(Error::EmptyDataset {
            dropped: report.dropped_rows,
        });
    }

    if report.defaulted_dates > 0 {
        warn!(rows = report.defaulted_dates, %today, "Unparseable dates replaced with today");
    }

    Ok(report)
}

/// Lenient numeric parse: thousands separators are ignored, anything
/// unreadable is 0.
pub fn parse_number(raw: &str) -> f64 {
    let cleaned: String = raw.trim().chars().filter(|&c| c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Accepts `YYYY-MM-DD` (optionally followed by a time), `M/D/YYYY`,
/// `D-M-YYYY` and spreadsheet serial day numbers.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Some(prefix) = raw.get(..10) {
        if raw.len() > 10 {
            if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                return Some(date);
            }
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%d-%m-%Y") {
        return Some(date);
    }

    raw.parse::<f64>().ok().and_then(from_serial)
}

/// Spreadsheet serial dates count days from 1899-12-30.
fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}
