//! Grouping of shipment records into per-key running sums.
//!
//! Every grouping dimension is a plain key function over a record; the
//! resulting map is unordered, so consumers sort explicitly.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{CaptainAggregate, Granularity, ShipmentRecord};

/// Single pass over `records`, accumulating into the bucket named by `key_fn`.
pub fn aggregate_by<'a, K, I, F>(records: I, key_fn: F) -> HashMap<K, CaptainAggregate>
where
    K: Eq + Hash,
    I: IntoIterator<Item = &'a ShipmentRecord>,
    F: Fn(&ShipmentRecord) -> K,
{
    let mut groups: HashMap<K, CaptainAggregate> = HashMap::new();

    for record in records {
        groups.entry(key_fn(record)).or_default().absorb(record);
    }

    groups
}

/// Sums over every record, as if all of them shared one key.
pub fn aggregate_all<'a, I>(records: I) -> CaptainAggregate
where
    I: IntoIterator<Item = &'a ShipmentRecord>,
{
    let mut total = CaptainAggregate::default();
    for record in records {
        total.absorb(record);
    }
    total
}

pub fn by_captain(record: &ShipmentRecord) -> String {
    record.captain.clone()
}

pub fn by_company(record: &ShipmentRecord) -> String {
    record.company_name.clone()
}

pub fn by_package(record: &ShipmentRecord) -> String {
    record.package_code.clone()
}

/// Sunday on or before `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Sortable bucket key for a record's date.
pub fn bucket_key(granularity: Granularity, date: NaiveDate) -> String {
    match granularity {
        Granularity::Week => week_start(date).format("%Y-%m-%d").to_string(),
        Granularity::Month => month_key(date),
    }
}

/// Short display label for a bucket (`Mar 3` or `Mar 2024`).
pub fn bucket_label(granularity: Granularity, date: NaiveDate) -> String {
    match granularity {
        Granularity::Week => week_start(date).format("%b %-d").to_string(),
        Granularity::Month => date.format("%b %Y").to_string(),
    }
}
