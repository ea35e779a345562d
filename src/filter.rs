use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::ShipmentRecord;

/// Either no restriction or an exact-match value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => expected == value,
        }
    }

    pub fn from_option(value: Option<&str>) -> Self {
        value.map(Selection::from_value).unwrap_or_default()
    }

    fn from_value(value: &str) -> Self {
        if value == "all" {
            Selection::All
        } else {
            Selection::Only(value.to_string())
        }
    }
}

impl FromStr for Selection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Selection::from_value(s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentFilter {
    pub company: Selection,
    pub captain: Selection,
    pub package_code: Selection,
    /// Inclusive lower bound
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound
    pub date_to: Option<NaiveDate>,
}

impl ShipmentFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_captain(captain: &str) -> Self {
        Self {
            captain: Selection::Only(captain.to_string()),
            ..Self::default()
        }
    }

    pub fn between(mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        self.date_from = from;
        self.date_to = to;
        self
    }

    pub fn matches(&self, record: &ShipmentRecord) -> bool {
        if !self.company.matches(&record.company_name)
            || !self.captain.matches(&record.captain)
            || !self.package_code.matches(&record.package_code)
        {
            return false;
        }

        if let Some(from) = self.date_from {
            if record.date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if record.date > to {
                return false;
            }
        }

        true
    }

    /// Returns the matching records in their original relative order.
    pub fn apply(&self, records: &[ShipmentRecord]) -> Vec<ShipmentRecord> {
        records
            .iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}

/// Distinct values available for the equality filters, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub companies: Vec<String>,
    pub captains: Vec<String>,
    pub package_codes: Vec<String>,
}

impl FilterOptions {
    pub fn from_records(records: &[ShipmentRecord]) -> Self {
        let mut companies = BTreeSet::new();
        let mut captains = BTreeSet::new();
        let mut package_codes = BTreeSet::new();

        for record in records {
            companies.insert(record.company_name.clone());
            captains.insert(record.captain.clone());
            package_codes.insert(record.package_code.clone());
        }

        Self {
            companies: companies.into_iter().collect(),
            captains: captains.into_iter().collect(),
            package_codes: package_codes.into_iter().collect(),
        }
    }
}
