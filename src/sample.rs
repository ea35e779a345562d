//! Seeded synthetic shipment data for demos and first runs.

use chrono::NaiveDate;
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::info;

use crate::models::ShipmentRecord;

pub const DEFAULT_COUNT: usize = 500;
pub const DEFAULT_SEED: u64 = 2024;

pub const COMPANIES: [&str; 8] = [
    "Aramco",
    "SABIC",
    "STC",
    "Al Rajhi Bank",
    "Almarai",
    "SAMBA",
    "NCB",
    "Mobily",
];

pub const CAPTAINS: [&str; 8] = [
    "Ahmed Al-Mansouri",
    "Khalid Al-Zahrani",
    "Mohammed Al-Rashid",
    "Faisal Al-Otaibi",
    "Omar Al-Sudairy",
    "Sultan Al-Harbi",
    "Nasser Al-Qasimi",
    "Saad Al-Dosari",
];

pub const PACKAGE_CODES: [&str; 6] = ["PKG-001", "PKG-002", "PKG-003", "PKG-004", "PKG-005", "PKG-006"];

/// `count` records dated across 2024. The same seed always yields the same
/// records.
pub fn generate(count: usize, seed: u64) -> Vec<ShipmentRecord> {
    let mut rng = StdRng::seed_from_u64(seed);

    let records: Vec<ShipmentRecord> = (0..count)
        .map(|i| {
            let shipments: u64 = rng.gen_range(10..60);
            let delivered = (shipments as f64 * rng.gen_range(0.70..0.95)).floor() as u64;
            let fare_cents: u32 = rng.gen_range(1500..=4500);

            ShipmentRecord {
                id: format!("shipment-{i}"),
                company_name: pick(&mut rng, &COMPANIES),
                package_code: pick(&mut rng, &PACKAGE_CODES),
                date: NaiveDate::from_yo_opt(2024, rng.gen_range(1..=366)).unwrap_or(NaiveDate::MIN),
                shipments,
                package_fare: fare_cents as f64 / 100.0,
                delivered_shipments: delivered,
                failed_shipments: shipments - delivered,
                captain: pick(&mut rng, &CAPTAINS),
            }
        })
        .collect();

    info!(count, seed, "Generated sample shipment data");
    records
}

fn pick(rng: &mut StdRng, values: &[&str]) -> String {
    values.choose(rng).copied().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn same_seed_same_records() {
        assert_eq!(generate(50, 7), generate(50, 7));
        assert_ne!(generate(50, 7), generate(50, 8));
    }

    #[test]
    fn records_stay_in_range() {
        let records = generate(DEFAULT_COUNT, DEFAULT_SEED);
        assert_eq!(records.len(), DEFAULT_COUNT);

        for record in &records {
            assert!((10..60).contains(&record.shipments));
            assert_eq!(record.delivered_shipments + record.failed_shipments, record.shipments);
            assert!(record.delivered_shipments as f64 >= (record.shipments as f64 * 0.70).floor());
            assert!((15.0..=45.0).contains(&record.package_fare));
            assert_eq!(record.date.year(), 2024);
            assert!(COMPANIES.contains(&record.company_name.as_str()));
            assert!(CAPTAINS.contains(&record.captain.as_str()));
            assert!(PACKAGE_CODES.contains(&record.package_code.as_str()));
        }
    }
}
