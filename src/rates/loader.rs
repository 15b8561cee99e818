//! CSV-based rate table loader
//!
//! All tables live in one long-format file:
//! `table,tier,product,is_margin,fee_pct,rate`

use csv::{Reader, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::tables::{FeeColumn, TableKey};
use super::RateCatalog;
use crate::criteria::Tier;
use crate::error::PricingError;

/// Default location of the rate file
pub const DEFAULT_RATES_PATH: &str = "data/rates.csv";

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    table: String,
    tier: String,
    product: String,
    is_margin: bool,
    fee_pct: String,
    rate: f64,
}

/// A parsed row ready to insert into a catalog
struct RateEntry {
    key: TableKey,
    tier: Tier,
    product: String,
    is_margin: bool,
    column: FeeColumn,
    rate: f64,
}

impl CsvRow {
    fn to_entry(self, line: u64) -> Result<RateEntry, PricingError> {
        if !self.rate.is_finite() || self.rate < 0.0 {
            return Err(PricingError::InvalidRecord {
                line,
                reason: format!("rate {} is not a non-negative number", self.rate),
            });
        }
        if self.product.trim().is_empty() {
            return Err(PricingError::InvalidRecord {
                line,
                reason: "empty product name".to_string(),
            });
        }

        Ok(RateEntry {
            key: self.table.parse()?,
            tier: self.tier.parse()?,
            product: self.product.trim().to_string(),
            is_margin: self.is_margin,
            column: self.fee_pct.parse()?,
            rate: self.rate,
        })
    }
}

/// Load a catalog from a rate file
pub fn load_rate_catalog<P: AsRef<Path>>(path: P) -> Result<RateCatalog, PricingError> {
    load_rate_catalog_from_reader(File::open(path)?)
}

/// Load a catalog from any reader (e.g., string buffer)
pub fn load_rate_catalog_from_reader<R: Read>(reader: R) -> Result<RateCatalog, PricingError> {
    let mut csv_reader = Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let mut record = StringRecord::new();
    let mut catalog = RateCatalog::empty();
    let mut rows = 0usize;

    while csv_reader.read_record(&mut record)? {
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row: CsvRow = record.deserialize(Some(&headers))?;
        let entry = row.to_entry(line)?;
        catalog
            .table_mut(entry.key)
            .insert(entry.tier, &entry.product, entry.is_margin, entry.column, entry.rate);
        rows += 1;
    }

    log::debug!("loaded {} rates into {} tables", rows, catalog.len());
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{PropertyCategory, RetentionBand};

    const SAMPLE: &str = "\
table,tier,product,is_margin,fee_pct,rate
specialist/residential,Tier 1,2yr Fix,false,6,0.0449
specialist/residential,Tier 1,2yr Fix,false,2,0.0609
specialist/residential,Tier 1,2yr Tracker,true,6,0.0049
core-retention-75,Tier 1,5yr Fix,false,1.5,0.0589
specialist-retention-65/commercial,Tier 2,2yr Fix,false,3.5,0.0649
";

    #[test]
    fn test_load_from_reader() {
        let catalog = load_rate_catalog_from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 3);

        let residential = catalog.get(TableKey::Specialist(PropertyCategory::Residential)).unwrap();
        let six: FeeColumn = "6".parse().unwrap();
        assert_eq!(residential.rate(Tier::Tier1, "2yr Fix", six), Some(0.0449));
        assert!(residential.is_margin(Tier::Tier1, "2yr Tracker"));

        let core = catalog.get(TableKey::CoreRetention(RetentionBand::Ltv75)).unwrap();
        assert_eq!(core.rate(Tier::Tier1, "5yr Fix", "1.5".parse().unwrap()), Some(0.0589));

        let commercial = catalog
            .get(TableKey::SpecialistRetention(RetentionBand::Ltv65, PropertyCategory::Commercial))
            .unwrap();
        assert_eq!(commercial.products(Tier::Tier2), vec!["2yr Fix"]);
    }

    #[test]
    fn test_bad_rows_are_rejected() {
        let bad_table = "table,tier,product,is_margin,fee_pct,rate\nbridge/residential,Tier 1,2yr Fix,false,6,0.05\n";
        assert!(matches!(
            load_rate_catalog_from_reader(bad_table.as_bytes()),
            Err(PricingError::UnknownLabel { .. })
        ));

        let bad_rate = "table,tier,product,is_margin,fee_pct,rate\ncore,Tier 1,2yr Fix,false,6,-0.05\n";
        assert!(matches!(
            load_rate_catalog_from_reader(bad_rate.as_bytes()),
            Err(PricingError::InvalidRecord { .. })
        ));

        let bad_number = "table,tier,product,is_margin,fee_pct,rate\ncore,Tier 1,2yr Fix,false,6,high\n";
        assert!(matches!(load_rate_catalog_from_reader(bad_number.as_bytes()), Err(PricingError::Csv(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(load_rate_catalog("does/not/exist.csv"), Err(PricingError::Io(_))));
    }
}
