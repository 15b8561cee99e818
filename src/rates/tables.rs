//! Rate tables: tier -> product -> fee column -> rate
//!
//! Each table is organized by the arrangement-fee percentages it prices
//! ("fee columns"). Tracker products store a margin over base rate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::criteria::{PropertyCategory, RetentionBand, Tier};
use crate::error::PricingError;

/// An arrangement-fee percentage, stored in hundredths of a percent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FeeColumn(u32);

impl FeeColumn {
    /// `FeeColumn::from_percent(5.5)` is the 5.5% fee column
    pub fn from_percent(percent: f64) -> Option<Self> {
        if !percent.is_finite() || percent < 0.0 || percent >= 100.0 {
            return None;
        }
        Some(FeeColumn((percent * 100.0).round() as u32))
    }

    pub const fn from_hundredths(hundredths: u32) -> Self {
        FeeColumn(hundredths)
    }

    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Fee as a decimal fraction of gross
    pub fn fraction(&self) -> f64 {
        self.0 as f64 / 10_000.0
    }
}

impl fmt::Display for FeeColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.percent())
    }
}

impl FromStr for FeeColumn {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .ok()
            .and_then(FeeColumn::from_percent)
            .ok_or_else(|| PricingError::InvalidFeeColumn(s.to_string()))
    }
}

impl From<FeeColumn> for String {
    fn from(column: FeeColumn) -> Self {
        column.to_string()
    }
}

impl TryFrom<String> for FeeColumn {
    type Error = PricingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Rates for one product across its fee columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRates {
    /// Rates are margins over base rate (tracker product)
    pub is_margin: bool,
    rates: BTreeMap<FeeColumn, f64>,
}

impl ProductRates {
    pub fn new(is_margin: bool) -> Self {
        Self {
            is_margin,
            rates: BTreeMap::new(),
        }
    }

    pub fn rate(&self, column: FeeColumn) -> Option<f64> {
        self.rates.get(&column).copied()
    }

    pub fn insert(&mut self, column: FeeColumn, rate: f64) {
        self.rates.insert(column, rate);
    }

    /// Priced columns, highest fee first
    pub fn columns(&self) -> Vec<FeeColumn> {
        self.rates.keys().rev().copied().collect()
    }
}

/// One rate table (a category/product-group/retention combination)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    tiers: BTreeMap<Tier, BTreeMap<String, ProductRates>>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tier: Tier, product: &str, is_margin: bool, column: FeeColumn, rate: f64) {
        let entry = self
            .tiers
            .entry(tier)
            .or_default()
            .entry(product.to_string())
            .or_insert_with(|| ProductRates::new(is_margin));
        entry.is_margin = is_margin;
        entry.insert(column, rate);
    }

    pub fn product(&self, tier: Tier, product: &str) -> Option<&ProductRates> {
        self.tiers.get(&tier).and_then(|products| products.get(product))
    }

    /// Rate for (tier, product, column); `None` when any level is absent
    pub fn rate(&self, tier: Tier, product: &str, column: FeeColumn) -> Option<f64> {
        self.product(tier, product).and_then(|p| p.rate(column))
    }

    pub fn is_margin(&self, tier: Tier, product: &str) -> bool {
        self.product(tier, product).is_some_and(|p| p.is_margin)
    }

    /// Product names offered at a tier
    pub fn products(&self, tier: Tier) -> Vec<&str> {
        self.tiers
            .get(&tier)
            .map(|products| products.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Columns priced for a product, highest first; empty when absent
    pub fn columns(&self, tier: Tier, product: &str) -> Vec<FeeColumn> {
        self.product(tier, product)
            .map(ProductRates::columns)
            .unwrap_or_default()
    }

    pub fn tiers(&self) -> impl Iterator<Item = Tier> + '_ {
        self.tiers.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Build a table from rows of rates listed in `columns` order
    fn from_rows(columns: &[FeeColumn], rows: &[(Tier, &str, bool, &[f64])]) -> Self {
        let mut table = RateTable::new();
        for (tier, product, is_margin, rates) in rows {
            for (column, rate) in columns.iter().zip(rates.iter()) {
                table.insert(*tier, product, *is_margin, *column, *rate);
            }
        }
        table
    }
}

/// Identifies one table in a [`super::RateCatalog`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableKey {
    Specialist(PropertyCategory),
    SpecialistRetention(RetentionBand, PropertyCategory),
    Core,
    CoreRetention(RetentionBand),
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKey::Specialist(category) => write!(f, "specialist/{}", category.key()),
            TableKey::SpecialistRetention(band, category) => {
                write!(f, "specialist-retention-{}/{}", band.ltv_percent(), category.key())
            }
            TableKey::Core => f.write_str("core"),
            TableKey::CoreRetention(band) => write!(f, "core-retention-{}", band.ltv_percent()),
        }
    }
}

impl FromStr for TableKey {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        let unknown = || PricingError::unknown("rate table", s);

        if key == "core" {
            return Ok(TableKey::Core);
        }
        if let Some(band) = key.strip_prefix("core-retention-") {
            return Ok(TableKey::CoreRetention(band.parse().map_err(|_| unknown())?));
        }

        let (group, category) = key.split_once('/').ok_or_else(unknown)?;
        let category: PropertyCategory = category.parse().map_err(|_| unknown())?;
        if group == "specialist" {
            return Ok(TableKey::Specialist(category));
        }
        let band = group
            .strip_prefix("specialist-retention-")
            .ok_or_else(unknown)?
            .parse()
            .map_err(|_| unknown())?;
        Ok(TableKey::SpecialistRetention(band, category))
    }
}

const RESIDENTIAL_COLUMNS: [FeeColumn; 4] = [
    FeeColumn::from_hundredths(600),
    FeeColumn::from_hundredths(400),
    FeeColumn::from_hundredths(300),
    FeeColumn::from_hundredths(200),
];

const COMMERCIAL_COLUMNS: [FeeColumn; 3] = [
    FeeColumn::from_hundredths(600),
    FeeColumn::from_hundredths(400),
    FeeColumn::from_hundredths(200),
];

const RESIDENTIAL_RETENTION_COLUMNS: [FeeColumn; 4] = [
    FeeColumn::from_hundredths(550),
    FeeColumn::from_hundredths(350),
    FeeColumn::from_hundredths(250),
    FeeColumn::from_hundredths(150),
];

const COMMERCIAL_RETENTION_COLUMNS: [FeeColumn; 3] = [
    FeeColumn::from_hundredths(550),
    FeeColumn::from_hundredths(350),
    FeeColumn::from_hundredths(150),
];

/// Fee columns offered for a category, standard or retention
pub fn fee_columns(category: PropertyCategory, retention: bool) -> &'static [FeeColumn] {
    match (category.is_residential(), retention) {
        (true, false) => &RESIDENTIAL_COLUMNS,
        (true, true) => &RESIDENTIAL_RETENTION_COLUMNS,
        (false, false) => &COMMERCIAL_COLUMNS,
        (false, true) => &COMMERCIAL_RETENTION_COLUMNS,
    }
}

// Built-in tables. Rates are listed highest fee column first.

pub(crate) fn specialist_residential() -> RateTable {
    RateTable::from_rows(
        &RESIDENTIAL_COLUMNS,
        &[
            (Tier::Tier1, "2yr Fix", false, &[0.0449, 0.0529, 0.0569, 0.0609]),
            (Tier::Tier1, "3yr Fix", false, &[0.0479, 0.0559, 0.0599, 0.0639]),
            (Tier::Tier1, "2yr Tracker", true, &[0.0049, 0.0129, 0.0169, 0.0209]),
            (Tier::Tier2, "2yr Fix", false, &[0.0479, 0.0559, 0.0599, 0.0639]),
            (Tier::Tier2, "3yr Fix", false, &[0.0509, 0.0589, 0.0629, 0.0669]),
            (Tier::Tier2, "2yr Tracker", true, &[0.0079, 0.0159, 0.0199, 0.0239]),
            (Tier::Tier3, "2yr Fix", false, &[0.0519, 0.0599, 0.0639, 0.0679]),
            (Tier::Tier3, "3yr Fix", false, &[0.0549, 0.0629, 0.0669, 0.0709]),
            (Tier::Tier3, "2yr Tracker", true, &[0.0119, 0.0199, 0.0239, 0.0279]),
        ],
    )
}

pub(crate) fn specialist_semi_commercial() -> RateTable {
    RateTable::from_rows(
        &COMMERCIAL_COLUMNS,
        &[
            (Tier::Tier1, "2yr Fix", false, &[0.0549, 0.0629, 0.0709]),
            (Tier::Tier1, "3yr Fix", false, &[0.0579, 0.0659, 0.0739]),
            (Tier::Tier1, "2yr Tracker", true, &[0.0149, 0.0229, 0.0309]),
            (Tier::Tier2, "2yr Fix", false, &[0.0599, 0.0679, 0.0759]),
            (Tier::Tier2, "3yr Fix", false, &[0.0629, 0.0709, 0.0789]),
            (Tier::Tier2, "2yr Tracker", true, &[0.0199, 0.0279, 0.0359]),
        ],
    )
}

pub(crate) fn specialist_commercial() -> RateTable {
    RateTable::from_rows(
        &COMMERCIAL_COLUMNS,
        &[
            (Tier::Tier1, "2yr Fix", false, &[0.0599, 0.0679, 0.0759]),
            (Tier::Tier1, "3yr Fix", false, &[0.0629, 0.0709, 0.0789]),
            (Tier::Tier1, "2yr Tracker", true, &[0.0199, 0.0279, 0.0359]),
            (Tier::Tier2, "2yr Fix", false, &[0.0649, 0.0729, 0.0809]),
            (Tier::Tier2, "3yr Fix", false, &[0.0679, 0.0759, 0.0839]),
            (Tier::Tier2, "2yr Tracker", true, &[0.0249, 0.0329, 0.0409]),
        ],
    )
}

pub(crate) fn core_residential() -> RateTable {
    RateTable::from_rows(
        &RESIDENTIAL_COLUMNS,
        &[
            (Tier::Tier1, "2yr Fix", false, &[0.0499, 0.0539, 0.0559, 0.0589]),
            (Tier::Tier1, "5yr Fix", false, &[0.0519, 0.0549, 0.0569, 0.0599]),
        ],
    )
}

pub(crate) fn core_retention(band: RetentionBand) -> RateTable {
    let rows: &[(Tier, &str, bool, &[f64])] = match band {
        RetentionBand::Ltv65 => &[
            (Tier::Tier1, "2yr Fix", false, &[0.0479, 0.0519, 0.0539, 0.0569]),
            (Tier::Tier1, "5yr Fix", false, &[0.0499, 0.0529, 0.0549, 0.0579]),
        ],
        RetentionBand::Ltv75 => &[
            (Tier::Tier1, "2yr Fix", false, &[0.0489, 0.0529, 0.0549, 0.0579]),
            (Tier::Tier1, "5yr Fix", false, &[0.0509, 0.0539, 0.0559, 0.0589]),
        ],
    };
    RateTable::from_rows(&RESIDENTIAL_RETENTION_COLUMNS, rows)
}

pub(crate) fn specialist_retention_residential(band: RetentionBand) -> RateTable {
    let rows: &[(Tier, &str, bool, &[f64])] = match band {
        RetentionBand::Ltv65 => &[
            (Tier::Tier1, "2yr Fix", false, &[0.0419, 0.0489, 0.0529, 0.0569]),
            (Tier::Tier1, "2yr Tracker", true, &[0.0019, 0.0089, 0.0129, 0.0169]),
            (Tier::Tier2, "2yr Fix", false, &[0.0449, 0.0519, 0.0559, 0.0599]),
            (Tier::Tier2, "2yr Tracker", true, &[0.0049, 0.0119, 0.0159, 0.0199]),
            (Tier::Tier3, "2yr Fix", false, &[0.0489, 0.0559, 0.0599, 0.0639]),
            (Tier::Tier3, "2yr Tracker", true, &[0.0089, 0.0159, 0.0199, 0.0239]),
        ],
        RetentionBand::Ltv75 => &[
            (Tier::Tier1, "2yr Fix", false, &[0.0439, 0.0509, 0.0549, 0.0589]),
            (Tier::Tier1, "2yr Tracker", true, &[0.0039, 0.0109, 0.0149, 0.0189]),
            (Tier::Tier2, "2yr Fix", false, &[0.0469, 0.0539, 0.0579, 0.0619]),
            (Tier::Tier2, "2yr Tracker", true, &[0.0069, 0.0139, 0.0179, 0.0219]),
            (Tier::Tier3, "2yr Fix", false, &[0.0509, 0.0579, 0.0619, 0.0659]),
            (Tier::Tier3, "2yr Tracker", true, &[0.0109, 0.0179, 0.0219, 0.0259]),
        ],
    };
    RateTable::from_rows(&RESIDENTIAL_RETENTION_COLUMNS, rows)
}

pub(crate) fn specialist_retention_semi_commercial(band: RetentionBand) -> RateTable {
    let rows: &[(Tier, &str, bool, &[f64])] = match band {
        RetentionBand::Ltv65 => &[
            (Tier::Tier1, "2yr Fix", false, &[0.0519, 0.0599, 0.0679]),
            (Tier::Tier1, "2yr Tracker", true, &[0.0119, 0.0199, 0.0279]),
            (Tier::Tier2, "2yr Fix", false, &[0.0569, 0.0649, 0.0729]),
            (Tier::Tier2, "2yr Tracker", true, &[0.0169, 0.0249, 0.0329]),
        ],
        RetentionBand::Ltv75 => &[
            (Tier::Tier1, "2yr Fix", false, &[0.0539, 0.0619, 0.0699]),
            (Tier::Tier1, "2yr Tracker", true, &[0.0139, 0.0219, 0.0299]),
            (Tier::Tier2, "2yr Fix", false, &[0.0589, 0.0669, 0.0749]),
            (Tier::Tier2, "2yr Tracker", true, &[0.0189, 0.0269, 0.0349]),
        ],
    };
    RateTable::from_rows(&COMMERCIAL_RETENTION_COLUMNS, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(percent: f64) -> FeeColumn {
        FeeColumn::from_percent(percent).unwrap()
    }

    #[test]
    fn test_fee_column_parsing_and_display() {
        assert_eq!("5.5".parse::<FeeColumn>().unwrap(), col(5.5));
        assert_eq!("6%".parse::<FeeColumn>().unwrap(), col(6.0));
        assert_eq!(col(6.0).to_string(), "6");
        assert_eq!(col(1.5).to_string(), "1.5");
        assert!((col(3.5).fraction() - 0.035).abs() < 1e-12);
        assert!("abc".parse::<FeeColumn>().is_err());
        assert!(FeeColumn::from_percent(-1.0).is_none());
    }

    #[test]
    fn test_rate_lookup() {
        let table = specialist_residential();
        assert_eq!(table.rate(Tier::Tier1, "2yr Fix", col(2.0)), Some(0.0609));
        assert_eq!(table.rate(Tier::Tier3, "2yr Tracker", col(6.0)), Some(0.0119));
        assert!(table.is_margin(Tier::Tier1, "2yr Tracker"));
        assert!(!table.is_margin(Tier::Tier1, "2yr Fix"));

        // Absent entries yield no rate
        assert_eq!(table.rate(Tier::Tier1, "10yr Fix", col(2.0)), None);
        assert_eq!(table.rate(Tier::Tier1, "2yr Fix", col(5.5)), None);
        assert_eq!(specialist_commercial().rate(Tier::Tier3, "2yr Fix", col(6.0)), None);
        assert!(!table.is_margin(Tier::Tier1, "10yr Fix"));
    }

    #[test]
    fn test_columns_sorted_descending() {
        let table = specialist_residential();
        assert_eq!(table.columns(Tier::Tier2, "3yr Fix"), RESIDENTIAL_COLUMNS.to_vec());
        assert!(table.columns(Tier::Tier2, "nope").is_empty());
        assert_eq!(table.products(Tier::Tier1), vec!["2yr Fix", "2yr Tracker", "3yr Fix"]);
    }

    #[test]
    fn test_fee_columns_per_category() {
        let pct = |cols: &[FeeColumn]| cols.iter().map(|c| c.percent()).collect::<Vec<_>>();
        assert_eq!(pct(fee_columns(PropertyCategory::Residential, false)), vec![6.0, 4.0, 3.0, 2.0]);
        assert_eq!(pct(fee_columns(PropertyCategory::Residential, true)), vec![5.5, 3.5, 2.5, 1.5]);
        assert_eq!(pct(fee_columns(PropertyCategory::Commercial, false)), vec![6.0, 4.0, 2.0]);
        assert_eq!(pct(fee_columns(PropertyCategory::SemiCommercial, true)), vec![5.5, 3.5, 1.5]);
    }

    #[test]
    fn test_table_key_round_trip_labels() {
        let keys = [
            TableKey::Specialist(PropertyCategory::SemiCommercial),
            TableKey::SpecialistRetention(RetentionBand::Ltv75, PropertyCategory::Residential),
            TableKey::Core,
            TableKey::CoreRetention(RetentionBand::Ltv65),
        ];
        for key in keys {
            assert_eq!(key.to_string().parse::<TableKey>().unwrap(), key);
        }
        assert!("bridge/residential".parse::<TableKey>().is_err());
    }
}
