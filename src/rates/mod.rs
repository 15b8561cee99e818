//! Rate tables, lending limits and rate-table selection

pub mod tables;
mod selector;
mod limits;
pub mod loader;

pub use tables::{fee_columns, FeeColumn, ProductRates, RateTable, TableKey};
pub use selector::{
    apply_floor_rate, max_ltv, select_rate_table, CORE_FLOOR_RATE, DEFAULT_MAX_LTV,
};
pub use limits::{Limits, DEFAULT_LIMITS_PATH, DEFAULT_TERM_MONTHS};

use std::collections::HashMap;
use std::path::Path;

use crate::criteria::{PropertyCategory, RetentionBand};
use crate::error::PricingError;

/// Container for every rate table, keyed by category/group/retention
#[derive(Debug, Clone, Default)]
pub struct RateCatalog {
    tables: HashMap<TableKey, RateTable>,
}

impl RateCatalog {
    /// Built-in house tables
    pub fn default_tables() -> Self {
        let mut catalog = Self::empty();

        catalog.insert(TableKey::Specialist(PropertyCategory::Residential), tables::specialist_residential());
        catalog.insert(TableKey::Specialist(PropertyCategory::SemiCommercial), tables::specialist_semi_commercial());
        catalog.insert(TableKey::Specialist(PropertyCategory::Commercial), tables::specialist_commercial());
        catalog.insert(TableKey::Core, tables::core_residential());

        for band in [RetentionBand::Ltv65, RetentionBand::Ltv75] {
            catalog.insert(TableKey::CoreRetention(band), tables::core_retention(band));
            catalog.insert(
                TableKey::SpecialistRetention(band, PropertyCategory::Residential),
                tables::specialist_retention_residential(band),
            );
            // Commercial has no retention table of its own and falls back to residential
            catalog.insert(
                TableKey::SpecialistRetention(band, PropertyCategory::SemiCommercial),
                tables::specialist_retention_semi_commercial(band),
            );
        }

        catalog
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Load tables from the default rate file (data/rates.csv)
    pub fn from_csv() -> Result<Self, PricingError> {
        Self::from_csv_path(Path::new(loader::DEFAULT_RATES_PATH))
    }

    /// Load tables from a specific rate file
    pub fn from_csv_path(path: &Path) -> Result<Self, PricingError> {
        loader::load_rate_catalog(path)
    }

    /// Load tables from any reader holding rate-file CSV
    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self, PricingError> {
        loader::load_rate_catalog_from_reader(reader)
    }

    pub fn get(&self, key: TableKey) -> Option<&RateTable> {
        self.tables.get(&key)
    }

    pub fn insert(&mut self, key: TableKey, table: RateTable) {
        self.tables.insert(key, table);
    }

    pub(crate) fn table_mut(&mut self, key: TableKey) -> &mut RateTable {
        self.tables.entry(key).or_default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &TableKey> {
        self.tables.keys()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
