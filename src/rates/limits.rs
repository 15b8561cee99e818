//! Lending limits: affordability stresses, structure caps and loan size bounds

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::PricingError;

/// Term used when a product has no entry in `term_months_by_product`
pub const DEFAULT_TERM_MONTHS: u32 = 24;

/// Default location of the limits file
pub const DEFAULT_LIMITS_PATH: &str = "data/limits.json";

/// External lending limits (not derived from inputs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Minimum interest coverage ratio for fixed-rate products
    pub min_icr_fix: f64,

    /// Minimum interest coverage ratio for tracker products
    pub min_icr_tracker: f64,

    /// Base rate added to tracker margins for the pay rate
    pub standard_base_rate: f64,

    /// Base rate added to tracker margins for the ICR stress
    pub stress_base_rate: f64,

    /// Maximum deferred rate for fixed products (decimal)
    pub max_deferred_fix: f64,

    /// Maximum deferred rate for tracker products (decimal)
    pub max_deferred_tracker: f64,

    /// Maximum months of interest that can be rolled up
    pub max_rolled_months: u32,

    /// Minimum gross loan
    pub min_loan: f64,

    /// Maximum gross loan
    pub max_loan: f64,

    /// Initial product term by product name
    pub term_months_by_product: BTreeMap<String, u32>,
}

impl Default for Limits {
    fn default() -> Self {
        let term_months_by_product = [
            ("2yr Fix", 24),
            ("3yr Fix", 36),
            ("5yr Fix", 60),
            ("2yr Tracker", 24),
        ]
        .into_iter()
        .map(|(name, months)| (name.to_string(), months))
        .collect();

        Self {
            min_icr_fix: 1.25,
            min_icr_tracker: 1.30,
            standard_base_rate: 0.04,
            stress_base_rate: 0.045,
            max_deferred_fix: 0.0125,
            max_deferred_tracker: 0.02,
            max_rolled_months: 9,
            min_loan: 150_000.0,
            max_loan: 3_000_000.0,
            term_months_by_product,
        }
    }
}

impl Limits {
    /// Load limits from the default file (data/limits.json)
    pub fn from_json() -> Result<Self, PricingError> {
        Self::from_json_path(DEFAULT_LIMITS_PATH)
    }

    /// Load limits from a JSON file; omitted fields keep their defaults
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self, PricingError> {
        Self::from_json_reader(File::open(path)?)
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, PricingError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Term of a product, defaulting to 24 months
    pub fn term_months(&self, product: &str) -> u32 {
        self.term_months_by_product
            .get(product)
            .copied()
            .unwrap_or(DEFAULT_TERM_MONTHS)
    }

    pub fn min_icr(&self, fixed_rate: bool) -> f64 {
        if fixed_rate {
            self.min_icr_fix
        } else {
            self.min_icr_tracker
        }
    }

    pub fn deferred_cap(&self, tracker: bool) -> f64 {
        if tracker {
            self.max_deferred_tracker
        } else {
            self.max_deferred_fix
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_months_default() {
        let limits = Limits::default();
        assert_eq!(limits.term_months("3yr Fix"), 36);
        assert_eq!(limits.term_months("10yr Fix"), DEFAULT_TERM_MONTHS);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "min_icr_fix": 1.45, "max_loan": 2000000.0, "term_months_by_product": { "2yr Fix": 24 } }"#;
        let limits = Limits::from_json_reader(json.as_bytes()).unwrap();

        assert_eq!(limits.min_icr_fix, 1.45);
        assert_eq!(limits.max_loan, 2_000_000.0);
        assert_eq!(limits.min_icr_tracker, Limits::default().min_icr_tracker);
        assert_eq!(limits.term_months("3yr Fix"), DEFAULT_TERM_MONTHS);
    }

    #[test]
    fn test_limits_file_matches_defaults() {
        assert_eq!(Limits::from_json().unwrap(), Limits::default());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let err = Limits::from_json_reader("{ \"max_loan\": \"lots\" }".as_bytes());
        assert!(matches!(err, Err(PricingError::Json(_))));
    }
}
