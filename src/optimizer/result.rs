//! Trial and result records for the loan optimizer

use serde::{Deserialize, Serialize};

use crate::rates::FeeColumn;

/// Economics of one (rolled months, deferred rate) structure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub rolled_months: u32,
    pub deferred_rate: f64,

    /// Gross after every cap, before the minimum-loan check
    pub sized_gross: f64,
    /// Gross actually offered (zero when under the minimum loan)
    pub gross: f64,
    pub net: f64,
    pub fee_amount: f64,
    pub rolled_amount: f64,
    pub deferred_amount: f64,
    pub ltv: Option<f64>,

    /// Rate paid monthly after deferral
    pub pay_rate: f64,
    pub proc_fee: f64,
    pub broker_fee: f64,
}

/// How the winning structure was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureSource {
    /// Core residential: no rolled or deferred interest
    Fixed,
    /// Best net proceeds over the search grid
    Optimized,
    /// Caller-supplied structure (clamped to limits)
    Manual,
    /// Caller-supplied structure was unusable; (0, 0) used instead
    ManualFallback,
    /// No grid point gave a finite net; (0, 0) used instead
    SearchFallback,
}

/// Sized loan for one fee column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanResult {
    pub fee_column: FeeColumn,
    /// "<product>, <tier>"
    pub product_label: String,
    pub product_type: String,

    /// Advertised rate (tracker margin plus standard base rate)
    pub full_rate_text: String,
    pub pay_rate_text: String,
    /// Table rate or override (tracker margin for trackers)
    pub rate_used: f64,
    pub is_rate_overridden: bool,

    pub gross: f64,
    pub net: f64,
    pub fee_amount: f64,
    pub rolled_amount: f64,
    pub deferred_amount: f64,
    pub ltv: Option<f64>,

    pub rolled_months: u32,
    pub deferred_rate: f64,
    pub pay_rate: f64,
    pub direct_debit: f64,
    /// First month with a live direct debit
    pub dd_start_month: u32,

    pub max_ltv_rule: f64,
    pub term_months: u32,

    /// 0 < gross < minimum loan
    pub below_min: bool,
    /// Gross sits on the maximum loan
    pub hit_max_cap: bool,
    pub is_manual_override: bool,
    pub structure: StructureSource,
    pub sized_gross: f64,

    pub proc_fee: f64,
    pub broker_fee: f64,
}

/// Format a decimal rate as a two-place percentage, e.g. 0.0549 -> "5.49%"
pub fn percent_text(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

/// Tracker pay rate quoted against base rate.
///
/// A margin that rounds below zero (deferral larger than the tracker
/// margin) is written as a discount, e.g. "BBR - 1.51%".
pub fn tracker_text(margin: f64) -> String {
    if (margin * 10_000.0).round() < 0.0 {
        format!("BBR - {}", percent_text(-margin))
    } else {
        format!("{} + BBR", percent_text(margin.max(0.0)))
    }
}
