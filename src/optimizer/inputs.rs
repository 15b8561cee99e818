//! Caller-supplied inputs for sizing a loan in one fee column

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::criteria::{ProductGroup, PropertyCategory, Tier};
use crate::rates::{FeeColumn, RateTable};

/// What the borrower asked for
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoanType {
    /// Largest gross the rules allow
    #[default]
    MaxOptimumGross,
    /// Largest gross up to a chosen LTV (rule cap when `ltv` is absent)
    MaxLtv { ltv: Option<f64> },
    /// A specific gross amount; the rules can only lower it
    SpecificGross { gross: f64 },
    /// Size the gross so net proceeds reach `net`
    SpecificNet { net: f64 },
}

/// Broker fee charged on the loan
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum BrokerFee {
    #[default]
    None,
    /// Percentage of gross (e.g., 1.0 for 1%)
    Percent(f64),
    /// Flat amount
    Flat(f64),
}

impl BrokerFee {
    pub fn amount(&self, gross: f64) -> f64 {
        match self {
            BrokerFee::None => 0.0,
            BrokerFee::Percent(pct) => gross * pct / 100.0,
            BrokerFee::Flat(amount) => *amount,
        }
    }
}

/// Financial inputs for one quote
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanInputs {
    pub property_value: Option<f64>,
    pub monthly_rent: Option<f64>,
    pub loan_type: LoanType,

    /// Fee percentage to charge instead of the column's own
    pub fee_overrides: BTreeMap<FeeColumn, f64>,

    /// Base rate (or tracker margin) to use instead of the table rate
    pub rate_overrides: BTreeMap<FeeColumn, f64>,

    /// Either field switches the column to manual structuring
    pub manual_rolled_months: Option<u32>,
    pub manual_deferred_rate: Option<f64>,

    /// Procuration fee percentage
    pub proc_fee_pct: f64,
    pub broker_fee: BrokerFee,
}

impl LoanInputs {
    pub fn new(property_value: f64, monthly_rent: f64) -> Self {
        Self {
            property_value: Some(property_value),
            monthly_rent: Some(monthly_rent),
            ..Self::default()
        }
    }

    pub fn with_loan_type(mut self, loan_type: LoanType) -> Self {
        self.loan_type = loan_type;
        self
    }

    pub fn with_manual(mut self, rolled_months: Option<u32>, deferred_rate: Option<f64>) -> Self {
        self.manual_rolled_months = rolled_months;
        self.manual_deferred_rate = deferred_rate;
        self
    }

    pub fn is_manual(&self) -> bool {
        self.manual_rolled_months.is_some() || self.manual_deferred_rate.is_some()
    }

    /// True when any supplied amount, rate or fee is NaN or infinite
    pub fn has_non_finite(&self) -> bool {
        let target = match self.loan_type {
            LoanType::MaxOptimumGross => None,
            LoanType::MaxLtv { ltv } => ltv,
            LoanType::SpecificGross { gross } => Some(gross),
            LoanType::SpecificNet { net } => Some(net),
        };
        let broker = match self.broker_fee {
            BrokerFee::None => None,
            BrokerFee::Percent(value) | BrokerFee::Flat(value) => Some(value),
        };

        [
            self.property_value,
            self.monthly_rent,
            self.manual_deferred_rate,
            target,
            broker,
            Some(self.proc_fee_pct),
        ]
        .into_iter()
        .flatten()
        .chain(self.fee_overrides.values().copied())
        .chain(self.rate_overrides.values().copied())
        .any(|v| !v.is_finite())
    }

    /// Fee for a column as a decimal fraction, honoring overrides
    pub fn fee_fraction(&self, column: FeeColumn) -> f64 {
        self.fee_overrides
            .get(&column)
            .map(|pct| pct / 100.0)
            .unwrap_or_else(|| column.fraction())
    }

    /// Property value when known (zero counts as unknown)
    pub fn known_property_value(&self) -> Option<f64> {
        positive(self.property_value)
    }

    /// Monthly rent when known (zero counts as unknown)
    pub fn known_monthly_rent(&self) -> Option<f64> {
        positive(self.monthly_rent)
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Product selection the column is priced under
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selections {
    pub category: PropertyCategory,
    pub group: ProductGroup,
    pub tier: Tier,
    /// Product name, e.g. "2yr Fix"
    pub product: String,
}

impl Selections {
    pub fn is_core_residential(&self) -> bool {
        self.group == ProductGroup::Core && self.category.is_residential()
    }

    /// Fixed-rate products carry "Fix" in their name
    pub fn is_fixed_rate(&self) -> bool {
        self.product.contains("Fix")
    }

    pub fn label(&self) -> String {
        format!("{}, {}", self.product, self.tier)
    }
}

/// The table's rate for a column
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnRate {
    pub base_rate: Option<f64>,
    pub is_margin: bool,
}

impl ColumnRate {
    pub fn from_table(table: Option<&RateTable>, selections: &Selections, column: FeeColumn) -> Self {
        let product = table.and_then(|t| t.product(selections.tier, &selections.product));
        Self {
            base_rate: product.and_then(|p| p.rate(column)),
            is_margin: product.is_some_and(|p| p.is_margin),
        }
    }
}
