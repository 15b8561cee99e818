//! Quote runner for end-to-end pricing
//!
//! Pre-loads the rate catalog and limits once, then prices any number of
//! requests: classify the tier, pick the rate table, and size the loan in
//! every fee column.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::criteria::{
    classify_tier, is_core_eligible, CriteriaAnswers, ProductGroup, PropertyCategory, RetentionBand, Tier,
};
use crate::error::PricingError;
use crate::optimizer::{ColumnRate, LoanInputs, LoanOptimizer, LoanResult, SearchGrid, Selections};
use crate::rates::{fee_columns, max_ltv, select_rate_table, FeeColumn, Limits, RateCatalog, RateTable};

/// Everything needed to price one quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub category: PropertyCategory,
    #[serde(default)]
    pub answers: CriteriaAnswers,
    pub group: ProductGroup,
    #[serde(default)]
    pub retention: Option<RetentionBand>,
    /// Product name, e.g. "2yr Fix"
    pub product: String,
    #[serde(default)]
    pub inputs: LoanInputs,
}

impl QuoteRequest {
    pub fn new(category: PropertyCategory, group: ProductGroup, product: impl Into<String>, inputs: LoanInputs) -> Self {
        Self {
            category,
            answers: CriteriaAnswers::new(),
            group,
            retention: None,
            product: product.into(),
            inputs,
        }
    }

    pub fn with_answers(mut self, answers: CriteriaAnswers) -> Self {
        self.answers = answers;
        self
    }

    pub fn with_retention(mut self, band: RetentionBand) -> Self {
        self.retention = Some(band);
        self
    }
}

/// One column of a quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteColumn {
    pub fee_column: FeeColumn,
    pub result: Option<LoanResult>,
}

/// Priced quote across every fee column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub tier: Tier,
    pub core_eligible: bool,
    pub max_ltv: f64,
    /// A rate table was found for the request
    pub has_rate_table: bool,
    pub columns: Vec<QuoteColumn>,
}

impl Quote {
    /// Columns that produced a loan
    pub fn available(&self) -> impl Iterator<Item = &LoanResult> {
        self.columns.iter().filter_map(|c| c.result.as_ref())
    }

    /// Column with the highest net proceeds (first wins on ties)
    pub fn best_net(&self) -> Option<&LoanResult> {
        self.available().fold(None, |best: Option<&LoanResult>, r| match best {
            Some(b) if r.net <= b.net => Some(b),
            _ => Some(r),
        })
    }
}

/// Pre-loaded quote runner
///
/// # Example
/// ```ignore
/// let runner = QuoteRunner::new();
/// let request = QuoteRequest::new(
///     PropertyCategory::Residential,
///     ProductGroup::Specialist,
///     "2yr Fix",
///     LoanInputs::new(300_000.0, 1_500.0),
/// );
/// let quote = runner.run(&request);
/// ```
#[derive(Debug, Clone)]
pub struct QuoteRunner {
    catalog: RateCatalog,
    optimizer: LoanOptimizer,
}

impl QuoteRunner {
    /// Runner with the built-in tables and house limits
    pub fn new() -> Self {
        Self::with_catalog(RateCatalog::default_tables(), Limits::default())
    }

    /// Runner loading the rate file at its default location
    pub fn from_csv() -> Result<Self, PricingError> {
        Ok(Self::with_catalog(RateCatalog::from_csv()?, Limits::default()))
    }

    pub fn with_catalog(catalog: RateCatalog, limits: Limits) -> Self {
        Self {
            catalog,
            optimizer: LoanOptimizer::new(limits, SearchGrid::default()),
        }
    }

    pub fn with_grid(mut self, grid: SearchGrid) -> Self {
        self.optimizer = LoanOptimizer::new(self.optimizer.limits().clone(), grid);
        self
    }

    pub fn catalog(&self) -> &RateCatalog {
        &self.catalog
    }

    pub fn limits(&self) -> &Limits {
        self.optimizer.limits()
    }

    pub fn optimizer(&self) -> &LoanOptimizer {
        &self.optimizer
    }

    /// Rate table for a request, honoring Core eligibility
    pub fn rate_table(&self, request: &QuoteRequest, core_eligible: bool) -> Option<&RateTable> {
        if request.group == ProductGroup::Core && !core_eligible {
            warn!("Core requested for {} but the criteria are not Core-eligible", request.category);
            return None;
        }
        select_rate_table(&self.catalog, request.category, request.group, request.retention)
    }

    /// Price one request across all of its fee columns
    pub fn run(&self, request: &QuoteRequest) -> Quote {
        self.run_with(request, |column, rate, selections| {
            self.optimizer.compute_column(column, rate, &request.inputs, selections)
        })
    }

    /// Classify and select, then price each column through `price`
    pub(crate) fn run_with<F>(&self, request: &QuoteRequest, mut price: F) -> Quote
    where
        F: FnMut(FeeColumn, ColumnRate, &Selections) -> Option<LoanResult>,
    {
        let tier = classify_tier(request.category, &request.answers);
        let core_eligible = is_core_eligible(request.category, &request.answers);
        let table = self.rate_table(request, core_eligible);

        let selections = Selections {
            category: request.category,
            group: request.group,
            tier,
            product: request.product.clone(),
        };

        let columns = fee_columns(request.category, request.retention.is_some())
            .iter()
            .map(|&column| {
                let result = table.and_then(|t| {
                    let rate = ColumnRate::from_table(Some(t), &selections, column);
                    price(column, rate, &selections)
                });
                QuoteColumn { fee_column: column, result }
            })
            .collect::<Vec<_>>();

        debug!(
            "{} {} {}: {} of {} columns priced",
            request.category,
            request.group,
            selections.label(),
            columns.iter().filter(|c| c.result.is_some()).count(),
            columns.len()
        );

        Quote {
            tier,
            core_eligible,
            max_ltv: max_ltv(request.category, tier),
            has_rate_table: table.is_some(),
            columns,
        }
    }

    /// Price many requests with the same catalog and limits
    pub fn run_batch(&self, requests: &[QuoteRequest]) -> Vec<Quote> {
        requests.iter().map(|r| self.run(r)).collect()
    }
}

impl Default for QuoteRunner {
    fn default() -> Self {
        Self::new()
    }
}
