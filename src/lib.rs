//! BTL Pricing - buy-to-let product eligibility and loan sizing
//!
//! This library provides:
//! - Criteria catalogs, tier classification and Core eligibility
//! - Rate tables, rate-table selection and lending limits
//! - Loan sizing with rolled/deferred interest structure optimisation
//! - Quote runner and memoized session for repeated pricing

pub mod error;
pub mod criteria;
pub mod rates;
pub mod optimizer;
pub mod quote;
pub mod session;

// Re-export commonly used types
pub use error::PricingError;
pub use criteria::{CriteriaAnswers, ProductGroup, PropertyCategory, RetentionBand, Tier};
pub use rates::{FeeColumn, Limits, RateCatalog, RateTable};
pub use optimizer::{LoanInputs, LoanOptimizer, LoanResult, LoanType, SearchGrid};
pub use quote::{Quote, QuoteRequest, QuoteRunner};
pub use session::QuoteSession;
