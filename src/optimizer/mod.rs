//! Loan sizing and structure optimisation

mod context;
mod engine;
mod inputs;
mod result;
mod search;

pub use engine::LoanOptimizer;
pub use inputs::{BrokerFee, ColumnRate, LoanInputs, LoanType, Selections};
pub use result::{percent_text, tracker_text, LoanResult, StructureSource, Trial};
pub use search::{SearchBounds, SearchGrid};
