//! Applicant/property criteria, tier classification and Core eligibility

mod data;
pub mod catalog;
mod tier;

pub use data::{
    CriteriaAnswers, CriteriaQuestion, ProductGroup, PropertyCategory, RetentionBand, Tier,
};
pub use catalog::{criteria_for, find_question, COMMERCIAL_CRITERIA, RESIDENTIAL_CRITERIA};
pub use tier::{classify_tier, is_core_eligible};
