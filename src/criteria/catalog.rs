//! Criteria questions per property category
//!
//! Where a question has no separate Tier 2 answer, the Tier 2 threshold
//! repeats the Tier 3 answer. Tier 3 is checked first, so such an answer
//! classifies as Tier 3.

use super::data::{CriteriaQuestion, PropertyCategory};

const YES_NO: &[&str] = &["No", "Yes"];

pub const RESIDENTIAL_CRITERIA: &[CriteriaQuestion] = &[
    CriteriaQuestion {
        id: "holidayLet",
        prompt: "Holiday Let?",
        options: YES_NO,
        tier1: "No",
        tier2: "Yes",
        tier3: Some("Yes"),
        core_eligible: Some("No"),
    },
    CriteriaQuestion {
        id: "hmo",
        prompt: "HMO (House in Multiple Occupation)?",
        options: YES_NO,
        tier1: "No",
        tier2: "Yes",
        tier3: Some("Yes"),
        core_eligible: Some("No"),
    },
    CriteriaQuestion {
        id: "newBuild",
        prompt: "New Build?",
        options: YES_NO,
        tier1: "No",
        tier2: "Yes",
        tier3: Some("Yes"),
        core_eligible: Some("No"),
    },
    CriteriaQuestion {
        id: "offshoreCompany",
        prompt: "Offshore Company Ownership?",
        options: YES_NO,
        tier1: "No",
        tier2: "Yes",
        tier3: Some("Yes"),
        core_eligible: Some("No"),
    },
    CriteriaQuestion {
        id: "ccj",
        prompt: "CCJs in last 3 years?",
        options: YES_NO,
        tier1: "No",
        tier2: "Yes",
        tier3: Some("Yes"),
        core_eligible: Some("No"),
    },
    CriteriaQuestion {
        id: "adverse",
        prompt: "Adverse Credit History?",
        options: &["No", "Minor", "Severe"],
        tier1: "No",
        tier2: "Minor",
        tier3: Some("Severe"),
        core_eligible: Some("No"),
    },
];

/// Shared by Semi-Commercial and Commercial properties
pub const COMMERCIAL_CRITERIA: &[CriteriaQuestion] = &[
    CriteriaQuestion {
        id: "companyOwnership",
        prompt: "Company Ownership Type?",
        options: &["UK Ltd", "Offshore", "Partnership"],
        tier1: "UK Ltd",
        tier2: "Partnership",
        tier3: None,
        core_eligible: None,
    },
    CriteriaQuestion {
        id: "tradingHistory",
        prompt: "Trading History?",
        options: &["3+ years", "1-3 years", "Less than 1 year"],
        tier1: "3+ years",
        tier2: "1-3 years",
        tier3: None,
        core_eligible: None,
    },
    CriteriaQuestion {
        id: "tenancy",
        prompt: "Tenancy Status?",
        options: &["Occupied", "Vacant", "Part Occupied"],
        tier1: "Occupied",
        tier2: "Part Occupied",
        tier3: None,
        core_eligible: None,
    },
    CriteriaQuestion {
        id: "propertyCondition",
        prompt: "Property Condition?",
        options: &["Good", "Fair", "Needs Work"],
        tier1: "Good",
        tier2: "Fair",
        tier3: None,
        core_eligible: None,
    },
    CriteriaQuestion {
        id: "commercialCCJ",
        prompt: "Company CCJs in last 3 years?",
        options: YES_NO,
        tier1: "No",
        tier2: "Yes",
        tier3: None,
        core_eligible: None,
    },
];

/// Active question set for a property category
pub fn criteria_for(category: PropertyCategory) -> &'static [CriteriaQuestion] {
    match category {
        PropertyCategory::Residential => RESIDENTIAL_CRITERIA,
        PropertyCategory::SemiCommercial | PropertyCategory::Commercial => COMMERCIAL_CRITERIA,
    }
}

pub fn find_question(category: PropertyCategory, id: &str) -> Option<&'static CriteriaQuestion> {
    criteria_for(category).iter().find(|q| q.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_offered_options() {
        for question in RESIDENTIAL_CRITERIA.iter().chain(COMMERCIAL_CRITERIA) {
            assert!(question.offers(question.tier1), "{}", question.id);
            assert!(question.offers(question.tier2), "{}", question.id);
            if let Some(t3) = question.tier3 {
                assert!(question.offers(t3), "{}", question.id);
            }
            // The unanswered default must never elevate the tier
            assert_eq!(question.default_answer(), question.tier1, "{}", question.id);
        }
    }

    #[test]
    fn test_commercial_has_no_tier3_or_core() {
        assert!(COMMERCIAL_CRITERIA.iter().all(|q| q.tier3.is_none() && q.core_eligible.is_none()));
        assert!(RESIDENTIAL_CRITERIA.iter().all(|q| q.core_eligible.is_some()));
    }

    #[test]
    fn test_semi_commercial_shares_commercial_questions() {
        assert_eq!(
            criteria_for(PropertyCategory::SemiCommercial).len(),
            criteria_for(PropertyCategory::Commercial).len()
        );
        assert!(find_question(PropertyCategory::SemiCommercial, "tenancy").is_some());
        assert!(find_question(PropertyCategory::Residential, "tenancy").is_none());
    }
}
