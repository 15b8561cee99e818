//! Tier classification and Core-product eligibility

use log::debug;

use super::catalog::{criteria_for, RESIDENTIAL_CRITERIA};
use super::data::{CriteriaAnswers, CriteriaQuestion, PropertyCategory, Tier};

/// Severity a single answer contributes (1 when it triggers nothing)
fn answer_severity(question: &CriteriaQuestion, answer: &str) -> u8 {
    if question.tier3 == Some(answer) {
        3
    } else if question.tier2 == answer {
        2
    } else {
        1
    }
}

/// Classify answers into a tier: the worst matched severity over every
/// question of the category's catalog, floored at Tier 1.
///
/// Unanswered questions resolve to their mildest option and trigger nothing.
pub fn classify_tier(category: PropertyCategory, answers: &CriteriaAnswers) -> Tier {
    let severity = criteria_for(category)
        .iter()
        .map(|question| answer_severity(question, answers.resolve(question)))
        .fold(1, u8::max);

    let tier = Tier::from_severity(severity);
    debug!("classified {} answers as {}", category, tier);
    tier
}

/// True only for residential properties where every residential answer
/// equals that question's Core-eligible answer
pub fn is_core_eligible(category: PropertyCategory, answers: &CriteriaAnswers) -> bool {
    if !category.is_residential() {
        return false;
    }

    RESIDENTIAL_CRITERIA
        .iter()
        .all(|question| question.core_eligible == Some(answers.resolve(question)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn residential(pairs: &[(&str, &str)]) -> CriteriaAnswers {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_empty_answers_are_tier1() {
        let answers = CriteriaAnswers::new();
        for category in PropertyCategory::ALL {
            assert_eq!(classify_tier(category, &answers), Tier::Tier1);
        }
    }

    #[test]
    fn test_residential_tiers() {
        assert_eq!(classify_tier(PropertyCategory::Residential, &residential(&[("adverse", "Minor")])), Tier::Tier2);
        assert_eq!(classify_tier(PropertyCategory::Residential, &residential(&[("adverse", "Severe")])), Tier::Tier3);
        assert_eq!(classify_tier(PropertyCategory::Residential, &residential(&[("ccj", "Yes")])), Tier::Tier3);
        assert_eq!(
            classify_tier(PropertyCategory::Residential, &residential(&[("holidayLet", "No"), ("adverse", "No")])),
            Tier::Tier1
        );
    }

    #[test]
    fn test_worst_answer_wins_regardless_of_order() {
        let a = residential(&[("adverse", "Minor"), ("ccj", "Yes")]);
        let b = residential(&[("ccj", "Yes"), ("adverse", "Minor")]);
        assert_eq!(classify_tier(PropertyCategory::Residential, &a), Tier::Tier3);
        assert_eq!(classify_tier(PropertyCategory::Residential, &a), classify_tier(PropertyCategory::Residential, &b));
    }

    #[test]
    fn test_more_severe_answer_never_lowers_tier() {
        for question in RESIDENTIAL_CRITERIA {
            let mut previous = Tier::Tier1;
            // Options are ordered mildest first
            for option in question.options {
                let answers = residential(&[("adverse", "Minor"), (question.id, option)]);
                let tier = classify_tier(PropertyCategory::Residential, &answers);
                assert!(tier >= previous, "{} = {} lowered the tier", question.id, option);
                previous = tier;
            }
        }
    }

    #[test]
    fn test_commercial_caps_at_tier2() {
        let answers: CriteriaAnswers = [
            ("companyOwnership", "Partnership"),
            ("tradingHistory", "1-3 years"),
            ("commercialCCJ", "Yes"),
        ]
        .into_iter()
        .collect();
        assert_eq!(classify_tier(PropertyCategory::Commercial, &answers), Tier::Tier2);
        assert_eq!(classify_tier(PropertyCategory::SemiCommercial, &answers), Tier::Tier2);

        // Options without a threshold do not elevate
        let vacant = residential(&[("tenancy", "Vacant")]);
        assert_eq!(classify_tier(PropertyCategory::Commercial, &vacant), Tier::Tier1);
    }

    #[test]
    fn test_core_eligibility() {
        let clean = CriteriaAnswers::new();
        assert!(is_core_eligible(PropertyCategory::Residential, &clean));

        let explicit: CriteriaAnswers = RESIDENTIAL_CRITERIA.iter().map(|q| (q.id, "No")).collect();
        assert!(is_core_eligible(PropertyCategory::Residential, &explicit));

        // Any single answer away from the eligible one fails
        for question in RESIDENTIAL_CRITERIA {
            for option in question.options.iter().filter(|o| **o != "No") {
                let answers = explicit.clone().with(question.id, *option);
                assert!(!is_core_eligible(PropertyCategory::Residential, &answers));
            }
        }

        assert!(!is_core_eligible(PropertyCategory::Commercial, &clean));
        assert!(!is_core_eligible(PropertyCategory::SemiCommercial, &clean));
    }
}
