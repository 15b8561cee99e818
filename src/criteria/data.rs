//! Typed selections: property category, tier, product group, retention band,
//! criteria questions and answer sets

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PricingError;

/// Category of the security property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PropertyCategory {
    Residential,
    #[serde(rename = "Semi-Commercial")]
    SemiCommercial,
    Commercial,
}

impl PropertyCategory {
    pub const ALL: [PropertyCategory; 3] = [
        PropertyCategory::Residential,
        PropertyCategory::SemiCommercial,
        PropertyCategory::Commercial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyCategory::Residential => "Residential",
            PropertyCategory::SemiCommercial => "Semi-Commercial",
            PropertyCategory::Commercial => "Commercial",
        }
    }

    /// Short key used in rate-table file names
    pub fn key(&self) -> &'static str {
        match self {
            PropertyCategory::Residential => "residential",
            PropertyCategory::SemiCommercial => "semi-commercial",
            PropertyCategory::Commercial => "commercial",
        }
    }

    pub fn is_residential(&self) -> bool {
        matches!(self, PropertyCategory::Residential)
    }

    /// Tiers a property of this category can be classified into
    pub fn available_tiers(&self) -> &'static [Tier] {
        match self {
            PropertyCategory::Residential => &[Tier::Tier1, Tier::Tier2, Tier::Tier3],
            PropertyCategory::SemiCommercial | PropertyCategory::Commercial => {
                &[Tier::Tier1, Tier::Tier2]
            }
        }
    }
}

impl fmt::Display for PropertyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyCategory {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "residential" => Ok(PropertyCategory::Residential),
            "semi-commercial" | "semicommercial" | "semi_commercial" => {
                Ok(PropertyCategory::SemiCommercial)
            }
            "commercial" => Ok(PropertyCategory::Commercial),
            _ => Err(PricingError::unknown("property category", s)),
        }
    }
}

/// Risk tier; Tier 1 is the best
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tier {
    #[serde(rename = "Tier 1")]
    Tier1,
    #[serde(rename = "Tier 2")]
    Tier2,
    #[serde(rename = "Tier 3")]
    Tier3,
}

impl Tier {
    /// Severity score (1..=3)
    pub fn severity(&self) -> u8 {
        match self {
            Tier::Tier1 => 1,
            Tier::Tier2 => 2,
            Tier::Tier3 => 3,
        }
    }

    /// Tier for a severity score, clamped into 1..=3
    pub fn from_severity(severity: u8) -> Self {
        match severity {
            0 | 1 => Tier::Tier1,
            2 => Tier::Tier2,
            _ => Tier::Tier3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Tier1 => "Tier 1",
            Tier::Tier2 => "Tier 2",
            Tier::Tier3 => "Tier 3",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches("Tier").trim();
        match digits {
            "1" => Ok(Tier::Tier1),
            "2" => Ok(Tier::Tier2),
            "3" => Ok(Tier::Tier3),
            _ => Err(PricingError::unknown("tier", s)),
        }
    }
}

/// Underwriting product group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductGroup {
    Specialist,
    /// Criteria-gated, residential-only line with a fixed loan structure
    Core,
}

impl ProductGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductGroup::Specialist => "Specialist",
            ProductGroup::Core => "Core",
        }
    }
}

impl fmt::Display for ProductGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductGroup {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "specialist" => Ok(ProductGroup::Specialist),
            "core" => Ok(ProductGroup::Core),
            _ => Err(PricingError::unknown("product group", s)),
        }
    }
}

/// LTV band chosen for a retention (renewal) product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RetentionBand {
    #[serde(rename = "65")]
    Ltv65,
    #[serde(rename = "75")]
    Ltv75,
}

impl RetentionBand {
    pub fn ltv_percent(&self) -> u8 {
        match self {
            RetentionBand::Ltv65 => 65,
            RetentionBand::Ltv75 => 75,
        }
    }

    /// Bands at or under 65 use the 65 table, everything else the 75 table
    pub fn from_ltv_percent(percent: f64) -> Self {
        if percent <= 65.0 {
            RetentionBand::Ltv65
        } else {
            RetentionBand::Ltv75
        }
    }
}

impl FromStr for RetentionBand {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map(RetentionBand::from_ltv_percent)
            .map_err(|_| PricingError::unknown("retention band", s))
    }
}

/// A criteria question with its option set and tier thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriteriaQuestion {
    pub id: &'static str,
    pub prompt: &'static str,
    /// Options in display order; the first is the mildest
    pub options: &'static [&'static str],
    pub tier1: &'static str,
    pub tier2: &'static str,
    /// Only residential questions reach Tier 3
    pub tier3: Option<&'static str>,
    /// Answer required for Core products (residential only)
    pub core_eligible: Option<&'static str>,
}

impl CriteriaQuestion {
    pub fn offers(&self, answer: &str) -> bool {
        self.options.contains(&answer)
    }

    /// The option shown when the question has not been answered
    pub fn default_answer(&self) -> &'static str {
        self.options.first().copied().unwrap_or(self.tier1)
    }
}

/// Selected option per question id
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriteriaAnswers {
    answers: BTreeMap<String, String>,
}

impl CriteriaAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer without validation
    pub fn set(&mut self, id: impl Into<String>, answer: impl Into<String>) {
        self.answers.insert(id.into(), answer.into());
    }

    /// Builder form of [`CriteriaAnswers::set`]
    pub fn with(mut self, id: impl Into<String>, answer: impl Into<String>) -> Self {
        self.set(id, answer);
        self
    }

    /// Record an answer after checking it against the category's catalog
    pub fn try_set(
        &mut self,
        category: PropertyCategory,
        id: &str,
        answer: &str,
    ) -> Result<(), PricingError> {
        let question = super::catalog::find_question(category, id).ok_or_else(|| {
            PricingError::UnknownQuestion {
                category: category.to_string(),
                id: id.to_string(),
            }
        })?;

        if !question.offers(answer) {
            return Err(PricingError::InvalidAnswer {
                id: id.to_string(),
                answer: answer.to_string(),
            });
        }

        self.set(id, answer);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.answers.get(id).map(String::as_str)
    }

    /// The answer for a question, falling back to its mildest option
    pub fn resolve<'a>(&'a self, question: &CriteriaQuestion) -> &'a str {
        self.get(question.id).unwrap_or(question.default_answer())
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.answers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CriteriaAnswers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut answers = CriteriaAnswers::new();
        for (id, answer) in iter {
            answers.set(id, answer);
        }
        answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_parsing() {
        assert_eq!("Semi-Commercial".parse::<PropertyCategory>().unwrap(), PropertyCategory::SemiCommercial);
        assert_eq!("Tier 3".parse::<Tier>().unwrap(), Tier::Tier3);
        assert_eq!("2".parse::<Tier>().unwrap(), Tier::Tier2);
        assert_eq!("core".parse::<ProductGroup>().unwrap(), ProductGroup::Core);
        assert_eq!("60".parse::<RetentionBand>().unwrap(), RetentionBand::Ltv65);
        assert_eq!("75".parse::<RetentionBand>().unwrap(), RetentionBand::Ltv75);

        assert!("Tier 4".parse::<Tier>().is_err());
        assert!("Industrial".parse::<PropertyCategory>().is_err());
    }

    #[test]
    fn test_available_tiers() {
        assert_eq!(PropertyCategory::Residential.available_tiers().len(), 3);
        assert_eq!(PropertyCategory::Commercial.available_tiers(), &[Tier::Tier1, Tier::Tier2]);
    }

    #[test]
    fn test_try_set_validates_against_catalog() {
        let mut answers = CriteriaAnswers::new();
        assert!(answers.try_set(PropertyCategory::Residential, "adverse", "Minor").is_ok());
        assert_eq!(answers.get("adverse"), Some("Minor"));

        let err = answers.try_set(PropertyCategory::Residential, "adverse", "Catastrophic");
        assert!(matches!(err, Err(PricingError::InvalidAnswer { .. })));

        let err = answers.try_set(PropertyCategory::Commercial, "hmo", "Yes");
        assert!(matches!(err, Err(PricingError::UnknownQuestion { .. })));
    }
}
