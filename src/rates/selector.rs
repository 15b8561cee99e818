//! Rate-table selection, LTV rules and the Core rate floor

use log::debug;

use super::tables::{RateTable, TableKey};
use super::RateCatalog;
use crate::criteria::{ProductGroup, PropertyCategory, RetentionBand, Tier};

/// Minimum rate used to size Core residential loans
pub const CORE_FLOOR_RATE: f64 = 0.055;

/// Max LTV when a (category, tier) pair has no rule
pub const DEFAULT_MAX_LTV: f64 = 0.75;

/// Pick the rate table for a category, product group and retention choice.
///
/// Core is residential-only; a Core request for any other category has no
/// table. Specialist retention falls back to the residential retention
/// table when the category has none of its own.
pub fn select_rate_table(
    catalog: &RateCatalog,
    category: PropertyCategory,
    group: ProductGroup,
    retention: Option<RetentionBand>,
) -> Option<&RateTable> {
    let table = match group {
        ProductGroup::Core => {
            if !category.is_residential() {
                debug!("Core products are not offered for {}", category);
                return None;
            }
            match retention {
                Some(band) => catalog.get(TableKey::CoreRetention(band)),
                None => catalog.get(TableKey::Core),
            }
        }
        ProductGroup::Specialist => match retention {
            Some(band) => catalog
                .get(TableKey::SpecialistRetention(band, category))
                .or_else(|| {
                    catalog.get(TableKey::SpecialistRetention(band, PropertyCategory::Residential))
                }),
            None => catalog
                .get(TableKey::Specialist(category))
                .or_else(|| catalog.get(TableKey::Specialist(PropertyCategory::Residential))),
        },
    };

    if table.is_none() {
        debug!("no {} rate table for {} (retention {:?})", group, category, retention);
    }
    table
}

/// Maximum LTV fraction allowed for a category at a tier
pub fn max_ltv(category: PropertyCategory, tier: Tier) -> f64 {
    match (category, tier) {
        (PropertyCategory::Residential, Tier::Tier1) => 0.75,
        (PropertyCategory::Residential, Tier::Tier2) => 0.70,
        (PropertyCategory::Residential, Tier::Tier3) => 0.65,
        (PropertyCategory::SemiCommercial | PropertyCategory::Commercial, Tier::Tier1) => 0.70,
        (PropertyCategory::SemiCommercial | PropertyCategory::Commercial, Tier::Tier2) => 0.65,
        _ => DEFAULT_MAX_LTV,
    }
}

/// Clamp to the Core floor for Core residential products; identity otherwise
pub fn apply_floor_rate(rate: f64, group: ProductGroup, category: PropertyCategory) -> f64 {
    if group == ProductGroup::Core && category.is_residential() {
        rate.max(CORE_FLOOR_RATE)
    } else {
        rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::FeeColumn;

    #[test]
    fn test_core_only_for_residential() {
        let catalog = RateCatalog::default_tables();
        for band in [None, Some(RetentionBand::Ltv65), Some(RetentionBand::Ltv75)] {
            assert!(select_rate_table(&catalog, PropertyCategory::Commercial, ProductGroup::Core, band).is_none());
            assert!(select_rate_table(&catalog, PropertyCategory::SemiCommercial, ProductGroup::Core, band).is_none());
            assert!(select_rate_table(&catalog, PropertyCategory::Residential, ProductGroup::Core, band).is_some());
        }
    }

    #[test]
    fn test_core_retention_band_selects_table() {
        let catalog = RateCatalog::default_tables();
        let two = FeeColumn::from_percent(1.5).unwrap();
        let t65 = select_rate_table(&catalog, PropertyCategory::Residential, ProductGroup::Core, Some(RetentionBand::Ltv65)).unwrap();
        let t75 = select_rate_table(&catalog, PropertyCategory::Residential, ProductGroup::Core, Some(RetentionBand::Ltv75)).unwrap();
        assert_eq!(t65.rate(Tier::Tier1, "2yr Fix", two), Some(0.0569));
        assert_eq!(t75.rate(Tier::Tier1, "2yr Fix", two), Some(0.0579));
    }

    #[test]
    fn test_specialist_tables_by_category() {
        let catalog = RateCatalog::default_tables();
        let six = FeeColumn::from_percent(6.0).unwrap();
        let rate = |category| {
            select_rate_table(&catalog, category, ProductGroup::Specialist, None)
                .and_then(|t| t.rate(Tier::Tier1, "2yr Fix", six))
        };
        assert_eq!(rate(PropertyCategory::Residential), Some(0.0449));
        assert_eq!(rate(PropertyCategory::SemiCommercial), Some(0.0549));
        assert_eq!(rate(PropertyCategory::Commercial), Some(0.0599));
    }

    #[test]
    fn test_specialist_retention_falls_back_to_residential() {
        let catalog = RateCatalog::default_tables();
        let band = Some(RetentionBand::Ltv65);
        let commercial = select_rate_table(&catalog, PropertyCategory::Commercial, ProductGroup::Specialist, band);
        let residential = select_rate_table(&catalog, PropertyCategory::Residential, ProductGroup::Specialist, band);
        assert_eq!(commercial, residential);

        let semi = select_rate_table(&catalog, PropertyCategory::SemiCommercial, ProductGroup::Specialist, band);
        assert_ne!(semi, residential);
    }

    #[test]
    fn test_specialist_falls_back_to_residential_table() {
        let mut catalog = RateCatalog::empty();
        catalog.insert(TableKey::Specialist(PropertyCategory::Residential), crate::rates::tables::specialist_residential());
        assert!(select_rate_table(&catalog, PropertyCategory::Commercial, ProductGroup::Specialist, None).is_some());
        assert!(select_rate_table(&catalog, PropertyCategory::Residential, ProductGroup::Core, None).is_none());
    }

    #[test]
    fn test_max_ltv_rules() {
        assert_eq!(max_ltv(PropertyCategory::Residential, Tier::Tier1), 0.75);
        assert_eq!(max_ltv(PropertyCategory::Residential, Tier::Tier3), 0.65);
        assert_eq!(max_ltv(PropertyCategory::SemiCommercial, Tier::Tier1), 0.70);
        assert_eq!(max_ltv(PropertyCategory::Commercial, Tier::Tier2), 0.65);
        assert_eq!(max_ltv(PropertyCategory::Commercial, Tier::Tier3), DEFAULT_MAX_LTV);
    }

    #[test]
    fn test_floor_rate_only_for_core_residential() {
        assert_eq!(apply_floor_rate(0.05, ProductGroup::Core, PropertyCategory::Residential), CORE_FLOOR_RATE);
        assert_eq!(apply_floor_rate(0.06, ProductGroup::Core, PropertyCategory::Residential), 0.06);
        assert_eq!(apply_floor_rate(0.05, ProductGroup::Specialist, PropertyCategory::Residential), 0.05);
        assert_eq!(apply_floor_rate(0.05, ProductGroup::Core, PropertyCategory::Commercial), 0.05);
    }
}
