//! Per-column derived quantities and trial evaluation

use super::inputs::{BrokerFee, ColumnRate, LoanInputs, LoanType, Selections};
use super::result::Trial;
use crate::rates::{apply_floor_rate, max_ltv, FeeColumn, Limits};

/// Floor on the stressed interest differential
const MIN_STRESS_DIFFERENTIAL: f64 = 1e-6;

/// Smallest usable denominator when inverting net to gross
const MIN_NET_DENOMINATOR: f64 = 1e-7;

/// Tolerance on the minimum/maximum loan comparisons
pub(crate) const LOAN_TOLERANCE: f64 = 1e-6;

/// Everything about a column that does not depend on the trial structure
#[derive(Debug, Clone)]
pub(crate) struct ColumnContext {
    pub fee_fraction: f64,
    pub min_icr: f64,
    pub max_ltv: f64,
    pub ltv_cap: f64,
    pub term_months: u32,
    pub deferred_cap: f64,
    pub is_tracker: bool,

    /// Table rate or override (tracker margin for trackers)
    pub base_rate: f64,
    pub is_rate_overridden: bool,
    /// Advertised rate
    pub display_rate: f64,
    /// Rates used to size the gross (floored for Core residential)
    pub display_for_gross: f64,
    pub stress_for_gross: f64,

    pub property_value: Option<f64>,
    pub monthly_rent: Option<f64>,
    pub specific_net: Option<f64>,
    pub min_loan: f64,
    pub max_loan: f64,
    pub proc_fee_fraction: f64,
    pub broker_fee: BrokerFee,
}

impl ColumnContext {
    /// `None` when the column has neither a table rate nor an override
    pub fn new(
        column: FeeColumn,
        rate: ColumnRate,
        inputs: &LoanInputs,
        limits: &Limits,
        selections: &Selections,
    ) -> Option<Self> {
        let rate_override = inputs.rate_overrides.get(&column).copied();
        let base_rate = rate_override.or(rate.base_rate)?;

        let property_value = inputs.known_property_value();
        let max_ltv = max_ltv(selections.category, selections.tier);

        let mut ltv_cap = property_value
            .map(|pv| (max_ltv * pv).round())
            .unwrap_or(f64::INFINITY);

        match inputs.loan_type {
            LoanType::MaxLtv { ltv: Some(ltv) } => {
                if let Some(pv) = property_value {
                    ltv_cap = ltv_cap.min(pv * ltv);
                }
            }
            LoanType::SpecificGross { gross } if gross > 0.0 => {
                ltv_cap = ltv_cap.min(gross);
            }
            _ => {}
        }

        let specific_net = match inputs.loan_type {
            LoanType::SpecificNet { net } if net.is_finite() => Some(net),
            _ => None,
        };

        let is_tracker = rate.is_margin;
        let (display_rate, stress_rate) = if is_tracker {
            (
                base_rate + limits.standard_base_rate,
                base_rate + limits.stress_base_rate,
            )
        } else {
            (base_rate, base_rate)
        };

        Some(Self {
            fee_fraction: inputs.fee_fraction(column),
            min_icr: limits.min_icr(selections.is_fixed_rate()),
            max_ltv,
            ltv_cap,
            term_months: limits.term_months(&selections.product),
            deferred_cap: limits.deferred_cap(is_tracker),
            is_tracker,
            base_rate,
            is_rate_overridden: rate_override.is_some(),
            display_rate,
            display_for_gross: apply_floor_rate(display_rate, selections.group, selections.category),
            stress_for_gross: apply_floor_rate(stress_rate, selections.group, selections.category),
            property_value,
            monthly_rent: inputs.known_monthly_rent(),
            specific_net,
            min_loan: limits.min_loan,
            max_loan: limits.max_loan,
            proc_fee_fraction: inputs.proc_fee_pct / 100.0,
            broker_fee: inputs.broker_fee,
        })
    }

    /// Rate paid monthly once `deferred_rate` is deferred
    pub fn pay_rate(&self, deferred_rate: f64) -> f64 {
        (self.display_for_gross - deferred_rate).max(0.0)
    }

    /// Largest gross the rent supports under the ICR stress
    fn rent_cap(&self, rolled_months: u32, deferred_rate: f64) -> f64 {
        let Some(rent) = self.monthly_rent else {
            return f64::INFINITY;
        };
        let term = self.term_months as f64;
        let months_left = self.term_months.saturating_sub(rolled_months).max(1) as f64;
        let stress_adj = (self.stress_for_gross - deferred_rate).max(MIN_STRESS_DIFFERENTIAL);

        (rent * term) / (self.min_icr * (stress_adj / 12.0) * months_left)
    }

    /// Gross that nets the requested amount; infinite when unreachable
    fn net_target_cap(&self, rolled_months: u32, deferred_rate: f64) -> f64 {
        let Some(net) = self.specific_net else {
            return f64::INFINITY;
        };
        if self.fee_fraction >= 1.0 {
            return f64::INFINITY;
        }

        let denom = 1.0
            - self.fee_fraction
            - (self.pay_rate(deferred_rate) / 12.0) * rolled_months as f64
            - (deferred_rate / 12.0) * self.term_months as f64;

        if denom > MIN_NET_DENOMINATOR {
            net / denom
        } else {
            f64::INFINITY
        }
    }

    /// Size the loan for one structure
    pub fn evaluate(&self, rolled_months: u32, deferred_rate: f64) -> Trial {
        let sized_gross = self
            .ltv_cap
            .min(self.rent_cap(rolled_months, deferred_rate))
            .min(self.max_loan)
            .min(self.net_target_cap(rolled_months, deferred_rate));

        let gross = if sized_gross < self.min_loan - LOAN_TOLERANCE {
            0.0
        } else {
            sized_gross
        };

        let pay_rate = self.pay_rate(deferred_rate);
        let fee_amount = gross * self.fee_fraction;
        let rolled_amount = gross * (pay_rate / 12.0) * rolled_months as f64;
        let deferred_amount = gross * (deferred_rate / 12.0) * self.term_months as f64;

        Trial {
            rolled_months,
            deferred_rate,
            sized_gross,
            gross,
            net: gross - fee_amount - rolled_amount - deferred_amount,
            fee_amount,
            rolled_amount,
            deferred_amount,
            ltv: self.property_value.map(|pv| gross / pv),
            pay_rate,
            proc_fee: gross * self.proc_fee_fraction,
            broker_fee: self.broker_fee.amount(gross),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{ProductGroup, PropertyCategory, Tier};
    use approx::assert_relative_eq;

    fn selections(group: ProductGroup, product: &str) -> Selections {
        Selections {
            category: PropertyCategory::Residential,
            group,
            tier: Tier::Tier1,
            product: product.to_string(),
        }
    }

    fn two_pct() -> FeeColumn {
        FeeColumn::from_percent(2.0).unwrap()
    }

    fn fixed(rate: f64) -> ColumnRate {
        ColumnRate { base_rate: Some(rate), is_margin: false }
    }

    #[test]
    fn test_no_rate_no_context() {
        let inputs = LoanInputs::new(300_000.0, 1_500.0);
        let limits = Limits::default();
        let sel = selections(ProductGroup::Specialist, "2yr Fix");
        assert!(ColumnContext::new(two_pct(), ColumnRate::default(), &inputs, &limits, &sel).is_none());

        let mut overridden = inputs.clone();
        overridden.rate_overrides.insert(two_pct(), 0.06);
        let ctx = ColumnContext::new(two_pct(), ColumnRate::default(), &overridden, &limits, &sel).unwrap();
        assert!(ctx.is_rate_overridden);
        assert_eq!(ctx.base_rate, 0.06);
    }

    #[test]
    fn test_rent_cap_formula() {
        let limits = Limits::default();
        let sel = selections(ProductGroup::Specialist, "2yr Fix");

        // 1500 * 24 / (1.25 * 0.055/12 * 24) = 261,818.18
        let wide = LoanInputs::new(1_000_000.0, 1_500.0);
        let ctx = ColumnContext::new(two_pct(), fixed(0.055), &wide, &limits, &sel).unwrap();
        let trial = ctx.evaluate(0, 0.0);
        assert_relative_eq!(trial.sized_gross, 1_500.0 / (1.25 * 0.055 / 12.0), epsilon = 1e-6);

        // Rolling months shrinks the denominator's months left
        let rolled = ctx.evaluate(6, 0.0);
        assert!(rolled.sized_gross > trial.sized_gross);

        // At 300k the 75% LTV cap binds first
        let inputs = LoanInputs::new(300_000.0, 1_500.0);
        let capped = ColumnContext::new(two_pct(), fixed(0.055), &inputs, &limits, &sel).unwrap();
        assert_eq!(capped.ltv_cap, 225_000.0);
        assert_relative_eq!(capped.evaluate(0, 0.0).gross, 225_000.0);
    }

    #[test]
    fn test_tracker_rates_add_base_rate() {
        let inputs = LoanInputs::new(300_000.0, 1_500.0);
        let limits = Limits::default();
        let rate = ColumnRate { base_rate: Some(0.0129), is_margin: true };
        let ctx = ColumnContext::new(two_pct(), rate, &inputs, &limits, &selections(ProductGroup::Specialist, "2yr Tracker")).unwrap();

        assert_relative_eq!(ctx.display_rate, 0.0129 + limits.standard_base_rate);
        assert_relative_eq!(ctx.stress_for_gross, 0.0129 + limits.stress_base_rate);
        assert_eq!(ctx.min_icr, limits.min_icr_tracker);
        assert_eq!(ctx.deferred_cap, limits.max_deferred_tracker);
    }

    #[test]
    fn test_core_floor_only_affects_sizing_rates() {
        let inputs = LoanInputs::new(300_000.0, 1_500.0);
        let limits = Limits::default();
        let ctx = ColumnContext::new(two_pct(), fixed(0.05), &inputs, &limits, &selections(ProductGroup::Core, "2yr Fix")).unwrap();

        assert_eq!(ctx.display_rate, 0.05);
        assert_eq!(ctx.display_for_gross, 0.055);
        assert_eq!(ctx.stress_for_gross, 0.055);
    }

    #[test]
    fn test_cap_tightening_by_loan_type() {
        let limits = Limits::default();
        let sel = selections(ProductGroup::Specialist, "2yr Fix");

        let ltv = LoanInputs::new(300_000.0, 0.0).with_loan_type(LoanType::MaxLtv { ltv: Some(0.6) });
        let ctx = ColumnContext::new(two_pct(), fixed(0.055), &ltv, &limits, &sel).unwrap();
        assert_relative_eq!(ctx.ltv_cap, 180_000.0);

        // A user LTV above the rule never widens the cap
        let wide = LoanInputs::new(300_000.0, 0.0).with_loan_type(LoanType::MaxLtv { ltv: Some(0.9) });
        let ctx = ColumnContext::new(two_pct(), fixed(0.055), &wide, &limits, &sel).unwrap();
        assert_relative_eq!(ctx.ltv_cap, 225_000.0);

        let gross = LoanInputs::new(300_000.0, 0.0).with_loan_type(LoanType::SpecificGross { gross: 200_000.0 });
        let ctx = ColumnContext::new(two_pct(), fixed(0.055), &gross, &limits, &sel).unwrap();
        assert_relative_eq!(ctx.ltv_cap, 200_000.0);

        let big = LoanInputs::new(300_000.0, 0.0).with_loan_type(LoanType::SpecificGross { gross: 400_000.0 });
        let ctx = ColumnContext::new(two_pct(), fixed(0.055), &big, &limits, &sel).unwrap();
        assert_relative_eq!(ctx.ltv_cap, 225_000.0);
    }

    #[test]
    fn test_specific_net_inversion() {
        let limits = Limits::default();
        let sel = selections(ProductGroup::Specialist, "2yr Fix");
        let inputs = LoanInputs::new(300_000.0, 0.0).with_loan_type(LoanType::SpecificNet { net: 180_000.0 });
        let ctx = ColumnContext::new(two_pct(), fixed(0.055), &inputs, &limits, &sel).unwrap();

        let trial = ctx.evaluate(3, 0.01);
        assert_relative_eq!(trial.net, 180_000.0, epsilon = 1e-6);

        // A structure whose costs exceed the advance leaves the other caps binding
        let costly = ctx.evaluate(0, 0.6);
        assert_relative_eq!(costly.gross, 225_000.0);
    }

    #[test]
    fn test_under_minimum_loan_is_zeroed() {
        let limits = Limits::default();
        let inputs = LoanInputs::new(150_000.0, 0.0);
        let ctx = ColumnContext::new(two_pct(), fixed(0.055), &inputs, &limits, &selections(ProductGroup::Specialist, "2yr Fix")).unwrap();

        let trial = ctx.evaluate(0, 0.0);
        assert_relative_eq!(trial.sized_gross, 112_500.0);
        assert_eq!(trial.gross, 0.0);
        assert_eq!(trial.net, 0.0);
    }

    #[test]
    fn test_unknown_property_value() {
        let limits = Limits::default();
        let inputs = LoanInputs { monthly_rent: Some(1_500.0), ..LoanInputs::default() };
        let ctx = ColumnContext::new(two_pct(), fixed(0.055), &inputs, &limits, &selections(ProductGroup::Specialist, "2yr Fix")).unwrap();

        assert!(ctx.ltv_cap.is_infinite());
        let trial = ctx.evaluate(0, 0.0);
        assert!(trial.ltv.is_none());
        assert!(trial.gross.is_finite());
    }
}
