//! Loan optimizer
//!
//! Sizes the gross loan for one fee column and picks the rolled-months /
//! deferred-rate structure that maximises net proceeds.

use log::{debug, warn};

use super::context::{ColumnContext, LOAN_TOLERANCE};
use super::inputs::{ColumnRate, LoanInputs, Selections};
use super::result::{percent_text, tracker_text, LoanResult, StructureSource, Trial};
use super::search::{SearchBounds, SearchGrid};
use crate::rates::{FeeColumn, Limits};

/// Sizes loans against a set of lending limits
#[derive(Debug, Clone, Default)]
pub struct LoanOptimizer {
    limits: Limits,
    grid: SearchGrid,
}

impl LoanOptimizer {
    pub fn new(limits: Limits, grid: SearchGrid) -> Self {
        Self { limits, grid }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn grid(&self) -> &SearchGrid {
        &self.grid
    }

    /// Size the loan for one fee column.
    ///
    /// Returns `None` when the column has no rate (neither table nor override).
    pub fn compute_column(
        &self,
        column: FeeColumn,
        rate: ColumnRate,
        inputs: &LoanInputs,
        selections: &Selections,
    ) -> Option<LoanResult> {
        let Some(ctx) = ColumnContext::new(column, rate, inputs, &self.limits, selections) else {
            debug!("{} has no rate in the {} column", selections.label(), column);
            return None;
        };

        let (trial, structure) = self.choose_structure(&ctx, inputs, selections);
        Some(self.to_result(column, &ctx, trial, structure, inputs, selections))
    }

    fn choose_structure(
        &self,
        ctx: &ColumnContext,
        inputs: &LoanInputs,
        selections: &Selections,
    ) -> (Trial, StructureSource) {
        if selections.is_core_residential() {
            return (ctx.evaluate(0, 0.0), StructureSource::Fixed);
        }

        if inputs.is_manual() {
            let rolled = inputs
                .manual_rolled_months
                .unwrap_or(0)
                .min(self.limits.max_rolled_months);
            let deferred = inputs
                .manual_deferred_rate
                .filter(|d| d.is_finite())
                .unwrap_or(0.0)
                .clamp(0.0, ctx.deferred_cap.max(0.0));

            let trial = ctx.evaluate(rolled, deferred);
            if trial.gross.is_finite() {
                return (trial, StructureSource::Manual);
            }
            warn!(
                "{}: manual structure ({} months, {}) gave no finite loan, using (0, 0)",
                selections.label(),
                rolled,
                deferred
            );
            return (ctx.evaluate(0, 0.0), StructureSource::ManualFallback);
        }

        let bounds = SearchBounds {
            max_rolled_months: self.limits.max_rolled_months.min(ctx.term_months),
            max_deferred_rate: ctx.deferred_cap,
        };
        match self.grid.search(bounds, |r, d| ctx.evaluate(r, d)) {
            Some(best) => (best, StructureSource::Optimized),
            None => {
                warn!("{}: no structure gave a finite net, using (0, 0)", selections.label());
                (ctx.evaluate(0, 0.0), StructureSource::SearchFallback)
            }
        }
    }

    fn to_result(
        &self,
        column: FeeColumn,
        ctx: &ColumnContext,
        trial: Trial,
        structure: StructureSource,
        inputs: &LoanInputs,
        selections: &Selections,
    ) -> LoanResult {
        let gross = trial.gross;
        // Pay rate less base rate: the margin net of any deferral
        let pay_rate_text = if ctx.is_tracker {
            tracker_text(trial.pay_rate - self.limits.standard_base_rate)
        } else {
            percent_text(trial.pay_rate)
        };

        LoanResult {
            fee_column: column,
            product_label: selections.label(),
            product_type: selections.product.clone(),
            full_rate_text: percent_text(ctx.display_rate),
            pay_rate_text,
            rate_used: ctx.base_rate,
            is_rate_overridden: ctx.is_rate_overridden,
            gross,
            net: trial.net,
            fee_amount: trial.fee_amount,
            rolled_amount: trial.rolled_amount,
            deferred_amount: trial.deferred_amount,
            ltv: trial.ltv,
            rolled_months: trial.rolled_months,
            deferred_rate: trial.deferred_rate,
            pay_rate: trial.pay_rate,
            direct_debit: gross * trial.pay_rate / 12.0,
            dd_start_month: trial.rolled_months + 1,
            max_ltv_rule: ctx.max_ltv,
            term_months: ctx.term_months,
            below_min: gross > 0.0 && gross < self.limits.min_loan - LOAN_TOLERANCE,
            hit_max_cap: (gross - self.limits.max_loan).abs() < LOAN_TOLERANCE,
            is_manual_override: inputs.is_manual(),
            structure,
            sized_gross: trial.sized_gross,
            proc_fee: trial.proc_fee,
            broker_fee: trial.broker_fee,
        }
    }
}
