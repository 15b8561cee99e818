//! Memoized quoting for interactive use
//!
//! Every fee-column result is cached under its full input tuple, so
//! re-pricing after an unrelated change skips the structure search.

use log::{debug, trace, warn};
use serde::Serialize;
use std::collections::HashMap;

use crate::criteria::RetentionBand;
use crate::optimizer::{ColumnRate, LoanInputs, LoanResult, Selections};
use crate::quote::{Quote, QuoteRequest, QuoteRunner};
use crate::rates::FeeColumn;

/// Cache key for one column's result
#[derive(Serialize)]
struct ColumnKey<'a> {
    selections: &'a Selections,
    retention: Option<RetentionBand>,
    fee_column: FeeColumn,
    rate: ColumnRate,
    inputs: &'a LoanInputs,
}

/// Cache hit/miss counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Quote runner with a per-column result cache
#[derive(Debug, Clone)]
pub struct QuoteSession {
    runner: QuoteRunner,
    cache: HashMap<String, Option<LoanResult>>,
    hits: u64,
    misses: u64,
}

impl QuoteSession {
    pub fn new(runner: QuoteRunner) -> Self {
        Self {
            runner,
            cache: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn runner(&self) -> &QuoteRunner {
        &self.runner
    }

    /// Price a request, reusing cached column results
    pub fn quote(&mut self, request: &QuoteRequest) -> Quote {
        let Self {
            runner,
            cache,
            hits,
            misses,
        } = self;
        let runner: &QuoteRunner = runner;

        runner.run_with(request, |column, rate, selections| {
            // serde_json writes NaN and infinities as null, which would collide with None
            let finite_rate = rate.base_rate.map_or(true, f64::is_finite);
            if request.inputs.has_non_finite() || !finite_rate {
                debug!("non-finite input for {} column {}, pricing uncached", selections.label(), column);
                return runner.optimizer().compute_column(column, rate, &request.inputs, selections);
            }

            let key = ColumnKey {
                selections,
                retention: request.retention,
                fee_column: column,
                rate,
                inputs: &request.inputs,
            };
            let key = match serde_json::to_string(&key) {
                Ok(key) => key,
                Err(e) => {
                    warn!("cannot build cache key, pricing uncached: {}", e);
                    return runner.optimizer().compute_column(column, rate, &request.inputs, selections);
                }
            };

            if let Some(result) = cache.get(&key) {
                *hits += 1;
                trace!("cache hit for {} column {}", selections.label(), column);
                return result.clone();
            }

            *misses += 1;
            let result = runner.optimizer().compute_column(column, rate, &request.inputs, selections);
            cache.insert(key, result.clone());
            result
        })
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
        }
    }

    /// Drop cached results and reset the counters
    pub fn clear(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

impl Default for QuoteSession {
    fn default() -> Self {
        Self::new(QuoteRunner::new())
    }
}
