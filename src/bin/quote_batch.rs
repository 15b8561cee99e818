//! Price a file of quote scenarios in parallel
//!
//! Input CSV columns:
//! `id,category,group,product,retention,property_value,monthly_rent,answers,loan_type,loan_amount`
//! where `answers` is `id=option` pairs separated by `;` and `loan_type`
//! is one of max, ltv, gross, net (`loan_amount` gives its target).
//!
//! Writes one output row per scenario and fee column.

use anyhow::{bail, Context, Result};
use btl_pricing::{
    CriteriaAnswers, Limits, LoanInputs, LoanType, ProductGroup, PropertyCategory, Quote, QuoteRequest,
    QuoteRunner, RateCatalog, RetentionBand,
};
use clap::Parser;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Parser)]
#[command(name = "quote_batch", about = "Price a CSV of buy-to-let scenarios")]
struct Args {
    /// Scenario CSV
    input: PathBuf,

    /// Output CSV
    #[arg(short, long, default_value = "quote_batch_output.csv")]
    output: PathBuf,

    /// Limits JSON overriding the house defaults
    #[arg(long)]
    limits: Option<PathBuf>,

    /// Rate file CSV replacing the built-in tables
    #[arg(long)]
    rates: Option<PathBuf>,
}

/// Raw scenario row
#[derive(Debug, Deserialize)]
struct ScenarioRow {
    id: String,
    category: String,
    group: String,
    product: String,
    #[serde(default)]
    retention: Option<String>,
    #[serde(default)]
    property_value: Option<f64>,
    #[serde(default)]
    monthly_rent: Option<f64>,
    #[serde(default)]
    answers: Option<String>,
    #[serde(default)]
    loan_type: Option<String>,
    #[serde(default)]
    loan_amount: Option<f64>,
}

impl ScenarioRow {
    fn to_request(&self) -> Result<QuoteRequest> {
        let category: PropertyCategory = self.category.parse()?;

        let mut answers = CriteriaAnswers::new();
        for pair in self.answers.as_deref().unwrap_or("").split(';').filter(|p| !p.trim().is_empty()) {
            let Some((id, answer)) = pair.split_once('=') else {
                bail!("scenario {}: answer '{}' is not id=option", self.id, pair);
            };
            answers.try_set(category, id.trim(), answer.trim())?;
        }

        let loan_type = match (self.loan_type.as_deref().map(str::trim), self.loan_amount) {
            (None | Some("") | Some("max"), _) => LoanType::MaxOptimumGross,
            (Some("ltv"), ltv) => LoanType::MaxLtv { ltv },
            (Some("gross"), Some(gross)) => LoanType::SpecificGross { gross },
            (Some("net"), Some(net)) => LoanType::SpecificNet { net },
            (Some(other), _) => bail!("scenario {}: loan type '{}' needs a valid loan_amount", self.id, other),
        };

        let inputs = LoanInputs {
            property_value: self.property_value,
            monthly_rent: self.monthly_rent,
            loan_type,
            ..LoanInputs::default()
        };

        Ok(QuoteRequest {
            category,
            answers,
            group: self.group.parse::<ProductGroup>()?,
            retention: match self.retention.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(band) => Some(band.parse::<RetentionBand>()?),
            },
            product: self.product.trim().to_string(),
            inputs,
        })
    }
}

/// One output row per scenario and fee column
#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    id: &'a str,
    tier: String,
    core_eligible: bool,
    fee_column: String,
    available: bool,
    full_rate: String,
    pay_rate: String,
    gross: f64,
    net: f64,
    ltv: Option<f64>,
    rolled_months: u32,
    deferred_rate: f64,
    direct_debit: f64,
    below_min: bool,
    hit_max_cap: bool,
}

fn output_rows<'a>(id: &'a str, quote: &Quote) -> Vec<OutputRow<'a>> {
    quote
        .columns
        .iter()
        .map(|column| {
            let r = column.result.as_ref();
            OutputRow {
                id,
                tier: quote.tier.to_string(),
                core_eligible: quote.core_eligible,
                fee_column: column.fee_column.to_string(),
                available: r.is_some(),
                full_rate: r.map(|r| r.full_rate_text.clone()).unwrap_or_default(),
                pay_rate: r.map(|r| r.pay_rate_text.clone()).unwrap_or_default(),
                gross: r.map_or(0.0, |r| r.gross),
                net: r.map_or(0.0, |r| r.net),
                ltv: r.and_then(|r| r.ltv),
                rolled_months: r.map_or(0, |r| r.rolled_months),
                deferred_rate: r.map_or(0.0, |r| r.deferred_rate),
                direct_debit: r.map_or(0.0, |r| r.direct_debit),
                below_min: r.is_some_and(|r| r.below_min),
                hit_max_cap: r.is_some_and(|r| r.hit_max_cap),
            }
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start = Instant::now();
    let limits = match &args.limits {
        Some(path) => Limits::from_json_path(path).with_context(|| format!("loading {}", path.display()))?,
        None => Limits::default(),
    };
    let catalog = match &args.rates {
        Some(path) => RateCatalog::from_csv_path(path).with_context(|| format!("loading {}", path.display()))?,
        None => RateCatalog::default_tables(),
    };
    let runner = QuoteRunner::with_catalog(catalog, limits);

    println!("Loading scenarios from {}...", args.input.display());
    let mut reader = csv::Reader::from_path(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;
    let rows = reader
        .deserialize::<ScenarioRow>()
        .collect::<Result<Vec<_>, _>>()
        .context("reading scenarios")?;
    let requests = rows
        .iter()
        .map(|row| row.to_request().map(|req| (row.id.as_str(), req)))
        .collect::<Result<Vec<_>>>()?;
    println!("Loaded {} scenarios in {:?}", requests.len(), start.elapsed());

    let price_start = Instant::now();
    let quotes: Vec<(&str, Quote)> = requests
        .par_iter()
        .map(|(id, request)| (*id, runner.run(request)))
        .collect();
    println!("Priced in {:?}", price_start.elapsed());

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    let mut written = 0usize;
    for (id, quote) in &quotes {
        for row in output_rows(id, quote) {
            writer.serialize(row)?;
            written += 1;
        }
    }
    writer.flush()?;

    let priced = quotes.iter().filter(|(_, q)| q.available().next().is_some()).count();
    println!("\nBatch Summary:");
    println!("  Scenarios:         {}", quotes.len());
    println!("  With a product:    {}", priced);
    println!("  Rows written:      {} -> {}", written, args.output.display());
    println!("\nTotal time: {:?}", start.elapsed());

    Ok(())
}
