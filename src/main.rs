//! BTL Quote CLI
//!
//! Prices one buy-to-let request across every fee column

use anyhow::{bail, Context, Result};
use btl_pricing::criteria::{criteria_for, CriteriaAnswers};
use btl_pricing::optimizer::{percent_text, BrokerFee};
use btl_pricing::{
    Limits, LoanInputs, LoanType, ProductGroup, PropertyCategory, Quote, QuoteRequest, QuoteRunner,
    RateCatalog, RetentionBand,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LoanKind {
    /// Largest gross the rules allow
    Max,
    /// Largest gross up to --ltv
    Ltv,
    /// A specific gross (--gross)
    Gross,
    /// Gross sized to reach a specific net (--net)
    Net,
}

#[derive(Debug, Parser)]
#[command(name = "btl-quote", version, about = "Buy-to-let loan quote across fee columns")]
struct Cli {
    /// Property category (Residential, Semi-Commercial, Commercial)
    #[arg(short, long, default_value = "Residential")]
    category: PropertyCategory,

    /// Product group (Specialist, Core)
    #[arg(short, long, default_value = "Specialist")]
    group: ProductGroup,

    /// Product name
    #[arg(short, long, default_value = "2yr Fix")]
    product: String,

    /// Retention LTV band (65 or 75); omit for standard products
    #[arg(long)]
    retention: Option<RetentionBand>,

    /// Criteria answer as id=option (repeatable)
    #[arg(short, long = "answer", value_parser = parse_answer)]
    answers: Vec<(String, String)>,

    /// Property value
    #[arg(long)]
    property_value: Option<f64>,

    /// Monthly rent
    #[arg(long)]
    rent: Option<f64>,

    #[arg(long, value_enum, default_value_t = LoanKind::Max)]
    loan_type: LoanKind,

    /// Target LTV fraction for --loan-type ltv
    #[arg(long)]
    ltv: Option<f64>,

    /// Requested gross for --loan-type gross
    #[arg(long)]
    gross: Option<f64>,

    /// Requested net for --loan-type net
    #[arg(long)]
    net: Option<f64>,

    /// Manual rolled months
    #[arg(long)]
    rolled: Option<u32>,

    /// Manual deferred rate (decimal)
    #[arg(long)]
    deferred: Option<f64>,

    /// Procuration fee percentage
    #[arg(long, default_value_t = 0.0)]
    proc_fee: f64,

    /// Broker fee percentage
    #[arg(long, conflicts_with = "broker_flat")]
    broker_pct: Option<f64>,

    /// Flat broker fee
    #[arg(long)]
    broker_flat: Option<f64>,

    /// Limits JSON overriding the house defaults
    #[arg(long)]
    limits: Option<PathBuf>,

    /// Rate file CSV replacing the built-in tables
    #[arg(long)]
    rates: Option<PathBuf>,

    /// Print the quote as JSON
    #[arg(long)]
    json: bool,

    /// List the criteria questions for the category and exit
    #[arg(long)]
    list_criteria: bool,
}

fn parse_answer(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(id, answer)| (id.trim().to_string(), answer.trim().to_string()))
        .ok_or_else(|| format!("expected id=option, got '{}'", s))
}

impl Cli {
    fn loan_type(&self) -> Result<LoanType> {
        Ok(match self.loan_type {
            LoanKind::Max => LoanType::MaxOptimumGross,
            LoanKind::Ltv => LoanType::MaxLtv { ltv: self.ltv },
            LoanKind::Gross => match self.gross {
                Some(gross) => LoanType::SpecificGross { gross },
                None => bail!("--loan-type gross needs --gross"),
            },
            LoanKind::Net => match self.net {
                Some(net) => LoanType::SpecificNet { net },
                None => bail!("--loan-type net needs --net"),
            },
        })
    }

    fn answers(&self) -> Result<CriteriaAnswers> {
        let mut answers = CriteriaAnswers::new();
        for (id, answer) in &self.answers {
            answers.try_set(self.category, id, answer)?;
        }
        Ok(answers)
    }

    fn inputs(&self) -> Result<LoanInputs> {
        let broker_fee = match (self.broker_pct, self.broker_flat) {
            (Some(pct), _) => BrokerFee::Percent(pct),
            (None, Some(flat)) => BrokerFee::Flat(flat),
            (None, None) => BrokerFee::None,
        };
        Ok(LoanInputs {
            property_value: self.property_value,
            monthly_rent: self.rent,
            loan_type: self.loan_type()?,
            manual_rolled_months: self.rolled,
            manual_deferred_rate: self.deferred,
            proc_fee_pct: self.proc_fee,
            broker_fee,
            ..LoanInputs::default()
        })
    }

    fn runner(&self) -> Result<QuoteRunner> {
        let limits = match &self.limits {
            Some(path) => Limits::from_json_path(path)
                .with_context(|| format!("loading limits from {}", path.display()))?,
            None => Limits::default(),
        };
        let catalog = match &self.rates {
            Some(path) => RateCatalog::from_csv_path(path)
                .with_context(|| format!("loading rates from {}", path.display()))?,
            None => RateCatalog::default_tables(),
        };
        Ok(QuoteRunner::with_catalog(catalog, limits))
    }
}

fn print_criteria(category: PropertyCategory) {
    println!("{} criteria:", category);
    for question in criteria_for(category) {
        println!("  {:<20} {} [{}]", question.id, question.prompt, question.options.join(" / "));
    }
}

fn print_quote(request: &QuoteRequest, quote: &Quote) {
    println!("BTL Quote");
    println!("=========\n");
    println!("Category:      {}", request.category);
    println!("Product:       {} {}", request.group, request.product);
    println!("Tier:          {}", quote.tier);
    println!("Core eligible: {}", if quote.core_eligible { "yes" } else { "no" });
    println!("Max LTV:       {}", percent_text(quote.max_ltv));
    println!();

    if !quote.has_rate_table {
        println!("No rate table for this selection.");
        return;
    }

    println!(
        "{:>6} {:>8} {:>14} {:>14} {:>14} {:>7} {:>6} {:>8} {:>12} {:>10}",
        "Fee", "Rate", "Pay Rate", "Gross", "Net", "LTV", "Roll", "Defer", "DD", "Flags"
    );
    println!("{}", "-".repeat(110));

    for column in &quote.columns {
        let Some(r) = &column.result else {
            println!("{:>6} {:>8}", format!("{}%", column.fee_column), "n/a");
            continue;
        };
        let mut flags = Vec::new();
        if r.below_min {
            flags.push("min");
        }
        if r.hit_max_cap {
            flags.push("max");
        }
        if r.is_manual_override {
            flags.push("manual");
        }
        if r.gross == 0.0 {
            flags.push("none");
        }
        println!(
            "{:>6} {:>8} {:>14} {:>14.2} {:>14.2} {:>7} {:>6} {:>8} {:>12.2} {:>10}",
            format!("{}%", column.fee_column),
            r.full_rate_text,
            r.pay_rate_text,
            r.gross,
            r.net,
            r.ltv.map(percent_text).unwrap_or_else(|| "-".to_string()),
            r.rolled_months,
            percent_text(r.deferred_rate),
            r.direct_debit,
            flags.join(","),
        );
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    if cli.list_criteria {
        print_criteria(cli.category);
        return Ok(());
    }

    let runner = cli.runner()?;
    let request = QuoteRequest {
        category: cli.category,
        answers: cli.answers()?,
        group: cli.group,
        retention: cli.retention,
        product: cli.product.clone(),
        inputs: cli.inputs()?,
    };

    let quote = runner.run(&request);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&quote)?);
    } else {
        print_quote(&request, &quote);
    }

    Ok(())
}
