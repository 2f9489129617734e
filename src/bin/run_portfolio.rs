//! Evaluate every loan on a loan tape
//!
//! Outputs one row per loan with its schedule length and IRR, plus a
//! portfolio summary weighted by invested principal.

use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;

use loan_cashflow::config::DEFAULT_CONFIG_PATH;
use loan_cashflow::loan::load_loans;
use loan_cashflow::{Config, ScenarioRunner, Stress};

/// Run every loan of a loan tape through the amortization and IRR solver
#[derive(Parser, Debug)]
#[command(name = "run_portfolio", version, about)]
struct Args {
    /// YAML configuration naming the rate workbook and its sheets
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Loan tape CSV
    #[arg(long, default_value = "data/loans.csv")]
    loans: PathBuf,

    /// Multiplier on every charge-off rate
    #[arg(long, default_value_t = 1.0)]
    default_multiplier: f64,

    /// Multiplier on every prepay rate
    #[arg(long, default_value_t = 1.0)]
    prepay_multiplier: f64,

    /// Per-loan results CSV
    #[arg(long, default_value = "portfolio_irr.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let start = Instant::now();
    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    let runner = ScenarioRunner::from_config(&config).context("Failed to load rate workbook")?;

    let loans = load_loans(&args.loans)
        .with_context(|| format!("Failed to load loans from {}", args.loans.display()))?;
    println!("Loaded {} loans in {:?}", loans.len(), start.elapsed());

    let stress = Stress {
        default_multiplier: args.default_multiplier,
        prepay_multiplier: args.prepay_multiplier,
    };

    let run_start = Instant::now();
    let results = runner.evaluate_batch(&loans, stress);
    println!("Evaluations complete in {:?}", run_start.elapsed());

    let file = File::create(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;
    let mut out = csv::Writer::from_writer(file);
    out.write_record([
        "LoanId", "Grade", "Term", "Invested", "Months", "MonthlyIRR", "AnnualIRR", "ChargeOff",
        "Prepayment", "Error",
    ])?;

    let mut weighted_irr = 0.0;
    let mut weight = 0.0;
    let mut failures = 0;

    for (loan, result) in loans.iter().zip(&results) {
        match result {
            Ok(eval) => {
                let summary = eval.schedule.summary();
                weighted_irr += eval.annual_irr() * loan.principal();
                weight += loan.principal();
                out.write_record([
                    loan.loan_id().to_string(),
                    loan.grade().unwrap_or("").to_string(),
                    loan.term_months().to_string(),
                    format!("{:.2}", loan.principal()),
                    eval.schedule.len().to_string(),
                    format!("{:.10}", eval.monthly_irr),
                    format!("{:.10}", eval.annual_irr()),
                    format!("{:.2}", summary.total_charge_off),
                    format!("{:.2}", summary.total_prepayment),
                    String::new(),
                ])?;
            }
            Err(err) => {
                failures += 1;
                warn!("Loan {} failed: {}", loan.loan_id(), err);
                out.write_record([
                    loan.loan_id().to_string(),
                    loan.grade().unwrap_or("").to_string(),
                    loan.term_months().to_string(),
                    format!("{:.2}", loan.principal()),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    String::new(),
                    err.to_string(),
                ])?;
            }
        }
    }
    out.flush()?;

    println!("Output written to {}", args.output.display());

    println!("\nPortfolio Summary:");
    println!("  Loans: {} ({} failed)", loans.len(), failures);
    println!("  Invested: ${:.2}", weight);
    if weight > 0.0 {
        println!("  Principal-weighted annual IRR: {:.6}", weighted_irr / weight);
    }
    println!("\nTotal time: {:?}", start.elapsed());

    Ok(())
}
