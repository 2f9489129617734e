//! Loan Cash Flow CLI
//!
//! Amortizes a single loan against the configured charge-off and prepay
//! curves, writes the schedule to CSV and prints the annualized IRR.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;

use loan_cashflow::amortization::ScheduleSummary;
use loan_cashflow::config::DEFAULT_CONFIG_PATH;
use loan_cashflow::loan::loader::parse_issue_date;
use loan_cashflow::{Config, InvestorTerms, Loan, ScenarioRunner, Stress};

/// Amortize one loan and compute the IRR of its cash flows
#[derive(Parser, Debug)]
#[command(name = "loan_cashflow", version, about)]
struct Args {
    /// YAML configuration naming the rate workbook and its sheets
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Credit grade (selects the "{term}-{grade}" charge-off curve)
    #[arg(long, default_value = "C4")]
    grade: String,

    /// Issue date, MM/DD/YYYY or YYYY-MM-DD
    #[arg(long, default_value = "08/24/2015")]
    issue_date: String,

    /// Number of monthly payments
    #[arg(long, default_value_t = 36)]
    term: u32,

    /// Annual coupon rate
    #[arg(long, default_value_t = 0.28)]
    coupon: f64,

    /// Invested principal
    #[arg(long, default_value_t = 7500.0)]
    invested: f64,

    /// Fraction of charge-offs recovered
    #[arg(long, default_value_t = 0.08)]
    recovery_rate: f64,

    /// Purchase premium over principal
    #[arg(long, default_value_t = 0.0514)]
    premium: f64,

    /// Annual servicing fee on the performing balance
    #[arg(long, default_value_t = 0.025)]
    servicing_fee: f64,

    /// Earn-out fee, paid half at month 12 and half at month 18
    #[arg(long, default_value_t = 0.025)]
    earnout_fee: f64,

    /// Multiplier on every charge-off rate
    #[arg(long, default_value_t = 1.0)]
    default_multiplier: f64,

    /// Multiplier on every prepay rate
    #[arg(long, default_value_t = 1.0)]
    prepay_multiplier: f64,

    /// Schedule CSV output path
    #[arg(long, default_value = "cashflow.csv")]
    output: PathBuf,

    /// Print a JSON summary instead of the text report
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    loan_id: u32,
    months: usize,
    monthly_irr: f64,
    annual_irr: f64,
    summary: ScheduleSummary,
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config {}", args.config.display()))?;
    let runner = ScenarioRunner::from_config(&config).context("Failed to load rate workbook")?;

    let issue_date = parse_issue_date(&args.issue_date)
        .with_context(|| format!("Unrecognized issue date '{}'", args.issue_date))?;
    let loan = Loan::new(args.invested, args.coupon, args.term, issue_date)?
        .with_grade(args.grade.as_str())
        .with_investor_terms(InvestorTerms {
            recovery_rate: args.recovery_rate,
            purchase_premium: args.premium,
            servicing_fee: args.servicing_fee,
            earnout_fee: args.earnout_fee,
        })?;

    let stress = Stress {
        default_multiplier: args.default_multiplier,
        prepay_multiplier: args.prepay_multiplier,
    };

    info!(
        "Evaluating {} month loan, charge-off curve '{}', prepay curve '{}'",
        loan.term_months(),
        loan.charge_off_key(),
        loan.prepay_key()
    );
    let result = runner.evaluate(&loan, stress)?;

    let file = File::create(&args.output)
        .with_context(|| format!("Unable to create {}", args.output.display()))?;
    result.schedule.write_csv(file)?;

    let summary = result.schedule.summary();

    if args.json {
        let report = Report {
            loan_id: result.loan_id,
            months: result.schedule.len(),
            monthly_irr: result.monthly_irr,
            annual_irr: result.annual_irr(),
            summary,
            output: args.output.clone(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Loan: {} months at {:.2}%", loan.term_months(), loan.annual_rate() * 100.0);
    println!("  Grade: {}", loan.grade().unwrap_or("-"));
    println!("  Invested: ${:.2}", loan.principal());
    println!("  Level payment: ${:.2}", loan.level_payment());
    println!();

    println!(
        "{:>5} {:>10} {:>12} {:>10} {:>10} {:>10} {:>10} {:>12}",
        "Month", "Date", "BOP Bal", "Principal", "Interest", "ChargeOff", "Prepay", "EOP Bal"
    );
    println!("{}", "-".repeat(88));

    for row in result.schedule.rows.iter().take(12) {
        println!(
            "{:>5} {:>10} {:>12.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12.2}",
            row.period,
            row.payment_date.format("%Y-%m-%d"),
            row.beginning_balance,
            row.scheduled_principal,
            row.scheduled_interest,
            row.charge_off,
            row.prepayment,
            row.ending_balance,
        );
    }
    if result.schedule.len() > 12 {
        println!("... ({} more months)", result.schedule.len() - 12);
    }

    println!("\nFull schedule written to: {}", args.output.display());

    println!("\nSummary:");
    println!("  Total Months: {}", summary.total_months);
    println!("  Total Interest: ${:.2}", summary.total_interest);
    println!("  Total Prepayment: ${:.2}", summary.total_prepayment);
    println!("  Total Charge-off: ${:.2}", summary.total_charge_off);
    println!("  Total Recovery: ${:.2}", summary.total_recovery);
    println!("  Total Fees: ${:.2}", summary.total_fees);
    println!("\nMonthly IRR: {:.6}", result.monthly_irr);
    println!("Annualized IRR is {:.6}", result.annual_irr());

    Ok(())
}
