//! Load loans from a loan tape CSV

use super::{InvestorTerms, Loan};
use crate::error::{LoanError, LoanResult};
use chrono::NaiveDate;
use csv::Reader;
use log::info;
use std::path::Path;

/// Raw CSV row matching the loan tape columns
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "LoanId")]
    loan_id: u32,
    #[serde(rename = "Grade", default)]
    grade: String,
    #[serde(rename = "IssueDate")]
    issue_date: String,
    #[serde(rename = "Term")]
    term: u32,
    #[serde(rename = "Coupon")]
    coupon: f64,
    #[serde(rename = "Invested")]
    invested: f64,
    #[serde(rename = "RecoveryRate", default)]
    recovery_rate: Option<f64>,
    #[serde(rename = "Premium", default)]
    premium: Option<f64>,
    #[serde(rename = "ServicingFee", default)]
    servicing_fee: Option<f64>,
    #[serde(rename = "EarnoutFee", default)]
    earnout_fee: Option<f64>,
}

impl CsvRow {
    fn to_loan(self) -> LoanResult<Loan> {
        let issue_date = parse_issue_date(&self.issue_date).ok_or_else(|| {
            LoanError::input(
                format!("loan {}", self.loan_id),
                format!("unrecognized issue date '{}'", self.issue_date),
            )
        })?;

        let investor = InvestorTerms {
            recovery_rate: self.recovery_rate.unwrap_or(0.0),
            purchase_premium: self.premium.unwrap_or(0.0),
            servicing_fee: self.servicing_fee.unwrap_or(0.0),
            earnout_fee: self.earnout_fee.unwrap_or(0.0),
        };

        Ok(Loan::new(self.invested, self.coupon, self.term, issue_date)?
            .with_id(self.loan_id)
            .with_grade(self.grade)
            .with_investor_terms(investor)?)
    }
}

/// Parse `MM/DD/YYYY` (as the servicer exports it) or ISO `YYYY-MM-DD`
pub fn parse_issue_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Load all loans from a CSV file
pub fn load_loans<P: AsRef<Path>>(path: P) -> LoanResult<Vec<Loan>> {
    let path = path.as_ref();
    let loans = load_loans_from_reader(std::fs::File::open(path)?)?;
    info!("Loaded {} loans from {}", loans.len(), path.display());
    Ok(loans)
}

/// Load loans from any reader (e.g., string buffer)
pub fn load_loans_from_reader<R: std::io::Read>(reader: R) -> LoanResult<Vec<Loan>> {
    let mut csv_reader = Reader::from_reader(reader);
    let mut loans = Vec::new();

    for result in csv_reader.deserialize() {
        let row: CsvRow = result?;
        loans.push(row.to_loan()?);
    }

    Ok(loans)
}
