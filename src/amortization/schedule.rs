//! Amortization schedule output structures

use std::io::Write;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::LoanResult;

/// A single month of the schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    // Timing
    pub period: u32,
    pub payment_date: NaiveDate,

    // Balance roll-forward
    pub beginning_balance: f64,
    pub scheduled_payment: f64,
    pub scheduled_principal: f64,
    pub scheduled_interest: f64,

    // Decrements (rates applied this month)
    pub charge_off_rate: f64,
    pub prepay_rate: f64,

    // Decrement amounts
    pub charge_off: f64,
    pub prepayment: f64,
    pub ending_balance: f64,

    // Investor cash flows
    pub recovery: f64,
    pub servicing_fee: f64,
    pub earnout_fee: f64,
    pub total_cash_flow: f64,
}

impl ScheduleRow {
    /// Principal actually returned this month (scheduled plus prepaid)
    pub fn principal_paid(&self) -> f64 {
        self.scheduled_principal + self.prepayment
    }
}

/// Complete schedule for one loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    /// Loan identifier
    pub loan_id: u32,

    /// Period-0 cash flow (negative: the investor's outlay)
    pub initial_outlay: f64,

    /// Monthly rows, period 1 first
    pub rows: Vec<ScheduleRow>,
}

impl AmortizationSchedule {
    pub fn new(loan_id: u32, initial_outlay: f64) -> Self {
        Self {
            loan_id,
            initial_outlay,
            rows: Vec::new(),
        }
    }

    /// Add a schedule row
    pub fn add_row(&mut self, row: ScheduleRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&ScheduleRow> {
        self.rows.last()
    }

    /// Signed cash flows: the outlay at index 0, then one entry per row
    pub fn cash_flows(&self) -> Vec<f64> {
        std::iter::once(self.initial_outlay)
            .chain(self.rows.iter().map(|r| r.total_cash_flow))
            .collect()
    }

    /// Get summary statistics
    pub fn summary(&self) -> ScheduleSummary {
        let total_interest: f64 = self.rows.iter().map(|r| r.scheduled_interest).sum();
        let total_scheduled_principal: f64 =
            self.rows.iter().map(|r| r.scheduled_principal).sum();
        let total_prepayment: f64 = self.rows.iter().map(|r| r.prepayment).sum();
        let total_charge_off: f64 = self.rows.iter().map(|r| r.charge_off).sum();
        let total_recovery: f64 = self.rows.iter().map(|r| r.recovery).sum();
        let total_fees: f64 = self
            .rows
            .iter()
            .map(|r| r.servicing_fee + r.earnout_fee)
            .sum();
        let total_cash_flow: f64 = self.rows.iter().map(|r| r.total_cash_flow).sum();

        ScheduleSummary {
            total_months: self.rows.len() as u32,
            total_interest,
            total_scheduled_principal,
            total_prepayment,
            total_charge_off,
            total_recovery,
            total_fees,
            total_cash_flow,
            final_balance: self.rows.last().map(|r| r.ending_balance).unwrap_or(0.0),
        }
    }

    /// Write the schedule as CSV, with a period-0 row carrying the outlay
    pub fn write_csv<W: Write>(&self, writer: W) -> LoanResult<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record([
            "Period",
            "PaymentDate",
            "BeginningBalance",
            "ScheduledPayment",
            "ScheduledPrincipal",
            "ScheduledInterest",
            "ChargeOffRate",
            "PrepayRate",
            "ChargeOff",
            "Prepayment",
            "Recovery",
            "ServicingFee",
            "EarnoutFee",
            "EndingBalance",
            "TotalCashFlow",
        ])?;

        let opening = self
            .rows
            .first()
            .map(|r| format!("{:.8}", r.beginning_balance))
            .unwrap_or_default();
        out.write_record([
            "0".to_string(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            opening,
            format!("{:.8}", self.initial_outlay),
        ])?;

        for row in &self.rows {
            out.write_record([
                row.period.to_string(),
                row.payment_date.format("%Y-%m-%d").to_string(),
                format!("{:.8}", row.beginning_balance),
                format!("{:.8}", row.scheduled_payment),
                format!("{:.8}", row.scheduled_principal),
                format!("{:.8}", row.scheduled_interest),
                format!("{:.8}", row.charge_off_rate),
                format!("{:.8}", row.prepay_rate),
                format!("{:.8}", row.charge_off),
                format!("{:.8}", row.prepayment),
                format!("{:.8}", row.recovery),
                format!("{:.8}", row.servicing_fee),
                format!("{:.8}", row.earnout_fee),
                format!("{:.8}", row.ending_balance),
                format!("{:.8}", row.total_cash_flow),
            ])?;
        }

        out.flush()?;
        Ok(())
    }
}

/// Summary statistics for a schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_months: u32,
    pub total_interest: f64,
    pub total_scheduled_principal: f64,
    pub total_prepayment: f64,
    pub total_charge_off: f64,
    pub total_recovery: f64,
    pub total_fees: f64,
    pub total_cash_flow: f64,
    pub final_balance: f64,
}
