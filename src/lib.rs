//! Loan Cash Flow - amortization schedules and IRR for consumer loan investments
//!
//! This library provides:
//! - Validated fixed-rate loan terms and payment calendars
//! - Charge-off and prepayment curves loaded from a rate workbook
//! - Month-by-month amortization with charge-offs, prepayments and investor fees
//! - A Newton-Raphson IRR solver with bisection fallback
//! - A scenario runner for stress multipliers and loan portfolios

pub mod error;
pub mod config;
pub mod loan;
pub mod rates;
pub mod amortization;
pub mod scenario;

// Re-export commonly used types
pub use error::{LoanError, LoanResult};
pub use config::Config;
pub use loan::{InvestorTerms, Loan};
pub use rates::{RateKind, RateSheet, RateSheets, RateTable};
pub use amortization::{Amortization, AmortizationSchedule, IrrSolver, ScheduleRow, Stress};
pub use scenario::{LoanEvaluation, ScenarioRunner};
