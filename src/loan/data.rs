//! Loan terms and payment calendar

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::amortization::annuity;
use crate::error::{LoanError, LoanResult};

/// Periods per year for monthly amortization
pub const MONTHS_PER_YEAR: u32 = 12;

/// Longest accepted term (100 years)
pub const MAX_TERM_MONTHS: u32 = 1200;

/// Investor-side economics layered on top of the borrower's schedule
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct InvestorTerms {
    /// Fraction of each charge-off recovered in the same period
    pub recovery_rate: f64,

    /// Purchase premium as a fraction of principal, paid at period 0
    pub purchase_premium: f64,

    /// Annual servicing fee on the performing balance
    pub servicing_fee: f64,

    /// Earn-out fee as a fraction of principal, paid half at month 12 and half at month 18
    pub earnout_fee: f64,
}

impl InvestorTerms {
    fn validate(&self) -> LoanResult<()> {
        let fields = [
            ("recovery_rate", self.recovery_rate),
            ("purchase_premium", self.purchase_premium),
            ("servicing_fee", self.servicing_fee),
            ("earnout_fee", self.earnout_fee),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(LoanError::invalid_terms(format!(
                    "{} must be a nonnegative number, got {}",
                    name, value
                )));
            }
        }
        if self.recovery_rate > 1.0 {
            return Err(LoanError::invalid_terms(format!(
                "recovery_rate must not exceed 1, got {}",
                self.recovery_rate
            )));
        }
        Ok(())
    }
}

/// A single fixed-rate, level-payment amortizing loan
///
/// Fields are private: a `Loan` can only be obtained through [`Loan::new`],
/// so every instance satisfies `principal > 0`, `0 < term_months <= 1200` and
/// `annual_rate >= 0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Loan {
    loan_id: u32,
    principal: f64,
    annual_rate: f64,
    term_months: u32,
    issue_date: NaiveDate,
    grade: Option<String>,
    investor: InvestorTerms,
    charge_off_curve: Option<String>,
    prepay_curve: Option<String>,
}

impl Loan {
    /// Validate and build a loan with default (zero) investor terms
    pub fn new(
        principal: f64,
        annual_rate: f64,
        term_months: u32,
        issue_date: NaiveDate,
    ) -> LoanResult<Self> {
        if !principal.is_finite() || principal <= 0.0 {
            return Err(LoanError::invalid_terms(format!(
                "principal must be positive, got {}",
                principal
            )));
        }
        if !annual_rate.is_finite() || annual_rate < 0.0 {
            return Err(LoanError::invalid_terms(format!(
                "annual rate must be nonnegative, got {}",
                annual_rate
            )));
        }
        if term_months == 0 {
            return Err(LoanError::invalid_terms("term must be at least one month"));
        }
        if term_months > MAX_TERM_MONTHS {
            return Err(LoanError::invalid_terms(format!(
                "term must not exceed {} months, got {}",
                MAX_TERM_MONTHS, term_months
            )));
        }

        Ok(Self {
            loan_id: 0,
            principal,
            annual_rate,
            term_months,
            issue_date,
            grade: None,
            investor: InvestorTerms::default(),
            charge_off_curve: None,
            prepay_curve: None,
        })
    }

    pub fn with_id(mut self, loan_id: u32) -> Self {
        self.loan_id = loan_id;
        self
    }

    /// Attach a credit grade (used to derive the charge-off curve key)
    pub fn with_grade(mut self, grade: impl Into<String>) -> Self {
        let grade = grade.into();
        self.grade = if grade.trim().is_empty() {
            None
        } else {
            Some(grade.trim().to_string())
        };
        self
    }

    pub fn with_investor_terms(mut self, investor: InvestorTerms) -> LoanResult<Self> {
        investor.validate()?;
        self.investor = investor;
        Ok(self)
    }

    /// Override the derived charge-off and prepay curve keys
    pub fn with_curves(
        mut self,
        charge_off_curve: Option<String>,
        prepay_curve: Option<String>,
    ) -> Self {
        self.charge_off_curve = charge_off_curve;
        self.prepay_curve = prepay_curve;
        self
    }

    pub fn loan_id(&self) -> u32 {
        self.loan_id
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn annual_rate(&self) -> f64 {
        self.annual_rate
    }

    pub fn term_months(&self) -> u32 {
        self.term_months
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn grade(&self) -> Option<&str> {
        self.grade.as_deref()
    }

    pub fn investor(&self) -> &InvestorTerms {
        &self.investor
    }

    /// Periodic (monthly) rate
    pub fn monthly_rate(&self) -> f64 {
        self.annual_rate / MONTHS_PER_YEAR as f64
    }

    /// Level payment over the full term with no charge-offs or prepayments
    pub fn level_payment(&self) -> f64 {
        annuity::level_payment(self.principal, self.monthly_rate(), self.term_months)
    }

    /// Charge-off curve key: explicit override, else "{term}-{grade}", else "{term}"
    pub fn charge_off_key(&self) -> String {
        if let Some(key) = &self.charge_off_curve {
            return key.clone();
        }
        match &self.grade {
            Some(grade) => format!("{}-{}", self.term_months, grade),
            None => self.term_months.to_string(),
        }
    }

    /// Prepay curve key: explicit override, else "{term}"
    pub fn prepay_key(&self) -> String {
        self.prepay_curve
            .clone()
            .unwrap_or_else(|| self.term_months.to_string())
    }

    /// Date of the given payment (1-based)
    ///
    /// An end-of-month issue date pins every payment to the end of its month.
    /// Otherwise the issue day is kept, clamped to the length of short months.
    pub fn payment_date(&self, period_index: u32) -> LoanResult<NaiveDate> {
        if period_index == 0 {
            return Err(LoanError::invalid_terms("payment period index starts at 1"));
        }
        let shifted = self
            .issue_date
            .checked_add_months(Months::new(period_index))
            .ok_or_else(|| {
                LoanError::invalid_terms(format!(
                    "payment date {} months after {} is out of range",
                    period_index, self.issue_date
                ))
            })?;

        if !is_end_of_month(self.issue_date) {
            return Ok(shifted);
        }
        end_of_month(shifted).ok_or_else(|| {
            LoanError::invalid_terms(format!("no month end after {}", shifted))
        })
    }
}

pub(crate) fn is_end_of_month(date: NaiveDate) -> bool {
    date.succ_opt().map_or(true, |next| next.month() != date.month())
}

/// Last day of the date's month: the day before the first of the next month
pub(crate) fn end_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}
