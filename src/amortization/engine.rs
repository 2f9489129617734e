//! Monthly amortization with charge-offs and prepayments

use log::debug;
use serde::{Deserialize, Serialize};

use super::annuity;
use super::schedule::{AmortizationSchedule, ScheduleRow};
use crate::error::LoanResult;
use crate::loan::{Loan, MONTHS_PER_YEAR};
use crate::rates::RateTable;

/// Months at which half of the earn-out fee is paid back
pub const EARNOUT_MONTHS: [u32; 2] = [12, 18];

/// Balances at or below this fraction of principal are treated as retired
const BALANCE_RESIDUE: f64 = 1e-12;

/// Scalars applied to every charge-off and prepay rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stress {
    pub default_multiplier: f64,
    pub prepay_multiplier: f64,
}

impl Default for Stress {
    fn default() -> Self {
        Self {
            default_multiplier: 1.0,
            prepay_multiplier: 1.0,
        }
    }
}

/// Schedule generator bound to one pair of rate curves
#[derive(Debug, Clone)]
pub struct Amortization<'a> {
    charge_off: &'a RateTable,
    prepay: &'a RateTable,
    stress: Stress,
}

impl<'a> Amortization<'a> {
    pub fn new(charge_off: &'a RateTable, prepay: &'a RateTable) -> Self {
        Self {
            charge_off,
            prepay,
            stress: Stress::default(),
        }
    }

    pub fn with_stress(mut self, stress: Stress) -> Self {
        self.stress = stress;
        self
    }

    /// Build the schedule for one loan
    ///
    /// Each month the level payment is re-solved on the remaining balance and
    /// remaining term. Charge-off then prepayment are taken from the balance
    /// left after scheduled principal. The schedule stops at the first month
    /// whose ending balance is zero.
    pub fn schedule(&self, loan: &Loan) -> LoanResult<AmortizationSchedule> {
        let rate = loan.monthly_rate();
        let term = loan.term_months();
        let principal = loan.principal();
        let investor = loan.investor();

        let initial_outlay = -principal * (1.0 + investor.purchase_premium);
        let mut schedule = AmortizationSchedule::new(loan.loan_id(), initial_outlay);
        let mut balance = principal;

        for period in 1..=term {
            if balance <= 0.0 {
                break;
            }

            let remaining = term - period + 1;
            let scheduled_payment = annuity::level_payment(balance, rate, remaining);
            let scheduled_interest = annuity::interest_component(balance, rate);
            let scheduled_principal = if remaining == 1 {
                balance
            } else {
                (scheduled_payment - scheduled_interest).min(balance)
            };

            let charge_off_rate = self
                .charge_off
                .stressed_rate(period, self.stress.default_multiplier)?;
            let prepay_rate = self
                .prepay
                .stressed_rate(period, self.stress.prepay_multiplier)?;

            let after_scheduled = balance - scheduled_principal;
            let charge_off = after_scheduled * charge_off_rate;
            let prepayment = (after_scheduled - charge_off) * prepay_rate;

            let mut ending_balance = balance - scheduled_principal - charge_off - prepayment;
            if ending_balance <= principal * BALANCE_RESIDUE {
                ending_balance = 0.0;
            }

            let recovery = charge_off * investor.recovery_rate;
            let servicing_fee = balance * investor.servicing_fee / MONTHS_PER_YEAR as f64;
            let earnout_fee = if EARNOUT_MONTHS.contains(&period) {
                investor.earnout_fee / 2.0 * principal
            } else {
                0.0
            };

            let total_cash_flow = scheduled_interest + scheduled_principal + prepayment + recovery
                - servicing_fee
                - earnout_fee;

            schedule.add_row(ScheduleRow {
                period,
                payment_date: loan.payment_date(period)?,
                beginning_balance: balance,
                scheduled_payment,
                scheduled_principal,
                scheduled_interest,
                charge_off_rate,
                prepay_rate,
                charge_off,
                prepayment,
                ending_balance,
                recovery,
                servicing_fee,
                earnout_fee,
                total_cash_flow,
            });

            balance = ending_balance;
        }

        debug!(
            "Loan {}: {} of {} months scheduled",
            loan.loan_id(),
            schedule.len(),
            term
        );

        Ok(schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoanError;
    use crate::loan::InvestorTerms;
    use crate::rates::RateKind;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use chrono::NaiveDate;

    fn issue() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 15).unwrap()
    }

    fn no_rates() -> (RateTable, RateTable) {
        (
            RateTable::empty(RateKind::ChargeOff),
            RateTable::empty(RateKind::Prepay),
        )
    }

    #[test]
    fn test_plain_twelve_month_loan() {
        let loan = Loan::new(100_000.0, 0.06, 12, issue()).unwrap();
        let (co, pp) = no_rates();
        let schedule = Amortization::new(&co, &pp).schedule(&loan).unwrap();

        assert_eq!(schedule.len(), 12);
        assert_eq!(schedule.last().unwrap().ending_balance, 0.0);
        assert_eq!(schedule.initial_outlay, -100_000.0);
        assert_eq!(
            schedule.last().unwrap().payment_date,
            NaiveDate::from_ymd_opt(2021, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_zero_rates_reproduce_level_payment() {
        let loan = Loan::new(7500.0, 0.28, 36, issue()).unwrap();
        let (co, pp) = no_rates();
        let schedule = Amortization::new(&co, &pp).schedule(&loan).unwrap();
        let level = loan.level_payment();

        for row in &schedule.rows {
            assert_abs_diff_eq!(
                row.scheduled_principal + row.scheduled_interest,
                level,
                epsilon = 1e-6
            );
            assert_abs_diff_eq!(row.total_cash_flow, level, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_balance_continuity_and_monotonic() {
        let loan = Loan::new(25_000.0, 0.11, 60, issue()).unwrap();
        let co = RateTable::from_vec(RateKind::ChargeOff, &[0.002; 60]).unwrap();
        let pp = RateTable::from_vec(RateKind::Prepay, &[0.015; 48]).unwrap();
        let schedule = Amortization::new(&co, &pp).schedule(&loan).unwrap();

        assert_eq!(schedule.len(), 60);
        for pair in schedule.rows.windows(2) {
            assert_eq!(pair[0].ending_balance, pair[1].beginning_balance);
            assert!(pair[1].ending_balance <= pair[0].ending_balance);
        }
        assert_abs_diff_eq!(schedule.last().unwrap().ending_balance, 0.0, epsilon = 1e-6);

        // Rates past the table's last period are zero
        assert_eq!(schedule.rows[50].prepay_rate, 0.0);
        assert_eq!(schedule.rows[50].prepayment, 0.0);
    }

    #[test]
    fn test_full_charge_off_ends_schedule() {
        let loan = Loan::new(10_000.0, 0.12, 36, issue()).unwrap();
        let co = RateTable::new(RateKind::ChargeOff, [(3, 1.0)]).unwrap();
        let pp = RateTable::empty(RateKind::Prepay);
        let schedule = Amortization::new(&co, &pp).schedule(&loan).unwrap();

        assert_eq!(schedule.len(), 3);
        let last = schedule.last().unwrap();
        assert_eq!(last.period, 3);
        assert_eq!(last.ending_balance, 0.0);
        assert_relative_eq!(
            last.charge_off,
            last.beginning_balance - last.scheduled_principal,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_full_prepayment_ends_schedule() {
        let loan = Loan::new(10_000.0, 0.12, 36, issue()).unwrap();
        let co = RateTable::empty(RateKind::ChargeOff);
        let pp = RateTable::new(RateKind::Prepay, [(5, 1.0)]).unwrap();
        let schedule = Amortization::new(&co, &pp).schedule(&loan).unwrap();

        assert_eq!(schedule.len(), 5);
        assert_eq!(schedule.last().unwrap().ending_balance, 0.0);
    }

    #[test]
    fn test_charge_off_applied_before_prepay() {
        let loan = Loan::new(1_000.0, 0.0, 10, issue()).unwrap();
        let co = RateTable::new(RateKind::ChargeOff, [(1, 0.5)]).unwrap();
        let pp = RateTable::new(RateKind::Prepay, [(1, 0.5)]).unwrap();
        let schedule = Amortization::new(&co, &pp).schedule(&loan).unwrap();

        let first = &schedule.rows[0];
        assert_relative_eq!(first.scheduled_principal, 100.0);
        assert_relative_eq!(first.charge_off, 450.0);
        assert_relative_eq!(first.prepayment, 225.0);
        assert_relative_eq!(first.ending_balance, 225.0);

        // Remaining term re-amortizes the surviving balance
        assert_relative_eq!(schedule.rows[1].scheduled_principal, 25.0);
    }

    #[test]
    fn test_stress_multiplier_out_of_range() {
        let loan = Loan::new(1_000.0, 0.1, 12, issue()).unwrap();
        let co = RateTable::from_vec(RateKind::ChargeOff, &[0.6]).unwrap();
        let pp = RateTable::empty(RateKind::Prepay);
        let stress = Stress {
            default_multiplier: 2.0,
            prepay_multiplier: 1.0,
        };
        let result = Amortization::new(&co, &pp).with_stress(stress).schedule(&loan);
        assert!(matches!(result, Err(LoanError::InvalidRate { .. })));
    }

    #[test]
    fn test_investor_cash_flows() {
        let terms = InvestorTerms {
            recovery_rate: 0.1,
            purchase_premium: 0.05,
            servicing_fee: 0.012,
            earnout_fee: 0.02,
        };
        let loan = Loan::new(12_000.0, 0.1, 24, issue())
            .unwrap()
            .with_investor_terms(terms)
            .unwrap();
        let co = RateTable::from_vec(RateKind::ChargeOff, &[0.01; 24]).unwrap();
        let pp = RateTable::empty(RateKind::Prepay);
        let schedule = Amortization::new(&co, &pp).schedule(&loan).unwrap();

        assert_relative_eq!(schedule.initial_outlay, -12_600.0, epsilon = 1e-6);

        let first = &schedule.rows[0];
        assert_relative_eq!(first.servicing_fee, 12.0, epsilon = 1e-9);
        assert_relative_eq!(first.recovery, first.charge_off * 0.1, epsilon = 1e-9);
        assert_eq!(first.earnout_fee, 0.0);
        assert_relative_eq!(schedule.rows[11].earnout_fee, 120.0, epsilon = 1e-9);
        assert_relative_eq!(schedule.rows[17].earnout_fee, 120.0, epsilon = 1e-9);

        let expected = first.scheduled_interest + first.scheduled_principal + first.prepayment
            + first.recovery
            - first.servicing_fee;
        assert_relative_eq!(first.total_cash_flow, expected, epsilon = 1e-9);

        let flows = schedule.cash_flows();
        assert_eq!(flows.len(), 25);
        assert_eq!(flows[0], schedule.initial_outlay);
    }
}
