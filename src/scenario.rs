//! Scenario runner for loan and portfolio evaluations
//!
//! Holds the rate sheets loaded once at start-up and resolves each loan's
//! curves from them, so many loans and stress scenarios can be evaluated
//! without re-reading the workbook.

use rayon::prelude::*;
use serde::Serialize;

use crate::amortization::{annualize_nominal, Amortization, AmortizationSchedule, IrrSolver, Stress};
use crate::config::Config;
use crate::error::LoanResult;
use crate::loan::{Loan, MONTHS_PER_YEAR};
use crate::rates::RateSheets;

/// Schedule and IRR of one loan under one stress scenario
#[derive(Debug, Clone, Serialize)]
pub struct LoanEvaluation {
    pub loan_id: u32,
    pub stress: Stress,
    pub schedule: AmortizationSchedule,
    /// Periodic (monthly) IRR
    pub monthly_irr: f64,
}

impl LoanEvaluation {
    /// Monthly IRR times twelve
    pub fn annual_irr(&self) -> f64 {
        annualize_nominal(self.monthly_irr, MONTHS_PER_YEAR)
    }
}

/// Pre-loaded scenario runner
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_config(&Config::load("data/config.yaml")?)?;
///
/// for multiplier in [0.5, 1.0, 1.5] {
///     let stress = Stress { default_multiplier: multiplier, ..Default::default() };
///     let result = runner.evaluate(&loan, stress)?;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    sheets: RateSheets,
    solver: IrrSolver,
}

impl ScenarioRunner {
    pub fn new(sheets: RateSheets) -> Self {
        Self {
            sheets,
            solver: IrrSolver::default(),
        }
    }

    /// Load the workbook named by the configuration
    pub fn from_config(config: &Config) -> LoanResult<Self> {
        Ok(Self {
            sheets: config.load_rate_sheets()?,
            solver: config.solver,
        })
    }

    pub fn with_solver(mut self, solver: IrrSolver) -> Self {
        self.solver = solver;
        self
    }

    /// Amortize one loan against its charge-off and prepay curves
    pub fn schedule(&self, loan: &Loan, stress: Stress) -> LoanResult<AmortizationSchedule> {
        let charge_off = self.sheets.charge_off.resolve(&loan.charge_off_key())?;
        let prepay = self.sheets.prepay.resolve(&loan.prepay_key())?;
        Amortization::new(charge_off, prepay)
            .with_stress(stress)
            .schedule(loan)
    }

    /// Amortize one loan and solve the IRR of its cash flows
    pub fn evaluate(&self, loan: &Loan, stress: Stress) -> LoanResult<LoanEvaluation> {
        let schedule = self.schedule(loan, stress)?;
        let monthly_irr = self.solver.solve(&schedule.cash_flows())?;
        Ok(LoanEvaluation {
            loan_id: loan.loan_id(),
            stress,
            schedule,
            monthly_irr,
        })
    }

    /// Evaluate many loans under the same stress, in parallel
    ///
    /// Results come back in input order; one loan's failure does not stop the others.
    pub fn evaluate_batch(&self, loans: &[Loan], stress: Stress) -> Vec<LoanResult<LoanEvaluation>> {
        loans
            .par_iter()
            .map(|loan| self.evaluate(loan, stress))
            .collect()
    }

    /// Evaluate one loan under several stress scenarios
    pub fn evaluate_scenarios(
        &self,
        loan: &Loan,
        stresses: &[Stress],
    ) -> Vec<LoanResult<LoanEvaluation>> {
        stresses
            .iter()
            .map(|&stress| self.evaluate(loan, stress))
            .collect()
    }

    pub fn sheets(&self) -> &RateSheets {
        &self.sheets
    }

    pub fn solver(&self) -> &IrrSolver {
        &self.solver
    }
}
