//! Internal Rate of Return (IRR) calculation
//!
//! Solves for the periodic rate that zeroes the NPV of a schedule's cash flows.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{LoanError, LoanResult};

/// Lowest periodic rate the solver will consider (-99%)
const MIN_RATE: f64 = -0.99;
/// Highest periodic rate the solver will consider (1000%)
const MAX_RATE: f64 = 10.0;
/// Cash flows smaller than this are treated as zero when checking for a sign change
const ZERO_FLOW: f64 = 1e-10;
/// Largest NPV, relative to the total absolute cash flow, accepted as a root
const NPV_TOLERANCE: f64 = 1e-6;

/// Newton-Raphson IRR solver with a bisection fallback
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrrSolver {
    /// Starting periodic rate for Newton's method
    pub guess: f64,
    /// Step size (Newton) or half-width (bisection) at which iteration stops
    pub tolerance: f64,
    /// Iteration cap, applied to each method separately
    pub max_iterations: u32,
}

impl Default for IrrSolver {
    fn default() -> Self {
        Self {
            guess: 0.1,
            tolerance: 1e-10,
            max_iterations: 1000,
        }
    }
}

impl IrrSolver {
    /// Calculate the periodic IRR of a series of cash flows
    ///
    /// # Arguments
    /// * `cashflows` - Cash flows per period, index 0 first (positive = inflow, negative = outflow)
    ///
    /// # Returns
    /// * `LoanResult<f64>` - Periodic IRR as a decimal (e.g., 0.005 for 0.5% per month)
    pub fn solve(&self, cashflows: &[f64]) -> LoanResult<f64> {
        if cashflows.len() < 2 {
            return Err(LoanError::DegenerateCashFlow {
                reason: format!("need at least 2 cash flows, got {}", cashflows.len()),
            });
        }

        // At least one sign change is required for an IRR to exist
        let has_positive = cashflows.iter().any(|&cf| cf > ZERO_FLOW);
        let has_negative = cashflows.iter().any(|&cf| cf < -ZERO_FLOW);
        if !has_positive || !has_negative {
            return Err(LoanError::DegenerateCashFlow {
                reason: "cash flows have no sign change".to_string(),
            });
        }

        match self.newton(cashflows) {
            Some(rate) => Ok(rate),
            None => {
                warn!("IRR Newton iteration did not converge, falling back to bisection");
                self.bisection(cashflows)
            }
        }
    }

    fn newton(&self, cashflows: &[f64]) -> Option<f64> {
        let scale: f64 = cashflows.iter().map(|cf| cf.abs()).sum();
        let mut rate = self.guess.clamp(MIN_RATE, MAX_RATE);

        for _ in 0..self.max_iterations {
            let (value, slope) = npv_and_derivative(cashflows, rate);

            if !value.is_finite() || !slope.is_finite() || slope.abs() < 1e-20 {
                return None;
            }

            // Bound the rate to reasonable values
            let new_rate = (rate - value / slope).clamp(MIN_RATE, MAX_RATE);

            if (new_rate - rate).abs() < self.tolerance {
                // A step pinned at a bound stops moving without reaching a root
                let residual = npv(cashflows, new_rate).abs();
                return (residual <= NPV_TOLERANCE * scale).then_some(new_rate);
            }

            rate = new_rate;
        }

        None
    }

    fn bisection(&self, cashflows: &[f64]) -> LoanResult<f64> {
        let mut low = MIN_RATE;
        let mut high = MAX_RATE;
        let mut npv_low = npv(cashflows, low);
        let npv_high = npv(cashflows, high);

        // Check that we have a root in this interval
        if npv_low * npv_high > 0.0 {
            return Err(LoanError::NoConvergence {
                iterations: self.max_iterations,
                residual: npv_low.abs().min(npv_high.abs()),
            });
        }

        let mut residual = npv_low.abs();

        for _ in 0..self.max_iterations {
            let mid = (low + high) / 2.0;
            let npv_mid = npv(cashflows, mid);
            residual = npv_mid.abs();

            if npv_mid == 0.0 || (high - low) / 2.0 < self.tolerance {
                return Ok(mid);
            }

            if npv_mid * npv_low < 0.0 {
                high = mid;
            } else {
                low = mid;
                npv_low = npv_mid;
            }
        }

        Err(LoanError::NoConvergence {
            iterations: self.max_iterations,
            residual,
        })
    }
}

/// Periodic IRR with the default solver settings
pub fn irr(cashflows: &[f64]) -> LoanResult<f64> {
    IrrSolver::default().solve(cashflows)
}

/// Net present value at a periodic rate, with the first cash flow undiscounted
pub fn npv(cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32))
        .sum()
}

/// Calculate NPV and its derivative with respect to rate
fn npv_and_derivative(cashflows: &[f64], rate: f64) -> (f64, f64) {
    let mut npv = 0.0;
    let mut dnpv = 0.0;

    for (t, &cf) in cashflows.iter().enumerate() {
        let discount = (1.0 + rate).powi(t as i32);
        npv += cf / discount;
        if t > 0 {
            dnpv -= (t as f64) * cf / (discount * (1.0 + rate));
        }
    }

    (npv, dnpv)
}

/// Nominal annual rate: periodic rate times periods per year
pub fn annualize_nominal(periodic_rate: f64, periods_per_year: u32) -> f64 {
    periodic_rate * periods_per_year as f64
}

/// Effective annual rate from a compounded periodic rate
pub fn annualize_effective(periodic_rate: f64, periods_per_year: u32) -> f64 {
    (1.0 + periodic_rate).powi(periods_per_year as i32) - 1.0
}
