//! Closed-form level-payment (annuity) formulas

/// Level payment that retires `balance` over `nper` periods at periodic `rate`
///
/// Falls back to straight-line repayment when the rate is zero.
pub fn level_payment(balance: f64, rate: f64, nper: u32) -> f64 {
    if nper == 0 {
        return balance;
    }
    if rate.abs() < 1e-15 {
        return balance / nper as f64;
    }
    balance * rate / (1.0 - (1.0 + rate).powf(-(nper as f64)))
}

/// Interest portion of the next payment
pub fn interest_component(balance: f64, rate: f64) -> f64 {
    balance * rate
}

/// Principal portion of the next level payment
pub fn principal_component(balance: f64, rate: f64, nper: u32) -> f64 {
    level_payment(balance, rate, nper) - interest_component(balance, rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_level_payment_matches_annuity_factor() {
        // 7500 at 28% over 36 months
        assert_relative_eq!(level_payment(7500.0, 0.28 / 12.0, 36), 310.226908, epsilon = 1e-5);
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        assert_relative_eq!(level_payment(1200.0, 0.0, 12), 100.0);
        assert_relative_eq!(principal_component(1200.0, 0.0, 12), 100.0);
    }

    #[test]
    fn test_long_term_does_not_overflow() {
        // Beyond i32::MAX periods the payment tends to pure interest
        let payment = level_payment(1000.0, 0.01, u32::MAX);
        assert_relative_eq!(payment, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_single_period_retires_balance() {
        assert_relative_eq!(principal_component(500.0, 0.01, 1), 500.0, epsilon = 1e-9);
    }
}
