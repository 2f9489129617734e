//! Per-period charge-off and prepayment rate tables

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{LoanError, LoanResult};

/// Which risk a rate table describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RateKind {
    ChargeOff,
    Prepay,
}

impl RateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateKind::ChargeOff => "charge-off",
            RateKind::Prepay => "prepay",
        }
    }
}

/// Monthly rates keyed by loan age (1-based period index)
///
/// Periods outside the table carry a rate of zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateTable {
    kind: RateKind,
    rates: BTreeMap<u32, f64>,
}

impl RateTable {
    /// Build a table from (period, rate) pairs, rejecting duplicate periods,
    /// period 0, and rates outside [0, 1]
    pub fn new(kind: RateKind, entries: impl IntoIterator<Item = (u32, f64)>) -> LoanResult<Self> {
        let mut rates = BTreeMap::new();
        for (period, rate) in entries {
            validate_rate(kind, period, rate)?;
            if period == 0 {
                return Err(LoanError::input(
                    format!("{} table", kind.as_str()),
                    "period index starts at 1",
                ));
            }
            if rates.insert(period, rate).is_some() {
                return Err(LoanError::input(
                    format!("{} table", kind.as_str()),
                    format!("duplicate period {}", period),
                ));
            }
        }
        Ok(Self { kind, rates })
    }

    /// A table with no entries (every lookup returns zero)
    pub fn empty(kind: RateKind) -> Self {
        Self {
            kind,
            rates: BTreeMap::new(),
        }
    }

    /// Build a table from a dense vector whose first element is period 1
    pub fn from_vec(kind: RateKind, rates: &[f64]) -> LoanResult<Self> {
        Self::new(
            kind,
            rates
                .iter()
                .enumerate()
                .map(|(i, &rate)| (i as u32 + 1, rate)),
        )
    }

    pub fn kind(&self) -> RateKind {
        self.kind
    }

    /// Rate for the given period, zero when absent
    pub fn rate(&self, period: u32) -> f64 {
        self.rates.get(&period).copied().unwrap_or(0.0)
    }

    /// Rate for the given period scaled by a stress multiplier
    ///
    /// Fails with `InvalidRate` if the scaled rate leaves [0, 1].
    pub fn stressed_rate(&self, period: u32, multiplier: f64) -> LoanResult<f64> {
        let rate = self.rate(period) * multiplier;
        validate_rate(self.kind, period, rate)?;
        Ok(rate)
    }

    /// Last period with an entry
    pub fn last_period(&self) -> Option<u32> {
        self.rates.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.rates.iter().map(|(&p, &r)| (p, r))
    }
}

fn validate_rate(kind: RateKind, period: u32, rate: f64) -> LoanResult<()> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(LoanError::InvalidRate {
            kind: kind.as_str(),
            period,
            rate,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_defaults_to_zero() {
        let table = RateTable::from_vec(RateKind::ChargeOff, &[0.01, 0.02, 0.03]).unwrap();
        assert_eq!(table.rate(1), 0.01);
        assert_eq!(table.rate(3), 0.03);
        assert_eq!(table.rate(4), 0.0);
        assert_eq!(table.rate(0), 0.0);
        assert_eq!(table.last_period(), Some(3));
    }

    #[test]
    fn test_out_of_range_rates_rejected() {
        assert!(matches!(
            RateTable::new(RateKind::Prepay, [(1, -0.01)]),
            Err(LoanError::InvalidRate { period: 1, .. })
        ));
        assert!(matches!(
            RateTable::new(RateKind::ChargeOff, [(1, 0.1), (2, 1.01)]),
            Err(LoanError::InvalidRate { period: 2, .. })
        ));
        assert!(RateTable::new(RateKind::ChargeOff, [(1, f64::NAN)]).is_err());
        assert!(RateTable::new(RateKind::ChargeOff, [(1, 1.0)]).is_ok());
    }

    #[test]
    fn test_duplicate_and_zero_periods_rejected() {
        assert!(matches!(
            RateTable::new(RateKind::Prepay, [(2, 0.1), (2, 0.2)]),
            Err(LoanError::Input { .. })
        ));
        assert!(RateTable::new(RateKind::Prepay, [(0, 0.1)]).is_err());
    }

    #[test]
    fn test_stressed_rate() {
        let table = RateTable::from_vec(RateKind::ChargeOff, &[0.4]).unwrap();
        assert!((table.stressed_rate(1, 2.0).unwrap() - 0.8).abs() < 1e-12);
        assert!(matches!(
            table.stressed_rate(1, 3.0),
            Err(LoanError::InvalidRate { kind: "charge-off", .. })
        ));
        assert_eq!(table.stressed_rate(7, 3.0).unwrap(), 0.0);
    }
}
