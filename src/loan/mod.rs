//! Loan terms and loan tape loading

mod data;
pub mod loader;

pub use data::{InvestorTerms, Loan, MAX_TERM_MONTHS, MONTHS_PER_YEAR};
pub use loader::{load_loans, load_loans_from_reader};
