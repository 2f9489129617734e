//! Charge-off and prepayment rate curves

mod table;
pub mod loader;

pub use table::{RateKind, RateTable};
pub use loader::{RateSheet, RateSheets, Workbook};
