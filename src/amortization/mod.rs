//! Amortization schedules and IRR of their cash flows

pub mod annuity;
mod engine;
pub mod irr;
mod schedule;

pub use engine::{Amortization, Stress, EARNOUT_MONTHS};
pub use irr::{annualize_effective, annualize_nominal, irr, npv, IrrSolver};
pub use schedule::{AmortizationSchedule, ScheduleRow, ScheduleSummary};
