//! Payroll generation for drivers and service providers
//!
//! Attendance of a period is folded per payee by [`aggregator`], priced by [`calculator`]
//! and persisted by [`period`] together with the period roll-up.

pub mod aggregator;
pub mod calculator;
pub mod period;
