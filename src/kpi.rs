//! Read-only payroll cost reporting
//!
//! Entries are joined to their dimensions in memory by [`facts`], grouped by [`dimension`]
//! and summarized by [`report`].

pub mod dimension;
pub mod facts;
pub mod report;
