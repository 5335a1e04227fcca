//! Terminal tracker for daily work hours. Hours are recorded once per day,
//! the remaining business days of a month can be filled in bulk, and the
//! monthly pay is derived from an hourly rate stored next to the records.
//!

pub mod cli;
pub mod ledger;
pub mod utils;
