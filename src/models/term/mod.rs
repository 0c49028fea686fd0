//! Per-expiry variance calculation
//!
//! Forward price, K0 selection, the out-of-the-money strike walk with zero-bid
//! truncation, and the generalized variance of a single term.

pub mod calculator;

pub use calculator::*;
