//! Combination of the two term variances into the 30-day index, and the chain
//! diagnostics reported alongside it.

pub mod combine;
pub mod diagnostics;

pub use combine::*;
pub use diagnostics::*;
