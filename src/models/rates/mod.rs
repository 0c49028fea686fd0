//! Treasury curve handling
//!
//! Builds per-date CMT par-yield curves and turns them into continuously compounded
//! risk-free rates for an arbitrary time to expiration.

pub mod book;
pub mod curve;

pub use book::*;
pub use curve::*;
