//! Expiration selection and strike-ladder construction
//!
//! Chooses the near-term and next-term expirations bracketing the 30-day horizon and
//! pools SPX/SPXW quotes into one ascending-strike ladder per expiry.

pub mod ladder;
pub mod selector;

pub use ladder::*;
pub use selector::*;
