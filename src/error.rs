//! Error and warning types for the VIX calculation engine.
//!
//! Every fatal condition aborts the calculation for a single quote date and carries
//! that date so a batch runner can report exactly which dates were skipped and why.
//! Non-fatal numeric guards are recorded on the results instead of being raised.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which of the two VIX terms a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TermKind {
    Near,
    Next,
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermKind::Near => write!(f, "near-term"),
            TermKind::Next => write!(f, "next-term"),
        }
    }
}

/// Out-of-the-money wing of a strike ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LadderSide {
    /// Puts below K0
    Puts,
    /// Calls above K0
    Calls,
}

impl fmt::Display for LadderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LadderSide::Puts => write!(f, "put"),
            LadderSide::Calls => write!(f, "call"),
        }
    }
}

/// Fatal calculation failures. Any of these aborts the quote date.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VixError {
    #[error("{quote_date}: only {found} usable expiration(s), need two")]
    InsufficientExpirations { quote_date: NaiveDate, found: usize },

    #[error("{quote_date}: no treasury tenor points available for {rate_date}")]
    MissingRateData {
        quote_date: NaiveDate,
        rate_date: NaiveDate,
    },

    #[error(
        "{quote_date}: {} expiry {expiry} has {found} usable {side} strike(s), need {required}",
        term_label(.term)
    )]
    InsufficientStrikes {
        quote_date: NaiveDate,
        expiry: NaiveDate,
        term: Option<TermKind>,
        side: LadderSide,
        found: usize,
        required: usize,
    },

    #[error("{quote_date}: combined 30-day variance {variance} is not a positive finite number")]
    DegenerateVariance { quote_date: NaiveDate, variance: f64 },

    #[error("{quote_date}: invalid input: {reason}")]
    InvalidInput { quote_date: NaiveDate, reason: String },
}

impl VixError {
    pub fn quote_date(&self) -> NaiveDate {
        match self {
            VixError::InsufficientExpirations { quote_date, .. }
            | VixError::MissingRateData { quote_date, .. }
            | VixError::InsufficientStrikes { quote_date, .. }
            | VixError::DegenerateVariance { quote_date, .. }
            | VixError::InvalidInput { quote_date, .. } => *quote_date,
        }
    }

    /// Attach the term label to a term-level failure raised before the engine knew it.
    pub fn for_term(self, kind: TermKind) -> Self {
        match self {
            VixError::InsufficientStrikes {
                quote_date,
                expiry,
                side,
                found,
                required,
                ..
            } => VixError::InsufficientStrikes {
                quote_date,
                expiry,
                term: Some(kind),
                side,
                found,
                required,
            },
            other => other,
        }
    }

    pub fn invalid_input(quote_date: NaiveDate, reason: impl Into<String>) -> Self {
        VixError::InvalidInput {
            quote_date,
            reason: reason.into(),
        }
    }
}

fn term_label(term: &Option<TermKind>) -> String {
    term.map_or_else(|| "term".to_string(), |t| t.to_string())
}

pub type CalcResult<T> = std::result::Result<T, VixError>;

/// Non-fatal numeric guard that fired while producing a result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NumericGuard {
    /// Requested maturity fell outside the tenor range; the nearest tenor was used.
    RateClamped {
        term: Option<TermKind>,
        years: f64,
        tenor_days: u32,
    },
    /// Generalized variance came out negative and was clamped to zero.
    VarianceClamped { term: Option<TermKind>, raw: f64 },
}

impl NumericGuard {
    pub fn for_term(self, kind: TermKind) -> Self {
        match self {
            NumericGuard::RateClamped {
                years, tenor_days, ..
            } => NumericGuard::RateClamped {
                term: Some(kind),
                years,
                tenor_days,
            },
            NumericGuard::VarianceClamped { raw, .. } => NumericGuard::VarianceClamped {
                term: Some(kind),
                raw,
            },
        }
    }

    /// Short tag used in flattened CSV output.
    pub fn tag(&self) -> String {
        let term = |t: &Option<TermKind>| match t {
            Some(TermKind::Near) => "near",
            Some(TermKind::Next) => "next",
            None => "term",
        };
        match self {
            NumericGuard::RateClamped { term: t, .. } => format!("{}_rate_clamped", term(t)),
            NumericGuard::VarianceClamped { term: t, .. } => {
                format!("{}_variance_clamped", term(t))
            }
        }
    }
}
