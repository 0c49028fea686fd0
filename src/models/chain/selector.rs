use chrono::NaiveDate;
use tracing::{debug, info};

use super::ladder::TermLadder;
use crate::calculation::config::{RootPriority, SelectionConfig};
use crate::calculation::types::{OptionChainSnapshot, OptionQuote, Root};
use crate::error::{CalcResult, VixError};
use crate::models::utils::{days_to_expiry, is_friday, minutes_to_expiry};

/// Near-term and next-term ladders chosen for a quote date
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryPair {
    pub near: TermLadder,
    pub next: TermLadder,
}

/// Picks the two expirations used by the index and pools SPX/SPXW quotes into
/// one ladder per expiry.
#[derive(Debug, Clone, Default)]
pub struct ChainSelector {
    config: SelectionConfig,
}

impl ChainSelector {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Expiries after the quote date that pass the day window and Friday filter,
    /// ascending. The minute threshold is applied later, per ladder.
    pub fn candidate_expiries(&self, snapshot: &OptionChainSnapshot) -> Vec<NaiveDate> {
        let quote_date = snapshot.quote_date;
        snapshot
            .expiries()
            .into_iter()
            .filter(|&expiry| expiry > quote_date)
            .filter(|&expiry| {
                let dte = days_to_expiry(quote_date, expiry);
                self.config.min_days.map_or(true, |min| dte >= min)
                    && self.config.max_days.map_or(true, |max| dte <= max)
            })
            .filter(|&expiry| !self.config.fridays_only || is_friday(expiry))
            .collect()
    }

    /// Select near-term and next-term expirations.
    ///
    /// Near-term is the earliest candidate whose time to expiration reaches the
    /// minimum threshold; next-term is the earliest candidate after it.
    pub fn select(&self, snapshot: &OptionChainSnapshot) -> CalcResult<ExpiryPair> {
        let candidates = self.candidate_expiries(snapshot);
        let mut usable = Vec::with_capacity(2);

        for expiry in candidates {
            let Some(ladder) = self.build_ladder(snapshot, expiry) else {
                continue;
            };
            if ladder.minutes_to_expiry < self.config.min_minutes_to_expiry {
                debug!(
                    quote_date = %snapshot.quote_date,
                    %expiry,
                    minutes = ladder.minutes_to_expiry,
                    "expiry too close, discarded"
                );
                continue;
            }
            usable.push(ladder);
            if usable.len() == 2 {
                break;
            }
        }

        let mut usable = usable.into_iter();
        match (usable.next(), usable.next()) {
            (Some(near), Some(next)) => {
                info!(
                    quote_date = %snapshot.quote_date,
                    near = %near.expiry,
                    near_root = %near.settlement_root,
                    next = %next.expiry,
                    next_root = %next.settlement_root,
                    "selected expirations"
                );
                Ok(ExpiryPair { near, next })
            }
            (near, _) => Err(VixError::InsufficientExpirations {
                quote_date: snapshot.quote_date,
                found: usize::from(near.is_some()),
            }),
        }
    }

    /// Pool every root's quotes for `expiry` into a single ladder, one quote per
    /// strike. Returns `None` when the snapshot has no quotes for the expiry.
    pub fn build_ladder(
        &self,
        snapshot: &OptionChainSnapshot,
        expiry: NaiveDate,
    ) -> Option<TermLadder> {
        let mut pooled: Vec<OptionQuote> = Vec::new();

        // Snapshot quotes are strike-ordered, so same-strike rows are adjacent.
        for quote in snapshot.quotes_for(expiry) {
            match pooled.last_mut() {
                Some(last) if last.strike == quote.strike => {
                    if self.prefers(quote, last) {
                        *last = quote.clone();
                    }
                }
                _ => pooled.push(quote.clone()),
            }
        }

        if pooled.is_empty() {
            return None;
        }

        let settlement_root = self.settlement_root(&pooled);
        let minutes = minutes_to_expiry(
            snapshot.quote_date,
            self.config.quote_time_minutes,
            expiry,
            settlement_root.settlement_minutes(),
        );

        Some(TermLadder::new(
            snapshot.quote_date,
            expiry,
            settlement_root,
            minutes,
            pooled,
        ))
    }

    /// Whether `candidate` should replace `current` at a shared strike.
    fn prefers(&self, candidate: &OptionQuote, current: &OptionQuote) -> bool {
        if candidate.root == current.root {
            return false;
        }
        match self.config.root_priority {
            RootPriority::PreferSpxw => candidate.root == Root::Spxw,
            RootPriority::PreferSpx => candidate.root == Root::Spx,
            RootPriority::TighterSpread => {
                let (c, k) = (candidate.total_spread(), current.total_spread());
                c < k || (c == k && candidate.root == Root::Spxw)
            }
        }
    }

    fn settlement_root(&self, pooled: &[OptionQuote]) -> Root {
        let spx = pooled.iter().filter(|q| q.root == Root::Spx).count();
        let spxw = pooled.len() - spx;

        if spx > spxw {
            Root::Spx
        } else if spxw > spx {
            Root::Spxw
        } else if self.config.root_priority == RootPriority::PreferSpx {
            Root::Spx
        } else {
            Root::Spxw
        }
    }
}
