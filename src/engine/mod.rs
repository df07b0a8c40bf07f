//! Delta & ranking engine.
//!
//! Turns a [`SupplySnapshot`] plus one freshly observed supply value into the
//! tokens generated per period and a ranking of those periods. Generation is
//! always recomputed from the frozen period-start values, so running twice in
//! the same period with the same observation gives the same answer.

pub mod stats;

use serde::{Deserialize, Serialize};

use crate::period::Period;
use crate::persistence::SupplySnapshot;

pub use stats::{lowest_price, percentage_change, Direction};

/// When the snapshot is written back to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistPolicy {
    /// Every run
    Always,
    /// Only when a new period was opened
    #[default]
    OnRollover,
}

/// Outcome of [`SupplyEngine::advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rollover {
    /// `now` is already the open period; nothing changed.
    None,
    /// A new current period was recorded.
    Opened {
        period: Period,
        /// Calendar months between the previous latest period and `period`
        /// that have no snapshot (missed runs).
        skipped: u32,
        /// Oldest periods dropped by retention.
        pruned: Vec<Period>,
    },
}

impl Rollover {
    pub fn is_opened(&self) -> bool {
        matches!(self, Rollover::Opened { .. })
    }
}

/// Tokens generated during one period; `None` when there is no data to compare.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodGeneration {
    pub period: Period,
    pub amount: Option<f64>,
}

/// Generated tokens for every known period, in calendar order.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRecord {
    current: Period,
    entries: Vec<PeriodGeneration>,
}

impl GenerationRecord {
    pub fn current(&self) -> Period {
        self.current
    }

    pub fn entries(&self) -> &[PeriodGeneration] {
        &self.entries
    }

    pub fn amount(&self, period: &Period) -> Option<f64> {
        self.entries.iter().find(|e| e.period == *period).and_then(|e| e.amount)
    }

    /// Generated amount for the open period, if known.
    pub fn current_amount(&self) -> Option<f64> {
        self.amount(&self.current)
    }

    /// Periods reported as "no data".
    pub fn missing(&self) -> impl Iterator<Item = Period> + '_ {
        self.entries.iter().filter(|e| e.amount.is_none()).map(|e| e.period)
    }
}

/// One row of the ranking; rank 1 is the largest generator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedPeriod {
    pub rank: usize,
    pub period: Period,
    pub amount: f64,
}

/// A snapshot value usable as a baseline. Zero marks an uninitialised entry.
fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

#[derive(Debug, Clone)]
pub struct SupplyEngine {
    policy: PersistPolicy,
    retain_periods: usize,
}

impl SupplyEngine {
    pub fn new(policy: PersistPolicy, retain_periods: usize) -> Self {
        Self { policy, retain_periods: retain_periods.max(1) }
    }

    /// Apply the period-boundary policy.
    ///
    /// The boundary is found by comparing the latest period holding a usable
    /// value with `now`; uninitialised placeholders (including ones seeded
    /// for future months) and the day of month play no part, so a boundary
    /// missed by a skipped run is still picked up on the next one.
    pub fn advance(&self, snapshot: &mut SupplySnapshot, now: Period, observed_supply: f64) -> Rollover {
        if usable(snapshot.get(&now)).is_some() {
            return Rollover::None;
        }

        let latest = snapshot
            .iter()
            .filter(|(_, value)| usable(Some(*value)).is_some())
            .map(|(period, _)| period)
            .last();
        let skipped = match latest {
            None => 0,
            Some(latest) if latest < now => (latest.months_until(&now) - 1).max(0) as u32,
            Some(latest) => {
                log::warn!(
                    "Current period {} precedes initialised snapshot period {}; leaving snapshot unchanged",
                    now,
                    latest
                );
                return Rollover::None;
            }
        };

        if skipped > 0 {
            log::warn!(
                "{} period(s) before {} have no snapshot; their generation will be reported as no data",
                skipped,
                now
            );
        }
        snapshot.insert(now, observed_supply);
        let pruned = snapshot.retain_latest(self.retain_periods);
        log::info!("Opened period {} with starting supply {:.2}", now, observed_supply);
        Rollover::Opened { period: now, skipped, pruned }
    }

    pub fn should_persist(&self, rollover: &Rollover) -> bool {
        match self.policy {
            PersistPolicy::Always => true,
            PersistPolicy::OnRollover => rollover.is_opened(),
        }
    }

    /// Tokens generated per period.
    ///
    /// A closed period generates `snapshot[next] - snapshot[period]`; the open
    /// period `now` generates `observed_supply - snapshot[now]`. Missing or
    /// uninitialised values yield no data rather than zero.
    pub fn generation(&self, snapshot: &SupplySnapshot, now: Period, observed_supply: f64) -> GenerationRecord {
        let mut entries = Vec::with_capacity(snapshot.len() + 1);

        for (period, value) in snapshot.iter() {
            let start = usable(Some(value));
            let amount = if period < now {
                let next = period.next();
                match (start, usable(snapshot.get(&next))) {
                    (Some(start), Some(end)) => Some(end - start),
                    (None, _) => {
                        log::warn!("Snapshot for {} is uninitialised; no generation data", period);
                        None
                    }
                    (Some(_), None) => {
                        log::warn!("Snapshot for {} is missing; cannot close {}", next, period);
                        None
                    }
                }
            } else if period == now {
                match start {
                    Some(start) => Some(observed_supply - start),
                    None => {
                        log::warn!("Current period {} has no starting snapshot; no data for comparison", now);
                        None
                    }
                }
            } else {
                log::warn!("Snapshot holds future period {} (now {}); ignored", period, now);
                None
            };
            entries.push(PeriodGeneration { period, amount });
        }

        if snapshot.get(&now).is_none() {
            log::warn!("Current period {} missing from snapshot; no data for comparison", now);
            let at = entries.partition_point(|e| e.period < now);
            entries.insert(at, PeriodGeneration { period: now, amount: None });
        }

        GenerationRecord { current: now, entries }
    }

    /// Rank periods with data by generated amount, largest first.
    ///
    /// The sort is stable over calendar order, so equal amounts rank the
    /// earlier period first.
    pub fn rank(&self, record: &GenerationRecord) -> Vec<RankedPeriod> {
        let mut rows: Vec<(Period, f64)> = record
            .entries()
            .iter()
            .filter_map(|e| e.amount.map(|a| (e.period, a)))
            .collect();
        rows.sort_by(|a, b| b.1.total_cmp(&a.1));
        rows.into_iter()
            .enumerate()
            .map(|(i, (period, amount))| RankedPeriod { rank: i + 1, period, amount })
            .collect()
    }
}

impl Default for SupplyEngine {
    fn default() -> Self {
        Self::new(PersistPolicy::default(), 24)
    }
}
