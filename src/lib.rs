//! # Tetherwatch
//! Periodic stablecoin monitor.
//!
//! Each run fetches the current price, a 30-day price series and the
//! circulating supply, updates the per-month supply snapshot, ranks months by
//! tokens generated and sends one status report.

pub use crate::utils::error::{Error, Result};

pub mod config;
pub mod engine;
pub mod market_data;
pub mod notify;
pub mod period;
pub mod persistence;
pub mod report;
pub mod utils;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::config::Config;
use crate::engine::{lowest_price, GenerationRecord, RankedPeriod, Rollover, SupplyEngine};
use crate::market_data::MarketDataSource;
use crate::notify::Notifier;
use crate::period::Period;
use crate::persistence::{RunLock, SnapshotStore};
use crate::report::{compose_report, ReportInputs};
use crate::utils::types::MarketObservation;

/// What one run did
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub period: Period,
    pub rollover: Rollover,
    /// Snapshot written back this run
    pub persisted: bool,
    pub generation: GenerationRecord,
    pub ranking: Vec<RankedPeriod>,
    pub report: String,
    /// Notification delivered; failures are logged, not returned
    pub notified: bool,
}

/// One monitoring job: fetch, update snapshot, rank, report, notify.
///
/// Runs are sequential and complete on their own. A run either finishes and
/// attempts notification, or aborts before the snapshot is touched.
pub struct MonitorJob<S, N> {
    config: Config,
    tz: Tz,
    store: SnapshotStore,
    engine: SupplyEngine,
    source: S,
    notifier: N,
}

impl<S: MarketDataSource, N: Notifier> MonitorJob<S, N> {
    pub fn new(config: Config, source: S, notifier: N) -> Result<Self> {
        config.validate()?;
        let tz = config.timezone()?;
        let store = SnapshotStore::new(config.snapshot_path());
        let engine = SupplyEngine::new(config.snapshot.persist_policy, config.snapshot.retain_periods);
        Ok(Self { config, tz, store, engine, source, notifier })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Period containing `now` in the configured time zone.
    pub fn period_at(&self, now: DateTime<Utc>) -> Period {
        Period::containing(now.with_timezone(&self.tz).date_naive())
    }

    /// Execute one run at wall-clock `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let period = self.period_at(now);
        log::info!("Starting run for {} ({})", period, now.to_rfc3339());
        match self.run_period(period).await {
            Ok(outcome) => {
                log::info!(
                    "Run for {} complete (rollover: {}, persisted: {}, notified: {})",
                    period,
                    outcome.rollover.is_opened(),
                    outcome.persisted,
                    outcome.notified
                );
                Ok(outcome)
            }
            Err(e) => {
                log::error!("Run for {} aborted: {}", period, e);
                Err(e)
            }
        }
    }

    async fn run_period(&self, period: Period) -> Result<RunOutcome> {
        let _lock = RunLock::acquire(self.config.lock_path(), self.config.lock_stale_after())?;

        // Everything that can fail remotely happens before the snapshot is touched.
        let obs = self.observe().await?;

        let mut snapshot = self.store.load();
        let rollover = self.engine.advance(&mut snapshot, period, obs.circulating_supply);
        let persisted = self.engine.should_persist(&rollover);
        if persisted {
            self.store.save(&snapshot)?;
        }

        let generation = self.engine.generation(&snapshot, period, obs.circulating_supply);
        let ranking = self.engine.rank(&generation);
        let thirty_day_low = lowest_price(&obs.price_series);
        if thirty_day_low.is_none() {
            log::warn!("Price series for {} is empty; lowest-value comparison omitted", period);
        }

        let report = compose_report(&ReportInputs {
            asset_name: &self.config.asset.name,
            asset_symbol: &self.config.asset.symbol,
            currency: &self.config.asset.vs_currency,
            current_value: obs.current_value,
            thirty_day_low,
            current_supply: obs.circulating_supply,
            period_start_supply: snapshot.get(&period),
            generation: &generation,
            ranking: &ranking,
            sentiment: obs.sentiment.as_ref(),
            secondary_index: obs.secondary_index.as_ref(),
            supply_decimals: self.config.report.supply_decimals,
        });

        let notified = match self.notifier.notify(&report).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to deliver report for {}: {}", period, e);
                false
            }
        };

        Ok(RunOutcome { period, rollover, persisted, generation, ranking, report, notified })
    }

    async fn observe(&self) -> Result<MarketObservation> {
        let current_value = self.source.fetch_current_value().await?;
        let price_series = self
            .source
            .fetch_recent_price_series(self.config.market.window_days)
            .await?;
        let circulating_supply = self.source.fetch_circulating_supply().await?;
        if !circulating_supply.is_finite() || circulating_supply <= 0.0 {
            return Err(Error::data_source(
                "circulating_supply",
                format!("unusable supply value {}", circulating_supply),
            ));
        }

        let sentiment = if self.config.metrics.sentiment {
            match self.source.fetch_sentiment_index().await {
                Ok(reading) => Some(reading),
                Err(e) => {
                    log::warn!("Sentiment index unavailable, omitting from report: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let secondary_index = if self.config.metrics.secondary_index.is_some() {
            match self.source.fetch_secondary_index().await {
                Ok(index) => Some(index),
                Err(e) => {
                    log::warn!("Secondary index unavailable, omitting from report: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(MarketObservation { current_value, price_series, circulating_supply, sentiment, secondary_index })
    }
}
