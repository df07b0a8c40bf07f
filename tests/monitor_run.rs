//! End-to-end runs of the monitor against in-memory market data and a
//! recording notifier.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{tempdir, TempDir};

use tetherwatch::config::Config;
use tetherwatch::engine::{PersistPolicy, Rollover};
use tetherwatch::market_data::MarketDataSource;
use tetherwatch::notify::Notifier;
use tetherwatch::period::Period;
use tetherwatch::persistence::{RunLock, SnapshotStore, SupplySnapshot};
use tetherwatch::utils::types::{PricePoint, SecondaryIndex, SentimentReading};
use tetherwatch::{Error, MonitorJob, Result};

struct FakeSource {
    supply: Option<f64>,
    sentiment: Option<u8>,
}

#[async_trait]
impl MarketDataSource for FakeSource {
    async fn fetch_current_value(&self) -> Result<f64> {
        Ok(1.00)
    }

    async fn fetch_recent_price_series(&self, _window_days: u32) -> Result<Vec<PricePoint>> {
        Ok(vec![PricePoint::new(1_000, 0.99), PricePoint::new(2_000, 0.98), PricePoint::new(3_000, 1.01)])
    }

    async fn fetch_circulating_supply(&self) -> Result<f64> {
        self.supply.ok_or_else(|| Error::data_source("circulating_supply", "503 Service Unavailable"))
    }

    async fn fetch_sentiment_index(&self) -> Result<SentimentReading> {
        self.sentiment
            .map(|index| SentimentReading { index, label: "n/a".to_string() })
            .ok_or_else(|| Error::data_source("sentiment_index", "connection reset"))
    }

    async fn fetch_secondary_index(&self) -> Result<SecondaryIndex> {
        Err(Error::data_source("secondary_index", "not available"))
    }
}

#[derive(Clone, Default)]
struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        if self.fail {
            return Err(Error::NotifyError("invalid_auth".to_string()));
        }
        self.sent.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

fn p(y: i32, m: u32) -> Period {
    Period::new(y, m).unwrap()
}

fn config_in(dir: &TempDir, policy: PersistPolicy) -> Config {
    let mut config = Config::default();
    config.snapshot.path = dir.path().join("supply_snapshot.json").to_string_lossy().into_owned();
    config.snapshot.persist_policy = policy;
    config
}

fn seed(config: &Config, entries: &[(Period, f64)]) -> SnapshotStore {
    let store = SnapshotStore::new(config.snapshot_path());
    let snapshot: SupplySnapshot = entries.iter().copied().collect();
    store.save(&snapshot).unwrap();
    store
}

fn source(supply: f64) -> FakeSource {
    FakeSource { supply: Some(supply), sentiment: Some(62) }
}

#[tokio::test]
async fn rollover_into_march_ranks_closed_months() {
    let dir = tempdir().unwrap();
    let config = config_in(&dir, PersistPolicy::OnRollover);
    let store = seed(&config, &[(p(2024, 1), 100e9), (p(2024, 2), 150e9)]);
    let notifier = RecordingNotifier::default();

    let job = MonitorJob::new(config, source(180e9), notifier.clone()).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
    let outcome = job.run(now).await.unwrap();

    assert_eq!(outcome.rollover, Rollover::Opened { period: p(2024, 3), skipped: 0, pruned: vec![] });
    assert!(outcome.persisted);
    assert_eq!(store.load().get(&p(2024, 3)), Some(180e9));

    assert_eq!(outcome.generation.amount(&p(2024, 1)), Some(50e9));
    assert_eq!(outcome.generation.amount(&p(2024, 2)), Some(30e9));
    assert_eq!(outcome.generation.current_amount(), Some(0.0));
    let order: Vec<Period> = outcome.ranking.iter().map(|r| r.period).collect();
    assert_eq!(order, vec![p(2024, 1), p(2024, 2), p(2024, 3)]);

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].starts_with("*Tether (USDT) status for March 2024*"));
    assert!(sent[0].contains("1. January 2024"));
    assert!(sent[0].contains("Fear & Greed Index: 62 (Greed, provider: n/a)"));
}

#[tokio::test]
async fn mid_period_runs_use_frozen_baseline() {
    let dir = tempdir().unwrap();
    let config = config_in(&dir, PersistPolicy::OnRollover);
    let store = seed(&config, &[(p(2024, 1), 100e9), (p(2024, 2), 150e9), (p(2024, 3), 180e9)]);
    let before = std::fs::read(store.path()).unwrap();

    let job = MonitorJob::new(config, source(190e9), RecordingNotifier::default()).unwrap();
    let now = Utc.with_ymd_and_hms(2024, 3, 20, 8, 0, 0).unwrap();
    let first = job.run(now).await.unwrap();
    let second = job.run(now).await.unwrap();

    assert_eq!(first.rollover, Rollover::None);
    assert!(!first.persisted);
    assert_eq!(first.generation.current_amount(), Some(10e9));
    assert_eq!(first.report, second.report);
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
}

#[tokio::test]
async fn always_policy_rewrites_without_moving_baselines() {
    let dir = tempdir().unwrap();
    let config = config_in(&dir, PersistPolicy::Always);
    let store = seed(&config, &[(p(2024, 2), 150e9), (p(2024, 3), 180e9)]);

    let job = MonitorJob::new(config, source(195e9), RecordingNotifier::default()).unwrap();
    let outcome = job.run(Utc.with_ymd_and_hms(2024, 3, 9, 8, 0, 0).unwrap()).await.unwrap();

    assert_eq!(outcome.rollover, Rollover::None);
    assert!(outcome.persisted);
    let snapshot = store.load();
    assert_eq!(snapshot.get(&p(2024, 3)), Some(180e9));
    assert_eq!(snapshot.len(), 2);
}

#[tokio::test]
async fn skipped_month_is_reported_as_no_data() {
    let dir = tempdir().unwrap();
    let config = config_in(&dir, PersistPolicy::OnRollover);
    seed(&config, &[(p(2024, 1), 100e9), (p(2024, 2), 150e9)]);

    let job = MonitorJob::new(config, source(200e9), RecordingNotifier::default()).unwrap();
    let outcome = job.run(Utc.with_ymd_and_hms(2024, 4, 2, 8, 0, 0).unwrap()).await.unwrap();

    assert_eq!(outcome.rollover, Rollover::Opened { period: p(2024, 4), skipped: 1, pruned: vec![] });
    assert_eq!(outcome.generation.amount(&p(2024, 1)), Some(50e9));
    assert_eq!(outcome.generation.amount(&p(2024, 2)), None);
    assert!(outcome.report.contains("No data: February 2024"));
}

#[tokio::test]
async fn source_failure_leaves_snapshot_untouched() {
    let dir = tempdir().unwrap();
    let config = config_in(&dir, PersistPolicy::Always);
    let store = seed(&config, &[(p(2024, 1), 100e9), (p(2024, 2), 150e9)]);
    let before = std::fs::read(store.path()).unwrap();
    let notifier = RecordingNotifier::default();

    let failing = FakeSource { supply: None, sentiment: Some(40) };
    let job = MonitorJob::new(config, failing, notifier.clone()).unwrap();
    let result = job.run(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()).await;

    assert!(matches!(result, Err(Error::DataSource { stage: "circulating_supply", .. })));
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
    assert!(notifier.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn optional_metrics_and_delivery_failures_do_not_abort() {
    let dir = tempdir().unwrap();
    let config = config_in(&dir, PersistPolicy::OnRollover);
    seed(&config, &[(p(2024, 2), 150e9)]);
    let notifier = RecordingNotifier { fail: true, ..Default::default() };

    let no_sentiment = FakeSource { supply: Some(160e9), sentiment: None };
    let job = MonitorJob::new(config, no_sentiment, notifier).unwrap();
    let outcome = job.run(Utc.with_ymd_and_hms(2024, 2, 14, 8, 0, 0).unwrap()).await.unwrap();

    assert!(!outcome.notified);
    assert!(!outcome.report.contains("Fear & Greed"));
    assert_eq!(outcome.generation.current_amount(), Some(10e9));
}

#[tokio::test]
async fn missing_snapshot_file_falls_back_to_builtin_table() {
    let dir = tempdir().unwrap();
    let config = config_in(&dir, PersistPolicy::OnRollover);
    let store = SnapshotStore::new(config.snapshot_path());

    let job = MonitorJob::new(config, source(112_500_000_000.0), RecordingNotifier::default()).unwrap();
    let outcome = job.run(Utc.with_ymd_and_hms(2024, 6, 20, 8, 0, 0).unwrap()).await.unwrap();

    assert_eq!(outcome.rollover, Rollover::None);
    assert!(!store.path().exists());
    let june_start = SupplySnapshot::builtin_default().get(&p(2024, 6)).unwrap();
    assert_eq!(outcome.generation.current_amount(), Some(112_500_000_000.0 - june_start));
    assert_eq!(outcome.ranking.len(), 6);
}

#[tokio::test]
async fn concurrent_run_is_refused_while_lock_is_held() {
    let dir = tempdir().unwrap();
    let config = config_in(&dir, PersistPolicy::Always);
    let store = seed(&config, &[(p(2024, 1), 100e9), (p(2024, 2), 150e9)]);
    let before = std::fs::read(store.path()).unwrap();
    let held = RunLock::acquire(config.lock_path(), Duration::from_secs(3600)).unwrap();
    let notifier = RecordingNotifier::default();

    let job = MonitorJob::new(config, source(180e9), notifier.clone()).unwrap();
    let result = job.run(Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()).await;

    assert!(matches!(result, Err(Error::Locked { .. })));
    assert_eq!(std::fs::read(store.path()).unwrap(), before);
    assert!(notifier.sent.lock().unwrap().is_empty());
    assert!(held.path().exists());
}

#[tokio::test]
async fn snapshot_write_failure_aborts_before_notifying() {
    let dir = tempdir().unwrap();
    let config = config_in(&dir, PersistPolicy::OnRollover);
    // A non-empty directory where the snapshot file should be cannot be replaced
    let occupied = config.snapshot_path();
    std::fs::create_dir(&occupied).unwrap();
    std::fs::write(occupied.join("keep"), "x").unwrap();
    let notifier = RecordingNotifier::default();

    let job = MonitorJob::new(config.clone(), source(115e9), notifier.clone()).unwrap();
    let result = job.run(Utc.with_ymd_and_hms(2024, 7, 1, 8, 0, 0).unwrap()).await;

    assert!(matches!(result, Err(Error::Persist { .. })));
    assert!(notifier.sent.lock().unwrap().is_empty());
    assert!(occupied.is_dir());
    assert!(!config.lock_path().exists());
}

#[tokio::test]
async fn december_closes_against_january_of_next_year() {
    let dir = tempdir().unwrap();
    let config = config_in(&dir, PersistPolicy::OnRollover);
    let store = seed(&config, &[(p(2023, 11), 80e9), (p(2023, 12), 100e9)]);

    let job = MonitorJob::new(config, source(120e9), RecordingNotifier::default()).unwrap();
    let outcome = job.run(Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap()).await.unwrap();

    assert_eq!(outcome.rollover, Rollover::Opened { period: p(2024, 1), skipped: 0, pruned: vec![] });
    assert_eq!(store.load().latest(), Some(p(2024, 1)));
    assert_eq!(outcome.generation.amount(&p(2023, 12)), Some(20e9));
    assert_eq!(outcome.generation.amount(&p(2023, 11)), Some(20e9));
    // Equal amounts keep calendar order
    let order: Vec<Period> = outcome.ranking.iter().map(|r| r.period).collect();
    assert_eq!(order, vec![p(2023, 11), p(2023, 12), p(2024, 1)]);
    assert!(outcome.report.contains("1. November 2023"));
    assert!(outcome.report.contains("2. December 2023"));
}
