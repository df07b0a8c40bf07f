//! Supply snapshot persistence.
//!
//! The durable state of the monitor is a single JSON object mapping period
//! keys (`"2024-03"`) to the circulating supply recorded at the start of that
//! period. [`SnapshotStore`] is the only code that writes it; everything else
//! works on an in-memory [`SupplySnapshot`].
//!
//! Decoding is strict and fails closed: anything that is not a flat object of
//! unique period keys to finite, non-negative numbers is rejected and the
//! built-in default table is used instead.

pub mod lock;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::period::Period;
use crate::utils::error::{Error, Result};
use crate::utils::write_file_atomic;

pub use lock::RunLock;

/// Circulating supply recorded per period, in calendar order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplySnapshot {
    entries: BTreeMap<Period, f64>,
}

impl SupplySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in table used when no usable persisted state exists.
    pub fn builtin_default() -> Self {
        const TABLE: [(i32, u32, f64); 6] = [
            (2024, 1, 91_717_981_000.0),
            (2024, 2, 96_223_034_000.0),
            (2024, 3, 99_057_436_000.0),
            (2024, 4, 104_021_178_000.0),
            (2024, 5, 110_493_662_000.0),
            (2024, 6, 111_978_295_000.0),
        ];
        TABLE
            .iter()
            .filter_map(|&(y, m, v)| Period::new(y, m).map(|p| (p, v)))
            .collect()
    }

    pub fn get(&self, period: &Period) -> Option<f64> {
        self.entries.get(period).copied()
    }

    /// Record `supply` for `period`, replacing any previous value.
    pub fn insert(&mut self, period: Period, supply: f64) -> Option<f64> {
        self.entries.insert(period, supply)
    }

    /// Most recent recorded period.
    pub fn latest(&self) -> Option<Period> {
        self.entries.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Period, f64)> + '_ {
        self.entries.iter().map(|(p, v)| (*p, *v))
    }

    /// Drop the oldest entries so at most `keep` remain. Returns the removed periods.
    pub fn retain_latest(&mut self, keep: usize) -> Vec<Period> {
        let mut removed = Vec::new();
        while self.entries.len() > keep {
            match self.entries.pop_first() {
                Some((p, _)) => removed.push(p),
                None => break,
            }
        }
        removed
    }
}

impl FromIterator<(Period, f64)> for SupplySnapshot {
    fn from_iter<I: IntoIterator<Item = (Period, f64)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

impl Serialize for SupplySnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (period, supply) in &self.entries {
            map.serialize_entry(&period.key(), supply)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SupplySnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SnapshotVisitor;

        impl<'de> Visitor<'de> for SnapshotVisitor {
            type Value = SupplySnapshot;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping YYYY-MM keys to non-negative supply values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
                let mut entries = BTreeMap::new();
                while let Some((key, supply)) = access.next_entry::<String, f64>()? {
                    let period: Period = key.parse().map_err(de::Error::custom)?;
                    if !supply.is_finite() || supply < 0.0 {
                        return Err(de::Error::custom(format!("invalid supply {} for {}", supply, key)));
                    }
                    if entries.insert(period, supply).is_some() {
                        return Err(de::Error::custom(format!("duplicate period {}", key)));
                    }
                }
                Ok(SupplySnapshot { entries })
            }
        }

        deserializer.deserialize_map(SnapshotVisitor)
    }
}

/// JSON file backing the supply snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read persisted state, falling back to [`SupplySnapshot::builtin_default`]
    /// when the file is missing, empty, unreadable or malformed.
    pub fn load(&self) -> SupplySnapshot {
        match self.try_load() {
            Ok(snapshot) => {
                log::debug!("Loaded {} snapshot entries from {}", snapshot.len(), self.path.display());
                snapshot
            }
            Err(reason) => {
                log::warn!(
                    "Using built-in default snapshot, {} unusable: {}",
                    self.path.display(),
                    reason
                );
                SupplySnapshot::builtin_default()
            }
        }
    }

    fn try_load(&self) -> std::result::Result<SupplySnapshot, String> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err("file not found".into()),
            Err(e) => return Err(format!("read failed: {}", e)),
        };
        if content.trim().is_empty() {
            return Err("file is empty".into());
        }
        let snapshot: SupplySnapshot =
            serde_json::from_str(&content).map_err(|e| format!("parse failed: {}", e))?;
        if snapshot.is_empty() {
            return Err("no entries".into());
        }
        Ok(snapshot)
    }

    /// Overwrite the backing file with the full snapshot.
    pub fn save(&self, snapshot: &SupplySnapshot) -> Result<()> {
        let mut body = serde_json::to_string_pretty(snapshot)?;
        body.push('\n');
        write_file_atomic(&self.path, body).map_err(|source| Error::Persist {
            path: self.path.clone(),
            source,
        })?;
        log::info!("Saved {} snapshot entries to {}", snapshot.len(), self.path.display());
        Ok(())
    }
}
