// crates/server/src/result_store.rs
//! Holds the most recently published result bundle.
//!
//! The bundle sits behind an `Arc` that is swapped as a whole, so a reader
//! always sees every field from the same run.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use optimizer_hub_core::{ResultBundle, ResultField};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("result store lock poisoned")]
    Poisoned,
}

struct Published {
    bundle: Arc<ResultBundle>,
    published_at: Option<DateTime<Utc>>,
}

/// Single-writer, many-reader store for the live [`ResultBundle`].
///
/// Uses `std::sync::RwLock` (not `tokio::sync::RwLock`): the lock is only
/// held long enough to clone or replace an `Arc`, never across `.await`.
pub struct ResultStore {
    current: RwLock<Published>,
}

impl ResultStore {
    /// Empty store; every field reads as an empty sequence.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Published {
                bundle: Arc::new(ResultBundle::default()),
                published_at: None,
            }),
        }
    }

    /// Replace all five sequences at once.
    pub fn publish(&self, bundle: ResultBundle) -> Result<(), StoreError> {
        let mut guard = self.current.write().map_err(|_| StoreError::Poisoned)?;
        *guard = Published {
            bundle: Arc::new(bundle),
            published_at: Some(Utc::now()),
        };
        Ok(())
    }

    /// The whole bundle as of now.
    pub fn snapshot(&self) -> Result<Arc<ResultBundle>, StoreError> {
        self.current
            .read()
            .map(|g| Arc::clone(&g.bundle))
            .map_err(|_| StoreError::Poisoned)
    }

    /// One field of the current bundle, in the order the routine returned it.
    pub fn read(&self, field: ResultField) -> Result<Vec<Value>, StoreError> {
        Ok(self.snapshot()?.field(field).to_vec())
    }

    /// When the current bundle was published; `None` before the first run.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        match self.current.read() {
            Ok(g) => g.published_at,
            Err(e) => {
                tracing::error!("RwLock poisoned reading published_at: {e}");
                None
            }
        }
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn bundle(tag: u64) -> ResultBundle {
        ResultBundle {
            summary_reports: vec![json!({ "run": tag })],
            status_log: vec![json!({ "run": tag })],
            impacted_resources: vec![json!({ "run": tag })],
            trend_data: vec![json!({ "run": tag })],
            anomalies: vec![json!({ "run": tag })],
        }
    }

    #[test]
    fn test_empty_before_first_publish() {
        let store = ResultStore::new();
        for field in ResultField::ALL {
            assert!(store.read(field).unwrap().is_empty());
        }
        assert!(store.published_at().is_none());
    }

    #[test]
    fn test_publish_replaces_every_field() {
        let store = ResultStore::new();
        store.publish(bundle(1)).unwrap();
        store.publish(bundle(2)).unwrap();

        for field in ResultField::ALL {
            assert_eq!(store.read(field).unwrap(), vec![json!({ "run": 2 })]);
        }
        assert!(store.published_at().is_some());
    }

    #[test]
    fn test_repeated_reads_are_stable() {
        let store = ResultStore::new();
        store.publish(bundle(5)).unwrap();
        let first = store.read(ResultField::TrendData).unwrap();
        for _ in 0..10 {
            assert_eq!(store.read(ResultField::TrendData).unwrap(), first);
        }
    }

    #[test]
    fn test_concurrent_readers_never_see_mixed_runs() {
        let store = Arc::new(ResultStore::new());
        store.publish(bundle(0)).unwrap();

        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for tag in 1..=500 {
                    store.publish(bundle(tag)).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let snap = store.snapshot().unwrap();
                        let tag = &snap.summary_reports[0];
                        for field in ResultField::ALL {
                            assert_eq!(&snap.field(field)[0], tag, "mixed bundle observed");
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
    }
}
