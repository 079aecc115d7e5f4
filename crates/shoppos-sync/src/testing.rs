//! In-memory [`RemoteStore`] with per-table failure injection.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::{RwLock, RwLockWriteGuard};

use crate::error::{SyncError, SyncResult};
use crate::remote::{Filter, RemoteQuery, RemoteStore, RemoteTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Insert,
    Select,
    Update,
}

#[derive(Default)]
pub struct MemoryRemote {
    tables: Mutex<HashMap<RemoteTable, Vec<Value>>>,
    failing: Mutex<HashSet<(RemoteTable, Op)>>,
    calls: Mutex<HashMap<(RemoteTable, Op), usize>>,
    next_id: AtomicU64,
    gate: RwLock<()>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later `op` on `table` fails with `RemoteUnreachable`.
    pub fn fail(&self, table: RemoteTable, op: Op) {
        self.failing.lock().unwrap().insert((table, op));
    }

    pub fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    pub fn rows(&self, table: RemoteTable) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn seed(&self, table: RemoteTable, rows: Vec<Value>) {
        self.tables
            .lock()
            .unwrap()
            .entry(table)
            .or_default()
            .extend(rows);
    }

    /// Parks every call after it is counted until the guard is dropped.
    pub fn hold(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.try_write().unwrap()
    }

    pub fn calls(&self, table: RemoteTable, op: Op) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&(table, op))
            .copied()
            .unwrap_or(0)
    }

    async fn enter(&self, table: RemoteTable, op: Op) -> SyncResult<()> {
        // every call suspends once, like a network round trip
        tokio::task::yield_now().await;
        *self.calls.lock().unwrap().entry((table, op)).or_default() += 1;
        drop(self.gate.read().await);
        if self.failing.lock().unwrap().contains(&(table, op)) {
            return Err(SyncError::RemoteUnreachable(format!(
                "injected {:?} failure on {}",
                op, table
            )));
        }
        Ok(())
    }
}

fn matches_all(filters: &[Filter], row: &Value) -> bool {
    filters.iter().all(|f| f.matches(row))
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn insert(&self, table: RemoteTable, rows: Vec<Value>) -> SyncResult<Vec<Value>> {
        self.enter(table, Op::Insert).await?;

        let mut stored = Vec::with_capacity(rows.len());
        for mut row in rows {
            if let Value::Object(map) = &mut row {
                if !map.contains_key("id") {
                    let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                    map.insert("id".into(), Value::String(format!("remote-{}", id)));
                }
            }
            stored.push(row);
        }

        self.seed(table, stored.clone());
        Ok(stored)
    }

    async fn select(&self, table: RemoteTable, query: &RemoteQuery) -> SyncResult<Vec<Value>> {
        self.enter(table, Op::Select).await?;

        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| matches_all(&query.filters, row))
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by_key(|row| row.get(&order.column).map(|v| v.to_string()));
            if !order.ascending {
                rows.reverse();
            }
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn update(
        &self,
        table: RemoteTable,
        filters: &[Filter],
        patch: Value,
    ) -> SyncResult<Vec<Value>> {
        self.enter(table, Op::Update).await?;

        let patch: Map<String, Value> = match patch {
            Value::Object(map) => map,
            other => {
                return Err(SyncError::RemoteRejected {
                    status: 400,
                    message: format!("patch must be an object, got {}", other),
                })
            }
        };

        let mut tables = self.tables.lock().unwrap();
        let mut updated = Vec::new();
        for row in tables.entry(table).or_default().iter_mut() {
            if !matches_all(filters, row) {
                continue;
            }
            if let Value::Object(map) = row {
                for (k, v) in &patch {
                    map.insert(k.clone(), v.clone());
                }
            }
            updated.push(row.clone());
        }
        Ok(updated)
    }
}
