//! Per-table byte/record counters, updated wherever bytes leave or enter the
//! wire (push bodies, pull responses, realtime payloads),
//!
//! Byte accounting uses the serialized length of the outbound/inbound JSON
//! body per record, matching the simple counters the teacher's utility
//! crates use for their own stats (plain data behind a mutex, no external
//! metrics backend).

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct TableCounters {
 pub bytes: u64,
 pub records: u64,
}

/// Snapshot of egress since session start, diagnostics-ready.
#[derive(Debug, Clone, Serialize)]
pub struct EgressSnapshot {
 pub session_started_at: DateTime<Utc>,
 pub total_bytes: u64,
 pub total_records: u64,
 pub by_table: Vec<(String, TableCounters)>,
}

impl EgressSnapshot {
 /// Each table's share of `total_bytes`, as a percentage in `[0, 100]`.
 pub fn percentages(&self) -> Vec<(String, f64)> {
 if self.total_bytes == 0 {
 return self.by_table.iter().map(|(t, _)| (t.clone(), 0.0)).collect();
 }
 self.by_table
 .iter()
 .map(|(table, counters)| {
 (
 table.clone(),
 (counters.bytes as f64 / self.total_bytes as f64) * 100.0,
 )
 })
 .collect()
 }
}

/// Session-lifetime egress counters. One instance per running engine.
pub struct EgressCounters {
 session_started_at: DateTime<Utc>,
 by_table: Mutex<HashMap<String, TableCounters>>,
}

impl EgressCounters {
 pub fn new(session_started_at: DateTime<Utc>) -> Self {
 Self {
 session_started_at,
 by_table: Mutex::new(HashMap::new()),
 }
 }

 /// Records one outbound or inbound record transfer. `value` is
 /// serialized to measure its wire size; serialization failures count as
 /// zero bytes rather than panicking or erroring the sync cycle.
 pub fn record(&self, table: &str, value: &serde_json::Value) {
 let bytes = serde_json::to_vec(value).map(|v| v.len() as u64).unwrap_or(0);
 self.record_bytes(table, bytes, 1);
 }

 pub fn record_bytes(&self, table: &str, bytes: u64, records: u64) {
 let mut by_table = self.by_table.lock().unwrap();
 let entry = by_table.entry(table.to_string()).or_default();
 entry.bytes += bytes;
 entry.records += records;
 }

 pub fn snapshot(&self) -> EgressSnapshot {
 let by_table = self.by_table.lock().unwrap();
 let mut total_bytes = 0;
 let mut total_records = 0;
 let mut rows: Vec<(String, TableCounters)> = Vec::new();
 for (table, counters) in by_table.iter() {
 total_bytes += counters.bytes;
 total_records += counters.records;
 rows.push((table.clone(), *counters));
 }
 rows.sort_by(|a, b| a.0.cmp(&b.0));

 EgressSnapshot {
 session_started_at: self.session_started_at,
 total_bytes,
 total_records,
 by_table: rows,
 }
 }
}

#[cfg(test)]
mod tests {
 use super::*;
 use serde_json::json;

 #[test]
 fn record_accumulates_bytes_and_records_per_table() {
 let counters = EgressCounters::new(Utc::now());
 counters.record("goals", &json!({"id": "g1", "current_value": 1}));
 counters.record("goals", &json!({"id": "g2", "current_value": 2}));
 counters.record("notes", &json!({"id": "n1"}));

 let snapshot = counters.snapshot();
 assert_eq!(snapshot.total_records, 3);
 let goals = snapshot.by_table.iter().find(|(t, _)| t == "goals").unwrap();
 assert_eq!(goals.1.records, 2);
 }

 #[test]
 fn percentages_sum_to_roughly_one_hundred() {
 let counters = EgressCounters::new(Utc::now());
 counters.record_bytes("goals", 80, 1);
 counters.record_bytes("notes", 20, 1);

 let snapshot = counters.snapshot();
 let percentages = snapshot.percentages();
 let total: f64 = percentages.iter().map(|(_, p)| p).sum();
 assert!((total - 100.0).abs() < 1e-9);
 }

 #[test]
 fn percentages_are_zero_when_no_traffic_recorded() {
 let counters = EgressCounters::new(Utc::now());
 let snapshot = counters.snapshot();
 assert!(snapshot.percentages().is_empty());
 }
}
