//! Recently-modified guard: every local write is
//! marked here for a short window so a pull that races the push of the very
//! same change doesn't stomp it with a stale remote copy.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use sync_types::EntityId;

const RECENTLY_MODIFIED_WINDOW_SECS: i64 = 2;

#[derive(Default)]
pub struct RecentlyModifiedGuard {
 entries: Mutex<HashMap<(String, String), DateTime<Utc>>>,
}

impl RecentlyModifiedGuard {
 pub fn new() -> Self {
 Self::default()
 }

 pub fn mark(&self, table: &str, id: &EntityId, now: DateTime<Utc>) {
 self.entries
 .lock()
 .unwrap()
 .insert((table.to_string(), id.as_str().to_string()), now);
 }

 pub fn is_recently_modified(&self, table: &str, id: &EntityId, now: DateTime<Utc>) -> bool {
 let entries = self.entries.lock().unwrap();
 match entries.get(&(table.to_string(), id.as_str().to_string())) {
 Some(marked_at) => now - *marked_at < chrono::Duration::seconds(RECENTLY_MODIFIED_WINDOW_SECS),
 None => false,
 }
 }

 /// Drops entries past the guard window. Called once per cycle so the
 /// map doesn't grow across a long-lived session.
 pub fn prune(&self, now: DateTime<Utc>) {
 let mut entries = self.entries.lock().unwrap();
 entries.retain(|_, marked_at| now - *marked_at < chrono::Duration::seconds(RECENTLY_MODIFIED_WINDOW_SECS));
 }
}

#[cfg(test)]
mod tests {
 use super::*;

 #[test]
 fn a_mark_protects_the_row_within_the_window() {
 let guard = RecentlyModifiedGuard::new();
 let now = Utc::now();
 guard.mark("goals", &EntityId::from("g1"), now);

 assert!(guard.is_recently_modified("goals", &EntityId::from("g1"), now + chrono::Duration::milliseconds(500)));
 }

 #[test]
 fn protection_expires_after_the_window() {
 let guard = RecentlyModifiedGuard::new();
 let now = Utc::now();
 guard.mark("goals", &EntityId::from("g1"), now);

 assert!(!guard.is_recently_modified("goals", &EntityId::from("g1"), now + chrono::Duration::seconds(3)));
 }

 #[test]
 fn unmarked_rows_are_never_protected() {
 let guard = RecentlyModifiedGuard::new();
 assert!(!guard.is_recently_modified("goals", &EntityId::from("g1"), Utc::now()));
 }

 #[test]
 fn prune_drops_only_expired_entries() {
 let guard = RecentlyModifiedGuard::new();
 let now = Utc::now();
 guard.mark("goals", &EntityId::from("old"), now - chrono::Duration::seconds(10));
 guard.mark("goals", &EntityId::from("fresh"), now);

 guard.prune(now);
 assert!(!guard.is_recently_modified("goals", &EntityId::from("old"), now));
 assert!(guard.is_recently_modified("goals", &EntityId::from("fresh"), now));
 }
}
