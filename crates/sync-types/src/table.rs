use std::collections::HashSet;

/// Declares one table the engine keeps in sync.
///
/// Tables are configured once at `initEngine` time; the set is fixed for the
/// lifetime of the engine.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TableConfig {
 pub name: String,
 /// Full declared column set, including `id`, `updated_at`, `deleted`, `user_id`.
 pub columns: Vec<String>,
 /// Column used to scope reads/writes to the current user, if any.
 pub ownership_filter: Option<String>,
 /// Whether the table holds a single fixed-key row rather than a collection.
 #[serde(default)]
 pub is_singleton: bool,
 /// Fields the conflict resolver leaves untouched (always local, never merged).
 #[serde(default)]
 pub exclude_from_conflict: Vec<String>,
 /// Fields merged additively rather than by last-write-wins.
 #[serde(default)]
 pub numeric_merge_fields: Vec<String>,
}

impl TableConfig {
 pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
 Self {
 name: name.into(),
 columns,
 ownership_filter: None,
 is_singleton: false,
 exclude_from_conflict: Vec::new(),
 numeric_merge_fields: Vec::new(),
 }
 }

 pub fn is_numeric_merge_field(&self, field: &str) -> bool {
 self.numeric_merge_fields.iter().any(|f| f == field)
 }

 pub fn is_excluded_from_conflict(&self, field: &str) -> bool {
 self.exclude_from_conflict.iter().any(|f| f == field)
 }

 /// Declared columns minus the four required attributes, as a set for
 /// membership checks (e.g. schema probing, diagnostics).
 pub fn data_columns(&self) -> HashSet<&str> {
 const REQUIRED: [&str; 4] = ["id", "updated_at", "deleted", "user_id"];
 self.columns
 .iter()
 .map(String::as_str)
 .filter(|c| !REQUIRED.contains(c))
 .collect()
 }
}
