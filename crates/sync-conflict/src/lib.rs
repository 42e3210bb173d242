//! Field-level conflict resolution for pulled records with an existing local
//! counterpart: tombstone dominance, numeric additive
//! merge, then last-write-wins per field.

mod resolver;
mod shadow;

pub use resolver::resolve;
pub use shadow::{KvShadowStore, ShadowStore};
