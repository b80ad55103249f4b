//! Storage abstraction traits.
//!
//! These traits let the record store work with different persistence
//! backends without modification. Documents are plain JSON objects matching
//! the serialized domain models.

use anyhow::Result;
use serde_json::Value;

use crate::domain::store::FinanceState;

/// Collection names used in the document store.
pub mod collections {
    pub const EXPENSES: &str = "expenses";
    pub const INCOMES: &str = "incomes";
    pub const GOALS: &str = "goals";
    pub const BUDGET_RULES: &str = "budgetRules";
    /// Per-user settings documents, keyed by user id
    pub const USERS: &str = "users";
}

/// A keyed document store over named collections.
///
/// Semantics follow the hosted document databases this app targets:
/// `set` overwrites the whole document, `update` merges fields into an
/// existing one, `delete` of a missing document is a no-op, and
/// `query_eq` filters a collection on field equality.
pub trait DocumentStore: Send + Sync {
    fn get(&self, collection: &str, id: &str) -> Result<Option<Value>>;

    /// Store a document, replacing any previous content under the same id.
    fn set(&self, collection: &str, id: &str, doc: &Value) -> Result<()>;

    /// Merge `patch`'s top-level fields into an existing document.
    /// Fails when the document does not exist.
    fn update(&self, collection: &str, id: &str, patch: &Value) -> Result<()>;

    fn delete(&self, collection: &str, id: &str) -> Result<()>;

    /// All documents in `collection` whose `field` equals `value`.
    fn query_eq(&self, collection: &str, field: &str, value: &Value) -> Result<Vec<Value>>;
}

/// Single-key wholesale persistence for the anonymous local mode.
///
/// The snapshot is read once at startup and rewritten in full on every
/// mutation, mirroring the browser local-storage behavior it replaces.
pub trait SnapshotStore: Send + Sync {
    /// Load the stored snapshot, `None` when nothing (readable) is stored.
    fn load(&self) -> Result<Option<FinanceState>>;

    fn save(&self, state: &FinanceState) -> Result<()>;
}
