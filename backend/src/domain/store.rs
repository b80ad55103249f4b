//! The record store: the one place that owns mutable state and side effects.
//!
//! All collections live in a [`FinanceState`] behind a lock; every mutation
//! goes through a named operation here. Persistence is optimistic: the
//! in-memory state changes first, then the write goes to whichever backend
//! the current session selects — per-record documents for a signed-in user,
//! a wholesale snapshot for the anonymous local mode. A failed write is
//! logged and reported as a warning on the operation result, and the
//! in-memory change stays (no rollback, no retry).

use std::sync::{Arc, RwLock};

use anyhow::Result;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::domain::error::not_found;
use crate::domain::models::budget_rule::{BudgetRule, DEFAULT_RULE_ID};
use crate::domain::models::currency::Currency;
use crate::domain::models::expense::Expense;
use crate::domain::models::goal::Goal;
use crate::domain::models::income::Income;
use crate::domain::session::SessionUser;
use crate::storage::traits::{collections, DocumentStore, SnapshotStore};

fn default_active_rule_id() -> String {
    DEFAULT_RULE_ID.to_string()
}

/// The whole data model. Also the snapshot format of the local store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceState {
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub incomes: Vec<Income>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub budget_rules: Vec<BudgetRule>,
    #[serde(default = "default_active_rule_id")]
    pub active_budget_rule_id: String,
    #[serde(default)]
    pub currency: Currency,
}

impl Default for FinanceState {
    fn default() -> Self {
        FinanceState {
            expenses: Vec::new(),
            incomes: Vec::new(),
            goals: Vec::new(),
            budget_rules: vec![BudgetRule::default_rule()],
            active_budget_rule_id: default_active_rule_id(),
            currency: Currency::default_currency(),
        }
    }
}

impl FinanceState {
    /// Re-insert the built-in rule if a lower-level path removed it, and
    /// repoint the active reference if it dangles. Returns whether anything
    /// was repaired.
    pub fn ensure_default_rule(&mut self) -> bool {
        let mut repaired = false;
        if !self.budget_rules.iter().any(|r| r.id == DEFAULT_RULE_ID) {
            self.budget_rules.insert(0, BudgetRule::default_rule());
            repaired = true;
        }
        if !self
            .budget_rules
            .iter()
            .any(|r| r.id == self.active_budget_rule_id)
        {
            self.active_budget_rule_id = default_active_rule_id();
            repaired = true;
        }
        repaired
    }
}

/// One pending write against the document store.
enum RecordOp {
    Set {
        collection: &'static str,
        id: String,
        doc: Value,
    },
    Delete {
        collection: &'static str,
        id: String,
    },
    /// Merge currency + active rule into the user settings document
    Settings,
}

fn doc_of<T: Serialize>(record: &T) -> Value {
    serde_json::to_value(record).expect("domain models serialize to JSON")
}

pub struct FinanceStore {
    document_store: Arc<dyn DocumentStore>,
    snapshot_store: Arc<dyn SnapshotStore>,
    session: RwLock<Option<SessionUser>>,
    state: RwLock<FinanceState>,
}

impl FinanceStore {
    /// Open the store in anonymous mode, reading the local snapshot once.
    pub fn new(
        document_store: Arc<dyn DocumentStore>,
        snapshot_store: Arc<dyn SnapshotStore>,
    ) -> Result<Arc<Self>> {
        let mut state = snapshot_store.load()?.unwrap_or_default();
        if state.ensure_default_rule() {
            info!("default budget rule was missing from the snapshot, re-inserted");
        }
        Ok(Arc::new(Self {
            document_store,
            snapshot_store,
            session: RwLock::new(None),
            state: RwLock::new(state),
        }))
    }

    pub fn session(&self) -> Option<SessionUser> {
        self.session.read().unwrap().clone()
    }

    /// Read-only access to the current state.
    pub fn read<R>(&self, f: impl FnOnce(&FinanceState) -> R) -> R {
        f(&self.state.read().unwrap())
    }

    /// Switch the session and reload the state wholesale from the backend
    /// the new session selects. On load failure the previous session and
    /// state stay in place.
    pub fn set_session(&self, user: Option<SessionUser>) -> Result<()> {
        let loaded = self.load_for(user.as_ref())?;
        let mut state = self.state.write().unwrap();
        let mut session = self.session.write().unwrap();
        *state = loaded;
        *session = user;
        Ok(())
    }

    fn load_for(&self, user: Option<&SessionUser>) -> Result<FinanceState> {
        let mut state = match user {
            None => self.snapshot_store.load()?.unwrap_or_default(),
            Some(user) => self.load_user_data(user)?,
        };
        if state.ensure_default_rule() {
            info!("default budget rule was missing, re-inserted");
        }
        Ok(state)
    }

    fn load_user_data(&self, user: &SessionUser) -> Result<FinanceState> {
        let uid = json!(user.uid);
        let mut state = FinanceState {
            expenses: read_records(&*self.document_store, collections::EXPENSES, &uid)?,
            incomes: read_records(&*self.document_store, collections::INCOMES, &uid)?,
            goals: read_records(&*self.document_store, collections::GOALS, &uid)?,
            budget_rules: read_records(&*self.document_store, collections::BUDGET_RULES, &uid)?,
            ..FinanceState::default()
        };

        match self.document_store.get(collections::USERS, &user.uid)? {
            Some(doc) => {
                if let Some(currency) = doc
                    .get("currency")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                {
                    state.currency = currency;
                }
                if let Some(active) = doc.get("activeBudgetRuleId").and_then(Value::as_str) {
                    state.active_budget_rule_id = active.to_string();
                }
            }
            None => {
                // first sign-in for this user: create the settings document
                let doc = json!({
                    "currency": state.currency,
                    "activeBudgetRuleId": state.active_budget_rule_id,
                    "createdAt": Utc::now().to_rfc3339(),
                });
                self.document_store.set(collections::USERS, &user.uid, &doc)?;
                info!("created settings document for new user {}", user.uid);
            }
        }

        Ok(state)
    }

    /// Run the pending writes against the session's backend. Returns the
    /// user-visible warning when a write fails.
    fn persist(&self, state: &FinanceState, ops: Vec<RecordOp>) -> Option<String> {
        let session = self.session();
        match session {
            None => match self.snapshot_store.save(state) {
                Ok(()) => None,
                Err(e) => {
                    warn!("local snapshot write failed: {e:#}");
                    Some(format!(
                        "Los cambios se aplicaron pero no se pudieron guardar localmente: {e}"
                    ))
                }
            },
            Some(user) => {
                for op in ops {
                    let result = match &op {
                        RecordOp::Set { collection, id, doc } => {
                            self.document_store.set(collection, id, doc)
                        }
                        RecordOp::Delete { collection, id } => {
                            self.document_store.delete(collection, id)
                        }
                        RecordOp::Settings => self.document_store.update(
                            collections::USERS,
                            &user.uid,
                            &json!({
                                "currency": state.currency,
                                "activeBudgetRuleId": state.active_budget_rule_id,
                            }),
                        ),
                    };
                    if let Err(e) = result {
                        warn!("document write failed for user {}: {e:#}", user.uid);
                        return Some(format!(
                            "Los cambios se aplicaron pero no se pudieron sincronizar: {e}"
                        ));
                    }
                }
                None
            }
        }
    }

    // -- expenses -----------------------------------------------------------

    /// Insert an expense; `goal_update` carries the goal adjusted alongside
    /// it (add-funds), applied and persisted in the same operation.
    pub fn insert_expense(&self, expense: Expense, goal_update: Option<Goal>) -> Option<String> {
        let mut state = self.state.write().unwrap();
        let mut ops = vec![RecordOp::Set {
            collection: collections::EXPENSES,
            id: expense.id.clone(),
            doc: doc_of(&expense),
        }];
        state.expenses.push(expense);
        if let Some(goal) = goal_update {
            ops.push(replace_goal(&mut state, goal));
        }
        self.persist(&state, ops)
    }

    pub fn update_expense(
        &self,
        expense: Expense,
        goal_update: Option<Goal>,
    ) -> Result<Option<String>> {
        let mut state = self.state.write().unwrap();
        let index = state
            .expenses
            .iter()
            .position(|e| e.id == expense.id)
            .ok_or_else(|| not_found(format!("No existe el gasto {}", expense.id)))?;
        let mut ops = vec![RecordOp::Set {
            collection: collections::EXPENSES,
            id: expense.id.clone(),
            doc: doc_of(&expense),
        }];
        state.expenses[index] = expense;
        if let Some(goal) = goal_update {
            ops.push(replace_goal(&mut state, goal));
        }
        Ok(self.persist(&state, ops))
    }

    pub fn remove_expense(&self, id: &str, goal_update: Option<Goal>) -> Result<Option<String>> {
        let mut state = self.state.write().unwrap();
        let index = state
            .expenses
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| not_found(format!("No existe el gasto {id}")))?;
        state.expenses.remove(index);
        let mut ops = vec![RecordOp::Delete {
            collection: collections::EXPENSES,
            id: id.to_string(),
        }];
        if let Some(goal) = goal_update {
            ops.push(replace_goal(&mut state, goal));
        }
        Ok(self.persist(&state, ops))
    }

    // -- incomes ------------------------------------------------------------

    pub fn insert_income(&self, income: Income) -> Option<String> {
        let mut state = self.state.write().unwrap();
        let ops = vec![RecordOp::Set {
            collection: collections::INCOMES,
            id: income.id.clone(),
            doc: doc_of(&income),
        }];
        state.incomes.push(income);
        self.persist(&state, ops)
    }

    pub fn update_income(&self, income: Income) -> Result<Option<String>> {
        let mut state = self.state.write().unwrap();
        let index = state
            .incomes
            .iter()
            .position(|i| i.id == income.id)
            .ok_or_else(|| not_found(format!("No existe el ingreso {}", income.id)))?;
        let ops = vec![RecordOp::Set {
            collection: collections::INCOMES,
            id: income.id.clone(),
            doc: doc_of(&income),
        }];
        state.incomes[index] = income;
        Ok(self.persist(&state, ops))
    }

    pub fn remove_income(&self, id: &str) -> Result<Option<String>> {
        let mut state = self.state.write().unwrap();
        let index = state
            .incomes
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| not_found(format!("No existe el ingreso {id}")))?;
        state.incomes.remove(index);
        let ops = vec![RecordOp::Delete {
            collection: collections::INCOMES,
            id: id.to_string(),
        }];
        Ok(self.persist(&state, ops))
    }

    // -- goals --------------------------------------------------------------

    pub fn insert_goal(&self, goal: Goal) -> Option<String> {
        let mut state = self.state.write().unwrap();
        let ops = vec![RecordOp::Set {
            collection: collections::GOALS,
            id: goal.id.clone(),
            doc: doc_of(&goal),
        }];
        state.goals.push(goal);
        self.persist(&state, ops)
    }

    pub fn update_goal(&self, goal: Goal) -> Result<Option<String>> {
        let mut state = self.state.write().unwrap();
        if !state.goals.iter().any(|g| g.id == goal.id) {
            return Err(not_found(format!("No existe la meta {}", goal.id)));
        }
        let op = replace_goal(&mut state, goal);
        Ok(self.persist(&state, vec![op]))
    }

    pub fn remove_goal(&self, id: &str) -> Result<Option<String>> {
        let mut state = self.state.write().unwrap();
        let index = state
            .goals
            .iter()
            .position(|g| g.id == id)
            .ok_or_else(|| not_found(format!("No existe la meta {id}")))?;
        state.goals.remove(index);
        let ops = vec![RecordOp::Delete {
            collection: collections::GOALS,
            id: id.to_string(),
        }];
        Ok(self.persist(&state, ops))
    }

    // -- budget rules and settings ------------------------------------------

    pub fn insert_rule(&self, rule: BudgetRule) -> Option<String> {
        let mut state = self.state.write().unwrap();
        let ops = vec![RecordOp::Set {
            collection: collections::BUDGET_RULES,
            id: rule.id.clone(),
            doc: doc_of(&rule),
        }];
        state.budget_rules.push(rule);
        self.persist(&state, ops)
    }

    pub fn update_rule(&self, rule: BudgetRule) -> Result<Option<String>> {
        let mut state = self.state.write().unwrap();
        let index = state
            .budget_rules
            .iter()
            .position(|r| r.id == rule.id)
            .ok_or_else(|| not_found(format!("No existe la regla {}", rule.id)))?;
        let ops = vec![RecordOp::Set {
            collection: collections::BUDGET_RULES,
            id: rule.id.clone(),
            doc: doc_of(&rule),
        }];
        state.budget_rules[index] = rule;
        Ok(self.persist(&state, ops))
    }

    /// Remove a rule. If it was active, the active reference falls back to
    /// the built-in rule. Refusal of default-rule deletion is the service's
    /// job; this low-level path would be repaired on next load anyway.
    pub fn remove_rule(&self, id: &str) -> Result<Option<String>> {
        let mut state = self.state.write().unwrap();
        let index = state
            .budget_rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| not_found(format!("No existe la regla {id}")))?;
        state.budget_rules.remove(index);
        let mut ops = vec![RecordOp::Delete {
            collection: collections::BUDGET_RULES,
            id: id.to_string(),
        }];
        if state.active_budget_rule_id == id {
            state.active_budget_rule_id = default_active_rule_id();
            ops.push(RecordOp::Settings);
        }
        Ok(self.persist(&state, ops))
    }

    pub fn set_active_rule(&self, rule_id: &str) -> Result<Option<String>> {
        let mut state = self.state.write().unwrap();
        if !state.budget_rules.iter().any(|r| r.id == rule_id) {
            return Err(not_found(format!("No existe la regla {rule_id}")));
        }
        state.active_budget_rule_id = rule_id.to_string();
        Ok(self.persist(&state, vec![RecordOp::Settings]))
    }

    pub fn set_currency(&self, currency: Currency) -> Option<String> {
        let mut state = self.state.write().unwrap();
        state.currency = currency;
        self.persist(&state, vec![RecordOp::Settings])
    }
}

/// Swap a goal in place and produce its persistence op.
fn replace_goal(state: &mut FinanceState, goal: Goal) -> RecordOp {
    let op = RecordOp::Set {
        collection: collections::GOALS,
        id: goal.id.clone(),
        doc: doc_of(&goal),
    };
    if let Some(existing) = state.goals.iter_mut().find(|g| g.id == goal.id) {
        *existing = goal;
    } else {
        warn!("goal {} disappeared mid-operation, re-inserting", goal.id);
        state.goals.push(goal);
    }
    op
}

fn read_records<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &'static str,
    uid: &Value,
) -> Result<Vec<T>> {
    let docs = store.query_eq(collection, "userId", uid)?;
    Ok(docs
        .into_iter()
        .filter_map(|doc| match serde_json::from_value(doc) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("skipping malformed {collection} document: {e}");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileDocumentStore, FileSnapshotStore};
    use std::fs;

    fn test_store(dir: &std::path::Path) -> Arc<FinanceStore> {
        let documents = Arc::new(FileDocumentStore::new(dir.join("documents")).unwrap());
        let snapshots = Arc::new(FileSnapshotStore::new(dir.join("local")).unwrap());
        FinanceStore::new(documents, snapshots).expect("Failed to init store")
    }

    fn expense(description: &str, amount: f64) -> Expense {
        Expense {
            id: Expense::generate_id(),
            description: description.to_string(),
            amount,
            category: "food".to_string(),
            date: "2024-03-10".to_string(),
            notes: None,
            goal_id: None,
            user_id: None,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_local_mutations_survive_reopen() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        {
            let store = test_store(dir.path());
            let warning = store.insert_expense(expense("Mercado", 120.0), None);
            assert!(warning.is_none());
        }
        let store = test_store(dir.path());
        assert_eq!(store.read(|s| s.expenses.len()), 1);
        assert_eq!(store.read(|s| s.expenses[0].description.clone()), "Mercado");
    }

    #[test]
    fn test_default_rule_reinserted_from_sparse_snapshot() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let local = dir.path().join("local");
        fs::create_dir_all(&local).unwrap();
        // a snapshot written before budget rules existed
        fs::write(
            local.join(crate::storage::local::SNAPSHOT_FILE),
            r#"{"expenses":[],"incomes":[],"goals":[]}"#,
        )
        .unwrap();

        let store = test_store(dir.path());
        assert!(store.read(|s| s.budget_rules.iter().any(|r| r.id == DEFAULT_RULE_ID)));
        assert_eq!(store.read(|s| s.active_budget_rule_id.clone()), DEFAULT_RULE_ID);
    }

    #[test]
    fn test_session_switch_swaps_dataset() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        store.insert_expense(expense("Local", 10.0), None);
        assert_eq!(store.read(|s| s.expenses.len()), 1);

        // signing in shows the (empty) remote dataset
        store
            .set_session(Some(SessionUser {
                uid: "u1".to_string(),
                email: Some("u1@example.com".to_string()),
            }))
            .unwrap();
        assert_eq!(store.read(|s| s.expenses.len()), 0);

        let mut remote = expense("Remoto", 25.0);
        remote.user_id = Some("u1".to_string());
        store.insert_expense(remote, None);
        assert!(store.read(|s| s.expenses[0].user_id.as_deref() == Some("u1")));

        // signing out restores the local dataset
        store.set_session(None).unwrap();
        assert_eq!(store.read(|s| s.expenses.len()), 1);
        assert_eq!(store.read(|s| s.expenses[0].description.clone()), "Local");

        // and the remote record is still there on the next sign-in
        store
            .set_session(Some(SessionUser {
                uid: "u1".to_string(),
                email: None,
            }))
            .unwrap();
        assert_eq!(store.read(|s| s.expenses.len()), 1);
        assert_eq!(store.read(|s| s.expenses[0].description.clone()), "Remoto");
    }

    #[test]
    fn test_user_settings_persist_across_sessions() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());
        let user = SessionUser {
            uid: "u1".to_string(),
            email: None,
        };

        store.set_session(Some(user.clone())).unwrap();
        let eur = Currency::by_code("EUR").unwrap();
        assert!(store.set_currency(eur.clone()).is_none());

        store.set_session(None).unwrap();
        assert_eq!(store.read(|s| s.currency.code.clone()), "USD");

        store.set_session(Some(user)).unwrap();
        assert_eq!(store.read(|s| s.currency.code.clone()), "EUR");
    }

    #[test]
    fn test_users_are_isolated() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        store
            .set_session(Some(SessionUser { uid: "u1".to_string(), email: None }))
            .unwrap();
        store.insert_expense(expense("De u1", 10.0), None);

        store
            .set_session(Some(SessionUser { uid: "u2".to_string(), email: None }))
            .unwrap();
        assert_eq!(store.read(|s| s.expenses.len()), 0);
    }

    #[test]
    fn test_remove_active_rule_falls_back_to_default() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = test_store(dir.path());

        let mut rule = BudgetRule::default_rule();
        rule.id = BudgetRule::generate_id();
        rule.name = "Mi regla".to_string();
        rule.is_default = false;
        let rule_id = rule.id.clone();

        store.insert_rule(rule);
        store.set_active_rule(&rule_id).unwrap();
        assert_eq!(store.read(|s| s.active_budget_rule_id.clone()), rule_id);

        store.remove_rule(&rule_id).unwrap();
        assert_eq!(store.read(|s| s.active_budget_rule_id.clone()), DEFAULT_RULE_ID);
    }
}
