//! Session tracking.
//!
//! Stands in for the external authentication provider: it only knows who is
//! currently signed in and tells the record store to switch persistence
//! strategy when that changes. Credential verification happens upstream.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::domain::error::validation;
use crate::domain::store::FinanceStore;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub uid: String,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<FinanceStore>,
}

impl SessionManager {
    pub fn new(store: Arc<FinanceStore>) -> Self {
        Self { store }
    }

    pub fn current_user(&self) -> Option<SessionUser> {
        self.store.session()
    }

    /// Start a session: the store reloads the user's remote dataset and all
    /// further writes go to the document store.
    pub fn sign_in(&self, uid: String, email: Option<String>) -> Result<SessionUser> {
        let uid = uid.trim().to_string();
        if uid.is_empty() {
            return Err(validation("El identificador de usuario no puede estar vacío"));
        }
        let user = SessionUser { uid, email };
        self.store.set_session(Some(user.clone()))?;
        info!("user {} signed in", user.uid);
        Ok(user)
    }

    /// End the session: the store reloads the anonymous local snapshot.
    pub fn sign_out(&self) -> Result<()> {
        if let Some(user) = self.store.session() {
            info!("user {} signed out", user.uid);
        }
        self.store.set_session(None)
    }
}
