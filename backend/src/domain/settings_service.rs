//! Account settings: the display currency.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::domain::commands::settings::{ChangeCurrencyCommand, ChangeCurrencyResult};
use crate::domain::error::validation;
use crate::domain::models::currency::{Currency, CURRENCIES};
use crate::domain::store::FinanceStore;

#[derive(Clone)]
pub struct SettingsService {
    store: Arc<FinanceStore>,
}

impl SettingsService {
    pub fn new(store: Arc<FinanceStore>) -> Self {
        Self { store }
    }

    pub fn list_currencies(&self) -> Vec<Currency> {
        CURRENCIES.clone()
    }

    pub fn current_currency(&self) -> Currency {
        self.store.read(|s| s.currency.clone())
    }

    /// Switch the display currency. Stored amounts are never converted.
    pub fn change_currency(&self, command: ChangeCurrencyCommand) -> Result<ChangeCurrencyResult> {
        let currency = Currency::by_code(command.code.trim())
            .ok_or_else(|| validation(format!("Moneda desconocida: {}", command.code)))?;
        let warning = self.store.set_currency(currency.clone());
        info!("Display currency changed to {}", currency.code);
        Ok(ChangeCurrencyResult {
            currency,
            success_message: "Moneda actualizada correctamente".to_string(),
            warning,
        })
    }
}
