//! Dashboard summary: totals, breakdown and histogram over the (optionally
//! month-filtered) record collections. Thin wrapper that anchors the pure
//! aggregation at the local calendar date.

use std::sync::Arc;

use anyhow::Result;
use chrono::Local;

use crate::domain::aggregate::aggregate;
use crate::domain::commands::summary::SummaryQuery;
use crate::domain::month_filter::{filter_by_month, parse_month_param};
use crate::domain::store::FinanceStore;

#[derive(Clone)]
pub struct ReportingService {
    store: Arc<FinanceStore>,
}

impl ReportingService {
    pub fn new(store: Arc<FinanceStore>) -> Self {
        Self { store }
    }

    pub fn summary(&self, query: SummaryQuery) -> Result<shared::FinanceSummary> {
        let key = parse_month_param(query.month.as_deref())?;
        let (expenses, incomes) = self
            .store
            .read(|s| (filter_by_month(&s.expenses, key), filter_by_month(&s.incomes, key)));
        Ok(aggregate(&expenses, &incomes, Local::now().date_naive()))
    }
}
