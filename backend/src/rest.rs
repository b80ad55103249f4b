//! REST layer: maps the public DTOs in `shared` onto domain commands and
//! domain errors onto HTTP statuses. Validation errors map to 400, unknown
//! ids to 404, anything unexpected to 500 with the details kept in the log.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::info;

use crate::domain::commands::budget_rule::{
    CreateRuleCommand, DeleteRuleCommand, EvaluateRuleQuery, RuleCategoryInput,
    SetActiveRuleCommand, UpdateRuleCommand,
};
use crate::domain::commands::expense::{
    CreateExpenseCommand, DeleteExpenseCommand, ExpenseListQuery, UpdateExpenseCommand,
};
use crate::domain::commands::goal::{
    AddFundsCommand, CreateGoalCommand, DeleteGoalCommand, UpdateGoalCommand,
};
use crate::domain::commands::income::{
    CreateIncomeCommand, DeleteIncomeCommand, IncomeListQuery, UpdateIncomeCommand,
};
use crate::domain::commands::settings::ChangeCurrencyCommand;
use crate::domain::commands::summary::SummaryQuery;
use crate::domain::error::DomainError;
use crate::domain::{
    BudgetRuleService, ExpenseService, GoalService, IncomeService, ReportingService,
    SessionManager, SettingsService,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub expenses: ExpenseService,
    pub incomes: IncomeService,
    pub goals: GoalService,
    pub budget_rules: BudgetRuleService,
    pub reporting: ReportingService,
    pub settings: SettingsService,
    pub sessions: SessionManager,
}

/// Build the API router.
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route("/expenses/:id", put(update_expense).delete(delete_expense))
        .route("/incomes", get(list_incomes).post(create_income))
        .route("/incomes/:id", put(update_income).delete(delete_income))
        .route("/goals", get(list_goals).post(create_goal))
        .route("/goals/:id", put(update_goal).delete(delete_goal))
        .route("/goals/:id/funds", post(add_funds))
        .route("/budget-rules", get(list_budget_rules).post(create_budget_rule))
        .route("/budget-rules/active", get(get_active_rule).put(set_active_rule))
        .route(
            "/budget-rules/:id",
            put(update_budget_rule).delete(delete_budget_rule),
        )
        .route("/budget-rules/:id/evaluation", get(evaluate_budget_rule))
        .route("/summary", get(get_summary))
        .route("/categories", get(list_categories))
        .route("/currencies", get(list_currencies))
        .route("/settings/currency", get(get_currency).put(change_currency))
        .route("/session", get(get_session).post(sign_in).delete(sign_out))
        .with_state(state)
}

/// Map a domain error to a response, logging the unexpected ones.
fn error_response(context: &str, e: anyhow::Error) -> Response {
    let status = match e.downcast_ref::<DomainError>() {
        Some(DomainError::Validation(_)) => StatusCode::BAD_REQUEST,
        Some(DomainError::NotFound(_)) => StatusCode::NOT_FOUND,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!("{context}: {e:?}");
    }
    (
        status,
        Json(shared::ErrorResponse {
            message: e.to_string(),
        }),
    )
        .into_response()
}

#[derive(Deserialize, Debug)]
pub struct MonthQuery {
    pub month: Option<String>,
}

// -- expenses ---------------------------------------------------------------

async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> impl IntoResponse {
    info!("GET /api/expenses - month: {:?}", query.month);
    match state.expenses.list_expenses(ExpenseListQuery { month: query.month }) {
        Ok(result) => Json(shared::ExpenseListResponse {
            expenses: result.expenses.into_iter().map(Into::into).collect(),
        })
        .into_response(),
        Err(e) => error_response("Error listing expenses", e),
    }
}

async fn create_expense(
    State(state): State<AppState>,
    Json(request): Json<shared::CreateExpenseRequest>,
) -> impl IntoResponse {
    info!("POST /api/expenses - request: {:?}", request);
    let command = CreateExpenseCommand {
        description: request.description,
        amount: request.amount,
        category: request.category,
        date: request.date,
        notes: request.notes,
    };
    match state.expenses.create_expense(command) {
        Ok(result) => (
            StatusCode::CREATED,
            Json(shared::ExpenseResponse {
                expense: result.expense.into(),
                success_message: result.success_message,
                warning: result.warning,
            }),
        )
            .into_response(),
        Err(e) => error_response("Error creating expense", e),
    }
}

async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<shared::UpdateExpenseRequest>,
) -> impl IntoResponse {
    info!("PUT /api/expenses/{id}");
    let command = UpdateExpenseCommand {
        id,
        description: request.description,
        amount: request.amount,
        category: request.category,
        date: request.date,
        notes: request.notes,
    };
    match state.expenses.update_expense(command) {
        Ok(result) => Json(shared::ExpenseResponse {
            expense: result.expense.into(),
            success_message: result.success_message,
            warning: result.warning,
        })
        .into_response(),
        Err(e) => error_response("Error updating expense", e),
    }
}

async fn delete_expense(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/expenses/{id}");
    match state.expenses.delete_expense(DeleteExpenseCommand { id }) {
        Ok(result) => Json(shared::DeleteResponse {
            success_message: result.success_message,
            warning: result.warning,
        })
        .into_response(),
        Err(e) => error_response("Error deleting expense", e),
    }
}

// -- incomes ----------------------------------------------------------------

async fn list_incomes(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> impl IntoResponse {
    info!("GET /api/incomes - month: {:?}", query.month);
    match state.incomes.list_incomes(IncomeListQuery { month: query.month }) {
        Ok(result) => Json(shared::IncomeListResponse {
            incomes: result.incomes.into_iter().map(Into::into).collect(),
        })
        .into_response(),
        Err(e) => error_response("Error listing incomes", e),
    }
}

async fn create_income(
    State(state): State<AppState>,
    Json(request): Json<shared::CreateIncomeRequest>,
) -> impl IntoResponse {
    info!("POST /api/incomes - request: {:?}", request);
    let command = CreateIncomeCommand {
        description: request.description,
        amount: request.amount,
        category: request.category,
        date: request.date,
        notes: request.notes,
    };
    match state.incomes.create_income(command) {
        Ok(result) => (
            StatusCode::CREATED,
            Json(shared::IncomeResponse {
                income: result.income.into(),
                success_message: result.success_message,
                warning: result.warning,
            }),
        )
            .into_response(),
        Err(e) => error_response("Error creating income", e),
    }
}

async fn update_income(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<shared::UpdateIncomeRequest>,
) -> impl IntoResponse {
    info!("PUT /api/incomes/{id}");
    let command = UpdateIncomeCommand {
        id,
        description: request.description,
        amount: request.amount,
        category: request.category,
        date: request.date,
        notes: request.notes,
    };
    match state.incomes.update_income(command) {
        Ok(result) => Json(shared::IncomeResponse {
            income: result.income.into(),
            success_message: result.success_message,
            warning: result.warning,
        })
        .into_response(),
        Err(e) => error_response("Error updating income", e),
    }
}

async fn delete_income(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/incomes/{id}");
    match state.incomes.delete_income(DeleteIncomeCommand { id }) {
        Ok(result) => Json(shared::DeleteResponse {
            success_message: result.success_message,
            warning: result.warning,
        })
        .into_response(),
        Err(e) => error_response("Error deleting income", e),
    }
}

// -- goals ------------------------------------------------------------------

async fn list_goals(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/goals");
    let result = state.goals.list_goals();
    Json(shared::GoalListResponse {
        goals: result.goals.into_iter().map(Into::into).collect(),
    })
}

async fn create_goal(
    State(state): State<AppState>,
    Json(request): Json<shared::CreateGoalRequest>,
) -> impl IntoResponse {
    info!("POST /api/goals - request: {:?}", request);
    let command = CreateGoalCommand {
        title: request.title,
        description: request.description,
        target_amount: request.target_amount,
        current_amount: request.current_amount,
        deadline: request.deadline,
    };
    match state.goals.create_goal(command) {
        Ok(result) => (
            StatusCode::CREATED,
            Json(shared::GoalResponse {
                goal: result.goal.into(),
                success_message: result.success_message,
                warning: result.warning,
            }),
        )
            .into_response(),
        Err(e) => error_response("Error creating goal", e),
    }
}

async fn update_goal(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<shared::UpdateGoalRequest>,
) -> impl IntoResponse {
    info!("PUT /api/goals/{id}");
    let command = UpdateGoalCommand {
        id,
        title: request.title,
        description: request.description,
        target_amount: request.target_amount,
        deadline: request.deadline,
    };
    match state.goals.update_goal(command) {
        Ok(result) => Json(shared::GoalResponse {
            goal: result.goal.into(),
            success_message: result.success_message,
            warning: result.warning,
        })
        .into_response(),
        Err(e) => error_response("Error updating goal", e),
    }
}

async fn delete_goal(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/goals/{id}");
    match state.goals.delete_goal(DeleteGoalCommand { id }) {
        Ok(result) => Json(shared::DeleteResponse {
            success_message: result.success_message,
            warning: result.warning,
        })
        .into_response(),
        Err(e) => error_response("Error deleting goal", e),
    }
}

async fn add_funds(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<shared::AddFundsRequest>,
) -> impl IntoResponse {
    info!("POST /api/goals/{id}/funds - amount: {}", request.amount);
    let command = AddFundsCommand {
        goal_id: id,
        amount: request.amount,
    };
    match state.goals.add_funds(command) {
        Ok(result) => (
            StatusCode::CREATED,
            Json(shared::AddFundsResponse {
                goal: result.goal.into(),
                expense: result.expense.into(),
                success_message: result.success_message,
                warning: result.warning,
            }),
        )
            .into_response(),
        Err(e) => error_response("Error adding funds to goal", e),
    }
}

// -- budget rules -----------------------------------------------------------

fn rule_category_inputs(
    categories: Vec<shared::BudgetRuleCategoryInput>,
) -> Vec<RuleCategoryInput> {
    categories
        .into_iter()
        .map(|c| RuleCategoryInput {
            name: c.name,
            percentage: c.percentage,
            color: c.color,
            matches: c.matches,
        })
        .collect()
}

async fn list_budget_rules(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/budget-rules");
    let result = state.budget_rules.list_rules();
    Json(shared::BudgetRuleListResponse {
        rules: result.rules.into_iter().map(Into::into).collect(),
        active_rule_id: result.active_rule_id,
    })
}

async fn create_budget_rule(
    State(state): State<AppState>,
    Json(request): Json<shared::CreateBudgetRuleRequest>,
) -> impl IntoResponse {
    info!("POST /api/budget-rules - request: {:?}", request);
    let command = CreateRuleCommand {
        name: request.name,
        description: request.description,
        categories: rule_category_inputs(request.categories),
    };
    match state.budget_rules.create_rule(command) {
        Ok(result) => (
            StatusCode::CREATED,
            Json(shared::BudgetRuleResponse {
                rule: result.rule.into(),
                success_message: result.success_message,
                warning: result.warning,
            }),
        )
            .into_response(),
        Err(e) => error_response("Error creating budget rule", e),
    }
}

async fn update_budget_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<shared::UpdateBudgetRuleRequest>,
) -> impl IntoResponse {
    info!("PUT /api/budget-rules/{id}");
    let command = UpdateRuleCommand {
        id,
        name: request.name,
        description: request.description,
        categories: rule_category_inputs(request.categories),
    };
    match state.budget_rules.update_rule(command) {
        Ok(result) => Json(shared::BudgetRuleResponse {
            rule: result.rule.into(),
            success_message: result.success_message,
            warning: result.warning,
        })
        .into_response(),
        Err(e) => error_response("Error updating budget rule", e),
    }
}

async fn delete_budget_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!("DELETE /api/budget-rules/{id}");
    match state.budget_rules.delete_rule(DeleteRuleCommand { id }) {
        Ok(result) => Json(shared::DeleteResponse {
            success_message: result.success_message,
            warning: result.warning,
        })
        .into_response(),
        Err(e) => error_response("Error deleting budget rule", e),
    }
}

async fn get_active_rule(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/budget-rules/active");
    let result = state.budget_rules.list_rules();
    let active = result
        .rules
        .into_iter()
        .find(|r| r.id == result.active_rule_id);
    match active {
        Some(rule) => Json(shared::BudgetRule::from(rule)).into_response(),
        // the store repairs a dangling active reference on load, so this is
        // unreachable through the API
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(shared::ErrorResponse {
                message: "No hay regla activa".to_string(),
            }),
        )
            .into_response(),
    }
}

async fn set_active_rule(
    State(state): State<AppState>,
    Json(request): Json<shared::SetActiveRuleRequest>,
) -> impl IntoResponse {
    info!("PUT /api/budget-rules/active - rule: {}", request.rule_id);
    let command = SetActiveRuleCommand {
        rule_id: request.rule_id,
    };
    match state.budget_rules.set_active_rule(command) {
        Ok(result) => Json(shared::SetActiveRuleResponse {
            active_rule_id: result.active_rule_id,
            success_message: result.success_message,
            warning: result.warning,
        })
        .into_response(),
        Err(e) => error_response("Error setting active budget rule", e),
    }
}

async fn evaluate_budget_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/budget-rules/{id}/evaluation");
    let query = EvaluateRuleQuery {
        rule_id: (id != "active").then_some(id),
    };
    match state.budget_rules.evaluate(query) {
        Ok(result) => Json(shared::BudgetRuleEvaluationResponse {
            rule_id: result.rule_id,
            rule_name: result.rule_name,
            categories: result.categories,
        })
        .into_response(),
        Err(e) => error_response("Error evaluating budget rule", e),
    }
}

// -- summary, catalogs, settings --------------------------------------------

async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> impl IntoResponse {
    info!("GET /api/summary - month: {:?}", query.month);
    match state.reporting.summary(SummaryQuery { month: query.month }) {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => error_response("Error computing summary", e),
    }
}

async fn list_categories() -> impl IntoResponse {
    use crate::domain::categories::{EXPENSE_CATEGORIES, INCOME_CATEGORIES};
    Json(shared::CategoryCatalogResponse {
        expense_categories: EXPENSE_CATEGORIES
            .iter()
            .map(|c| shared::ExpenseCategoryInfo {
                key: c.key.to_string(),
                label: c.label.to_string(),
                color: c.color.to_string(),
            })
            .collect(),
        income_categories: INCOME_CATEGORIES
            .iter()
            .map(|c| shared::IncomeCategoryInfo {
                key: c.key.to_string(),
                label: c.label.to_string(),
            })
            .collect(),
    })
}

async fn list_currencies(State(state): State<AppState>) -> impl IntoResponse {
    Json(shared::CurrencyListResponse {
        currencies: state
            .settings
            .list_currencies()
            .into_iter()
            .map(Into::into)
            .collect(),
    })
}

async fn get_currency(State(state): State<AppState>) -> impl IntoResponse {
    Json(shared::Currency::from(state.settings.current_currency()))
}

async fn change_currency(
    State(state): State<AppState>,
    Json(request): Json<shared::ChangeCurrencyRequest>,
) -> impl IntoResponse {
    info!("PUT /api/settings/currency - code: {}", request.code);
    match state
        .settings
        .change_currency(ChangeCurrencyCommand { code: request.code })
    {
        Ok(result) => Json(shared::CurrencyResponse {
            currency: result.currency.into(),
            success_message: result.success_message,
            warning: result.warning,
        })
        .into_response(),
        Err(e) => error_response("Error changing currency", e),
    }
}

// -- session ----------------------------------------------------------------

fn session_response(
    user: Option<crate::domain::session::SessionUser>,
) -> Json<shared::SessionResponse> {
    Json(shared::SessionResponse {
        user: user.map(|u| shared::SessionUser {
            uid: u.uid,
            email: u.email,
        }),
    })
}

async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    session_response(state.sessions.current_user())
}

async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<shared::SignInRequest>,
) -> impl IntoResponse {
    info!("POST /api/session - uid: {}", request.uid);
    match state.sessions.sign_in(request.uid, request.email) {
        Ok(user) => session_response(Some(user)).into_response(),
        Err(e) => error_response("Error signing in", e),
    }
}

async fn sign_out(State(state): State<AppState>) -> impl IntoResponse {
    info!("DELETE /api/session");
    match state.sessions.sign_out() {
        Ok(()) => session_response(None).into_response(),
        Err(e) => error_response("Error signing out", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FinanceStore;
    use crate::storage::{FileDocumentStore, FileSnapshotStore};
    use std::sync::Arc;

    fn setup_test_state() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let documents = Arc::new(FileDocumentStore::new(dir.path().join("documents")).unwrap());
        let snapshots = Arc::new(FileSnapshotStore::new(dir.path().join("local")).unwrap());
        let store = FinanceStore::new(documents, snapshots).expect("Failed to init store");
        let state = AppState {
            expenses: ExpenseService::new(store.clone()),
            incomes: IncomeService::new(store.clone()),
            goals: GoalService::new(store.clone()),
            budget_rules: BudgetRuleService::new(store.clone()),
            reporting: ReportingService::new(store.clone()),
            settings: SettingsService::new(store.clone()),
            sessions: SessionManager::new(store),
        };
        (state, dir)
    }

    #[tokio::test]
    async fn test_create_expense_returns_created() {
        let (state, _dir) = setup_test_state();
        let request = shared::CreateExpenseRequest {
            description: "Mercado".to_string(),
            amount: 120.0,
            category: "food".to_string(),
            date: "2024-03-10".to_string(),
            notes: None,
        };
        let response = create_expense(State(state), Json(request))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_create_expense_validation_maps_to_400() {
        let (state, _dir) = setup_test_state();
        let request = shared::CreateExpenseRequest {
            description: "Mercado".to_string(),
            amount: -5.0,
            category: "food".to_string(),
            date: "2024-03-10".to_string(),
            notes: None,
        };
        let response = create_expense(State(state), Json(request))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_goal_maps_to_404() {
        let (state, _dir) = setup_test_state();
        let response = add_funds(
            State(state),
            Path("goal::ghost".to_string()),
            Json(shared::AddFundsRequest { amount: 10.0 }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_default_rule_is_rejected() {
        let (state, _dir) = setup_test_state();
        let response = delete_budget_rule(State(state.clone()), Path("50-30-20".to_string()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let listed = state.budget_rules.list_rules();
        assert!(listed.rules.iter().any(|r| r.id == "50-30-20"));
    }

    #[tokio::test]
    async fn test_session_roundtrip() {
        let (state, _dir) = setup_test_state();

        let response = sign_in(
            State(state.clone()),
            Json(shared::SignInRequest {
                uid: "u1".to_string(),
                email: Some("u1@example.com".to_string()),
            }),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.sessions.current_user().unwrap().uid, "u1");

        let response = sign_out(State(state.clone())).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.sessions.current_user().is_none());
    }
}
