use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use shared::http::{ApiError, ApiResult, AppJson, AppPath, AppQuery};
use shared::review::{filter_orders, OrderFilter, OrderReview, OrderStats};
use shared::*;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::session::{self, AuthAdmin, Sessions};

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub sessions: Sessions,
}

impl FromRef<AppState> for Sessions {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub user: AdminUser,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    #[serde(default)]
    pub filter: OrderFilter,
}

#[derive(Debug, Deserialize)]
pub struct ValidationRequest {
    pub decision: Decision,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidationResponse {
    pub order: Order,
    pub message: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/orders", get(list_orders))
        .route("/orders/stats", get(order_stats))
        .route("/orders/:id", get(get_order))
        .route(
            "/orders/:id/validations",
            post(validate_order).get(list_validations),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let (token, user) = session::login(
        state.store.as_ref(),
        &state.sessions,
        &request.username,
        &request.password,
    )
    .await?;
    Ok(Json(LoginResponse { token, user }))
}

pub async fn logout(State(state): State<AppState>, auth: AuthAdmin) -> StatusCode {
    state.sessions.close(auth.token).await;
    tracing::info!("{} logged out", auth.user.username);
    StatusCode::NO_CONTENT
}

pub async fn me(auth: AuthAdmin) -> Json<AdminUser> {
    Json(auth.user)
}

pub async fn list_orders(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppQuery(query): AppQuery<OrderListQuery>,
) -> ApiResult<Vec<OrderAggregate>> {
    let orders = state.store.list_order_aggregates().await?;
    Ok(Json(filter_orders(orders, auth.user.role, query.filter)))
}

pub async fn order_stats(State(state): State<AppState>, auth: AuthAdmin) -> ApiResult<OrderStats> {
    let orders = state.store.list_order_aggregates().await?;
    Ok(Json(OrderStats::compute(&orders, auth.user.role)))
}

async fn find_order(store: &dyn Store, id: Uuid) -> Result<OrderAggregate, ApiError> {
    store
        .get_order_aggregate(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Orden no encontrada".to_string()))
}

pub async fn get_order(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<OrderReview> {
    let aggregate = find_order(state.store.as_ref(), id).await?;
    Ok(Json(OrderReview::build(aggregate, auth.user.role)))
}

fn decision_message(event: ValidationEvent) -> String {
    let verb = match (event.kind, event.decision) {
        (ValidationKind::Documents, Decision::Approved) => "aprobados",
        (ValidationKind::Documents, Decision::Rejected) => "rechazados",
        (ValidationKind::Stock, Decision::Approved) => "aprobado",
        (ValidationKind::Stock, Decision::Rejected) => "rechazado",
    };
    format!("{} {}", event.kind.subject(), verb)
}

pub async fn validate_order(
    State(state): State<AppState>,
    auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<ValidationRequest>,
) -> ApiResult<ValidationResponse> {
    let event = ValidationEvent {
        kind: auth.user.role.validation_kind(),
        decision: request.decision,
    };
    let notes = request
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let order = state
        .store
        .record_validation(id, auth.user.id, event, notes)
        .await?;

    Ok(Json(ValidationResponse {
        message: decision_message(event),
        order,
    }))
}

pub async fn list_validations(
    State(state): State<AppState>,
    _auth: AuthAdmin,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Vec<OrderValidation>> {
    find_order(state.store.as_ref(), id).await?;
    Ok(Json(state.store.list_validations(id).await?))
}
