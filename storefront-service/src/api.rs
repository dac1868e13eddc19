use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use shared::cart::{Cart, CartAction, CartLine};
use shared::checkout::CheckoutRequest;
use shared::documents::required_documents;
use shared::http::{ApiError, ApiResult, AppJson, AppPath, AppQuery};
use shared::requirements::{LicenseRequirements, LICENSE_REQUIREMENTS};
use shared::*;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::carts::CartSessions;
use crate::checkout;
use crate::tracking::{self, TrackedOrder, TrackingQuery};

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub carts: CartSessions,
}

#[derive(Debug, Deserialize)]
pub struct WeaponQuery {
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct WeaponDetail {
    #[serde(flatten)]
    pub weapon: Weapon,
    pub category_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub weapon_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub weapon: Weapon,
    pub quantity: i32,
    pub subtotal: BigDecimal,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub cart_id: Uuid,
    pub lines: Vec<CartLineView>,
    pub total: BigDecimal,
    pub item_count: i32,
    pub required_documents: Vec<String>,
}

impl CartView {
    fn new(cart_id: Uuid, cart: Cart) -> Self {
        let total = cart.total();
        let item_count = cart.item_count();
        let required_documents = required_documents(cart.lines.iter().map(|line| &line.weapon));
        let lines = cart
            .lines
            .into_iter()
            .map(|line: CartLine| CartLineView {
                subtotal: line.subtotal(),
                quantity: line.quantity,
                weapon: line.weapon,
            })
            .collect();
        CartView {
            cart_id,
            lines,
            total,
            item_count,
            required_documents,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order_id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub message: String,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/categories", get(list_categories))
        .route("/weapons", get(list_weapons))
        .route("/weapons/:id", get(get_weapon))
        .route("/requirements", get(requirements))
        .route("/carts", post(create_cart))
        .route("/carts/:id", get(get_cart))
        .route("/carts/:id/items", post(add_item))
        .route(
            "/carts/:id/items/:weapon_id",
            put(set_quantity).delete(remove_item),
        )
        .route("/carts/:id/checkout", post(checkout_cart))
        .route("/orders/track", get(track_orders))
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

pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<WeaponCategory>> {
    Ok(Json(state.store.list_categories().await?))
}

pub async fn list_weapons(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<WeaponQuery>,
) -> ApiResult<Vec<Weapon>> {
    Ok(Json(state.store.list_weapons(query.category_id).await?))
}

async fn find_weapon(store: &dyn Store, id: Uuid) -> Result<Weapon, ApiError> {
    store
        .get_weapon(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Arma no encontrada".to_string()))
}

pub async fn get_weapon(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<WeaponDetail> {
    let weapon = find_weapon(state.store.as_ref(), id).await?;
    let category_name = state
        .store
        .list_categories()
        .await?
        .into_iter()
        .find(|c| c.id == weapon.category_id)
        .map(|c| c.name);
    Ok(Json(WeaponDetail {
        weapon,
        category_name,
    }))
}

pub async fn requirements() -> Json<LicenseRequirements> {
    Json(LICENSE_REQUIREMENTS)
}

fn cart_not_found() -> ApiError {
    ApiError::NotFound("Carrito no encontrado".to_string())
}

pub async fn create_cart(State(state): State<AppState>) -> (StatusCode, Json<CartView>) {
    let cart_id = state.carts.create().await;
    tracing::info!("Created cart {}", cart_id);
    (
        StatusCode::CREATED,
        Json(CartView::new(cart_id, Cart::default())),
    )
}

pub async fn get_cart(
    State(state): State<AppState>,
    AppPath(cart_id): AppPath<Uuid>,
) -> ApiResult<CartView> {
    let cart = state.carts.get(cart_id).await.ok_or_else(cart_not_found)?;
    Ok(Json(CartView::new(cart_id, cart)))
}

async fn apply(state: &AppState, cart_id: Uuid, action: CartAction) -> ApiResult<CartView> {
    let cart = state
        .carts
        .apply(cart_id, action)
        .await
        .ok_or_else(cart_not_found)?;
    Ok(Json(CartView::new(cart_id, cart)))
}

pub async fn add_item(
    State(state): State<AppState>,
    AppPath(cart_id): AppPath<Uuid>,
    AppJson(request): AppJson<AddItemRequest>,
) -> ApiResult<CartView> {
    if state.carts.get(cart_id).await.is_none() {
        return Err(cart_not_found());
    }
    let weapon = find_weapon(state.store.as_ref(), request.weapon_id).await?;
    apply(
        &state,
        cart_id,
        CartAction::Add {
            weapon,
            quantity: request.quantity,
        },
    )
    .await
}

pub async fn set_quantity(
    State(state): State<AppState>,
    AppPath((cart_id, weapon_id)): AppPath<(Uuid, Uuid)>,
    AppJson(request): AppJson<SetQuantityRequest>,
) -> ApiResult<CartView> {
    apply(
        &state,
        cart_id,
        CartAction::SetQuantity {
            weapon_id,
            quantity: request.quantity,
        },
    )
    .await
}

pub async fn remove_item(
    State(state): State<AppState>,
    AppPath((cart_id, weapon_id)): AppPath<(Uuid, Uuid)>,
) -> ApiResult<CartView> {
    apply(&state, cart_id, CartAction::Remove { weapon_id }).await
}

pub async fn checkout_cart(
    State(state): State<AppState>,
    AppPath(cart_id): AppPath<Uuid>,
    AppJson(request): AppJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<CheckoutResponse>), ApiError> {
    let cart = state.carts.take(cart_id).await.ok_or_else(cart_not_found)?;
    let order = match checkout::place_order(state.store.as_ref(), &cart, &request).await {
        Ok(order) => order,
        Err(err) => {
            state.carts.restore(cart_id, cart).await;
            return Err(err);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order_id: order.id,
            message: format!(
                "Pedido {} registrado. Guarde este número para el seguimiento.",
                order.order_number
            ),
            order_number: order.order_number,
            status: order.status,
            total_amount: order.total_amount,
        }),
    ))
}

pub async fn track_orders(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TrackingQuery>,
) -> ApiResult<Vec<TrackedOrder>> {
    Ok(Json(tracking::track(state.store.as_ref(), &query).await?))
}
