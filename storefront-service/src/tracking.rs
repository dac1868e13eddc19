//! Customer-facing order lookup by order number or DNI.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::http::ApiError;
use shared::validation::validate_dni;
use shared::{Order, OrderLine, OrderStatus, Store};
use uuid::Uuid;

const UNKNOWN_WEAPON: &str = "Desconocido";

#[derive(Debug, Default, Deserialize)]
pub struct TrackingQuery {
    pub order_number: Option<String>,
    pub dni: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedItem {
    pub weapon_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub subtotal: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackedOrder {
    pub id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub status_label: String,
    pub total_amount: BigDecimal,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<TrackedItem>,
}

impl From<OrderLine> for TrackedItem {
    fn from(line: OrderLine) -> Self {
        TrackedItem {
            weapon_name: line
                .weapon
                .map(|w| w.name)
                .unwrap_or_else(|| UNKNOWN_WEAPON.to_string()),
            quantity: line.item.quantity,
            unit_price: line.item.unit_price,
            subtotal: line.item.subtotal,
        }
    }
}

async fn with_items(store: &dyn Store, orders: Vec<Order>) -> Result<Vec<TrackedOrder>, ApiError> {
    let mut tracked = Vec::with_capacity(orders.len());
    for order in orders {
        let items = store
            .order_lines(order.id)
            .await?
            .into_iter()
            .map(TrackedItem::from)
            .collect();
        tracked.push(TrackedOrder {
            id: order.id,
            status_label: order.status.label().to_string(),
            order_number: order.order_number,
            status: order.status,
            total_amount: order.total_amount,
            notes: order.notes,
            created_at: order.created_at,
            items,
        });
    }
    Ok(tracked)
}

pub async fn track_by_number(
    store: &dyn Store,
    order_number: &str,
) -> Result<Vec<TrackedOrder>, ApiError> {
    let orders = store.orders_by_number(order_number.trim()).await?;
    if orders.is_empty() {
        return Err(ApiError::NotFound(
            "No se encontró ningún pedido con ese número de orden".to_string(),
        ));
    }
    with_items(store, orders).await
}

pub async fn track_by_dni(store: &dyn Store, dni: &str) -> Result<Vec<TrackedOrder>, ApiError> {
    let dni = dni.trim();
    validate_dni(dni)?;

    let customer = store.find_customer_by_dni(dni).await?.ok_or_else(|| {
        ApiError::NotFound("No se encontraron pedidos asociados a este DNI".to_string())
    })?;
    let orders = store.orders_by_customer(customer.id).await?;
    if orders.is_empty() {
        return Err(ApiError::NotFound("No se encontraron pedidos".to_string()));
    }
    with_items(store, orders).await
}

/// Order number wins when both are given.
pub async fn track(store: &dyn Store, query: &TrackingQuery) -> Result<Vec<TrackedOrder>, ApiError> {
    match (&query.order_number, &query.dni) {
        (Some(number), _) if !number.trim().is_empty() => track_by_number(store, number).await,
        (_, Some(dni)) if !dni.trim().is_empty() => track_by_dni(store, dni).await,
        _ => Err(ApiError::BadRequest(
            "Ingrese un número de orden o DNI".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::checkout::{NewOrderLine, NewOrderRequest};
    use shared::memory::InMemoryStore;
    use shared::seed::{aggregate_fixture, weapon_fixture};
    use shared::validation::CustomerForm;
    use shared::ValidationError;

    async fn store_with_order(order_number: &str) -> InMemoryStore {
        let store = InMemoryStore::new();
        let weapon = weapon_fixture("Beretta 92FS", "3200.00", 4);
        store.insert_weapon(weapon.clone());
        store
            .place_order(NewOrderRequest {
                customer: CustomerForm {
                    full_name: "Jorge Salazar".to_string(),
                    dni: "09876543".to_string(),
                    email: "jorge@example.pe".to_string(),
                    phone: "999888777".to_string(),
                    address: "Av. Grau 45, Piura".to_string(),
                },
                order_number: order_number.to_string(),
                notes: String::new(),
                lines: vec![NewOrderLine {
                    weapon_id: weapon.id,
                    quantity: 1,
                    unit_price: weapon.price.clone(),
                }],
                documents: Vec::new(),
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn finds_orders_by_number_with_labels() {
        let store = store_with_order("SUCAMEC-1717171717171-AB12C").await;
        let orders = track_by_number(&store, " SUCAMEC-1717171717171-AB12C ").await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status_label, "Pendiente");
        assert_eq!(orders[0].items[0].weapon_name, "Beretta 92FS");
    }

    #[tokio::test]
    async fn unknown_number_has_customer_message() {
        let store = store_with_order("SUCAMEC-1-AAAAA").await;
        let err = track_by_number(&store, "SUCAMEC-2-BBBBB").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "No se encontró ningún pedido con ese número de orden"
        );
    }

    #[tokio::test]
    async fn dni_lookup_validates_and_reports_missing_customer() {
        let store = store_with_order("SUCAMEC-1-AAAAA").await;
        assert_eq!(track_by_dni(&store, "09876543").await.unwrap().len(), 1);

        let err = track_by_dni(&store, "1234").await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(ValidationError::Dni)));

        let err = track_by_dni(&store, "11111111").await.unwrap_err();
        assert_eq!(err.to_string(), "No se encontraron pedidos asociados a este DNI");
    }

    #[tokio::test]
    async fn known_customer_without_orders_is_not_found() {
        let store = InMemoryStore::new();
        let customer = aggregate_fixture(Vec::new()).customer.unwrap();
        let dni = customer.dni.clone();
        store.insert_customer(customer);

        let err = track_by_dni(&store, &dni).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.to_string(), "No se encontraron pedidos");
    }

    #[test]
    fn line_without_weapon_is_labelled_unknown() {
        let weapon = weapon_fixture("Taurus G2C", "1900.00", 2);
        let mut aggregate = aggregate_fixture(vec![(weapon, 2)]);
        let mut line = aggregate.order_items.remove(0);
        line.weapon = None;

        let item = TrackedItem::from(line);
        assert_eq!(item.weapon_name, "Desconocido");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.subtotal, "3800.00".parse::<BigDecimal>().unwrap());
    }

    #[tokio::test]
    async fn query_without_keys_is_rejected() {
        let store = InMemoryStore::new();
        let err = track(&store, &TrackingQuery::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
