use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::checkout::NewOrderRequest;
use crate::{
    AdminCredentials, Customer, Order, OrderAggregate, OrderDocument, OrderItem, OrderLine,
    OrderValidation, StoreError, ValidationEvent, Weapon, WeaponCategory,
};

/// Data access shared by the storefront and the back office.
///
/// Ordered listings are newest first for orders and alphabetical for the
/// catalog. `place_order` and `record_validation` are atomic.
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<WeaponCategory>, StoreError>;

    async fn list_weapons(&self, category_id: Option<Uuid>) -> Result<Vec<Weapon>, StoreError>;

    async fn get_weapon(&self, id: Uuid) -> Result<Option<Weapon>, StoreError>;

    async fn weapons_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Weapon>, StoreError>;

    async fn find_customer_by_dni(&self, dni: &str) -> Result<Option<Customer>, StoreError>;

    async fn orders_by_number(&self, order_number: &str) -> Result<Vec<Order>, StoreError>;

    async fn orders_by_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, StoreError>;

    async fn order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>, StoreError>;

    /// Upserts the customer by DNI and inserts the order with its items and
    /// documents. Stock is re-checked inside the same transaction.
    async fn place_order(&self, request: NewOrderRequest) -> Result<Order, StoreError>;

    async fn find_admin(&self, username: &str) -> Result<Option<AdminCredentials>, StoreError>;

    /// Creates the account unless the username is taken. Returns whether a
    /// row was inserted; existing accounts are left untouched.
    async fn ensure_admin(&self, credentials: &AdminCredentials) -> Result<bool, StoreError>;

    async fn list_order_aggregates(&self) -> Result<Vec<OrderAggregate>, StoreError>;

    async fn get_order_aggregate(&self, id: Uuid) -> Result<Option<OrderAggregate>, StoreError>;

    /// Applies a reviewer decision and appends the audit row together.
    async fn record_validation(
        &self,
        order_id: Uuid,
        admin_user_id: Uuid,
        event: ValidationEvent,
        notes: Option<String>,
    ) -> Result<Order, StoreError>;

    async fn list_validations(&self, order_id: Uuid) -> Result<Vec<OrderValidation>, StoreError>;
}

pub type DynStore = Arc<dyn Store>;

/// Joins loaded rows into aggregates, keeping the order of `orders`.
pub(crate) fn assemble_aggregates(
    orders: Vec<Order>,
    customers: Vec<Customer>,
    items: Vec<OrderItem>,
    weapons: Vec<Weapon>,
    documents: Vec<OrderDocument>,
) -> Vec<OrderAggregate> {
    let customers: HashMap<Uuid, Customer> = customers.into_iter().map(|c| (c.id, c)).collect();
    let weapons: HashMap<Uuid, Weapon> = weapons.into_iter().map(|w| (w.id, w)).collect();

    let mut items_by_order: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
    for item in items {
        let weapon = weapons.get(&item.weapon_id).cloned();
        items_by_order
            .entry(item.order_id)
            .or_default()
            .push(OrderLine { item, weapon });
    }

    let mut documents_by_order: HashMap<Uuid, Vec<OrderDocument>> = HashMap::new();
    for document in documents {
        documents_by_order
            .entry(document.order_id)
            .or_default()
            .push(document);
    }

    orders
        .into_iter()
        .map(|order| OrderAggregate {
            customer: customers.get(&order.customer_id).cloned(),
            order_items: items_by_order.remove(&order.id).unwrap_or_default(),
            order_documents: documents_by_order.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect()
}
