//! Process-local `Store` used by the service tests.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::checkout::{ensure_stock, NewOrderRequest};
use crate::seed::demo_catalog;
use crate::store::{assemble_aggregates, Store};
use crate::{
    AdminCredentials, Customer, Order, OrderAggregate, OrderDocument, OrderItem, OrderLine,
    OrderStatus, OrderValidation, StoreError, ValidationEvent, Weapon, WeaponCategory,
};

#[derive(Default)]
struct Tables {
    categories: Vec<WeaponCategory>,
    weapons: HashMap<Uuid, Weapon>,
    customers: HashMap<Uuid, Customer>,
    // newest first
    orders: Vec<Order>,
    items: Vec<OrderItem>,
    documents: Vec<OrderDocument>,
    admins: Vec<AdminCredentials>,
    validations: Vec<OrderValidation>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the demo catalog and back-office accounts.
    pub fn with_demo_data() -> Self {
        let store = Self::new();
        let catalog = demo_catalog();
        for category in catalog.categories {
            store.insert_category(category);
        }
        for weapon in catalog.weapons {
            store.insert_weapon(weapon);
        }
        for admin in catalog.admins {
            store.insert_admin(admin);
        }
        store
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_category(&self, category: WeaponCategory) {
        self.write().categories.push(category);
    }

    pub fn insert_weapon(&self, weapon: Weapon) {
        self.write().weapons.insert(weapon.id, weapon);
    }

    pub fn insert_admin(&self, admin: AdminCredentials) {
        self.write().admins.push(admin);
    }

    /// A customer with no orders yet.
    pub fn insert_customer(&self, customer: Customer) {
        self.write().customers.insert(customer.id, customer);
    }

    fn aggregates(tables: &Tables, orders: Vec<Order>) -> Vec<OrderAggregate> {
        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let items: Vec<OrderItem> = tables
            .items
            .iter()
            .filter(|i| order_ids.contains(&i.order_id))
            .cloned()
            .collect();
        let weapons = items
            .iter()
            .filter_map(|i| tables.weapons.get(&i.weapon_id).cloned())
            .collect();
        let documents = tables
            .documents
            .iter()
            .filter(|d| order_ids.contains(&d.order_id))
            .cloned()
            .collect();
        let customers = tables.customers.values().cloned().collect();
        assemble_aggregates(orders, customers, items, weapons, documents)
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list_categories(&self) -> Result<Vec<WeaponCategory>, StoreError> {
        let mut categories = self.read().categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_weapons(&self, category_id: Option<Uuid>) -> Result<Vec<Weapon>, StoreError> {
        let mut weapons: Vec<Weapon> = self
            .read()
            .weapons
            .values()
            .filter(|w| category_id.map_or(true, |id| w.category_id == id))
            .cloned()
            .collect();
        weapons.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(weapons)
    }

    async fn get_weapon(&self, id: Uuid) -> Result<Option<Weapon>, StoreError> {
        Ok(self.read().weapons.get(&id).cloned())
    }

    async fn weapons_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Weapon>, StoreError> {
        let tables = self.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.weapons.get(id).cloned())
            .collect())
    }

    async fn find_customer_by_dni(&self, dni: &str) -> Result<Option<Customer>, StoreError> {
        Ok(self
            .read()
            .customers
            .values()
            .find(|c| c.dni == dni)
            .cloned())
    }

    async fn orders_by_number(&self, order_number: &str) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .read()
            .orders
            .iter()
            .filter(|o| o.order_number == order_number)
            .cloned()
            .collect())
    }

    async fn orders_by_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .read()
            .orders
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>, StoreError> {
        let tables = self.read();
        Ok(tables
            .items
            .iter()
            .filter(|i| i.order_id == order_id)
            .map(|item| OrderLine {
                item: item.clone(),
                weapon: tables.weapons.get(&item.weapon_id).cloned(),
            })
            .collect())
    }

    async fn place_order(&self, request: NewOrderRequest) -> Result<Order, StoreError> {
        let mut tables = self.write();

        let locked: Vec<Weapon> = request
            .lines
            .iter()
            .filter_map(|l| tables.weapons.get(&l.weapon_id).cloned())
            .collect();
        ensure_stock(&request.lines, &locked)?;

        let now = Utc::now();
        let form = &request.customer;
        let existing = tables
            .customers
            .values()
            .find(|c| c.dni == form.dni)
            .map(|c| c.id);
        let customer_id = match existing {
            Some(id) => {
                if let Some(customer) = tables.customers.get_mut(&id) {
                    customer.full_name = form.full_name.clone();
                    customer.email = form.email.clone();
                    customer.phone = form.phone.clone();
                    customer.address = form.address.clone();
                }
                id
            }
            None => {
                let customer = Customer {
                    id: Uuid::new_v4(),
                    full_name: form.full_name.clone(),
                    dni: form.dni.clone(),
                    email: form.email.clone(),
                    phone: form.phone.clone(),
                    address: form.address.clone(),
                    created_at: now,
                };
                let id = customer.id;
                tables.customers.insert(id, customer);
                id
            }
        };

        let order = Order {
            id: Uuid::new_v4(),
            order_number: request.order_number.clone(),
            customer_id,
            status: OrderStatus::Pendiente,
            total_amount: request.total(),
            notes: request.notes.clone(),
            documents_validated: false,
            stock_validated: false,
            documents_validator_id: None,
            stock_validator_id: None,
            created_at: now,
            updated_at: now,
        };

        for line in &request.lines {
            tables.items.push(OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                weapon_id: line.weapon_id,
                quantity: line.quantity,
                unit_price: line.unit_price.clone(),
                subtotal: line.subtotal(),
                created_at: now,
            });
        }
        for upload in &request.documents {
            tables.documents.push(OrderDocument {
                id: Uuid::new_v4(),
                order_id: order.id,
                document_type: upload.document_type.clone(),
                file_url: upload.file_url(),
                file_name: upload.file_name.clone(),
                uploaded_at: now,
            });
        }
        tables.orders.insert(0, order.clone());

        Ok(order)
    }

    async fn find_admin(&self, username: &str) -> Result<Option<AdminCredentials>, StoreError> {
        Ok(self
            .read()
            .admins
            .iter()
            .find(|a| a.user.username == username)
            .cloned())
    }

    async fn ensure_admin(&self, credentials: &AdminCredentials) -> Result<bool, StoreError> {
        let mut tables = self.write();
        if tables
            .admins
            .iter()
            .any(|a| a.user.username == credentials.user.username)
        {
            return Ok(false);
        }
        tables.admins.push(credentials.clone());
        Ok(true)
    }

    async fn list_order_aggregates(&self) -> Result<Vec<OrderAggregate>, StoreError> {
        let tables = self.read();
        let orders = tables.orders.clone();
        Ok(Self::aggregates(&tables, orders))
    }

    async fn get_order_aggregate(&self, id: Uuid) -> Result<Option<OrderAggregate>, StoreError> {
        let tables = self.read();
        let Some(order) = tables.orders.iter().find(|o| o.id == id).cloned() else {
            return Ok(None);
        };
        Ok(Self::aggregates(&tables, vec![order]).pop())
    }

    async fn record_validation(
        &self,
        order_id: Uuid,
        admin_user_id: Uuid,
        event: ValidationEvent,
        notes: Option<String>,
    ) -> Result<Order, StoreError> {
        let mut tables = self.write();
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| StoreError::not_found("Orden", order_id))?;

        let now = Utc::now();
        order.apply_validation(event, admin_user_id, now)?;
        let order = order.clone();

        tables.validations.push(OrderValidation {
            id: Uuid::new_v4(),
            order_id,
            admin_user_id,
            validation_type: event.kind,
            status: event.decision,
            notes,
            validated_at: now,
        });

        Ok(order)
    }

    async fn list_validations(&self, order_id: Uuid) -> Result<Vec<OrderValidation>, StoreError> {
        Ok(self
            .read()
            .validations
            .iter()
            .rev()
            .filter(|v| v.order_id == order_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use crate::checkout::{DocumentUpload, NewOrderLine};
    use crate::seed::weapon_fixture;
    use crate::validation::CustomerForm;
    use crate::{CheckoutError, Decision, Role, ValidationKind};

    fn request(weapon: &Weapon, quantity: i32, dni: &str, full_name: &str) -> NewOrderRequest {
        NewOrderRequest {
            customer: CustomerForm {
                full_name: full_name.to_string(),
                dni: dni.to_string(),
                email: "cliente@example.pe".to_string(),
                phone: "987654321".to_string(),
                address: "Av. Arequipa 1200, Lima".to_string(),
            },
            order_number: format!("SUCAMEC-{}-ABCDE", quantity),
            notes: String::new(),
            lines: vec![NewOrderLine {
                weapon_id: weapon.id,
                quantity,
                unit_price: weapon.price.clone(),
            }],
            documents: vec![DocumentUpload {
                document_type: "DNI vigente".to_string(),
                file_name: "dni.pdf".to_string(),
            }],
        }
    }

    fn store_with(weapon: &Weapon) -> InMemoryStore {
        let store = InMemoryStore::new();
        store.insert_weapon(weapon.clone());
        store
    }

    #[tokio::test]
    async fn place_order_reuses_customer_by_dni() {
        let weapon = weapon_fixture("Glock 17", "2850.00", 10);
        let store = store_with(&weapon);

        let first = store
            .place_order(request(&weapon, 1, "45678912", "Ana Quispe"))
            .await
            .unwrap();
        let second = store
            .place_order(request(&weapon, 2, "45678912", "Ana Quispe Mamani"))
            .await
            .unwrap();

        assert_eq!(first.customer_id, second.customer_id);
        assert_eq!(second.status, OrderStatus::Pendiente);
        assert_eq!(second.total_amount, "5700.00".parse::<BigDecimal>().unwrap());
        let customer = store.find_customer_by_dni("45678912").await.unwrap().unwrap();
        assert_eq!(customer.full_name, "Ana Quispe Mamani");

        let orders = store.orders_by_customer(customer.id).await.unwrap();
        assert_eq!(orders[0].id, second.id);
        assert_eq!(orders.len(), 2);
    }

    #[tokio::test]
    async fn place_order_rechecks_stock() {
        let weapon = weapon_fixture("FN FAL", "12500.00", 1);
        let store = store_with(&weapon);

        let err = store
            .place_order(request(&weapon, 2, "45678912", "Ana Quispe"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Checkout(CheckoutError::InsufficientStock { available: 1, .. })
        ));
        assert!(store.list_order_aggregates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn aggregates_carry_lines_and_documents() {
        let weapon = weapon_fixture("Mossberg 500", "2100.00", 5);
        let store = store_with(&weapon);
        let order = store
            .place_order(request(&weapon, 3, "11112222", "Carlos Rojas"))
            .await
            .unwrap();

        let aggregate = store.get_order_aggregate(order.id).await.unwrap().unwrap();
        assert_eq!(aggregate.weapon_count(), 3);
        assert_eq!(aggregate.order_items[0].weapon.as_ref().unwrap().name, "Mossberg 500");
        assert_eq!(aggregate.order_documents[0].file_url, "placeholder_dni.pdf");
        assert_eq!(aggregate.customer.unwrap().dni, "11112222");

        let lines = store.order_lines(order.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert!(store.get_order_aggregate(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn validations_update_flags_and_audit_trail() {
        let weapon = weapon_fixture("Beretta 92FS", "3200.00", 6);
        let store = store_with(&weapon);
        let order = store
            .place_order(request(&weapon, 1, "33334444", "Rosa Flores"))
            .await
            .unwrap();
        let admin = Uuid::new_v4();
        let logistic = Uuid::new_v4();

        let docs = ValidationEvent { kind: ValidationKind::Documents, decision: Decision::Approved };
        let after_docs = store
            .record_validation(order.id, admin, docs, Some("Todo en regla".to_string()))
            .await
            .unwrap();
        assert_eq!(after_docs.status, OrderStatus::Pendiente);
        assert_eq!(after_docs.documents_validator_id, Some(admin));

        let again = store.record_validation(order.id, admin, docs, None).await.unwrap_err();
        assert!(matches!(again, StoreError::AlreadyValidated(_)));

        let stock = ValidationEvent { kind: ValidationKind::Stock, decision: Decision::Approved };
        let approved = store.record_validation(order.id, logistic, stock, None).await.unwrap();
        assert_eq!(approved.status, OrderStatus::Aprobado);

        let trail = store.list_validations(order.id).await.unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].validation_type, ValidationKind::Stock);
        assert_eq!(trail[1].notes.as_deref(), Some("Todo en regla"));
    }

    #[tokio::test]
    async fn validating_unknown_order_is_not_found() {
        let store = InMemoryStore::new();
        let event = ValidationEvent { kind: ValidationKind::Stock, decision: Decision::Rejected };
        let err = store
            .record_validation(Uuid::new_v4(), Uuid::new_v4(), event, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "Orden", .. }));
    }

    #[tokio::test]
    async fn demo_data_lists_catalog_by_category() {
        let store = InMemoryStore::with_demo_data();
        let categories = store.list_categories().await.unwrap();
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Escopetas", "Pistolas", "Rifles"]);

        let pistols = store.list_weapons(Some(categories[1].id)).await.unwrap();
        let names: Vec<&str> = pistols.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Beretta 92FS", "Glock 17"]);
        assert_eq!(store.list_weapons(None).await.unwrap().len(), 4);
        assert!(store.find_admin("logistica").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn ensure_admin_keeps_existing_accounts() {
        let store = InMemoryStore::with_demo_data();
        let original = store.find_admin("admin").await.unwrap().unwrap();

        let clash = AdminCredentials::new("admin", "Otro", Role::Logistic, "otra-clave");
        assert!(!store.ensure_admin(&clash).await.unwrap());
        let kept = store.find_admin("admin").await.unwrap().unwrap();
        assert_eq!(kept.user.id, original.user.id);
        assert_eq!(kept.user.role, Role::Administrator);

        let fresh = AdminCredentials::new("almacen", "Almacén", Role::Logistic, "almacen123");
        assert!(store.ensure_admin(&fresh).await.unwrap());
        assert!(store.find_admin("almacen").await.unwrap().is_some());
    }
}
