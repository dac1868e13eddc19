use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

pub mod cart;
pub mod checkout;
pub mod documents;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod memory;
pub mod models;
pub mod order_number;
pub mod password;
pub mod pg;
pub mod requirements;
pub mod review;
pub mod schema;
#[cfg(any(test, feature = "test-fixtures"))]
pub mod seed;
pub mod status;
pub mod store;
pub mod validation;

pub use error::{AlreadyValidated, CheckoutError, StoreError, ValidationError};
pub use store::{DynStore, Store};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponCategory {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Free-form technical sheet shown in the weapon detail view.
///
/// Values are kept as text; numbers and booleans are rendered as written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Specifications {
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub peso: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub capacidad: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub longitud: Option<String>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub caliber: String,
    pub manufacturer: String,
    pub image_url: String,
    pub description: String,
    pub price: BigDecimal,
    pub stock: i32,
    pub specifications: Specifications,
    pub required_documents: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub full_name: String,
    pub dni: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

/// Order status as stored in `orders.status`.
///
/// The column is free-form text, so anything outside the four known values
/// is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    Pendiente,
    EnProceso,
    Aprobado,
    Rechazado,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pendiente => "pendiente",
            OrderStatus::EnProceso => "en_proceso",
            OrderStatus::Aprobado => "aprobado",
            OrderStatus::Rechazado => "rechazado",
            OrderStatus::Other(raw) => raw,
        }
    }

    /// Label shown to customers when tracking an order.
    pub fn label(&self) -> &str {
        match self {
            OrderStatus::Pendiente => "Pendiente",
            OrderStatus::EnProceso => "En Proceso",
            OrderStatus::Aprobado => "Aprobado",
            OrderStatus::Rechazado => "Rechazado",
            OrderStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "pendiente" => OrderStatus::Pendiente,
            "en_proceso" => OrderStatus::EnProceso,
            "aprobado" => OrderStatus::Aprobado,
            "rechazado" => OrderStatus::Rechazado,
            _ => OrderStatus::Other(raw),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub total_amount: BigDecimal,
    pub notes: String,
    pub documents_validated: bool,
    pub stock_validated: bool,
    pub documents_validator_id: Option<Uuid>,
    pub stock_validator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub weapon_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub subtotal: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDocument {
    pub id: Uuid,
    pub order_id: Uuid,
    pub document_type: String,
    pub file_url: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationKind {
    Documents,
    Stock,
}

impl ValidationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationKind::Documents => "documents",
            ValidationKind::Stock => "stock",
        }
    }

    /// Subject used in reviewer-facing messages.
    pub fn subject(&self) -> &'static str {
        match self {
            ValidationKind::Documents => "Los documentos",
            ValidationKind::Stock => "El stock",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "documents" => Some(ValidationKind::Documents),
            "stock" => Some(ValidationKind::Stock),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "approved",
            Decision::Rejected => "rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "approved" => Some(Decision::Approved),
            "rejected" => Some(Decision::Rejected),
            _ => None,
        }
    }
}

/// One reviewer's decision on one of the two validation flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationEvent {
    pub kind: ValidationKind,
    pub decision: Decision,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderValidation {
    pub id: Uuid,
    pub order_id: Uuid,
    pub admin_user_id: Uuid,
    pub validation_type: ValidationKind,
    pub status: Decision,
    pub notes: Option<String>,
    pub validated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Logistic,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "administrator",
            Role::Logistic => "logistic",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "administrator" => Some(Role::Administrator),
            "logistic" => Some(Role::Logistic),
            _ => None,
        }
    }

    /// Administrators sign off on documents, logistics staff on stock.
    pub fn validation_kind(&self) -> ValidationKind {
        match self {
            Role::Administrator => ValidationKind::Documents,
            Role::Logistic => ValidationKind::Stock,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AdminCredentials {
    pub user: AdminUser,
    pub password_hash: String,
}

impl AdminCredentials {
    /// A new account with a freshly salted password digest.
    pub fn new(username: &str, full_name: &str, role: Role, password: &str) -> Self {
        AdminCredentials {
            user: AdminUser {
                id: Uuid::new_v4(),
                username: username.to_string(),
                role,
                full_name: full_name.to_string(),
                created_at: Utc::now(),
            },
            password_hash: password::hash_password(password),
        }
    }
}

/// An order item joined with the weapon it references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(flatten)]
    pub item: OrderItem,
    pub weapon: Option<Weapon>,
}

/// An order with its customer, items and uploaded documents, as the back
/// office reviews it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAggregate {
    #[serde(flatten)]
    pub order: Order,
    pub customer: Option<Customer>,
    pub order_items: Vec<OrderLine>,
    pub order_documents: Vec<OrderDocument>,
}

impl Order {
    pub fn is_validated(&self, kind: ValidationKind) -> bool {
        match kind {
            ValidationKind::Documents => self.documents_validated,
            ValidationKind::Stock => self.stock_validated,
        }
    }
}

impl OrderAggregate {
    pub fn weapon_count(&self) -> i32 {
        self.order_items.iter().map(|line| line.item.quantity).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_round_trips_known_and_free_form_values() {
        for raw in ["pendiente", "en_proceso", "aprobado", "rechazado", "anulado"] {
            let status = OrderStatus::from(raw.to_string());
            assert_eq!(status.as_str(), raw);
        }
        assert_eq!(OrderStatus::from("anulado".to_string()).label(), "anulado");
        assert_eq!(OrderStatus::EnProceso.label(), "En Proceso");
    }

    #[test]
    fn order_status_serializes_as_plain_string() {
        let json = serde_json::to_value(OrderStatus::EnProceso).unwrap();
        assert_eq!(json, serde_json::json!("en_proceso"));
        let back: OrderStatus = serde_json::from_value(serde_json::json!("rechazado")).unwrap();
        assert_eq!(back, OrderStatus::Rechazado);
    }

    #[test]
    fn specifications_accept_non_text_values() {
        let specs: Specifications = serde_json::from_value(serde_json::json!({
            "peso": 625,
            "capacidad": "17 cartuchos",
            "longitud": null,
            "acabado": "negro"
        }))
        .unwrap();
        assert_eq!(specs.peso.as_deref(), Some("625"));
        assert_eq!(specs.capacidad.as_deref(), Some("17 cartuchos"));
        assert_eq!(specs.longitud, None);

        let empty: Specifications = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(empty, Specifications::default());
    }

    #[test]
    fn new_admin_credentials_verify_their_password() {
        let credentials = AdminCredentials::new("jefe", "Jefe de Almacén", Role::Logistic, "clave-segura");
        assert_eq!(credentials.user.role, Role::Logistic);
        assert!(password::verify_password("clave-segura", &credentials.password_hash));
    }

    #[test]
    fn roles_own_one_flag_each() {
        assert_eq!(Role::Administrator.validation_kind(), ValidationKind::Documents);
        assert_eq!(Role::Logistic.validation_kind(), ValidationKind::Stock);
        assert_eq!(Role::parse("logistic"), Some(Role::Logistic));
        assert_eq!(Role::parse("root"), None);
    }
}
