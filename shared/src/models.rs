use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::warn;
use uuid::Uuid;

use crate::schema::*;
use crate::{
    AdminCredentials, AdminUser, Customer, Decision, Order, OrderDocument, OrderItem,
    OrderStatus, OrderValidation, Role, Specifications, ValidationKind, Weapon, WeaponCategory,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = weapon_categories)]
pub struct WeaponCategoryRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = weapons)]
pub struct WeaponRow {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub caliber: String,
    pub manufacturer: String,
    pub image_url: String,
    pub description: String,
    pub price: BigDecimal,
    pub stock: i32,
    pub specifications: serde_json::Value,
    pub required_documents: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = customers)]
pub struct CustomerRow {
    pub id: Uuid,
    pub full_name: String,
    pub dni: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = customers)]
pub struct NewCustomerRow<'a> {
    pub id: Uuid,
    pub full_name: &'a str,
    pub dni: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub address: &'a str,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = customers)]
pub struct CustomerChangeset<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub address: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = admin_users)]
pub struct AdminUserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = admin_users)]
pub struct NewAdminUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub full_name: &'a str,
}

impl<'a> From<&'a AdminCredentials> for NewAdminUserRow<'a> {
    fn from(credentials: &'a AdminCredentials) -> Self {
        Self {
            id: credentials.user.id,
            username: &credentials.user.username,
            password_hash: &credentials.password_hash,
            role: credentials.user.role.as_str(),
            full_name: &credentials.user.full_name,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = orders)]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub status: String,
    pub total_amount: BigDecimal,
    pub notes: String,
    pub documents_validated: bool,
    pub stock_validated: bool,
    pub documents_validator_id: Option<Uuid>,
    pub stock_validator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub status: String,
    pub total_amount: BigDecimal,
    pub notes: String,
}

/// Flags, validators and status written back after a validation decision.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = orders)]
pub struct OrderValidationChangeset {
    pub status: String,
    pub documents_validated: bool,
    pub stock_validated: bool,
    pub documents_validator_id: Option<Uuid>,
    pub stock_validator_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = order_items)]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub weapon_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub subtotal: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub weapon_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub subtotal: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = order_documents)]
pub struct OrderDocumentRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub document_type: String,
    pub file_url: String,
    pub file_name: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = order_documents)]
pub struct NewOrderDocumentRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub document_type: String,
    pub file_url: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = order_validations)]
pub struct OrderValidationRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub admin_user_id: Uuid,
    pub validation_type: String,
    pub status: String,
    pub notes: Option<String>,
    pub validated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = order_validations)]
pub struct NewOrderValidationRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub admin_user_id: Uuid,
    pub validation_type: String,
    pub status: String,
    pub notes: Option<String>,
}

impl From<WeaponCategoryRow> for WeaponCategory {
    fn from(row: WeaponCategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

impl From<WeaponRow> for Weapon {
    fn from(row: WeaponRow) -> Self {
        let specifications = serde_json::from_value(row.specifications).unwrap_or_else(|e| {
            warn!("Weapon {} has unreadable specifications: {}", row.id, e);
            Specifications::default()
        });
        Self {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            caliber: row.caliber,
            manufacturer: row.manufacturer,
            image_url: row.image_url,
            description: row.description,
            price: row.price,
            stock: row.stock,
            specifications,
            required_documents: row.required_documents,
            created_at: row.created_at,
        }
    }
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            full_name: row.full_name,
            dni: row.dni,
            email: row.email,
            phone: row.phone,
            address: row.address,
            created_at: row.created_at,
        }
    }
}

impl TryFrom<AdminUserRow> for AdminCredentials {
    type Error = anyhow::Error;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| anyhow::anyhow!("unknown admin role: {}", row.role))?;
        Ok(Self {
            user: AdminUser {
                id: row.id,
                username: row.username,
                role,
                full_name: row.full_name,
                created_at: row.created_at,
            },
            password_hash: row.password_hash,
        })
    }
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number,
            customer_id: row.customer_id,
            status: OrderStatus::from(row.status),
            total_amount: row.total_amount,
            notes: row.notes,
            documents_validated: row.documents_validated,
            stock_validated: row.stock_validated,
            documents_validator_id: row.documents_validator_id,
            stock_validator_id: row.stock_validator_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&Order> for OrderValidationChangeset {
    fn from(order: &Order) -> Self {
        Self {
            status: order.status.as_str().to_string(),
            documents_validated: order.documents_validated,
            stock_validated: order.stock_validated,
            documents_validator_id: order.documents_validator_id,
            stock_validator_id: order.stock_validator_id,
            updated_at: order.updated_at,
        }
    }
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            weapon_id: row.weapon_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
            created_at: row.created_at,
        }
    }
}

impl From<OrderDocumentRow> for OrderDocument {
    fn from(row: OrderDocumentRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            document_type: row.document_type,
            file_url: row.file_url,
            file_name: row.file_name,
            uploaded_at: row.uploaded_at,
        }
    }
}

impl TryFrom<OrderValidationRow> for OrderValidation {
    type Error = anyhow::Error;

    fn try_from(row: OrderValidationRow) -> Result<Self, Self::Error> {
        let validation_type = ValidationKind::parse(&row.validation_type)
            .ok_or_else(|| anyhow::anyhow!("unknown validation type: {}", row.validation_type))?;
        let status = Decision::parse(&row.status)
            .ok_or_else(|| anyhow::anyhow!("unknown validation status: {}", row.status))?;
        Ok(Self {
            id: row.id,
            order_id: row.order_id,
            admin_user_id: row.admin_user_id,
            validation_type,
            status,
            notes: row.notes,
            validated_at: row.validated_at,
        })
    }
}
