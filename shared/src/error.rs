use thiserror::Error;
use uuid::Uuid;

use crate::ValidationKind;

/// Rejections of the checkout customer form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("El teléfono debe tener exactamente 9 dígitos")]
    Phone,
    #[error("El email debe contener @")]
    Email,
    #[error("El DNI debe tener exactamente 8 dígitos")]
    Dni,
    #[error("El nombre completo es obligatorio")]
    FullName,
    #[error("La dirección es obligatoria")]
    Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("El carrito está vacío")]
    EmptyCart,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("Faltan documentos requeridos: {}", .0.join(", "))]
    MissingDocuments(Vec<String>),

    #[error("Arma no encontrada: {0}")]
    UnknownWeapon(Uuid),

    #[error("Stock insuficiente para {name}: solicitado {requested}, disponible {available}")]
    InsufficientStock {
        weapon_id: Uuid,
        name: String,
        requested: i32,
        available: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} ya fue validado para esta orden", .0.subject())]
pub struct AlreadyValidated(pub ValidationKind);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} no encontrado: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error(transparent)]
    AlreadyValidated(#[from] AlreadyValidated),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] bb8::RunError<diesel_async::pooled_connection::PoolError>),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}
