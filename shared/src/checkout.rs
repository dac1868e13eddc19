//! Turning a cart and a customer form into an order ready to be stored.

use std::collections::{HashMap, HashSet};

use bigdecimal::BigDecimal;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::Cart;
use crate::documents::{missing_documents, required_documents};
use crate::validation::CustomerForm;
use crate::{CheckoutError, Weapon};

/// A file chosen for one required document type. Files are not stored, only
/// referenced by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub document_type: String,
    pub file_name: String,
}

impl DocumentUpload {
    pub fn file_url(&self) -> String {
        format!("placeholder_{}", self.file_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub customer: CustomerForm,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub documents: Vec<DocumentUpload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub weapon_id: Uuid,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

impl NewOrderLine {
    pub fn subtotal(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

/// Everything the store needs to persist an order in one go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderRequest {
    pub customer: CustomerForm,
    pub order_number: String,
    pub notes: String,
    pub lines: Vec<NewOrderLine>,
    pub documents: Vec<DocumentUpload>,
}

impl NewOrderRequest {
    pub fn total(&self) -> BigDecimal {
        self.lines
            .iter()
            .fold(BigDecimal::zero(), |sum, line| sum + line.subtotal())
    }
}

/// Fails when any line asks for more units than the weapon has in stock.
pub fn ensure_stock(lines: &[NewOrderLine], weapons: &[Weapon]) -> Result<(), CheckoutError> {
    let by_id: HashMap<Uuid, &Weapon> = weapons.iter().map(|w| (w.id, w)).collect();
    for line in lines {
        let weapon = by_id
            .get(&line.weapon_id)
            .ok_or(CheckoutError::UnknownWeapon(line.weapon_id))?;
        if line.quantity > weapon.stock {
            return Err(CheckoutError::InsufficientStock {
                weapon_id: weapon.id,
                name: weapon.name.clone(),
                requested: line.quantity,
                available: weapon.stock,
            });
        }
    }
    Ok(())
}

/// Validates a checkout against freshly fetched weapons.
///
/// Prices and required documents come from `weapons`, not from the cart's
/// snapshot. Only uploads for required document types are kept, one per type.
pub fn prepare_order(
    cart: &Cart,
    request: &CheckoutRequest,
    weapons: &[Weapon],
    order_number: String,
) -> Result<NewOrderRequest, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let customer = request.customer.normalized();
    customer.validate()?;

    let by_id: HashMap<Uuid, &Weapon> = weapons.iter().map(|w| (w.id, w)).collect();
    let mut ordered = Vec::with_capacity(cart.lines.len());
    for line in &cart.lines {
        let weapon = by_id
            .get(&line.weapon.id)
            .ok_or(CheckoutError::UnknownWeapon(line.weapon.id))?;
        ordered.push(*weapon);
    }

    let required = required_documents(ordered.iter().copied());
    let missing = missing_documents(
        &required,
        request.documents.iter().map(|d| d.document_type.as_str()),
    );
    if !missing.is_empty() {
        return Err(CheckoutError::MissingDocuments(missing));
    }

    let lines: Vec<NewOrderLine> = cart
        .lines
        .iter()
        .zip(&ordered)
        .map(|(line, weapon)| NewOrderLine {
            weapon_id: weapon.id,
            quantity: line.quantity,
            unit_price: weapon.price.clone(),
        })
        .collect();
    ensure_stock(&lines, weapons)?;

    let required: HashSet<&str> = required.iter().map(String::as_str).collect();
    let mut seen = HashSet::new();
    let documents = request
        .documents
        .iter()
        .filter(|d| required.contains(d.document_type.as_str()))
        .filter(|d| seen.insert(d.document_type.clone()))
        .cloned()
        .collect();

    Ok(NewOrderRequest {
        customer,
        order_number,
        notes: request.notes.trim().to_string(),
        lines,
        documents,
    })
}
