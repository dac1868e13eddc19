//! Order status derivation for the dual-approval workflow.
//!
//! Document validation and stock validation are owned by different roles and
//! can happen in either order. An order is approved once both flags are set,
//! and a single rejection rejects it.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{AlreadyValidated, Decision, Order, OrderStatus, ValidationEvent, ValidationKind};

/// Computes the status an order moves to when `event` is recorded.
///
/// `documents_validated` and `stock_validated` are the flags as they were
/// before the event.
pub fn derive_status(
    current: &OrderStatus,
    documents_validated: bool,
    stock_validated: bool,
    event: ValidationEvent,
) -> OrderStatus {
    match event.decision {
        Decision::Rejected => OrderStatus::Rechazado,
        Decision::Approved => {
            let other_flag = match event.kind {
                ValidationKind::Documents => stock_validated,
                ValidationKind::Stock => documents_validated,
            };
            if other_flag {
                OrderStatus::Aprobado
            } else {
                current.clone()
            }
        }
    }
}

impl Order {
    /// Records a reviewer decision on this order in memory.
    ///
    /// A flag that is already set cannot be decided again.
    pub fn apply_validation(
        &mut self,
        event: ValidationEvent,
        validator_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), AlreadyValidated> {
        if self.is_validated(event.kind) {
            return Err(AlreadyValidated(event.kind));
        }

        self.status = derive_status(
            &self.status,
            self.documents_validated,
            self.stock_validated,
            event,
        );

        let approved = event.decision == Decision::Approved;
        match event.kind {
            ValidationKind::Documents => {
                self.documents_validated = approved;
                self.documents_validator_id = Some(validator_id);
            }
            ValidationKind::Stock => {
                self.stock_validated = approved;
                self.stock_validator_id = Some(validator_id);
            }
        }
        self.updated_at = now;

        Ok(())
    }
}
