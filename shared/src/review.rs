//! Back-office views over order aggregates. Every view is relative to the
//! reviewer's role, since each role owns exactly one validation flag.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::documents::{document_checklist, required_documents, ChecklistEntry};
use crate::{OrderAggregate, Role};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderFilter {
    #[default]
    All,
    Pending,
    Validated,
}

impl OrderFilter {
    pub fn matches(&self, aggregate: &OrderAggregate, role: Role) -> bool {
        let validated = aggregate.order.is_validated(role.validation_kind());
        match self {
            OrderFilter::All => true,
            OrderFilter::Pending => !validated,
            OrderFilter::Validated => validated,
        }
    }
}

pub fn filter_orders(orders: Vec<OrderAggregate>, role: Role, filter: OrderFilter) -> Vec<OrderAggregate> {
    orders
        .into_iter()
        .filter(|aggregate| filter.matches(aggregate, role))
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    pub validated: usize,
}

impl OrderStats {
    pub fn compute(orders: &[OrderAggregate], role: Role) -> Self {
        let validated = orders
            .iter()
            .filter(|aggregate| OrderFilter::Validated.matches(aggregate, role))
            .count();
        OrderStats {
            total: orders.len(),
            pending: orders.len() - validated,
            validated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCheck {
    pub item_id: Uuid,
    pub weapon_name: Option<String>,
    pub requested: i32,
    pub available: i32,
    pub sufficient: bool,
}

/// What a reviewer sees when opening one order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReview {
    #[serde(flatten)]
    pub aggregate: OrderAggregate,
    pub role: Role,
    pub already_validated: bool,
    pub weapon_count: i32,
    pub document_checklist: Vec<ChecklistEntry>,
    pub stock_checks: Vec<StockCheck>,
}

impl OrderReview {
    pub fn build(aggregate: OrderAggregate, role: Role) -> Self {
        let required = required_documents(
            aggregate
                .order_items
                .iter()
                .filter_map(|line| line.weapon.as_ref()),
        );
        let document_checklist = document_checklist(
            &required,
            aggregate
                .order_documents
                .iter()
                .map(|document| document.document_type.as_str()),
        );

        let stock_checks = aggregate
            .order_items
            .iter()
            .map(|line| {
                let available = line.weapon.as_ref().map(|w| w.stock).unwrap_or(0);
                StockCheck {
                    item_id: line.item.id,
                    weapon_name: line.weapon.as_ref().map(|w| w.name.clone()),
                    requested: line.item.quantity,
                    available,
                    sufficient: available >= line.item.quantity,
                }
            })
            .collect();

        OrderReview {
            already_validated: aggregate.order.is_validated(role.validation_kind()),
            weapon_count: aggregate.weapon_count(),
            aggregate,
            role,
            document_checklist,
            stock_checks,
        }
    }

    pub fn missing_documents(&self) -> impl Iterator<Item = &str> {
        self.document_checklist
            .iter()
            .filter(|entry| !entry.uploaded)
            .map(|entry| entry.document_type.as_str())
    }
}
