use bigdecimal::BigDecimal;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Weapon;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub weapon: Weapon,
    pub quantity: i32,
}

impl CartLine {
    pub fn subtotal(&self) -> BigDecimal {
        &self.weapon.price * BigDecimal::from(self.quantity)
    }
}

/// Shopping cart state. Quantities are bounded by the stock snapshot carried
/// in each line's weapon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CartAction {
    Add { weapon: Weapon, quantity: i32 },
    SetQuantity { weapon_id: Uuid, quantity: i32 },
    Remove { weapon_id: Uuid },
    Clear,
}

fn clamp_to_stock(quantity: i32, stock: i32) -> i32 {
    quantity.min(stock.max(0))
}

impl Cart {
    pub fn reduce(mut self, action: CartAction) -> Cart {
        match action {
            CartAction::Add { weapon, quantity } => {
                if quantity <= 0 {
                    return self;
                }
                match self.lines.iter().position(|line| line.weapon.id == weapon.id) {
                    Some(index) => {
                        let combined = self.lines[index].quantity.saturating_add(quantity);
                        let clamped = clamp_to_stock(combined, weapon.stock);
                        if clamped == 0 {
                            self.lines.remove(index);
                        } else {
                            let line = &mut self.lines[index];
                            line.quantity = clamped;
                            line.weapon = weapon;
                        }
                    }
                    None => {
                        let clamped = clamp_to_stock(quantity, weapon.stock);
                        if clamped > 0 {
                            self.lines.push(CartLine {
                                weapon,
                                quantity: clamped,
                            });
                        }
                    }
                }
            }
            CartAction::SetQuantity { weapon_id, quantity } => {
                let Some(index) = self.lines.iter().position(|line| line.weapon.id == weapon_id)
                else {
                    return self;
                };
                let clamped = clamp_to_stock(quantity, self.lines[index].weapon.stock);
                if clamped <= 0 {
                    self.lines.remove(index);
                } else {
                    self.lines[index].quantity = clamped;
                }
            }
            CartAction::Remove { weapon_id } => {
                self.lines.retain(|line| line.weapon.id != weapon_id);
            }
            CartAction::Clear => self.lines.clear(),
        }
        self
    }

    pub fn total(&self) -> BigDecimal {
        self.lines
            .iter()
            .fold(BigDecimal::zero(), |sum, line| sum + line.subtotal())
    }

    pub fn item_count(&self) -> i32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn weapon_ids(&self) -> Vec<Uuid> {
        self.lines.iter().map(|line| line.weapon.id).collect()
    }

    pub fn quantity_of(&self, weapon_id: Uuid) -> Option<i32> {
        self.lines
            .iter()
            .find(|line| line.weapon.id == weapon_id)
            .map(|line| line.quantity)
    }
}
