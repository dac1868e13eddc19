use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use shared::cart::{Cart, CartAction};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_IDLE_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_MAX_CARTS: usize = 10_000;

struct CartEntry {
    cart: Cart,
    touched: Instant,
}

impl CartEntry {
    fn new(cart: Cart) -> Self {
        CartEntry {
            cart,
            touched: Instant::now(),
        }
    }
}

/// Shopping carts keyed by cart id. Carts live only as long as the process.
///
/// A cart idle for longer than `idle_ttl` is gone, and once `max_carts` are
/// held the least recently used one makes room for a new cart.
#[derive(Clone)]
pub struct CartSessions {
    carts: Arc<RwLock<HashMap<Uuid, CartEntry>>>,
    idle_ttl: Duration,
    max_carts: usize,
}

impl Default for CartSessions {
    fn default() -> Self {
        Self::with_limits(DEFAULT_IDLE_TTL, DEFAULT_MAX_CARTS)
    }
}

impl CartSessions {
    pub fn with_limits(idle_ttl: Duration, max_carts: usize) -> Self {
        CartSessions {
            carts: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
            max_carts: max_carts.max(1),
        }
    }

    fn expired(&self, entry: &CartEntry) -> bool {
        entry.touched.elapsed() >= self.idle_ttl
    }

    pub async fn create(&self) -> Uuid {
        let mut carts = self.carts.write().await;

        let before = carts.len();
        carts.retain(|_, entry| !self.expired(entry));
        if carts.len() < before {
            debug!("Evicted {} idle carts", before - carts.len());
        }
        while carts.len() >= self.max_carts {
            let oldest = carts
                .iter()
                .min_by_key(|(_, entry)| entry.touched)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    carts.remove(&id);
                    debug!("Evicted cart {} to stay under {} carts", id, self.max_carts);
                }
                None => break,
            }
        }

        let id = Uuid::new_v4();
        carts.insert(id, CartEntry::new(Cart::default()));
        id
    }

    /// Returns a live cart and marks it as used.
    pub async fn get(&self, id: Uuid) -> Option<Cart> {
        let mut carts = self.carts.write().await;
        let entry = self.live(&mut carts, id)?;
        entry.touched = Instant::now();
        Some(entry.cart.clone())
    }

    /// Runs `action` through the cart reducer and returns the new state.
    pub async fn apply(&self, id: Uuid, action: CartAction) -> Option<Cart> {
        let mut carts = self.carts.write().await;
        let entry = self.live(&mut carts, id)?;
        entry.cart = std::mem::take(&mut entry.cart).reduce(action);
        entry.touched = Instant::now();
        Some(entry.cart.clone())
    }

    /// Removes the cart so that only one checkout can hold it.
    pub async fn take(&self, id: Uuid) -> Option<Cart> {
        let mut carts = self.carts.write().await;
        self.live(&mut carts, id)?;
        carts.remove(&id).map(|entry| entry.cart)
    }

    /// Puts back a cart whose checkout failed.
    pub async fn restore(&self, id: Uuid, cart: Cart) {
        self.carts.write().await.insert(id, CartEntry::new(cart));
    }

    fn live<'a>(
        &self,
        carts: &'a mut HashMap<Uuid, CartEntry>,
        id: Uuid,
    ) -> Option<&'a mut CartEntry> {
        if carts.get(&id).is_some_and(|entry| self.expired(entry)) {
            carts.remove(&id);
            debug!("Cart {} expired", id);
            return None;
        }
        carts.get_mut(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::seed::weapon_fixture;

    #[tokio::test]
    async fn apply_reduces_the_stored_cart() {
        let sessions = CartSessions::default();
        let id = sessions.create().await;
        let weapon = weapon_fixture("Glock 17", "2850.00", 3);

        let cart = sessions
            .apply(id, CartAction::Add { weapon: weapon.clone(), quantity: 5 })
            .await
            .unwrap();
        assert_eq!(cart.quantity_of(weapon.id), Some(3));

        sessions.apply(id, CartAction::Clear).await.unwrap();
        assert!(sessions.get(id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_cart_is_none() {
        let sessions = CartSessions::default();
        assert!(sessions.get(Uuid::new_v4()).await.is_none());
        assert!(sessions
            .apply(Uuid::new_v4(), CartAction::Clear)
            .await
            .is_none());
        assert!(sessions.take(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn idle_carts_expire() {
        let sessions = CartSessions::with_limits(Duration::ZERO, 10);
        let id = sessions.create().await;
        assert!(sessions.get(id).await.is_none());
        assert!(sessions.apply(id, CartAction::Clear).await.is_none());
        assert!(sessions.carts.read().await.is_empty());
    }

    #[tokio::test]
    async fn full_sessions_drop_the_least_recently_used_cart() {
        let sessions = CartSessions::with_limits(DEFAULT_IDLE_TTL, 2);
        let first = sessions.create().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = sessions.create().await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        sessions.get(first).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let third = sessions.create().await;
        assert_eq!(sessions.carts.read().await.len(), 2);
        assert!(sessions.get(first).await.is_some());
        assert!(sessions.get(second).await.is_none());
        assert!(sessions.get(third).await.is_some());
    }

    #[tokio::test]
    async fn taken_cart_is_gone_until_restored() {
        let sessions = CartSessions::default();
        let id = sessions.create().await;
        let weapon = weapon_fixture("Beretta 92FS", "3200.00", 4);
        sessions
            .apply(id, CartAction::Add { weapon: weapon.clone(), quantity: 2 })
            .await
            .unwrap();

        let cart = sessions.take(id).await.unwrap();
        assert!(sessions.take(id).await.is_none());
        assert!(sessions.get(id).await.is_none());

        sessions.restore(id, cart).await;
        assert_eq!(sessions.get(id).await.unwrap().quantity_of(weapon.id), Some(2));
    }
}
