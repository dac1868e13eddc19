use shared::cart::Cart;
use shared::checkout::{prepare_order, CheckoutRequest};
use shared::http::ApiError;
use shared::order_number::new_order_number;
use shared::{Order, Store};
use tracing::{info, warn};

/// Validates the cart against the current catalog and stores the order.
///
/// The cart itself is left untouched; callers clear it once this succeeds.
pub async fn place_order(
    store: &dyn Store,
    cart: &Cart,
    request: &CheckoutRequest,
) -> Result<Order, ApiError> {
    let weapons = store.weapons_by_ids(&cart.weapon_ids()).await?;

    let prepared = prepare_order(cart, request, &weapons, new_order_number()).map_err(|e| {
        warn!("Checkout rejected: {}", e);
        e
    })?;
    let lines = prepared.lines.len();

    let order = store.place_order(prepared).await?;
    info!(
        "Placed order {} with {} lines, total {}",
        order.order_number, lines, order.total_amount
    );
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::cart::CartAction;
    use shared::checkout::DocumentUpload;
    use shared::memory::InMemoryStore;
    use shared::validation::CustomerForm;
    use shared::{CheckoutError, OrderStatus, Weapon};

    fn customer() -> CustomerForm {
        CustomerForm {
            full_name: "María Condori".to_string(),
            dni: "40123456".to_string(),
            email: "maria@example.pe".to_string(),
            phone: "987 654 321".to_string(),
            address: "Calle Mercaderes 120, Arequipa".to_string(),
        }
    }

    fn uploads(weapon: &Weapon) -> Vec<DocumentUpload> {
        weapon
            .required_documents
            .iter()
            .map(|document_type| DocumentUpload {
                document_type: document_type.clone(),
                file_name: "scan.pdf".to_string(),
            })
            .collect()
    }

    async fn glock(store: &InMemoryStore) -> Weapon {
        store
            .list_weapons(None)
            .await
            .unwrap()
            .into_iter()
            .find(|w| w.name == "Glock 17")
            .unwrap()
    }

    #[tokio::test]
    async fn stores_a_pending_order() {
        let store = InMemoryStore::with_demo_data();
        let weapon = glock(&store).await;
        let cart = Cart::default().reduce(CartAction::Add { weapon: weapon.clone(), quantity: 2 });
        let request = CheckoutRequest {
            customer: customer(),
            notes: String::new(),
            documents: uploads(&weapon),
        };

        let order = place_order(&store, &cart, &request).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pendiente);
        assert!(order.order_number.starts_with("SUCAMEC-"));

        let customer = store.find_customer_by_dni("40123456").await.unwrap().unwrap();
        assert_eq!(customer.phone, "987654321");
        let lines = store.order_lines(order.id).await.unwrap();
        assert_eq!(lines[0].item.quantity, 2);
    }

    #[tokio::test]
    async fn stale_cart_fails_the_stock_check() {
        let store = InMemoryStore::with_demo_data();
        let weapon = glock(&store).await;
        let mut snapshot = weapon.clone();
        snapshot.stock = 100;
        let cart = Cart::default().reduce(CartAction::Add { weapon: snapshot, quantity: 50 });

        let request = CheckoutRequest {
            customer: customer(),
            notes: String::new(),
            documents: uploads(&weapon),
        };
        let err = place_order(&store, &cart, &request).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Checkout(CheckoutError::InsufficientStock { requested: 50, available: 12, .. })
        ));
    }

    #[tokio::test]
    async fn weapon_removed_from_catalog_is_reported() {
        let store = InMemoryStore::new();
        let weapon = shared::seed::weapon_fixture("Walther P99", "2700.00", 2);
        let cart = Cart::default().reduce(CartAction::Add { weapon: weapon.clone(), quantity: 1 });
        let request = CheckoutRequest {
            customer: customer(),
            notes: String::new(),
            documents: Vec::new(),
        };

        let err = place_order(&store, &cart, &request).await.unwrap_err();
        assert!(matches!(err, ApiError::Checkout(CheckoutError::UnknownWeapon(id)) if id == weapon.id));
    }
}
