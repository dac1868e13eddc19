use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::info;
use uuid::Uuid;

use crate::checkout::{ensure_stock, NewOrderRequest};
use crate::models::*;
use crate::schema::*;
use crate::store::{assemble_aggregates, Store};
use crate::{
    AdminCredentials, Customer, Order, OrderAggregate, OrderLine, OrderStatus, OrderValidation,
    StoreError, ValidationEvent, Weapon, WeaponCategory,
};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

type DbPool = Pool<AsyncPgConnection>;

/// Applies pending migrations over a blocking connection.
pub fn run_migrations(database_url: &str) -> anyhow::Result<()> {
    let mut conn = PgConnection::establish(database_url)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| anyhow::anyhow!("Migration error: {}", e))?;
    info!("Applied {} pending migrations", applied.len());
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = Pool::builder().build(config).await?;
        Ok(Self::new(pool))
    }
}

fn load_weapons(rows: Vec<WeaponRow>) -> Vec<Weapon> {
    rows.into_iter().map(Weapon::from).collect()
}

async fn load_aggregates(
    conn: &mut AsyncPgConnection,
    orders: Vec<Order>,
) -> Result<Vec<OrderAggregate>, StoreError> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }
    let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let customer_ids: Vec<Uuid> = orders
        .iter()
        .map(|o| o.customer_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let customers: Vec<Customer> = customers::table
        .filter(customers::id.eq_any(&customer_ids))
        .select(CustomerRow::as_select())
        .load::<CustomerRow>(conn)
        .await?
        .into_iter()
        .map(Customer::from)
        .collect();

    let items: Vec<_> = order_items::table
        .filter(order_items::order_id.eq_any(&order_ids))
        .order(order_items::created_at.asc())
        .select(OrderItemRow::as_select())
        .load::<OrderItemRow>(conn)
        .await?
        .into_iter()
        .map(crate::OrderItem::from)
        .collect();

    let weapon_ids: Vec<Uuid> = items
        .iter()
        .map(|i: &crate::OrderItem| i.weapon_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let weapons = load_weapons(
        weapons::table
            .filter(weapons::id.eq_any(&weapon_ids))
            .select(WeaponRow::as_select())
            .load::<WeaponRow>(conn)
            .await?,
    );

    let documents = order_documents::table
        .filter(order_documents::order_id.eq_any(&order_ids))
        .order(order_documents::uploaded_at.asc())
        .select(OrderDocumentRow::as_select())
        .load::<OrderDocumentRow>(conn)
        .await?
        .into_iter()
        .map(crate::OrderDocument::from)
        .collect();

    Ok(assemble_aggregates(orders, customers, items, weapons, documents))
}

async fn insert_order(
    conn: &mut AsyncPgConnection,
    request: NewOrderRequest,
) -> Result<Order, StoreError> {
    conn.transaction::<_, StoreError, _>(|conn| {
        Box::pin(async move {
            let weapon_ids: Vec<Uuid> = request.lines.iter().map(|l| l.weapon_id).collect();
            let locked = load_weapons(
                weapons::table
                    .filter(weapons::id.eq_any(&weapon_ids))
                    .select(WeaponRow::as_select())
                    .for_update()
                    .load::<WeaponRow>(conn)
                    .await?,
            );
            ensure_stock(&request.lines, &locked)?;

            let form = &request.customer;
            let customer_id: Uuid = diesel::insert_into(customers::table)
                .values(&NewCustomerRow {
                    id: Uuid::new_v4(),
                    full_name: &form.full_name,
                    dni: &form.dni,
                    email: &form.email,
                    phone: &form.phone,
                    address: &form.address,
                })
                .on_conflict(customers::dni)
                .do_update()
                .set(&CustomerChangeset {
                    full_name: &form.full_name,
                    email: &form.email,
                    phone: &form.phone,
                    address: &form.address,
                })
                .returning(customers::id)
                .get_result(conn)
                .await?;

            let order_id = Uuid::new_v4();
            let inserted: OrderRow = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    order_number: request.order_number.clone(),
                    customer_id,
                    status: OrderStatus::Pendiente.as_str().to_string(),
                    total_amount: request.total(),
                    notes: request.notes.clone(),
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)
                .await?;

            let items: Vec<NewOrderItemRow> = request
                .lines
                .iter()
                .map(|line| NewOrderItemRow {
                    id: Uuid::new_v4(),
                    order_id,
                    weapon_id: line.weapon_id,
                    quantity: line.quantity,
                    unit_price: line.unit_price.clone(),
                    subtotal: line.subtotal(),
                })
                .collect();
            diesel::insert_into(order_items::table)
                .values(&items)
                .execute(conn)
                .await?;

            if !request.documents.is_empty() {
                let documents: Vec<NewOrderDocumentRow> = request
                    .documents
                    .iter()
                    .map(|upload| NewOrderDocumentRow {
                        id: Uuid::new_v4(),
                        order_id,
                        document_type: upload.document_type.clone(),
                        file_url: upload.file_url(),
                        file_name: upload.file_name.clone(),
                    })
                    .collect();
                diesel::insert_into(order_documents::table)
                    .values(&documents)
                    .execute(conn)
                    .await?;
            }

            Ok(Order::from(inserted))
        })
    })
    .await
}

async fn apply_validation(
    conn: &mut AsyncPgConnection,
    order_id: Uuid,
    admin_user_id: Uuid,
    event: ValidationEvent,
    notes: Option<String>,
) -> Result<Order, StoreError> {
    conn.transaction::<_, StoreError, _>(|conn| {
        Box::pin(async move {
            let row = orders::table
                .find(order_id)
                .select(OrderRow::as_select())
                .for_update()
                .first::<OrderRow>(conn)
                .await
                .optional()?
                .ok_or_else(|| StoreError::not_found("Orden", order_id))?;

            let mut order = Order::from(row);
            order.apply_validation(event, admin_user_id, Utc::now())?;

            diesel::update(orders::table.find(order_id))
                .set(&OrderValidationChangeset::from(&order))
                .execute(conn)
                .await?;

            diesel::insert_into(order_validations::table)
                .values(&NewOrderValidationRow {
                    id: Uuid::new_v4(),
                    order_id,
                    admin_user_id,
                    validation_type: event.kind.as_str().to_string(),
                    status: event.decision.as_str().to_string(),
                    notes,
                })
                .execute(conn)
                .await?;

            Ok(order)
        })
    })
    .await
}

#[async_trait]
impl Store for PgStore {
    async fn list_categories(&self) -> Result<Vec<WeaponCategory>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = weapon_categories::table
            .order(weapon_categories::name.asc())
            .select(WeaponCategoryRow::as_select())
            .load::<WeaponCategoryRow>(&mut conn)
            .await?;
        Ok(rows.into_iter().map(WeaponCategory::from).collect())
    }

    async fn list_weapons(&self, category_id: Option<Uuid>) -> Result<Vec<Weapon>, StoreError> {
        let mut conn = self.pool.get().await?;
        let mut query = weapons::table
            .order(weapons::name.asc())
            .select(WeaponRow::as_select())
            .into_boxed();
        if let Some(category_id) = category_id {
            query = query.filter(weapons::category_id.eq(category_id));
        }
        Ok(load_weapons(query.load::<WeaponRow>(&mut conn).await?))
    }

    async fn get_weapon(&self, id: Uuid) -> Result<Option<Weapon>, StoreError> {
        let mut conn = self.pool.get().await?;
        let row = weapons::table
            .find(id)
            .select(WeaponRow::as_select())
            .first::<WeaponRow>(&mut conn)
            .await
            .optional()?;
        Ok(row.map(Weapon::from))
    }

    async fn weapons_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Weapon>, StoreError> {
        let mut conn = self.pool.get().await?;
        Ok(load_weapons(
            weapons::table
                .filter(weapons::id.eq_any(ids))
                .select(WeaponRow::as_select())
                .load::<WeaponRow>(&mut conn)
                .await?,
        ))
    }

    async fn find_customer_by_dni(&self, dni: &str) -> Result<Option<Customer>, StoreError> {
        let mut conn = self.pool.get().await?;
        let row = customers::table
            .filter(customers::dni.eq(dni))
            .select(CustomerRow::as_select())
            .first::<CustomerRow>(&mut conn)
            .await
            .optional()?;
        Ok(row.map(Customer::from))
    }

    async fn orders_by_number(&self, order_number: &str) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = orders::table
            .filter(orders::order_number.eq(order_number))
            .order(orders::created_at.desc())
            .select(OrderRow::as_select())
            .load::<OrderRow>(&mut conn)
            .await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn orders_by_customer(&self, customer_id: Uuid) -> Result<Vec<Order>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = orders::table
            .filter(orders::customer_id.eq(customer_id))
            .order(orders::created_at.desc())
            .select(OrderRow::as_select())
            .load::<OrderRow>(&mut conn)
            .await?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn order_lines(&self, order_id: Uuid) -> Result<Vec<OrderLine>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = order_items::table
            .left_join(weapons::table)
            .filter(order_items::order_id.eq(order_id))
            .order(order_items::created_at.asc())
            .select((
                OrderItemRow::as_select(),
                Option::<WeaponRow>::as_select(),
            ))
            .load::<(OrderItemRow, Option<WeaponRow>)>(&mut conn)
            .await?;

        rows.into_iter()
            .map(|(item, weapon)| -> Result<OrderLine, StoreError> {
                Ok(OrderLine {
                    item: item.into(),
                    weapon: weapon.map(Weapon::from),
                })
            })
            .collect()
    }

    async fn place_order(&self, request: NewOrderRequest) -> Result<Order, StoreError> {
        let mut conn = self.pool.get().await?;
        let order_number = request.order_number.clone();
        let order = insert_order(&mut conn, request).await?;
        info!("Order {} stored as {}", order_number, order.id);
        Ok(order)
    }

    async fn find_admin(&self, username: &str) -> Result<Option<AdminCredentials>, StoreError> {
        let mut conn = self.pool.get().await?;
        let row = admin_users::table
            .filter(admin_users::username.eq(username))
            .select(AdminUserRow::as_select())
            .first::<AdminUserRow>(&mut conn)
            .await
            .optional()?;
        Ok(row.map(AdminCredentials::try_from).transpose()?)
    }

    async fn ensure_admin(&self, credentials: &AdminCredentials) -> Result<bool, StoreError> {
        let mut conn = self.pool.get().await?;
        let inserted = diesel::insert_into(admin_users::table)
            .values(&NewAdminUserRow::from(credentials))
            .on_conflict(admin_users::username)
            .do_nothing()
            .execute(&mut conn)
            .await?;
        Ok(inserted == 1)
    }

    async fn list_order_aggregates(&self) -> Result<Vec<OrderAggregate>, StoreError> {
        let mut conn = self.pool.get().await?;
        let orders: Vec<Order> = orders::table
            .order(orders::created_at.desc())
            .select(OrderRow::as_select())
            .load::<OrderRow>(&mut conn)
            .await?
            .into_iter()
            .map(Order::from)
            .collect();
        load_aggregates(&mut conn, orders).await
    }

    async fn get_order_aggregate(&self, id: Uuid) -> Result<Option<OrderAggregate>, StoreError> {
        let mut conn = self.pool.get().await?;
        let row = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first::<OrderRow>(&mut conn)
            .await
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(load_aggregates(&mut conn, vec![Order::from(row)])
            .await?
            .pop())
    }

    async fn record_validation(
        &self,
        order_id: Uuid,
        admin_user_id: Uuid,
        event: ValidationEvent,
        notes: Option<String>,
    ) -> Result<Order, StoreError> {
        let mut conn = self.pool.get().await?;
        let order = apply_validation(&mut conn, order_id, admin_user_id, event, notes).await?;
        info!(
            "Order {} {} {} by {}, status {}",
            order.order_number,
            event.kind.as_str(),
            event.decision.as_str(),
            admin_user_id,
            order.status
        );
        Ok(order)
    }

    async fn list_validations(&self, order_id: Uuid) -> Result<Vec<OrderValidation>, StoreError> {
        let mut conn = self.pool.get().await?;
        let rows = order_validations::table
            .filter(order_validations::order_id.eq(order_id))
            .order(order_validations::validated_at.desc())
            .select(OrderValidationRow::as_select())
            .load::<OrderValidationRow>(&mut conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(OrderValidation::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}
