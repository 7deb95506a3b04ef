//! PostgreSQL implementation of the rental store

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{
    Bike, History, Order, OrderDetail, Payment, PaymentStatus, RentStatus, User,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};

use super::{ClaimOutcome, RentalStore, RentalTx, RepoError, RepoResult};

const ORDER_COLUMNS: &str =
    "id, user_id, payment_id, total_payment, total_qty, total_hour, created_at, updated_at";

/// `payments` row, status kept as TEXT
#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: String,
    payment_status: String,
    payment_type: String,
    payment_link: Option<String>,
    amount: Decimal,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepoError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let payment_status = PaymentStatus::from_db(&row.payment_status).ok_or_else(|| {
            RepoError::Database(format!(
                "payment {} has unknown status '{}'",
                row.id, row.payment_status
            ))
        })?;
        Ok(Payment {
            id: row.id,
            payment_status,
            payment_type: row.payment_type,
            payment_link: row.payment_link,
            amount: row.amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// `histories` row, status kept as TEXT
#[derive(sqlx::FromRow)]
struct HistoryRow {
    id: String,
    order_id: String,
    rent_status: String,
    created_at: i64,
    updated_at: i64,
}

impl TryFrom<HistoryRow> for History {
    type Error = RepoError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        let rent_status = RentStatus::from_db(&row.rent_status).ok_or_else(|| {
            RepoError::Database(format!(
                "history {} has unknown rent_status '{}'",
                row.id, row.rent_status
            ))
        })?;
        Ok(History {
            id: row.id,
            order_id: row.order_id,
            rent_status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ── Shared queries (pool or transaction) ──

async fn fetch_order<'e>(ex: impl PgExecutor<'e>, id: &str, lock: bool) -> RepoResult<Option<Order>> {
    let sql = if lock {
        format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE")
    } else {
        format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1")
    };
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(ex)
        .await?;
    Ok(order)
}

async fn fetch_order_details<'e>(
    ex: impl PgExecutor<'e>,
    order_id: &str,
) -> RepoResult<Vec<OrderDetail>> {
    let rows = sqlx::query_as::<_, OrderDetail>(
        "SELECT id, order_id, bike_id FROM order_details WHERE order_id = $1 ORDER BY position",
    )
    .bind(order_id)
    .fetch_all(ex)
    .await?;
    Ok(rows)
}

async fn fetch_payment<'e>(ex: impl PgExecutor<'e>, id: &str) -> RepoResult<Option<Payment>> {
    let row = sqlx::query_as::<_, PaymentRow>(
        "SELECT id, payment_status, payment_type, payment_link, amount, created_at, updated_at
         FROM payments WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(ex)
    .await?;
    row.map(Payment::try_from).transpose()
}

async fn fetch_history_by_order<'e>(
    ex: impl PgExecutor<'e>,
    order_id: &str,
) -> RepoResult<Option<History>> {
    let row = sqlx::query_as::<_, HistoryRow>(
        "SELECT id, order_id, rent_status, created_at, updated_at
         FROM histories WHERE order_id = $1",
    )
    .bind(order_id)
    .fetch_optional(ex)
    .await?;
    row.map(History::try_from).transpose()
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect, then bring the schema up to date
    pub async fn connect(database_url: &str, max_connections: u32) -> RepoResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl RentalStore for PgStore {
    async fn begin(&self) -> RepoResult<Box<dyn RentalTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx, next_position: 0 }))
    }

    async fn find_order(&self, id: &str) -> RepoResult<Option<Order>> {
        fetch_order(&self.pool, id, false).await
    }

    async fn find_order_details(&self, order_id: &str) -> RepoResult<Vec<OrderDetail>> {
        fetch_order_details(&self.pool, order_id).await
    }

    async fn find_payment(&self, id: &str) -> RepoResult<Option<Payment>> {
        fetch_payment(&self.pool, id).await
    }

    async fn find_history_by_order(&self, order_id: &str) -> RepoResult<Option<History>> {
        fetch_history_by_order(&self.pool, order_id).await
    }
}

/// Open PostgreSQL transaction; rolled back by sqlx when dropped uncommitted
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
    /// Input order of line items within this transaction
    next_position: i32,
}

#[async_trait]
impl RentalTx for PgTx {
    async fn find_user(&mut self, id: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, fullname, phone, address, role, email, created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(user)
    }

    async fn claim_bike(&mut self, bike_id: &str, now: i64) -> RepoResult<ClaimOutcome> {
        let claimed = sqlx::query_as::<_, Bike>(
            "UPDATE bikes b SET is_available = FALSE, updated_at = $2
             FROM categories c
             WHERE b.id = $1 AND b.is_available = TRUE AND c.id = b.category_id
             RETURNING b.id, b.renter_id, b.category_id, c.name AS category_name, b.name,
                b.price_per_hour, b.condition, b.description, b.is_available,
                b.created_at, b.updated_at",
        )
        .bind(bike_id)
        .bind(now)
        .fetch_optional(&mut *self.tx)
        .await?;

        if let Some(bike) = claimed {
            return Ok(ClaimOutcome::Claimed(bike));
        }

        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM bikes WHERE id = $1")
            .bind(bike_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(if exists.is_some() {
            ClaimOutcome::Unavailable
        } else {
            ClaimOutcome::Missing
        })
    }

    async fn release_bike(&mut self, bike_id: &str, now: i64) -> RepoResult<()> {
        let result =
            sqlx::query("UPDATE bikes SET is_available = TRUE, updated_at = $2 WHERE id = $1")
                .bind(bike_id)
                .bind(now)
                .execute(&mut *self.tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("bike {bike_id}")));
        }
        Ok(())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO payments (id, payment_status, payment_type, payment_link, amount, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&payment.id)
        .bind(payment.payment_status.as_db())
        .bind(&payment.payment_type)
        .bind(&payment.payment_link)
        .bind(payment.amount)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO orders (id, user_id, payment_id, total_payment, total_qty, total_hour, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(&order.payment_id)
        .bind(order.total_payment)
        .bind(order.total_qty)
        .bind(order.total_hour)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_order_detail(&mut self, detail: &OrderDetail) -> RepoResult<()> {
        let position = self.next_position;
        sqlx::query(
            "INSERT INTO order_details (id, order_id, bike_id, position) VALUES ($1, $2, $3, $4)",
        )
        .bind(&detail.id)
        .bind(&detail.order_id)
        .bind(&detail.bike_id)
        .bind(position)
        .execute(&mut *self.tx)
        .await?;
        self.next_position += 1;
        Ok(())
    }

    async fn insert_history(&mut self, history: &History) -> RepoResult<()> {
        sqlx::query(
            "INSERT INTO histories (id, order_id, rent_status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&history.id)
        .bind(&history.order_id)
        .bind(history.rent_status.as_db())
        .bind(history.created_at)
        .bind(history.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn lock_order(&mut self, id: &str) -> RepoResult<Option<Order>> {
        fetch_order(&mut *self.tx, id, true).await
    }

    async fn find_order_details(&mut self, order_id: &str) -> RepoResult<Vec<OrderDetail>> {
        fetch_order_details(&mut *self.tx, order_id).await
    }

    async fn find_payment(&mut self, id: &str) -> RepoResult<Option<Payment>> {
        fetch_payment(&mut *self.tx, id).await
    }

    async fn find_history_by_order(&mut self, order_id: &str) -> RepoResult<Option<History>> {
        fetch_history_by_order(&mut *self.tx, order_id).await
    }

    async fn update_payment(
        &mut self,
        id: &str,
        status: PaymentStatus,
        payment_type: &str,
        now: i64,
    ) -> RepoResult<()> {
        let result = sqlx::query(
            "UPDATE payments SET payment_status = $2, payment_type = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_db())
        .bind(payment_type)
        .bind(now)
        .execute(&mut *self.tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("payment {id}")));
        }
        Ok(())
    }

    async fn set_payment_link(&mut self, id: &str, link: &str, now: i64) -> RepoResult<()> {
        let result =
            sqlx::query("UPDATE payments SET payment_link = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(link)
                .bind(now)
                .execute(&mut *self.tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("payment {id}")));
        }
        Ok(())
    }

    async fn update_rent_status(
        &mut self,
        history_id: &str,
        status: RentStatus,
        now: i64,
    ) -> RepoResult<()> {
        let result =
            sqlx::query("UPDATE histories SET rent_status = $2, updated_at = $3 WHERE id = $1")
                .bind(history_id)
                .bind(status.as_db())
                .bind(now)
                .execute(&mut *self.tx)
                .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("history {history_id}")));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
