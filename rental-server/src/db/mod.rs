//! Database access layer
//!
//! The order workflow talks to persistence through [`RentalStore`] and
//! [`RentalTx`]. A transaction that is dropped without [`RentalTx::commit`]
//! rolls back every write it staged, bike claims included.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use shared::models::{
    Bike, History, Order, OrderDetail, Payment, PaymentStatus, RentStatus, User,
};
use thiserror::Error;

pub use postgres::PgStore;

/// Repository errors
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Postgres SQLSTATEs raised when concurrent transactions fight over rows:
/// `40P01` deadlock_detected, `55P03` lock_not_available.
const LOCK_CONTENTION_CODES: [&str; 2] = ["40P01", "55P03"];

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".into()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepoError::Conflict(db_err.to_string())
            }
            sqlx::Error::Database(db_err)
                if db_err
                    .code()
                    .is_some_and(|code| LOCK_CONTENTION_CODES.contains(&code.as_ref())) =>
            {
                RepoError::Conflict(db_err.to_string())
            }
            other => RepoError::Database(other.to_string()),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Result of a conditional bike claim
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// Flag flipped to unavailable by this call
    Claimed(Bike),
    /// Bike exists but is already reserved
    Unavailable,
    /// No bike with this id
    Missing,
}

/// Connection-level handle: opens transactions and serves plain reads
#[async_trait]
pub trait RentalStore: Send + Sync {
    async fn begin(&self) -> RepoResult<Box<dyn RentalTx>>;

    async fn find_order(&self, id: &str) -> RepoResult<Option<Order>>;
    async fn find_order_details(&self, order_id: &str) -> RepoResult<Vec<OrderDetail>>;
    async fn find_payment(&self, id: &str) -> RepoResult<Option<Payment>>;
    async fn find_history_by_order(&self, order_id: &str) -> RepoResult<Option<History>>;
}

/// Unit of work over the rental tables
#[async_trait]
pub trait RentalTx: Send {
    async fn find_user(&mut self, id: &str) -> RepoResult<Option<User>>;

    /// Atomically flip `is_available` from true to false.
    async fn claim_bike(&mut self, bike_id: &str, now: i64) -> RepoResult<ClaimOutcome>;

    /// Set `is_available` back to true.
    async fn release_bike(&mut self, bike_id: &str, now: i64) -> RepoResult<()>;

    async fn insert_payment(&mut self, payment: &Payment) -> RepoResult<()>;
    async fn insert_order(&mut self, order: &Order) -> RepoResult<()>;
    async fn insert_order_detail(&mut self, detail: &OrderDetail) -> RepoResult<()>;
    async fn insert_history(&mut self, history: &History) -> RepoResult<()>;

    /// Load an order and lock it for the rest of the transaction.
    async fn lock_order(&mut self, id: &str) -> RepoResult<Option<Order>>;
    async fn find_order_details(&mut self, order_id: &str) -> RepoResult<Vec<OrderDetail>>;
    async fn find_payment(&mut self, id: &str) -> RepoResult<Option<Payment>>;
    async fn find_history_by_order(&mut self, order_id: &str) -> RepoResult<Option<History>>;

    async fn update_payment(
        &mut self,
        id: &str,
        status: PaymentStatus,
        payment_type: &str,
        now: i64,
    ) -> RepoResult<()>;
    async fn set_payment_link(&mut self, id: &str, link: &str, now: i64) -> RepoResult<()>;
    async fn update_rent_status(
        &mut self,
        history_id: &str,
        status: RentStatus,
        now: i64,
    ) -> RepoResult<()>;

    async fn commit(self: Box<Self>) -> RepoResult<()>;
}
