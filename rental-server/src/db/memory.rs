//! In-memory rental store for tests
//!
//! One async mutex guards all tables. A transaction holds the guard for its
//! whole lifetime and works on a copy; `commit` writes the copy back, drop
//! discards it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use shared::models::{
    Bike, History, Order, OrderDetail, Payment, PaymentStatus, RentStatus, User,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{ClaimOutcome, RentalStore, RentalTx, RepoError, RepoResult};

#[derive(Debug, Default, Clone)]
pub struct Tables {
    pub users: HashMap<String, User>,
    pub bikes: HashMap<String, Bike>,
    pub payments: HashMap<String, Payment>,
    pub orders: HashMap<String, Order>,
    pub order_details: Vec<OrderDetail>,
    pub histories: Vec<History>,
}

/// One-shot failure armed on a named write
#[derive(Debug, Clone, Copy)]
struct Injected {
    op: &'static str,
    conflict: bool,
}

type InjectedSlot = Arc<std::sync::Mutex<Option<Injected>>>;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    injected: InjectedSlot,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, id: &str) {
        let user = User {
            id: id.to_string(),
            fullname: format!("Customer {id}"),
            phone: "081234567890".to_string(),
            address: "Jl. Sudirman 1".to_string(),
            role: "customer".to_string(),
            email: format!("{id}@example.com"),
            created_at: 0,
            updated_at: 0,
        };
        self.tables.lock().await.users.insert(id.to_string(), user);
    }

    pub async fn add_bike(&self, id: &str, price_per_hour: i64, is_available: bool) {
        self.add_priced_bike(id, Decimal::from(price_per_hour), is_available)
            .await;
    }

    pub async fn add_priced_bike(&self, id: &str, price_per_hour: Decimal, is_available: bool) {
        let bike = Bike {
            id: id.to_string(),
            renter_id: "r-1".to_string(),
            category_id: "cat-1".to_string(),
            category_name: "City".to_string(),
            name: format!("Bike {id}"),
            price_per_hour,
            condition: "good".to_string(),
            description: String::new(),
            is_available,
            created_at: 0,
            updated_at: 0,
        };
        self.tables.lock().await.bikes.insert(id.to_string(), bike);
    }

    /// Make the named write fail once, in whichever transaction reaches it first
    pub fn fail_on(&self, op: &'static str) {
        *self.injected.lock().unwrap() = Some(Injected { op, conflict: false });
    }

    /// Like [`Self::fail_on`], but the write loses a lock race instead
    pub fn conflict_on(&self, op: &'static str) {
        *self.injected.lock().unwrap() = Some(Injected { op, conflict: true });
    }

    pub async fn snapshot(&self) -> Tables {
        self.tables.lock().await.clone()
    }

    pub async fn bike(&self, id: &str) -> Bike {
        self.snapshot().await.bikes[id].clone()
    }

    pub async fn history_of(&self, order_id: &str) -> History {
        self.snapshot()
            .await
            .histories
            .into_iter()
            .find(|h| h.order_id == order_id)
            .unwrap()
    }

    pub async fn payment_of(&self, order_id: &str) -> Payment {
        let tables = self.snapshot().await;
        let payment_id = &tables.orders[order_id].payment_id;
        tables.payments[payment_id].clone()
    }

    /// Overwrite stored statuses, bypassing the workflow
    pub async fn force_status(&self, order_id: &str, payment: PaymentStatus, rent: RentStatus) {
        let mut tables = self.tables.lock().await;
        let payment_id = tables.orders[order_id].payment_id.clone();
        if let Some(p) = tables.payments.get_mut(&payment_id) {
            p.payment_status = payment;
        }
        if let Some(h) = tables.histories.iter_mut().find(|h| h.order_id == order_id) {
            h.rent_status = rent;
        }
    }
}

#[async_trait]
impl RentalStore for InMemoryStore {
    async fn begin(&self) -> RepoResult<Box<dyn RentalTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            staged,
            injected: self.injected.clone(),
        }))
    }

    async fn find_order(&self, id: &str) -> RepoResult<Option<Order>> {
        Ok(self.tables.lock().await.orders.get(id).cloned())
    }

    async fn find_order_details(&self, order_id: &str) -> RepoResult<Vec<OrderDetail>> {
        let tables = self.tables.lock().await;
        Ok(details_of(&tables, order_id))
    }

    async fn find_payment(&self, id: &str) -> RepoResult<Option<Payment>> {
        Ok(self.tables.lock().await.payments.get(id).cloned())
    }

    async fn find_history_by_order(&self, order_id: &str) -> RepoResult<Option<History>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .histories
            .iter()
            .find(|h| h.order_id == order_id)
            .cloned())
    }
}

fn details_of(tables: &Tables, order_id: &str) -> Vec<OrderDetail> {
    tables
        .order_details
        .iter()
        .filter(|d| d.order_id == order_id)
        .cloned()
        .collect()
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
    injected: InjectedSlot,
}

impl MemoryTx {
    fn check(&mut self, op: &'static str) -> RepoResult<()> {
        let mut slot = self.injected.lock().unwrap();
        match *slot {
            Some(armed) if armed.op == op => {
                *slot = None;
                if armed.conflict {
                    Err(RepoError::Conflict(format!("injected lock conflict: {op}")))
                } else {
                    Err(RepoError::Database(format!("injected failure: {op}")))
                }
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl RentalTx for MemoryTx {
    async fn find_user(&mut self, id: &str) -> RepoResult<Option<User>> {
        Ok(self.staged.users.get(id).cloned())
    }

    async fn claim_bike(&mut self, bike_id: &str, now: i64) -> RepoResult<ClaimOutcome> {
        self.check("claim_bike")?;
        Ok(match self.staged.bikes.get_mut(bike_id) {
            None => ClaimOutcome::Missing,
            Some(bike) if !bike.is_available => ClaimOutcome::Unavailable,
            Some(bike) => {
                bike.is_available = false;
                bike.updated_at = now;
                ClaimOutcome::Claimed(bike.clone())
            }
        })
    }

    async fn release_bike(&mut self, bike_id: &str, now: i64) -> RepoResult<()> {
        self.check("release_bike")?;
        let bike = self
            .staged
            .bikes
            .get_mut(bike_id)
            .ok_or_else(|| RepoError::NotFound(format!("bike {bike_id}")))?;
        bike.is_available = true;
        bike.updated_at = now;
        Ok(())
    }

    async fn insert_payment(&mut self, payment: &Payment) -> RepoResult<()> {
        self.check("insert_payment")?;
        self.staged
            .payments
            .insert(payment.id.clone(), payment.clone());
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> RepoResult<()> {
        self.check("insert_order")?;
        self.staged.orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn insert_order_detail(&mut self, detail: &OrderDetail) -> RepoResult<()> {
        self.check("insert_order_detail")?;
        self.staged.order_details.push(detail.clone());
        Ok(())
    }

    async fn insert_history(&mut self, history: &History) -> RepoResult<()> {
        self.check("insert_history")?;
        self.staged.histories.push(history.clone());
        Ok(())
    }

    async fn lock_order(&mut self, id: &str) -> RepoResult<Option<Order>> {
        Ok(self.staged.orders.get(id).cloned())
    }

    async fn find_order_details(&mut self, order_id: &str) -> RepoResult<Vec<OrderDetail>> {
        Ok(details_of(&self.staged, order_id))
    }

    async fn find_payment(&mut self, id: &str) -> RepoResult<Option<Payment>> {
        Ok(self.staged.payments.get(id).cloned())
    }

    async fn find_history_by_order(&mut self, order_id: &str) -> RepoResult<Option<History>> {
        Ok(self
            .staged
            .histories
            .iter()
            .find(|h| h.order_id == order_id)
            .cloned())
    }

    async fn update_payment(
        &mut self,
        id: &str,
        status: PaymentStatus,
        payment_type: &str,
        now: i64,
    ) -> RepoResult<()> {
        self.check("update_payment")?;
        let payment = self
            .staged
            .payments
            .get_mut(id)
            .ok_or_else(|| RepoError::NotFound(format!("payment {id}")))?;
        payment.payment_status = status;
        payment.payment_type = payment_type.to_string();
        payment.updated_at = now;
        Ok(())
    }

    async fn set_payment_link(&mut self, id: &str, link: &str, now: i64) -> RepoResult<()> {
        self.check("set_payment_link")?;
        let payment = self
            .staged
            .payments
            .get_mut(id)
            .ok_or_else(|| RepoError::NotFound(format!("payment {id}")))?;
        payment.payment_link = Some(link.to_string());
        payment.updated_at = now;
        Ok(())
    }

    async fn update_rent_status(
        &mut self,
        history_id: &str,
        status: RentStatus,
        now: i64,
    ) -> RepoResult<()> {
        self.check("update_rent_status")?;
        let history = self
            .staged
            .histories
            .iter_mut()
            .find(|h| h.id == history_id)
            .ok_or_else(|| RepoError::NotFound(format!("history {history_id}")))?;
        history.rent_status = status;
        history.updated_at = now;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let MemoryTx {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn claim_is_conditional() {
        let store = InMemoryStore::new();
        store.add_bike("b-1", 100, true).await;
        store.add_bike("b-2", 100, false).await;

        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.claim_bike("b-1", 1).await.unwrap(),
            ClaimOutcome::Claimed(_)
        ));
        assert_eq!(
            tx.claim_bike("b-1", 2).await.unwrap(),
            ClaimOutcome::Unavailable
        );
        assert_eq!(
            tx.claim_bike("b-2", 2).await.unwrap(),
            ClaimOutcome::Unavailable
        );
        assert_eq!(tx.claim_bike("nope", 2).await.unwrap(), ClaimOutcome::Missing);
        tx.commit().await.unwrap();

        assert!(!store.bike("b-1").await.is_available);
    }

    #[tokio::test]
    async fn dropped_tx_discards_writes() {
        let store = InMemoryStore::new();
        store.add_bike("b-1", 100, true).await;

        {
            let mut tx = store.begin().await.unwrap();
            tx.claim_bike("b-1", 1).await.unwrap();
        }

        assert!(store.bike("b-1").await.is_available);
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let store = InMemoryStore::new();
        store.add_bike("b-1", 100, true).await;
        store.fail_on("claim_bike");

        let mut tx = store.begin().await.unwrap();
        assert!(tx.claim_bike("b-1", 1).await.is_err());
        assert!(tx.claim_bike("b-1", 1).await.is_ok());
    }

    #[tokio::test]
    async fn injected_failure_waits_for_its_operation() {
        let store = InMemoryStore::new();
        store.add_bike("b-1", 100, true).await;
        store.conflict_on("release_bike");

        // A transaction that never releases leaves the failure armed
        let mut tx = store.begin().await.unwrap();
        tx.claim_bike("b-1", 1).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert!(matches!(
            tx.release_bike("b-1", 2).await,
            Err(RepoError::Conflict(_))
        ));
        assert!(tx.release_bike("b-1", 2).await.is_ok());
    }
}
