use crate::domain::order::{Order, OrderDraft, OrderId, OrderStatus, Transition};
use crate::domain::payment::GatewayReference;
use crate::domain::ports::OrderStore;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing order records.
pub const CF_ORDERS: &str = "orders";

/// A persistent order store implementation using RocksDB.
///
/// Orders are stored as JSON keyed by the 16 bytes of their id.
/// Compare-and-transition is a read-modify-write serialized by an async
/// mutex, so it is atomic for every handle cloned from the same `open`.
/// Two processes must not open the same path concurrently; RocksDB's own
/// lock file already refuses that.
#[derive(Clone)]
pub struct RocksDBOrderStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBOrderStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "orders" column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_orders = ColumnFamilyDescriptor::new(CF_ORDERS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_orders])?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn read(&self, id: OrderId) -> Result<Option<Order>> {
        let cf = self.db.cf_handle(CF_ORDERS).ok_or_else(missing_cf)?;
        match self.db.get_cf(&cf, id.as_bytes())? {
            Some(bytes) => {
                let order = serde_json::from_slice(&bytes).map_err(|e| {
                    OrderError::InternalError(Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Deserialization error: {}", e),
                    )))
                })?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    fn write(&self, order: &Order) -> Result<()> {
        let cf = self.db.cf_handle(CF_ORDERS).ok_or_else(missing_cf)?;
        let value = serde_json::to_vec(order).map_err(|e| {
            OrderError::InternalError(Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Serialization error: {}", e),
            )))
        })?;
        self.db.put_cf(&cf, order.id.as_bytes(), value)?;
        Ok(())
    }
}

fn missing_cf() -> OrderError {
    OrderError::InternalError(Box::new(std::io::Error::other(
        "Orders column family not found",
    )))
}

#[async_trait]
impl OrderStore for RocksDBOrderStore {
    async fn create(&self, draft: OrderDraft) -> Result<Order> {
        draft.validate()?;
        let order = Order::from_draft(OrderId::new(), draft, Utc::now());
        self.write(&order)?;
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        self.read(id)
    }

    async fn compare_and_transition(
        &self,
        id: OrderId,
        expected_reference: &GatewayReference,
        new_status: OrderStatus,
    ) -> Result<Transition> {
        let _guard = self.write_lock.lock().await;
        let mut order = self
            .read(id)?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;
        let transition = order.transition(expected_reference, new_status, Utc::now())?;
        if transition.was_applied() {
            self.write(&order)?;
        }
        Ok(transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Money;
    use crate::domain::order::{Customer, OrderItem};
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn draft() -> OrderDraft {
        OrderDraft {
            items: vec![OrderItem {
                product_id: "p1".into(),
                name: "Shirt".into(),
                image: None,
                unit_price: Money::new(dec!(20)).unwrap(),
                quantity: 2,
            }],
            subtotal: Money::new(dec!(40)).unwrap(),
            tax: Money::new(dec!(2)).unwrap(),
            shipping: Money::new(dec!(5)).unwrap(),
            total: Money::new(dec!(47)).unwrap(),
            currency: "USD".into(),
            customer: Customer {
                name: "Ann".into(),
                email: "a@x.com".into(),
                address: Some("1 Main St".into()),
            },
        }
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let store = RocksDBOrderStore::open(dir.path()).expect("Failed to open RocksDB");

        assert!(store.db.cf_handle(CF_ORDERS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_order_round_trip() {
        let dir = tempdir().unwrap();
        let store = RocksDBOrderStore::open(dir.path()).unwrap();

        let order = store.create(draft()).await.unwrap();
        let retrieved = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(retrieved, order);

        assert!(store.get(OrderId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rocksdb_transition_survives_reopen() {
        let dir = tempdir().unwrap();
        let reference = GatewayReference::new("REF-1");
        let id = {
            let store = RocksDBOrderStore::open(dir.path()).unwrap();
            let order = store.create(draft()).await.unwrap();
            store
                .compare_and_transition(order.id, &reference, OrderStatus::Paid)
                .await
                .unwrap();
            order.id
        };

        let store = RocksDBOrderStore::open(dir.path()).unwrap();
        let order = store.get(id).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.gateway_reference, Some(reference.clone()));

        let again = store
            .compare_and_transition(id, &reference, OrderStatus::Failed)
            .await
            .unwrap();
        assert!(!again.was_applied());
    }
}
