use crate::domain::order::{Order, OrderDraft, OrderId, OrderStatus, Transition};
use crate::domain::payment::GatewayReference;
use crate::domain::ports::OrderStore;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory order store.
///
/// Uses `Arc<RwLock<HashMap<OrderId, Order>>>` to allow shared concurrent
/// access. A compare-and-transition holds the write guard for the whole
/// read-check-write, which is what makes it atomic.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    /// Snapshot of every stored order, oldest first.
    pub async fn all_orders(&self) -> Vec<Order> {
        let orders = self.orders.read().await;
        let mut all: Vec<Order> = orders.values().cloned().collect();
        all.sort_by_key(|o| o.created_at);
        all
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, draft: OrderDraft) -> Result<Order> {
        draft.validate()?;
        let order = Order::from_draft(OrderId::new(), draft, Utc::now());
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id).cloned())
    }

    async fn compare_and_transition(
        &self,
        id: OrderId,
        expected_reference: &GatewayReference,
        new_status: OrderStatus,
    ) -> Result<Transition> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(&id)
            .ok_or_else(|| OrderError::NotFound(id.to_string()))?;
        order.transition(expected_reference, new_status, Utc::now())
    }
}
