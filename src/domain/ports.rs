use super::notification::{DeliveryReport, OrderConfirmation, Recipient};
use super::order::{Order, OrderDraft, OrderId, OrderStatus, Transition};
use super::payment::{CaptureOutcome, CreatedIntent, GatewayReference, IntentRequest};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Persistence for order records.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order in `created`, assigning its id and timestamps.
    ///
    /// Fails with `ValidationError`, writing nothing, if the draft violates an
    /// order invariant.
    async fn create(&self, draft: OrderDraft) -> Result<Order>;

    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Atomically moves an order to `new_status` if its stored reference
    /// matches `expected_reference`, assigning it when unset.
    ///
    /// Settled orders come back as `Transition::Unchanged`. A reference
    /// mismatch yields `OrderError::Conflict` carrying the current record.
    async fn compare_and_transition(
        &self,
        id: OrderId,
        expected_reference: &GatewayReference,
        new_status: OrderStatus,
    ) -> Result<Transition>;
}

/// Client of the external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: &IntentRequest) -> Result<CreatedIntent>;

    /// Finalizes an intent. Calling it twice for the same reference must not
    /// charge twice.
    async fn capture_intent(&self, reference: &GatewayReference) -> Result<CaptureOutcome>;
}

/// Delivery of order confirmation messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &OrderConfirmation, recipient: &Recipient) -> Result<()>;

    /// Sends `message` to every recipient independently.
    ///
    /// Never fails: each error or timeout is logged and recorded in the report.
    async fn notify(
        &self,
        message: &OrderConfirmation,
        recipients: &[Recipient],
        per_send_timeout: Duration,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for recipient in recipients {
            let outcome = match tokio::time::timeout(per_send_timeout, self.send(message, recipient))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(OrderError::NotificationError(format!(
                    "timed out after {:?}",
                    per_send_timeout
                ))),
            };
            match outcome {
                Ok(()) => report.delivered.push(recipient.clone()),
                Err(e) => {
                    warn!(
                        error = %e,
                        order_id = %message.order_id,
                        recipient = %recipient,
                        "Order confirmation could not be sent"
                    );
                    report.failed.push((recipient.clone(), e.to_string()));
                }
            }
        }
        report
    }
}

pub type OrderStoreBox = Box<dyn OrderStore>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;
pub type NotifierBox = Box<dyn Notifier>;
