use crate::config::OrderConfig;
use crate::domain::notification::{
    CASH_ON_DELIVERY, DeliveryReport, ONLINE_PAYMENT, OrderConfirmation, Recipient,
};
use crate::domain::order::{Order, OrderId, OrderPayload, OrderStatus};
use crate::domain::payment::{CaptureStatus, GatewayReference, IntentRequest};
use crate::domain::ports::{NotifierBox, OrderStoreBox, PaymentGatewayBox};
use crate::error::{OrderError, Result};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

/// Returned after a prepay order has been persisted and authorized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepayPlacement {
    pub order_id: OrderId,
    pub reference: GatewayReference,
    pub approval_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub order_id: OrderId,
    pub paid: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodPlacement {
    pub order_id: OrderId,
}

/// Drives an order through its lifecycle across the store, the payment
/// gateway and the notifier.
///
/// Holds no lock of its own. Concurrent operations on one order are
/// serialized solely by `OrderStore::compare_and_transition`, so the
/// orchestrator can be shared freely behind an `Arc`.
pub struct OrderOrchestrator {
    store: OrderStoreBox,
    gateway: PaymentGatewayBox,
    notifier: NotifierBox,
    config: OrderConfig,
}

impl OrderOrchestrator {
    pub fn new(
        store: OrderStoreBox,
        gateway: PaymentGatewayBox,
        notifier: NotifierBox,
        config: OrderConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &OrderConfig {
        &self.config
    }

    /// Persists an order and requests a payment intent for it.
    ///
    /// When the gateway fails the order stays `created` without a reference;
    /// `retry_prepay_order` can authorize it later.
    #[instrument(skip_all)]
    pub async fn place_prepay_order(&self, payload: OrderPayload) -> Result<PrepayPlacement> {
        let draft = payload.into_draft(&self.config.default_currency)?;
        let order = self.store.create(draft).await?;
        info!(order_id = %order.id, total = %order.total, currency = %order.currency, "Prepay order created");

        self.authorize(order).await
    }

    /// Requests a fresh intent for a `created` order that never got one.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn retry_prepay_order(&self, order_id: OrderId) -> Result<PrepayPlacement> {
        let order = self.fetch(order_id).await?;
        if order.status.is_settled() || order.gateway_reference.is_some() {
            warn!(status = %order.status, "Refusing to re-authorize order");
            return Err(OrderError::AlreadyInitiated(order_id));
        }
        self.authorize(order).await
    }

    async fn authorize(&self, order: Order) -> Result<PrepayPlacement> {
        let request = IntentRequest::for_order(&order, &self.config.brand_name);
        let intent = match self.gateway.create_intent(&request).await {
            Ok(intent) => intent,
            Err(e) => {
                error!(error = %e, order_id = %order.id, "Payment intent creation failed");
                return Err(match e {
                    e @ OrderError::GatewayError { .. } => e,
                    other => OrderError::gateway(other.to_string()),
                });
            }
        };

        let attached = self
            .store
            .compare_and_transition(order.id, &intent.reference, OrderStatus::Created)
            .await;
        match attached {
            Ok(t) if t.was_applied() => {}
            Ok(t) => {
                warn!(order_id = %order.id, status = %t.order().status, "Order settled before its intent was attached");
                return Err(OrderError::AlreadyInitiated(order.id));
            }
            Err(OrderError::Conflict { current }) => {
                // A concurrent retry attached a different intent first.
                warn!(
                    order_id = %order.id,
                    reference = %intent.reference,
                    "Order already carries another payment intent"
                );
                return Err(OrderError::AlreadyInitiated(current.id));
            }
            Err(e) => return Err(e),
        }

        info!(order_id = %order.id, reference = %intent.reference, "Payment intent attached");
        Ok(PrepayPlacement {
            order_id: order.id,
            reference: intent.reference,
            approval_url: intent.approval_url,
        })
    }

    /// Captures the intent of a prepay order and records the outcome.
    ///
    /// A reference that does not match the stored one is reported as
    /// `NotFound`. Repeating a confirmation returns the settled result
    /// without touching the gateway again.
    #[instrument(skip_all, fields(order_id = %order_id))]
    pub async fn confirm_payment(
        &self,
        order_id: OrderId,
        reference: &GatewayReference,
    ) -> Result<PaymentConfirmation> {
        let order = self.fetch(order_id).await?;
        if order.gateway_reference.as_ref() != Some(reference) {
            warn!(
                supplied = %reference,
                "Capture requested with a reference that does not match the order"
            );
            return Err(OrderError::NotFound(order_id.to_string()));
        }

        if order.status.is_settled() {
            info!(status = %order.status, "Order already settled, skipping capture");
            return Ok(PaymentConfirmation {
                order_id,
                paid: order.status == OrderStatus::Paid,
            });
        }

        let outcome = self.gateway.capture_intent(reference).await.map_err(|e| {
            error!(error = %e, reference = %reference, "Capture failed, order outcome unknown");
            match e {
                e @ OrderError::GatewayError { .. } => e,
                other => OrderError::gateway(other.to_string()),
            }
        })?;

        let target = match outcome.status {
            CaptureStatus::Completed => OrderStatus::Paid,
            CaptureStatus::Declined | CaptureStatus::Pending => OrderStatus::Failed,
        };
        info!(capture_status = ?outcome.status, raw = %outcome.raw, "Capture finished");

        let settled = match self
            .store
            .compare_and_transition(order_id, reference, target)
            .await
        {
            Ok(transition) => {
                let applied = transition.was_applied();
                let order = transition.into_order();
                if applied && order.status == OrderStatus::Paid && self.config.notify_on_payment {
                    self.confirm_to_recipients(&order, ONLINE_PAYMENT).await;
                }
                order
            }
            Err(OrderError::Conflict { current }) => {
                warn!(status = %current.status, "Concurrent transition won, using stored state");
                *current
            }
            Err(e) => return Err(e),
        };

        info!(status = %settled.status, "Payment confirmation recorded");
        Ok(PaymentConfirmation {
            order_id,
            paid: settled.status == OrderStatus::Paid,
        })
    }

    /// Persists a cash-on-delivery order and notifies the customer and the
    /// operations inbox. Notification failures never fail the order.
    #[instrument(skip_all)]
    pub async fn place_cod_order(&self, payload: OrderPayload) -> Result<CodPlacement> {
        let draft = payload.into_draft(&self.config.default_currency)?;
        let order = self.store.create(draft).await?;
        info!(order_id = %order.id, total = %order.total, "Cash on delivery order created");

        self.confirm_to_recipients(&order, CASH_ON_DELIVERY).await;
        Ok(CodPlacement { order_id: order.id })
    }

    /// Current stored state, for callers that lost track of an outcome.
    pub async fn get_order(&self, order_id: OrderId) -> Result<Order> {
        self.fetch(order_id).await
    }

    async fn fetch(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))
    }

    async fn confirm_to_recipients(&self, order: &Order, payment_method: &str) -> DeliveryReport {
        let message = OrderConfirmation::for_order(order, payment_method);
        let recipients = [
            Recipient::Customer(order.customer.email.clone()),
            Recipient::Operations(self.config.operations_inbox.clone()),
        ];
        let report = self
            .notifier
            .notify(&message, &recipients, self.config.notify_timeout)
            .await;
        if !report.all_delivered() {
            warn!(
                order_id = %order.id,
                failed = report.failed.len(),
                "Some order confirmations were not delivered"
            );
        }
        report
    }
}
