#![allow(dead_code)]

use async_trait::async_trait;
use rand::Rng;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use vaultorders::application::orchestrator::OrderOrchestrator;
use vaultorders::config::OrderConfig;
use vaultorders::domain::notification::{OrderConfirmation, Recipient};
use vaultorders::domain::order::OrderPayload;
use vaultorders::domain::payment::{
    CaptureOutcome, CaptureStatus, CreatedIntent, GatewayReference, IntentRequest,
};
use vaultorders::domain::ports::{Notifier, PaymentGateway};
use vaultorders::error::{OrderError, Result};
use vaultorders::infrastructure::in_memory::InMemoryOrderStore;

pub const OPS_INBOX: &str = "ops@vintagevault.test";

/// The canonical prepay/COD payload: one shirt, 40 + 2 + 5 = 47.
pub fn sample_payload() -> OrderPayload {
    serde_json::from_value(serde_json::json!({
        "items": [{"productId": "p1", "name": "Shirt", "price": 20, "quantity": 2}],
        "subtotal": 40, "tax": 2, "shipping": 5, "total": 47,
        "customer": {"name": "Ann", "email": "a@x.com"}
    }))
    .unwrap()
}

/// A random payload whose totals reconcile.
pub fn random_payload<R: Rng>(rng: &mut R) -> OrderPayload {
    let item_count = rng.gen_range(1..=5);
    let mut items = Vec::new();
    let mut subtotal = Decimal::ZERO;
    for i in 0..item_count {
        let price = Decimal::new(rng.gen_range(0..100_000), 2);
        let quantity: u32 = rng.gen_range(0..10);
        subtotal += price * Decimal::from(quantity);
        items.push(serde_json::json!({
            "productId": format!("p{}", i),
            "name": format!("Item {}", i),
            "unitPrice": price.to_string(),
            "quantity": quantity,
        }));
    }
    let tax = Decimal::new(rng.gen_range(0..5_000), 2);
    let shipping = Decimal::new(rng.gen_range(0..2_000), 2);
    let total = subtotal + tax + shipping;

    serde_json::from_value(serde_json::json!({
        "items": items,
        "subtotal": subtotal.to_string(),
        "tax": tax.to_string(),
        "shipping": shipping.to_string(),
        "total": total.to_string(),
        "currency": "EUR",
        "customer": {"name": format!("Customer {}", rng.gen_range(0..1000)), "email": "c@x.com"}
    }))
    .unwrap()
}

/// Gateway double with a scripted capture result and call counters.
#[derive(Clone)]
pub struct ScriptedGateway {
    pub capture_status: CaptureStatus,
    pub fail_create: Arc<Mutex<bool>>,
    pub fail_capture: bool,
    pub created: Arc<AtomicUsize>,
    pub captured: Arc<AtomicUsize>,
    pub requests: Arc<Mutex<Vec<IntentRequest>>>,
}

impl ScriptedGateway {
    pub fn new(capture_status: CaptureStatus) -> Self {
        Self {
            capture_status,
            fail_create: Arc::new(Mutex::new(false)),
            fail_capture: false,
            created: Arc::default(),
            captured: Arc::default(),
            requests: Arc::default(),
        }
    }

    pub fn failing_create(self) -> Self {
        *self.fail_create.lock().unwrap() = true;
        self
    }

    pub fn failing_capture(mut self) -> Self {
        self.fail_capture = true;
        self
    }

    pub fn set_fail_create(&self, fail: bool) {
        *self.fail_create.lock().unwrap() = fail;
    }

    pub fn captures(&self) -> usize {
        self.captured.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn create_intent(&self, request: &IntentRequest) -> Result<CreatedIntent> {
        if *self.fail_create.lock().unwrap() {
            return Err(OrderError::gateway("connection refused"));
        }
        self.requests.lock().unwrap().push(request.clone());
        let n = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let reference = GatewayReference::new(format!("INTENT-{}", n));
        Ok(CreatedIntent {
            approval_url: format!("https://pay.test/approve?token={}", reference),
            reference,
        })
    }

    async fn capture_intent(&self, reference: &GatewayReference) -> Result<CaptureOutcome> {
        self.captured.fetch_add(1, Ordering::SeqCst);
        if self.fail_capture {
            return Err(OrderError::gateway("timeout"));
        }
        Ok(CaptureOutcome {
            status: self.capture_status,
            raw: serde_json::json!({ "id": reference.as_str() }),
        })
    }
}

/// Notifier double that records every attempt and can fail or hang for
/// chosen addresses.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub attempts: Arc<Mutex<Vec<(Recipient, serde_json::Value)>>>,
    pub failing: Arc<Mutex<Vec<String>>>,
    pub hanging: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn failing_for(address: &str) -> Self {
        let notifier = Self::default();
        notifier.failing.lock().unwrap().push(address.to_string());
        notifier
    }

    pub fn hanging_for(address: &str) -> Self {
        let notifier = Self::default();
        notifier.hanging.lock().unwrap().push(address.to_string());
        notifier
    }

    pub fn attempted(&self) -> Vec<(Recipient, serde_json::Value)> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &OrderConfirmation, recipient: &Recipient) -> Result<()> {
        self.attempts
            .lock()
            .unwrap()
            .push((recipient.clone(), message.addressed_to(recipient)));

        let address = recipient.address().to_string();
        let hangs = self.hanging.lock().unwrap().contains(&address);
        let fails = self.failing.lock().unwrap().contains(&address);
        if hangs {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if fails {
            return Err(OrderError::NotificationError(format!(
                "mailbox {} unavailable",
                address
            )));
        }
        Ok(())
    }
}

pub fn test_config() -> OrderConfig {
    OrderConfig {
        operations_inbox: OPS_INBOX.to_string(),
        notify_timeout: Duration::from_millis(200),
        ..OrderConfig::default()
    }
}

pub struct Harness {
    pub orchestrator: Arc<OrderOrchestrator>,
    pub store: InMemoryOrderStore,
    pub gateway: ScriptedGateway,
    pub notifier: RecordingNotifier,
}

pub fn harness(gateway: ScriptedGateway, notifier: RecordingNotifier) -> Harness {
    harness_with_config(gateway, notifier, test_config())
}

pub fn harness_with_config(
    gateway: ScriptedGateway,
    notifier: RecordingNotifier,
    config: OrderConfig,
) -> Harness {
    let store = InMemoryOrderStore::new();
    let orchestrator = OrderOrchestrator::new(
        Box::new(store.clone()),
        Box::new(gateway.clone()),
        Box::new(notifier.clone()),
        config,
    );
    Harness {
        orchestrator: Arc::new(orchestrator),
        store,
        gateway,
        notifier,
    }
}
