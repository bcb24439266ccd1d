mod common;

use common::{OPS_INBOX, RecordingNotifier, ScriptedGateway, harness, sample_payload};
use std::time::{Duration, Instant};
use vaultorders::domain::notification::Recipient;
use vaultorders::domain::order::OrderStatus;
use vaultorders::domain::payment::CaptureStatus;
use vaultorders::domain::ports::OrderStore;
use vaultorders::error::OrderError;

#[tokio::test]
async fn test_cod_order_is_created_and_notified() {
    let h = harness(
        ScriptedGateway::new(CaptureStatus::Completed),
        RecordingNotifier::default(),
    );

    let placed = h
        .orchestrator
        .place_cod_order(sample_payload())
        .await
        .unwrap();

    let order = h.store.get(placed.order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Created);
    assert!(order.gateway_reference.is_none());
    assert_eq!(h.gateway.requests.lock().unwrap().len(), 0);

    let attempts = h.notifier.attempted();
    assert_eq!(attempts.len(), 2);

    let (customer, customer_params) = &attempts[0];
    assert_eq!(customer, &Recipient::Customer("a@x.com".into()));
    assert_eq!(customer_params["to_email"], "a@x.com");
    assert_eq!(customer_params["payment_method"], "Cash on Delivery");
    assert_eq!(customer_params["order_id"], placed.order_id.to_string());
    assert_eq!(customer_params["total"], "47.00");
    assert_eq!(customer_params["items"], "Shirt x 2 = 40.00");

    let (ops, ops_params) = &attempts[1];
    assert_eq!(ops, &Recipient::Operations(OPS_INBOX.into()));
    assert_eq!(ops_params["to_email"], OPS_INBOX);
    assert_eq!(ops_params["customer_email"], "a@x.com");
}

#[tokio::test]
async fn test_cod_survives_customer_notification_failure() {
    let h = harness(
        ScriptedGateway::new(CaptureStatus::Completed),
        RecordingNotifier::failing_for("a@x.com"),
    );

    let placed = h
        .orchestrator
        .place_cod_order(sample_payload())
        .await
        .unwrap();

    let recipients: Vec<Recipient> = h
        .notifier
        .attempted()
        .into_iter()
        .map(|(r, _)| r)
        .collect();
    assert_eq!(
        recipients,
        vec![
            Recipient::Customer("a@x.com".into()),
            Recipient::Operations(OPS_INBOX.into()),
        ]
    );
    assert_eq!(
        h.orchestrator
            .get_order(placed.order_id)
            .await
            .unwrap()
            .status,
        OrderStatus::Created
    );
}

#[tokio::test]
async fn test_cod_survives_operations_notification_failure() {
    let h = harness(
        ScriptedGateway::new(CaptureStatus::Completed),
        RecordingNotifier::failing_for(OPS_INBOX),
    );

    let result = h.orchestrator.place_cod_order(sample_payload()).await;
    assert!(result.is_ok());
    assert_eq!(h.notifier.attempted().len(), 2);
}

#[tokio::test]
async fn test_cod_hanging_notifier_is_bounded() {
    let h = harness(
        ScriptedGateway::new(CaptureStatus::Completed),
        RecordingNotifier::hanging_for("a@x.com"),
    );

    let started = Instant::now();
    let placed = h
        .orchestrator
        .place_cod_order(sample_payload())
        .await
        .unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(h.notifier.attempted().len(), 2);
    assert!(h.store.get(placed.order_id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_cod_rejects_invalid_payload_before_side_effects() {
    let h = harness(
        ScriptedGateway::new(CaptureStatus::Completed),
        RecordingNotifier::default(),
    );

    let mut payload = sample_payload();
    payload.customer.as_mut().unwrap().email = Some(String::new());

    let result = h.orchestrator.place_cod_order(payload).await;
    assert!(matches!(result, Err(OrderError::ValidationError(_))));
    assert!(h.store.is_empty().await);
    assert!(h.notifier.attempted().is_empty());
}

#[tokio::test]
async fn test_cod_uses_default_currency() {
    let h = harness(
        ScriptedGateway::new(CaptureStatus::Completed),
        RecordingNotifier::default(),
    );

    let placed = h
        .orchestrator
        .place_cod_order(sample_payload())
        .await
        .unwrap();
    let order = h.orchestrator.get_order(placed.order_id).await.unwrap();
    assert_eq!(order.currency, "USD");
}

#[tokio::test]
async fn test_cod_rejects_overflowing_line_total() {
    let h = harness(
        ScriptedGateway::new(CaptureStatus::Completed),
        RecordingNotifier::default(),
    );

    let payload: vaultorders::domain::order::OrderPayload = serde_json::from_value(serde_json::json!({
        "items": [{"productId": "p1", "name": "Shirt", "unitPrice": "79228162514264337593543950335", "quantity": 2}],
        "subtotal": 40, "tax": 2, "shipping": 5, "total": 47,
        "customer": {"name": "Ann", "email": "a@x.com"}
    }))
    .unwrap();

    let result = tokio::spawn({
        let orchestrator = h.orchestrator.clone();
        async move { orchestrator.place_cod_order(payload).await }
    })
    .await
    .unwrap();

    assert!(matches!(result, Err(OrderError::ValidationError(_))));
    assert!(h.store.is_empty().await);
    assert!(h.notifier.attempted().is_empty());
}
