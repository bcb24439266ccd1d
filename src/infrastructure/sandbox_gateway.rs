use crate::domain::payment::{
    CaptureOutcome, CaptureStatus, CreatedIntent, GatewayReference, IntentRequest,
};
use crate::domain::ports::PaymentGateway;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

pub const REFERENCE_PREFIX: &str = "SBX-";

/// A local stand-in for the payment gateway.
///
/// Performs the same amount reconciliation a real gateway does on intent
/// creation and answers every capture with a configured status. The first
/// capture of a reference is remembered and replayed for later captures.
#[derive(Clone)]
pub struct SandboxGateway {
    approval_base_url: String,
    capture_status: CaptureStatus,
    captures: Arc<RwLock<HashMap<GatewayReference, CaptureStatus>>>,
}

impl SandboxGateway {
    pub fn new(approval_base_url: impl Into<String>, capture_status: CaptureStatus) -> Self {
        Self {
            approval_base_url: approval_base_url.into(),
            capture_status,
            captures: Arc::default(),
        }
    }
}

impl Default for SandboxGateway {
    fn default() -> Self {
        Self::new("https://sandbox.gateway.test", CaptureStatus::Completed)
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_intent(&self, request: &IntentRequest) -> Result<CreatedIntent> {
        let amount: Decimal = request
            .amount
            .parse()
            .map_err(|_| OrderError::gateway(format!("malformed amount {:?}", request.amount)))?;
        let itemized = request
            .breakdown
            .reconciled_total()
            .ok_or_else(|| OrderError::gateway("malformed amount breakdown"))?;
        if itemized != amount {
            return Err(OrderError::gateway(format!(
                "AMOUNT_MISMATCH: breakdown sums to {} but amount is {}",
                itemized, amount
            )));
        }

        let reference = GatewayReference::new(format!(
            "{}{}",
            REFERENCE_PREFIX,
            Uuid::new_v4().simple().to_string().to_uppercase()
        ));
        debug!(reference = %reference, amount = %request.amount, currency = %request.currency, "Sandbox intent created");
        Ok(CreatedIntent {
            approval_url: format!(
                "{}/checkoutnow?token={}",
                self.approval_base_url.trim_end_matches('/'),
                reference
            ),
            reference,
        })
    }

    async fn capture_intent(&self, reference: &GatewayReference) -> Result<CaptureOutcome> {
        if !reference.as_str().starts_with(REFERENCE_PREFIX) {
            return Err(OrderError::gateway(format!(
                "RESOURCE_NOT_FOUND: unknown intent {}",
                reference
            )));
        }

        let mut captures = self.captures.write().await;
        let status = *captures
            .entry(reference.clone())
            .or_insert(self.capture_status);
        Ok(CaptureOutcome {
            status,
            raw: serde_json::json!({ "id": reference.as_str(), "status": status }),
        })
    }
}
