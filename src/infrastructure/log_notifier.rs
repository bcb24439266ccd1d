use crate::domain::notification::{OrderConfirmation, Recipient};
use crate::domain::ports::Notifier;
use crate::error::Result;
use async_trait::async_trait;
use tracing::info;

/// Emits each confirmation as a structured log event instead of mailing it.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &OrderConfirmation, recipient: &Recipient) -> Result<()> {
        let params = serde_json::to_string(&message.addressed_to(recipient))?;
        info!(
            order_id = %message.order_id,
            recipient = %recipient,
            params = %params,
            "Order confirmation"
        );
        Ok(())
    }
}
