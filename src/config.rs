use std::time::Duration;

/// Settings the orchestrator needs at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfig {
    /// ISO 4217 code applied when a payload names no currency.
    pub default_currency: String,
    /// Operations mailbox that receives a copy of every confirmation.
    pub operations_inbox: String,
    /// Shown to the customer on the gateway approval page.
    pub brand_name: String,
    /// Upper bound on a single notification send.
    pub notify_timeout: Duration,
    /// Send confirmations after a successful capture as well as for COD.
    pub notify_on_payment: bool,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            default_currency: "USD".to_string(),
            operations_inbox: "orders@vintagevault.test".to_string(),
            brand_name: "VintageVault".to_string(),
            notify_timeout: Duration::from_secs(10),
            notify_on_payment: true,
        }
    }
}
