use async_trait::async_trait;

/// Outbound SMS/USSD provider boundary. Adapters live outside the core
/// (logging gateway in the API service, recording gateways in tests).
#[async_trait]
pub trait MessageGateway: Send + Sync {
    async fn send(&self, recipient_phone: &str, message: &str)
        -> Result<DeliveryReceipt, DeliveryError>;
}

/// Provider acknowledgement for a delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub provider_ref: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("provider rejected message for {recipient}: {reason}")]
    Rejected { recipient: String, reason: String },
    #[error("delivery to {recipient} timed out after {waited_ms}ms")]
    Timeout { recipient: String, waited_ms: u64 },
    #[error("messaging transport unavailable: {0}")]
    Transport(String),
}
