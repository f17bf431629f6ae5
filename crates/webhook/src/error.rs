use thiserror::Error;

/// Errors raised while preparing a webhook request. Network failures and
/// non-2xx responses are not represented here: [`crate::delivery`] absorbs
/// those into a [`driftwatch_core::DeliveryResult`] instead of surfacing
/// them as an error, since a failed delivery is logged, not propagated.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("HMAC signing error: {0}")]
    SigningError(String),
}
