pub mod delivery;
pub mod error;

pub use delivery::WebhookDelivery;
pub use error::WebhookError;
