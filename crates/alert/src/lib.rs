pub mod error;
pub mod gate;
pub mod pipeline;

pub use error::AlertError;
pub use gate::should_alert;
pub use pipeline::AlertingPipeline;
