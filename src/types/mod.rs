//! Validated value types shared across the library.

mod environment;
mod service_url;
pub mod uuid_compact;

pub use environment::Environment;
pub use service_url::ServiceUrl;
