//! HTTP exchange layer: the typed client and the wire types it carries.

mod client;
pub mod endpoints;

pub use client::ServiceClient;
