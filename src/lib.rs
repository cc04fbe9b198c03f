//! yggdrasil-client - Minecraft Identity Service Client Library
//!
//! This library implements the client side of the Yggdrasil identity
//! protocol: password and token login through an [`AccountSession`], the
//! server-join handshake and profile enrichment through a
//! [`SessionService`], and verification of the signed texture payloads
//! profiles carry.
//!
//! # Example
//!
//! ```no_run
//! use yggdrasil_client::{AccountSession, Agent, Environment, ServiceClient};
//!
//! # async fn example() -> Result<(), yggdrasil_client::Error> {
//! let client = ServiceClient::new(Environment::production(), "my-client-token");
//! let mut session = AccountSession::new(client, Agent::minecraft());
//!
//! session.set_username("alice@example.com")?;
//! session.set_password("hunter2")?;
//! session.log_in().await?;
//!
//! if let Some(profile) = session.selected_profile() {
//!     println!("logged in as {profile}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod error;
pub mod http;
pub mod profile;
pub mod session;
pub mod textures;
pub mod types;

// Re-export primary types at crate root for convenience
pub use account::{AccountSession, Agent, Capabilities, StoredCredentials, StoredProperty};
pub use error::Error;
pub use http::ServiceClient;
pub use profile::{GameProfile, Property, PropertyMap, UserType};
pub use session::SessionService;
pub use textures::{ProfileSignatureKey, ProfileTexture, TextureKind, TexturesPayload};
pub use types::{Environment, ServiceUrl};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
