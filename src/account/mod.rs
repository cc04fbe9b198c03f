//! Account authentication: the login state machine and its storage snapshot.

mod session;
mod storage;

pub use session::AccountSession;
pub use storage::{StoredCredentials, StoredProperty};

use serde::Serialize;

/// The game agent identifying the client to the authentication server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Agent {
    pub name: String,
    pub version: u32,
}

impl Agent {
    /// Create an agent with an explicit name and version.
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// The Minecraft game agent.
    pub fn minecraft() -> Self {
        Self::new("Minecraft", 1)
    }
}

/// What a session provider supports.
///
/// The networked provider logs in with a token or password and can re-select
/// a profile; the legacy/offline provider can do neither, and "logged in"
/// means a profile has been selected rather than a token being held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Cached access tokens can be used to log in, and "logged in" is
    /// defined by holding a non-blank token.
    pub token_login: bool,
    /// A profile can be selected after login.
    pub profile_reselection: bool,
}

impl Capabilities {
    /// The networked provider's capability set.
    pub fn online() -> Self {
        Self {
            token_login: true,
            profile_reselection: true,
        }
    }

    /// The legacy/offline provider's capability set.
    pub fn offline() -> Self {
        Self {
            token_login: false,
            profile_reselection: false,
        }
    }
}
