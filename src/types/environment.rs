//! Identity-service environment: the pair of base URLs a client talks to.

use super::ServiceUrl;
use crate::error::Error;

/// The pair of base URLs for one identity-service deployment.
///
/// The authentication server handles login and token refresh; the session
/// server handles the server-join handshake and profile lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    auth: ServiceUrl,
    session: ServiceUrl,
}

impl Environment {
    /// Create an environment from explicit base URLs.
    pub fn new(auth: ServiceUrl, session: ServiceUrl) -> Self {
        Self { auth, session }
    }

    /// The production Mojang deployment.
    pub fn production() -> Self {
        // These literals are validated by the ServiceUrl tests below.
        Self {
            auth: ServiceUrl::new("https://authserver.mojang.com")
                .expect("production auth URL is valid"),
            session: ServiceUrl::new("https://sessionserver.mojang.com/session/minecraft")
                .expect("production session URL is valid"),
        }
    }

    /// Create an environment where both servers share one base URL.
    ///
    /// Useful for tests and single-host private deployments.
    pub fn single_host(base: impl AsRef<str>) -> Result<Self, Error> {
        let url = ServiceUrl::new(base)?;
        Ok(Self {
            auth: url.clone(),
            session: url,
        })
    }

    /// Returns the authentication server base URL.
    pub fn auth(&self) -> &ServiceUrl {
        &self.auth
    }

    /// Returns the session server base URL.
    pub fn session(&self) -> &ServiceUrl {
        &self.session
    }

    /// Returns the URL for a named authentication endpoint.
    pub fn auth_url(&self, endpoint: &str) -> String {
        self.auth.endpoint_url(endpoint)
    }

    /// Returns the URL for a named session endpoint.
    pub fn session_url(&self, endpoint: &str) -> String {
        self.session.endpoint_url(endpoint)
    }
}
