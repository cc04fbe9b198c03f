//! The login state machine.

use tracing::{debug, info, instrument};

use crate::error::{AuthError, Error, TransportError};
use crate::http::ServiceClient;
use crate::http::endpoints::{
    AUTHENTICATE, AuthenticationRequest, AuthenticationResponse, ProfileRef, REFRESH,
    RefreshRequest,
};
use crate::profile::{GameProfile, PropertyMap, UserType};

use super::{Agent, Capabilities};

/// An account's authentication state against the identity service.
///
/// The session moves between three states: logged out, logged in but not
/// verified against the service, and logged in with a selected profile and a
/// successful service exchange ([`can_play_online`](Self::can_play_online)).
/// One value represents one logical login; it is not designed for concurrent
/// mutation from multiple threads.
///
/// # Example
///
/// ```no_run
/// use yggdrasil_client::{AccountSession, Agent, Environment, ServiceClient};
///
/// # async fn example() -> Result<(), yggdrasil_client::Error> {
/// let client = ServiceClient::new(Environment::production(), "my-client-token");
/// let mut session = AccountSession::new(client, Agent::minecraft());
/// session.set_username("alice@example.com")?;
/// session.set_password("hunter2")?;
/// session.log_in().await?;
///
/// if let Some(profile) = session.selected_profile() {
///     println!("Playing as {profile}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct AccountSession {
    client: ServiceClient,
    agent: Agent,
    capabilities: Capabilities,
    username: Option<String>,
    password: Option<String>,
    user_id: Option<String>,
    user_type: Option<UserType>,
    user_properties: PropertyMap,
    access_token: Option<String>,
    profiles: Vec<GameProfile>,
    selected_profile: Option<GameProfile>,
    online: bool,
}

impl AccountSession {
    /// Create a logged-out session with the networked capability set.
    pub fn new(client: ServiceClient, agent: Agent) -> Self {
        Self::with_capabilities(client, agent, Capabilities::online())
    }

    /// Create a logged-out session with an explicit capability set.
    pub fn with_capabilities(client: ServiceClient, agent: Agent, capabilities: Capabilities) -> Self {
        Self {
            client,
            agent,
            capabilities,
            username: None,
            password: None,
            user_id: None,
            user_type: None,
            user_properties: PropertyMap::new(),
            access_token: None,
            profiles: Vec::new(),
            selected_profile: None,
            online: false,
        }
    }

    // ========================================================================
    // State queries
    // ========================================================================

    /// Whether this session holds a credential.
    ///
    /// For the networked provider this means a non-blank access token; for
    /// the offline provider it means a profile has been selected. Holding a
    /// credential does not imply it is still accepted by the service.
    pub fn is_logged_in(&self) -> bool {
        if self.capabilities.token_login {
            non_blank(&self.access_token)
        } else {
            self.selected_profile.is_some()
        }
    }

    /// Whether the session is fully playable online: logged in, a profile
    /// selected, and the last service exchange succeeded.
    pub fn can_play_online(&self) -> bool {
        self.is_logged_in() && self.selected_profile.is_some() && self.online
    }

    /// Whether a login attempt could be made right now.
    pub fn can_log_in(&self) -> bool {
        !self.can_play_online()
            && non_blank(&self.username)
            && (non_blank(&self.password)
                || (self.capabilities.token_login && non_blank(&self.access_token)))
    }

    /// Returns the username, if set.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns the user id. Defaults to the username for legacy accounts
    /// where the service never reported an explicit id.
    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Returns the bearer credential, if one is held.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Returns the account kind, defaulting to legacy while logged in and
    /// absent otherwise.
    pub fn user_type(&self) -> Option<UserType> {
        if self.is_logged_in() {
            Some(self.user_type.unwrap_or(UserType::Legacy))
        } else {
            None
        }
    }

    /// Returns an owned snapshot of the account-level properties. Empty
    /// while logged out.
    pub fn user_properties(&self) -> PropertyMap {
        if self.is_logged_in() {
            self.user_properties.clone()
        } else {
            PropertyMap::new()
        }
    }

    /// The profiles available to this account.
    pub fn available_profiles(&self) -> &[GameProfile] {
        &self.profiles
    }

    /// The currently selected profile, if any.
    pub fn selected_profile(&self) -> Option<&GameProfile> {
        self.selected_profile.as_ref()
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Set the username.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidState`] while logged in and playable
    /// online; changing the username would silently invalidate the session.
    pub fn set_username(&mut self, username: impl Into<String>) -> Result<(), Error> {
        if self.is_logged_in() && self.can_play_online() {
            return Err(Error::InvalidState(
                "cannot change username whilst logged in and online".to_string(),
            ));
        }

        self.username = Some(username.into());
        Ok(())
    }

    /// Set the password.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidState`] when a non-blank password is set
    /// while logged in and playable online.
    pub fn set_password(&mut self, password: impl Into<String>) -> Result<(), Error> {
        let password = password.into();

        if self.is_logged_in() && self.can_play_online() && !password.trim().is_empty() {
            return Err(Error::InvalidState(
                "cannot set password whilst logged in and online".to_string(),
            ));
        }

        self.password = Some(password);
        Ok(())
    }

    /// Log in, preferring a cached access token over the password.
    ///
    /// A failed attempt leaves the session logged out; no field is adopted
    /// from a response that fails validation.
    pub async fn log_in(&mut self) -> Result<(), Error> {
        if !non_blank(&self.username) {
            return Err(AuthError::InvalidCredentials {
                message: "Invalid username".to_string(),
            }
            .into());
        }

        if self.capabilities.token_login && non_blank(&self.access_token) {
            self.log_in_with_token().await
        } else if non_blank(&self.password) {
            self.log_in_with_password().await
        } else {
            Err(AuthError::InvalidCredentials {
                message: "Invalid password".to_string(),
            }
            .into())
        }
    }

    #[instrument(skip(self), fields(username = self.username.as_deref()))]
    async fn log_in_with_password(&mut self) -> Result<(), Error> {
        info!("Logging in with username and password");

        let request = AuthenticationRequest {
            agent: &self.agent,
            username: self.username.as_deref().unwrap_or_default(),
            password: self.password.as_deref().unwrap_or_default(),
            client_token: self.client.client_token(),
            request_user: true,
        };

        let response: AuthenticationResponse = self
            .client
            .post(self.client.env().auth_url(AUTHENTICATE), &request)
            .await?;

        self.adopt_response(response)?;
        debug!("Password login succeeded");
        Ok(())
    }

    #[instrument(skip(self), fields(username = self.username.as_deref()))]
    async fn log_in_with_token(&mut self) -> Result<(), Error> {
        if !non_blank(&self.user_id) {
            self.user_id = self.username.clone();
        }

        let Some(access_token) = self.access_token.as_deref().filter(|t| !t.trim().is_empty())
        else {
            return Err(AuthError::InvalidCredentials {
                message: "Invalid access token".to_string(),
            }
            .into());
        };

        info!("Logging in with access token");

        let request = RefreshRequest {
            access_token,
            client_token: self.client.client_token(),
            selected_profile: None,
            request_user: true,
        };

        let response: AuthenticationResponse = self
            .client
            .post(self.client.env().auth_url(REFRESH), &request)
            .await?;

        self.adopt_response(response)?;
        debug!("Token login succeeded");
        Ok(())
    }

    /// Select one of the available profiles, re-verifying with the service.
    ///
    /// Only legal once logged in, with no profile selected yet, and with the
    /// argument present in [`available_profiles`](Self::available_profiles).
    #[instrument(skip(self, profile), fields(profile = %profile))]
    pub async fn select_profile(&mut self, profile: &GameProfile) -> Result<(), Error> {
        if !self.capabilities.profile_reselection {
            return Err(Error::InvalidState(
                "game profiles cannot be changed by this provider".to_string(),
            ));
        }
        if !self.is_logged_in() {
            return Err(Error::InvalidState(
                "cannot select a game profile whilst not logged in".to_string(),
            ));
        }
        if self.selected_profile.is_some() {
            return Err(Error::InvalidState(
                "cannot change game profile; log out and back in".to_string(),
            ));
        }
        if self.profiles.is_empty() {
            return Err(Error::InvalidState(
                "no game profiles are available to select".to_string(),
            ));
        }
        if !self.profiles.contains(profile) {
            return Err(Error::InvalidArgument(format!("invalid profile '{profile}'")));
        }
        let Some(id) = profile.id() else {
            return Err(Error::InvalidArgument(format!(
                "profile '{profile}' has no id to select"
            )));
        };

        info!("Selecting game profile");

        let request = RefreshRequest {
            access_token: self.access_token.as_deref().unwrap_or_default(),
            client_token: self.client.client_token(),
            selected_profile: Some(ProfileRef {
                id,
                name: profile.name().map(str::to_string),
            }),
            request_user: false,
        };

        let response: AuthenticationResponse = self
            .client
            .post(self.client.env().auth_url(REFRESH), &request)
            .await?;

        self.check_client_token(&response)?;

        let selected = response
            .selected_profile
            .map(|p| p.into_profile())
            .transpose()
            .map_err(malformed_profile)?;

        self.online = true;
        self.access_token = Some(response.access_token);
        self.selected_profile = selected;
        debug!("Game profile selected");
        Ok(())
    }

    /// Clear every credential-bearing field. Idempotent.
    pub fn log_out(&mut self) {
        self.password = None;
        self.user_id = None;
        self.user_type = None;
        self.user_properties.clear();
        self.access_token = None;
        self.profiles.clear();
        self.selected_profile = None;
        self.online = false;
    }

    // ========================================================================
    // Response adoption
    // ========================================================================

    fn check_client_token(&self, response: &AuthenticationResponse) -> Result<(), Error> {
        // A server-assigned client token would mean every later request
        // carries a token the server no longer recognizes.
        if response.client_token != self.client.client_token() {
            return Err(AuthError::ClientTokenMismatch.into());
        }
        Ok(())
    }

    fn adopt_response(&mut self, response: AuthenticationResponse) -> Result<(), Error> {
        self.check_client_token(&response)?;

        let selected = response
            .selected_profile
            .map(|p| p.into_profile())
            .transpose()
            .map_err(malformed_profile)?;
        let available = response
            .available_profiles
            .into_iter()
            .map(|p| p.into_profile())
            .collect::<Result<Vec<_>, _>>()
            .map_err(malformed_profile)?;

        let type_source = selected.as_ref().or_else(|| available.first());
        if let Some(profile) = type_source {
            self.user_type = Some(if profile.is_legacy() {
                UserType::Legacy
            } else {
                UserType::Mojang
            });
        }

        self.user_id = response
            .user
            .as_ref()
            .and_then(|u| u.id.clone())
            .or_else(|| self.username.clone());

        self.online = true;
        self.access_token = Some(response.access_token);
        self.profiles = available;
        self.selected_profile = selected;

        self.user_properties.clear();
        if let Some(user) = response.user {
            self.user_properties.extend(user.properties);
        }

        Ok(())
    }

    pub(super) fn set_stored_state(
        &mut self,
        username: String,
        user_id: Option<String>,
        user_properties: PropertyMap,
        selected_profile: Option<GameProfile>,
        access_token: Option<String>,
    ) {
        self.username = Some(username);
        self.user_id = user_id.or_else(|| self.username.clone());
        self.user_properties = user_properties;
        self.selected_profile = selected_profile;
        self.access_token = access_token.filter(|t| !t.trim().is_empty());
    }
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn malformed_profile(_: Error) -> Error {
    TransportError::MalformedResponse {
        message: "response profile carries neither id nor name".to_string(),
    }
    .into()
}

// Custom Debug impl that hides credentials
impl std::fmt::Debug for AccountSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSession")
            .field("username", &self.username)
            .field("user_id", &self.user_id)
            .field("password", &"[REDACTED]")
            .field("access_token", &"[REDACTED]")
            .field("selected_profile", &self.selected_profile)
            .field("online", &self.online)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Environment;

    fn offline_session() -> AccountSession {
        let client = ServiceClient::new(Environment::production(), "token");
        AccountSession::with_capabilities(client, Agent::minecraft(), Capabilities::offline())
    }

    fn online_session() -> AccountSession {
        let client = ServiceClient::new(Environment::production(), "token");
        AccountSession::new(client, Agent::minecraft())
    }

    #[test]
    fn fresh_session_is_logged_out() {
        let session = online_session();
        assert!(!session.is_logged_in());
        assert!(!session.can_play_online());
        assert!(!session.can_log_in());
        assert!(session.user_type().is_none());
    }

    #[test]
    fn can_log_in_needs_username_and_secret() {
        let mut session = online_session();
        session.set_username("alice").unwrap();
        assert!(!session.can_log_in());
        session.set_password("hunter2").unwrap();
        assert!(session.can_log_in());
    }

    #[test]
    fn offline_provider_counts_selection_as_login() {
        let mut session = offline_session();
        assert!(!session.is_logged_in());
        session.selected_profile =
            Some(GameProfile::new(None, Some("Steve".to_string())).unwrap());
        assert!(session.is_logged_in());
    }

    #[tokio::test]
    async fn select_profile_requires_login() {
        let mut session = online_session();
        let profile = GameProfile::new(None, Some("Steve".to_string())).unwrap();
        let result = session.select_profile(&profile).await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn offline_provider_rejects_reselection() {
        let mut session = offline_session();
        let profile = GameProfile::new(None, Some("Steve".to_string())).unwrap();
        let result = session.select_profile(&profile).await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn blank_credentials_are_rejected_before_any_request() {
        let mut session = online_session();
        assert!(matches!(
            session.log_in().await,
            Err(Error::Auth(AuthError::InvalidCredentials { .. }))
        ));

        session.set_username("alice").unwrap();
        assert!(matches!(
            session.log_in().await,
            Err(Error::Auth(AuthError::InvalidCredentials { .. }))
        ));
    }

    #[test]
    fn log_out_is_idempotent() {
        let mut session = online_session();
        session.access_token = Some("token".to_string());
        session.online = true;
        session.log_out();
        session.log_out();
        assert!(!session.is_logged_in());
        assert!(session.access_token().is_none());
        assert!(session.available_profiles().is_empty());
    }

    #[test]
    fn debug_never_prints_secrets() {
        let mut session = online_session();
        session.set_password("super-secret").unwrap();
        session.access_token = Some("very-secret-token".to_string());
        let debug = format!("{session:?}");
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("very-secret-token"));
    }
}
