//! Endpoint definitions and wire request/response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::Agent;
use crate::error::{AuthError, Error};
use crate::profile::{GameProfile, PropertyMap};
use crate::types::uuid_compact;

// ============================================================================
// Endpoint Names
// ============================================================================

/// Authentication server: password login.
pub const AUTHENTICATE: &str = "authenticate";

/// Authentication server: token refresh (also used for profile selection).
pub const REFRESH: &str = "refresh";

/// Session server: client-side half of the join handshake.
pub const JOIN: &str = "join";

/// Session server: server-side join confirmation.
pub const HAS_JOINED: &str = "hasJoined";

/// Session server: per-id profile lookup. The profile id is appended in its
/// compact form: `profile/{id}`.
pub const PROFILE: &str = "profile";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for the authenticate endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationRequest<'a> {
    pub agent: &'a Agent,
    pub username: &'a str,
    pub password: &'a str,
    pub client_token: &'a str,
    pub request_user: bool,
}

/// Request body for the refresh endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub access_token: &'a str,
    pub client_token: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_profile: Option<ProfileRef>,
    pub request_user: bool,
}

/// Id-only profile reference used when re-selecting a profile.
#[derive(Debug, Serialize)]
pub struct ProfileRef {
    #[serde(with = "uuid_compact")]
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Response from the authenticate and refresh endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    pub access_token: String,
    pub client_token: String,
    #[serde(default)]
    pub selected_profile: Option<ProfileInfo>,
    #[serde(default)]
    pub available_profiles: Vec<ProfileInfo>,
    #[serde(default)]
    pub user: Option<UserInfo>,
}

/// A profile as it appears in authentication responses.
#[derive(Debug, Deserialize)]
pub struct ProfileInfo {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub legacy: bool,
}

impl ProfileInfo {
    /// Convert the wire profile into a [`GameProfile`].
    pub fn into_profile(self) -> Result<GameProfile, Error> {
        let mut profile = GameProfile::new(self.id, self.name)?;
        profile.set_legacy(self.legacy);
        Ok(profile)
    }
}

/// Account-level user record in authentication responses.
#[derive(Debug, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Request body for the join endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest<'a> {
    pub access_token: &'a str,
    #[serde(with = "uuid_compact")]
    pub selected_profile: Uuid,
    pub server_id: &'a str,
}

/// Response from the hasJoined endpoint.
#[derive(Debug, Deserialize)]
pub struct HasJoinedResponse {
    pub id: Uuid,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// Response from the profile lookup endpoint.
#[derive(Debug, Deserialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub properties: PropertyMap,
}

/// The service's error envelope. Any endpoint may answer with this instead
/// of its success shape.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub cause: Option<String>,
}

impl ErrorEnvelope {
    /// The error name, when the envelope actually reports one.
    pub fn error_name(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.trim().is_empty())
    }

    /// Map a reported error to the library taxonomy.
    ///
    /// The wire constants are the original service's exception class names.
    pub fn into_error(self) -> Error {
        let message = self
            .error_message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_default();

        if self.cause.as_deref() == Some("UserMigratedException") {
            return AuthError::UserMigrated { message }.into();
        }

        match self.error.as_deref() {
            Some("ForbiddenOperationException") => AuthError::InvalidCredentials { message }.into(),
            _ => AuthError::Service { message }.into(),
        }
    }
}
