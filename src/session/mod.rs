//! The server-join handshake and profile enrichment.
//!
//! [`SessionService`] talks to the session server: it performs the client
//! half of the join handshake, confirms joins on behalf of game servers,
//! and fills profiles with their signed property payloads. Profile lookups
//! go through a single-flight TTL cache; only `require_secure` lookups
//! bypass it, since a cached snapshot may predate the caller's freshness
//! requirement.

mod cache;

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures_util::FutureExt;
use tracing::{debug, error, instrument, warn};

use crate::error::{Error, InsecureTextureError};
use crate::http::endpoints::{
    HAS_JOINED, HasJoinedResponse, JOIN, JoinRequest, PROFILE, ProfileResponse,
};
use crate::http::ServiceClient;
use crate::profile::GameProfile;
use crate::textures::{ProfileSignatureKey, ProfileTexture, TextureKind, TexturesPayload};
use crate::types::uuid_compact;

use cache::{ProfileCache, ProfileKey};

/// Client for the session server.
pub struct SessionService {
    client: ServiceClient,
    signature_key: ProfileSignatureKey,
    cache: ProfileCache,
}

impl SessionService {
    /// Create a session service.
    ///
    /// `signature_key` is the service's texture-signing public key; it is
    /// only consulted when a caller demands verified textures.
    pub fn new(client: ServiceClient, signature_key: ProfileSignatureKey) -> Self {
        Self {
            client,
            signature_key,
            cache: ProfileCache::new(),
        }
    }

    /// Announce to the session server that this client is joining
    /// `server_id` (the client half of the join handshake).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] when the profile has no id,
    /// [`Error::Auth`] when the service rejects the token, and
    /// [`Error::Unavailable`] on transport failure.
    #[instrument(skip(self, access_token), fields(profile = %profile))]
    pub async fn join_server(
        &self,
        profile: &GameProfile,
        access_token: &str,
        server_id: &str,
    ) -> Result<(), Error> {
        let Some(id) = profile.id() else {
            return Err(Error::InvalidArgument(
                "cannot join a server without a profile id".to_string(),
            ));
        };

        let request = JoinRequest {
            access_token,
            selected_profile: id,
            server_id,
        };
        self.client
            .post_no_content(self.client.env().session_url(JOIN), &request)
            .await
    }

    /// Ask the session server whether `profile` has announced a join for
    /// `server_id` (the server half of the handshake).
    ///
    /// A confirmed join yields a fresh profile built from the service's
    /// authoritative id, the queried name, and the returned properties.
    /// `Ok(None)` means the service answered but reported no match; only
    /// transport failures surface as errors, so callers can distinguish
    /// "denied" from "could not ask".
    #[instrument(skip(self), fields(profile = %profile))]
    pub async fn has_joined_server(
        &self,
        profile: &GameProfile,
        server_id: &str,
    ) -> Result<Option<GameProfile>, Error> {
        let Some(name) = profile.name() else {
            return Err(Error::InvalidArgument(
                "cannot confirm a join without a profile name".to_string(),
            ));
        };

        let url = self.client.env().session_url(HAS_JOINED);
        let result: Result<Option<HasJoinedResponse>, Error> = self
            .client
            .get(url, &[("username", name), ("serverId", server_id)])
            .await;

        match result {
            Ok(Some(response)) => {
                let mut confirmed = GameProfile::complete(response.id, name);
                confirmed.properties_mut().extend(response.properties);
                Ok(Some(confirmed))
            }
            Ok(None) => Ok(None),
            // The service reports "no such session" as an application error.
            Err(Error::Auth(err)) => {
                debug!(error = %err, "join not confirmed");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Fill a profile with its properties from the session server.
    ///
    /// Infallible by design: a profile without an id, a missing profile, or
    /// any lookup failure returns the input unchanged, so callers can always
    /// render *something*. Lookups are cached for six hours and deduplicated
    /// across concurrent callers; `require_secure` skips the cache and asks
    /// for a signed payload.
    #[instrument(skip(self), fields(profile = %profile))]
    pub async fn fill_profile(&self, profile: GameProfile, require_secure: bool) -> GameProfile {
        if profile.id().is_none() {
            debug!("profile has no id, nothing to fill");
            return profile;
        }

        let fetched = if require_secure {
            fetch_profile(self.client.clone(), profile.clone(), true).await
        } else {
            let key = ProfileKey::of(&profile);
            let client = self.client.clone();
            let lookup = profile.clone();
            self.cache
                .get_or_fetch(key, move || fetch_profile(client, lookup, false).boxed())
                .await
        };

        fetched.unwrap_or(profile)
    }

    /// Decode the texture payload carried in a profile's `"textures"`
    /// property.
    ///
    /// A profile without the property yields an empty map, as does a payload
    /// that fails to decode (logged, not surfaced); texture data is cosmetic
    /// and a bad payload should not break the caller. With `require_secure`
    /// the property's signature is checked first and failures are hard
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsecureTexture`] when `require_secure` is set and
    /// the property is unsigned or fails verification.
    pub fn textures(
        &self,
        profile: &GameProfile,
        require_secure: bool,
    ) -> Result<HashMap<TextureKind, ProfileTexture>, Error> {
        let Some(property) = profile.properties().first("textures") else {
            return Ok(HashMap::new());
        };

        if require_secure {
            let Some(signature) = property.signature() else {
                error!(profile = %profile, "texture payload is unsigned");
                return Err(InsecureTextureError::MissingSignature.into());
            };
            if !self.signature_key.verify(property.value(), signature) {
                error!(profile = %profile, "texture payload failed signature verification");
                return Err(InsecureTextureError::InvalidSignature.into());
            }
        }

        let decoded = match BASE64.decode(property.value()) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(profile = %profile, error = %err, "texture payload is not valid base64");
                return Ok(HashMap::new());
            }
        };

        match serde_json::from_slice::<TexturesPayload>(&decoded) {
            Ok(payload) => Ok(payload.textures),
            Err(err) => {
                warn!(profile = %profile, error = %err, "texture payload is not valid JSON");
                Ok(HashMap::new())
            }
        }
    }
}

/// One profile lookup against the session server.
///
/// Soft-fails to `None`: a missing profile, an application error, and a
/// transport failure all look the same to [`SessionService::fill_profile`],
/// which falls back to the unfilled input.
async fn fetch_profile(
    client: ServiceClient,
    profile: GameProfile,
    require_secure: bool,
) -> Option<GameProfile> {
    let id = profile.id()?;
    let endpoint = format!("{PROFILE}/{}", uuid_compact::format(&id));
    let url = client.env().session_url(&endpoint);
    let unsigned = (!require_secure).to_string();

    match client
        .get::<_, ProfileResponse>(url, &[("unsigned", unsigned.as_str())])
        .await
    {
        Ok(Some(response)) => {
            let mut enriched = GameProfile::complete(response.id, response.name);
            enriched.properties_mut().extend(response.properties);
            debug!(profile = %enriched, "filled profile from session server");
            Some(enriched)
        }
        Ok(None) => {
            debug!(profile = %profile, "profile does not exist");
            None
        }
        Err(err) => {
            warn!(profile = %profile, error = %err, "could not look up profile");
            None
        }
    }
}
