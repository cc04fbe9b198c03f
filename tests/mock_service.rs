//! Mock identity-service tests for the yggdrasil-client library.
//!
//! These tests use wiremock to simulate the authentication and session
//! servers and test the library's behavior without requiring network access
//! or real credentials.

use std::sync::OnceLock;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use rsa::pkcs8::EncodePublicKey;
use serde_json::json;
use sha1::{Digest, Sha1};
use uuid::Uuid;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use yggdrasil_client::error::{AuthError, InsecureTextureError};
use yggdrasil_client::{
    AccountSession, Agent, Environment, Error, GameProfile, ProfileSignatureKey, Property,
    ServiceClient, SessionService, StoredCredentials, TextureKind,
};

const NOTCH_UUID: &str = "069a79f4-44e9-4726-a5be-fca90e38aaf5";
const NOTCH_COMPACT: &str = "069a79f444e94726a5befca90e38aaf5";

fn notch_id() -> Uuid {
    NOTCH_UUID.parse().unwrap()
}

/// Helper to point both servers at a mock server.
fn mock_client(server: &MockServer) -> ServiceClient {
    let env =
        Environment::single_host(format!("http://127.0.0.1:{}", server.address().port())).unwrap();
    ServiceClient::new(env, "client-token")
}

fn key_pair() -> &'static (RsaPrivateKey, ProfileSignatureKey) {
    static PAIR: OnceLock<(RsaPrivateKey, ProfileSignatureKey)> = OnceLock::new();
    PAIR.get_or_init(|| {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("key generation");
        let der = private
            .to_public_key()
            .to_public_key_der()
            .expect("public key encoding");
        let key = ProfileSignatureKey::from_der(der.as_bytes()).expect("key load");
        (private, key)
    })
}

fn session_service(server: &MockServer) -> SessionService {
    SessionService::new(mock_client(server), key_pair().1.clone())
}

// ============================================================================
// Login Tests
// ============================================================================

#[tokio::test]
async fn password_login_adopts_account_state() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/authenticate"))
        .and(body_json(json!({
            "agent": {"name": "Minecraft", "version": 1},
            "username": "alice@example.com",
            "password": "hunter2",
            "clientToken": "client-token",
            "requestUser": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "access-token-1",
            "clientToken": "client-token",
            "selectedProfile": {"id": NOTCH_COMPACT, "name": "Notch"},
            "availableProfiles": [{"id": NOTCH_COMPACT, "name": "Notch"}],
            "user": {
                "id": "user-id-1",
                "properties": [{"name": "preferredLanguage", "value": "en"}]
            }
        })))
        .mount(&server)
        .await;

    let mut session = AccountSession::new(mock_client(&server), Agent::minecraft());
    session.set_username("alice@example.com").unwrap();
    session.set_password("hunter2").unwrap();
    session.log_in().await.unwrap();

    assert!(session.is_logged_in());
    assert!(session.can_play_online());
    assert_eq!(session.access_token(), Some("access-token-1"));
    assert_eq!(session.user_id(), Some("user-id-1"));
    assert_eq!(
        session.user_type(),
        Some(yggdrasil_client::UserType::Mojang)
    );

    let profile = session.selected_profile().unwrap();
    assert_eq!(profile.id(), Some(notch_id()));
    assert_eq!(profile.name(), Some("Notch"));

    let languages: Vec<_> = session
        .user_properties()
        .get("preferredLanguage")
        .map(|p| p.value().to_string())
        .collect();
    assert_eq!(languages, ["en"]);
}

#[tokio::test]
async fn legacy_profile_sets_legacy_user_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "access-token-1",
            "clientToken": "client-token",
            "selectedProfile": {"id": NOTCH_COMPACT, "name": "Notch", "legacy": true}
        })))
        .mount(&server)
        .await;

    let mut session = AccountSession::new(mock_client(&server), Agent::minecraft());
    session.set_username("alice@example.com").unwrap();
    session.set_password("hunter2").unwrap();
    session.log_in().await.unwrap();

    assert_eq!(
        session.user_type(),
        Some(yggdrasil_client::UserType::Legacy)
    );
    // No explicit user record: the user id falls back to the username.
    assert_eq!(session.user_id(), Some("alice@example.com"));
}

#[tokio::test]
async fn client_token_reassignment_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "access-token-1",
            "clientToken": "some-other-token",
            "selectedProfile": {"id": NOTCH_COMPACT, "name": "Notch"}
        })))
        .mount(&server)
        .await;

    let mut session = AccountSession::new(mock_client(&server), Agent::minecraft());
    session.set_username("alice@example.com").unwrap();
    session.set_password("hunter2").unwrap();

    let result = session.log_in().await;
    assert!(matches!(
        result,
        Err(Error::Auth(AuthError::ClientTokenMismatch))
    ));
    // Nothing from the rejected response may stick.
    assert!(!session.is_logged_in());
    assert!(session.selected_profile().is_none());
}

#[tokio::test]
async fn forbidden_operation_maps_to_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/authenticate"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "ForbiddenOperationException",
            "errorMessage": "Invalid credentials. Invalid username or password."
        })))
        .mount(&server)
        .await;

    let mut session = AccountSession::new(mock_client(&server), Agent::minecraft());
    session.set_username("alice@example.com").unwrap();
    session.set_password("wrong").unwrap();

    let result = session.log_in().await;
    assert!(matches!(
        result,
        Err(Error::Auth(AuthError::InvalidCredentials { .. }))
    ));
    assert!(!session.is_logged_in());
}

#[tokio::test]
async fn migrated_account_is_reported_distinctly() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/authenticate"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "ForbiddenOperationException",
            "errorMessage": "Invalid credentials.",
            "cause": "UserMigratedException"
        })))
        .mount(&server)
        .await;

    let mut session = AccountSession::new(mock_client(&server), Agent::minecraft());
    session.set_username("old-username").unwrap();
    session.set_password("hunter2").unwrap();

    let result = session.log_in().await;
    assert!(matches!(
        result,
        Err(Error::Auth(AuthError::UserMigrated { .. }))
    ));
}

#[tokio::test]
async fn token_login_goes_through_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/refresh"))
        .and(body_json(json!({
            "accessToken": "cached-token",
            "clientToken": "client-token",
            "requestUser": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "fresh-token",
            "clientToken": "client-token",
            "selectedProfile": {"id": NOTCH_COMPACT, "name": "Notch"}
        })))
        .mount(&server)
        .await;

    let mut session = AccountSession::new(mock_client(&server), Agent::minecraft());
    session
        .load_from_storage(&StoredCredentials {
            username: Some("alice@example.com".to_string()),
            access_token: Some("cached-token".to_string()),
            ..StoredCredentials::default()
        })
        .unwrap();
    assert!(session.is_logged_in());
    assert!(!session.can_play_online());

    session.log_in().await.unwrap();

    assert!(session.can_play_online());
    assert_eq!(session.access_token(), Some("fresh-token"));
}

// ============================================================================
// Profile Selection Tests
// ============================================================================

#[tokio::test]
async fn profile_selection_reverifies_with_the_service() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "token-1",
            "clientToken": "client-token",
            "availableProfiles": [
                {"id": NOTCH_COMPACT, "name": "Notch"},
                {"id": "11111111222233334444555555555555", "name": "jeb_"}
            ]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/refresh"))
        .and(body_json(json!({
            "accessToken": "token-1",
            "clientToken": "client-token",
            "selectedProfile": {"id": NOTCH_COMPACT, "name": "Notch"},
            "requestUser": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "token-2",
            "clientToken": "client-token",
            "selectedProfile": {"id": NOTCH_COMPACT, "name": "Notch"}
        })))
        .mount(&server)
        .await;

    let mut session = AccountSession::new(mock_client(&server), Agent::minecraft());
    session.set_username("alice@example.com").unwrap();
    session.set_password("hunter2").unwrap();
    session.log_in().await.unwrap();

    assert!(session.is_logged_in());
    assert!(!session.can_play_online());
    assert_eq!(session.available_profiles().len(), 2);

    let choice = session.available_profiles()[0].clone();
    session.select_profile(&choice).await.unwrap();

    assert!(session.can_play_online());
    assert_eq!(session.access_token(), Some("token-2"));
    assert_eq!(session.selected_profile().unwrap().name(), Some("Notch"));
}

#[tokio::test]
async fn selecting_an_unavailable_profile_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": "token-1",
            "clientToken": "client-token",
            "availableProfiles": [{"id": NOTCH_COMPACT, "name": "Notch"}]
        })))
        .mount(&server)
        .await;

    let mut session = AccountSession::new(mock_client(&server), Agent::minecraft());
    session.set_username("alice@example.com").unwrap();
    session.set_password("hunter2").unwrap();
    session.log_in().await.unwrap();

    let stranger = GameProfile::complete(
        "11111111-2222-3333-4444-555555555555".parse().unwrap(),
        "Herobrine",
    );
    let result = session.select_profile(&stranger).await;
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

// ============================================================================
// Join Handshake Tests
// ============================================================================

#[tokio::test]
async fn join_server_posts_the_compact_profile_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/join"))
        .and(body_json(json!({
            "accessToken": "access-token-1",
            "selectedProfile": NOTCH_COMPACT,
            "serverId": "server-hash"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let service = session_service(&server);
    let profile = GameProfile::complete(notch_id(), "Notch");
    service
        .join_server(&profile, "access-token-1", "server-hash")
        .await
        .unwrap();
}

#[tokio::test]
async fn join_server_needs_a_profile_id() {
    let server = MockServer::start().await;
    let service = session_service(&server);

    let name_only = GameProfile::new(None, Some("Notch".to_string())).unwrap();
    let result = service
        .join_server(&name_only, "token", "server-hash")
        .await;
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[tokio::test]
async fn has_joined_builds_a_fresh_confirmed_profile() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hasJoined"))
        .and(query_param("username", "Notch"))
        .and(query_param("serverId", "server-hash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": NOTCH_COMPACT,
            "properties": [
                {"name": "textures", "value": "payload", "signature": "sig"}
            ]
        })))
        .mount(&server)
        .await;

    let service = session_service(&server);
    // Game servers only know the name the client announced.
    let claimed = GameProfile::new(None, Some("Notch".to_string())).unwrap();

    let confirmed = service
        .has_joined_server(&claimed, "server-hash")
        .await
        .unwrap()
        .expect("join should be confirmed");

    assert_eq!(confirmed.id(), Some(notch_id()));
    assert_eq!(confirmed.name(), Some("Notch"));
    assert_eq!(
        confirmed.properties().first("textures").unwrap().signature(),
        Some("sig")
    );
}

#[tokio::test]
async fn has_joined_reports_no_match_as_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hasJoined"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": "ForbiddenOperationException",
            "errorMessage": "Invalid token"
        })))
        .mount(&server)
        .await;

    let service = session_service(&server);
    let claimed = GameProfile::new(None, Some("Notch".to_string())).unwrap();

    let confirmed = service
        .has_joined_server(&claimed, "server-hash")
        .await
        .unwrap();
    assert!(confirmed.is_none());
}

// ============================================================================
// Profile Fill Tests
// ============================================================================

fn profile_response() -> serde_json::Value {
    json!({
        "id": NOTCH_COMPACT,
        "name": "Notch",
        "properties": [{"name": "textures", "value": "payload"}]
    })
}

#[tokio::test]
async fn fill_profile_merges_properties_and_caches() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/profile/{NOTCH_COMPACT}")))
        .and(query_param("unsigned", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_response()))
        .expect(1)
        .mount(&server)
        .await;

    let service = session_service(&server);
    let bare = GameProfile::complete(notch_id(), "Notch");

    let filled = service.fill_profile(bare.clone(), false).await;
    assert!(filled.properties().first("textures").is_some());

    // Second lookup is served from the cache; the mock enforces one request.
    let again = service.fill_profile(bare, false).await;
    assert!(again.properties().first("textures").is_some());
}

#[tokio::test]
async fn concurrent_fills_share_one_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/profile/{NOTCH_COMPACT}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(profile_response())
                .set_delay(Duration::from_millis(50)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let service = session_service(&server);
    let bare = GameProfile::complete(notch_id(), "Notch");

    let (a, b) = tokio::join!(
        service.fill_profile(bare.clone(), false),
        service.fill_profile(bare.clone(), false),
    );
    assert!(a.properties().first("textures").is_some());
    assert!(b.properties().first("textures").is_some());
}

#[tokio::test]
async fn secure_fills_bypass_the_cache() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/profile/{NOTCH_COMPACT}")))
        .and(query_param("unsigned", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_response()))
        .expect(2)
        .mount(&server)
        .await;

    let service = session_service(&server);
    let bare = GameProfile::complete(notch_id(), "Notch");

    service.fill_profile(bare.clone(), true).await;
    service.fill_profile(bare, true).await;
}

#[tokio::test]
async fn fill_profile_falls_back_to_the_input_on_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/profile/{NOTCH_COMPACT}")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let service = session_service(&server);
    let bare = GameProfile::complete(notch_id(), "Notch");

    let result = service.fill_profile(bare.clone(), false).await;
    assert_eq!(result.id(), bare.id());
    assert!(result.properties().is_empty());
}

#[tokio::test]
async fn fill_profile_without_an_id_is_a_no_op() {
    let server = MockServer::start().await;
    let service = session_service(&server);

    let name_only = GameProfile::new(None, Some("Notch".to_string())).unwrap();
    let result = service.fill_profile(name_only.clone(), false).await;
    assert_eq!(result, name_only);
}

// ============================================================================
// Texture Tests
// ============================================================================

fn textures_value() -> String {
    let payload = json!({
        "timestamp": 1424180672549u64,
        "profileId": NOTCH_COMPACT,
        "profileName": "Notch",
        "isPublic": true,
        "textures": {
            "SKIN": {"url": "http://textures.example/texture/abc123"}
        }
    });
    BASE64.encode(payload.to_string())
}

fn sign(value: &str) -> String {
    let (private, _) = key_pair();
    let digest = Sha1::digest(value.as_bytes());
    let signature = private
        .sign(Pkcs1v15Sign::new::<Sha1>(), &digest)
        .expect("signing");
    BASE64.encode(signature)
}

#[tokio::test]
async fn textures_decode_from_the_profile_property() {
    let server = MockServer::start().await;
    let service = session_service(&server);

    let mut profile = GameProfile::complete(notch_id(), "Notch");
    profile
        .properties_mut()
        .put(Property::new("textures", textures_value()));

    let textures = service.textures(&profile, false).unwrap();
    let skin = &textures[&TextureKind::Skin];
    assert_eq!(skin.url(), "http://textures.example/texture/abc123");
    assert_eq!(skin.hash(), "abc123");
}

#[tokio::test]
async fn profiles_without_textures_yield_an_empty_map() {
    let server = MockServer::start().await;
    let service = session_service(&server);

    let profile = GameProfile::complete(notch_id(), "Notch");
    assert!(service.textures(&profile, false).unwrap().is_empty());
}

#[tokio::test]
async fn secure_textures_require_a_signature() {
    let server = MockServer::start().await;
    let service = session_service(&server);

    let mut profile = GameProfile::complete(notch_id(), "Notch");
    profile
        .properties_mut()
        .put(Property::new("textures", textures_value()));

    let result = service.textures(&profile, true);
    assert!(matches!(
        result,
        Err(Error::InsecureTexture(
            InsecureTextureError::MissingSignature
        ))
    ));
}

#[tokio::test]
async fn secure_textures_verify_a_valid_signature() {
    let server = MockServer::start().await;
    let service = session_service(&server);

    let value = textures_value();
    let signature = sign(&value);
    let mut profile = GameProfile::complete(notch_id(), "Notch");
    profile
        .properties_mut()
        .put(Property::new_signed("textures", value, signature));

    let textures = service.textures(&profile, true).unwrap();
    assert_eq!(textures[&TextureKind::Skin].hash(), "abc123");
}

#[tokio::test]
async fn secure_textures_reject_a_tampered_payload() {
    let server = MockServer::start().await;
    let service = session_service(&server);

    let value = textures_value();
    let signature = sign("something else entirely");
    let mut profile = GameProfile::complete(notch_id(), "Notch");
    profile
        .properties_mut()
        .put(Property::new_signed("textures", value, signature));

    let result = service.textures(&profile, true);
    assert!(matches!(
        result,
        Err(Error::InsecureTexture(InsecureTextureError::InvalidSignature))
    ));
}
