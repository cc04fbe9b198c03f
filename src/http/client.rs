//! Typed HTTP exchange against the identity service.

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};

use crate::error::{Error, TransportError};
use crate::types::Environment;

use super::endpoints::ErrorEnvelope;

/// Typed request/response client for the identity service.
///
/// One instance represents one installation: it carries the process-wide
/// client token alongside the environment's base URLs. Cloning is cheap and
/// clones share the underlying connection pool.
///
/// Every exchange screens the response body against the service's error
/// envelope before decoding the success shape; service-reported errors are
/// mapped into the library taxonomy, transport failures and undecodable
/// bodies surface as [`Error::Unavailable`].
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: reqwest::Client,
    env: Environment,
    client_token: String,
}

impl ServiceClient {
    /// Create a client for the given environment.
    ///
    /// The client token should be fixed for the lifetime of the local
    /// installation; it is how the service detects token reassignment.
    pub fn new(env: Environment, client_token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("yggdrasil-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            env,
            client_token: client_token.into(),
        }
    }

    /// Returns the environment this client talks to.
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Returns the process-wide client token.
    pub fn client_token(&self) -> &str {
        &self.client_token
    }

    /// POST a JSON body and decode a required JSON response.
    #[instrument(skip(self, body))]
    pub async fn post<B, R>(&self, url: String, body: &B) -> Result<R, Error>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        debug!("POST request");
        let response = self.client.post(&url).json(body).send().await?;

        match self.screen_response(response).await? {
            Some(body) => decode(&body),
            None => Err(TransportError::MalformedResponse {
                message: "expected a response body, got none".to_string(),
            }
            .into()),
        }
    }

    /// POST a JSON body to an endpoint whose success response is empty.
    #[instrument(skip(self, body))]
    pub async fn post_no_content<B>(&self, url: String, body: &B) -> Result<(), Error>
    where
        B: Serialize,
    {
        debug!("POST request (no content expected)");
        let response = self.client.post(&url).json(body).send().await?;

        self.screen_response(response).await?;
        Ok(())
    }

    /// GET with query parameters, decoding an optional JSON response.
    ///
    /// An empty success body yields `None`; the session server uses that to
    /// report "no match" on join confirmation.
    #[instrument(skip(self, query))]
    pub async fn get<Q, R>(&self, url: String, query: &Q) -> Result<Option<R>, Error>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!("GET request");
        let response = self.client.get(&url).query(query).send().await?;

        match self.screen_response(response).await? {
            Some(body) => decode(&body).map(Some),
            None => Ok(None),
        }
    }

    /// Read a response body and screen it against the error envelope.
    ///
    /// The service reports application errors in the body rather than via
    /// status codes alone, so the body is inspected regardless of status.
    async fn screen_response(&self, response: reqwest::Response) -> Result<Option<String>, Error> {
        let status = response.status();
        let body = response.text().await?;
        trace!(status = %status, body_len = body.len(), "service response");

        if body.trim().is_empty() {
            if status.is_success() {
                return Ok(None);
            }
            return Err(TransportError::Http {
                message: format!("HTTP {status} with empty body"),
            }
            .into());
        }

        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body)
            && envelope.error_name().is_some()
        {
            return Err(envelope.into_error());
        }

        Ok(Some(body))
    }
}

fn decode<R: DeserializeOwned>(body: &str) -> Result<R, Error> {
    serde_json::from_str(body).map_err(|e| {
        TransportError::MalformedResponse {
            message: e.to_string(),
        }
        .into()
    })
}
