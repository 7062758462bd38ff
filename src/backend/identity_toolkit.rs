//! Identity provider backed by the Identity Toolkit REST API.
//!
//! `POST {base}/v1/accounts:signUp` creates an email/password account and
//! returns its `localId`. The API key goes in the `X-Goog-Api-Key` header so it
//! never appears in URLs, and with them in error messages. The base URL is configurable so the auth
//! emulator (`http://localhost:9099/identitytoolkit.googleapis.com`) works too.

use super::IdentityProvider;
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{Instrument, debug, info_span, instrument};
use url::Url;

pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com";

const API_KEY_HEADER: &str = "X-Goog-Api-Key";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
}

pub struct IdentityToolkitProvider {
    client: Client,
    signup_url: Url,
    api_key: SecretString,
}

impl IdentityToolkitProvider {
    /// Build a provider for the Identity Toolkit instance at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("Failed to build identity provider HTTP client")?;

        Ok(Self {
            client,
            signup_url: signup_url(base_url)?,
            api_key,
        })
    }

    #[must_use]
    pub fn signup_url(&self) -> &Url {
        &self.signup_url
    }
}

impl std::fmt::Debug for IdentityToolkitProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityToolkitProvider")
            .field("signup_url", &self.signup_url.as_str())
            .field("api_key", &"***")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityProvider for IdentityToolkitProvider {
    #[instrument(skip(self, password))]
    async fn create_credential(&self, email: &str, password: &SecretString) -> Result<String> {
        let body = SignUpRequest {
            email,
            password: password.expose_secret(),
            return_secure_token: false,
        };

        let span = info_span!(
            "identity.request",
            http.method = "POST",
            http.url = %self.signup_url
        );

        let response = self
            .client
            .post(self.signup_url.clone())
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&body)
            .send()
            .instrument(span)
            .await
            .map_err(reqwest::Error::without_url)
            .context("identity provider unreachable")?;

        let status = response.status();

        if !status.is_success() {
            let json_response: Value = response.json().await.unwrap_or_default();
            return Err(anyhow!(provider_error_message(&json_response, status)));
        }

        let created: SignUpResponse = response
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Error parsing identity provider response: no localId found")?;

        debug!(uid = %created.local_id, "credential created");

        Ok(created.local_id)
    }
}

fn signup_url(base_url: &str) -> Result<Url> {
    let base = Url::parse(base_url)
        .with_context(|| format!("Invalid identity provider URL: {base_url}"))?;

    if !matches!(base.scheme(), "http" | "https") {
        return Err(anyhow!(
            "Error parsing URL: unsupported scheme {}",
            base.scheme()
        ));
    }

    let endpoint = format!("{}/v1/accounts:signUp", base.as_str().trim_end_matches('/'));

    Url::parse(&endpoint).with_context(|| format!("Invalid identity provider URL: {endpoint}"))
}

// {"error": {"code": 400, "message": "EMAIL_EXISTS", ...}}
fn provider_error_message(body: &Value, status: reqwest::StatusCode) -> String {
    body["error"]["message"]
        .as_str()
        .map_or_else(|| format!("identity provider error: {status}"), ToString::to_string)
}
