//! Bearer-token acquisition for the REST transport.
//!
//! The sessions API wants an OAuth2 access token. [`TokenSource`] is the seam:
//! [`StaticTokenSource`] hands out a pre-issued token, [`CredentialTokenSource`]
//! derives one from the credential itself.

use async_trait::async_trait;
use chrono::Utc;
use dialogflow::{Credential, ServiceError};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Token endpoint used when a credential has no `token_uri`.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Scopes requested for service-account tokens.
pub const DIALOGFLOW_SCOPES: &str =
    "https://www.googleapis.com/auth/cloud-platform https://www.googleapis.com/auth/dialogflow";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime of a signed assertion; Google rejects anything above one hour.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Produces an access token for a credential.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self, credential: &Credential) -> Result<String, ServiceError>;
}

// ---------------------------------------------------------------------------

/// A token obtained out of band (e.g. `gcloud auth print-access-token`).
///
/// The credential is ignored.
#[derive(Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenSource").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self, _credential: &Credential) -> Result<String, ServiceError> {
        Ok(self.token.clone())
    }
}

// ---------------------------------------------------------------------------

/// Derives a token from the credential's own fields.
///
/// - an `access_token` field is used directly;
/// - `"type": "service_account"` signs an RS256 JWT assertion with
///   `private_key` and exchanges it at `token_uri`;
/// - `"type": "authorized_user"` is exchanged at its `token_uri` using the
///   refresh-token grant;
/// - any other type fails with [`ServiceError::Authentication`].
#[derive(Debug, Clone, Default)]
pub struct CredentialTokenSource {
    http: reqwest::Client,
}

impl CredentialTokenSource {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    async fn service_account(&self, credential: &Credential) -> Result<String, ServiceError> {
        let token_uri = credential.str_field("token_uri").unwrap_or(DEFAULT_TOKEN_URI);
        let assertion = sign_assertion(credential, token_uri, Utc::now().timestamp())?;

        debug!(token_uri, "exchanging service-account assertion");
        self.exchange(
            token_uri,
            &[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())],
        )
        .await
    }

    async fn refresh(&self, credential: &Credential) -> Result<String, ServiceError> {
        let field = |name| required_field(credential, "authorized_user", name);
        let client_id = field("client_id")?;
        let client_secret = field("client_secret")?;
        let refresh_token = field("refresh_token")?;
        let token_uri = credential.str_field("token_uri").unwrap_or(DEFAULT_TOKEN_URI);

        debug!(token_uri, "exchanging refresh token");
        self.exchange(
            token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("refresh_token", refresh_token),
            ],
        )
        .await
    }

    /// Posts `form` to the token endpoint and returns the issued access token.
    async fn exchange(&self, token_uri: &str, form: &[(&str, &str)]) -> Result<String, ServiceError> {
        let response = self
            .http
            .post(token_uri)
            .form(form)
            .send()
            .await
            .map_err(|e| ServiceError::Authentication(format!("token request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Authentication(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            ServiceError::Authentication(format!("token response could not be decoded: {e}"))
        })?;
        Ok(token.access_token)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Claims of the JWT-bearer assertion sent to the token endpoint.
#[derive(Debug, Serialize, Deserialize)]
struct AssertionClaims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

fn required_field<'a>(
    credential: &'a Credential,
    kind: &str,
    name: &str,
) -> Result<&'a str, ServiceError> {
    credential.str_field(name).ok_or_else(|| {
        ServiceError::Authentication(format!("{kind} credential is missing `{name}`"))
    })
}

/// Signs an assertion for `credential`, valid for one hour from `issued_at`.
fn sign_assertion(
    credential: &Credential,
    token_uri: &str,
    issued_at: i64,
) -> Result<String, ServiceError> {
    let client_email = required_field(credential, "service_account", "client_email")?;
    let private_key = required_field(credential, "service_account", "private_key")?;

    let key = EncodingKey::from_rsa_pem(private_key.as_bytes()).map_err(|e| {
        ServiceError::Authentication(format!("service_account private_key is unusable: {e}"))
    })?;
    let mut header = Header::new(Algorithm::RS256);
    header.kid = credential.str_field("private_key_id").map(str::to_owned);

    let claims = AssertionClaims {
        iss: client_email.to_owned(),
        scope: DIALOGFLOW_SCOPES.to_owned(),
        aud: token_uri.to_owned(),
        iat: issued_at,
        exp: issued_at + ASSERTION_LIFETIME_SECS,
    };
    jsonwebtoken::encode(&header, &claims, &key)
        .map_err(|e| ServiceError::Authentication(format!("assertion signing failed: {e}")))
}

#[async_trait]
impl TokenSource for CredentialTokenSource {
    async fn access_token(&self, credential: &Credential) -> Result<String, ServiceError> {
        if let Some(token) = credential.str_field("access_token") {
            return Ok(token.to_owned());
        }

        match credential.str_field("type") {
            Some("service_account") => self.service_account(credential).await,
            Some("authorized_user") => self.refresh(credential).await,
            Some(other) => Err(ServiceError::Authentication(format!(
                "credential type `{other}` needs a dedicated token source"
            ))),
            None => Err(ServiceError::Authentication(
                "credential has neither `type` nor `access_token`".into(),
            )),
        }
    }
}
