//! OAuth2 bearer tokens for the Google REST APIs.

use async_trait::async_trait;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{ServiceAccountAuthenticator, parse_service_account_key};

use crate::conf::ServiceAccountCredentials;
use crate::core::ClusterError;

pub const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self, scopes: &[&str]) -> Result<String, ClusterError>;
}

/// Tokens minted from a service-account key. Tokens are cached and refreshed
/// per scope set by the underlying authenticator.
pub struct ServiceAccountTokens {
    auth: DefaultAuthenticator,
}

impl ServiceAccountTokens {
    pub async fn new(credentials: &ServiceAccountCredentials) -> Result<Self, ClusterError> {
        let json = serde_json::to_vec(credentials)
            .map_err(|e| ClusterError::Auth(format!("encoding service account: {e}")))?;
        let key = parse_service_account_key(json)
            .map_err(|e| ClusterError::Auth(format!("parsing service account: {e}")))?;
        let auth = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|e| ClusterError::Auth(format!("building authenticator: {e}")))?;
        Ok(Self { auth })
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokens {
    async fn token(&self, scopes: &[&str]) -> Result<String, ClusterError> {
        let token = self
            .auth
            .token(scopes)
            .await
            .map_err(|e| ClusterError::Auth(e.to_string()))?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| ClusterError::Auth("token endpoint returned no access token".into()))
    }
}

/// A fixed bearer token, for emulators and tests.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self, _scopes: &[&str]) -> Result<String, ClusterError> {
        Ok(self.0.clone())
    }
}
