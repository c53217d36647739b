//! REST implementation of [`AuthBackend`] against a Supabase-style API.
//!
//! Credential creation goes through `/auth/v1/signup`; the profile table
//! lives behind PostgREST at `/rest/v1/profiles`. The session returned by
//! signup is held locally, mirroring the client SDK this replaces.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::config::BackendConfig;
use crate::error::BackendError;

use super::{AuthBackend, NewCredential, NewProfile, Session};

/// Signup response: the created user, plus a session when the provider
/// establishes one immediately (it may not, e.g. with email confirmation
/// turned on).
#[derive(Debug, Deserialize)]
struct SignupResponse {
    user: SignupUser,
    access_token: Option<String>,
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct SignupUser {
    id: Uuid,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(alias = "msg", alias = "error_description")]
    message: Option<String>,
}

/// HTTP backend for the identity/profile service.
pub struct RestBackend {
    config: BackendConfig,
    client: reqwest::Client,
    session: Arc<RwLock<Option<Session>>>,
}

impl RestBackend {
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            session: Arc::new(RwLock::new(None)),
        }
    }

    fn auth_url(&self, method: &str) -> String {
        format!("{}/auth/v1/{method}", self.config.base_url)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.base_url)
    }

    fn api_key(&self) -> &str {
        self.config.api_key.expose_secret()
    }

    /// Pull the provider's error message out of a failed response,
    /// falling back to the raw body.
    async fn rejection(endpoint: &str, response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiError>(&body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| {
                if body.is_empty() {
                    format!("request to {endpoint} failed")
                } else {
                    body.clone()
                }
            });
        BackendError::Rejected { status, message }
    }

    fn request_error(endpoint: &str, error: reqwest::Error) -> BackendError {
        BackendError::Request {
            endpoint: endpoint.to_string(),
            reason: error.to_string(),
        }
    }
}

#[async_trait]
impl AuthBackend for RestBackend {
    async fn create_credential(&self, cred: &NewCredential) -> Result<Uuid, BackendError> {
        let endpoint = self.auth_url("signup");
        let body = serde_json::json!({
            "email": cred.email,
            "password": cred.password.expose_secret(),
            "data": {
                "full_name": cred.full_name,
                "role": cred.role,
            },
        });

        let response = self
            .client
            .post(&endpoint)
            .header("apikey", self.api_key())
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::request_error(&endpoint, e))?;

        if !response.status().is_success() {
            return Err(Self::rejection(&endpoint, response).await);
        }

        let signup: SignupResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        // Keep the session the provider handed back, if any
        if let Some(token) = signup.access_token {
            let expires_at = signup
                .expires_in
                .map(|secs| Utc::now() + ChronoDuration::seconds(secs));
            *self.session.write().await = Some(Session {
                user_id: signup.user.id,
                access_token: SecretString::from(token),
                expires_at,
            });
        }

        debug!(user_id = %signup.user.id, "Credential created");
        Ok(signup.user.id)
    }

    async fn get_session(&self) -> Result<Option<Session>, BackendError> {
        let session = self.session.read().await;
        match session.as_ref() {
            Some(s) if s.expires_at.is_none_or(|at| at > Utc::now()) => Ok(Some(s.clone())),
            _ => Ok(None),
        }
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<(), BackendError> {
        let endpoint = self.rest_url("profiles");
        let session = self.get_session().await?.ok_or_else(|| BackendError::Rejected {
            status: 401,
            message: "no session for profile insert".to_string(),
        })?;

        let response = self
            .client
            .post(&endpoint)
            .header("apikey", self.api_key())
            .bearer_auth(session.access_token.expose_secret())
            .header("Prefer", "return=minimal")
            .json(profile)
            .send()
            .await
            .map_err(|e| Self::request_error(&endpoint, e))?;

        if !response.status().is_success() {
            return Err(Self::rejection(&endpoint, response).await);
        }

        debug!(user_id = %profile.id, handle = %profile.handle, "Profile row created");
        Ok(())
    }

    async fn handle_exists(&self, handle: &str) -> Result<bool, BackendError> {
        let endpoint = self.rest_url("profiles");
        let response = self
            .client
            .get(&endpoint)
            .header("apikey", self.api_key())
            .bearer_auth(self.api_key())
            .query(&[("handle", format!("eq.{handle}")), ("select", "handle".to_string())])
            .send()
            .await
            .map_err(|e| Self::request_error(&endpoint, e))?;

        if !response.status().is_success() {
            return Err(Self::rejection(&endpoint, response).await);
        }

        let rows: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
        Ok(!rows.is_empty())
    }
}
