use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Settings;
use crate::error::{AuthError, Error, TransportError};
use crate::session::store::{AuthStatus, TokenPair, TokenStore, TokenStorage};

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Login response, normalized at the boundary: the backend has shipped both
/// `token`/`refreshToken` and `access_token`/`refresh_token` spellings.
#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default, alias = "access_token")]
    token: Option<String>,
    #[serde(default, rename = "refreshToken", alias = "refresh_token")]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default, alias = "token")]
    access_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    token: &'a str,
}

/// Administrator session: owns the token store and the three auth
/// endpoints. Auth traffic goes through its own client so it is never
/// bearer-injected or refresh-retried.
pub struct Session {
    store: TokenStore,
    http: reqwest::Client,
    base_url: Url,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl Session {
    pub fn new(settings: &Settings, storage: Box<dyn TokenStorage>) -> Result<Self, Error> {
        let base_url = Url::parse(&settings.api.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.api.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;

        Ok(Self {
            store: TokenStore::new(storage),
            http,
            base_url,
            refresh_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Read the persisted session at startup. Idempotent.
    pub async fn load(&self) -> Result<(), Error> {
        self.store.load().await
    }

    /// Authenticate against `POST /auth/loginadmin` and store the pair.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), Error> {
        let email = email.trim();
        let password = password.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("email and password are required".to_string()).into());
        }

        let url = self.auth_url("/auth/loginadmin")?;
        info!(%email, "logging in");

        let resp = self
            .http
            .post(url)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        match resp.status() {
            StatusCode::BAD_REQUEST => Err(AuthError::InvalidCredentialsFormat.into()),
            StatusCode::UNAUTHORIZED => Err(AuthError::InvalidCredentials.into()),
            status if !status.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                Err(TransportError::Status {
                    status: status.as_u16(),
                    body,
                }
                .into())
            }
            _ => {
                let body: LoginResponse = resp
                    .json()
                    .await
                    .map_err(|_| AuthError::MalformedResponse)?;
                let (access_token, refresh_token) = match (body.token, body.refresh_token) {
                    (Some(a), Some(r)) if !a.is_empty() && !r.is_empty() => (a, r),
                    _ => return Err(AuthError::MalformedResponse.into()),
                };

                self.store
                    .set_tokens(TokenPair {
                        access_token,
                        refresh_token,
                    })
                    .await?;
                info!(%email, "login successful");
                Ok(())
            }
        }
    }

    /// Best-effort server-side logout followed by an unconditional local
    /// clear. Transport failures are swallowed; calling this twice is fine.
    pub async fn logout(&self) -> Result<(), Error> {
        if let Some(pair) = self.store.tokens() {
            match self.auth_url("/auth/logout") {
                Ok(url) => {
                    let result = self
                        .http
                        .post(url)
                        .bearer_auth(&pair.access_token)
                        .json(&RefreshRequest {
                            token: &pair.refresh_token,
                        })
                        .send()
                        .await;
                    match result {
                        Ok(resp) if !resp.status().is_success() => {
                            debug!(status = %resp.status(), "server rejected logout, clearing local session anyway");
                        }
                        Err(e) => {
                            debug!(error = %e, "logout request failed, clearing local session anyway");
                        }
                        Ok(_) => {}
                    }
                }
                Err(e) => debug!(error = %e, "skipping server-side logout"),
            }
        }

        self.store.clear().await?;
        info!("logged out");
        Ok(())
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Returns `Ok(None)` when no refresh token is held or the exchange was
    /// rejected; rejection also clears the session. Concurrent callers share
    /// a single exchange: whoever holds the lock performs it, and callers
    /// that were waiting observe the rotated access token and return it
    /// without a second round trip.
    pub async fn refresh(&self) -> Result<Option<String>, Error> {
        if self.store.refresh_token().is_none() {
            return Ok(None);
        }

        let seen = self.store.access_token();
        let _guard = self.refresh_lock.lock().await;

        let current = self.store.access_token();
        if current.is_some() && current != seen {
            debug!("access token already rotated by a concurrent refresh");
            return Ok(current);
        }
        let Some(refresh_token) = self.store.refresh_token() else {
            // A concurrent logout cleared the session while we waited.
            return Ok(None);
        };

        let url = self.auth_url("/auth/refresh")?;
        debug!("refreshing access token");

        let resp = match self
            .http
            .post(url)
            .json(&RefreshRequest {
                token: &refresh_token,
            })
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                warn!(error = %e, "token refresh unreachable, logging out");
                self.logout().await?;
                return Ok(None);
            }
        };

        if !resp.status().is_success() {
            warn!(status = %resp.status(), "refresh token rejected, logging out");
            self.logout().await?;
            return Ok(None);
        }

        let access_token = match resp.json::<RefreshResponse>().await {
            Ok(RefreshResponse {
                access_token: Some(token),
            }) if !token.is_empty() => token,
            _ => {
                warn!("refresh response carried no access token, logging out");
                self.logout().await?;
                return Ok(None);
            }
        };

        // New access token, same refresh token.
        self.store
            .set_tokens(TokenPair {
                access_token: access_token.clone(),
                refresh_token,
            })
            .await?;
        debug!("access token refreshed");
        Ok(Some(access_token))
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.access_token()
    }

    pub fn auth_status(&self) -> AuthStatus {
        self.store.auth_status()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    /// Watch feed of auth-state changes for route-guard-style consumers.
    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.store.subscribe()
    }

    fn auth_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }
}
