//! HTTP client for the admin API.
//!
//! Every outgoing request passes through one place that attaches the
//! bearer token and handles 401s with a single refresh-and-retry, so the
//! resource modules never deal with session state themselves.

use reqwest::header::{HeaderValue, AUTHORIZATION};
use reqwest::{Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{Error, TransportError};
use crate::session::Session;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    session: Arc<Session>,
}

impl ApiClient {
    pub fn new(settings: &Settings, session: Arc<Session>) -> Result<Self, Error> {
        let base_url = Url::parse(&settings.api.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.api.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub async fn get(&self, path: &str) -> Result<Response, Error> {
        let req = self
            .http
            .request(Method::GET, self.join(path)?)
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;
        self.execute(req).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let resp = self.get(path).await?;
        Self::json_body(resp).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let req = self
            .http
            .request(Method::POST, self.join(path)?)
            .json(body)
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;
        let resp = self.execute(req).await?;
        Self::json_body(resp).await
    }

    pub async fn post(&self, path: &str, body: &impl Serialize) -> Result<Response, Error> {
        let req = self
            .http
            .request(Method::POST, self.join(path)?)
            .json(body)
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;
        self.execute(req).await
    }

    pub async fn put(&self, path: &str) -> Result<Response, Error> {
        let req = self
            .http
            .request(Method::PUT, self.join(path)?)
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;
        self.execute(req).await
    }

    pub async fn put_json(&self, path: &str, body: &impl Serialize) -> Result<Response, Error> {
        let req = self
            .http
            .request(Method::PUT, self.join(path)?)
            .json(body)
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;
        self.execute(req).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response, Error> {
        let req = self
            .http
            .request(Method::DELETE, self.join(path)?)
            .build()
            .map_err(|e| Error::Internal(e.to_string()))?;
        self.execute(req).await
    }

    /// Treat any non-2xx response as a transport error, otherwise decode
    /// the JSON body.
    pub async fn json_body<T: DeserializeOwned>(resp: Response) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }
        resp.json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()).into())
    }

    /// Discard the body of a mutation response, keeping only success or
    /// failure. Some backend routes answer 2xx with an empty body.
    pub async fn expect_success(resp: Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        }
        .into())
    }

    /// Send a request with bearer injection and the 401 retry contract:
    /// at most one refresh and one resend per original request, and auth
    /// endpoints are exempt from both.
    async fn execute(&self, mut req: Request) -> Result<Response, Error> {
        let request_id = Uuid::new_v4();
        let path = req.url().path().to_string();
        let auth_path = path.starts_with("/auth/");

        if !auth_path && req.headers().get(AUTHORIZATION).is_none() {
            if let Some(token) = self.session.access_token() {
                req.headers_mut()
                    .insert(AUTHORIZATION, Self::bearer(&token)?);
            }
        }

        // Clone up front: the body is gone once the request is sent.
        let retry = if auth_path { None } else { req.try_clone() };

        debug!(%request_id, method = %req.method(), %path, "sending request");
        let resp = self
            .http
            .execute(req)
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        if resp.status() != StatusCode::UNAUTHORIZED || auth_path {
            return Ok(resp);
        }
        let Some(mut retry) = retry else {
            return Ok(resp);
        };

        info!(%request_id, %path, "got 401, refreshing access token");
        let refreshed = match self.session.refresh().await {
            Ok(refreshed) => refreshed,
            Err(e) => {
                if let Err(logout_err) = self.session.logout().await {
                    warn!(%request_id, error = %logout_err, "logout after failed refresh also failed");
                }
                return Err(e);
            }
        };
        match refreshed {
            Some(token) => {
                retry.headers_mut().insert(AUTHORIZATION, Self::bearer(&token)?);
                debug!(%request_id, %path, "retrying with refreshed token");
                self.http
                    .execute(retry)
                    .await
                    .map_err(|e| TransportError::Unreachable(e.to_string()).into())
            }
            None => {
                warn!(%request_id, %path, "refresh yielded no token, session closed");
                self.session.logout().await?;
                let body = resp.text().await.unwrap_or_default();
                Err(TransportError::Status { status: 401, body }.into())
            }
        }
    }

    fn bearer(token: &str) -> Result<HeaderValue, Error> {
        HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| Error::Internal(format!("invalid bearer token: {}", e)))
    }

    fn join(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }
}
