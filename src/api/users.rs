use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::models::{Account, NewAccount};
use crate::client::ApiClient;
use crate::error::{AuthError, Error, TransportError};

#[derive(Debug, Serialize)]
struct DeleteRequest {
    id: i64,
}

/// Administrator account endpoints.
pub struct UsersApi {
    client: Arc<ApiClient>,
}

impl UsersApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Account>, Error> {
        self.client.get_json("/admin/users/list").await
    }

    pub async fn create(&self, account: &NewAccount) -> Result<Account, Error> {
        if account.name.trim().is_empty()
            || account.email.trim().is_empty()
            || account.password.is_empty()
        {
            return Err(
                AuthError::Validation("name, email and password are required".to_string()).into(),
            );
        }
        if !looks_like_email(&account.email) {
            return Err(AuthError::Validation("invalid email address".to_string()).into());
        }

        let created: Account = self.client.post_json("/admin/users", account).await?;
        info!(id = created.id, email = %created.email, "administrator created");
        Ok(created)
    }

    /// Delete by POST body first (the current controller route), falling
    /// back to `DELETE /admin/users/{id}` when that route is absent.
    pub async fn remove(&self, id: i64) -> Result<(), Error> {
        let resp = self
            .client
            .post("/admin/users/delete", &DeleteRequest { id })
            .await?;
        let status = resp.status().as_u16();
        if resp.status().is_success() {
            info!(%id, "administrator deleted");
            return Ok(());
        }
        if !matches!(status, 400 | 404 | 405) {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body }.into());
        }

        debug!(%id, %status, "delete route not available, falling back to DELETE by id");
        let resp = self.client.delete(&format!("/admin/users/{}", id)).await?;
        ApiClient::expect_success(resp).await?;
        info!(%id, "administrator deleted");
        Ok(())
    }
}

// Same lightweight shape check the console form applied.
fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !local.contains(char::is_whitespace)
        && !domain.contains(char::is_whitespace)
        && !domain.contains('@')
        && domain.split_once('.').is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}
