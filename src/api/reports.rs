use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::api::models::{Incident, IncidentStatus};
use crate::client::ApiClient;
use crate::error::Error;

#[derive(Debug, Serialize)]
struct StatusUpdate {
    status: IncidentStatus,
}

/// Incident report moderation endpoints.
pub struct ReportsApi {
    client: Arc<ApiClient>,
}

impl ReportsApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<Incident>, Error> {
        self.client.get_json("/admin/reports/incidents").await
    }

    pub async fn set_status(&self, id: i64, status: IncidentStatus) -> Result<(), Error> {
        let resp = self
            .client
            .put_json(
                &format!("/admin/reports/incidents/{}/status", id),
                &StatusUpdate { status },
            )
            .await?;
        ApiClient::expect_success(resp).await?;
        info!(%id, %status, "incident status updated");
        Ok(())
    }

    pub async fn publish(&self, id: i64) -> Result<(), Error> {
        let resp = self
            .client
            .put(&format!("/admin/reports/incidents/{}/publish", id))
            .await?;
        ApiClient::expect_success(resp).await?;
        info!(%id, "incident published");
        Ok(())
    }

    pub async fn remove(&self, id: i64) -> Result<(), Error> {
        let resp = self
            .client
            .delete(&format!("/admin/reports/incidents/{}", id))
            .await?;
        ApiClient::expect_success(resp).await?;
        info!(%id, "incident deleted");
        Ok(())
    }
}
