use std::sync::Arc;

use crate::api::models::{DashboardStats, Dataset};
use crate::client::ApiClient;
use crate::error::Error;

/// Summary datasets behind the dashboard charts.
pub struct DashboardApi {
    client: Arc<ApiClient>,
}

impl DashboardApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Fetch the four datasets concurrently, translating the raw status
    /// keys in the by-status dataset into display labels.
    pub async fn stats(&self) -> Result<DashboardStats, Error> {
        let (area, bar, by_status, publish_ratio) = futures::try_join!(
            self.client
                .get_json::<Dataset>("/admin/reports/incidents-by-month"),
            self.client.get_json::<Dataset>("/admin/reports/by-category"),
            self.client.get_json::<Dataset>("/admin/reports/by-status"),
            // The deployed backend routes this one under a double slash.
            self.client.get_json::<Dataset>("/admin//publish-ratio"),
        )?;

        let pie_status = Dataset {
            labels: by_status
                .labels
                .iter()
                .map(|key| status_label(key).to_string())
                .collect(),
            data: by_status.data,
        };

        Ok(DashboardStats {
            area,
            bar,
            pie_status,
            pie_published: publish_ratio,
        })
    }
}

fn status_label(key: &str) -> &str {
    match key {
        "pending" => "Pendientes",
        "validated" => "Aceptados",
        "rejected" => "Rechazados",
        "deleted" => "Eliminados",
        other => other,
    }
}
