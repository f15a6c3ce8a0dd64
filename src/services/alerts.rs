use super::item_path;
use crate::api::ApiClient;
use crate::core::{page_query, Alert, AlertFilter, AlertStats, AlertStatus, Page, Result};
use serde_json::json;

pub struct AlertService<'a> {
    client: &'a ApiClient,
}

impl<'a> AlertService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: u32, filter: &AlertFilter) -> Result<Page<Alert>> {
        let query = page_query(page, |q| filter.append_to(q));
        self.client.get("/alerts/", query).await
    }

    pub async fn get(&self, id: i64) -> Result<Alert> {
        self.client.get(&item_path("alerts", id), Vec::new()).await
    }

    pub async fn update_status(&self, id: i64, status: AlertStatus) -> Result<Alert> {
        self.client
            .patch(&item_path("alerts", id), &json!({ "status": status }))
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&item_path("alerts", id)).await
    }

    pub async fn stats(&self) -> Result<AlertStats> {
        self.client.get("/alerts/stats/", Vec::new()).await
    }
}
