use crate::api::ApiClient;
use crate::core::{ConsumptionPoint, DashboardStats, DateFilter, Result};

pub struct DashboardService<'a> {
    client: &'a ApiClient,
}

impl<'a> DashboardService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn stats(&self, period: &DateFilter) -> Result<DashboardStats> {
        let mut query = Vec::new();
        period.append_to(&mut query);
        self.client.get("/dashboard/stats/", query).await
    }

    /// Daily consumption series, optionally for a single meter
    pub async fn consumption(&self, period: &DateFilter, gasometro: Option<i64>) -> Result<Vec<ConsumptionPoint>> {
        let mut query = Vec::new();
        period.append_to(&mut query);
        if let Some(id) = gasometro.filter(|id| *id > 0) {
            query.push(("gasometro".to_string(), id.to_string()));
        }
        self.client.get("/dashboard/consumption/", query).await
    }
}
