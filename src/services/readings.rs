use super::item_path;
use crate::api::ApiClient;
use crate::core::{page_query, Page, Reading, ReadingFilter, ReadingForm, ReadingPatch, Result};

pub struct ReadingService<'a> {
    client: &'a ApiClient,
}

impl<'a> ReadingService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: u32, filter: &ReadingFilter) -> Result<Page<Reading>> {
        let query = page_query(page, |q| filter.append_to(q));
        self.client.get("/readings/", query).await
    }

    pub async fn get(&self, id: i64) -> Result<Reading> {
        self.client.get(&item_path("readings", id), Vec::new()).await
    }

    pub async fn create(&self, form: &ReadingForm) -> Result<Reading> {
        self.client.post("/readings/", form).await
    }

    pub async fn update(&self, id: i64, patch: &ReadingPatch) -> Result<Reading> {
        self.client.patch(&item_path("readings", id), patch).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&item_path("readings", id)).await
    }

    /// Most recent readings of one meter, newest first
    pub async fn by_gasometer(&self, gasometro: i64, limit: u32) -> Result<Vec<Reading>> {
        let query = vec![("limit".to_string(), limit.to_string())];
        self.client
            .get(&format!("/readings/by-gasometer/{}/", gasometro), query)
            .await
    }

    /// Server-generated export file, returned as-is
    pub async fn export(&self, filter: &ReadingFilter) -> Result<Vec<u8>> {
        let mut query = Vec::new();
        filter.append_to(&mut query);
        self.client.get_bytes("/readings/export/", query).await
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{ReadingFilter, ReadingForm, ReadingPatch};
    use crate::services::testing::signed_in_client;

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let client = signed_in_client().await;
        let history = client.readings().by_gasometer(1, 5).await.unwrap();

        let values: Vec<f64> = history.iter().map(|r| r.consumo).collect();
        assert_eq!(values, vec![15.67, 12.34]);
    }

    #[tokio::test]
    async fn test_create_and_patch() {
        let client = signed_in_client().await;
        let service = client.readings();

        let created = service
            .create(&ReadingForm {
                gasometro: 2,
                data_leitura: "2024-01-22T10:00:00Z".into(),
                consumo: 9.5,
                observacao: None,
            })
            .await
            .unwrap();
        assert_eq!(created.gasometro_data.unwrap().identificador, "GM-AC-002");

        let patch = ReadingPatch {
            observacao: Some("Corrigida".into()),
            ..Default::default()
        };
        let updated = service.update(created.id, &patch).await.unwrap();
        assert_eq!(updated.observacao.as_deref(), Some("Corrigida"));
        assert_eq!(updated.consumo, 9.5);
    }

    #[tokio::test]
    async fn test_list_filters_by_meter_and_export() {
        let client = signed_in_client().await;
        let filter = ReadingFilter {
            gasometro: Some(1),
            ..Default::default()
        };

        let page = client.readings().list(1, &filter).await.unwrap();
        assert_eq!(page.count, 2);

        let csv = String::from_utf8(client.readings().export(&filter).await.unwrap()).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.starts_with("id,gasometro,data_leitura,consumo,observacao"));
    }
}
