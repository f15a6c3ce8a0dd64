use super::item_path;
use crate::api::ApiClient;
use crate::core::{page_query, Gasometer, GasometerFilter, GasometerForm, GasometerPatch, Page, Result};

pub struct GasometerService<'a> {
    client: &'a ApiClient,
}

impl<'a> GasometerService<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, page: u32, filter: &GasometerFilter) -> Result<Page<Gasometer>> {
        let query = page_query(page, |q| filter.append_to(q));
        self.client.get("/gasometers/", query).await
    }

    pub async fn get(&self, id: i64) -> Result<Gasometer> {
        self.client.get(&item_path("gasometers", id), Vec::new()).await
    }

    pub async fn create(&self, form: &GasometerForm) -> Result<Gasometer> {
        self.client.post("/gasometers/", form).await
    }

    pub async fn update(&self, id: i64, patch: &GasometerPatch) -> Result<Gasometer> {
        self.client.patch(&item_path("gasometers", id), patch).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client.delete(&item_path("gasometers", id)).await
    }

    /// Distinct locations in use, for filter drop-downs
    pub async fn locations(&self) -> Result<Vec<String>> {
        self.client.get("/gasometers/locations/", Vec::new()).await
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{GasometerFilter, GasometerForm, GasometerPatch, GasometerStatus};
    use crate::services::testing::signed_in_client;

    #[tokio::test]
    async fn test_create_update_delete() {
        let client = signed_in_client().await;
        let service = client.gasometers();

        let created = service
            .create(&GasometerForm {
                identificador: "GM-AC-004".into(),
                descricao: "Medidor da cozinha".into(),
                localizacao: "Bloco D".into(),
                status: GasometerStatus::Ativo,
            })
            .await
            .unwrap();

        let patch = GasometerPatch {
            status: Some(GasometerStatus::Manutencao),
            ..Default::default()
        };
        let updated = service.update(created.id, &patch).await.unwrap();
        assert_eq!(updated.status, GasometerStatus::Manutencao);
        assert_eq!(updated.identificador, "GM-AC-004");

        assert!(service.locations().await.unwrap().contains(&"Bloco D".to_string()));

        service.delete(created.id).await.unwrap();
        assert_eq!(service.get(created.id).await.unwrap_err().status(), Some(404));
    }

    #[tokio::test]
    async fn test_list_with_status_filter() {
        let client = signed_in_client().await;
        let filter = GasometerFilter {
            status: Some(GasometerStatus::Inativo),
            ..Default::default()
        };

        let page = client.gasometers().list(1, &filter).await.unwrap();
        assert_eq!(page.count, 1);
        assert_eq!(page.results[0].identificador, "GM-AC-003");
        assert!(page.next.is_none());
    }
}
