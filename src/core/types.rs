//! Common types used across the application
//!
//! Field names follow the REST API's wire format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a meter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GasometerStatus {
    Ativo,
    Inativo,
    Manutencao,
}

impl GasometerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ativo => "ativo",
            Self::Inativo => "inativo",
            Self::Manutencao => "manutencao",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ativo" => Some(Self::Ativo),
            "inativo" => Some(Self::Inativo),
            "manutencao" => Some(Self::Manutencao),
            _ => None,
        }
    }
}

impl fmt::Display for GasometerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical gas meter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gasometer {
    pub id: i64,
    /// Unique, human-assigned identifier (e.g. "GM-AC-001")
    pub identificador: String,
    pub descricao: String,
    pub localizacao: String,
    pub status: GasometerStatus,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Meter creation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasometerForm {
    pub identificador: String,
    pub descricao: String,
    pub localizacao: String,
    pub status: GasometerStatus,
}

/// Partial meter update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GasometerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identificador: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descricao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub localizacao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GasometerStatus>,
}

/// A single consumption observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    /// Meter reference
    pub gasometro: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gasometro_data: Option<Gasometer>,
    /// Measurement timestamp (ISO-8601)
    pub data_leitura: String,
    /// Consumption in m³
    pub consumo: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacao: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Reading creation payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingForm {
    pub gasometro: i64,
    pub data_leitura: String,
    pub consumo: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observacao: Option<String>,
}

/// Partial reading update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gasometro: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_leitura: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumo: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observacao: Option<String>,
}

/// Alert category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    PicoConsumo,
    MedidorInativo,
    FalhaLeitura,
    ConsumoZero,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PicoConsumo => "pico_consumo",
            Self::MedidorInativo => "medidor_inativo",
            Self::FalhaLeitura => "falha_leitura",
            Self::ConsumoZero => "consumo_zero",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pico_consumo" => Some(Self::PicoConsumo),
            "medidor_inativo" => Some(Self::MedidorInativo),
            "falha_leitura" => Some(Self::FalhaLeitura),
            "consumo_zero" => Some(Self::ConsumoZero),
            _ => None,
        }
    }
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Alert resolution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Novo,
    EmAnalise,
    Resolvido,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Novo => "novo",
            Self::EmAnalise => "em_analise",
            Self::Resolvido => "resolvido",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "novo" => Some(Self::Novo),
            "em_analise" => Some(Self::EmAnalise),
            "resolvido" => Some(Self::Resolvido),
            _ => None,
        }
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anomaly notice raised server-side for one meter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub tipo: AlertType,
    pub gasometro: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gasometro_data: Option<Gasometer>,
    pub status: AlertStatus,
    pub mensagem: String,
    pub criado_em: String,
    #[serde(default)]
    pub atualizado_em: Option<String>,
}

/// Alert counts by status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertStats {
    pub total: u64,
    pub novo: u64,
    pub em_analise: u64,
    pub resolvido: u64,
}

/// Dashboard summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    #[serde(default)]
    pub total_gasometros: u64,
    #[serde(default)]
    pub total_leituras_periodo: u64,
    #[serde(default)]
    pub media_consumo_dia: f64,
    #[serde(default)]
    pub alertas_ativos: u64,
}

/// One point of the consumption series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionPoint {
    pub date: String,
    pub consumo: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gasometro: Option<String>,
}

/// Console user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub date_joined: Option<String>,
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Token pair issued at login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access: String,
    pub refresh: String,
    pub user: User,
}

/// Paginated listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
}

/// Query parameters in request order
pub type Query = Vec<(String, String)>;

fn push_opt(query: &mut Query, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        if !v.is_empty() {
            query.push((key.to_string(), v.to_string()));
        }
    }
}

fn push_id(query: &mut Query, key: &str, value: Option<i64>) {
    // An id of 0 means "no selection"
    if let Some(v) = value.filter(|v| *v > 0) {
        query.push((key.to_string(), v.to_string()));
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl DateFilter {
    pub fn append_to(&self, query: &mut Query) {
        push_opt(query, "start_date", self.start_date.as_deref());
        push_opt(query, "end_date", self.end_date.as_deref());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GasometerFilter {
    pub status: Option<GasometerStatus>,
    pub localizacao: Option<String>,
    pub search: Option<String>,
    #[serde(flatten)]
    pub dates: DateFilter,
}

impl GasometerFilter {
    pub fn append_to(&self, query: &mut Query) {
        push_opt(query, "status", self.status.map(|s| s.as_str()));
        push_opt(query, "localizacao", self.localizacao.as_deref());
        push_opt(query, "search", self.search.as_deref());
        self.dates.append_to(query);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingFilter {
    pub gasometro: Option<i64>,
    pub search: Option<String>,
    #[serde(flatten)]
    pub dates: DateFilter,
}

impl ReadingFilter {
    pub fn append_to(&self, query: &mut Query) {
        push_id(query, "gasometro", self.gasometro);
        self.dates.append_to(query);
        push_opt(query, "search", self.search.as_deref());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertFilter {
    pub status: Option<AlertStatus>,
    pub tipo: Option<AlertType>,
    pub gasometro: Option<i64>,
}

impl AlertFilter {
    pub fn append_to(&self, query: &mut Query) {
        push_opt(query, "status", self.status.map(|s| s.as_str()));
        push_opt(query, "tipo", self.tipo.map(|t| t.as_str()));
        push_id(query, "gasometro", self.gasometro);
    }
}

/// Build the query of a paginated listing: `page` first, then the filter
pub fn page_query(page: u32, append: impl FnOnce(&mut Query)) -> Query {
    let mut query = vec![("page".to_string(), page.max(1).to_string())];
    append(&mut query);
    query
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_wire_format() {
        let reading: Reading = serde_json::from_str(
            r#"{"id":1,"gasometro":1,"data_leitura":"2024-01-20T10:00:00Z","consumo":12.34,"observacao":"Leitura mensal"}"#,
        )
        .unwrap();

        assert_eq!(reading.gasometro, 1);
        assert_eq!(reading.observacao.as_deref(), Some("Leitura mensal"));
        assert!(reading.created_at.is_none());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&AlertStatus::EmAnalise).unwrap(), "\"em_analise\"");
        assert_eq!(serde_json::to_string(&AlertType::PicoConsumo).unwrap(), "\"pico_consumo\"");
        assert_eq!(GasometerStatus::parse("manutencao"), Some(GasometerStatus::Manutencao));
        assert_eq!(AlertType::parse("bogus"), None);
    }

    #[test]
    fn test_filter_query_skips_unset_fields() {
        let filter = ReadingFilter {
            gasometro: Some(2),
            search: Some(String::new()),
            dates: DateFilter {
                start_date: Some("2024-01-01".into()),
                end_date: None,
            },
        };

        let query = page_query(3, |q| filter.append_to(q));
        assert_eq!(
            query,
            vec![
                ("page".to_string(), "3".to_string()),
                ("gasometro".to_string(), "2".to_string()),
                ("start_date".to_string(), "2024-01-01".to_string()),
            ]
        );
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = GasometerPatch {
            status: Some(GasometerStatus::Manutencao),
            ..Default::default()
        };
        assert_eq!(serde_json::to_string(&patch).unwrap(), r#"{"status":"manutencao"}"#);
    }
}
