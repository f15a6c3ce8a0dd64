//! In-memory mock backend
//!
//! Answers every endpoint the console uses, from a small seeded data set,
//! so the whole application can run without a server. Like the real API it
//! issues tokens at login, rejects unknown bearer tokens with 401 and raises
//! consumption alerts when readings are recorded. State lives only as long
//! as the transport.

use crate::api::{ApiRequest, ApiResponse, Method, Transport};
use crate::core::{
    Alert, AlertStats, AlertStatus, AlertType, ConsumptionPoint, DashboardStats, Gasometer,
    GasometerForm, GasometerPatch, GasometerStatus, LoginCredentials, Reading, ReadingForm,
    ReadingPatch, Result, User,
};
use crate::export::{to_csv, to_records};
use crate::format::parse_timestamp;
use crate::validation::SPIKE_FACTOR;
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Rows per page of listings
pub const MOCK_PAGE_SIZE: usize = 10;
/// Readings considered when checking a new one for a spike
const SPIKE_WINDOW: usize = 5;
const DEFAULT_BY_GASOMETER_LIMIT: usize = 10;

const ACCESS_PREFIX: &str = "mock-access-token-";
const REFRESH_PREFIX: &str = "mock-refresh-token-";

/// Mock backend transport
pub struct MockTransport {
    state: Mutex<MockState>,
    latency: Duration,
    require_auth: bool,
}

impl MockTransport {
    /// Backend seeded with the demo data set
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::seeded()),
            latency: Duration::ZERO,
            require_auth: true,
        }
    }

    /// Simulate network delay on every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Accept requests without a valid bearer token
    pub fn without_auth(mut self) -> Self {
        self.require_auth = false;
        self
    }

    /// Invalidate every access token issued so far (refresh tokens stay valid)
    pub fn expire_access_tokens(&self) {
        self.lock().issued.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let response = self.lock().handle(request, self.require_auth);
        log::debug!("mock {} {} -> {}", request.method, request.path, response.status);
        Ok(response)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn respond<T: Serialize>(status: u16, value: &T) -> ApiResponse {
    match serde_json::to_value(value) {
        Ok(v) => ApiResponse::json(status, &v),
        Err(e) => ApiResponse::json(500, &json!({ "detail": e.to_string() })),
    }
}

fn bad_request(message: &str) -> ApiResponse {
    ApiResponse::json(400, &json!({ "message": message }))
}

fn not_found() -> ApiResponse {
    ApiResponse::json(404, &json!({ "detail": "N\u{00E3}o encontrado." }))
}

fn unauthorized(detail: &str) -> ApiResponse {
    ApiResponse::json(401, &json!({ "detail": detail }))
}

fn parse_body<T: DeserializeOwned>(request: &ApiRequest) -> std::result::Result<T, ApiResponse> {
    let body = request.body.clone().unwrap_or(Value::Null);
    serde_json::from_value(body).map_err(|e| bad_request(&format!("Dados inv\u{00E1}lidos: {}", e)))
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `YYYY-MM-DD` part of a timestamp
fn day_of(timestamp: &str) -> &str {
    timestamp.get(..10).unwrap_or(timestamp)
}

fn in_range(day: &str, start: Option<&str>, end: Option<&str>) -> bool {
    start.map_or(true, |s| day >= day_of(s)) && end.map_or(true, |e| day <= day_of(e))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn paginate<T: Serialize + Clone>(items: &[T], request: &ApiRequest) -> ApiResponse {
    let page = request
        .query_value("page")
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let start = (page - 1) * MOCK_PAGE_SIZE;
    let results: Vec<T> = items.iter().skip(start).take(MOCK_PAGE_SIZE).cloned().collect();

    let next = (start + MOCK_PAGE_SIZE < items.len()).then(|| format!("{}?page={}", request.path, page + 1));
    let previous = (page > 1).then(|| format!("{}?page={}", request.path, page - 1));

    respond(
        200,
        &json!({
            "results": results,
            "count": items.len(),
            "next": next,
            "previous": previous,
        }),
    )
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh: String,
}

#[derive(Deserialize)]
struct StatusBody {
    status: AlertStatus,
}

#[derive(Serialize)]
struct ExportRow<'a> {
    id: i64,
    gasometro: &'a str,
    data_leitura: &'a str,
    consumo: f64,
    observacao: &'a str,
}

struct MockState {
    gasometers: Vec<Gasometer>,
    readings: Vec<Reading>,
    alerts: Vec<Alert>,
    issued: HashSet<String>,
    next_id: i64,
    token_seq: u64,
}

impl MockState {
    fn seeded() -> Self {
        let gasometer = |id: i64, ident: &str, desc: &str, loc: &str, status: GasometerStatus, at: &str| Gasometer {
            id,
            identificador: ident.to_string(),
            descricao: desc.to_string(),
            localizacao: loc.to_string(),
            status,
            created_at: at.to_string(),
            updated_at: at.to_string(),
        };
        let reading = |id: i64, gasometro: i64, at: &str, consumo: f64, obs: &str| Reading {
            id,
            gasometro,
            gasometro_data: None,
            data_leitura: at.to_string(),
            consumo,
            observacao: Some(obs.to_string()),
            created_at: Some(at.to_string()),
            updated_at: Some(at.to_string()),
        };
        let alert = |id: i64, tipo: AlertType, gasometro: i64, status: AlertStatus, msg: &str, at: &str| Alert {
            id,
            tipo,
            gasometro,
            gasometro_data: None,
            status,
            mensagem: msg.to_string(),
            criado_em: at.to_string(),
            atualizado_em: Some(at.to_string()),
        };

        Self {
            gasometers: vec![
                gasometer(1, "GM-AC-001", "Medidor central - Andar 1", "Bloco A", GasometerStatus::Ativo, "2024-01-15T10:00:00Z"),
                gasometer(2, "GM-AC-002", "Medidor secund\u{00E1}rio - Andar 2", "Bloco B", GasometerStatus::Ativo, "2024-01-16T10:00:00Z"),
                gasometer(3, "GM-AC-003", "Medidor de emerg\u{00EA}ncia", "Bloco C", GasometerStatus::Inativo, "2024-01-17T10:00:00Z"),
            ],
            readings: vec![
                reading(1, 1, "2024-01-20T10:00:00Z", 12.34, "Leitura mensal"),
                reading(2, 1, "2024-01-21T10:00:00Z", 15.67, "Leitura semanal"),
                reading(3, 2, "2024-01-20T10:00:00Z", 8.9, "Leitura mensal"),
            ],
            alerts: vec![
                alert(1, AlertType::PicoConsumo, 1, AlertStatus::Novo, "Consumo acima de 200% da m\u{00E9}dia dos \u{00FA}ltimos 30 dias", "2024-01-22T12:10:00Z"),
                alert(2, AlertType::MedidorInativo, 3, AlertStatus::EmAnalise, "Medidor sem leituras h\u{00E1} mais de 7 dias", "2024-01-21T08:30:00Z"),
            ],
            issued: HashSet::new(),
            next_id: 100,
            token_seq: 0,
        }
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn handle(&mut self, request: &ApiRequest, require_auth: bool) -> ApiResponse {
        let segments: Vec<&str> = request
            .path
            .split('?')
            .next()
            .unwrap_or_default()
            .trim_matches('/')
            .split('/')
            .collect();

        match (request.method, segments.as_slice()) {
            (Method::Post, ["auth", "login"]) => return self.login(request),
            (Method::Post, ["auth", "token", "refresh"]) => return self.refresh(request),
            _ => {}
        }

        if require_auth && !request.bearer.as_ref().is_some_and(|t| self.issued.contains(t)) {
            return unauthorized("As credenciais de autentica\u{00E7}\u{00E3}o n\u{00E3}o foram fornecidas.");
        }

        match (request.method, segments.as_slice()) {
            (Method::Get, ["gasometers"]) => self.list_gasometers(request),
            (Method::Post, ["gasometers"]) => self.create_gasometer(request),
            (Method::Get, ["gasometers", "locations"]) => self.locations(),
            (method, ["gasometers", id]) => match id.parse::<i64>() {
                Ok(id) => self.gasometer(method, id, request),
                Err(_) => not_found(),
            },

            (Method::Get, ["readings"]) => self.list_readings(request),
            (Method::Post, ["readings"]) => self.create_reading(request),
            (Method::Get, ["readings", "export"]) => self.export_readings(request),
            (Method::Get, ["readings", "by-gasometer", id]) => match id.parse::<i64>() {
                Ok(id) => self.readings_by_gasometer(id, request),
                Err(_) => not_found(),
            },
            (method, ["readings", id]) => match id.parse::<i64>() {
                Ok(id) => self.reading(method, id, request),
                Err(_) => not_found(),
            },

            (Method::Get, ["alerts"]) => self.list_alerts(request),
            (Method::Get, ["alerts", "stats"]) => self.alert_stats(),
            (method, ["alerts", id]) => match id.parse::<i64>() {
                Ok(id) => self.alert(method, id, request),
                Err(_) => not_found(),
            },

            (Method::Get, ["dashboard", "stats"]) => self.dashboard_stats(request),
            (Method::Get, ["dashboard", "consumption"]) => self.dashboard_consumption(request),

            _ => not_found(),
        }
    }

    // ===== Auth =====

    fn issue_access(&mut self) -> String {
        self.token_seq += 1;
        let token = format!("{}{}", ACCESS_PREFIX, self.token_seq);
        self.issued.insert(token.clone());
        token
    }

    fn login(&mut self, request: &ApiRequest) -> ApiResponse {
        let credentials: LoginCredentials = match parse_body(request) {
            Ok(c) => c,
            Err(response) => return response,
        };

        if credentials.username.trim().is_empty() || credentials.password.is_empty() {
            return unauthorized("Credenciais inv\u{00E1}lidas");
        }

        let access = self.issue_access();
        let refresh = format!("{}{}", REFRESH_PREFIX, self.token_seq);
        let user = User {
            id: 1,
            username: credentials.username.trim().to_string(),
            email: "admin@gascontrol.com".to_string(),
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
            is_staff: true,
            is_active: true,
            date_joined: Some("2024-01-01T00:00:00Z".to_string()),
        };

        respond(200, &json!({ "access": access, "refresh": refresh, "user": user }))
    }

    fn refresh(&mut self, request: &ApiRequest) -> ApiResponse {
        let body: RefreshBody = match parse_body(request) {
            Ok(b) => b,
            Err(response) => return response,
        };

        if !body.refresh.starts_with(REFRESH_PREFIX) {
            return unauthorized("Token inv\u{00E1}lido ou expirado");
        }

        let access = self.issue_access();
        respond(200, &json!({ "access": access }))
    }

    // ===== Meters =====

    fn find_gasometer(&self, id: i64) -> Option<&Gasometer> {
        self.gasometers.iter().find(|g| g.id == id)
    }

    fn identifier_taken(&self, identificador: &str, except: Option<i64>) -> bool {
        self.gasometers
            .iter()
            .any(|g| Some(g.id) != except && g.identificador.eq_ignore_ascii_case(identificador.trim()))
    }

    fn list_gasometers(&self, request: &ApiRequest) -> ApiResponse {
        let status = request.query_value("status").and_then(GasometerStatus::parse);
        let location = request.query_value("localizacao");
        let search = request.query_value("search");
        let start = request.query_value("start_date");
        let end = request.query_value("end_date");

        let items: Vec<Gasometer> = self
            .gasometers
            .iter()
            .filter(|g| status.map_or(true, |s| g.status == s))
            .filter(|g| location.map_or(true, |l| g.localizacao.eq_ignore_ascii_case(l)))
            .filter(|g| {
                search.map_or(true, |s| {
                    contains_ci(&g.identificador, s) || contains_ci(&g.descricao, s) || contains_ci(&g.localizacao, s)
                })
            })
            .filter(|g| in_range(day_of(&g.created_at), start, end))
            .cloned()
            .collect();

        paginate(&items, request)
    }

    fn locations(&self) -> ApiResponse {
        let locations: BTreeSet<&str> = self.gasometers.iter().map(|g| g.localizacao.as_str()).collect();
        respond(200, &locations)
    }

    fn create_gasometer(&mut self, request: &ApiRequest) -> ApiResponse {
        let form: GasometerForm = match parse_body(request) {
            Ok(f) => f,
            Err(response) => return response,
        };

        if self.identifier_taken(&form.identificador, None) {
            return bad_request("J\u{00E1} existe um gas\u{00F4}metro com este identificador");
        }

        let at = now();
        let gasometer = Gasometer {
            id: self.next_id(),
            identificador: form.identificador.trim().to_string(),
            descricao: form.descricao,
            localizacao: form.localizacao,
            status: form.status,
            created_at: at.clone(),
            updated_at: at,
        };
        self.gasometers.push(gasometer.clone());
        respond(201, &gasometer)
    }

    fn gasometer(&mut self, method: Method, id: i64, request: &ApiRequest) -> ApiResponse {
        let Some(index) = self.gasometers.iter().position(|g| g.id == id) else {
            return not_found();
        };

        match method {
            Method::Get => respond(200, &self.gasometers[index]),
            Method::Patch => {
                let patch: GasometerPatch = match parse_body(request) {
                    Ok(p) => p,
                    Err(response) => return response,
                };
                if let Some(ident) = &patch.identificador {
                    if self.identifier_taken(ident, Some(id)) {
                        return bad_request("J\u{00E1} existe um gas\u{00F4}metro com este identificador");
                    }
                }

                let gasometer = &mut self.gasometers[index];
                if let Some(v) = patch.identificador {
                    gasometer.identificador = v.trim().to_string();
                }
                if let Some(v) = patch.descricao {
                    gasometer.descricao = v;
                }
                if let Some(v) = patch.localizacao {
                    gasometer.localizacao = v;
                }
                if let Some(v) = patch.status {
                    gasometer.status = v;
                }
                gasometer.updated_at = now();
                respond(200, &self.gasometers[index])
            }
            Method::Delete => {
                self.gasometers.remove(index);
                self.readings.retain(|r| r.gasometro != id);
                self.alerts.retain(|a| a.gasometro != id);
                ApiResponse::empty(204)
            }
            Method::Post => not_found(),
        }
    }

    // ===== Readings =====

    fn with_gasometer(&self, reading: &Reading) -> Reading {
        let mut reading = reading.clone();
        reading.gasometro_data = self.find_gasometer(reading.gasometro).cloned();
        reading
    }

    /// Readings of one meter (or all), newest first
    fn sorted_readings(&self, gasometro: Option<i64>) -> Vec<&Reading> {
        let mut readings: Vec<&Reading> = self
            .readings
            .iter()
            .filter(|r| gasometro.map_or(true, |g| r.gasometro == g))
            .collect();
        readings.sort_by(|a, b| {
            parse_timestamp(&b.data_leitura)
                .cmp(&parse_timestamp(&a.data_leitura))
                .then(b.id.cmp(&a.id))
        });
        readings
    }

    fn filtered_readings(&self, request: &ApiRequest) -> Vec<&Reading> {
        let gasometro = request.query_value("gasometro").and_then(|g| g.parse::<i64>().ok());
        let start = request.query_value("start_date");
        let end = request.query_value("end_date");
        let search = request.query_value("search");

        self.sorted_readings(gasometro)
            .into_iter()
            .filter(|r| in_range(day_of(&r.data_leitura), start, end))
            .filter(|r| {
                search.map_or(true, |s| {
                    r.observacao.as_deref().is_some_and(|o| contains_ci(o, s))
                        || self.find_gasometer(r.gasometro).is_some_and(|g| contains_ci(&g.identificador, s))
                })
            })
            .collect()
    }

    fn list_readings(&self, request: &ApiRequest) -> ApiResponse {
        let items: Vec<Reading> = self
            .filtered_readings(request)
            .into_iter()
            .map(|r| self.with_gasometer(r))
            .collect();
        paginate(&items, request)
    }

    fn readings_by_gasometer(&self, id: i64, request: &ApiRequest) -> ApiResponse {
        let limit = request
            .query_value("limit")
            .and_then(|l| l.parse::<usize>().ok())
            .unwrap_or(DEFAULT_BY_GASOMETER_LIMIT);

        let items: Vec<Reading> = self
            .sorted_readings(Some(id))
            .into_iter()
            .take(limit)
            .map(|r| self.with_gasometer(r))
            .collect();
        respond(200, &items)
    }

    fn create_reading(&mut self, request: &ApiRequest) -> ApiResponse {
        let form: ReadingForm = match parse_body(request) {
            Ok(f) => f,
            Err(response) => return response,
        };

        if self.find_gasometer(form.gasometro).is_none() {
            return bad_request("Gas\u{00F4}metro n\u{00E3}o encontrado");
        }
        if form.consumo < 0.0 || !form.consumo.is_finite() {
            return bad_request("Consumo n\u{00E3}o pode ser negativo");
        }
        if parse_timestamp(&form.data_leitura).is_none() {
            return bad_request("Data da leitura inv\u{00E1}lida");
        }

        let previous: Vec<f64> = self
            .sorted_readings(Some(form.gasometro))
            .into_iter()
            .take(SPIKE_WINDOW)
            .map(|r| r.consumo)
            .collect();

        let at = now();
        let reading = Reading {
            id: self.next_id(),
            gasometro: form.gasometro,
            gasometro_data: None,
            data_leitura: form.data_leitura,
            consumo: form.consumo,
            observacao: form.observacao,
            created_at: Some(at.clone()),
            updated_at: Some(at),
        };
        self.readings.push(reading.clone());
        self.raise_alerts(&reading, &previous);

        respond(201, &self.with_gasometer(&reading))
    }

    /// Server-side anomaly detection for a freshly recorded reading
    fn raise_alerts(&mut self, reading: &Reading, previous: &[f64]) {
        let alert = if reading.consumo == 0.0 {
            Some((AlertType::ConsumoZero, "Leitura registrada com consumo zero".to_string()))
        } else if !previous.is_empty() {
            let average = previous.iter().sum::<f64>() / previous.len() as f64;
            (reading.consumo > average * SPIKE_FACTOR).then(|| {
                (
                    AlertType::PicoConsumo,
                    format!(
                        "Consumo acima de {:.0}% da m\u{00E9}dia das \u{00FA}ltimas {} leituras",
                        SPIKE_FACTOR * 100.0,
                        previous.len()
                    ),
                )
            })
        } else {
            None
        };

        if let Some((tipo, mensagem)) = alert {
            let at = now();
            let id = self.next_id();
            log::debug!("mock raised {} alert for meter {}", tipo, reading.gasometro);
            self.alerts.push(Alert {
                id,
                tipo,
                gasometro: reading.gasometro,
                gasometro_data: None,
                status: AlertStatus::Novo,
                mensagem,
                criado_em: at.clone(),
                atualizado_em: Some(at),
            });
        }
    }

    fn reading(&mut self, method: Method, id: i64, request: &ApiRequest) -> ApiResponse {
        let Some(index) = self.readings.iter().position(|r| r.id == id) else {
            return not_found();
        };

        match method {
            Method::Get => respond(200, &self.with_gasometer(&self.readings[index])),
            Method::Patch => {
                let patch: ReadingPatch = match parse_body(request) {
                    Ok(p) => p,
                    Err(response) => return response,
                };
                if patch.consumo.is_some_and(|c| c < 0.0) {
                    return bad_request("Consumo n\u{00E3}o pode ser negativo");
                }
                if patch.gasometro.is_some_and(|g| self.find_gasometer(g).is_none()) {
                    return bad_request("Gas\u{00F4}metro n\u{00E3}o encontrado");
                }

                let reading = &mut self.readings[index];
                if let Some(v) = patch.gasometro {
                    reading.gasometro = v;
                }
                if let Some(v) = patch.data_leitura {
                    reading.data_leitura = v;
                }
                if let Some(v) = patch.consumo {
                    reading.consumo = v;
                }
                if let Some(v) = patch.observacao {
                    reading.observacao = Some(v);
                }
                reading.updated_at = Some(now());
                respond(200, &self.with_gasometer(&self.readings[index]))
            }
            Method::Delete => {
                self.readings.remove(index);
                ApiResponse::empty(204)
            }
            Method::Post => not_found(),
        }
    }

    fn export_readings(&self, request: &ApiRequest) -> ApiResponse {
        let readings = self.filtered_readings(request);
        let rows: Vec<ExportRow> = readings
            .iter()
            .map(|r| ExportRow {
                id: r.id,
                gasometro: self
                    .find_gasometer(r.gasometro)
                    .map(|g| g.identificador.as_str())
                    .unwrap_or_default(),
                data_leitura: &r.data_leitura,
                consumo: r.consumo,
                observacao: r.observacao.as_deref().unwrap_or_default(),
            })
            .collect();

        match to_records(&rows) {
            Ok(records) => ApiResponse {
                status: 200,
                body: to_csv(&records).unwrap_or_default().into_bytes(),
            },
            Err(e) => ApiResponse::json(500, &json!({ "detail": e.to_string() })),
        }
    }

    // ===== Alerts =====

    fn with_alert_gasometer(&self, alert: &Alert) -> Alert {
        let mut alert = alert.clone();
        alert.gasometro_data = self.find_gasometer(alert.gasometro).cloned();
        alert
    }

    fn list_alerts(&self, request: &ApiRequest) -> ApiResponse {
        let status = request.query_value("status").and_then(AlertStatus::parse);
        let tipo = request.query_value("tipo").and_then(AlertType::parse);
        let gasometro = request.query_value("gasometro").and_then(|g| g.parse::<i64>().ok());

        let mut items: Vec<Alert> = self
            .alerts
            .iter()
            .filter(|a| status.map_or(true, |s| a.status == s))
            .filter(|a| tipo.map_or(true, |t| a.tipo == t))
            .filter(|a| gasometro.map_or(true, |g| a.gasometro == g))
            .map(|a| self.with_alert_gasometer(a))
            .collect();
        items.sort_by(|a, b| b.criado_em.cmp(&a.criado_em).then(b.id.cmp(&a.id)));

        paginate(&items, request)
    }

    fn alert_stats(&self) -> ApiResponse {
        let count = |status: AlertStatus| self.alerts.iter().filter(|a| a.status == status).count() as u64;
        respond(
            200,
            &AlertStats {
                total: self.alerts.len() as u64,
                novo: count(AlertStatus::Novo),
                em_analise: count(AlertStatus::EmAnalise),
                resolvido: count(AlertStatus::Resolvido),
            },
        )
    }

    fn alert(&mut self, method: Method, id: i64, request: &ApiRequest) -> ApiResponse {
        let Some(index) = self.alerts.iter().position(|a| a.id == id) else {
            return not_found();
        };

        match method {
            Method::Get => respond(200, &self.with_alert_gasometer(&self.alerts[index])),
            Method::Patch => {
                let body: StatusBody = match parse_body(request) {
                    Ok(b) => b,
                    Err(response) => return response,
                };
                let alert = &mut self.alerts[index];
                alert.status = body.status;
                alert.atualizado_em = Some(now());
                respond(200, &self.with_alert_gasometer(&self.alerts[index]))
            }
            Method::Delete => {
                self.alerts.remove(index);
                ApiResponse::empty(204)
            }
            Method::Post => not_found(),
        }
    }

    // ===== Dashboard =====

    fn period_readings(&self, request: &ApiRequest) -> Vec<&Reading> {
        let gasometro = request.query_value("gasometro").and_then(|g| g.parse::<i64>().ok());
        let start = request.query_value("start_date");
        let end = request.query_value("end_date");

        self.readings
            .iter()
            .filter(|r| gasometro.map_or(true, |g| r.gasometro == g))
            .filter(|r| in_range(day_of(&r.data_leitura), start, end))
            .collect()
    }

    fn daily_totals(readings: &[&Reading]) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for r in readings {
            *totals.entry(day_of(&r.data_leitura).to_string()).or_insert(0.0) += r.consumo;
        }
        totals
    }

    fn dashboard_stats(&self, request: &ApiRequest) -> ApiResponse {
        let readings = self.period_readings(request);
        let totals = Self::daily_totals(&readings);
        let average = if totals.is_empty() {
            0.0
        } else {
            totals.values().sum::<f64>() / totals.len() as f64
        };

        respond(
            200,
            &DashboardStats {
                total_gasometros: self.gasometers.len() as u64,
                total_leituras_periodo: readings.len() as u64,
                media_consumo_dia: (average * 100.0).round() / 100.0,
                alertas_ativos: self.alerts.iter().filter(|a| a.status != AlertStatus::Resolvido).count() as u64,
            },
        )
    }

    fn dashboard_consumption(&self, request: &ApiRequest) -> ApiResponse {
        let label = request
            .query_value("gasometro")
            .and_then(|g| g.parse::<i64>().ok())
            .and_then(|g| self.find_gasometer(g))
            .map(|g| g.identificador.clone());

        let points: Vec<ConsumptionPoint> = Self::daily_totals(&self.period_readings(request))
            .into_iter()
            .map(|(date, consumo)| ConsumptionPoint {
                date,
                consumo: (consumo * 100.0).round() / 100.0,
                gasometro: label.clone(),
            })
            .collect();
        respond(200, &points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn call(transport: &MockTransport, request: ApiRequest) -> (u16, Value) {
        let response = transport.send(&request).await.unwrap();
        let body = if response.body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&response.body).unwrap_or(Value::Null)
        };
        (response.status, body)
    }

    async fn login(transport: &MockTransport) -> String {
        let (status, body) = call(
            transport,
            ApiRequest::new(Method::Post, "/auth/login/")
                .with_body(json!({"username": "admin", "password": "admin123"})),
        )
        .await;
        assert_eq!(status, 200);
        body["access"].as_str().unwrap().to_string()
    }

    fn authed(method: Method, path: &str, token: &str) -> ApiRequest {
        let mut request = ApiRequest::new(method, path);
        request.bearer = Some(token.to_string());
        request
    }

    #[tokio::test]
    async fn test_requires_issued_token() {
        let transport = MockTransport::new();
        let (status, _) = call(&transport, ApiRequest::new(Method::Get, "/gasometers/")).await;
        assert_eq!(status, 401);

        let token = login(&transport).await;
        let (status, body) = call(&transport, authed(Method::Get, "/gasometers/", &token)).await;
        assert_eq!(status, 200);
        assert_eq!(body["count"], 3);

        transport.expire_access_tokens();
        let (status, _) = call(&transport, authed(Method::Get, "/gasometers/", &token)).await;
        assert_eq!(status, 401);
    }

    #[tokio::test]
    async fn test_login_rejects_blank_credentials() {
        let transport = MockTransport::new();
        let (status, body) = call(
            &transport,
            ApiRequest::new(Method::Post, "/auth/login/").with_body(json!({"username": " ", "password": "x"})),
        )
        .await;
        assert_eq!(status, 401);
        assert_eq!(body["detail"], "Credenciais inv\u{00E1}lidas");
    }

    #[tokio::test]
    async fn test_gasometer_filters_and_locations() {
        let transport = MockTransport::new().without_auth();

        let request = ApiRequest::new(Method::Get, "/gasometers/")
            .with_query(vec![("status".into(), "ativo".into()), ("search".into(), "secund".into())]);
        let (_, body) = call(&transport, request).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"][0]["identificador"], "GM-AC-002");

        let (_, body) = call(&transport, ApiRequest::new(Method::Get, "/gasometers/locations/")).await;
        assert_eq!(body, json!(["Bloco A", "Bloco B", "Bloco C"]));
    }

    #[tokio::test]
    async fn test_duplicate_identifier_rejected() {
        let transport = MockTransport::new().without_auth();
        let request = ApiRequest::new(Method::Post, "/gasometers/").with_body(json!({
            "identificador": "gm-ac-001",
            "descricao": "Outro",
            "localizacao": "Bloco D",
            "status": "ativo"
        }));
        let (status, body) = call(&transport, request).await;
        assert_eq!(status, 400);
        assert!(body["message"].as_str().unwrap().contains("identificador"));
    }

    #[tokio::test]
    async fn test_by_gasometer_is_newest_first_and_limited() {
        let transport = MockTransport::new().without_auth();
        let request = ApiRequest::new(Method::Get, "/readings/by-gasometer/1/")
            .with_query(vec![("limit".into(), "1".into())]);
        let (_, body) = call(&transport, request).await;

        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["consumo"], 15.67);
        assert_eq!(items[0]["gasometro_data"]["identificador"], "GM-AC-001");
    }

    #[tokio::test]
    async fn test_spike_reading_raises_alert() {
        let transport = MockTransport::new().without_auth();
        let request = ApiRequest::new(Method::Post, "/readings/").with_body(json!({
            "gasometro": 2,
            "data_leitura": "2024-01-22T09:00:00Z",
            "consumo": 40.0
        }));
        let (status, _) = call(&transport, request).await;
        assert_eq!(status, 201);

        let request = ApiRequest::new(Method::Get, "/alerts/")
            .with_query(vec![("gasometro".into(), "2".into()), ("tipo".into(), "pico_consumo".into())]);
        let (_, body) = call(&transport, request).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"][0]["status"], "novo");
    }

    #[tokio::test]
    async fn test_alert_status_update_and_stats() {
        let transport = MockTransport::new().without_auth();
        let request = ApiRequest::new(Method::Patch, "/alerts/1/").with_body(json!({"status": "resolvido"}));
        let (status, body) = call(&transport, request).await;
        assert_eq!(status, 200);
        assert_eq!(body["status"], "resolvido");

        let (_, stats) = call(&transport, ApiRequest::new(Method::Get, "/alerts/stats/")).await;
        assert_eq!(stats, json!({"total": 2, "novo": 0, "em_analise": 1, "resolvido": 1}));
    }

    #[tokio::test]
    async fn test_dashboard_aggregates_by_day() {
        let transport = MockTransport::new().without_auth();

        let (_, stats) = call(&transport, ApiRequest::new(Method::Get, "/dashboard/stats/")).await;
        assert_eq!(stats["total_gasometros"], 3);
        assert_eq!(stats["total_leituras_periodo"], 3);
        assert_eq!(stats["alertas_ativos"], 2);

        let request = ApiRequest::new(Method::Get, "/dashboard/stats/")
            .with_query(vec![("end_date".into(), "2024-01-20".into())]);
        let (_, stats) = call(&transport, request).await;
        assert_eq!(stats["total_leituras_periodo"], 2);
        assert_eq!(stats["media_consumo_dia"], 21.24);

        let request = ApiRequest::new(Method::Get, "/dashboard/consumption/")
            .with_query(vec![("start_date".into(), "2024-01-21".into())]);
        let (_, points) = call(&transport, request).await;
        assert_eq!(points, json!([{"date": "2024-01-21", "consumo": 15.67}]));
    }

    #[tokio::test]
    async fn test_server_export_is_csv() {
        let transport = MockTransport::new().without_auth();
        let request = ApiRequest::new(Method::Get, "/readings/export/")
            .with_query(vec![("gasometro".into(), "2".into())]);
        let response = transport.send(&request).await.unwrap();

        assert_eq!(
            String::from_utf8(response.body).unwrap(),
            "id,gasometro,data_leitura,consumo,observacao\n3,GM-AC-002,2024-01-20T10:00:00Z,8.9,Leitura mensal"
        );
    }

    #[tokio::test]
    async fn test_delete_and_not_found() {
        let transport = MockTransport::new().without_auth();
        let (status, _) = call(&transport, ApiRequest::new(Method::Delete, "/readings/3/")).await;
        assert_eq!(status, 204);
        let (status, body) = call(&transport, ApiRequest::new(Method::Get, "/readings/3/")).await;
        assert_eq!(status, 404);
        assert_eq!(body["detail"], "N\u{00E3}o encontrado.");
        let (status, _) = call(&transport, ApiRequest::new(Method::Get, "/nowhere/")).await;
        assert_eq!(status, 404);
    }
}
