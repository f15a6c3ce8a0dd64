//! Command handlers
//!
//! Every user action of the console as a plain async function over
//! [`AppState`]. Front ends (the CLI, the demo) bind these and render the
//! results; nothing here prints.
//!
//! Failures come back as a [`CommandError`]:
//! - `Validation`: field rules rejected the input, nothing was sent
//! - `Notify`: the API or the network failed; show the message
//! - `LoginRequired`: the session expired and was cleared

use crate::api::ApiClient;
use crate::core::{
    Alert, AlertFilter, AlertStats, AlertStatus, Config, ConsumptionPoint, DashboardStats, DateFilter, Error,
    Gasometer, GasometerFilter, GasometerForm, GasometerPatch, LoginCredentials, Page, Reading, ReadingFilter,
    ReadingForm, ReadingPatch, User,
};
use crate::db::LocalStorage;
use crate::export::{export_records, to_csv, Download, DownloadSink, FileDownloadSink, Record, CSV_MIME};
use crate::format::format_date_time;
use crate::i18n::I18n;
use crate::session::SessionStore;
use crate::validation::{
    validate_gasometer_form, validate_reading_form, ConsumptionValidator, FieldError, ValidationResult,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Failure of a command, already in user-facing terms
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("{}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    Notify(String),

    #[error("{0}")]
    LoginRequired(String),
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// A successful mutation and the notification to show for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Done<T> {
    pub value: T,
    pub notice: String,
}

/// A created reading plus the advisory consumption warnings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisteredReading {
    pub reading: Reading,
    pub warnings: Vec<String>,
}

/// Dashboard summary and consumption series for one period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub stats: DashboardStats,
    pub series: Vec<ConsumptionPoint>,
}

/// State shared by all commands
pub struct AppState {
    pub config: Config,
    pub i18n: I18n,
    pub session: Arc<SessionStore>,
    pub client: ApiClient,
    pub downloads: Mutex<Box<dyn DownloadSink + Send>>,
}

impl AppState {
    pub fn new(config: Config, client: ApiClient, downloads: Box<dyn DownloadSink + Send>) -> Self {
        Self {
            i18n: I18n::new(&config.general.language),
            session: client.session().clone(),
            config,
            client,
            downloads: Mutex::new(downloads),
        }
    }

    /// Wire everything from configuration and restore a persisted session
    pub fn from_config(config: Config) -> crate::core::Result<Self> {
        let session = Arc::new(SessionStore::new(LocalStorage::new()?));
        if let Err(e) = session.restore() {
            log::warn!("Failed to restore session: {}", e);
        }

        let client = ApiClient::from_config(&config.api, session)?;
        let downloads = FileDownloadSink::new(config.export.resolve_directory());
        log::info!("Downloads go to {}", downloads.directory().display());

        Ok(Self::new(config, client, Box::new(downloads)))
    }

    fn fail(&self, error: Error) -> CommandError {
        match error {
            Error::SessionExpired => CommandError::LoginRequired(self.i18n.get("notify.session_expired")),
            Error::Api { message, .. } => CommandError::Notify(message),
            Error::Http(e) => {
                log::warn!("Request failed: {}", e);
                CommandError::Notify(e.to_string())
            }
            other => {
                log::error!("Unexpected failure: {}", other);
                CommandError::Notify(self.i18n.get("notify.unexpected_error"))
            }
        }
    }

    fn done<T>(&self, value: T, notice_key: &str) -> Done<T> {
        Done {
            value,
            notice: self.i18n.get(notice_key),
        }
    }

    async fn save_download(&self, download: Download) -> CommandResult<()> {
        let filename = download.filename.clone();
        self.downloads.lock().await.save(download).map_err(|e| {
            log::warn!("Failed to save {}: {}", filename, e);
            CommandError::Notify(self.i18n.get("notify.export_failed"))
        })
    }
}

// ===== Session =====

pub async fn login(state: &AppState, credentials: LoginCredentials) -> CommandResult<Done<User>> {
    if credentials.username.trim().is_empty() || credentials.password.is_empty() {
        let reason = state.i18n.get("notify.invalid_credentials");
        return Err(CommandError::Notify(
            state.i18n.format("notify.login_failed", &[("reason", &reason)]),
        ));
    }

    let auth = state.client.auth().login(&credentials).await.map_err(|e| {
        let reason = match e {
            Error::Api { message, .. } => message,
            other => other.to_string(),
        };
        CommandError::Notify(state.i18n.format("notify.login_failed", &[("reason", &reason)]))
    })?;

    let user = auth.user.clone();
    state.session.login(auth).map_err(|e| state.fail(e))?;
    Ok(state.done(user, "notify.login_success"))
}

/// Sign out locally. Always succeeds from the user's point of view.
pub async fn logout(state: &AppState) -> String {
    if let Err(e) = state.session.logout() {
        log::warn!("Failed to clear stored session: {}", e);
    }
    state.i18n.get("notify.logout_success")
}

pub fn current_user(state: &AppState) -> Option<User> {
    state.session.current().map(|s| s.user)
}

// ===== Meters =====

pub async fn list_gasometers(state: &AppState, page: u32, filter: &GasometerFilter) -> CommandResult<Page<Gasometer>> {
    state.client.gasometers().list(page, filter).await.map_err(|e| state.fail(e))
}

pub async fn create_gasometer(state: &AppState, form: GasometerForm) -> CommandResult<Done<Gasometer>> {
    validate_gasometer_form(&state.i18n, &form).map_err(CommandError::Validation)?;

    let created = state.client.gasometers().create(&form).await.map_err(|e| state.fail(e))?;
    log::info!("Created meter {}", created.identificador);
    Ok(state.done(created, "notify.gasometer_created"))
}

/// Apply a partial update; the merged meter must still pass the form rules
pub async fn update_gasometer(state: &AppState, id: i64, patch: GasometerPatch) -> CommandResult<Done<Gasometer>> {
    let service = state.client.gasometers();
    let current = service.get(id).await.map_err(|e| state.fail(e))?;

    let merged = GasometerForm {
        identificador: patch.identificador.clone().unwrap_or(current.identificador),
        descricao: patch.descricao.clone().unwrap_or(current.descricao),
        localizacao: patch.localizacao.clone().unwrap_or(current.localizacao),
        status: patch.status.unwrap_or(current.status),
    };
    validate_gasometer_form(&state.i18n, &merged).map_err(CommandError::Validation)?;

    let updated = service.update(id, &patch).await.map_err(|e| state.fail(e))?;
    Ok(state.done(updated, "notify.gasometer_updated"))
}

pub async fn delete_gasometer(state: &AppState, id: i64) -> CommandResult<String> {
    state.client.gasometers().delete(id).await.map_err(|e| state.fail(e))?;
    Ok(state.i18n.get("notify.gasometer_deleted"))
}

pub async fn locations(state: &AppState) -> CommandResult<Vec<String>> {
    state.client.gasometers().locations().await.map_err(|e| state.fail(e))
}

// ===== Readings =====

pub async fn list_readings(state: &AppState, page: u32, filter: &ReadingFilter) -> CommandResult<Page<Reading>> {
    state.client.readings().list(page, filter).await.map_err(|e| state.fail(e))
}

async fn consumption_history(state: &AppState, gasometro: i64) -> crate::core::Result<Vec<f64>> {
    if gasometro < 1 {
        return Ok(Vec::new());
    }
    let recent = state
        .client
        .readings()
        .by_gasometer(gasometro, state.config.readings.history_limit)
        .await?;
    Ok(recent.iter().map(|r| r.consumo).collect())
}

/// Check a candidate value against the meter's most recent readings
pub async fn check_consumption(state: &AppState, gasometro: i64, value: f64) -> CommandResult<ValidationResult> {
    let history = consumption_history(state, gasometro).await.map_err(|e| state.fail(e))?;
    Ok(ConsumptionValidator::new(&state.i18n).validate(value, &history))
}

/// Validate and create a reading. Spike warnings are advisory and never
/// block the submission.
pub async fn register_reading(state: &AppState, form: ReadingForm) -> CommandResult<Done<RegisteredReading>> {
    validate_reading_form(&state.i18n, &form, Utc::now()).map_err(CommandError::Validation)?;

    let history = match consumption_history(state, form.gasometro).await {
        Ok(history) => history,
        Err(Error::SessionExpired) => return Err(state.fail(Error::SessionExpired)),
        Err(e) => {
            log::warn!("Could not load history for meter {}: {}", form.gasometro, e);
            Vec::new()
        }
    };
    let check = ConsumptionValidator::new(&state.i18n).validate(form.consumo, &history);
    if !check.is_valid {
        let errors = check
            .warnings
            .into_iter()
            .map(|message| FieldError {
                field: "consumo".to_string(),
                message,
            })
            .collect();
        return Err(CommandError::Validation(errors));
    }

    let reading = state.client.readings().create(&form).await.map_err(|e| state.fail(e))?;
    log::info!("Registered reading {} for meter {}", reading.id, reading.gasometro);

    let registered = RegisteredReading {
        reading,
        warnings: check.warnings,
    };
    Ok(state.done(registered, "notify.reading_created"))
}

/// Apply a partial update; the merged reading must still pass the form rules
pub async fn update_reading(state: &AppState, id: i64, patch: ReadingPatch) -> CommandResult<Done<Reading>> {
    let service = state.client.readings();
    let current = service.get(id).await.map_err(|e| state.fail(e))?;

    let merged = ReadingForm {
        gasometro: patch.gasometro.unwrap_or(current.gasometro),
        data_leitura: patch.data_leitura.clone().unwrap_or(current.data_leitura),
        consumo: patch.consumo.unwrap_or(current.consumo),
        observacao: patch.observacao.clone().or(current.observacao),
    };
    validate_reading_form(&state.i18n, &merged, Utc::now()).map_err(CommandError::Validation)?;

    let updated = service.update(id, &patch).await.map_err(|e| state.fail(e))?;
    Ok(state.done(updated, "notify.reading_updated"))
}

pub async fn delete_reading(state: &AppState, id: i64) -> CommandResult<String> {
    state.client.readings().delete(id).await.map_err(|e| state.fail(e))?;
    Ok(state.i18n.get("notify.reading_deleted"))
}

fn export_stem(i18n: &I18n) -> String {
    format!("{}-{}", i18n.get("export.readings_stem"), Utc::now().format("%Y-%m-%d"))
}

/// Rows of the readings page export, with localized column names
pub fn reading_records(i18n: &I18n, readings: &[Reading]) -> Vec<Record> {
    let header = |key: &str| i18n.get(&format!("export.header.{}", key));

    readings
        .iter()
        .map(|r| {
            let gasometro = match &r.gasometro_data {
                Some(g) => json!(g.identificador),
                None => json!(r.gasometro),
            };
            let created = r
                .created_at
                .as_deref()
                .map(|at| format_date_time(i18n, at))
                .unwrap_or_default();

            let mut record = Record::new();
            record.insert(header("id"), json!(r.id));
            record.insert(header("gasometro"), gasometro);
            record.insert(header("data_leitura"), json!(format_date_time(i18n, r.data_leitura.as_str())));
            record.insert(header("consumo"), json!(r.consumo));
            record.insert(header("observacao"), json!(r.observacao.clone().unwrap_or_default()));
            record.insert(header("created_at"), json!(created));
            record
        })
        .collect()
}

/// Export the given (already listed) readings as CSV on the client.
///
/// Returns the notice, or `None` when there was nothing to export.
pub async fn export_readings_csv(state: &AppState, readings: &[Reading]) -> CommandResult<Option<String>> {
    if readings.is_empty() {
        return Ok(None);
    }

    let records = reading_records(&state.i18n, readings);
    let mut sink = state.downloads.lock().await;
    export_records(&records, &export_stem(&state.i18n), &mut **sink).map_err(|e| {
        log::warn!("Readings export failed: {}", e);
        CommandError::Notify(state.i18n.get("notify.export_failed"))
    })?;

    Ok(Some(state.i18n.get("notify.export_done")))
}

/// Ask the API for its export of the filtered readings and save it as-is
pub async fn download_readings_export(state: &AppState, filter: &ReadingFilter) -> CommandResult<String> {
    let bytes = state.client.readings().export(filter).await.map_err(|e| {
        log::warn!("Server export failed: {}", e);
        match e {
            Error::SessionExpired => state.fail(e),
            _ => CommandError::Notify(state.i18n.get("notify.export_failed")),
        }
    })?;

    let download = Download {
        filename: format!("{}.csv", export_stem(&state.i18n)),
        mime: CSV_MIME.to_string(),
        content: String::from_utf8_lossy(&bytes).into_owned(),
    };
    state.save_download(download).await?;
    Ok(state.i18n.get("notify.export_done"))
}

/// CSV text of the given readings without saving it anywhere
pub fn preview_readings_csv(state: &AppState, readings: &[Reading]) -> Option<String> {
    to_csv(&reading_records(&state.i18n, readings))
}

// ===== Alerts =====

pub async fn list_alerts(state: &AppState, page: u32, filter: &AlertFilter) -> CommandResult<Page<Alert>> {
    state.client.alerts().list(page, filter).await.map_err(|e| state.fail(e))
}

pub async fn update_alert_status(state: &AppState, id: i64, status: AlertStatus) -> CommandResult<Done<Alert>> {
    let alert = state
        .client
        .alerts()
        .update_status(id, status)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(state.done(alert, "notify.alert_updated"))
}

pub async fn delete_alert(state: &AppState, id: i64) -> CommandResult<String> {
    state.client.alerts().delete(id).await.map_err(|e| state.fail(e))?;
    Ok(state.i18n.get("notify.alert_deleted"))
}

pub async fn alert_stats(state: &AppState) -> CommandResult<AlertStats> {
    state.client.alerts().stats().await.map_err(|e| state.fail(e))
}

// ===== Dashboard =====

/// Summary and series for a period, fetched concurrently
pub async fn dashboard(state: &AppState, period: &DateFilter, gasometro: Option<i64>) -> CommandResult<DashboardView> {
    let service = state.client.dashboard();
    let (stats, series) = tokio::join!(service.stats(period), service.consumption(period, gasometro));

    Ok(DashboardView {
        stats: stats.map_err(|e| state.fail(e))?,
        series: series.map_err(|e| state.fail(e))?,
    })
}
