//! GasControl - Demo CLI
//!
//! Scripted walk through the console against the built-in mock backend:
//! sign-in, meters, the consumption check, readings, alerts, CSV export and
//! the transparent token renewal. Nothing touches the network or the
//! user's stored session.

use std::sync::Arc;
use std::time::Duration;

use gascontrol_lib::api::{ApiClient, MockTransport};
use gascontrol_lib::commands::{self, AppState};
use gascontrol_lib::core::{
    AlertFilter, AlertStatus, Config, DateFilter, GasometerFilter, LoginCredentials, ReadingFilter, ReadingForm,
};
use gascontrol_lib::export::FileDownloadSink;
use gascontrol_lib::format::{format_consumption, format_date_time};
use gascontrol_lib::session::SessionStore;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("==============================================");
    println!("   GasControl - Demo CLI (mock backend)");
    println!("==============================================\n");

    let backend = Arc::new(MockTransport::new().with_latency(Duration::from_millis(150)));
    let session = Arc::new(SessionStore::in_memory()?);
    let client = ApiClient::new(Box::new(backend.clone()), session);

    let export_dir = std::env::temp_dir().join("gascontrol-demo");
    let state = AppState::new(Config::default(), client, Box::new(FileDownloadSink::new(&export_dir)));
    let i18n = &state.i18n;

    // 1. Sign in
    println!("[1/8] Signing in...");
    let done = commands::login(
        &state,
        LoginCredentials {
            username: "admin".to_string(),
            password: "admin123".to_string(),
        },
    )
    .await?;
    println!("      {} ({})\n", done.notice, done.value.email);

    // 2. Meters
    println!("[2/8] Meters");
    let meters = commands::list_gasometers(&state, 1, &GasometerFilter::default()).await?;
    for g in &meters.results {
        println!(
            "      {:<10} {:<30} {:<8} {}",
            g.identificador,
            g.descricao,
            g.localizacao,
            i18n.get(&format!("gasometer.status.{}", g.status))
        );
    }
    println!();

    // 3. Consumption check
    println!("[3/8] Checking candidate values for GM-AC-001...");
    for value in [14.0, 40.0, -2.0] {
        let check = commands::check_consumption(&state, 1, value).await?;
        let verdict = if check.is_valid { "valid" } else { "invalid" };
        println!("      {:>12} -> {} {:?}", format_consumption(i18n, value), verdict, check.warnings);
    }
    println!();

    // 4. Register a reading (raises a spike alert server-side)
    println!("[4/8] Registering a reading...");
    let done = commands::register_reading(
        &state,
        ReadingForm {
            gasometro: 1,
            data_leitura: chrono::Utc::now().to_rfc3339(),
            consumo: 40.0,
            observacao: Some("Leitura de teste".to_string()),
        },
    )
    .await?;
    println!(
        "      #{} {} {}",
        done.value.reading.id,
        format_date_time(i18n, done.value.reading.data_leitura.as_str()),
        format_consumption(i18n, done.value.reading.consumo)
    );
    for warning in &done.value.warnings {
        println!("      ! {}", warning);
    }
    println!("      {}\n", done.notice);

    // 5. Alerts
    println!("[5/8] Open alerts");
    let open = AlertFilter {
        status: Some(AlertStatus::Novo),
        ..Default::default()
    };
    let alerts = commands::list_alerts(&state, 1, &open).await?;
    for a in &alerts.results {
        println!("      #{} {}: {}", a.id, i18n.get(&format!("alert.type.{}", a.tipo)), a.mensagem);
    }
    if let Some(first) = alerts.results.first() {
        let done = commands::update_alert_status(&state, first.id, AlertStatus::Resolvido).await?;
        println!("      #{} -> {} ({})", first.id, done.value.status, done.notice);
    }
    let stats = commands::alert_stats(&state).await?;
    println!(
        "      total {} / novo {} / em_analise {} / resolvido {}\n",
        stats.total, stats.novo, stats.em_analise, stats.resolvido
    );

    // 6. Export
    println!("[6/8] Exporting readings to {}", export_dir.display());
    let readings = commands::list_readings(&state, 1, &ReadingFilter::default()).await?;
    if let Some(notice) = commands::export_readings_csv(&state, &readings.results).await? {
        println!("      {} ({} rows)\n", notice, readings.results.len());
    }

    // 7. Token renewal
    println!("[7/8] Expiring access tokens on the backend...");
    let before = state.session.access_token().unwrap_or_default();
    backend.expire_access_tokens();
    let view = commands::dashboard(&state, &DateFilter::default(), None).await?;
    let after = state.session.access_token().unwrap_or_default();
    println!("      token {} -> {}", before, after);
    println!(
        "      {} readings, {} per day\n",
        view.stats.total_leituras_periodo,
        format_consumption(i18n, view.stats.media_consumo_dia)
    );

    // 8. Sign out
    println!("[8/8] {}", commands::logout(&state).await);

    println!("\n==============================================");
    println!("   GasControl demo: CHECKPOINT PASSED");
    println!("==============================================\n");

    Ok(())
}
