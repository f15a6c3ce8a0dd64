//! GasControl - Main entry point
//!
//! Command-line console for gas meter readings. Every subcommand maps to
//! one command handler; the session is kept in local storage between runs.

mod cli;

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use cli::{AlertCommands, Cli, Commands, MeterCommands, ReadingCommands, ReadingFilterArgs};
use gascontrol_lib::commands::{self, AppState, CommandError, CommandResult};
use gascontrol_lib::core::{
    Alert, AlertFilter, Config, Gasometer, GasometerFilter, GasometerForm, GasometerPatch, LoginCredentials, Page,
    Reading, ReadingFilter, ReadingForm, ReadingPatch,
};
use gascontrol_lib::format::{format_consumption, format_date_time, format_day};
use gascontrol_lib::i18n::I18n;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    log::info!("Starting GasControl v{}", env!("CARGO_PKG_VERSION"));

    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });
    cli.apply_to(&mut config);

    let state = AppState::from_config(config).context("failed to initialize local storage")?;
    log::info!("Backend: {}", state.client.transport_name());
    log::info!("Language: {}", state.i18n.current_language());

    match run(&state, cli.command).await {
        Ok(()) => Ok(()),
        Err(CommandError::Validation(errors)) => {
            for error in errors {
                eprintln!("  {}: {}", error.field, error.message);
            }
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

async fn run(state: &AppState, command: Commands) -> CommandResult<()> {
    let i18n = &state.i18n;

    match command {
        Commands::Login(args) => {
            let done = commands::login(
                state,
                LoginCredentials {
                    username: args.username,
                    password: args.password,
                },
            )
            .await?;
            println!("{}", done.notice);
        }
        Commands::Logout => println!("{}", commands::logout(state).await),
        Commands::Whoami => match commands::current_user(state) {
            Some(user) => println!("{} <{}> {} {}", user.username, user.email, user.first_name, user.last_name),
            None => println!("-"),
        },
        Commands::Meters(command) => run_meters(state, command).await?,
        Commands::Readings(command) => run_readings(state, command).await?,
        Commands::Alerts(command) => run_alerts(state, command).await?,
        Commands::Dashboard(args) => {
            let view = commands::dashboard(state, &args.period.to_filter(), args.meter).await?;
            let stats = &view.stats;
            println!("{:<32} {}", i18n.get("dashboard.total_gasometros"), stats.total_gasometros);
            println!("{:<32} {}", i18n.get("dashboard.total_leituras"), stats.total_leituras_periodo);
            println!("{:<32} {}", i18n.get("dashboard.media_consumo"), format_consumption(i18n, stats.media_consumo_dia));
            println!("{:<32} {}", i18n.get("dashboard.alertas_ativos"), stats.alertas_ativos);
            println!();
            for point in &view.series {
                println!("{:<12} {:>14}", format_day(i18n, point.date.as_str()), format_consumption(i18n, point.consumo));
            }
        }
    }
    Ok(())
}

async fn run_meters(state: &AppState, command: MeterCommands) -> CommandResult<()> {
    match command {
        MeterCommands::List { page, status, location, search, period } => {
            let filter = GasometerFilter {
                status,
                localizacao: location,
                search,
                dates: period.to_filter(),
            };
            let listing = commands::list_gasometers(state, page, &filter).await?;
            print_page(&listing, |g| print_gasometer(&state.i18n, g));
        }
        MeterCommands::Add { identifier, description, location, status } => {
            let form = GasometerForm {
                identificador: identifier,
                descricao: description,
                localizacao: location,
                status,
            };
            let done = commands::create_gasometer(state, form).await?;
            print_gasometer(&state.i18n, &done.value);
            println!("{}", done.notice);
        }
        MeterCommands::Update { id, identifier, description, location, status } => {
            let patch = GasometerPatch {
                identificador: identifier,
                descricao: description,
                localizacao: location,
                status,
            };
            let done = commands::update_gasometer(state, id, patch).await?;
            print_gasometer(&state.i18n, &done.value);
            println!("{}", done.notice);
        }
        MeterCommands::Delete { id } => println!("{}", commands::delete_gasometer(state, id).await?),
        MeterCommands::Locations => {
            for location in commands::locations(state).await? {
                println!("{}", location);
            }
        }
    }
    Ok(())
}

fn reading_filter(args: ReadingFilterArgs) -> ReadingFilter {
    ReadingFilter {
        gasometro: args.meter,
        search: args.search,
        dates: args.period.to_filter(),
    }
}

async fn run_readings(state: &AppState, command: ReadingCommands) -> CommandResult<()> {
    let i18n = &state.i18n;

    match command {
        ReadingCommands::List { page, filter } => {
            let listing = commands::list_readings(state, page, &reading_filter(filter)).await?;
            print_page(&listing, |r| print_reading(i18n, r));
        }
        ReadingCommands::Add { meter, value, at, note } => {
            let form = ReadingForm {
                gasometro: meter,
                data_leitura: at.unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
                consumo: value,
                observacao: note,
            };
            let done = commands::register_reading(state, form).await?;
            print_reading(i18n, &done.value.reading);
            for warning in &done.value.warnings {
                println!("! {}", warning);
            }
            println!("{}", done.notice);
        }
        ReadingCommands::Update { id, meter, value, at, note } => {
            let patch = ReadingPatch {
                gasometro: meter,
                data_leitura: at,
                consumo: value,
                observacao: note,
            };
            let done = commands::update_reading(state, id, patch).await?;
            print_reading(i18n, &done.value);
            println!("{}", done.notice);
        }
        ReadingCommands::Delete { id } => println!("{}", commands::delete_reading(state, id).await?),
        ReadingCommands::Check { meter, value } => {
            let check = commands::check_consumption(state, meter, value).await?;
            println!("{}", if check.is_valid { "ok" } else { "invalid" });
            for warning in &check.warnings {
                println!("! {}", warning);
            }
        }
        ReadingCommands::Export { page, filter, server, print } => {
            let filter = reading_filter(filter);
            if server {
                println!("{}", commands::download_readings_export(state, &filter).await?);
                return Ok(());
            }

            let listing = commands::list_readings(state, page, &filter).await?;
            if print {
                if let Some(csv) = commands::preview_readings_csv(state, &listing.results) {
                    println!("{}", csv);
                }
            } else if let Some(notice) = commands::export_readings_csv(state, &listing.results).await? {
                println!("{}", notice);
            }
        }
    }
    Ok(())
}

async fn run_alerts(state: &AppState, command: AlertCommands) -> CommandResult<()> {
    let i18n = &state.i18n;

    match command {
        AlertCommands::List { page, status, tipo, meter } => {
            let filter = AlertFilter {
                status,
                tipo,
                gasometro: meter,
            };
            let listing = commands::list_alerts(state, page, &filter).await?;
            print_page(&listing, |a| print_alert(i18n, a));
        }
        AlertCommands::SetStatus { id, status } => {
            let done = commands::update_alert_status(state, id, status).await?;
            print_alert(i18n, &done.value);
            println!("{}", done.notice);
        }
        AlertCommands::Delete { id } => println!("{}", commands::delete_alert(state, id).await?),
        AlertCommands::Stats => {
            let stats = commands::alert_stats(state).await?;
            println!("total       {}", stats.total);
            println!("{:<11} {}", i18n.get("alert.status.novo"), stats.novo);
            println!("{:<11} {}", i18n.get("alert.status.em_analise"), stats.em_analise);
            println!("{:<11} {}", i18n.get("alert.status.resolvido"), stats.resolvido);
        }
    }
    Ok(())
}

fn print_page<T>(page: &Page<T>, print: impl Fn(&T)) {
    for item in &page.results {
        print(item);
    }
    let more = if page.next.is_some() { " (+)" } else { "" };
    println!("-- {} / {}{}", page.results.len(), page.count, more);
}

fn print_gasometer(i18n: &I18n, g: &Gasometer) {
    println!(
        "#{:<4} {:<12} {:<14} {:<10} {}",
        g.id,
        g.identificador,
        i18n.get(&format!("gasometer.status.{}", g.status)),
        g.localizacao,
        g.descricao
    );
}

fn print_reading(i18n: &I18n, r: &Reading) {
    let meter = r
        .gasometro_data
        .as_ref()
        .map(|g| g.identificador.clone())
        .unwrap_or_else(|| r.gasometro.to_string());
    println!(
        "#{:<4} {:<12} {:<17} {:>14}  {}",
        r.id,
        meter,
        format_date_time(i18n, r.data_leitura.as_str()),
        format_consumption(i18n, r.consumo),
        r.observacao.as_deref().unwrap_or_default()
    );
}

fn print_alert(i18n: &I18n, a: &Alert) {
    let meter = a
        .gasometro_data
        .as_ref()
        .map(|g| g.identificador.clone())
        .unwrap_or_else(|| a.gasometro.to_string());
    println!(
        "#{:<4} {:<17} {:<12} {:<16} {:<12} {}",
        a.id,
        format_date_time(i18n, a.criado_em.as_str()),
        meter,
        i18n.get(&format!("alert.type.{}", a.tipo)),
        i18n.get(&format!("alert.status.{}", a.status)),
        a.mensagem
    );
}
