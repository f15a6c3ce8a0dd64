use clap::{Args, Parser, Subcommand};
use gascontrol_lib::core::{AlertStatus, AlertType, Config, DateFilter, GasometerStatus};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gascontrol", version, about = "Gas meter readings console")]
pub struct Cli {
    /// Interface language (pt, en, auto)
    #[arg(long, global = true)]
    pub lang: Option<String>,
    /// Use the built-in mock backend
    #[arg(long, global = true, default_value_t = false, conflicts_with = "api_url")]
    pub mock: bool,
    /// REST API base URL (disables the mock backend)
    #[arg(long, global = true)]
    pub api_url: Option<String>,
    /// Directory for exported files
    #[arg(long, global = true)]
    pub export_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Command-line flags win over the config file and environment
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(lang) = &self.lang {
            config.general.language = lang.clone();
        }
        if self.mock {
            config.api.mock_mode = true;
        }
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
            config.api.mock_mode = false;
        }
        if let Some(dir) = &self.export_dir {
            config.export.directory = Some(dir.clone());
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and keep the session for later commands
    Login(LoginArgs),
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Manage meters
    #[command(subcommand)]
    Meters(MeterCommands),
    /// Manage readings
    #[command(subcommand)]
    Readings(ReadingCommands),
    /// Review alerts
    #[command(subcommand)]
    Alerts(AlertCommands),
    /// Summary statistics and daily consumption
    Dashboard(DashboardArgs),
}

#[derive(Args)]
pub struct LoginArgs {
    #[arg(long, short)]
    pub username: String,
    #[arg(long, short)]
    pub password: String,
}

#[derive(Args, Clone)]
pub struct PeriodArgs {
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,
    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,
}

impl PeriodArgs {
    pub fn to_filter(&self) -> DateFilter {
        DateFilter {
            start_date: self.from.clone(),
            end_date: self.to.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum MeterCommands {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, value_parser = parse_gasometer_status)]
        status: Option<GasometerStatus>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[command(flatten)]
        period: PeriodArgs,
    },
    Add {
        #[arg(long)]
        identifier: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        location: String,
        #[arg(long, value_parser = parse_gasometer_status, default_value = "ativo")]
        status: GasometerStatus,
    },
    Update {
        id: i64,
        #[arg(long)]
        identifier: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long, value_parser = parse_gasometer_status)]
        status: Option<GasometerStatus>,
    },
    Delete {
        id: i64,
    },
    /// Distinct locations in use
    Locations,
}

#[derive(Args, Clone)]
pub struct ReadingFilterArgs {
    /// Meter id
    #[arg(long)]
    pub meter: Option<i64>,
    #[arg(long)]
    pub search: Option<String>,
    #[command(flatten)]
    pub period: PeriodArgs,
}

#[derive(Subcommand)]
pub enum ReadingCommands {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[command(flatten)]
        filter: ReadingFilterArgs,
    },
    Add {
        #[arg(long)]
        meter: i64,
        /// Consumption in m³
        #[arg(long, allow_negative_numbers = true)]
        value: f64,
        /// Measurement time (ISO-8601); defaults to now
        #[arg(long)]
        at: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    Update {
        id: i64,
        #[arg(long)]
        meter: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        value: Option<f64>,
        #[arg(long)]
        at: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    Delete {
        id: i64,
    },
    /// Check a value against the meter's recent readings without saving it
    Check {
        #[arg(long)]
        meter: i64,
        #[arg(long, allow_negative_numbers = true)]
        value: f64,
    },
    /// Export readings as CSV
    Export {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[command(flatten)]
        filter: ReadingFilterArgs,
        /// Download the server-generated export instead of the listed page
        #[arg(long, default_value_t = false)]
        server: bool,
        /// Print the CSV instead of saving it
        #[arg(long, default_value_t = false, conflicts_with = "server")]
        print: bool,
    },
}

#[derive(Subcommand)]
pub enum AlertCommands {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, value_parser = parse_alert_status)]
        status: Option<AlertStatus>,
        #[arg(long = "type", value_parser = parse_alert_type)]
        tipo: Option<AlertType>,
        #[arg(long)]
        meter: Option<i64>,
    },
    SetStatus {
        id: i64,
        #[arg(value_parser = parse_alert_status)]
        status: AlertStatus,
    },
    Delete {
        id: i64,
    },
    Stats,
}

#[derive(Args)]
pub struct DashboardArgs {
    #[command(flatten)]
    pub period: PeriodArgs,
    /// Restrict the consumption series to one meter
    #[arg(long)]
    pub meter: Option<i64>,
}

fn parse_gasometer_status(s: &str) -> Result<GasometerStatus, String> {
    GasometerStatus::parse(s).ok_or_else(|| format!("expected ativo, inativo or manutencao, got '{}'", s))
}

fn parse_alert_status(s: &str) -> Result<AlertStatus, String> {
    AlertStatus::parse(s).ok_or_else(|| format!("expected novo, em_analise or resolvido, got '{}'", s))
}

fn parse_alert_type(s: &str) -> Result<AlertType, String> {
    AlertType::parse(s)
        .ok_or_else(|| format!("expected pico_consumo, medidor_inativo, falha_leitura or consumo_zero, got '{}'", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from(["gascontrol", "--lang", "en", "--api-url", "http://api.local/api", "whoami"]);
        let mut config = Config::default();
        cli.apply_to(&mut config);

        assert_eq!(config.general.language, "en");
        assert_eq!(config.api.base_url, "http://api.local/api");
        assert!(!config.api.mock_mode);
    }

    #[test]
    fn test_parses_nested_commands() {
        let cli = Cli::parse_from(["gascontrol", "readings", "add", "--meter", "2", "--value", "-3.5"]);
        match cli.command {
            Commands::Readings(ReadingCommands::Add { meter, value, at, .. }) => {
                assert_eq!(meter, 2);
                assert_eq!(value, -3.5);
                assert!(at.is_none());
            }
            _ => panic!("wrong command"),
        }

        assert!(Cli::try_parse_from(["gascontrol", "alerts", "set-status", "1", "closed"]).is_err());
    }
}
