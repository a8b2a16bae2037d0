use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use weather_bar::{
    Collaborators, FreeGeoIpResolver, NoaaConditionsClient, NoaaStationList, Scheduler,
    SchedulerSettings, StationRouter, VERSION, WeatherBarConfig, WeatherBarError,
};

/// Current weather conditions for your status bar
#[derive(Parser, Debug)]
#[command(name = "weather-bar", version, about)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write diagnostics to stderr
    #[arg(short, long)]
    debug: bool,
}

fn init_logging(cli: &Cli, config: &WeatherBarConfig) {
    let fallback = if cli.debug {
        "debug"
    } else {
        config.logging.level.as_str()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn http_client(config: &WeatherBarConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .user_agent(format!("weather-bar/{VERSION}"))
        .build()
        .context("Failed to build HTTP client")
}

fn collaborators(config: &WeatherBarConfig, client: &reqwest::Client) -> Collaborators {
    let official = NoaaConditionsClient::new(client.clone(), config.weather.conditions_url.clone());

    Collaborators {
        geo: Arc::new(FreeGeoIpResolver::new(
            client.clone(),
            config.weather.geolocation_url.clone(),
        )),
        stations: Arc::new(NoaaStationList::from_config(client.clone(), config)),
        conditions: Arc::new(StationRouter::new(Arc::new(official))),
    }
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
        () = cancel.cancelled() => return,
    }

    cancel.cancel();
}

async fn run(cli: Cli) -> Result<()> {
    let config = WeatherBarConfig::load_from_path(cli.config.clone())?;
    init_logging(&cli, &config);
    info!("weather-bar {} starting", VERSION);

    let formatter = config.formatter();
    if !formatter.has_placeholders() {
        warn!(
            "Output template {:?} contains no placeholders; every line will be identical",
            formatter.template()
        );
    }

    let client = http_client(&config)?;
    let scheduler = Scheduler::new(
        SchedulerSettings::from_config(&config),
        collaborators(&config, &client),
        formatter,
        tokio::io::stdout(),
    );

    let signals = tokio::spawn(shutdown_signal(scheduler.cancellation_token()));
    let outcome = scheduler.run().await;
    signals.abort();

    outcome?;
    info!("Shut down cleanly");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<WeatherBarError>() {
                Some(weather_error) if weather_error.is_fatal_at_startup() => {
                    eprintln!("weather-bar: {}", weather_error.user_message());
                    eprintln!("weather-bar: {weather_error}");
                }
                _ => eprintln!("weather-bar: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
