use std::{process::ExitCode, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{CustomType, CustomUserError, Select, Text, validator::Validation};
use weather_core::{
    Config, ControllerSettings, FileLocationStore, GeolocationMode, Geolocator,
    HttpBackend, LocationStore, SystemClock, WeatherController,
    client::BackendSettings,
    location::geolocator_from_config,
    render,
    warnings::PanelState,
};

use crate::{interactive, prompt::PromptGeolocator};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather lookup client")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the backend endpoint and geolocation.
    Configure,

    /// Show weather for a place name or "<lat>, <lon>".
    Search {
        /// Location; several words are joined with spaces.
        location: Vec<String>,

        /// Expand the warning details.
        #[arg(long)]
        details: bool,
    },

    /// Show weather for the current location.
    Here {
        /// Expand the warning details.
        #[arg(long)]
        details: bool,

        /// Grant location permission without asking.
        #[arg(short, long)]
        yes: bool,
    },

    /// Make sure a current location is cached and print it.
    Locate {
        /// Grant location permission without asking.
        #[arg(short, long)]
        yes: bool,
    },

    /// Forget the cached current location.
    Forget,

    /// Search repeatedly from a prompt.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure => {
                configure()?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Search { location, details } => {
                let ctl = build_controller(&Config::load()?, false)?;
                ctl.submit_search(&location.join(" ")).await;
                Ok(print_view(&ctl, details))
            }
            Command::Here { details, yes } => {
                let ctl = build_controller(&Config::load()?, yes)?;
                ctl.use_current_location().await;
                Ok(print_view(&ctl, details))
            }
            Command::Locate { yes } => {
                let ctl = build_controller(&Config::load()?, yes)?;
                match ctl.bootstrap().await {
                    Ok(found) => {
                        let how = if found.was_cached() { "Cached" } else { "Acquired" };
                        println!("{how} location: {}", found.location());
                    }
                    Err(e) => {
                        let message = e.alert_message().unwrap_or("Location request failed.");
                        eprintln!("{message}");
                        return Ok(ExitCode::FAILURE);
                    }
                }
                Ok(ExitCode::SUCCESS)
            }
            Command::Forget => {
                let store = FileLocationStore::open_default()?;
                store
                    .clear()
                    .with_context(|| format!("Failed to update {}", store.path().display()))?;
                println!("Forgot cached location.");
                Ok(ExitCode::SUCCESS)
            }
            Command::Interactive => {
                let ctl = build_controller(&Config::load()?, false)?;
                interactive::run(Arc::new(ctl)).await?;
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Wire the controller to the configured backend, on-disk storage and geolocator.
pub fn build_controller(config: &Config, assume_permission: bool) -> anyhow::Result<WeatherController> {
    let backend = HttpBackend::new(BackendSettings::from_config(config))
        .context("Failed to create HTTP client")?;
    tracing::debug!(endpoint = backend.endpoint(), "Using weather backend");

    let store = FileLocationStore::open_default()?;

    let geolocator = geolocator_from_config(&config.geolocation)?;
    let geolocator: Arc<dyn Geolocator> = if assume_permission {
        geolocator
    } else {
        Arc::new(PromptGeolocator::new(geolocator))
    };

    Ok(WeatherController::new(
        Arc::new(backend),
        Arc::new(store),
        geolocator,
        Arc::new(SystemClock),
        ControllerSettings { geolocation_timeout: config.geolocation.timeout() },
    ))
}

/// Print the current view; alerts go to stderr. Fails when the view shows an error.
fn print_view(ctl: &WeatherController, details: bool) -> ExitCode {
    if details && ctl.snapshot().panel_state() == PanelState::Collapsed {
        ctl.toggle_warning_details();
    }

    let mut vm = ctl.snapshot();
    if let Some(alert) = vm.alert.take() {
        eprintln!("{alert}");
        ctl.acknowledge_alert();
    }

    print!("{}", render(&vm));

    if vm.error().is_some() || vm.result().is_none() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    config.endpoint = Text::new("Weather endpoint URL:")
        .with_default(&config.endpoint)
        .prompt()?;

    config.home_url = optional_text(
        "Home page URL for the CSRF cookie (empty to skip):",
        config.home_url.as_deref(),
    )?;

    config.cookie = optional_text("Cookie header (empty to skip):", config.cookie.as_deref())?;

    let modes = GeolocationMode::all().to_vec();
    let start = modes.iter().position(|m| *m == config.geolocation.mode).unwrap_or(0);
    config.geolocation.mode = Select::new("Geolocation source:", modes)
        .with_starting_cursor(start)
        .prompt()?;

    if config.geolocation.mode == GeolocationMode::Fixed {
        config.geolocation.latitude = Some(coordinate("Latitude:", config.geolocation.latitude, 90.0)?);
        config.geolocation.longitude =
            Some(coordinate("Longitude:", config.geolocation.longitude, 180.0)?);
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn optional_text(message: &str, current: Option<&str>) -> anyhow::Result<Option<String>> {
    let answer = Text::new(message).with_default(current.unwrap_or("")).prompt()?;
    let answer = answer.trim();
    Ok(if answer.is_empty() { None } else { Some(answer.to_string()) })
}

fn coordinate(message: &str, current: Option<f64>, limit: f64) -> anyhow::Result<f64> {
    let mut prompt = CustomType::<f64>::new(message)
        .with_error_message("Please enter a number")
        .with_validator(move |value: &f64| -> Result<Validation, CustomUserError> {
            if value.abs() <= limit {
                Ok(Validation::Valid)
            } else {
                Ok(Validation::Invalid(format!("Must be between -{limit} and {limit}").into()))
            }
        });
    if let Some(current) = current {
        prompt = prompt.with_default(current);
    }
    Ok(prompt.prompt()?)
}
