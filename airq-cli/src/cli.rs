use airq_core::{
    Config, Dashboard,
    api::api_from_config,
    model::{RefreshOutcome, RefreshRequest},
};
use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use inquire::{Password, Select, Text};
use serde_json::json;
use tracing::debug;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "airq", version, about = "PM2.5 forecast dashboard")]
pub struct Cli {
    /// Override the prediction API base URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set the backend URL and refresh token.
    Configure,

    /// List monitoring stations.
    Stations {
        /// Only stations in this city.
        #[arg(long)]
        city: Option<String>,
    },

    /// Show the 24-hour forecast for a station.
    Station {
        /// Station identifier, e.g. "CPCB_Anand_Vihar_Delhi".
        station_id: String,
    },

    /// Show forecasts for every station of a city.
    City {
        /// City name as listed by `airq stations`.
        name: String,
    },

    /// Pick a city and station interactively.
    Pick,

    /// Check that the backend is up.
    Health,

    /// Ask the backend to pull fresh CPCB readings.
    Refresh {
        /// Wait for the fetch to finish instead of scheduling it.
        #[arg(long)]
        blocking: bool,

        /// Number of rows to request upstream (1-5000).
        #[arg(long, default_value_t = 1000)]
        limit: u32,

        /// Use this CPCB API key instead of the backend's own.
        #[arg(long)]
        api_key: Option<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let Cli { base_url, json, command, .. } = self;
        let resolve = || resolve_config(base_url.as_deref());

        match command {
            Command::Configure => configure()?,
            Command::Health => {
                let config = resolve()?;
                let api = api_from_config(&config)?;
                let status = api.health().await.context("Health check failed")?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&status)?);
                } else if status.is_ok() {
                    println!("Backend at {} is healthy.", config.api.base_url);
                } else {
                    bail!("Backend at {} reported status '{}'", config.api.base_url, status.status);
                }
            }
            Command::Refresh { blocking, limit, api_key } => {
                let config = resolve()?;
                let api = api_from_config(&config)?;
                let request =
                    RefreshRequest { blocking, limit, api_key, token: config.refresh_token.clone() };
                let outcome = api.refresh(&request).await.context("Refresh request failed")?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                } else {
                    match outcome {
                        RefreshOutcome::Scheduled { message } => println!("{message}"),
                        RefreshOutcome::Ok { result } => println!("Refresh finished: {result}"),
                    }
                }
            }
            Command::Stations { city } => {
                let dash = open_dashboard(&resolve()?).await?;
                let stations: Vec<_> = match &city {
                    Some(city) => dash.stations_in(city).cloned().collect(),
                    None => dash.stations().to_vec(),
                };
                if json {
                    let out = json!({ "stations": stations, "cities": dash.cities() });
                    println!("{}", serde_json::to_string_pretty(&out)?);
                } else {
                    print!("{}", render::station_table(&stations));
                    println!("{}", render::city_list(dash.cities()));
                }
            }
            Command::Station { station_id } => {
                let mut dash = open_dashboard(&resolve()?).await?;
                show_station(&mut dash, &station_id, json).await?;
            }
            Command::City { name } => {
                let mut dash = open_dashboard(&resolve()?).await?;
                show_city(&mut dash, &name, json).await?;
            }
            Command::Pick => {
                let mut dash = open_dashboard(&resolve()?).await?;
                pick(&mut dash, json).await?;
            }
        }

        Ok(())
    }
}

/// Config file, then environment, then `--base-url`.
fn resolve_config(base_url: Option<&str>) -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_env()?;
    apply_base_url(&mut config, base_url)?;
    debug!(base_url = %config.api.base_url, horizon = config.api.horizon, "resolved configuration");
    Ok(config)
}

fn apply_base_url(config: &mut Config, base_url: Option<&str>) -> anyhow::Result<()> {
    if let Some(url) = base_url {
        config.set_base_url(url).context("Invalid --base-url")?;
    }
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let url = Text::new("Prediction API base URL:")
        .with_default(&config.api.base_url)
        .prompt()?;
    config.set_base_url(&url)?;

    let token = Password::new("Refresh token (leave empty to keep the current one):")
        .without_confirmation()
        .prompt()?;
    if !token.trim().is_empty() {
        config.refresh_token = Some(token.trim().to_string());
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

/// Build the dashboard and load the station list, as the view does on startup.
async fn open_dashboard(config: &Config) -> anyhow::Result<Dashboard> {
    let mut dash = Dashboard::with_config(api_from_config(config)?, config);
    eprintln!("Loading stations...");
    dash.load_stations().await.map_err(|_| view_error(&dash))?;
    Ok(dash)
}

async fn show_station(dash: &mut Dashboard, station_id: &str, json: bool) -> anyhow::Result<()> {
    eprintln!("Loading forecast...");
    dash.predict_station(station_id).await.map_err(|_| view_error(dash))?;

    let summary = dash.station_summary();
    if json {
        let out = json!({
            "station": dash.selected_station(),
            "map": dash.map(),
            "predictions": dash.predictions(),
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    match dash.selected_station() {
        Some(s) => println!("{} ({}), {}, {}", s.station_name, s.station_id, s.city, s.country),
        None => println!("{station_id}"),
    }
    println!("{}", render::map_line(dash.map()));
    println!();
    match summary {
        Some(summary) => {
            print!("{}", render::forecast_chart(dash.predictions()));
            println!();
            print!("{}", render::summary_block(&summary));
        }
        None => println!("No predictions returned."),
    }
    Ok(())
}

async fn show_city(dash: &mut Dashboard, city: &str, json: bool) -> anyhow::Result<()> {
    eprintln!("Loading forecast...");
    dash.predict_city(city).await.map_err(|_| view_error(dash))?;

    let summaries = dash.city_summaries();
    if json {
        let out = json!({
            "city": dash.city_data(),
            "map": dash.map(),
            "summaries": summaries,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let bundle = dash.city_data().ok_or_else(|| anyhow!("No city forecast loaded"))?;
    println!("{}", render::map_line(dash.map()));
    println!();
    print!("{}", render::city_report(bundle, &summaries));
    Ok(())
}

async fn pick(dash: &mut Dashboard, json: bool) -> anyhow::Result<()> {
    if dash.cities().is_empty() {
        bail!("The backend returned no stations.");
    }

    let city = Select::new("City:", dash.cities().to_vec()).prompt()?;

    let stations: Vec<(String, String)> = dash
        .stations_in(&city)
        .map(|s| (s.station_id.clone(), format!("{} ({})", s.station_name, s.station_id)))
        .collect();
    let mut options = vec![format!("All stations in {city}")];
    options.extend(stations.iter().map(|(_, label)| label.clone()));

    let choice = Select::new("Station:", options).raw_prompt()?;
    match choice.index {
        0 => show_city(dash, &city, json).await,
        i => show_station(dash, &stations[i - 1].0, json).await,
    }
}

/// The dashboard's user-facing message for the last failed action.
fn view_error(dash: &Dashboard) -> anyhow::Error {
    anyhow!(dash.error().unwrap_or("Request failed.").to_string())
}
