use std::path::Path;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::info;

use crate::alerts::{Alerts, LocationText};
use crate::analysis::{AlertPipeline, Analyzer};
use crate::api::state::AppState;
use crate::classifier::Classifier;
use crate::config::Config;
use crate::database::Database;
use crate::error::HazardPulseError;
use crate::feeds::{FeedClient, FeedSource};
use crate::geocode::geocoder_from_config;

#[derive(Parser)]
#[command(
    name = "hazardpulse",
    version,
    about = "HazardPulse: disaster feed monitor and alert dashboard"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the dashboard server (default if no command specified)
    Serve,

    /// Fetch one feed, store the entries flagged as disaster alerts, and print them
    Fetch {
        /// Feed to fetch
        #[arg(value_parser = clap::builder::PossibleValuesParser::new(["gdacs", "usgs"]))]
        source: String,
    },

    /// Print every stored alert
    History,

    /// Train the classifier from a labeled CSV dataset and save the model
    Train {
        /// CSV file with `text` and `label` columns (defaults to the configured dataset)
        #[arg(long = "dataset", short = 'd')]
        dataset: Option<String>,
    },
}

impl Cli {
    pub fn handle_command_line() -> Result<(), HazardPulseError> {
        let args = Cli::parse();
        let config = Config::get()?;

        // Default to Serve if no command specified
        match args.command.unwrap_or(Command::Serve) {
            Command::Serve => Self::start_server(config),
            Command::Fetch { source } => Self::fetch(config, source.parse()?),
            Command::History => Self::history(config),
            Command::Train { dataset } => Self::train(config, dataset),
        }
    }

    fn build_pipeline(config: &Config) -> Result<AlertPipeline, HazardPulseError> {
        let db = Database::open(Path::new(&config.database.path))?;
        let classifier = Classifier::load_or_train(&config.classifier)?;
        let analyzer = Analyzer::new(classifier, config.classifier.sentiment_threshold);
        let feeds = FeedClient::new(config.feeds.clone())?;
        let geocoder = geocoder_from_config(&config.geocoder)?;

        Ok(AlertPipeline::new(feeds, geocoder, analyzer, db))
    }

    fn runtime() -> Result<tokio::runtime::Runtime, HazardPulseError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| HazardPulseError::Error(format!("Failed to create runtime: {}", e)))
    }

    fn start_server(config: &Config) -> Result<(), HazardPulseError> {
        let host = config.server.host.clone();
        let port = config.server.port;

        info!("Starting server on {}:{}", host, port);

        let pipeline = Self::build_pipeline(config)?;
        let rt = Self::runtime()?;

        rt.block_on(async {
            let web_server = crate::server::WebServer::new(host, port);
            web_server.start(AppState::new(pipeline)).await
        })
    }

    fn fetch(config: &Config, source: FeedSource) -> Result<(), HazardPulseError> {
        let pipeline = Self::build_pipeline(config)?;
        let rt = Self::runtime()?;

        let report = rt.block_on(pipeline.fetch_and_analyze(source))?;

        if report.alerts.is_empty() {
            println!("✅ {}", report.empty_message);
        } else {
            println!("{}:", report.heading);
            for alert in &report.alerts {
                println!("- {}", alert.describe());
            }
        }
        Ok(())
    }

    fn history(config: &Config) -> Result<(), HazardPulseError> {
        let db = Database::open(Path::new(&config.database.path))?;
        let alerts = Alerts::list_all(&db)?;

        if alerts.is_empty() {
            println!("📜 No past alerts recorded.");
            return Ok(());
        }

        println!("Historical Disaster Alerts:");
        for alert in &alerts {
            let when = DateTime::<Utc>::from_timestamp(alert.created_at, 0)
                .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "- [{}] {} {}",
                when,
                alert.alert,
                LocationText(alert.coordinates())
            );
        }
        Ok(())
    }

    fn train(config: &Config, dataset: Option<String>) -> Result<(), HazardPulseError> {
        let dataset = dataset.unwrap_or_else(|| config.classifier.dataset_path.clone());
        let model = Classifier::train_and_save(&config.classifier, Path::new(&dataset))?;

        println!(
            "Trained classifier from {} ({} terms), saved to {}",
            dataset,
            model.vocabulary_len(),
            config.classifier.model_path
        );
        Ok(())
    }
}
