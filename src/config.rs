use std::fs;
use std::path::Path;

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::error::HazardPulseError;

pub static CONFIG: OnceCell<Config> = OnceCell::new();

const ENV_PREFIX: &str = "HAZARDPULSE_";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub hazardpulse: String,
    pub http: String,
}

impl LoggingConfig {
    const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
    const HAZARDPULSE_LEVEL: &str = "info";
    const HTTP_LEVEL: &str = "warn";

    fn default() -> Self {
        LoggingConfig {
            hazardpulse: Self::HAZARDPULSE_LEVEL.to_string(),
            http: Self::HTTP_LEVEL.to_string(),
        }
    }

    fn ensure_valid(&mut self) {
        self.hazardpulse = Self::valid_level(&self.hazardpulse, "hazardpulse", Self::HAZARDPULSE_LEVEL);
        self.http = Self::valid_level(&self.http, "http", Self::HTTP_LEVEL);
    }

    fn valid_level(level: &str, name: &str, default: &str) -> String {
        let normalized = level.trim().to_ascii_lowercase();
        if Self::LOG_LEVELS.contains(&normalized.as_str()) {
            normalized
        } else {
            eprintln!(
                "Config error: {} log level of '{}' is invalid - using default of '{}'",
                name, level, default
            );
            default.to_owned()
        }
    }

    /// Spec string understood by flexi_logger, e.g. "info, reqwest=warn, hyper=warn"
    pub fn log_spec(&self) -> String {
        format!(
            "{}, reqwest={}, hyper={}, hyper_util={}",
            self.hazardpulse, self.http, self.http, self.http
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    const DEFAULT_HOST: &str = "127.0.0.1";
    const DEFAULT_PORT: u16 = 8501;

    fn default() -> Self {
        ServerConfig {
            host: Self::DEFAULT_HOST.to_owned(),
            port: Self::DEFAULT_PORT,
        }
    }

    fn ensure_valid(&mut self) {
        if self.host.trim().is_empty() {
            eprintln!(
                "Config error: server host is empty - using default of '{}'",
                Self::DEFAULT_HOST
            );
            self.host = Self::DEFAULT_HOST.to_owned();
        }
        if self.port == 0 {
            eprintln!(
                "Config error: server port of 0 is invalid - using default of '{}'",
                Self::DEFAULT_PORT
            );
            self.port = Self::DEFAULT_PORT;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub path: String,
}

impl DatabaseConfig {
    const DB_FILENAME: &str = "disaster_alerts.db";

    fn default(data_dir: &Path) -> Self {
        DatabaseConfig {
            path: data_dir.join(Self::DB_FILENAME).to_string_lossy().into_owned(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FeedsConfig {
    pub gdacs_url: String,
    pub usgs_url: String,
    pub max_entries: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl FeedsConfig {
    pub const GDACS_URL: &str = "https://www.gdacs.org/rss.aspx";
    pub const USGS_URL: &str =
        "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/significant_hour.atom";
    const MAX_ENTRIES: usize = 5;
    const TIMEOUT_SECS: u64 = 15;

    pub fn default() -> Self {
        FeedsConfig {
            gdacs_url: Self::GDACS_URL.to_owned(),
            usgs_url: Self::USGS_URL.to_owned(),
            max_entries: Self::MAX_ENTRIES,
            timeout_secs: Self::TIMEOUT_SECS,
            user_agent: default_user_agent(),
        }
    }

    fn ensure_valid(&mut self) {
        if self.max_entries == 0 {
            eprintln!(
                "Config error: feeds max_entries of 0 is invalid - using default of '{}'",
                Self::MAX_ENTRIES
            );
            self.max_entries = Self::MAX_ENTRIES;
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = Self::TIMEOUT_SECS;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeocoderConfig {
    pub enabled: bool,
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl GeocoderConfig {
    pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
    const TIMEOUT_SECS: u64 = 10;

    pub fn default() -> Self {
        GeocoderConfig {
            enabled: true,
            base_url: Self::NOMINATIM_URL.to_owned(),
            user_agent: default_user_agent(),
            timeout_secs: Self::TIMEOUT_SECS,
        }
    }

    fn ensure_valid(&mut self) {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_owned();
        if self.base_url.is_empty() {
            eprintln!(
                "Config error: geocoder base_url is empty - using default of '{}'",
                Self::NOMINATIM_URL
            );
            self.base_url = Self::NOMINATIM_URL.to_owned();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = Self::TIMEOUT_SECS;
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub dataset_path: String,
    pub model_path: String,
    pub sentiment_threshold: f64,
}

impl ClassifierConfig {
    const DATASET_FILENAME: &str = "disaster_tweets.csv";
    const MODEL_FILENAME: &str = "disaster_model.json";
    pub const SENTIMENT_THRESHOLD: f64 = -0.2;

    fn default(data_dir: &Path) -> Self {
        ClassifierConfig {
            dataset_path: data_dir.join(Self::DATASET_FILENAME).to_string_lossy().into_owned(),
            model_path: data_dir.join(Self::MODEL_FILENAME).to_string_lossy().into_owned(),
            sentiment_threshold: Self::SENTIMENT_THRESHOLD,
        }
    }

    fn ensure_valid(&mut self) {
        if !(-1.0..=1.0).contains(&self.sentiment_threshold) {
            eprintln!(
                "Config error: sentiment_threshold of '{}' is outside [-1, 1] - using default of '{}'",
                self.sentiment_threshold,
                Self::SENTIMENT_THRESHOLD
            );
            self.sentiment_threshold = Self::SENTIMENT_THRESHOLD;
        }
    }
}

fn default_user_agent() -> String {
    format!("hazardpulse/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub feeds: FeedsConfig,
    pub geocoder: GeocoderConfig,
    pub classifier: ClassifierConfig,
}

impl Config {
    pub fn default_for(data_dir: &Path) -> Self {
        Config {
            logging: LoggingConfig::default(),
            server: ServerConfig::default(),
            database: DatabaseConfig::default(data_dir),
            feeds: FeedsConfig::default(),
            geocoder: GeocoderConfig::default(),
            classifier: ClassifierConfig::default(data_dir),
        }
    }

    /// Loads the configuration from a TOML file located in the app's data directory.
    /// If the file is missing or fails to parse, defaults are used.
    /// Additionally, writes the default config to disk if no file exists.
    pub fn load_config(project_dirs: &ProjectDirs) -> Self {
        Self::load_from(project_dirs.data_local_dir())
    }

    pub fn load_from(data_dir: &Path) -> Self {
        let config_path = data_dir.join("config.toml");
        let default_config = Config::default_for(data_dir);

        if !config_path.exists() {
            if let Err(e) = fs::create_dir_all(data_dir) {
                eprintln!(
                    "Failed to create configuration directory {}: {}",
                    data_dir.display(),
                    e
                );
            }
            match toml::to_string_pretty(&default_config) {
                Ok(toml_string) => {
                    if let Err(e) = fs::write(&config_path, toml_string) {
                        eprintln!(
                            "Failed to write default config to {}: {}",
                            config_path.display(),
                            e
                        );
                    }
                }
                Err(_) => eprintln!("Failed to serialize default config."),
            }
        }

        // Defaults, then the TOML file, then HAZARDPULSE_SECTION__KEY environment overrides
        let figment = Figment::from(Serialized::defaults(default_config.clone()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: Config = figment.extract().unwrap_or_else(|err| {
            eprintln!(
                "Could not load config file {}: {}. Using default configuration.",
                config_path.display(),
                err
            );
            default_config
        });

        config.ensure_valid();

        config
    }

    fn ensure_valid(&mut self) {
        self.logging.ensure_valid();
        self.server.ensure_valid();
        self.feeds.ensure_valid();
        self.geocoder.ensure_valid();
        self.classifier.ensure_valid();
    }

    pub fn get() -> Result<&'static Config, HazardPulseError> {
        CONFIG
            .get()
            .ok_or_else(|| HazardPulseError::Error("Configuration has not been loaded".to_string()))
    }
}
