use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::{debug, info};
use serde::Serialize;

use crate::config::FeedsConfig;
use crate::error::HazardPulseError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSource {
    Gdacs,
    Usgs,
}

impl FeedSource {
    pub const ALL: [FeedSource; 2] = [FeedSource::Gdacs, FeedSource::Usgs];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedSource::Gdacs => "gdacs",
            FeedSource::Usgs => "usgs",
        }
    }

    /// Heading shown above the relevant alerts of a fetch
    pub fn heading(&self) -> &'static str {
        match self {
            FeedSource::Gdacs => "Emergency Alerts from GDACS",
            FeedSource::Usgs => "Significant Earthquakes from USGS",
        }
    }

    /// Message shown when a fetch produced no relevant alerts
    pub fn empty_message(&self) -> &'static str {
        match self {
            FeedSource::Gdacs => "No major disaster alerts from GDACS.",
            FeedSource::Usgs => "No significant earthquakes reported by USGS.",
        }
    }

    fn url<'a>(&self, config: &'a FeedsConfig) -> &'a str {
        match self {
            FeedSource::Gdacs => &config.gdacs_url,
            FeedSource::Usgs => &config.usgs_url,
        }
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeedSource {
    type Err = HazardPulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gdacs" => Ok(FeedSource::Gdacs),
            "usgs" => Ok(FeedSource::Usgs),
            _ => Err(HazardPulseError::Error(format!(
                "Unknown feed source: '{}'",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    /// Raw entry title, before cleaning
    pub title: String,
}

/// Parses an RSS or Atom document and keeps the first `max` entries that
/// carry a title, in document order. Titles are taken as the parser returns
/// them; an empty title still occupies its slot.
pub fn parse_entries(body: &[u8], max: usize) -> Result<Vec<FeedEntry>, HazardPulseError> {
    let feed = feed_rs::parser::parse(body)?;

    let entries: Vec<FeedEntry> = feed
        .entries
        .into_iter()
        .filter_map(|entry| entry.title)
        .take(max)
        .map(|title| FeedEntry {
            title: title.content,
        })
        .collect();

    Ok(entries)
}

pub struct FeedClient {
    client: reqwest::Client,
    config: FeedsConfig,
}

impl FeedClient {
    pub fn new(config: FeedsConfig) -> Result<Self, HazardPulseError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { client, config })
    }

    pub async fn fetch(&self, source: FeedSource) -> Result<Vec<FeedEntry>, HazardPulseError> {
        let url = source.url(&self.config);
        debug!("Fetching {} feed from {}", source, url);

        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let entries = parse_entries(&body, self.config.max_entries)?;
        info!("Fetched {} entries from {} feed", entries.len(), source);

        Ok(entries)
    }
}
