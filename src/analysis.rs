use log::{info, warn};
use serde::Serialize;

use crate::alerts::{Alerts, LocationText};
use crate::classifier::Classifier;
use crate::database::Database;
use crate::error::HazardPulseError;
use crate::feeds::{FeedClient, FeedSource};
use crate::geocode::{extract_location, Coordinates, Geocoder};
use crate::sentiment::polarity;
use crate::text::clean_text;

/// Cleaned alert text with the location found in its raw title, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateAlert {
    pub text: String,
    pub location: Option<Coordinates>,
}

impl CandidateAlert {
    pub fn new(text: impl Into<String>, location: Option<Coordinates>) -> Self {
        Self {
            text: text.into(),
            location,
        }
    }

    pub fn describe(&self) -> String {
        format!("{} {}", self.text, LocationText(self.location))
    }
}

pub struct Analyzer {
    classifier: Classifier,
    sentiment_threshold: f64,
}

impl Analyzer {
    pub fn new(classifier: Classifier, sentiment_threshold: f64) -> Self {
        Self {
            classifier,
            sentiment_threshold,
        }
    }

    /// Either signal is enough: the model says disaster, or the tone is
    /// more negative than the threshold.
    pub fn is_relevant(&self, text: &str) -> bool {
        self.classifier.is_disaster(text) || polarity(text) < self.sentiment_threshold
    }

    /// Keeps the relevant alerts, in input order, and stores each of them.
    /// All inserts of one call are committed together.
    pub fn analyze_alerts(
        &self,
        db: &Database,
        source: Option<FeedSource>,
        alerts: Vec<CandidateAlert>,
    ) -> Result<Vec<CandidateAlert>, HazardPulseError> {
        let relevant: Vec<CandidateAlert> = alerts
            .into_iter()
            .filter(|alert| self.is_relevant(&alert.text))
            .collect();

        if relevant.is_empty() {
            return Ok(relevant);
        }

        let mut conn = db.conn()?;
        let tx = conn.transaction()?;
        for alert in &relevant {
            Alerts::insert(&tx, &alert.text, alert.location, source)?;
        }
        tx.commit()?;

        for alert in &relevant {
            notify(alert);
        }

        Ok(relevant)
    }
}

fn notify(alert: &CandidateAlert) {
    warn!("🚨 Disaster Alert! {}", alert.describe());
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub source: FeedSource,
    pub heading: &'static str,
    pub empty_message: &'static str,
    pub fetched: usize,
    pub alerts: Vec<CandidateAlert>,
}

/// fetch → clean → geocode → classify → store, for one source at a time
pub struct AlertPipeline {
    feeds: FeedClient,
    geocoder: Box<dyn Geocoder>,
    analyzer: Analyzer,
    db: Database,
}

impl AlertPipeline {
    pub fn new(
        feeds: FeedClient,
        geocoder: Box<dyn Geocoder>,
        analyzer: Analyzer,
        db: Database,
    ) -> Self {
        Self {
            feeds,
            geocoder,
            analyzer,
            db,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub async fn fetch_and_analyze(&self, source: FeedSource) -> Result<FetchReport, HazardPulseError> {
        let entries = self.feeds.fetch(source).await?;
        let fetched = entries.len();

        let mut candidates = Vec::with_capacity(fetched);
        for entry in entries {
            let location = extract_location(self.geocoder.as_ref(), &entry.title).await;
            candidates.push(CandidateAlert::new(clean_text(&entry.title), location));
        }

        let alerts = self.analyzer.analyze_alerts(&self.db, Some(source), candidates)?;
        info!(
            "{} of {} {} entries flagged as disaster alerts",
            alerts.len(),
            fetched,
            source
        );

        Ok(FetchReport {
            source,
            heading: source.heading(),
            empty_message: source.empty_message(),
            fetched,
            alerts,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::classifier::tests::training_set;
    use crate::config::FeedsConfig;
    use crate::geocode::tests::FixedGeocoder;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn analyzer() -> Analyzer {
        Analyzer::new(Classifier::train(&training_set()).unwrap(), -0.2)
    }

    #[test]
    fn test_relevance_by_model_or_sentiment() {
        let analyzer = analyzer();
        assert!(analyzer.is_relevant("earthquake and flood"));
        // the model reads this as everyday chatter, the tone flags it
        assert!(analyzer.is_relevant("the music festival was a terrible tragic mess"));
        assert!(!analyzer.is_relevant("loved the music and the movie"));
    }

    #[test]
    fn test_analyze_keeps_order_and_stores_relevant() {
        let db = Database::open_in_memory().unwrap();
        let analyzer = analyzer();

        let input = vec![
            CandidateAlert::new("wildfire spreads near town", Some(Coordinates::new(-33.9, 151.2))),
            CandidateAlert::new("going to the beach with friends", None),
            CandidateAlert::new("earthquake shakes the coast", None),
        ];

        let relevant = analyzer
            .analyze_alerts(&db, Some(FeedSource::Gdacs), input.clone())
            .unwrap();
        assert_eq!(relevant, vec![input[0].clone(), input[2].clone()]);

        let stored = Alerts::list_all(&db).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].alert, "wildfire spreads near town");
        assert_eq!(stored[0].coordinates(), Some(Coordinates::new(-33.9, 151.2)));
        assert_eq!(stored[1].latitude, None);
        assert_eq!(stored[1].longitude, None);
    }

    #[test]
    fn test_repeated_analysis_duplicates_rows() {
        let db = Database::open_in_memory().unwrap();
        let analyzer = analyzer();
        let input = vec![CandidateAlert::new("flood waters rise", None)];

        analyzer.analyze_alerts(&db, None, input.clone()).unwrap();
        analyzer.analyze_alerts(&db, None, input).unwrap();
        assert_eq!(Alerts::count(&db).unwrap(), 2);
    }

    #[test]
    fn test_nothing_relevant_stores_nothing() {
        let db = Database::open_in_memory().unwrap();
        let relevant = analyzer()
            .analyze_alerts(&db, None, vec![CandidateAlert::new("new phone camera", None)])
            .unwrap();
        assert!(relevant.is_empty());
        assert_eq!(Alerts::count(&db).unwrap(), 0);
    }

    #[test]
    fn test_failed_insert_rolls_back_whole_run() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_second BEFORE INSERT ON alerts
                 WHEN (SELECT COUNT(*) FROM alerts) >= 1
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let input = vec![
            CandidateAlert::new("wildfire spreads near town", None),
            CandidateAlert::new("earthquake shakes the coast", None),
        ];
        let result = analyzer().analyze_alerts(&db, None, input);

        assert!(matches!(result, Err(HazardPulseError::DatabaseError(_))));
        assert_eq!(Alerts::count(&db).unwrap(), 0);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            CandidateAlert::new("flood", None).describe(),
            "flood (Location: Unknown)"
        );
    }

    #[tokio::test]
    async fn test_fetch_and_analyze_usgs() {
        let server = MockServer::start().await;
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>USGS Significant Earthquakes, Past Hour</title>
  <id>urn:usgs</id>
  <updated>2026-10-17T03:00:00Z</updated>
  <entry><id>urn:1</id><title>M 6.4 Earthquake - Tonga</title><updated>2026-10-17T02:51:00Z</updated></entry>
  <entry><id>urn:2</id><title>New phone camera review</title><updated>2026-10-17T02:50:00Z</updated></entry>
</feed>"#;
        Mock::given(method("GET"))
            .and(path("/usgs.atom"))
            .respond_with(ResponseTemplate::new(200).set_body_string(atom))
            .mount(&server)
            .await;

        let feeds = FeedClient::new(FeedsConfig {
            usgs_url: format!("{}/usgs.atom", server.uri()),
            ..FeedsConfig::default()
        })
        .unwrap();
        let geocoder = FixedGeocoder::new(&[("Tonga", -21.2, -175.2)]);
        let db = Database::open_in_memory().unwrap();
        let pipeline = AlertPipeline::new(feeds, Box::new(geocoder), analyzer(), db);

        let report = pipeline.fetch_and_analyze(FeedSource::Usgs).await.unwrap();
        assert_eq!(report.fetched, 2);
        assert_eq!(report.heading, "Significant Earthquakes from USGS");
        assert_eq!(
            report.alerts,
            vec![CandidateAlert::new(
                "m  earthquake  tonga",
                Some(Coordinates::new(-21.2, -175.2))
            )]
        );

        let stored = Alerts::list_all(pipeline.db()).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].source.as_deref(), Some("usgs"));
    }

    #[tokio::test]
    async fn test_fetch_failure_stores_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let feeds = FeedClient::new(FeedsConfig {
            gdacs_url: format!("{}/rss.aspx", server.uri()),
            ..FeedsConfig::default()
        })
        .unwrap();
        let db = Database::open_in_memory().unwrap();
        let pipeline =
            AlertPipeline::new(feeds, Box::new(FixedGeocoder::new(&[])), analyzer(), db);

        assert!(pipeline.fetch_and_analyze(FeedSource::Gdacs).await.is_err());
        assert_eq!(Alerts::count(pipeline.db()).unwrap(), 0);
    }
}
