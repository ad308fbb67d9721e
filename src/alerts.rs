use std::fmt;

use rusqlite::{named_params, Connection, Row};
use serde::Serialize;

use crate::database::Database;
use crate::error::HazardPulseError;
use crate::feeds::FeedSource;
use crate::geocode::Coordinates;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    pub id: i64,
    pub alert: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub source: Option<String>,
    pub created_at: i64,
}

impl AlertRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(AlertRecord {
            id: row.get(0)?,
            alert: row.get(1)?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            source: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}

/// " (Location: lat, lon)" or " (Location: Unknown)"
pub struct LocationText(pub Option<Coordinates>);

impl fmt::Display for LocationText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(c) => write!(f, "(Location: {}, {})", c.latitude, c.longitude),
            None => f.write_str("(Location: Unknown)"),
        }
    }
}

pub struct Alerts;

impl Alerts {
    /// Appends one alert. Takes a plain connection so callers can pass a
    /// transaction and commit a whole analysis run at once.
    pub fn insert(
        conn: &Connection,
        alert: &str,
        coords: Option<Coordinates>,
        source: Option<FeedSource>,
    ) -> Result<i64, HazardPulseError> {
        let sql = r#"
            INSERT INTO alerts (
                alert,
                latitude,
                longitude,
                source,
                created_at
            )
            VALUES (
                :alert,
                :latitude,
                :longitude,
                :source,
                strftime('%s', 'now', 'utc')
            )
            RETURNING id
        "#;

        let id: i64 = conn.query_row(
            sql,
            named_params! {
                ":alert":       alert,
                ":latitude":    coords.map(|c| c.latitude),
                ":longitude":   coords.map(|c| c.longitude),
                ":source":      source.map(|s| s.as_str()),
            },
            |row| row.get(0),
        )?;

        Ok(id)
    }

    pub fn list_all(db: &Database) -> Result<Vec<AlertRecord>, HazardPulseError> {
        let conn = db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, alert, latitude, longitude, source, created_at
            FROM alerts
            ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], AlertRecord::from_row)?;

        let mut alerts = Vec::new();
        for row in rows {
            alerts.push(row?);
        }
        Ok(alerts)
    }

    /// One entry per located row, duplicates included
    pub fn locations(db: &Database) -> Result<Vec<Coordinates>, HazardPulseError> {
        let conn = db.conn()?;
        let mut stmt = conn.prepare(
            "SELECT latitude, longitude
            FROM alerts
            WHERE latitude IS NOT NULL AND longitude IS NOT NULL
            ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Coordinates::new(row.get(0)?, row.get(1)?))
        })?;

        let mut locations = Vec::new();
        for row in rows {
            locations.push(row?);
        }
        Ok(locations)
    }

    pub fn count(db: &Database) -> Result<i64, HazardPulseError> {
        let conn = db.conn()?;
        let count = conn.query_row("SELECT count(*) FROM alerts", [], |row| row.get(0))?;
        Ok(count)
    }
}
